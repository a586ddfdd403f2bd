/*!

This is the long-form manual for `label_matching` and `labelrecon`.

## What it does

`labelrecon` lines up the questions of two spreadsheets that describe the same
survey but were maintained independently: the *backend* export, produced by the
statistics pipeline, and the *teacher* sheet, typed by hand. Question texts drift
between the two (full-width punctuation, extra spaces, a word changed here and
there), so the comparison runs in two stages:

1. **Normalized match.** Each question gets a key made only of CJK ideographs
   (U+4E00 to U+9FA5), ASCII letters and ASCII digits, lowercased. Questions with
   the same key on both sides are paired with high confidence.
2. **Fuzzy suggestions.** The leftovers are compared on their original text with an
   insertion/deletion ratio:
   `100 * 2 * lcs(a, b) / (len(a) + len(b))`, where `lcs` is the longest common
   subsequence and lengths are counted in characters. `我喜歡這份工作` and
   `我喜歡這份工作環境` score 87.5.
   Backend questions are visited in order; each one takes the most similar teacher
   question still available whose score is strictly above the threshold (80 by
   default). A teacher question is never suggested twice.

For example, `溝通不足` and `溝通不佳` differ by one character out of four and
score 75: they are suggested with a threshold of 70, not with 80.

## Input formats

Both inputs are tables with a header row.

| side    | question                         | mean                         | count |
|---------|----------------------------------|------------------------------|-------|
| backend | `Original_Column`                | `Mean`                       | `N`   |
| teacher | `問題` (or `Original_Column`)    | `學校平均值` (or `Mean_Teacher`) |       |

### `csv`

Comma separated values, UTF-8. A byte order mark at the start of the file is ignored.

```text
Original_Column,Mean,N
我喜歡這份工作,4.5,10
溝通不足,2.1,10
```

### `xlsx`

Excel workbook, read from the first worksheet unless `excelWorksheetName` is set.

Mean values that are blank or not numbers (for example `-` or `N/A`) are dropped
with a warning. A table whose data rows all lack a usable mean is an error.

## Output

An Excel workbook with four sheets:
- `1_Normalized_Match (高信心)`: `Original_Column_Backend, Mean_Backend, N_Backend,
  Original_Column_Teacher, Mean_Teacher, normalized_key`
- `2_Fuzzy_Suggestions (>80%)`: `Similarity_Score, Backend_Question, Mean_Backend,
  Suggested_Teacher_Question, Mean_Teacher`, highest score first
- `3_Backend_Only (最終未匹配)`: `Original_Column, Mean_Backend, N_Backend, normalized_key`
- `4_Teacher_Only (最終未匹配)`: `Original_Column, Mean_Teacher, normalized_key`

With `--summary-out`, the counts of each category are also written in JSON.

## Configuration

Without any argument, `labelrecon` reads `numeric_descriptive_stats.csv` and
`2025_Teacher_ES - mean.csv` from the current directory and writes
`Backend_vs_Teacher_Comparison_ADVANCED.xlsx`.

A JSON configuration file can be passed with `--config`. Paths are relative to the
directory of the configuration file. Command line flags override the file.

```text
{
  "backend": { "filePath": "numeric_descriptive_stats.csv" },
  "teacher": {
    "provider": "xlsx",
    "filePath": "teacher.xlsx",
    "excelWorksheetName": "mean",
    "textColumn": "題目"
  },
  "outputFile": "comparison.xlsx",
  "fuzzyThreshold": 85,
  "duplicateKeyMode": "reject"
}
```

Table sources accept:
 - `provider` (`csv` or `xlsx`, optional): inferred from the file extension.
 - `filePath` (string)
 - `textColumn`, `meanColumn`, `countColumn` (string, optional): column names,
   replacing the defaults above.
 - `excelWorksheetName` (string, optional)

`duplicateKeyMode` controls what happens when several questions of one side share
a normalized key: `crossProduct` (default) pairs every combination, `reject`
stops with an error naming the key.

 */
