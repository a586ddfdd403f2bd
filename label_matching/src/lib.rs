/*!
Reconciliation of survey question labels between two independently
maintained tables: the "backend" export (question, mean, sample count) and
the "teacher" sheet (question, mean).

The matching runs in two stages:
1. an exact join on a normalized key (punctuation, spacing and case removed),
2. a greedy fuzzy pass over the leftovers, where each backend record takes the
   most similar teacher record still available, if its score is strictly above
   a threshold.

Every input record ends up in exactly one place: an exact match, a fuzzy
suggestion, or the unmatched list of its side.

```
use label_matching::builder::Builder;
use label_matching::MatchRules;
# use label_matching::MatchingErrors;

let mut builder = Builder::new(&MatchRules::DEFAULT_RULES)?;
builder.add_backend("我喜歡這份工作", 4.5, Some(10))?;
builder.add_teacher("我喜歡這份工作！", 4.0)?;

let rec = builder.reconcile()?;
assert_eq!(rec.exact_matches.len(), 1);
# Ok::<(), MatchingErrors>(())
```
*/
pub mod builder;
mod config;
pub mod manual;
mod report;

use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;
pub use crate::report::*;

// Range of the CJK unified ideographs kept in keys.
const CJK_FIRST: char = '\u{4e00}';
const CJK_LAST: char = '\u{9fa5}';

fn is_key_char(c: char) -> bool {
    (CJK_FIRST..=CJK_LAST).contains(&c) || c.is_ascii_alphanumeric()
}

/// Computes the comparison key of a label.
///
/// Only CJK ideographs, ASCII letters and ASCII digits are kept, and letters
/// are lowercased. The function is idempotent.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| is_key_char(*c))
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Same as [normalize], for cells that may be missing or hold a non-text value.
/// Those produce the empty key, which never joins.
pub fn normalize_cell(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

// Two-row dynamic programming over characters.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit-distance similarity between two labels, on their characters.
///
/// This is the insertion/deletion ratio `2 * lcs / (len(a) + len(b))`: an
/// added word costs less than with a substitution-based distance, and a
/// swapped pair of characters keeps half of its weight. The score is
/// symmetric.
pub fn similarity(a: &str, b: &str) -> Similarity {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return Similarity::IDENTICAL;
    }
    Similarity {
        matched: 2 * lcs_length(&a, &b),
        total,
    }
}

fn check_unique_keys(values: &[LabeledValue], side: Side) -> Result<(), MatchingErrors> {
    let mut seen: HashSet<&str> = HashSet::new();
    for v in values.iter().filter(|v| !v.normalized_key().is_empty()) {
        if !seen.insert(v.normalized_key()) {
            return Err(MatchingErrors::DuplicateKey {
                side,
                key: v.normalized_key().to_string(),
            });
        }
    }
    Ok(())
}

/// Inner join of both sides on the normalized key.
///
/// Matches follow the backend order, then the teacher order for a shared key.
/// With [DuplicateKeyMode::CrossProduct], a key present several times on
/// either side yields every combination. Empty keys never join.
pub fn exact_match(
    backend: &[LabeledValue],
    teacher: &[LabeledValue],
    duplicate_key_mode: DuplicateKeyMode,
) -> Result<ExactStage, MatchingErrors> {
    if duplicate_key_mode == DuplicateKeyMode::Reject {
        check_unique_keys(backend, Side::Backend)?;
        check_unique_keys(teacher, Side::Teacher)?;
    }

    let mut teacher_by_key: HashMap<&str, Vec<&LabeledValue>> = HashMap::new();
    for t in teacher.iter().filter(|t| !t.normalized_key().is_empty()) {
        teacher_by_key.entry(t.normalized_key()).or_default().push(t);
    }

    let mut matches: Vec<ExactMatch> = Vec::new();
    let mut matched_keys: HashSet<&str> = HashSet::new();
    for b in backend.iter() {
        if let Some(ts) = teacher_by_key.get(b.normalized_key()) {
            for t in ts.iter() {
                matches.push(ExactMatch {
                    backend_text: b.original_text().to_string(),
                    backend_mean: b.mean(),
                    backend_n: b.n(),
                    teacher_text: t.original_text().to_string(),
                    teacher_mean: t.mean(),
                    key: b.normalized_key().to_string(),
                });
            }
            matched_keys.insert(b.normalized_key());
        }
    }

    let remaining = |values: &[LabeledValue]| -> Vec<LabeledValue> {
        values
            .iter()
            .filter(|v| !matched_keys.contains(v.normalized_key()))
            .cloned()
            .collect()
    };
    let backend_remaining = remaining(backend);
    let teacher_remaining = remaining(teacher);
    debug!(
        "exact_match: {} matches over {} keys, remaining backend: {} teacher: {}",
        matches.len(),
        matched_keys.len(),
        backend_remaining.len(),
        teacher_remaining.len()
    );
    Ok(ExactStage {
        matches,
        backend_remaining,
        teacher_remaining,
    })
}

/// Finds the best teacher candidate not yet consumed for this backend record.
///
/// The first candidate must be strictly above the threshold, and any later one
/// strictly above the best so far: on equal scores, the first in scan order
/// stays.
fn best_candidate(
    b: &LabeledValue,
    teacher: &[LabeledValue],
    consumed: &HashSet<usize>,
    threshold: u8,
) -> Option<(usize, Similarity)> {
    let mut best: Option<(usize, Similarity)> = None;
    for (t_idx, t) in teacher.iter().enumerate() {
        if consumed.contains(&t_idx) || t.original_text().is_empty() {
            continue;
        }
        // Original texts: short normalized keys would look falsely similar.
        let score = similarity(b.original_text(), t.original_text());
        let better = match best {
            None => score.exceeds(threshold),
            Some((_, best_score)) => score > best_score,
        };
        if better {
            best = Some((t_idx, score));
        }
    }
    best
}

/// Greedy one-to-one fuzzy matching of the records left by the exact stage.
///
/// Backend records are visited in input order. Each one takes the most similar
/// teacher record that is still available and strictly above the threshold;
/// that teacher record is then consumed. Suggestions are returned by
/// decreasing score (stable for equal scores).
pub fn fuzzy_match(
    backend_remaining: &[LabeledValue],
    teacher_remaining: &[LabeledValue],
    threshold: u8,
) -> Result<FuzzyStage, MatchingErrors> {
    MatchRules {
        fuzzy_threshold: threshold,
        ..MatchRules::DEFAULT_RULES
    }
    .validate()?;

    let mut consumed: HashSet<usize> = HashSet::new();
    let mut suggestions: Vec<FuzzySuggestion> = Vec::new();
    let mut backend_still_remaining: Vec<LabeledValue> = Vec::new();

    for b in backend_remaining.iter() {
        let candidate = if b.original_text().is_empty() {
            None
        } else {
            best_candidate(b, teacher_remaining, &consumed, threshold)
        };
        match candidate {
            Some((t_idx, score)) => {
                let t = &teacher_remaining[t_idx];
                debug!(
                    "fuzzy_match: {:?} -> {:?} ({:.2})",
                    b.original_text(),
                    t.original_text(),
                    score.percent()
                );
                consumed.insert(t_idx);
                suggestions.push(FuzzySuggestion {
                    score,
                    backend_text: b.original_text().to_string(),
                    backend_mean: b.mean(),
                    teacher_text: t.original_text().to_string(),
                    teacher_mean: t.mean(),
                });
            }
            None => {
                debug!("fuzzy_match: no candidate for {:?}", b.original_text());
                backend_still_remaining.push(b.clone());
            }
        }
    }

    suggestions.sort_by(|x, y| y.score.cmp(&x.score));

    let teacher_still_remaining: Vec<LabeledValue> = teacher_remaining
        .iter()
        .enumerate()
        .filter(|(t_idx, _)| !consumed.contains(t_idx))
        .map(|(_, t)| t.clone())
        .collect();

    Ok(FuzzyStage {
        suggestions,
        backend_still_remaining,
        teacher_still_remaining,
    })
}

/// Runs both matching stages with the given rules.
///
/// Arguments:
/// * `backend` the backend records, in input order
/// * `teacher` the teacher records, in input order
/// * `rules` threshold and duplicate key policy
pub fn reconcile(
    backend: &[LabeledValue],
    teacher: &[LabeledValue],
    rules: &MatchRules,
) -> Result<Reconciliation, MatchingErrors> {
    rules.validate()?;
    info!(
        "reconcile: Processing {} backend and {} teacher records, rules: {:?}",
        backend.len(),
        teacher.len(),
        rules
    );

    let exact = exact_match(backend, teacher, rules.duplicate_key_mode)?;
    info!(
        "reconcile: stage 1: {} exact matches, {} backend and {} teacher records left",
        exact.matches.len(),
        exact.backend_remaining.len(),
        exact.teacher_remaining.len()
    );

    let fuzzy = fuzzy_match(
        &exact.backend_remaining,
        &exact.teacher_remaining,
        rules.fuzzy_threshold,
    )?;
    info!(
        "reconcile: stage 2: {} fuzzy suggestions (> {}%), {} backend and {} teacher records unmatched",
        fuzzy.suggestions.len(),
        rules.fuzzy_threshold,
        fuzzy.backend_still_remaining.len(),
        fuzzy.teacher_still_remaining.len()
    );

    let backend_unmatched: Vec<UnmatchedBackend> = fuzzy
        .backend_still_remaining
        .iter()
        .map(|v| UnmatchedBackend {
            text: v.original_text().to_string(),
            mean: v.mean(),
            n: v.n(),
            key: v.normalized_key().to_string(),
        })
        .collect();
    let teacher_unmatched: Vec<UnmatchedTeacher> = fuzzy
        .teacher_still_remaining
        .iter()
        .map(|v| UnmatchedTeacher {
            text: v.original_text().to_string(),
            mean: v.mean(),
            key: v.normalized_key().to_string(),
        })
        .collect();

    let counts = PartitionCounts {
        backend_total: backend.len(),
        teacher_total: teacher.len(),
        backend_exact: backend.len() - exact.backend_remaining.len(),
        teacher_exact: teacher.len() - exact.teacher_remaining.len(),
        exact_rows: exact.matches.len(),
        fuzzy_suggestions: fuzzy.suggestions.len(),
        backend_unmatched: backend_unmatched.len(),
        teacher_unmatched: teacher_unmatched.len(),
    };
    debug!("reconcile: counts: {:?}", counts);

    Ok(Reconciliation {
        threshold: rules.fuzzy_threshold,
        exact_matches: exact.matches,
        fuzzy_suggestions: fuzzy.suggestions,
        backend_unmatched,
        teacher_unmatched,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn b(text: &str, mean: f64) -> LabeledValue {
        LabeledValue::backend(text, mean, Some(10))
    }

    fn t(text: &str, mean: f64) -> LabeledValue {
        LabeledValue::teacher(text, mean)
    }

    fn rules(threshold: u8) -> MatchRules {
        MatchRules {
            fuzzy_threshold: threshold,
            ..MatchRules::DEFAULT_RULES
        }
    }

    #[test]
    fn normalize_strips_punctuation_and_spaces() {
        assert_eq!(normalize("問題 A！"), normalize("問題A"));
        assert_eq!(normalize("問題 A！"), "問題a");
        assert_eq!(normalize("  我喜歡這裡！ "), "我喜歡這裡");
        assert_eq!(normalize("Q1. (選填)\t說明?"), "q1選填說明");
    }

    #[test]
    fn normalize_ignores_case() {
        assert_eq!(normalize("ABC"), normalize("abc"));
        assert_eq!(normalize("Mixed Case 123"), "mixedcase123");
    }

    #[test]
    fn normalize_drops_characters_outside_the_kept_ranges() {
        // Full-width digits, kana, hangul and accented letters are all dropped.
        assert_eq!(normalize("１２３"), "");
        assert_eq!(normalize("ひらがなカタカナ"), "");
        assert_eq!(normalize("한국어"), "");
        assert_eq!(normalize("café"), "caf");
        assert_eq!(normalize("\u{9fa6}"), "");
        assert_eq!(normalize("\u{4e00}\u{9fa5}"), "\u{4e00}\u{9fa5}");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "",
            "   ",
            "問題 A！",
            "Q3: 你覺得這份工作有挑戰性嗎？(1-5)",
            "Hello, World!",
            "emoji 😀 text",
            "ＡＢＣ abc",
        ];
        for s in samples.iter() {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent on {:?}", s);
        }
    }

    #[test]
    fn normalize_missing_cell_is_empty() {
        assert_eq!(normalize_cell(None), "");
        assert_eq!(normalize_cell(Some("A b")), "ab");

        let v = LabeledValue::from_cell(Side::Backend, None, 1.0, Some(3));
        assert_eq!(v.original_text(), "");
        assert_eq!(v.normalized_key(), "");
        assert_eq!(v.n(), Some(3));
        let v = LabeledValue::from_cell(Side::Teacher, Some("問題 A！"), 1.0, Some(3));
        assert_eq!(v, t("問題 A！", 1.0));
    }

    #[test]
    fn labeled_value_keeps_text_and_key_apart() {
        let v = b("我喜歡這裡！", 4.2);
        assert_eq!(v.original_text(), "我喜歡這裡！");
        assert_eq!(v.normalized_key(), "我喜歡這裡");
        assert_eq!(v.n(), Some(10));
        assert_eq!(t("x", 1.0).n(), None);
    }

    #[test]
    fn similarity_scores() {
        assert_eq!(similarity("abc", "abc").percent(), 100.0);
        assert_eq!(similarity("", "").percent(), 100.0);
        assert_eq!(similarity("abc", "").percent(), 0.0);
        let s = similarity("溝通不足", "溝通不佳");
        assert_eq!(s.matched, 6);
        assert_eq!(s.total, 8);
        assert_eq!(s, Similarity { matched: 3, total: 4 });
        assert_eq!(s.percent(), 75.0);
        assert_eq!(similarity("abcd", "abce"), similarity("abce", "abcd"));
    }

    #[test]
    fn similarity_of_inserted_words() {
        let s = similarity("我喜歡這份工作", "我喜歡這份工作環境");
        assert_eq!(s.matched, 14);
        assert_eq!(s.total, 16);
        assert_eq!(s.percent(), 87.5);
        assert!(s.exceeds(80));
        assert_eq!(similarity("我喜歡這份工作環境", "我喜歡這份工作"), s);

        let res = fuzzy_match(
            &[b("我喜歡這份工作", 4.5)],
            &[t("我喜歡這份工作環境", 4.0)],
            MatchRules::DEFAULT_THRESHOLD,
        )
        .unwrap();
        assert_eq!(res.suggestions.len(), 1);
        assert_eq!(res.suggestions[0].teacher_text, "我喜歡這份工作環境");
    }

    #[test]
    fn similarity_of_swapped_characters() {
        assert_eq!(similarity("ab", "ba").percent(), 50.0);
        // One swap in ten characters keeps 18 of 20.
        assert_eq!(similarity("abcdefghij", "abcdefghji").percent(), 90.0);
    }

    #[test]
    fn similarity_threshold_is_strict() {
        let s = Similarity {
            matched: 4,
            total: 5,
        };
        assert!(!s.exceeds(80));
        assert!(s.exceeds(79));
        assert!(Similarity::IDENTICAL.exceeds(99));
        assert!(!Similarity::IDENTICAL.exceeds(100));
    }

    #[test]
    fn exact_match_on_normalized_key() {
        init();
        let backend = vec![b("我喜歡這裡！", 4.0), b("其他", 3.0)];
        let teacher = vec![t("我喜歡這裡", 3.5)];
        let res = exact_match(&backend, &teacher, DuplicateKeyMode::CrossProduct).unwrap();
        assert_eq!(res.matches.len(), 1);
        let m = &res.matches[0];
        assert_eq!(m.backend_text, "我喜歡這裡！");
        assert_eq!(m.teacher_text, "我喜歡這裡");
        assert_eq!(m.key, "我喜歡這裡");
        assert_eq!(m.backend_n, Some(10));
        assert_eq!(res.backend_remaining, vec![b("其他", 3.0)]);
        assert!(res.teacher_remaining.is_empty());
    }

    #[test]
    fn exact_match_never_joins_empty_keys() {
        let backend = vec![b("？？", 1.0)];
        let teacher = vec![t("!!", 2.0)];
        let res = exact_match(&backend, &teacher, DuplicateKeyMode::CrossProduct).unwrap();
        assert!(res.matches.is_empty());
        assert_eq!(res.backend_remaining.len(), 1);
        assert_eq!(res.teacher_remaining.len(), 1);
    }

    #[test]
    fn exact_match_duplicate_keys_cross_product() {
        let backend = vec![b("Q1", 1.0), b("q1!", 2.0)];
        let teacher = vec![t("Q 1", 3.0), t("q-1", 4.0), t("Q2", 5.0)];
        let res = exact_match(&backend, &teacher, DuplicateKeyMode::CrossProduct).unwrap();
        let pairs: Vec<(&str, &str)> = res
            .matches
            .iter()
            .map(|m| (m.backend_text.as_str(), m.teacher_text.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("Q1", "Q 1"), ("Q1", "q-1"), ("q1!", "Q 1"), ("q1!", "q-1")]
        );
        assert!(res.backend_remaining.is_empty());
        assert_eq!(res.teacher_remaining, vec![t("Q2", 5.0)]);
    }

    #[test]
    fn exact_match_duplicate_keys_rejected() {
        let backend = vec![b("Q1", 1.0)];
        let teacher = vec![t("Q 1", 3.0), t("q-1", 4.0)];
        let res = exact_match(&backend, &teacher, DuplicateKeyMode::Reject);
        assert_eq!(
            res,
            Err(MatchingErrors::DuplicateKey {
                side: Side::Teacher,
                key: "q1".to_string()
            })
        );
        // Empty keys are not duplicates: they never join.
        let backend = vec![b("？", 1.0), b("！", 2.0)];
        assert!(exact_match(&backend, &[], DuplicateKeyMode::Reject).is_ok());
    }

    #[test]
    fn fuzzy_threshold_boundary() {
        let base = "a".repeat(100);
        let at_80 = format!("{}{}", "a".repeat(80), "b".repeat(20));
        let at_81 = format!("{}{}", "a".repeat(81), "c".repeat(19));

        let res = fuzzy_match(&[b(&base, 1.0)], &[t(&at_80, 1.0)], 80).unwrap();
        assert!(res.suggestions.is_empty());
        assert_eq!(res.backend_still_remaining.len(), 1);
        assert_eq!(res.teacher_still_remaining.len(), 1);

        let res = fuzzy_match(&[b(&base, 1.0)], &[t(&at_81, 1.0)], 80).unwrap();
        assert_eq!(res.suggestions.len(), 1);
        assert_eq!(res.suggestions[0].score.percent(), 81.0);
        assert!(res.backend_still_remaining.is_empty());
        assert!(res.teacher_still_remaining.is_empty());
    }

    #[test]
    fn fuzzy_consumes_teacher_items_once() {
        init();
        // First backend item prefers teacher #0 (90) over teacher #1 (80).
        let backend = vec![b("abcdefghij", 1.0), b("abcdefghXW", 2.0)];
        let teacher = vec![t("abcdefghiX", 3.0), t("abcdefghXY", 4.0)];
        let res = fuzzy_match(&backend, &teacher, 70).unwrap();
        let pairs: Vec<(&str, &str)> = res
            .suggestions
            .iter()
            .map(|s| (s.backend_text.as_str(), s.teacher_text.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("abcdefghij", "abcdefghiX"), ("abcdefghXW", "abcdefghXY")]
        );

        // With a single backend item, the weaker candidate stays unmatched.
        let res = fuzzy_match(&backend[..1], &teacher, 70).unwrap();
        assert_eq!(res.suggestions.len(), 1);
        assert_eq!(res.suggestions[0].teacher_text, "abcdefghiX");
        assert_eq!(res.teacher_still_remaining, vec![t("abcdefghXY", 4.0)]);
    }

    #[test]
    fn fuzzy_is_greedy_in_backend_order() {
        // The second backend item would fit better, but the first one takes it.
        let backend = vec![b("abcdeXXX", 1.0), b("abcdefgX", 2.0)];
        let teacher = vec![t("abcdefgh", 3.0)];
        let res = fuzzy_match(&backend, &teacher, 50).unwrap();
        assert_eq!(res.suggestions.len(), 1);
        assert_eq!(res.suggestions[0].backend_text, "abcdeXXX");
        assert_eq!(res.backend_still_remaining, vec![b("abcdefgX", 2.0)]);
    }

    #[test]
    fn fuzzy_ties_keep_first_candidate() {
        let backend = vec![b("abcdX", 1.0)];
        let teacher = vec![t("abcdY", 2.0), t("abcdZ", 3.0)];
        let res = fuzzy_match(&backend, &teacher, 50).unwrap();
        assert_eq!(res.suggestions[0].teacher_text, "abcdY");
        assert_eq!(res.teacher_still_remaining, vec![t("abcdZ", 3.0)]);
    }

    #[test]
    fn fuzzy_suggestions_sorted_by_score() {
        let backend = vec![b("abcdefghij", 1.0), b("klmnopqrst", 2.0)];
        let teacher = vec![t("abcdefghXY", 3.0), t("klmnopqrsX", 4.0)];
        let res = fuzzy_match(&backend, &teacher, 50).unwrap();
        let scores: Vec<f64> = res.suggestions.iter().map(|s| s.score.percent()).collect();
        assert_eq!(scores, vec![90.0, 80.0]);
        assert_eq!(res.suggestions[0].backend_text, "klmnopqrst");
    }

    #[test]
    fn fuzzy_skips_empty_texts() {
        let res = fuzzy_match(&[b("", 1.0)], &[t("", 2.0)], 0).unwrap();
        assert!(res.suggestions.is_empty());
        assert_eq!(res.backend_still_remaining.len(), 1);
        assert_eq!(res.teacher_still_remaining.len(), 1);
    }

    #[test]
    fn fuzzy_rejects_invalid_threshold() {
        assert_eq!(
            fuzzy_match(&[], &[], 101),
            Err(MatchingErrors::InvalidThreshold(101))
        );
        assert!(fuzzy_match(&[], &[], 100).is_ok());
    }

    #[test]
    fn end_to_end_scenario() {
        init();
        let backend = vec![b("我喜歡這份工作", 4.5), b("溝通不足", 2.1)];
        let teacher = vec![t("我喜歡這份工作！", 4.0), t("溝通不佳", 2.0)];

        // One differing character out of four scores 75.
        let rec = reconcile(&backend, &teacher, &rules(80)).unwrap();
        assert_eq!(rec.exact_matches.len(), 1);
        assert_eq!(rec.exact_matches[0].key, "我喜歡這份工作");
        assert_eq!(rec.exact_matches[0].backend_mean, 4.5);
        assert_eq!(rec.exact_matches[0].teacher_mean, 4.0);
        assert!(rec.fuzzy_suggestions.is_empty());
        assert_eq!(rec.backend_unmatched[0].text, "溝通不足");
        assert_eq!(rec.teacher_unmatched[0].text, "溝通不佳");
        assert!(rec.counts.is_partition());

        let rec = reconcile(&backend, &teacher, &rules(70)).unwrap();
        assert_eq!(rec.exact_matches.len(), 1);
        assert_eq!(rec.fuzzy_suggestions.len(), 1);
        let s = &rec.fuzzy_suggestions[0];
        assert_eq!(s.score.percent(), 75.0);
        assert_eq!(s.backend_text, "溝通不足");
        assert_eq!(s.backend_mean, 2.1);
        assert_eq!(s.teacher_text, "溝通不佳");
        assert_eq!(s.teacher_mean, 2.0);
        assert!(rec.backend_unmatched.is_empty());
        assert!(rec.teacher_unmatched.is_empty());
        assert!(rec.counts.is_partition());
    }

    #[test]
    fn empty_teacher_table() {
        let backend = vec![b("Q1", 1.0), b("Q2", 2.0)];
        let rec = reconcile(&backend, &[], &MatchRules::DEFAULT_RULES).unwrap();
        assert!(rec.exact_matches.is_empty());
        assert!(rec.fuzzy_suggestions.is_empty());
        assert_eq!(rec.backend_unmatched.len(), 2);
        assert!(rec.teacher_unmatched.is_empty());
        assert!(rec.counts.is_partition());
    }

    #[test]
    fn partition_holds_on_mixed_inputs() {
        let labels = [
            "整體而言，我對工作感到滿意",
            "我的主管會給我回饋",
            "我知道公司對我的期望",
            "我有足夠的資源完成工作",
            "同事之間互相支持",
            "我願意推薦朋友來這裡工作",
            "Overall satisfaction",
            "Work-life balance",
        ];
        // Exact copies, punctuation variants, near misses and strangers.
        let backend: Vec<LabeledValue> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| b(l, i as f64))
            .collect();
        let teacher: Vec<LabeledValue> = vec![
            t("整體而言 我對工作感到滿意！", 1.0),
            t("我的主管會給予我回饋", 2.0),
            t("我知道學校對我的期望", 3.0),
            t("完全不同的題目", 4.0),
            t("overall SATISFACTION?", 5.0),
            t("Work life balance", 6.0),
            t("Work-life balanced", 7.0),
        ];
        for threshold in [0u8, 50, 80, 95, 100] {
            let rec = reconcile(&backend, &teacher, &rules(threshold)).unwrap();
            let c = rec.counts;
            assert!(c.is_partition(), "threshold {}: {:?}", threshold, c);
            assert_eq!(c.backend_total, backend.len());
            assert_eq!(c.teacher_total, teacher.len());
            // Keys are unique here, so each exact row is one record per side.
            assert_eq!(c.exact_rows, c.backend_exact);
            assert_eq!(c.exact_rows, c.teacher_exact);
            assert_eq!(
                rec.results().len(),
                c.exact_rows + c.fuzzy_suggestions + c.backend_unmatched + c.teacher_unmatched
            );
        }
    }

    #[test]
    fn partition_counts_records_under_cross_product() {
        let backend = vec![b("Q1", 1.0), b("q1", 2.0), b("Q9", 3.0)];
        let teacher = vec![t("Q1", 3.0), t("Q-1", 4.0)];
        let rec = reconcile(&backend, &teacher, &rules(100)).unwrap();
        assert_eq!(rec.counts.exact_rows, 4);
        assert_eq!(rec.counts.backend_exact, 2);
        assert_eq!(rec.counts.teacher_exact, 2);
        assert!(rec.counts.is_partition());
    }

    #[test]
    fn reconcile_rejects_duplicates_when_asked() {
        let backend = vec![b("Q1", 1.0), b("q1", 2.0)];
        let r = MatchRules {
            fuzzy_threshold: 80,
            duplicate_key_mode: DuplicateKeyMode::Reject,
        };
        assert!(matches!(
            reconcile(&backend, &[], &r),
            Err(MatchingErrors::DuplicateKey {
                side: Side::Backend,
                ..
            })
        ));
    }
}
