use std::path::Path;

use crate::recon::{io_common::TableLayout, *};

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

pub const BACKEND_FILE: &str = "numeric_descriptive_stats.csv";
pub const TEACHER_FILE: &str = "2025_Teacher_ES - mean.csv";
pub const OUTPUT_FILE: &str = "Backend_vs_Teacher_Comparison_ADVANCED.xlsx";

/// The supported file formats for the input tables.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    Xlsx,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TableSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "textColumn")]
    pub text_column: Option<String>,
    #[serde(rename = "meanColumn")]
    pub mean_column: Option<String>,
    #[serde(rename = "countColumn")]
    pub count_column: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl TableSource {
    pub fn from_path(path: &str) -> TableSource {
        TableSource {
            provider: None,
            file_path: path.to_string(),
            text_column: None,
            mean_column: None,
            count_column: None,
            excel_worksheet_name: None,
        }
    }

    /// The explicit provider, or the one matching the file extension.
    pub fn provider(&self) -> ReconResult<Provider> {
        let p = match &self.provider {
            Some(p) => p.to_lowercase(),
            None => Path::new(&self.file_path)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .unwrap_or_default(),
        };
        match p.as_str() {
            "csv" => Ok(Provider::Csv),
            "xlsx" | "xlsm" | "excel" => Ok(Provider::Xlsx),
            x => whatever!(
                "Cannot read {}: unknown provider {:?} (expected csv or xlsx)",
                self.file_path,
                x
            ),
        }
    }

    /// The default layout of the side, with the configured column names.
    pub fn layout(&self, default_layout: TableLayout) -> TableLayout {
        TableLayout {
            side: default_layout.side,
            text_columns: self
                .text_column
                .clone()
                .map(|c| vec![c])
                .unwrap_or(default_layout.text_columns),
            mean_columns: self
                .mean_column
                .clone()
                .map(|c| vec![c])
                .unwrap_or(default_layout.mean_columns),
            count_columns: match (&self.count_column, default_layout.count_columns) {
                (Some(c), Some(_)) => Some(vec![c.clone()]),
                (_, x) => x,
            },
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReconConfig {
    pub backend: Option<TableSource>,
    pub teacher: Option<TableSource>,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    #[serde(rename = "fuzzyThreshold")]
    pub fuzzy_threshold: Option<JSValue>,
    #[serde(rename = "duplicateKeyMode")]
    pub duplicate_key_mode: Option<String>,
    #[serde(rename = "summaryFile")]
    pub summary_file: Option<String>,
}

impl ReconConfig {
    pub fn fuzzy_threshold(&self) -> ReconResult<Option<u8>> {
        match &self.fuzzy_threshold {
            None => Ok(None),
            x => {
                let t = read_js_int(x)?;
                match u8::try_from(t) {
                    Ok(t) => Ok(Some(t)),
                    Err(_) => whatever!("fuzzyThreshold out of range: {}", t),
                }
            }
        }
    }

    pub fn duplicate_key_mode(&self) -> ReconResult<Option<DuplicateKeyMode>> {
        match &self.duplicate_key_mode {
            None => Ok(None),
            Some(s) => parse_duplicate_key_mode(s).map(Some),
        }
    }
}

pub fn parse_duplicate_key_mode(s: &str) -> ReconResult<DuplicateKeyMode> {
    match s {
        "crossProduct" => Ok(DuplicateKeyMode::CrossProduct),
        "reject" => Ok(DuplicateKeyMode::Reject),
        _ => whatever!("unknown duplicate key mode: {} (expected crossProduct or reject)", s),
    }
}

pub fn read_config(path: &str) -> ReconResult<ReconConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: ReconConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> ReconResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> ReconResult<u64> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.trim().parse::<u64>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let js = r#"{
            "backend": { "filePath": "b.csv" },
            "teacher": {
                "provider": "xlsx",
                "filePath": "t.data",
                "excelWorksheetName": "mean",
                "textColumn": "題目"
            },
            "outputFile": "out.xlsx",
            "fuzzyThreshold": "85",
            "duplicateKeyMode": "reject"
        }"#;
        let config: ReconConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.fuzzy_threshold().unwrap(), Some(85));
        assert_eq!(
            config.duplicate_key_mode().unwrap(),
            Some(DuplicateKeyMode::Reject)
        );
        let teacher = config.teacher.unwrap();
        assert_eq!(teacher.provider().unwrap(), Provider::Xlsx);
        let layout = teacher.layout(TableLayout::teacher_default());
        assert_eq!(layout.text_columns, vec!["題目".to_string()]);
        assert_eq!(layout.mean_columns, vec!["學校平均值", "Mean_Teacher"]);
        assert_eq!(layout.count_columns, None);
        assert_eq!(config.backend.unwrap().provider().unwrap(), Provider::Csv);
    }

    #[test]
    fn empty_config() {
        let config: ReconConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ReconConfig::default());
        assert_eq!(config.fuzzy_threshold().unwrap(), None);
    }

    #[test]
    fn bad_threshold() {
        let config: ReconConfig = serde_json::from_str(r#"{"fuzzyThreshold": "high"}"#).unwrap();
        assert!(matches!(
            config.fuzzy_threshold(),
            Err(ReconError::ParsingJsonNumber {})
        ));
        let config: ReconConfig = serde_json::from_str(r#"{"fuzzyThreshold": 300}"#).unwrap();
        assert!(config.fuzzy_threshold().is_err());
    }

    #[test]
    fn provider_from_extension() {
        assert_eq!(
            TableSource::from_path("a/B.XLSX").provider().unwrap(),
            Provider::Xlsx
        );
        assert!(TableSource::from_path("a/b.txt").provider().is_err());
    }

    #[test]
    fn duplicate_key_modes() {
        assert_eq!(
            parse_duplicate_key_mode("crossProduct").unwrap(),
            DuplicateKeyMode::CrossProduct
        );
        assert!(parse_duplicate_key_mode("first").is_err());
    }
}
