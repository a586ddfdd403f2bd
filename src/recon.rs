use log::{debug, info, warn};

use label_matching::builder::Builder;
use label_matching::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::recon::config_reader::*;
use crate::recon::io_common::{simplify_file_name, TableLayout};

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod report_writer;

#[derive(Debug, Snafu)]
pub enum ReconError {
    #[snafu(display("Input file {path} is missing or cannot be read"))]
    InputNotFound {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet named {name} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("No worksheet in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("File {path} has no header row"))]
    MissingHeader { path: String },
    #[snafu(display("File {path} has no column {column}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("Column {column} of {path} has no numeric value"))]
    NoNumericValues { path: String, column: String },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a number in the JSON configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Invalid matching rules: {source}"))]
    InvalidRules { source: MatchingErrors },
    #[snafu(display("Cannot match the records: {source}"))]
    Matching { source: MatchingErrors },
    #[snafu(display("Error writing report {path} (is it open in another program?)"))]
    WritingReport {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error writing summary {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReconResult<T> = Result<T, ReconError>;

/// Everything a run needs, once the defaults, the configuration file and the
/// command line have been merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub backend: config_reader::TableSource,
    pub teacher: config_reader::TableSource,
    pub output_file: String,
    pub rules: MatchRules,
    pub summary_out: Option<String>,
    pub reference: Option<String>,
}

fn relative_to(root: &Option<PathBuf>, path: &str) -> String {
    match root {
        Some(r) => r.join(path).display().to_string(),
        None => path.to_string(),
    }
}

/// Merges the built-in defaults, the configuration file (if any) and the
/// command line flags, in increasing priority.
pub fn resolve_settings(args: &Args) -> ReconResult<Settings> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root = Path::new(config_path).parent().map(|p| p.to_path_buf());
            (config, root)
        }
        None => (ReconConfig::default(), None),
    };

    let mut backend = match &config.backend {
        Some(ts) => TableSource {
            file_path: relative_to(&root, &ts.file_path),
            ..ts.clone()
        },
        None => TableSource::from_path(BACKEND_FILE),
    };
    if let Some(p) = &args.backend {
        backend.file_path = p.clone();
    }
    if let Some(ws) = &args.backend_worksheet_name {
        backend.excel_worksheet_name = Some(ws.clone());
    }

    let mut teacher = match &config.teacher {
        Some(ts) => TableSource {
            file_path: relative_to(&root, &ts.file_path),
            ..ts.clone()
        },
        None => TableSource::from_path(TEACHER_FILE),
    };
    if let Some(p) = &args.teacher {
        teacher.file_path = p.clone();
    }
    if let Some(ws) = &args.teacher_worksheet_name {
        teacher.excel_worksheet_name = Some(ws.clone());
    }

    let output_file = match (&args.out, &config.output_file) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => relative_to(&root, p),
        (None, None) => OUTPUT_FILE.to_string(),
    };

    let fuzzy_threshold = match args.threshold {
        Some(t) => t,
        None => config
            .fuzzy_threshold()?
            .unwrap_or(MatchRules::DEFAULT_THRESHOLD),
    };
    let duplicate_key_mode = match &args.duplicate_keys {
        Some(s) => parse_duplicate_key_mode(s)?,
        None => config
            .duplicate_key_mode()?
            .unwrap_or(MatchRules::DEFAULT_RULES.duplicate_key_mode),
    };
    let rules = MatchRules {
        fuzzy_threshold,
        duplicate_key_mode,
    };
    rules.validate().context(InvalidRulesSnafu {})?;

    let summary_out = match (&args.summary_out, &config.summary_file) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(p)) => Some(relative_to(&root, p)),
        (None, None) => None,
    };

    Ok(Settings {
        backend,
        teacher,
        output_file,
        rules,
        summary_out,
        reference: args.reference.clone(),
    })
}

/// Loads one side. Missing files are reported before any parsing.
fn read_table_values(
    source: &TableSource,
    default_layout: TableLayout,
) -> ReconResult<Vec<LabeledValue>> {
    let path = source.file_path.as_str();
    fs::metadata(path).context(InputNotFoundSnafu { path })?;
    info!("Attempting to read {:?} file {:?}", default_layout.side, path);
    let table = match source.provider()? {
        Provider::Csv => io_csv::read_csv_table(path)?,
        Provider::Xlsx => {
            io_excel::read_excel_table(path, source.excel_worksheet_name.as_deref())?
        }
    };
    let layout = source.layout(default_layout);
    io_common::read_values(&table, &layout, path)
}

fn build_summary_js(settings: &Settings, rec: &Reconciliation) -> JSValue {
    let c = &rec.counts;
    json!({
        "config": {
            "backendFile": simplify_file_name(&settings.backend.file_path),
            "teacherFile": simplify_file_name(&settings.teacher.file_path),
            "outputFile": simplify_file_name(&settings.output_file),
            "fuzzyThreshold": rec.threshold,
        },
        "results": {
            "backendRecords": c.backend_total,
            "teacherRecords": c.teacher_total,
            "exactMatches": c.exact_rows,
            "backendExact": c.backend_exact,
            "teacherExact": c.teacher_exact,
            "fuzzySuggestions": c.fuzzy_suggestions,
            "backendUnmatched": c.backend_unmatched,
            "teacherUnmatched": c.teacher_unmatched,
        }
    })
}

fn write_summary(summary_out: &str, pretty_js: &str) -> ReconResult<()> {
    if summary_out == "stdout" {
        println!("{}", pretty_js);
    } else if !summary_out.is_empty() {
        fs::write(summary_out, pretty_js).context(WritingSummarySnafu { path: summary_out })?;
        info!("Summary written to {}", summary_out);
    }
    Ok(())
}

pub fn run_reconciliation(settings: &Settings) -> ReconResult<Reconciliation> {
    println!("Starting reconciliation...");
    info!("settings: {:?}", settings);

    // Both tables must load before any matching starts.
    let backend = read_table_values(&settings.backend, TableLayout::backend_default())?;
    println!(
        "Read {} backend records from {}.",
        backend.len(),
        settings.backend.file_path
    );
    let teacher = read_table_values(&settings.teacher, TableLayout::teacher_default())?;
    println!(
        "Read {} teacher records from {}.",
        teacher.len(),
        settings.teacher.file_path
    );

    let mut builder = Builder::new(&settings.rules).context(InvalidRulesSnafu {})?;
    for v in backend {
        builder
            .add_value(Side::Backend, v)
            .context(MatchingSnafu {})?;
    }
    for v in teacher {
        builder
            .add_value(Side::Teacher, v)
            .context(MatchingSnafu {})?;
    }

    println!("Stage 1: normalized match...");
    println!(
        "Stage 2: fuzzy match (similarity > {}%)...",
        settings.rules.fuzzy_threshold
    );
    let rec = builder.reconcile().context(MatchingSnafu {})?;
    let c = &rec.counts;
    println!("Stage 1 found {} high-confidence matches.", c.exact_rows);
    println!("Stage 2 found {} fuzzy suggestions.", c.fuzzy_suggestions);
    println!(
        "Unmatched: {} backend records, {} teacher records.",
        c.backend_unmatched, c.teacher_unmatched
    );
    if !c.is_partition() {
        whatever!("Inconsistent reconciliation counts: {:?}", c);
    }

    println!("Writing the report to {}", settings.output_file);
    report_writer::write_report(&rec.report(), &settings.output_file)?;
    println!("{}", "-".repeat(30));
    println!("Report saved to {}", settings.output_file);
    println!("Review '1_Normalized_Match' first, then '2_Fuzzy_Suggestions'.");
    println!("{}", "-".repeat(30));

    let summary_js = build_summary_js(settings, &rec);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    debug!("summary: {}", pretty_js_stats);
    if let Some(summary_out) = &settings.summary_out {
        write_summary(summary_out, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &settings.reference {
        let summary_ref = read_summary(reference_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(rec)
}

/// Prints the error and its backtrace, if one was captured.
pub fn report_error(e: &ReconError) {
    warn!("Error occured {:?}", e);
    eprintln!("An error occured: {}", e);
    if let Some(source) = std::error::Error::source(e) {
        eprintln!("Caused by: {}", source);
    }
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}
