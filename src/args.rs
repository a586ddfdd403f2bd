use clap::Parser;

/// Reconciles the question labels of a backend statistics export with a teacher spreadsheet.
///
/// Without arguments, the default file names are read from the current directory.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the inputs, the output and the matching rules.
    /// Paths in this file are relative to its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, default numeric_descriptive_stats.csv) The backend table, with the columns
    /// Original_Column, Mean and N. Overrides the path given in the configuration file.
    #[clap(short, long, value_parser)]
    pub backend: Option<String>,

    /// (file path, default '2025_Teacher_ES - mean.csv') The teacher table, with the columns
    /// 問題 and 學校平均值. Overrides the path given in the configuration file.
    #[clap(short, long, value_parser)]
    pub teacher: Option<String>,

    /// (file path, default Backend_vs_Teacher_Comparison_ADVANCED.xlsx) The Excel report to write.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (0-100, default 80) The similarity a fuzzy suggestion must strictly exceed.
    #[clap(long, value_parser)]
    pub threshold: Option<u8>,

    /// (crossProduct or reject, default crossProduct) What to do when one side has several
    /// questions with the same normalized text.
    #[clap(long, value_parser)]
    pub duplicate_keys: Option<String>,

    /// When the backend table is an Excel file, the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub backend_worksheet_name: Option<String>,

    /// When the teacher table is an Excel file, the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub teacher_worksheet_name: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the counts of each category are written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub summary_out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, the run fails when the
    /// computed summary differs from it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
