use clap::Parser;

/// Interview duration and interviewer performance report for survey data.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. All its settings can be
    /// overridden by the options below. Relative file paths in it are relative to
    /// the configuration file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The survey data, one row per respondent (CSV or Excel .xlsx).
    /// Setting this option overrides the inputFile of the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. By default, it is guessed from the
    /// file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, the name of the worksheet to read. The first
    /// worksheet is used by default.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, default interviewer_statistics.xlsx) Where to write the
    /// interviewer statistics workbook.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or 'stdout') If specified, the summary is also written in JSON
    /// format to the given location.
    #[clap(long, value_parser)]
    pub json: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, the run fails
    /// when the computed summary differs from it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (repeatable) An interviewer role prefix, such as F or HH. When given, it
    /// replaces the default list F, M, HH, ORGHH, C.
    #[clap(long, value_parser)]
    pub prefix: Option<Vec<String>>,

    /// If passed as an argument, the tables are not printed.
    #[clap(long, takes_value = false)]
    pub quiet: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
