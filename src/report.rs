use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_qc::*;

use std::fs;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::report::config_reader::*;
use crate::report::io_common::{input_type, simplify_file_name, InputType};

pub mod config_reader;
mod display;
mod export_xlsx;
mod io_common;
mod io_csv;
mod io_excel;

pub const DEFAULT_OUTPUT_FILE: &str = "interviewer_statistics.xlsx";

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Error opening excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} has no worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("{path} is empty: a header row is required"))]
    MissingHeader { path: String },
    #[snafu(display("Error opening csv file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Could not read line {lineno} of the csv file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} has {found} fields but the header has {expected}"))]
    CsvLineTooLong {
        lineno: usize,
        expected: usize,
        found: usize,
    },
    #[snafu(display("No input file: use --input or set inputFile in the configuration"))]
    MissingInput {},
    #[snafu(display("Cannot tell the type of {path}: use --input-type csv or --input-type xlsx"))]
    UnknownInputType { path: String },
    #[snafu(display("Error reading {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error assembling the workbook"))]
    ZipExport { source: zip::result::ZipError },
    #[snafu(display("The survey data could not be processed"))]
    Pipeline { source: PipelineError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

fn read_survey_table(
    path: &str,
    kind: InputType,
    config: &ReportConfig,
) -> ReportResult<SurveyTable> {
    let markers = config.missing_markers();
    info!("Attempting to read survey file {:?} as {:?}", path, kind);
    let table = match kind {
        InputType::Csv => io_csv::read_csv_table(path, &markers)?,
        InputType::Xlsx => {
            io_excel::read_excel_table(path, config.excel_worksheet_name.as_deref(), &markers)?
        }
    };
    info!(
        "Read {} rows and {} columns from {}",
        table.num_rows(),
        table.headers.len(),
        simplify_file_name(path)
    );
    Ok(table)
}

fn build_summary_js(source: &str, output: &PipelineOutput) -> JSValue {
    let interviewers: Vec<JSValue> = output
        .summary_display()
        .iter()
        .map(|d| {
            json!({
                "IntID": d.int_id,
                "IntName": d.int_name,
                "total_interviews": d.total_interviews,
                "min_duration_display": d.min_duration_display,
                "avg_duration_display": d.avg_duration_display,
                "max_duration_display": d.max_duration_display,
                "avg_questions": d.avg_questions,
                "total_DK": d.total_dk,
                "total_RF": d.total_rf,
                "total_NA": d.total_na,
            })
        })
        .collect();
    let excluded_roles: Vec<JSValue> = output
        .diagnostics
        .excluded_roles
        .iter()
        .map(|r| match r {
            RoleExclusion::MissingIdColumn {
                prefix,
                name_column,
            } => json!({"role": prefix, "missing": "id", "column": name_column}),
            RoleExclusion::MissingNameColumn { prefix, id_column } => {
                json!({"role": prefix, "missing": "name", "column": id_column})
            }
        })
        .collect();
    json!({
        "source": simplify_file_name(source),
        "totalInterviews": output.total_interviews(),
        "overallAverageDuration": output.overall_average_duration().map(format_average_minutes),
        "droppedRows": output.diagnostics.dropped_rows.len(),
        "excludedRoles": excluded_roles,
        "interviewers": interviewers,
    })
}

pub fn read_summary(path: &str) -> ReportResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> ReportResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary {}", reference_path);
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {}", reference_path);
    Ok(())
}

pub fn run_report(args: &Args) -> ReportResult<()> {
    let file_config = match &args.config {
        Some(config_path) => read_config(config_path)?,
        None => ReportConfig::default(),
    };
    let config = merge_args(file_config, args);
    debug!("run_report: config: {:?}", config);

    // Validate the rules before touching the data.
    let rules = validate_rules(&config)?;

    let input_path = config.input_file.clone().context(MissingInputSnafu {})?;
    let kind = input_type(&input_path, config.input_type.as_deref())?;
    let table = read_survey_table(&input_path, kind, &config)?;

    let output = run_pipeline(&table, &rules).context(PipelineSnafu {})?;

    if !args.quiet {
        display::print_report(&table, &output);
    }

    let out_path = config
        .output_file
        .clone()
        .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string());
    export_xlsx::write_summary_workbook(&out_path, &output.summary_display())?;
    info!(
        "Statistics for {} interviewers written to {}",
        output.summaries.len(),
        out_path
    );

    let result_js = build_summary_js(&input_path, &output);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    match args.json.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(json_path) => {
            fs::write(json_path, &pretty_js_stats).context(WritingOutputSnafu { path: json_path })?
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(())
}
