use crate::report::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The values that are read as missing in the input files, in addition to
/// blank cells.
pub const DEFAULT_MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(rename = "inputFile")]
    pub input_file: Option<String>,
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    #[serde(rename = "rolePrefixes")]
    pub role_prefixes: Option<Vec<String>>,
    #[serde(rename = "interviewerIdSuffix")]
    pub interviewer_id_suffix: Option<String>,
    #[serde(rename = "interviewerNameSuffix")]
    pub interviewer_name_suffix: Option<String>,
    #[serde(rename = "respondentIdColumn")]
    pub respondent_id_column: Option<String>,
    #[serde(rename = "startTimeColumn")]
    pub start_time_column: Option<String>,
    #[serde(rename = "endTimeColumn")]
    pub end_time_column: Option<String>,
    #[serde(rename = "dontKnowCode")]
    pub dont_know_code: Option<String>,
    #[serde(rename = "refuseCode")]
    pub refuse_code: Option<String>,
    #[serde(rename = "notApplicableCode")]
    pub not_applicable_code: Option<String>,
    #[serde(rename = "missingIdPolicy")]
    pub missing_id_policy: Option<String>,
    #[serde(rename = "unknownIdLabel")]
    pub unknown_id_label: Option<String>,
    #[serde(rename = "negativeDurations")]
    pub negative_durations: Option<String>,
    #[serde(rename = "avgQuestionsRounding")]
    pub avg_questions_rounding: Option<String>,
    #[serde(rename = "missingMarkers")]
    pub missing_markers: Option<Vec<String>>,
}

impl ReportConfig {
    pub fn missing_markers(&self) -> Vec<String> {
        match &self.missing_markers {
            Some(markers) => markers.clone(),
            None => DEFAULT_MISSING_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// Relative paths in a configuration file are relative to that file.
fn relative_to(root: &Path, file: Option<String>) -> Option<String> {
    file.map(|f| {
        if Path::new(&f).is_absolute() {
            f
        } else {
            root.join(&f).display().to_string()
        }
    })
}

pub fn read_config(path: &str) -> ReportResult<ReportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: ReportConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    if let Some(root) = Path::new(path).parent() {
        config.input_file = relative_to(root, config.input_file);
        config.output_file = relative_to(root, config.output_file);
    }
    info!("config: {:?}", config);
    Ok(config)
}

/// Applies the command line on top of the configuration file.
pub fn merge_args(config: ReportConfig, args: &Args) -> ReportConfig {
    ReportConfig {
        input_file: args.input.clone().or(config.input_file),
        input_type: args.input_type.clone().or(config.input_type),
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or(config.excel_worksheet_name),
        output_file: args.out.clone().or(config.output_file),
        role_prefixes: args.prefix.clone().or(config.role_prefixes),
        ..config
    }
}

pub fn validate_rules(config: &ReportConfig) -> ReportResult<PipelineRules> {
    let defaults = PipelineRules::default();
    let res = PipelineRules {
        roles: RoleColumns {
            prefixes: config
                .role_prefixes
                .clone()
                .unwrap_or(defaults.roles.prefixes),
            id_suffix: config
                .interviewer_id_suffix
                .clone()
                .unwrap_or(defaults.roles.id_suffix),
            name_suffix: config
                .interviewer_name_suffix
                .clone()
                .unwrap_or(defaults.roles.name_suffix),
        },
        columns: ColumnNames {
            respondent_id: config
                .respondent_id_column
                .clone()
                .unwrap_or(defaults.columns.respondent_id),
            start_time: config
                .start_time_column
                .clone()
                .unwrap_or(defaults.columns.start_time),
            end_time: config
                .end_time_column
                .clone()
                .unwrap_or(defaults.columns.end_time),
        },
        codes: ReservedCodes {
            dont_know: config
                .dont_know_code
                .clone()
                .unwrap_or(defaults.codes.dont_know),
            refuse: config.refuse_code.clone().unwrap_or(defaults.codes.refuse),
            not_applicable: config
                .not_applicable_code
                .clone()
                .unwrap_or(defaults.codes.not_applicable),
        },
        missing_id_policy: match config.missing_id_policy.as_deref() {
            None | Some("drop") => MissingIdPolicy::Drop,
            Some("bucket") => MissingIdPolicy::Bucket(
                config
                    .unknown_id_label
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
            Some(x) => {
                whatever!(
                    "Unknown missingIdPolicy {:?}: expected \"drop\" or \"bucket\"",
                    x
                )
            }
        },
        negative_duration_policy: match config.negative_durations.as_deref() {
            None | Some("keep") => NegativeDurationPolicy::Keep,
            Some("drop") => NegativeDurationPolicy::Drop,
            Some(x) => {
                whatever!(
                    "Unknown negativeDurations option {:?}: expected \"keep\" or \"drop\"",
                    x
                )
            }
        },
        avg_questions_rounding: match config.avg_questions_rounding.as_deref() {
            None | Some("halfUp") => RoundingMode::HalfUp,
            Some("halfEven") => RoundingMode::HalfEven,
            Some(x) => {
                whatever!(
                    "Unknown avgQuestionsRounding option {:?}: expected \"halfUp\" or \"halfEven\"",
                    x
                )
            }
        },
    };
    if let Err(e) = res.check() {
        whatever!("{}", e)
    }
    Ok(res)
}
