// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use chrono::{DateTime, Utc};

use crate::schema::ResolvedSchema;

/// The content of one cell of the survey table.
///
/// The readers decide how the raw file content maps to these states. Blank
/// text is kept as text here and only treated as missing when the cell is
/// inspected.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    /// No value at all (empty cell, NA marker, spreadsheet error).
    Missing,
    Text(String),
    Numeric(f64),
}

pub(crate) static MISSING_CELL: Cell = Cell::Missing;

impl Cell {
    /// True for missing cells, whitespace-only text and NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Numeric(x) => x.is_nan(),
        }
    }

    /// The canonical string form of the cell, or None when it is missing.
    ///
    /// Text is trimmed. Integer-valued numbers are rendered without a
    /// fractional part, so that `197.0` read from a spreadsheet is `"197"`.
    pub fn canonical(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        match self {
            Cell::Missing => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Numeric(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => {
                Some(format!("{}", *x as i64))
            }
            Cell::Numeric(x) => Some(format!("{}", x)),
        }
    }
}

/// A survey table, one row per respondent, as loaded from a file.
///
/// Rows may be shorter than the header: absent trailing cells read as missing.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct SurveyTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SurveyTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&MISSING_CELL)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

// ********* Configuration **********

/// How interviewer columns are recognized.
///
/// A column is an interviewer-name column when it starts with one of the
/// prefixes and ends with `name_suffix`; likewise for ids. Prefix membership
/// is a plain starts-with test against every prefix.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoleColumns {
    pub prefixes: Vec<String>,
    pub id_suffix: String,
    pub name_suffix: String,
}

impl Default for RoleColumns {
    fn default() -> Self {
        RoleColumns {
            prefixes: ["F", "M", "HH", "ORGHH", "C"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            id_suffix: "IntID_W4".to_string(),
            name_suffix: "IntName_W4".to_string(),
        }
    }
}

/// Names of the required columns.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnNames {
    pub respondent_id: String,
    pub start_time: String,
    pub end_time: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            respondent_id: "ID".to_string(),
            start_time: "StartTime_TS".to_string(),
            end_time: "EndTime_TS".to_string(),
        }
    }
}

/// Derived fields of the pipeline. Input columns that carry one of these
/// names are never treated as questions.
pub const DERIVED_COLUMNS: [&str; 4] = ["Start_dt", "End_dt", "duration_minutes", "duration_display"];

/// Terminal suffixes marking the special response codes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReservedCodes {
    pub dont_know: String,
    pub refuse: String,
    pub not_applicable: String,
}

impl Default for ReservedCodes {
    fn default() -> Self {
        ReservedCodes {
            dont_know: "97".to_string(),
            refuse: "99".to_string(),
            not_applicable: "98".to_string(),
        }
    }
}

impl ReservedCodes {
    /// A value may end in at most one code: no code can be empty or be a
    /// suffix of another one.
    pub fn check(&self) -> Result<(), PipelineError> {
        let codes = [&self.dont_know, &self.refuse, &self.not_applicable];
        for (i, a) in codes.iter().enumerate() {
            if a.is_empty() {
                return Err(PipelineError::InvalidRules(
                    "reserved response codes may not be empty".to_string(),
                ));
            }
            for b in codes.iter().skip(i + 1) {
                if a.ends_with(b.as_str()) || b.ends_with(a.as_str()) {
                    return Err(PipelineError::InvalidRules(format!(
                        "reserved response codes {:?} and {:?} overlap",
                        a, b
                    )));
                }
            }
        }
        Ok(())
    }
}

/// What happens to long-form events whose interviewer id cell is missing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MissingIdPolicy {
    /// The event is not counted for any interviewer.
    Drop,
    /// The event is counted under an explicit interviewer id.
    Bucket(String),
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NegativeDurationPolicy {
    /// End before start yields a negative duration that is kept as-is.
    Keep,
    /// Rows with end before start are dropped like unparseable rows.
    Drop,
}

/// Rounding applied to the mean number of questions answered.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RoundingMode {
    HalfUp,
    HalfEven,
}

impl RoundingMode {
    pub fn round(self, x: f64) -> f64 {
        match self {
            RoundingMode::HalfUp => (x + 0.5).floor(),
            RoundingMode::HalfEven => {
                let floor = x.floor();
                let diff = x - floor;
                if diff > 0.5 {
                    floor + 1.0
                } else if diff < 0.5 || floor % 2.0 == 0.0 {
                    floor
                } else {
                    floor + 1.0
                }
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PipelineRules {
    pub roles: RoleColumns,
    pub columns: ColumnNames,
    pub codes: ReservedCodes,
    pub missing_id_policy: MissingIdPolicy,
    pub negative_duration_policy: NegativeDurationPolicy,
    pub avg_questions_rounding: RoundingMode,
}

impl Default for PipelineRules {
    fn default() -> Self {
        PipelineRules {
            roles: RoleColumns::default(),
            columns: ColumnNames::default(),
            codes: ReservedCodes::default(),
            missing_id_policy: MissingIdPolicy::Drop,
            negative_duration_policy: NegativeDurationPolicy::Keep,
            avg_questions_rounding: RoundingMode::HalfUp,
        }
    }
}

impl PipelineRules {
    pub fn check(&self) -> Result<(), PipelineError> {
        let roles = &self.roles;
        if roles.id_suffix.is_empty() || roles.name_suffix.is_empty() {
            return Err(PipelineError::InvalidRules(
                "interviewer id and name suffixes may not be empty".to_string(),
            ));
        }
        if roles.id_suffix.ends_with(roles.name_suffix.as_str())
            || roles.name_suffix.ends_with(roles.id_suffix.as_str())
        {
            return Err(PipelineError::InvalidRules(format!(
                "interviewer id suffix {:?} and name suffix {:?} overlap",
                roles.id_suffix, roles.name_suffix
            )));
        }
        if let MissingIdPolicy::Bucket(label) = &self.missing_id_policy {
            if label.trim().is_empty() {
                return Err(PipelineError::InvalidRules(
                    "the label for missing interviewer ids may not be blank".to_string(),
                ));
            }
        }
        self.codes.check()
    }
}

// ******** Output data structures *********

/// Special response counts of one respondent.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ResponseCounts {
    pub dont_know: u64,
    pub refuse: u64,
    pub not_applicable: u64,
}

/// A respondent row that survived timestamp parsing, with its derived fields.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EnrichedRecord {
    /// Index of the row in the source table.
    pub row: usize,
    pub respondent_id: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub counts: ResponseCounts,
    pub questions_answered: u64,
}

impl EnrichedRecord {
    pub fn duration_display(&self) -> String {
        crate::duration::format_minutes(self.duration_minutes)
    }
}

/// One (respondent, interviewer role) pair of the long form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InterviewEvent {
    pub respondent_id: Option<String>,
    pub role: String,
    pub interviewer_id: Option<String>,
    pub interviewer_name: Option<String>,
    pub duration_minutes: i64,
    pub counts: ResponseCounts,
    pub questions_answered: u64,
}

/// Per-interviewer statistics, in numeric form.
#[derive(PartialEq, Debug, Clone)]
pub struct InterviewerSummary {
    pub interviewer_id: String,
    /// First non-missing name seen for this id.
    pub interviewer_name: Option<String>,
    pub total_interviews: u64,
    pub min_duration_minutes: i64,
    pub avg_duration_minutes: f64,
    pub max_duration_minutes: i64,
    pub avg_questions: i64,
    pub total_dont_know: u64,
    pub total_refuse: u64,
    pub total_not_applicable: u64,
}

/// The column names of the interviewer statistics table, in export order.
pub const SUMMARY_COLUMNS: [&str; 10] = [
    "IntID",
    "IntName",
    "total_interviews",
    "min_duration_display",
    "avg_duration_display",
    "max_duration_display",
    "avg_questions",
    "total_DK",
    "total_RF",
    "total_NA",
];

/// Per-interviewer statistics, formatted for presentation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SummaryDisplay {
    pub int_id: String,
    pub int_name: String,
    pub total_interviews: u64,
    pub min_duration_display: String,
    pub avg_duration_display: String,
    pub max_duration_display: String,
    pub avg_questions: i64,
    pub total_dk: u64,
    pub total_rf: u64,
    pub total_na: u64,
}

/// Why a respondent row was left out of the pipeline.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ExclusionReason {
    UnparseableStart,
    UnparseableEnd,
    UnparseableBoth,
    NegativeDuration,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DroppedRow {
    pub row: usize,
    pub respondent_id: Option<String>,
    pub reason: ExclusionReason,
}

/// Why an interviewer role found in the header takes no part in the reshape.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RoleExclusion {
    MissingIdColumn { prefix: String, name_column: String },
    MissingNameColumn { prefix: String, id_column: String },
}

/// Everything the pipeline recovered from by exclusion.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Diagnostics {
    pub dropped_rows: Vec<DroppedRow>,
    pub excluded_roles: Vec<RoleExclusion>,
    /// Long-form events with a missing interviewer id.
    pub events_without_interviewer: u64,
}

impl Diagnostics {
    /// Rows dropped because a start or end time could not be read.
    pub fn unparseable_rows(&self) -> usize {
        self.dropped_rows
            .iter()
            .filter(|d| d.reason != ExclusionReason::NegativeDuration)
            .count()
    }

    /// Rows dropped because they end before they start.
    pub fn negative_duration_rows(&self) -> usize {
        self.dropped_rows
            .iter()
            .filter(|d| d.reason == ExclusionReason::NegativeDuration)
            .count()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct PipelineOutput {
    pub schema: ResolvedSchema,
    pub records: Vec<EnrichedRecord>,
    pub events: Vec<InterviewEvent>,
    pub summaries: Vec<InterviewerSummary>,
    pub diagnostics: Diagnostics,
}

/// Errors that prevent the pipeline from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PipelineError {
    /// A required column is absent from the header.
    MissingColumn(String),
    InvalidRules(String),
    RowTooLong {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl Error for PipelineError {}

impl Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::MissingColumn(name) => {
                write!(f, "required column {:?} is missing from the input", name)
            }
            PipelineError::InvalidRules(msg) => write!(f, "invalid pipeline rules: {}", msg),
            PipelineError::RowTooLong {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {} has {} cells but the header has only {} columns",
                row, found, expected
            ),
        }
    }
}
