use log::debug;

use crate::config::*;
use crate::duration::TimedRow;
use crate::schema::ResolvedSchema;

/// The special response categories.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ResponseCode {
    DontKnow,
    Refuse,
    NotApplicable,
}

/// Classifies a cell by the terminal code of its canonical string form.
///
/// Missing and blank cells are never classified. Matching is on the suffix
/// only: `"97"`, `"197"` and `"1997"` are all Don't-Know with the default
/// codes.
pub fn classify_cell(cell: &Cell, codes: &ReservedCodes) -> Option<ResponseCode> {
    let s = cell.canonical()?;
    if s.ends_with(codes.dont_know.as_str()) {
        Some(ResponseCode::DontKnow)
    } else if s.ends_with(codes.refuse.as_str()) {
        Some(ResponseCode::Refuse)
    } else if s.ends_with(codes.not_applicable.as_str()) {
        Some(ResponseCode::NotApplicable)
    } else {
        None
    }
}

/// Counts the special codes and the answered questions of one row.
pub fn classify_row<'a, I>(cells: I, codes: &ReservedCodes) -> (ResponseCounts, u64)
where
    I: IntoIterator<Item = &'a Cell>,
{
    let mut counts = ResponseCounts::default();
    let mut answered: u64 = 0;
    for cell in cells {
        if cell.is_missing() {
            continue;
        }
        answered += 1;
        match classify_cell(cell, codes) {
            Some(ResponseCode::DontKnow) => counts.dont_know += 1,
            Some(ResponseCode::Refuse) => counts.refuse += 1,
            Some(ResponseCode::NotApplicable) => counts.not_applicable += 1,
            None => {}
        }
    }
    (counts, answered)
}

pub(crate) fn classify_records(
    table: &SurveyTable,
    schema: &ResolvedSchema,
    codes: &ReservedCodes,
    timed: Vec<TimedRow>,
) -> Vec<EnrichedRecord> {
    timed
        .into_iter()
        .map(|t| {
            let cells = schema
                .question_columns
                .iter()
                .map(|c| table.cell(t.row, c.index));
            let (counts, questions_answered) = classify_row(cells, codes);
            debug!(
                "classify_records: row {} respondent {:?}: {:?} answered: {}",
                t.row, t.respondent_id, counts, questions_answered
            );
            EnrichedRecord {
                row: t.row,
                respondent_id: t.respondent_id,
                start: t.start,
                end: t.end,
                duration_minutes: t.duration_minutes,
                counts,
                questions_answered,
            }
        })
        .collect()
}
