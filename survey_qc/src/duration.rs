use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};

use crate::config::*;
use crate::schema::ResolvedSchema;

// Formats carrying an explicit offset. %z accepts both +0100 and +01:00.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
];

// Naive formats, read as UTC.
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parses a timestamp cell into an absolute point in time.
///
/// Returns None for missing cells and for anything that is not a known
/// date-time layout. Naive timestamps are taken to be UTC.
pub fn parse_timestamp(cell: &Cell) -> Option<DateTime<Utc>> {
    let s = match cell {
        Cell::Text(_) => cell.canonical()?,
        _ => return None,
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Utc));
    }
    let with_offset = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(head) => format!("{}+00:00", head),
        None => s.clone(),
    };
    for fmt in OFFSET_FORMATS.iter() {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS.iter() {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    for fmt in DATE_FORMATS.iter() {
        if let Some(ndt) = NaiveDate::parse_from_str(&s, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

/// Elapsed whole minutes from start to end, truncated toward zero.
///
/// The result is negative when end is before start.
pub fn duration_minutes(start: &DateTime<Utc>, end: &DateTime<Utc>) -> i64 {
    (*end - *start).num_milliseconds() / 60_000
}

pub fn format_minutes(minutes: i64) -> String {
    format!("{} min", minutes)
}

/// A row with both timestamps parsed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct TimedRow {
    pub row: usize,
    pub respondent_id: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

/// Parses the timestamps of every row. Rows that fail are returned separately
/// with the reason and do not go any further.
pub(crate) fn compute_durations(
    table: &SurveyTable,
    schema: &ResolvedSchema,
    policy: NegativeDurationPolicy,
) -> (Vec<TimedRow>, Vec<DroppedRow>) {
    let mut kept: Vec<TimedRow> = Vec::with_capacity(table.num_rows());
    let mut dropped: Vec<DroppedRow> = Vec::new();

    for row in 0..table.num_rows() {
        let respondent_id = table.cell(row, schema.respondent_id.index).canonical();
        let start = parse_timestamp(table.cell(row, schema.start_time.index));
        let end = parse_timestamp(table.cell(row, schema.end_time.index));
        let timed = match (start, end) {
            (Some(start), Some(end)) => {
                let duration_minutes = duration_minutes(&start, &end);
                if duration_minutes < 0 && policy == NegativeDurationPolicy::Drop {
                    Err(ExclusionReason::NegativeDuration)
                } else {
                    Ok(TimedRow {
                        row,
                        respondent_id: respondent_id.clone(),
                        start,
                        end,
                        duration_minutes,
                    })
                }
            }
            (None, Some(_)) => Err(ExclusionReason::UnparseableStart),
            (Some(_), None) => Err(ExclusionReason::UnparseableEnd),
            (None, None) => Err(ExclusionReason::UnparseableBoth),
        };
        match timed {
            Ok(t) => kept.push(t),
            Err(reason) => {
                debug!(
                    "compute_durations: row {} (respondent {:?}) dropped: {:?}",
                    row, respondent_id, reason
                );
                dropped.push(DroppedRow {
                    row,
                    respondent_id,
                    reason,
                });
            }
        }
    }

    let negative = dropped
        .iter()
        .filter(|d| d.reason == ExclusionReason::NegativeDuration)
        .count();
    let unparseable = dropped.len() - negative;
    if unparseable > 0 {
        warn!(
            "{} of {} rows dropped because of unusable start or end times",
            unparseable,
            table.num_rows()
        );
    }
    if negative > 0 {
        warn!(
            "{} of {} rows dropped because they end before they start",
            negative,
            table.num_rows()
        );
    }
    (kept, dropped)
}
