/*!
Quality-control statistics for interviewer-administered surveys.

Starting from a survey table with one row per respondent, the pipeline:

1. resolves the interviewer id/name column pairs and the question columns from
   the header ([`resolve_schema`]),
2. parses the start and end times and computes the interview duration in whole
   minutes, dropping the rows whose times cannot be read ([`parse_timestamp`],
   [`duration_minutes`]),
3. counts the Don't-Know, Refuse and Not-Applicable codes and the answered
   questions of every row ([`classify_cell`]),
4. reshapes the table into one event per (respondent, interviewer role)
   ([`reshape_long`]),
5. aggregates the events per interviewer ([`aggregate_interviewers`]).

[`run_pipeline`] runs all of them. The whole table is held in memory. The long
form holds one event per kept row and paired role, so its size grows with
rows × roles: this is the dominant memory cost.

See the [`manual`] for the input conventions and the policies applied to
incomplete data.
*/
mod aggregate;
pub mod builder;
mod classify;
mod config;
mod duration;
pub mod manual;
mod reshape;
mod schema;

use log::{debug, info};

pub use crate::aggregate::{aggregate_interviewers, format_average_minutes};
pub use crate::classify::{classify_cell, classify_row, ResponseCode};
pub use crate::config::*;
pub use crate::duration::{duration_minutes, format_minutes, parse_timestamp};
pub use crate::reshape::reshape_long;
pub use crate::schema::{resolve_schema, ColumnHandle, ResolvedRole, ResolvedSchema};

/// Runs the full pipeline on a table.
///
/// Fails only on structural problems: invalid rules or a missing required
/// column. Rows and roles that cannot be used are left out and reported in
/// [`PipelineOutput::diagnostics`].
pub fn run_pipeline(
    table: &SurveyTable,
    rules: &PipelineRules,
) -> Result<PipelineOutput, PipelineError> {
    info!(
        "Processing {} rows and {} columns",
        table.num_rows(),
        table.headers.len()
    );
    debug!("run_pipeline: rules: {:?}", rules);
    rules.check()?;

    let schema = resolve_schema(&table.headers, rules)?;
    let (timed, dropped_rows) =
        duration::compute_durations(table, &schema, rules.negative_duration_policy);
    let records = classify::classify_records(table, &schema, &rules.codes, timed);
    let events = reshape_long(table, &schema, &records);
    info!(
        "{} respondents kept, {} interview events",
        records.len(),
        events.len()
    );
    let (summaries, events_without_interviewer) = aggregate_interviewers(&events, rules);

    let diagnostics = Diagnostics {
        dropped_rows,
        excluded_roles: schema.excluded_roles.clone(),
        events_without_interviewer,
    };
    Ok(PipelineOutput {
        schema,
        records,
        events,
        summaries,
        diagnostics,
    })
}

impl PipelineOutput {
    /// The number of respondents with a usable duration.
    pub fn total_interviews(&self) -> usize {
        self.records.len()
    }

    /// Mean duration over all kept respondents, None when there are none.
    pub fn overall_average_duration(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let total: i64 = self.records.iter().map(|r| r.duration_minutes).sum();
        Some(total as f64 / self.records.len() as f64)
    }

    pub fn summary_display(&self) -> Vec<SummaryDisplay> {
        self.summaries.iter().map(|s| s.display()).collect()
    }

    /// The per-respondent duration check: ID, every interviewer id column,
    /// every interviewer name column, parsed start and end, duration.
    pub fn duration_check_table(&self, table: &SurveyTable) -> (Vec<String>, Vec<Vec<String>>) {
        let schema = &self.schema;
        let mut header: Vec<String> = vec![schema.respondent_id.name.clone()];
        header.extend(schema.id_columns.iter().map(|c| c.name.clone()));
        header.extend(schema.name_columns.iter().map(|c| c.name.clone()));
        header.extend(
            ["Start_dt", "End_dt", "duration_minutes"]
                .iter()
                .map(|s| s.to_string()),
        );

        let rows: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|rec| {
                let mut row: Vec<String> = vec![rec.respondent_id.clone().unwrap_or_default()];
                for c in schema.id_columns.iter().chain(schema.name_columns.iter()) {
                    row.push(table.cell(rec.row, c.index).canonical().unwrap_or_default());
                }
                row.push(rec.start.format("%Y-%m-%d %H:%M:%S%:z").to_string());
                row.push(rec.end.format("%Y-%m-%d %H:%M:%S%:z").to_string());
                row.push(rec.duration_minutes.to_string());
                row
            })
            .collect();
        (header, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;

    const HEADER: [&str; 10] = [
        "ID",
        "StartTime_TS",
        "EndTime_TS",
        "FIntID_W4",
        "FIntName_W4",
        "MIntID_W4",
        "MIntName_W4",
        "Q1",
        "Q2",
        "Q3",
    ];

    fn sample_table() -> SurveyTable {
        let mut builder = TableBuilder::new(&HEADER);
        let rows: [[&str; 10]; 4] = [
            ["r1", "2024-01-01T10:00:00Z", "2024-01-01T10:29:45Z", "5", "Ama", "3", "Yaw", "1", "97", ""],
            ["r2", "2024-01-01T11:00:00Z", "2024-01-01T11:40:00Z", "3", "Esi", "5", "Ama", "99", "98", "2"],
            ["r3", "garbage", "2024-01-01T11:40:00Z", "5", "Ama", "3", "Yaw", "97", "97", "97"],
            ["r4", "2024-01-01T12:00:00Z", "2024-01-01T12:10:00Z", "", "", "3", "Yaw", " ", "", "197"],
        ];
        for r in rows.iter() {
            builder.add_row_text(r).unwrap();
        }
        builder.build()
    }

    #[test]
    fn end_to_end() {
        let _ = env_logger::builder().is_test(true).try_init();
        let table = sample_table();
        let output = run_pipeline(&table, &PipelineRules::default()).unwrap();

        assert_eq!(output.total_interviews(), 3);
        assert_eq!(output.diagnostics.dropped_rows.len(), 1);
        assert_eq!(output.diagnostics.dropped_rows[0].respondent_id, Some("r3".to_string()));
        // 3 kept respondents x 2 roles
        assert_eq!(output.events.len(), 6);
        assert_eq!(output.diagnostics.events_without_interviewer, 1);

        let display = output.summary_display();
        let ids: Vec<&str> = display.iter().map(|d| d.int_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "5"]);

        // Interviewer 3: r2 (F, 40 min) and r1, r4 (M, 29 and 10 min)
        let three = &display[0];
        assert_eq!(three.int_name, "Esi");
        assert_eq!(three.total_interviews, 3);
        assert_eq!(three.min_duration_display, "10 min");
        assert_eq!(three.avg_duration_display, "26.33 min");
        assert_eq!(three.max_duration_display, "40 min");
        // answered: r2 = 3, r1 = 2, r4 = 1
        assert_eq!(three.avg_questions, 2);
        assert_eq!(three.total_dk, 2);
        assert_eq!(three.total_rf, 1);
        assert_eq!(three.total_na, 1);

        // Interviewer 5: r1 (F) and r2 (M)
        let five = &display[1];
        assert_eq!(five.int_name, "Ama");
        assert_eq!(five.total_interviews, 2);
        assert_eq!(five.avg_duration_display, "34.5 min");
        assert_eq!(five.total_dk, 1);
        assert_eq!(five.total_rf, 1);
        assert_eq!(five.total_na, 1);
    }

    #[test]
    fn dropped_rows_are_absent_everywhere() {
        let table = sample_table();
        let output = run_pipeline(&table, &PipelineRules::default()).unwrap();
        let r3 = Some("r3".to_string());
        assert!(output.records.iter().all(|r| r.respondent_id != r3));
        assert!(output.events.iter().all(|e| e.respondent_id != r3));
        let (_, rows) = output.duration_check_table(&table);
        assert!(rows.iter().all(|r| r[0] != "r3"));
        // r3 would have added three DK codes to interviewer 5
        assert_eq!(output.summaries[1].total_dont_know, 1);
    }

    #[test]
    fn duration_check_columns() {
        let table = sample_table();
        let output = run_pipeline(&table, &PipelineRules::default()).unwrap();
        let (header, rows) = output.duration_check_table(&table);
        assert_eq!(
            header,
            vec![
                "ID",
                "FIntID_W4",
                "MIntID_W4",
                "FIntName_W4",
                "MIntName_W4",
                "Start_dt",
                "End_dt",
                "duration_minutes"
            ]
        );
        assert_eq!(
            rows[0],
            vec![
                "r1",
                "5",
                "3",
                "Ama",
                "Yaw",
                "2024-01-01 10:00:00+00:00",
                "2024-01-01 10:29:45+00:00",
                "29"
            ]
        );
        let avg = output.overall_average_duration().unwrap();
        assert_eq!(format_average_minutes(avg), "26.33 min");
    }

    #[test]
    fn no_usable_rows_gives_empty_summary() {
        let mut builder = TableBuilder::new(&HEADER);
        builder
            .add_row_text(&["r1", "", "", "5", "Ama", "3", "Yaw", "1", "2", "3"])
            .unwrap();
        let output = run_pipeline(&builder.build(), &PipelineRules::default()).unwrap();
        assert!(output.summaries.is_empty());
        assert!(output.events.is_empty());
        assert_eq!(output.overall_average_duration(), None);
        assert_eq!(
            output.diagnostics.dropped_rows[0].reason,
            ExclusionReason::UnparseableBoth
        );
    }

    #[test]
    fn no_question_columns_gives_zero_counts() {
        let mut builder = TableBuilder::new(&[
            "ID",
            "StartTime_TS",
            "EndTime_TS",
            "FIntID_W4",
            "FIntName_W4",
        ]);
        builder
            .add_row_text(&["r1", "2024-01-01T10:00:00Z", "2024-01-01T10:29:45Z", "5", "Ama"])
            .unwrap();
        builder
            .add_row_text(&["r2", "2024-01-01T11:00:00Z", "2024-01-01T11:10:00Z", "5", "Ama"])
            .unwrap();
        let output = run_pipeline(&builder.build(), &PipelineRules::default()).unwrap();

        assert!(output.schema.question_columns.is_empty());
        assert_eq!(output.records.len(), 2);
        for rec in output.records.iter() {
            assert_eq!(rec.counts, ResponseCounts::default());
            assert_eq!(rec.questions_answered, 0);
        }
        assert_eq!(output.records[0].duration_display(), "29 min");
        assert_eq!(output.records[1].duration_display(), "10 min");

        let s = &output.summaries[0];
        assert_eq!(s.total_interviews, 2);
        assert_eq!(s.avg_questions, 0);
        assert_eq!(
            (s.total_dont_know, s.total_refuse, s.total_not_applicable),
            (0, 0, 0)
        );
    }

    #[test]
    fn reruns_are_identical() {
        let table = sample_table();
        let rules = PipelineRules::default();
        let first = run_pipeline(&table, &rules).unwrap();
        let second = run_pipeline(&table, &rules).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let rules = PipelineRules {
            codes: ReservedCodes {
                dont_know: "9".to_string(),
                ..ReservedCodes::default()
            },
            ..PipelineRules::default()
        };
        assert!(matches!(
            run_pipeline(&sample_table(), &rules),
            Err(PipelineError::InvalidRules(_))
        ));
    }
}
