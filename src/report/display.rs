// Console presentation of the pipeline results.

use crate::report::*;

/// Renders rows under a header with every column padded to its widest cell.
pub fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows.iter() {
        for (idx, cell) in row.iter().enumerate() {
            let w = cell.chars().count();
            match widths.get_mut(idx) {
                Some(current) if *current < w => *current = w,
                Some(_) => {}
                None => widths.push(w),
            }
        }
    }

    let render_line = |cells: &[String]| -> String {
        let line: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(idx, c)| format!("{:<width$}", c, width = widths[idx]))
            .collect();
        line.join("  ").trim_end().to_string()
    };

    let mut out = render_line(header);
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in rows.iter() {
        out.push_str(&render_line(row));
        out.push('\n');
    }
    out
}

fn summary_rows(rows: &[SummaryDisplay]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|d| {
            vec![
                d.int_id.clone(),
                d.int_name.clone(),
                d.total_interviews.to_string(),
                d.min_duration_display.clone(),
                d.avg_duration_display.clone(),
                d.max_duration_display.clone(),
                d.avg_questions.to_string(),
                d.total_dk.to_string(),
                d.total_rf.to_string(),
                d.total_na.to_string(),
            ]
        })
        .collect()
}

pub fn overall_average_line(output: &PipelineOutput) -> String {
    match output.overall_average_duration() {
        Some(avg) => format!("Overall average time: {}", format_average_minutes(avg)),
        None => "Overall average time: n/a".to_string(),
    }
}

pub fn render_report(table: &SurveyTable, output: &PipelineOutput) -> String {
    let mut out = String::new();

    let (check_header, check_rows) = output.duration_check_table(table);
    out.push_str("Interview durations\n\n");
    out.push_str(&render_table(&check_header, &check_rows));

    let header: Vec<String> = SUMMARY_COLUMNS.iter().map(|s| s.to_string()).collect();
    out.push_str("\nInterviewer statistics\n\n");
    out.push_str(&render_table(&header, &summary_rows(&output.summary_display())));

    out.push('\n');
    out.push_str(&format!("Total interviews: {}\n", output.total_interviews()));
    out.push_str(&overall_average_line(output));
    out.push('\n');

    let diag = &output.diagnostics;
    if diag.unparseable_rows() > 0 {
        out.push_str(&format!(
            "Rows without a usable start or end time: {}\n",
            diag.unparseable_rows()
        ));
    }
    if diag.negative_duration_rows() > 0 {
        out.push_str(&format!(
            "Rows ending before they start: {}\n",
            diag.negative_duration_rows()
        ));
    }
    if !diag.excluded_roles.is_empty() {
        out.push_str(&format!(
            "Roles skipped for a missing id or name column: {}\n",
            diag.excluded_roles.len()
        ));
    }
    out
}

pub fn print_report(table: &SurveyTable, output: &PipelineOutput) {
    print!("{}", render_report(table, output));
}
