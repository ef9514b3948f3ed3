// Primitives for reading CSV files.

use std::io::Read;

use survey_qc::builder::TableBuilder;

use crate::report::{
    io_common::{header_name, text_cell},
    *,
};

pub fn read_csv_table(path: &str, missing_markers: &[String]) -> ReportResult<SurveyTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_csv_records(rdr, missing_markers)
}

/// Reads a CSV source whose first record is the header. Every field is text.
pub fn read_csv_records<R: Read>(
    mut rdr: csv::Reader<R>,
    missing_markers: &[String],
) -> ReportResult<SurveyTable> {
    let headers: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .enumerate()
        .map(|(idx, h)| header_name(idx, h))
        .collect();
    debug!("read_csv_records: header: {:?}", headers);
    let expected = headers.len();
    let mut builder = TableBuilder::new(&headers);

    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        ensure!(
            line.len() <= expected,
            CsvLineTooLongSnafu {
                lineno,
                expected,
                found: line.len()
            }
        );
        let cells: Vec<Cell> = line.iter().map(|s| text_cell(s, missing_markers)).collect();
        builder.add_row(cells).context(PipelineSnafu {})?;
    }
    debug!("read_csv_records: {} rows", builder.num_rows());
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_str(data: &str) -> ReportResult<SurveyTable> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());
        let markers: Vec<String> = vec!["".to_string(), "NA".to_string()];
        read_csv_records(rdr, &markers)
    }

    #[test]
    fn reads_text_cells_and_markers() {
        let table = read_str("ID,Q1,,Q3\n1,97,x,NA\n2, \n").unwrap();
        assert_eq!(table.headers, vec!["ID", "Q1", "Unnamed: 2", "Q3"]);
        assert_eq!(
            table.rows[0],
            vec![
                Cell::Text("1".to_string()),
                Cell::Text("97".to_string()),
                Cell::Text("x".to_string()),
                Cell::Missing
            ]
        );
        // Short rows are padded
        assert_eq!(
            table.rows[1],
            vec![
                Cell::Text("2".to_string()),
                Cell::Missing,
                Cell::Missing,
                Cell::Missing
            ]
        );
    }

    #[test]
    fn long_rows_are_malformed() {
        let res = read_str("ID,Q1\n1,2\n3,4,5\n");
        match res {
            Err(ReportError::CsvLineTooLong {
                lineno,
                expected,
                found,
            }) => {
                assert_eq!((lineno, expected, found), (3, 2, 3));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn missing_file() {
        let res = read_csv_table("/nonexistent/survey.csv", &[]);
        assert!(matches!(res, Err(ReportError::CsvOpen { .. })));
    }
}
