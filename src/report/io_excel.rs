// Reads a survey table from an xlsx worksheet.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use chrono::{Duration, NaiveDate};

use survey_qc::builder::TableBuilder;

use crate::report::{
    io_common::{header_name, text_cell},
    *,
};

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> ReportResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it. Otherwise the first worksheet.
    match worksheet_name_o {
        Some(worksheet_name) => workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path }),
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path }),
    }
}

/// The text of a spreadsheet date serial (days since 1899-12-30), to the
/// millisecond.
fn excel_serial_text(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let ms = (serial * 86_400_000.0).round();
    if !ms.is_finite() {
        return None;
    }
    let dt = epoch.checked_add_signed(Duration::milliseconds(ms as i64))?;
    let fmt = if (ms as i64) % 1000 == 0 {
        "%Y-%m-%d %H:%M:%S"
    } else {
        "%Y-%m-%d %H:%M:%S%.3f"
    };
    Some(dt.format(fmt).to_string())
}

fn read_cell(cell: &DataType, missing_markers: &[String]) -> Cell {
    match cell {
        DataType::Empty | DataType::Error(_) => Cell::Missing,
        DataType::String(s) => text_cell(s, missing_markers),
        DataType::Int(i) => Cell::Numeric(*i as f64),
        DataType::Float(x) => Cell::Numeric(*x),
        DataType::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
        DataType::DateTime(serial) => match excel_serial_text(*serial) {
            Some(s) => Cell::Text(s),
            None => Cell::Missing,
        },
        #[allow(unreachable_patterns)]
        _ => text_cell(&cell.to_string(), missing_markers),
    }
}

pub fn read_excel_table(
    path: &str,
    worksheet_name: Option<&str>,
    missing_markers: &[String],
) -> ReportResult<SurveyTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(MissingHeaderSnafu { path })?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, c)| match c {
            DataType::Empty => header_name(idx, ""),
            other => header_name(idx, &other.to_string()),
        })
        .collect();
    debug!("read_excel_table: header: {:?}", headers);

    let mut builder = TableBuilder::new(&headers);
    for row in iter {
        let cells: Vec<Cell> = row
            .iter()
            .map(|c| read_cell(c, missing_markers))
            .collect();
        builder.add_row(cells).context(PipelineSnafu {})?;
    }
    debug!("read_excel_table: {} rows", builder.num_rows());
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::export_xlsx::{workbook_bytes, XlsxCell};

    fn text(s: &str) -> XlsxCell {
        XlsxCell::Text(s.to_string())
    }

    #[test]
    fn serial_dates() {
        assert_eq!(
            excel_serial_text(45292.0),
            Some("2024-01-01 00:00:00".to_string())
        );
        // 10:29:45
        assert_eq!(
            excel_serial_text(45292.0 + (10.0 * 3600.0 + 29.0 * 60.0 + 45.0) / 86400.0),
            Some("2024-01-01 10:29:45".to_string())
        );
        assert_eq!(excel_serial_text(f64::NAN), None);
    }

    #[test]
    fn cells() {
        let markers: Vec<String> = vec!["NA".to_string()];
        assert_eq!(read_cell(&DataType::Empty, &markers), Cell::Missing);
        assert_eq!(read_cell(&DataType::Float(197.0), &markers), Cell::Numeric(197.0));
        assert_eq!(read_cell(&DataType::Int(5), &markers), Cell::Numeric(5.0));
        assert_eq!(
            read_cell(&DataType::String("NA".to_string()), &markers),
            Cell::Missing
        );
        assert_eq!(
            read_cell(&DataType::Bool(true), &markers),
            Cell::Text("True".to_string())
        );
    }

    #[test]
    fn survey_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.xlsx").display().to_string();
        let header: Vec<String> = ["ID", "StartTime_TS", "EndTime_TS", "FIntID_W4", "", "Q1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = vec![
            vec![
                XlsxCell::Number(1.0),
                text("2024-01-01T10:00:00Z"),
                text("2024-01-01T10:29:45Z"),
                XlsxCell::Number(5.0),
                text("x"),
                XlsxCell::Number(197.0),
            ],
            vec![XlsxCell::Number(2.0), text("NA")],
        ];
        fs::write(&path, workbook_bytes("Survey", &header, &rows).unwrap()).unwrap();

        let markers: Vec<String> = vec!["NA".to_string()];
        let table = read_excel_table(&path, None, &markers).unwrap();
        assert_eq!(table.headers[4], "Unnamed: 4");
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.rows[0][5].canonical(), Some("197".to_string()));
        assert_eq!(table.rows[0][3].canonical(), Some("5".to_string()));
        assert_eq!(table.cell(1, 1), &Cell::Missing);
        assert_eq!(table.cell(1, 5), &Cell::Missing);

        let named = read_excel_table(&path, Some("Survey"), &markers).unwrap();
        assert_eq!(named, table);

        let res = read_excel_table(&path, Some("Other"), &markers);
        assert!(matches!(res, Err(ReportError::MissingWorksheet { .. })));
    }
}
