use std::path::Path;

use crate::report::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Xlsx,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The explicit input type when given, otherwise the one of the file extension.
pub fn input_type(path: &str, explicit: Option<&str>) -> ReportResult<InputType> {
    match explicit {
        Some("csv") => return Ok(InputType::Csv),
        Some("xlsx") | Some("excel") => return Ok(InputType::Xlsx),
        Some(x) => {
            whatever!("Unknown input type {:?}: expected csv or xlsx", x)
        }
        None => {}
    }
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("csv") => Ok(InputType::Csv),
        Some("xlsx") | Some("xlsm") => Ok(InputType::Xlsx),
        _ => UnknownInputTypeSnafu { path }.fail(),
    }
}

/// Header cells without a name get a positional one.
pub fn header_name(idx: usize, raw: &str) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {}", idx)
    } else {
        raw.to_string()
    }
}

/// A text value as a cell: the missing markers become missing cells.
pub fn text_cell(s: &str, missing_markers: &[String]) -> Cell {
    let trimmed = s.trim();
    if trimmed.is_empty() || missing_markers.iter().any(|m| m == trimmed) {
        Cell::Missing
    } else {
        Cell::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_type_from_extension() {
        assert_eq!(input_type("data/Survey.CSV", None).unwrap(), InputType::Csv);
        assert_eq!(input_type("survey.xlsx", None).unwrap(), InputType::Xlsx);
        assert_eq!(input_type("survey.dat", Some("csv")).unwrap(), InputType::Csv);
        assert!(input_type("survey.dat", None).is_err());
        assert!(input_type("survey.csv", Some("ods")).is_err());
    }

    #[test]
    fn missing_markers_and_headers() {
        let markers: Vec<String> = vec!["NA".to_string(), "".to_string()];
        assert_eq!(text_cell(" NA ", &markers), Cell::Missing);
        assert_eq!(text_cell("   ", &markers), Cell::Missing);
        assert_eq!(text_cell("97", &markers), Cell::Text("97".to_string()));
        assert_eq!(header_name(3, ""), "Unnamed: 3");
        assert_eq!(header_name(3, "Q1"), "Q1");
        assert_eq!(simplify_file_name("/tmp/x/survey.csv"), "survey.csv");
    }
}
