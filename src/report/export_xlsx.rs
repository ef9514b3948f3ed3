// Writes the interviewer statistics as a single-sheet xlsx workbook.
//
// An xlsx file is a zip archive of xml parts. Only the parts that spreadsheet
// programs require are written. Every entry carries the same fixed timestamp,
// so the same statistics always give the same bytes.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use zip::result::ZipResult;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::report::*;

pub const SHEET_NAME: &str = "Interviewer Stats";

#[derive(PartialEq, Debug, Clone)]
pub enum XlsxCell {
    Text(String),
    Number(f64),
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs></styleSheet>"#;

fn xml_escape(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            '\'' => res.push_str("&apos;"),
            _ => res.push(c),
        }
    }
    res
}

/// The spreadsheet letters of a 0-based column index: A, B, ..., Z, AA, AB, ...
fn column_letters(mut idx: usize) -> String {
    let mut letters: Vec<char> = Vec::new();
    loop {
        letters.push((b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.iter().rev().collect()
}

// Strings are stored once in the shared string table, in order of first use.
struct SharedStrings {
    strings: Vec<String>,
    index: HashMap<String, usize>,
}

impl SharedStrings {
    fn new() -> SharedStrings {
        SharedStrings {
            strings: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn intern(&mut self, s: &str) -> usize {
        if let Some(idx) = self.index.get(s) {
            return *idx;
        }
        let idx = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.strings.len(),
            self.strings.len()
        );
        for s in self.strings.iter() {
            xml.push_str(&format!(
                r#"<si><t xml:space="preserve">{}</t></si>"#,
                xml_escape(s)
            ));
        }
        xml.push_str("</sst>");
        xml
    }
}

fn sheet_xml(header: &[String], rows: &[Vec<XlsxCell>], strings: &mut SharedStrings) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let header_cells: Vec<XlsxCell> = header.iter().map(|h| XlsxCell::Text(h.clone())).collect();
    for (row_idx, row) in std::iter::once(&header_cells).chain(rows.iter()).enumerate() {
        let row_num = row_idx + 1;
        xml.push_str(&format!(r#"<row r="{}">"#, row_num));
        for (col_idx, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_letters(col_idx), row_num);
            match cell {
                XlsxCell::Text(s) => xml.push_str(&format!(
                    r#"<c r="{}" t="s"><v>{}</v></c>"#,
                    cell_ref,
                    strings.intern(s)
                )),
                XlsxCell::Number(x) => {
                    xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref, x))
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        xml_escape(sheet_name)
    )
}

fn write_parts(parts: &[(&str, String)]) -> ZipResult<Vec<u8>> {
    let mut zip_writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    for (name, contents) in parts.iter() {
        zip_writer.start_file(*name, options)?;
        zip_writer.write_all(contents.as_bytes())?;
    }
    let cursor = zip_writer.finish()?;
    Ok(cursor.into_inner())
}

/// The bytes of a workbook with one sheet: a header row followed by the rows.
pub fn workbook_bytes(
    sheet_name: &str,
    header: &[String],
    rows: &[Vec<XlsxCell>],
) -> ReportResult<Vec<u8>> {
    let mut strings = SharedStrings::new();
    let sheet = sheet_xml(header, rows, &mut strings);
    let parts: Vec<(&str, String)> = vec![
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml(sheet_name)),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/sharedStrings.xml", strings.to_xml()),
    ];
    debug!(
        "workbook_bytes: {} rows, {} shared strings",
        rows.len(),
        strings.strings.len()
    );
    write_parts(&parts).context(ZipExportSnafu {})
}

fn summary_row(d: &SummaryDisplay) -> Vec<XlsxCell> {
    vec![
        XlsxCell::Text(d.int_id.clone()),
        XlsxCell::Text(d.int_name.clone()),
        XlsxCell::Number(d.total_interviews as f64),
        XlsxCell::Text(d.min_duration_display.clone()),
        XlsxCell::Text(d.avg_duration_display.clone()),
        XlsxCell::Text(d.max_duration_display.clone()),
        XlsxCell::Number(d.avg_questions as f64),
        XlsxCell::Number(d.total_dk as f64),
        XlsxCell::Number(d.total_rf as f64),
        XlsxCell::Number(d.total_na as f64),
    ]
}

pub fn summary_workbook(rows: &[SummaryDisplay]) -> ReportResult<Vec<u8>> {
    let header: Vec<String> = SUMMARY_COLUMNS.iter().map(|s| s.to_string()).collect();
    let cells: Vec<Vec<XlsxCell>> = rows.iter().map(summary_row).collect();
    workbook_bytes(SHEET_NAME, &header, &cells)
}

pub fn write_summary_workbook(path: &str, rows: &[SummaryDisplay]) -> ReportResult<()> {
    let bytes = summary_workbook(rows)?;
    fs::write(path, bytes).context(WritingOutputSnafu { path })
}
