pub use crate::config::*;

/// A builder for assembling a survey table row by row.
///
/// The file readers use it, and it is the easiest way to feed the pipeline
/// from code.
///
/// ```
/// use survey_qc::builder::TableBuilder;
/// use survey_qc::{run_pipeline, PipelineRules};
/// # use survey_qc::PipelineError;
///
/// let mut builder = TableBuilder::new(&[
///     "ID", "StartTime_TS", "EndTime_TS", "FIntID_W4", "FIntName_W4", "Q1",
/// ]);
/// builder.add_row_text(&["1", "2024-01-01T10:00:00Z", "2024-01-01T10:29:45Z", "5", "Ama", "197"])?;
///
/// let output = run_pipeline(&builder.build(), &PipelineRules::default())?;
/// assert_eq!(output.summaries[0].total_dont_know, 1);
/// assert_eq!(output.summaries[0].display().avg_duration_display, "29.0 min");
///
/// # Ok::<(), PipelineError>(())
/// ```
pub struct TableBuilder {
    pub(crate) _headers: Vec<String>,
    pub(crate) _rows: Vec<Vec<Cell>>,
}

impl TableBuilder {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> TableBuilder {
        TableBuilder {
            _headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            _rows: Vec::new(),
        }
    }

    /// Adds a row of cells.
    ///
    /// Rows shorter than the header are padded with missing cells. Longer
    /// rows are rejected.
    pub fn add_row(&mut self, mut cells: Vec<Cell>) -> Result<(), PipelineError> {
        let expected = self._headers.len();
        if cells.len() > expected {
            return Err(PipelineError::RowTooLong {
                row: self._rows.len(),
                expected,
                found: cells.len(),
            });
        }
        cells.resize(expected, Cell::Missing);
        self._rows.push(cells);
        Ok(())
    }

    /// Adds a row where every value is text, as read from a CSV file.
    pub fn add_row_text<S: AsRef<str>>(&mut self, values: &[S]) -> Result<(), PipelineError> {
        self.add_row(
            values
                .iter()
                .map(|v| Cell::Text(v.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn build(self) -> SurveyTable {
        SurveyTable {
            headers: self._headers,
            rows: self._rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_rows_and_rejects_long_ones() {
        let mut builder = TableBuilder::new(&["a", "b", "c"]);
        builder.add_row_text(&["1"]).unwrap();
        assert_eq!(
            builder.add_row_text(&["1", "2", "3", "4"]),
            Err(PipelineError::RowTooLong {
                row: 1,
                expected: 3,
                found: 4
            })
        );
        let table = builder.build();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.rows[0],
            vec![Cell::Text("1".to_string()), Cell::Missing, Cell::Missing]
        );
        assert_eq!(table.cell(5, 0), &Cell::Missing);
    }
}
