//! Fills the CoM reporting template with calculated values.
//!
//! The template's designated worksheets hold variable names in the cells to
//! be filled. Every cell whose text matches a computed indicator's `var_name`
//! is overwritten with its value; cells matching a raw dataset variable are
//! resolved directly. Everything else is copied through unchanged.
//!
//! The workbook is rewritten cell by cell (values only); one pass, no cell's
//! fill depends on another cell's fill.

use crate::core::Resolver;
use crate::error::{SoiError, SoiResult};
use crate::excel::exporter::save_atomic;
use crate::types::{Dataset, DspValue, IndicatorTable};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Worksheets of the CoM template that carry fillable cells.
pub const TEMPLATE_SHEETS: &[&str] = &[
    "GHG emissions",
    "Risks & vulnerabilities",
    "Energy poverty assessment",
];

/// Column cap per sheet. Templates format far more empty columns than they
/// use; everything beyond column Z is never a fill target.
pub const MAX_TEMPLATE_COLUMNS: usize = 26;

/// Fills template cells from an indicator table and the raw dataset.
pub struct TemplateFiller<'a> {
    indicator_values: HashMap<&'a str, &'a DspValue>,
    resolver: Resolver<'a>,
    dataset: &'a Dataset,
}

impl<'a> TemplateFiller<'a> {
    #[must_use]
    pub fn new(table: &'a IndicatorTable, dataset: &'a Dataset) -> Self {
        Self {
            indicator_values: table.value_map(),
            resolver: Resolver::new(dataset),
            dataset,
        }
    }

    /// Fill the template at `template_path` and write the result to
    /// `output_path`. The template file itself is never modified.
    pub fn fill(&self, template_path: &Path, output_path: &Path) -> SoiResult<()> {
        let mut source: Xlsx<_> = open_workbook(template_path)
            .map_err(|e| SoiError::Import(format!("failed to open template: {e}")))?;

        let sheet_names = source.sheet_names().to_vec();
        let mut workbook = Workbook::new();

        for sheet_name in &sheet_names {
            let range = source
                .worksheet_range(sheet_name)
                .map_err(|e| SoiError::Import(format!("sheet '{sheet_name}': {e}")))?;

            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(sheet_name)
                .map_err(|e| SoiError::Export(format!("failed to set worksheet name: {e}")))?;

            let fillable = TEMPLATE_SHEETS.contains(&sheet_name.as_str());
            let (height, width) = range.get_size();
            let fill_width = if fillable {
                width.min(MAX_TEMPLATE_COLUMNS)
            } else {
                0
            };

            let mut filled = 0usize;
            for row in 0..height {
                for col in 0..width {
                    let Some(cell) = range.get((row, col)) else {
                        continue;
                    };
                    if matches!(cell, Data::Empty) {
                        continue;
                    }

                    if col < fill_width {
                        if let Data::String(text) = cell {
                            match self.lookup(text) {
                                Ok(Some(value)) => {
                                    write_value(worksheet, row, col, &value)?;
                                    filled += 1;
                                    continue;
                                }
                                Ok(None) => {}
                                // a bad data point spoils its own cell, not
                                // the whole report
                                Err(err) if err.is_indicator_scoped() => {
                                    warn!(sheet = %sheet_name, cell = %text, error = %err,
                                        "cell left unfilled");
                                }
                                Err(err) => return Err(err),
                            }
                        }
                    }

                    copy_cell(worksheet, row, col, cell)?;
                }
            }

            if fillable {
                info!(sheet = %sheet_name, cells = filled, "finished filling sheet");
            }
        }

        save_atomic(&mut workbook, output_path)?;
        info!(path = %output_path.display(), "filled template written");
        Ok(())
    }

    /// Value for a cell's text: computed indicators first, then raw dataset
    /// variables with the default year/scenario selection.
    fn lookup(&self, text: &str) -> SoiResult<Option<DspValue>> {
        if let Some(value) = self.indicator_values.get(text) {
            return Ok(Some((*value).clone()));
        }
        if self.dataset.contains_var(text) {
            return self.resolver.resolve(text);
        }
        Ok(None)
    }
}

fn write_value(
    worksheet: &mut Worksheet,
    row: usize,
    col: usize,
    value: &DspValue,
) -> SoiResult<()> {
    let (row, col) = (row as u32, col as u16);
    let result = match value {
        DspValue::Number(n) => worksheet.write_number(row, col, *n),
        DspValue::Text(s) => worksheet.write_string(row, col, s.as_str()),
    };
    result.map_err(|e| SoiError::Export(format!("failed to write filled cell: {e}")))?;
    Ok(())
}

fn copy_cell(worksheet: &mut Worksheet, row: usize, col: usize, cell: &Data) -> SoiResult<()> {
    let (row, col) = (row as u32, col as u16);
    let result = match cell {
        Data::String(s) => worksheet.write_string(row, col, s.as_str()),
        Data::Float(f) => worksheet.write_number(row, col, *f),
        Data::Int(i) => worksheet.write_number(row, col, *i as f64),
        Data::Bool(b) => worksheet.write_boolean(row, col, *b),
        Data::DateTime(dt) => worksheet.write_number(row, col, dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => worksheet.write_string(row, col, s.as_str()),
        // error cells carry nothing worth copying
        Data::Error(_) | Data::Empty => return Ok(()),
    };
    result.map_err(|e| SoiError::Export(format!("failed to copy cell: {e}")))?;
    Ok(())
}
