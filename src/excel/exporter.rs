//! Writes the calculated SOI table to an xlsx workbook.

use crate::error::{SoiError, SoiResult};
use crate::types::{DspValue, IndicatorTable};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SOI_SHEET_NAME: &str = "SOIs";

const HEADERS: &[&str] = &[
    "soi_name",
    "var_name",
    "soi_description",
    "methodology",
    "var_unit",
    "value",
];

/// Export an indicator table to `output_path`, one row per indicator.
pub fn export_indicator_table(table: &IndicatorTable, output_path: &Path) -> SoiResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SOI_SHEET_NAME)
        .map_err(|e| SoiError::Export(format!("failed to set worksheet name: {e}")))?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| SoiError::Export(format!("failed to write header: {e}")))?;
    }

    for (idx, row) in table.rows().iter().enumerate() {
        let excel_row = (idx + 1) as u32;
        let fields = [
            &row.soi_name,
            &row.var_name,
            &row.description,
            &row.methodology,
            &row.unit,
        ];
        for (col, field) in fields.iter().enumerate() {
            worksheet
                .write_string(excel_row, col as u16, field.as_str())
                .map_err(|e| SoiError::Export(format!("failed to write row: {e}")))?;
        }

        let value_col = fields.len() as u16;
        match &row.value {
            Some(DspValue::Number(n)) => {
                worksheet
                    .write_number(excel_row, value_col, *n)
                    .map_err(|e| SoiError::Export(format!("failed to write value: {e}")))?;
            }
            Some(DspValue::Text(s)) => {
                worksheet
                    .write_string(excel_row, value_col, s.as_str())
                    .map_err(|e| SoiError::Export(format!("failed to write value: {e}")))?;
            }
            // null values stay as empty cells
            None => {}
        }
    }

    save_atomic(&mut workbook, output_path)?;
    info!(indicators = table.len(), path = %output_path.display(), "SOI table exported");
    Ok(())
}

/// Save a workbook by writing to a sibling temporary file and renaming it
/// into place, so a failed save never leaves a partial file at the
/// destination.
pub(crate) fn save_atomic(workbook: &mut Workbook, output_path: &Path) -> SoiResult<()> {
    let tmp_path = temp_sibling(output_path);

    if let Err(e) = workbook.save(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(SoiError::Export(format!(
            "failed to save workbook {}: {e}",
            output_path.display()
        )));
    }

    if let Err(e) = fs::rename(&tmp_path, output_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}

fn temp_sibling(output_path: &Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.xlsx".to_string());
    name.push_str(".tmp");
    output_path.with_file_name(name)
}
