//! Loads indicator definitions from the SOI metadata workbook.
//!
//! The workbook carries one definition per row with a header row naming the
//! columns. `soi_name` is optional in legacy sheets, where `var_name` doubles
//! as the key.

use crate::error::{SoiError, SoiResult};
use crate::types::IndicatorDef;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Sheet holding the SOI definitions in the standard metadata workbook.
pub const DEFAULT_METADATA_SHEET: &str = "admin_business_and_social_KPIs";

/// Load indicator definitions from one sheet of a metadata workbook.
pub fn load_indicator_defs(path: &Path, sheet_name: &str) -> SoiResult<Vec<IndicatorDef>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| SoiError::Import(format!("failed to open metadata workbook: {e}")))?;

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| SoiError::Import(format!("sheet '{sheet_name}': {e}")))?;

    let defs = parse_metadata_range(&range)?;
    info!(
        definitions = defs.len(),
        sheet = sheet_name,
        "metadata loaded"
    );
    Ok(defs)
}

/// Parse a header-plus-rows range into indicator definitions.
pub fn parse_metadata_range(range: &Range<Data>) -> SoiResult<Vec<IndicatorDef>> {
    let (height, width) = range.get_size();
    if height < 1 {
        return Err(SoiError::Import("metadata sheet is empty".to_string()));
    }

    // Header row -> column index
    let mut columns: HashMap<String, usize> = HashMap::new();
    for col in 0..width {
        if let Some(Data::String(name)) = range.get((0, col)) {
            columns.insert(name.trim().to_string(), col);
        }
    }

    for required in ["var_name", "calculation", "data_source"] {
        if !columns.contains_key(required) {
            return Err(SoiError::Import(format!(
                "metadata sheet is missing required column '{required}'"
            )));
        }
    }

    let text = |row: usize, name: &str| -> String {
        columns
            .get(name)
            .and_then(|&col| range.get((row, col)))
            .map(cell_text)
            .unwrap_or_default()
    };

    let mut defs = Vec::new();
    for row in 1..height {
        let var_name = text(row, "var_name");
        let soi_name = match text(row, "soi_name") {
            name if name.is_empty() => var_name.clone(),
            name => name,
        };

        if soi_name.is_empty() && var_name.is_empty() {
            continue;
        }

        defs.push(IndicatorDef {
            soi_name,
            var_name,
            description: text(row, "soi_description"),
            methodology: text(row, "methodology"),
            secap_link: text(row, "SECAP_link"),
            sdg_targets: text(row, "SDG_targets"),
            unit: text(row, "var_unit"),
            data_source: text(row, "data_source"),
            calculation: text(row, "calculation"),
        });
    }

    Ok(defs)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
