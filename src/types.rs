use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

//==============================================================================
// Dataset (DSP region data)
//==============================================================================

/// A value delivered by the DSP: numeric for projections and collected data,
/// text for categorical climate impact assessments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DspValue {
    Number(f64),
    Text(String),
}

impl DspValue {
    /// Numeric view of the value. Text values that parse as numbers count,
    /// since the DSP occasionally serializes numbers as strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DspValue::Number(n) => Some(*n),
            DspValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Integer categorical code, if the value is a whole number.
    pub fn as_code(&self) -> Option<i64> {
        match self.as_number() {
            Some(n) if n.fract() == 0.0 && n.is_finite() => Some(n as i64),
            _ => None,
        }
    }
}

impl fmt::Display for DspValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DspValue::Number(n) => write!(f, "{n}"),
            DspValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One row of regional data as delivered by the DSP.
///
/// Rows sharing a `var_name` are distinguished by `year`,
/// `climate_experiment` and `pathway_description`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub var_name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub climate_experiment: Option<String>,
    #[serde(default)]
    pub pathway_description: Option<String>,
    pub value: DspValue,
}

/// Fully materialized regional dataset, immutable once fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    #[must_use]
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_var(&self, name: &str) -> bool {
        self.rows.iter().any(|row| row.var_name == name)
    }
}

//==============================================================================
// Indicator definitions (SOI metadata)
//==============================================================================

/// `data_source` value marking an indicator as a pass-2 total over other SOIs.
pub const TOTAL_SOURCE: &str = "TOTAL";

/// `calculation` sentinels meaning "do not compute this indicator".
pub const SKIP_SENTINELS: [&str; 2] = ["BLANK", "TBD"];

/// One row of the SOI metadata workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorDef {
    /// Unique key. Falls back to `var_name` for legacy metadata sheets.
    pub soi_name: String,
    pub var_name: String,
    pub description: String,
    pub methodology: String,
    pub secap_link: String,
    pub sdg_targets: String,
    pub unit: String,
    pub data_source: String,
    pub calculation: String,
}

impl IndicatorDef {
    /// Whether this indicator is computed in pass 2 from other indicators.
    pub fn is_total(&self) -> bool {
        self.data_source.trim() == TOTAL_SOURCE
    }

    /// Whether the calculation is a skip sentinel (or missing entirely).
    pub fn is_skipped(&self) -> bool {
        let calc = self.calculation.trim();
        calc.is_empty() || SKIP_SENTINELS.contains(&calc)
    }

    pub fn has_var_name(&self) -> bool {
        !self.var_name.trim().is_empty()
    }
}

//==============================================================================
// Calculated indicator values
//==============================================================================

/// A computed SOI with its echoed metadata. `value` is `None` when the
/// underlying data was missing or the indicator's computation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorValue {
    pub soi_name: String,
    pub var_name: String,
    pub description: String,
    pub methodology: String,
    pub unit: String,
    pub value: Option<DspValue>,
}

impl IndicatorValue {
    pub fn from_def(def: &IndicatorDef, value: Option<DspValue>) -> Self {
        Self {
            soi_name: def.soi_name.clone(),
            var_name: def.var_name.clone(),
            description: def.description.clone(),
            methodology: def.methodology.clone(),
            unit: def.unit.clone(),
            value,
        }
    }
}

/// Result table of a calculation run. Append-only during the two passes,
/// read-only once handed to the template filler. Row order follows the
/// definition order within each pass, base indicators before totals.
#[derive(Debug, Clone, Default)]
pub struct IndicatorTable {
    rows: Vec<IndicatorValue>,
}

impl IndicatorTable {
    pub fn push(&mut self, row: IndicatorValue) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[IndicatorValue] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, var_name: &str) -> Option<&IndicatorValue> {
        self.rows.iter().find(|row| row.var_name == var_name)
    }

    /// Flat `var_name -> value` view for the template filler.
    /// Indicators without a value are omitted so their cells stay untouched.
    pub fn value_map(&self) -> HashMap<&str, &DspValue> {
        self.rows
            .iter()
            .filter_map(|row| row.value.as_ref().map(|v| (row.var_name.as_str(), v)))
            .collect()
    }
}
