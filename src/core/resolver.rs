//! Variable resolution against the regional dataset.
//!
//! The dataset mixes several data families with different filtering
//! semantics, identified by naming-convention prefixes. Each name is
//! classified once into a [`VariableKind`], and resolution dispatches on the
//! kind rather than scattering prefix checks.

use crate::error::{SoiError, SoiResult};
use crate::types::{Dataset, DatasetRow, DspValue};
use tracing::warn;

/// Year used for projection lookups.
pub const DEFAULT_YEAR: i32 = 2020;

/// Climate scenario used for projection and impact lookups.
pub const DEFAULT_CLIMATE_EXPERIMENT: &str = "RCP4.5";

/// Climate impact rows may carry historical data instead of a scenario.
const HISTORICAL_EXPERIMENT: &str = "Historical";

/// Data family of a variable, classified from its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// `eucalc_*`: macro-economic projections, filtered by year.
    Eucalc,
    /// `cproj_*`: climate projections, filtered by year and experiment.
    ClimateProjection,
    /// `cimp_*`: climate impact assessments with integer-coded categorical
    /// values.
    ClimateImpact,
    /// No recognized prefix: collected/administrative variables, matched by
    /// name alone.
    Collected,
}

impl VariableKind {
    pub fn classify(name: &str) -> Self {
        if name.starts_with("eucalc_") {
            VariableKind::Eucalc
        } else if name.starts_with("cproj_") {
            VariableKind::ClimateProjection
        } else if name.starts_with("cimp_") {
            VariableKind::ClimateImpact
        } else {
            VariableKind::Collected
        }
    }
}

//==============================================================================
// Categorical code mappings
//==============================================================================

static PROBABILITY_IMPACT_LABELS: &[(i64, &str)] = &[
    (2, "High"),
    (1, "Moderate"),
    (0, "Low"),
    (-5, "Uncertain"),
    (-10, "Not known"),
];

static INTENSITY_FREQUENCY_LABELS: &[(i64, &str)] = &[
    (1, "Increase"),
    (0, "No change"),
    (-1, "Decrease"),
    (-5, "Uncertain"),
    (-10, "Not known"),
];

static TIMEFRAME_LABELS: &[(i64, &str)] = &[
    (0, "Short-term"),
    (1, "Mid-term"),
    (2, "Long-term"),
    (-5, "Uncertain"),
    (-10, "Not known"),
];

/// Which of the three fixed code-to-label dictionaries applies to a `cimp_`
/// variable, decided by substrings in its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoricalMap {
    ProbabilityImpact,
    IntensityFrequency,
    Timeframe,
}

impl CategoricalMap {
    fn for_variable(name: &str) -> Option<Self> {
        if name.contains("historical_probability") || name.contains("impact") {
            Some(CategoricalMap::ProbabilityImpact)
        } else if name.contains("change_in_frequency") || name.contains("change_in_intensity") {
            Some(CategoricalMap::IntensityFrequency)
        } else if name.contains("time_frame") {
            Some(CategoricalMap::Timeframe)
        } else {
            None
        }
    }

    fn label(self, code: i64) -> Option<&'static str> {
        let table = match self {
            CategoricalMap::ProbabilityImpact => PROBABILITY_IMPACT_LABELS,
            CategoricalMap::IntensityFrequency => INTENSITY_FREQUENCY_LABELS,
            CategoricalMap::Timeframe => TIMEFRAME_LABELS,
        };
        table
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }
}

//==============================================================================
// Resolver
//==============================================================================

/// Resolves variable names to single values with family-specific filter
/// rules over an immutable dataset.
pub struct Resolver<'a> {
    dataset: &'a Dataset,
    year: i32,
    climate_experiment: String,
}

impl<'a> Resolver<'a> {
    /// Resolver with the standard selection (2020, RCP4.5).
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self::with_selection(dataset, DEFAULT_YEAR, DEFAULT_CLIMATE_EXPERIMENT)
    }

    #[must_use]
    pub fn with_selection(
        dataset: &'a Dataset,
        year: i32,
        climate_experiment: impl Into<String>,
    ) -> Self {
        Self {
            dataset,
            year,
            climate_experiment: climate_experiment.into(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    /// Resolve a variable name to its value.
    ///
    /// Returns `Ok(None)` when no dataset row matches the filters (missing
    /// data is recoverable). Categorical lookup failures are hard errors.
    pub fn resolve(&self, variable: &str) -> SoiResult<Option<DspValue>> {
        let kind = VariableKind::classify(variable);

        let row = match kind {
            VariableKind::Eucalc => {
                self.find(|row| row.var_name == variable && row.year == Some(self.year))
            }
            VariableKind::ClimateProjection => self.find(|row| {
                row.var_name == variable
                    && row.year == Some(self.year)
                    && row.climate_experiment.as_deref() == Some(self.climate_experiment.as_str())
            }),
            VariableKind::ClimateImpact => self.find(|row| {
                row.var_name == variable
                    && matches!(
                        row.climate_experiment.as_deref(),
                        Some(exp) if exp == self.climate_experiment || exp == HISTORICAL_EXPERIMENT
                    )
            }),
            VariableKind::Collected => self.find(|row| row.var_name == variable),
        };

        let Some(row) = row else {
            warn!(variable, ?kind, "no dataset row matched, resolving to null");
            return Ok(None);
        };

        if kind == VariableKind::ClimateImpact {
            return self.map_categorical(variable, &row.value).map(Some);
        }

        Ok(Some(row.value.clone()))
    }

    fn find(&self, pred: impl Fn(&&DatasetRow) -> bool) -> Option<&DatasetRow> {
        // At most one row is expected to match a fully-qualified lookup.
        self.dataset.rows().iter().find(|row| pred(row))
    }

    fn map_categorical(&self, variable: &str, value: &DspValue) -> SoiResult<DspValue> {
        let map = CategoricalMap::for_variable(variable)
            .ok_or_else(|| SoiError::UnclassifiedClimateImpact(variable.to_string()))?;

        let code = value.as_code().ok_or_else(|| SoiError::UnmappedCode {
            variable: variable.to_string(),
            code: value.to_string(),
        })?;

        let label = map.label(code).ok_or_else(|| SoiError::UnmappedCode {
            variable: variable.to_string(),
            code: code.to_string(),
        })?;

        Ok(DspValue::Text(label.to_string()))
    }
}
