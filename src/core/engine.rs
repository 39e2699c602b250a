//! Two-pass SOI calculation over a metadata-driven indicator list.
//!
//! Pass 1 computes base indicators straight from the dataset. Pass 2 computes
//! totals, resolving references against pass-1 output only. Per-indicator
//! failures (missing data, unmapped categorical codes, malformed formulas)
//! are contained so one bad row never aborts the batch; referencing an
//! uncomputed indicator from a total is a configuration error and fatal.

use crate::core::expr;
use crate::core::resolver::Resolver;
use crate::error::{SoiError, SoiResult};
use crate::types::{Dataset, DspValue, IndicatorDef, IndicatorTable, IndicatorValue};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Indicators counting discrete things get integer values.
const COUNT_PREFIX: &str = "number_of";

/// SOI calculation engine bound to one region's dataset.
pub struct SoiEngine<'a> {
    resolver: Resolver<'a>,
}

impl<'a> SoiEngine<'a> {
    /// Engine with the standard selection (2020, RCP4.5).
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            resolver: Resolver::new(dataset),
        }
    }

    #[must_use]
    pub fn with_resolver(resolver: Resolver<'a>) -> Self {
        Self { resolver }
    }

    /// Calculate all indicators. Output order is deterministic: definition
    /// order within each pass, base indicators before totals.
    pub fn calculate(&self, defs: &[IndicatorDef]) -> SoiResult<IndicatorTable> {
        let mut table = IndicatorTable::default();

        // Pass 1: base indicators from the dataset
        for def in defs.iter().filter(|d| !d.is_total()) {
            if def.is_skipped() || !def.has_var_name() {
                debug!(indicator = %def.soi_name, "skipped (blank calculation or no var_name)");
                continue;
            }

            let value =
                match expr::evaluate(&def.calculation, |name| self.resolver.resolve(name)) {
                    Ok(value) => value,
                    Err(err) if err.is_indicator_scoped() => {
                        error!(indicator = %def.soi_name, %err, "indicator computation failed");
                        None
                    }
                    Err(err) => return Err(err),
                };

            let value = round_counts(&def.var_name, value);
            table.push(IndicatorValue::from_def(def, value));
        }
        info!(base_indicators = table.len(), "pass 1 complete");

        // Pass 2: totals over pass-1 results. Totals referencing other
        // totals are rejected, so the lookup map is frozen here.
        let base_values: HashMap<String, Option<DspValue>> = table
            .rows()
            .iter()
            .map(|row| (row.var_name.clone(), row.value.clone()))
            .collect();

        for def in defs.iter().filter(|d| d.is_total()) {
            if def.is_skipped() {
                debug!(indicator = %def.soi_name, "total skipped (blank calculation)");
                continue;
            }

            let value = expr::evaluate(&def.calculation, |name| {
                match base_values.get(name) {
                    Some(value) => Ok(value.clone()),
                    None => Err(SoiError::UnresolvedIndicator {
                        indicator: def.soi_name.clone(),
                        reference: name.to_string(),
                    }),
                }
            })?;

            let value = round_counts(&def.var_name, value);
            table.push(IndicatorValue::from_def(def, value));
        }
        info!(indicators = table.len(), "calculation complete");

        Ok(table)
    }
}

/// Count-style indicators are rounded to the nearest integer.
fn round_counts(var_name: &str, value: Option<DspValue>) -> Option<DspValue> {
    match value {
        Some(DspValue::Number(n)) if var_name.starts_with(COUNT_PREFIX) => {
            Some(DspValue::Number(n.round()))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatasetRow;
    use pretty_assertions::assert_eq;

    fn def(var_name: &str, calculation: &str, data_source: &str) -> IndicatorDef {
        IndicatorDef {
            soi_name: var_name.to_string(),
            var_name: var_name.to_string(),
            calculation: calculation.to_string(),
            data_source: data_source.to_string(),
            ..Default::default()
        }
    }

    fn collected(var_name: &str, value: f64) -> DatasetRow {
        DatasetRow {
            var_name: var_name.to_string(),
            year: None,
            climate_experiment: None,
            pathway_description: None,
            value: DspValue::Number(value),
        }
    }

    #[test]
    fn test_total_over_base_indicators() {
        let dataset = Dataset::new(vec![collected("a", 3.0), collected("b", 4.0)]);
        let defs = vec![
            def("soi_a", "a", "collected"),
            def("soi_b", "b", "collected"),
            def("soi_total", "soi_a + soi_b", "TOTAL"),
        ];

        let table = SoiEngine::new(&dataset).calculate(&defs).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get("soi_total").unwrap().value,
            Some(DspValue::Number(7.0))
        );
    }

    #[test]
    fn test_total_referencing_unknown_indicator_is_fatal() {
        let dataset = Dataset::new(vec![collected("a", 3.0)]);
        let defs = vec![
            def("soi_a", "a", "collected"),
            def("soi_total", "soi_a + soi_ghost", "TOTAL"),
        ];

        let err = SoiEngine::new(&dataset).calculate(&defs).unwrap_err();
        match err {
            SoiError::UnresolvedIndicator { indicator, reference } => {
                assert_eq!(indicator, "soi_total");
                assert_eq!(reference, "soi_ghost");
            }
            other => panic!("expected UnresolvedIndicator, got {other:?}"),
        }
    }

    #[test]
    fn test_total_referencing_total_is_rejected() {
        let dataset = Dataset::new(vec![collected("a", 3.0)]);
        let defs = vec![
            def("soi_a", "a", "collected"),
            def("soi_t1", "soi_a + soi_a", "TOTAL"),
            def("soi_t2", "soi_t1 + soi_a", "TOTAL"),
        ];

        let err = SoiEngine::new(&dataset).calculate(&defs).unwrap_err();
        assert!(matches!(err, SoiError::UnresolvedIndicator { .. }));
    }

    #[test]
    fn test_count_indicators_are_rounded() {
        let dataset = Dataset::new(vec![
            collected("households", 1236.0),
            collected("share", 0.1),
        ]);
        let defs = vec![def(
            "number_of_households_in_energy_poverty",
            "households * share",
            "collected",
        )];

        let table = SoiEngine::new(&dataset).calculate(&defs).unwrap();
        assert_eq!(
            table
                .get("number_of_households_in_energy_poverty")
                .unwrap()
                .value,
            Some(DspValue::Number(124.0))
        );
    }

    #[test]
    fn test_skip_sentinels_and_missing_var_name() {
        let dataset = Dataset::new(vec![collected("a", 1.0)]);
        let defs = vec![
            def("soi_blank", "BLANK", "collected"),
            def("soi_tbd", "TBD", "collected"),
            IndicatorDef {
                soi_name: "soi_no_var".to_string(),
                calculation: "a".to_string(),
                data_source: "collected".to_string(),
                ..Default::default()
            },
            def("soi_a", "a", "collected"),
        ];

        let table = SoiEngine::new(&dataset).calculate(&defs).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].var_name, "soi_a");
    }

    #[test]
    fn test_missing_data_contained_as_null() {
        let dataset = Dataset::new(vec![collected("a", 1.0)]);
        let defs = vec![
            def("soi_missing", "a + nowhere_to_be_found", "collected"),
            def("soi_a", "a", "collected"),
        ];

        let table = SoiEngine::new(&dataset).calculate(&defs).unwrap();
        assert_eq!(table.get("soi_missing").unwrap().value, None);
        assert_eq!(
            table.get("soi_a").unwrap().value,
            Some(DspValue::Number(1.0))
        );
    }

    #[test]
    fn test_unmapped_code_contained_per_indicator() {
        let dataset = Dataset::new(vec![
            DatasetRow {
                var_name: "cimp_impact_of_storms".to_string(),
                year: None,
                climate_experiment: Some("RCP4.5".to_string()),
                pathway_description: None,
                value: DspValue::Number(42.0),
            },
            collected("a", 5.0),
        ]);
        let defs = vec![
            def("soi_storm", "cimp_impact_of_storms", "climate"),
            def("soi_a", "a", "collected"),
        ];

        let table = SoiEngine::new(&dataset).calculate(&defs).unwrap();
        assert_eq!(table.get("soi_storm").unwrap().value, None);
        assert_eq!(
            table.get("soi_a").unwrap().value,
            Some(DspValue::Number(5.0))
        );
    }

    #[test]
    fn test_deterministic_output_order() {
        let dataset = Dataset::new(vec![collected("a", 1.0), collected("b", 2.0)]);
        let defs = vec![
            def("soi_total", "soi_b + soi_a", "TOTAL"),
            def("soi_b", "b", "collected"),
            def("soi_a", "a", "collected"),
        ];

        let engine = SoiEngine::new(&dataset);
        let first = engine.calculate(&defs).unwrap();
        let second = engine.calculate(&defs).unwrap();

        let order: Vec<&str> = first.rows().iter().map(|r| r.var_name.as_str()).collect();
        assert_eq!(order, vec!["soi_b", "soi_a", "soi_total"]);
        assert_eq!(first.rows(), second.rows());
    }
}
