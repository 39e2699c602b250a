//! soi-report - Sustainable Outcome Indicator calculator and report filler
//!
//! This library fetches regional indicator data from the DSP, derives SOI
//! values from metadata-driven calculation formulas, and writes the results
//! into the CoM reporting template.
//!
//! # Pipeline
//!
//! - metadata workbook + regional dataset feed the calculation engine
//! - pass 1 resolves base indicators against the dataset, pass 2 derives
//!   totals from pass-1 output
//! - the combined table is exported as a workbook and used to fill the
//!   report template cell by cell
//!
//! # Example
//!
//! ```no_run
//! use soi_report::core::SoiEngine;
//! use soi_report::dsp;
//! use soi_report::excel;
//! use std::path::Path;
//!
//! let dataset = dsp::load_dataset(Path::new("region_data_DEA23.json"))?;
//! let defs = excel::load_indicator_defs(
//!     Path::new("variables_with_details_and_tags.xlsx"),
//!     excel::DEFAULT_METADATA_SHEET,
//! )?;
//!
//! let table = SoiEngine::new(&dataset).calculate(&defs)?;
//! println!("Indicators: {}", table.len());
//! # Ok::<(), soi_report::error::SoiError>(())
//! ```

pub mod cli;
pub mod core;
pub mod dsp;
pub mod error;
pub mod excel;
pub mod types;

// Re-export commonly used types
pub use error::{SoiError, SoiResult};
pub use types::{Dataset, DatasetRow, DspValue, IndicatorDef, IndicatorTable, IndicatorValue};
