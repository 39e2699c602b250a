//! Excel I/O: metadata workbook loading, SOI table export, template filling.

pub mod exporter;
pub mod metadata;
pub mod template;

pub use exporter::{export_indicator_table, SOI_SHEET_NAME};
pub use metadata::{load_indicator_defs, DEFAULT_METADATA_SHEET};
pub use template::{TemplateFiller, MAX_TEMPLATE_COLUMNS, TEMPLATE_SHEETS};
