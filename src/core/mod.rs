pub mod engine;
pub mod expr;
pub mod resolver;

pub use engine::SoiEngine;
pub use resolver::{Resolver, VariableKind, DEFAULT_CLIMATE_EXPERIMENT, DEFAULT_YEAR};
