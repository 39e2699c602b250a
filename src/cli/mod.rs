mod commands;

pub use commands::{calculate, fetch, fill, regions};
