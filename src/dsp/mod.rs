//! DSP collaborator glue: HTTP fetch and local dataset caching.

pub mod client;

pub use client::{
    load_dataset, save_dataset, DspClient, DEFAULT_BASE_URL, DEFAULT_SPATIAL_RESOLUTION,
};
