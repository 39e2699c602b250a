//! Blocking HTTP client for the data-sharing platform (DSP).
//!
//! The DSP serves one region's full dataset in a single (slow) response, so
//! the client is synchronous with generous timeouts. Fetched datasets can be
//! cached to JSON and reloaded offline, which keeps the calculation pipeline
//! runnable without network access.

use crate::error::{SoiError, SoiResult};
use crate::types::{Dataset, DatasetRow};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "http://data.localised-project.eu/api/v1";

/// Spatial resolution used when none is given.
pub const DEFAULT_SPATIAL_RESOLUTION: &str = "NUTS3";

const REGION_LIST_TIMEOUT: Duration = Duration::from_secs(240);
const REGION_DATA_TIMEOUT: Duration = Duration::from_secs(480);

#[derive(Debug, Deserialize)]
struct RegionDataResponse {
    #[serde(default)]
    regions: Vec<RegionEntry>,
}

#[derive(Debug, Deserialize)]
struct RegionEntry {
    #[serde(default)]
    region_data: Vec<DatasetRow>,
}

/// DSP API client bound to an API key.
pub struct DspClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl DspClient {
    pub fn new(api_key: impl Into<String>) -> SoiResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> SoiResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REGION_DATA_TIMEOUT)
            .build()
            .map_err(|e| SoiError::Dsp(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Fetch the full dataset for one region.
    pub fn get_region_data(
        &self,
        spatial_resolution: &str,
        region_code: &str,
        pathway_description: Option<&str>,
    ) -> SoiResult<Dataset> {
        let mut url = format!(
            "{}/{}/?api_key={}&region={}&type=data",
            self.base_url, spatial_resolution, self.api_key, region_code
        );
        if let Some(pathway) = pathway_description {
            url.push_str("&pathway=");
            url.push_str(pathway);
        }

        info!(region = region_code, spatial_resolution, "fetching region data");
        let response = self
            .http
            .get(&url)
            .timeout(REGION_DATA_TIMEOUT)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| SoiError::Dsp(format!("region data request failed: {e}")))?;

        let payload: RegionDataResponse = response
            .json()
            .map_err(|e| SoiError::Dsp(format!("invalid region data payload: {e}")))?;

        let rows = payload
            .regions
            .into_iter()
            .next()
            .map(|region| region.region_data)
            .unwrap_or_default();

        info!(rows = rows.len(), region = region_code, "region data fetched");
        Ok(Dataset::new(rows))
    }

    /// Fetch the region listing for a spatial resolution, optionally filtered
    /// to one region code. Returned as raw JSON; the core never consumes it.
    pub fn get_regions(
        &self,
        spatial_resolution: &str,
        region_code: Option<&str>,
    ) -> SoiResult<serde_json::Value> {
        let mut url = format!(
            "{}/{}/?api_key={}",
            self.base_url, spatial_resolution, self.api_key
        );
        if let Some(code) = region_code {
            url.push_str("&region=");
            url.push_str(code);
        }

        let response = self
            .http
            .get(&url)
            .timeout(REGION_LIST_TIMEOUT)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| SoiError::Dsp(format!("region list request failed: {e}")))?;

        response
            .json()
            .map_err(|e| SoiError::Dsp(format!("invalid region list payload: {e}")))
    }
}

/// Save a fetched dataset to a JSON cache file.
pub fn save_dataset(dataset: &Dataset, path: &Path) -> SoiResult<()> {
    let json = serde_json::to_string_pretty(dataset)
        .map_err(|e| SoiError::Dsp(format!("failed to serialize dataset: {e}")))?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a dataset from a JSON cache file written by [`save_dataset`].
pub fn load_dataset(path: &Path) -> SoiResult<Dataset> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| SoiError::Dsp(format!("invalid dataset cache {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DspValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_region_data_response_shape() {
        let json = r#"{
            "regions": [{
                "region_code": "DEA23",
                "region_data": [
                    {"var_name": "population", "year": null,
                     "climate_experiment": null, "pathway_description": null,
                     "value": 83000}
                ]
            }]
        }"#;
        let payload: RegionDataResponse = serde_json::from_str(json).unwrap();
        let rows = payload.regions.into_iter().next().unwrap().region_data;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, DspValue::Number(83000.0));
    }

    #[test]
    fn test_dataset_cache_round_trip() {
        let dataset = Dataset::new(vec![DatasetRow {
            var_name: "population".to_string(),
            year: None,
            climate_experiment: None,
            pathway_description: Some("national".to_string()),
            value: DspValue::Number(83000.0),
        }]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.json");
        save_dataset(&dataset, &path).unwrap();

        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded.rows(), dataset.rows());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = DspClient::with_base_url("key", "http://example.org/api/v1/").unwrap();
        assert_eq!(client.base_url, "http://example.org/api/v1");
    }

    #[test]
    fn test_get_regions_unreachable_host_is_a_dsp_error() {
        // bind and drop a local port so the connection is refused
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client =
            DspClient::with_base_url("key", format!("http://127.0.0.1:{port}/api/v1")).unwrap();
        let err = client.get_regions("NUTS3", Some("DEA23")).unwrap_err();
        assert!(matches!(err, SoiError::Dsp(_)));
    }
}
