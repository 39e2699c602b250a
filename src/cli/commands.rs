use crate::core::SoiEngine;
use crate::dsp::{self, DspClient};
use crate::error::{SoiError, SoiResult};
use crate::excel::{self, TemplateFiller};
use crate::types::IndicatorTable;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Execute the fetch command: download one region's dataset and cache it.
pub fn fetch(
    api_key: String,
    spatial_resolution: String,
    region: String,
    pathway: String,
    output: Option<PathBuf>,
) -> SoiResult<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("region_data_{region}.json")));

    println!("{}", "Fetching region data from the DSP".bold().green());
    println!("   Region: {}", region.bright_blue().bold());
    println!("   Pathway: {pathway}");

    let client = DspClient::new(api_key)?;
    let dataset = client.get_region_data(&spatial_resolution, &region, Some(&pathway))?;
    dsp::save_dataset(&dataset, &output)?;

    println!(
        "{} {} rows cached to {}",
        "Done:".bold().green(),
        dataset.len(),
        output.display()
    );
    Ok(())
}

/// Execute the regions command: list the regions the DSP serves at one
/// spatial resolution.
pub fn regions(
    api_key: String,
    spatial_resolution: String,
    region: Option<String>,
    output: Option<PathBuf>,
) -> SoiResult<()> {
    println!("{}", "Listing DSP regions".bold().green());
    println!("   Resolution: {}", spatial_resolution.bright_blue().bold());

    let client = DspClient::new(api_key)?;
    let listing = client.get_regions(&spatial_resolution, region.as_deref())?;
    let json = serde_json::to_string_pretty(&listing)
        .map_err(|e| SoiError::Dsp(format!("failed to serialize region listing: {e}")))?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!(
                "{} region listing written to {}",
                "Done:".bold().green(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Execute the calculate command: compute all SOIs and export the table.
pub fn calculate(
    metadata: PathBuf,
    sheet: String,
    dataset_path: PathBuf,
    region: String,
    output: Option<PathBuf>,
) -> SoiResult<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("SOIs_{region}.xlsx")));

    println!("{}", "Calculating SOI values".bold().green());
    println!("   Region: {}", region.bright_blue().bold());

    let table = run_calculation(&metadata, &sheet, &dataset_path)?;
    excel::export_indicator_table(&table, &output)?;

    report_table(&table);
    println!(
        "{} indicator table written to {}",
        "Done:".bold().green(),
        output.display()
    );
    Ok(())
}

/// Execute the fill command: compute SOIs and fill the report template.
pub fn fill(
    metadata: PathBuf,
    sheet: String,
    dataset_path: PathBuf,
    template: PathBuf,
    region: String,
    output: Option<PathBuf>,
) -> SoiResult<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("CoM_{region}.xlsx")));

    println!("{}", "Filling report template".bold().green());
    println!("   Region: {}", region.bright_blue().bold());
    println!("   Template: {}", template.display());

    let dataset = dsp::load_dataset(&dataset_path)?;
    let defs = excel::load_indicator_defs(&metadata, &sheet)?;
    let table = SoiEngine::new(&dataset).calculate(&defs)?;

    report_table(&table);

    let filler = TemplateFiller::new(&table, &dataset);
    filler.fill(&template, &output)?;

    println!(
        "{} filled report written to {}",
        "Done:".bold().green(),
        output.display()
    );
    Ok(())
}

fn run_calculation(metadata: &Path, sheet: &str, dataset_path: &Path) -> SoiResult<IndicatorTable> {
    let dataset = dsp::load_dataset(dataset_path)?;
    let defs = excel::load_indicator_defs(metadata, sheet)?;
    SoiEngine::new(&dataset).calculate(&defs)
}

fn report_table(table: &IndicatorTable) {
    let computed = table.rows().iter().filter(|r| r.value.is_some()).count();
    let missing = table.len() - computed;

    println!("   {} indicators computed", computed.to_string().bold());
    if missing > 0 {
        println!(
            "   {}",
            format!("{missing} indicators without a value (missing data)").yellow()
        );
    }
}
