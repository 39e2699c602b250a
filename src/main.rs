use clap::{Parser, Subcommand};
use soi_report::cli;
use soi_report::error::SoiResult;
use soi_report::dsp::DEFAULT_SPATIAL_RESOLUTION;
use soi_report::excel::DEFAULT_METADATA_SHEET;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soi-report")]
#[command(about = "Calculate Sustainable Outcome Indicators and fill the CoM reporting template")]
#[command(long_about = "soi-report - SOI calculation and report filling for DSP regional data

COMMANDS:
  regions    - List the regions the DSP serves at a spatial resolution
  fetch      - Download a region's dataset from the DSP and cache it as JSON
  calculate  - Compute all SOI values and write the indicator workbook
  fill       - Compute SOI values and fill the CoM reporting template

EXAMPLES:
  soi-report regions --api-key $DSP_API_KEY
  soi-report fetch --region DEA23 --api-key $DSP_API_KEY
  soi-report calculate --metadata variables.xlsx --dataset region_data_DEA23.json --region DEA23
  soi-report fill --metadata variables.xlsx --dataset region_data_DEA23.json \\
      --template CoM-Europe_reporting_template_2023_v3.xlsx --region DEA23")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the regions the DSP serves at a spatial resolution
    Regions {
        /// DSP API key
        #[arg(long, env = "DSP_API_KEY")]
        api_key: String,

        /// Spatial resolution to list
        #[arg(long, default_value = DEFAULT_SPATIAL_RESOLUTION)]
        spatial_resolution: String,

        /// Restrict the listing to one region code
        #[arg(long)]
        region: Option<String>,

        /// Write the listing to a JSON file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download a region's dataset from the DSP and cache it as JSON
    Fetch {
        /// DSP API key
        #[arg(long, env = "DSP_API_KEY")]
        api_key: String,

        /// Spatial resolution of the region code
        #[arg(long, default_value = DEFAULT_SPATIAL_RESOLUTION)]
        spatial_resolution: String,

        /// Region code (e.g. DEA23)
        #[arg(long)]
        region: String,

        /// Pathway scenario for projected data
        #[arg(long, default_value = "national")]
        pathway: String,

        /// Output path for the cached dataset (default: region_data_<region>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute all SOI values and write the indicator workbook
    Calculate {
        /// Path to the SOI metadata workbook
        #[arg(long)]
        metadata: PathBuf,

        /// Metadata sheet holding the indicator definitions
        #[arg(long, default_value = DEFAULT_METADATA_SHEET)]
        sheet: String,

        /// Path to a cached region dataset (see fetch)
        #[arg(long)]
        dataset: PathBuf,

        /// Region code, used in the default output file name
        #[arg(long)]
        region: String,

        /// Output path for the indicator workbook (default: SOIs_<region>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute SOI values and fill the CoM reporting template
    Fill {
        /// Path to the SOI metadata workbook
        #[arg(long)]
        metadata: PathBuf,

        /// Metadata sheet holding the indicator definitions
        #[arg(long, default_value = DEFAULT_METADATA_SHEET)]
        sheet: String,

        /// Path to a cached region dataset (see fetch)
        #[arg(long)]
        dataset: PathBuf,

        /// Path to the report template workbook
        #[arg(long)]
        template: PathBuf,

        /// Region code, used in the default output file name
        #[arg(long)]
        region: String,

        /// Output path for the filled report (default: CoM_<region>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> SoiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("soi_report=warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Regions {
            api_key,
            spatial_resolution,
            region,
            output,
        } => cli::regions(api_key, spatial_resolution, region, output),
        Commands::Fetch {
            api_key,
            spatial_resolution,
            region,
            pathway,
            output,
        } => cli::fetch(api_key, spatial_resolution, region, pathway, output),
        Commands::Calculate {
            metadata,
            sheet,
            dataset,
            region,
            output,
        } => cli::calculate(metadata, sheet, dataset, region, output),
        Commands::Fill {
            metadata,
            sheet,
            dataset,
            template,
            region,
            output,
        } => cli::fill(metadata, sheet, dataset, template, region, output),
    }
}
