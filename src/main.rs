use std::{fs::read_to_string, path::Path};

use anyhow::anyhow;
use clap::Parser;
use geo_feature_store::inspect::{run_inspection, InspectConfig};

/// Load a GeoJSON file into a feature store, query it and write the result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: String,
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    if !Path::new(&args.config_filepath).exists() {
        return Err(anyhow!("Config file {} not found", &args.config_filepath));
    }
    let config_contents = read_to_string(&args.config_filepath)?;
    let config: InspectConfig = serde_yaml::from_str(&config_contents)?;
    log::info!("Running inspection with {:?}", config);

    let written = run_inspection(&config)?;
    log::info!("Wrote {} features", written);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
