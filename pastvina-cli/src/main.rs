mod cli;
mod config_file;

use std::fs;
use std::path::Path;

use clap::Parser;
use env_logger::{Builder, Target};
use walkdir::WalkDir;

#[macro_use]
extern crate log;

use cli::Cli;
use config_file::RunConfig;
use pastvina_core::config::ProcessingOptions;
use pastvina_core::record::RawRecord;

fn load_records(path: &Path) -> Vec<RawRecord> {
    let mut records = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).max_depth(5).into_iter().filter_map(|e| e.ok()) {
            if entry.path().extension().map(|e| e == "json").unwrap_or(false) {
                match load_file(entry.path()) {
                    Ok(mut batch) => {
                        info!("loaded \"{}\" ({} records)", entry.path().display(), batch.len());
                        records.append(&mut batch);
                    }
                    Err(e) => warn!("failed to load \"{}\" - {}", entry.path().display(), e),
                }
            }
        }
    } else {
        match load_file(path) {
            Ok(mut batch) => {
                info!("loaded \"{}\" ({} records)", path.display(), batch.len());
                records.append(&mut batch);
            }
            Err(e) => error!("failed to load \"{}\" - {}", path.display(), e),
        }
    }
    records
}

fn load_file(path: &Path) -> Result<Vec<RawRecord>, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}

pub fn main() {
    Builder::from_default_env()
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| {
        error!("--config is required: it carries the fence/zone/center polygons");
        std::process::exit(1);
    });
    let config_toml = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("failed to read \"{}\" - {}", config_path.display(), e));
    let run_config: RunConfig =
        toml::from_str(&config_toml).unwrap_or_else(|e| panic!("failed to parse \"{}\" - {}", config_path.display(), e));

    let geo = run_config
        .geo_inputs()
        .unwrap_or_else(|e| panic!("invalid geometry in \"{}\" - {}", config_path.display(), e));
    let engine_config = run_config.engine_config();

    let records = load_records(&cli.input);
    if records.is_empty() {
        warn!("no records loaded from \"{}\"", cli.input.display());
    }

    let mut options = ProcessingOptions::new(geo);
    if let Some(date_str) = &cli.date_str {
        options = options.date_str(date_str);
    }
    if let Some(dataset_name) = &cli.dataset_name {
        options = options.dataset_name(dataset_name);
    }
    if !cli.quiet {
        options = options.on_progress(|phase| info!("phase: {}", phase));
    }

    let result = match pastvina_core::pipeline::process(&records, &options, &engine_config) {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let json = serde_json::to_string_pretty(&result).expect("failed to serialize DayResult");
    match &cli.out {
        Some(out_path) => {
            fs::write(out_path, json).unwrap_or_else(|e| panic!("failed to write \"{}\" - {}", out_path.display(), e));
            info!("wrote result to \"{}\"", out_path.display());
        }
        None => println!("{}", json),
    }
}
