//! Command-line inspector: builds a dataset by name and prints its metadata,
//! split sizes and the shape of the first sample.

use clap::Parser;
use rusty_datasets::data::Dataset;
use rusty_datasets::registry::{get_dataset, get_test_dataset, DatasetKind};
use rusty_datasets::DataConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect datasets by name", long_about = None)]
struct Args {
    /// Dataset name (use --list to see all)
    #[arg(required_unless_present = "list")]
    dataset: Option<String>,

    /// JSON file with a DataConfig
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data root
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Build only the test split
    #[arg(long)]
    only_test: bool,

    /// List supported dataset names
    #[arg(long)]
    list: bool,
}

fn describe(label: &str, dataset: &dyn Dataset) {
    let first = if dataset.is_empty() {
        "empty".to_string()
    } else {
        match dataset.get(0) {
            Ok(sample) => format!("{}: {:?}", sample.key, sample.shape()),
            Err(e) => format!("error: {}", e),
        }
    };
    println!("{:<10} {:>8} samples, first {}", label, dataset.len(), first);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    if args.list {
        for kind in DatasetKind::ALL {
            println!("{}", kind);
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => DataConfig::from_json_file(path)?,
        None => DataConfig::default(),
    };
    if let Some(root) = args.root {
        config.data_root = root;
    }
    let name = args.dataset.unwrap_or_default();

    if args.only_test {
        let split = get_test_dataset(&config, &name)?;
        println!("{}", serde_json::to_string(&split.info)?);
        describe("test", split.test.as_ref());
    } else {
        let splits = get_dataset(&config, &name)?;
        println!("{}", serde_json::to_string(&splits.info)?);
        describe("train", splits.train.as_ref());
        if splits.validation_is_test() {
            println!("validation = test");
        } else {
            describe("validation", splits.validation.as_ref());
        }
        describe("test", splits.test.as_ref());
    }
    Ok(())
}
