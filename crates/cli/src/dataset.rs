//! Dataset loading: the TOML file plus its optional readings CSV.

use std::path::Path;

use meterworks_recon::config::DatasetConfig;
use meterworks_recon::{load_csv_readings, Dataset, ReconError};

use crate::exit_codes::{recon_exit_code, EXIT_IO};
use crate::CliError;

fn recon_err(err: ReconError) -> CliError {
    let hint = match &err {
        ReconError::Structural(_) => {
            Some("run `mwork validate` on the dataset to check the meter hierarchy".to_string())
        }
        ReconError::MissingColumn { .. } => {
            Some("set [readings_columns] in the dataset to match the CSV headers".to_string())
        }
        _ => None,
    };
    CliError {
        code: recon_exit_code(&err),
        message: err.to_string(),
        hint,
    }
}

/// Read a dataset file, load `readings_file` (resolved relative to the
/// dataset's directory) and build the validated network.
pub fn load_dataset(path: &Path) -> Result<Dataset, CliError> {
    let config_str = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("cannot read dataset {}: {e}", path.display()),
        hint: None,
    })?;

    let config = DatasetConfig::from_toml(&config_str).map_err(recon_err)?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let rows = match config.readings_file {
        Some(ref file) => {
            let csv_path = base_dir.join(file);
            let csv_data = std::fs::read_to_string(&csv_path).map_err(|e| CliError {
                code: EXIT_IO,
                message: format!("cannot read {}: {e}", csv_path.display()),
                hint: Some("readings_file is resolved relative to the dataset file".to_string()),
            })?;
            load_csv_readings(&csv_data, &config.readings_columns).map_err(recon_err)?
        }
        None => Vec::new(),
    };

    log::debug!("{}: {} reading rows from CSV", path.display(), rows.len());
    config.into_dataset(rows).map_err(recon_err)
}
