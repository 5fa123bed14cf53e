//! Long-format readings CSV: one row per (meter, period, value).

use crate::config::ReadingColumns;
use crate::error::ReconError;
use crate::model::PeriodKey;

/// One normalized reading row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRow {
    pub meter_id: String,
    pub period: PeriodKey,
    pub value: f64,
}

/// Malformed records are dataset errors; only genuine read failures are `Io`.
fn csv_err(e: csv::Error) -> ReconError {
    if e.is_io_error() {
        ReconError::Io(e.to_string())
    } else {
        ReconError::ConfigParse(format!("readings: {e}"))
    }
}

/// Parse a readings CSV using the configured column names. Extra columns are
/// ignored; an empty value cell reads as zero.
pub fn load_csv_readings(csv_data: &str, columns: &ReadingColumns) -> Result<Vec<ReadingRow>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReconError::MissingColumn { column: name.into() })
    };

    let meter_idx = idx(&columns.meter_id)?;
    let period_idx = idx(&columns.period)?;
    let value_idx = idx(&columns.value)?;

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(csv_err)?;

        let meter_id = record.get(meter_idx).unwrap_or("").to_string();
        let period: PeriodKey = record.get(period_idx).unwrap_or("").parse()?;

        let value_str = record.get(value_idx).unwrap_or("");
        let value = if value_str.is_empty() {
            0.0
        } else {
            value_str.parse::<f64>().map_err(|_| ReconError::ReadingParse {
                meter_id: meter_id.clone(),
                value: value_str.into(),
            })?
        };

        rows.push(ReadingRow {
            meter_id,
            period,
            value,
        });
    }

    log::debug!("parsed {} reading rows", rows.len());
    Ok(rows)
}
