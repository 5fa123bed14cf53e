//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `mwork` exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 3       | Universal        | Cannot read or write a file              |
//! | 10-19   | dataset          | Dataset loading and reconciliation       |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use meterworks_recon::ReconError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown meter id, malformed period flag.
/// clap uses the same code for its own parse failures.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - dataset, readings file or output file not readable/writable.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Dataset (10-19)
// =============================================================================

/// Dataset TOML or readings CSV could not be parsed or failed validation.
pub const EXIT_DATASET_INVALID: u8 = 10;

/// Meter hierarchy violates a structural invariant (no main meter,
/// dangling parent, zone mismatch, cycle, bad reading, ...).
pub const EXIT_DATASET_STRUCTURE: u8 = 11;

/// `report --strict` found at least one zone in the critical loss band.
pub const EXIT_REPORT_CRITICAL: u8 = 12;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Structural(_) => EXIT_DATASET_STRUCTURE,
        ReconError::Io(_) => EXIT_IO,
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::PeriodParse { .. }
        | ReconError::MissingColumn { .. }
        | ReconError::ReadingParse { .. } => EXIT_DATASET_INVALID,
    }
}
