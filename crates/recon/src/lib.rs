//! `meterworks-recon`: hierarchical meter reconciliation and loss attribution.
//!
//! Pure engine crate: receives a pre-loaded meter hierarchy, returns supply,
//! consumption and loss per scope and period. No CLI or IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod network;
pub mod readings;
pub mod report;
pub mod summary;

pub use config::{Dataset, DatasetConfig, LossThresholds};
pub use engine::{HistoricalSeries, ReconciliationEngine};
pub use error::{ReconError, StructuralError};
pub use model::{
    ChildShare, LossBand, MeterLevel, MeterNode, PeriodKey, PeriodMetrics, PeriodSelector,
    ReconReport, Scope, SystemBreakdown, ZoneLoss, ZoneMetrics,
};
pub use network::MeterNetwork;
pub use readings::{load_csv_readings, ReadingRow};
pub use report::build_report;
