use crate::config::Dataset;
use crate::engine::ReconciliationEngine;
use crate::model::{PeriodSelector, ReconReport, ReportMeta};
use crate::summary::compute_summary;

/// Run the full reconciliation for one period selector: system stages,
/// per-zone loss rows and a summary.
pub fn build_report(dataset: &Dataset, period: &PeriodSelector) -> ReconReport {
    let engine = ReconciliationEngine::new(&dataset.network);

    let system = engine.system_breakdown(period);
    let zones = engine.zone_breakdown(period, &dataset.thresholds);
    let summary = compute_summary(&dataset.network, &zones);

    ReconReport {
        meta: ReportMeta {
            dataset: dataset.name.clone(),
            utility: dataset.utility.to_string(),
            unit: dataset.unit.clone(),
            period: *period,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        system,
        zones,
    }
}
