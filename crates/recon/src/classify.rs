use crate::config::LossThresholds;
use crate::model::{LossBand, ZoneMetrics};

/// Band a boundary's loss percentage against the configured thresholds.
///
/// - loss < 0                       → Gain
/// - no supply and no loss          → Normal, whatever the thresholds
/// - pct < elevated                 → Normal
/// - elevated <= pct < critical     → Elevated
/// - pct >= critical                → Critical
pub fn classify_loss(metrics: &ZoneMetrics, thresholds: &LossThresholds) -> LossBand {
    if metrics.loss < 0.0 {
        LossBand::Gain
    } else if metrics.supply <= 0.0 && metrics.loss == 0.0 {
        LossBand::Normal
    } else if metrics.loss_percentage >= thresholds.critical_pct {
        LossBand::Critical
    } else if metrics.loss_percentage >= thresholds.elevated_pct {
        LossBand::Elevated
    } else {
        LossBand::Normal
    }
}
