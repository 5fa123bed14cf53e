use crate::model::{MeterLevel, MeterNode, PeriodKey, PeriodSelector};
use crate::network::MeterNetwork;

/// Collapse one node's readings for a period selector. `AllPeriods` sums
/// every known period; a missing period reads as zero.
pub fn collapse_reading(node: &MeterNode, period: &PeriodSelector, known: &[PeriodKey]) -> f64 {
    match period {
        PeriodSelector::Period(key) => node.reading(key),
        PeriodSelector::AllPeriods => known.iter().map(|key| node.reading(key)).sum(),
    }
}

/// Sum the collapsed readings of every node at `level` whose zone passes
/// `in_scope`. Iterates in load order so repeated calls are bit-identical.
pub fn level_total<F>(
    network: &MeterNetwork,
    level: MeterLevel,
    period: &PeriodSelector,
    in_scope: F,
) -> f64
where
    F: Fn(Option<&str>) -> bool,
{
    network
        .nodes()
        .iter()
        .filter(|n| n.level == level && in_scope(n.zone.as_deref()))
        .map(|n| collapse_reading(n, period, network.periods()))
        .sum()
}
