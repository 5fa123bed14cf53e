use std::cmp::Ordering;

use crate::aggregate::{collapse_reading, level_total};
use crate::classify::classify_loss;
use crate::config::LossThresholds;
use crate::model::{
    ChildShare, MeterLevel, PeriodMetrics, PeriodSelector, Scope, SystemBreakdown, ZoneLoss,
    ZoneMetrics,
};
use crate::network::MeterNetwork;

/// Reconciles supply against consumption over a read-only network.
///
/// Holds no state of its own: every call recomputes from the network's
/// readings, so any number of callers can share one engine.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationEngine<'a> {
    network: &'a MeterNetwork,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(network: &'a MeterNetwork) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &'a MeterNetwork {
        self.network
    }

    /// Supply, consumption and loss for a scope and period.
    ///
    /// Zone scopes compare zone bulk meters against individual meters in the
    /// same zones. `MainSupply` compares the main meter against every zone
    /// bulk plus every direct connection.
    pub fn compute_zone_metrics(&self, scope: &Scope, period: &PeriodSelector) -> ZoneMetrics {
        let net = self.network;
        let (supply, consumption) = match scope {
            Scope::MainSupply => {
                let supply = collapse_reading(net.main_node(), period, net.periods());
                let consumption = level_total(net, MeterLevel::ZoneBulk, period, |_| true)
                    + level_total(net, MeterLevel::DirectConnection, period, |_| true);
                (supply, consumption)
            }
            _ => {
                let supply =
                    level_total(net, MeterLevel::ZoneBulk, period, |z| scope.includes_zone(z));
                let consumption =
                    level_total(net, MeterLevel::Individual, period, |z| scope.includes_zone(z));
                (supply, consumption)
            }
        };

        if matches!(scope, Scope::Zones(zones) if zones.is_empty()) {
            log::debug!("empty zone set matches no meters");
        }

        ZoneMetrics::from_totals(supply, consumption)
    }

    /// One `PeriodMetrics` per known period, in chronological order.
    /// Lazy; clone the iterator (or call again) to restart.
    pub fn historical_series(&self, scope: &Scope) -> HistoricalSeries<'a> {
        HistoricalSeries {
            engine: *self,
            scope: scope.clone(),
            next: 0,
        }
    }

    /// Direct children of `parent_id` with their reading and share of the
    /// sibling total, largest first (ties by id). Unknown parents have no
    /// children.
    pub fn list_child_nodes(&self, parent_id: &str, period: &PeriodSelector) -> Vec<ChildShare<'a>> {
        let net = self.network;
        let mut children: Vec<ChildShare<'a>> = net
            .children_of(parent_id)
            .map(|node| ChildShare {
                node,
                reading: collapse_reading(node, period, net.periods()),
                percent_of_parent: 0.0,
            })
            .collect();

        let sibling_total: f64 = children.iter().map(|c| c.reading).sum();
        if sibling_total > 0.0 {
            for child in &mut children {
                child.percent_of_parent = child.reading / sibling_total * 100.0;
            }
        }

        children.sort_by(|a, b| {
            b.reading
                .partial_cmp(&a.reading)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.node.id.cmp(&b.node.id))
        });
        children
    }

    /// Stage 1 (L1 vs L2 + DC), stage 2 (L2 vs L3) and the end-to-end total.
    /// `total.loss == stage1.loss + stage2.loss` up to rounding.
    pub fn system_breakdown(&self, period: &PeriodSelector) -> SystemBreakdown {
        let net = self.network;
        let stage1 = self.compute_zone_metrics(&Scope::MainSupply, period);
        let stage2 = self.compute_zone_metrics(&Scope::AllZones, period);
        let total = ZoneMetrics::from_totals(
            stage1.supply,
            level_total(net, MeterLevel::Individual, period, |_| true)
                + level_total(net, MeterLevel::DirectConnection, period, |_| true),
        );
        SystemBreakdown {
            stage1,
            stage2,
            total,
        }
    }

    /// Per-zone loss rows for every zone with a bulk meter, worst loss first
    /// (ties by zone code).
    pub fn zone_breakdown(&self, period: &PeriodSelector, thresholds: &LossThresholds) -> Vec<ZoneLoss> {
        let net = self.network;
        let mut rows: Vec<ZoneLoss> = net
            .zones()
            .into_iter()
            .map(|zone| {
                let scope = Scope::zone(zone);
                let metrics = self.compute_zone_metrics(&scope, period);
                let in_zone = |level: MeterLevel| {
                    net.nodes()
                        .iter()
                        .filter(move |n| n.level == level && n.zone.as_deref() == Some(zone))
                };
                ZoneLoss {
                    zone: zone.to_string(),
                    bulk_meter_ids: in_zone(MeterLevel::ZoneBulk).map(|n| n.id.clone()).collect(),
                    individual_meters: in_zone(MeterLevel::Individual).count(),
                    band: classify_loss(&metrics, thresholds),
                    metrics,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.metrics
                .loss
                .partial_cmp(&a.metrics.loss)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.zone.cmp(&b.zone))
        });
        rows
    }
}

/// Lazy per-period metrics for one scope. Finite: yields exactly one item per
/// known period.
#[derive(Debug, Clone)]
pub struct HistoricalSeries<'a> {
    engine: ReconciliationEngine<'a>,
    scope: Scope,
    next: usize,
}

impl Iterator for HistoricalSeries<'_> {
    type Item = PeriodMetrics;

    fn next(&mut self) -> Option<Self::Item> {
        let &period = self.engine.network.periods().get(self.next)?;
        self.next += 1;
        Some(PeriodMetrics {
            period,
            metrics: self
                .engine
                .compute_zone_metrics(&self.scope, &PeriodSelector::Period(period)),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.engine.network.periods().len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HistoricalSeries<'_> {}
