use std::collections::BTreeMap;

use crate::model::{LossBand, ReportSummary, ZoneLoss};
use crate::network::MeterNetwork;

/// Compute summary statistics from per-zone loss rows.
pub fn compute_summary(network: &MeterNetwork, zones: &[ZoneLoss]) -> ReportSummary {
    let meters_by_level: BTreeMap<String, usize> = network
        .count_by_level()
        .into_iter()
        .map(|(level, count)| (level.to_string(), count))
        .collect();

    let mut band_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut critical_zones = Vec::new();

    for z in zones {
        *band_counts.entry(z.band.to_string()).or_insert(0) += 1;
        if z.band == LossBand::Critical {
            critical_zones.push(z.zone.clone());
        }
    }

    ReportSummary {
        zone_count: zones.len(),
        meters_by_level,
        band_counts,
        critical_zones,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MeterLevel, MeterNode, ZoneMetrics};

    fn row(zone: &str, band: LossBand) -> ZoneLoss {
        ZoneLoss {
            zone: zone.into(),
            bulk_meter_ids: vec![format!("{zone}-bulk")],
            individual_meters: 0,
            metrics: ZoneMetrics::default(),
            band,
        }
    }

    #[test]
    fn summary_counts() {
        let net = MeterNetwork::from_nodes(vec![
            MeterNode::new("L1", "Main", MeterLevel::Main),
            MeterNode::new("Z1", "Zone 1", MeterLevel::ZoneBulk)
                .with_zone("Z1")
                .with_parent("L1"),
        ])
        .unwrap();
        let zones = vec![
            row("Z3", LossBand::Critical),
            row("Z1", LossBand::Critical),
            row("Z5", LossBand::Normal),
            row("Z8", LossBand::Gain),
        ];
        let summary = compute_summary(&net, &zones);
        assert_eq!(summary.zone_count, 4);
        assert_eq!(summary.band_counts["critical"], 2);
        assert_eq!(summary.band_counts["gain"], 1);
        assert!(!summary.band_counts.contains_key("elevated"));
        assert_eq!(summary.critical_zones, vec!["Z3", "Z1"]);
        assert_eq!(summary.meters_by_level["main"], 1);
        assert_eq!(summary.meters_by_level["zone_bulk"], 1);
        assert_eq!(summary.meters_by_level["individual"], 0);
    }
}
