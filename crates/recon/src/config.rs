use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{MeterLevel, MeterNode, PeriodKey};
use crate::network::MeterNetwork;
use crate::readings::ReadingRow;

// ---------------------------------------------------------------------------
// Top-level dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    #[serde(default)]
    pub utility: UtilityKind,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Known periods in chronological order. Defaults to the sorted union
    /// of every reading key.
    #[serde(default)]
    pub periods: Option<Vec<String>>,
    /// Long-format readings CSV, resolved relative to the dataset file.
    #[serde(default)]
    pub readings_file: Option<String>,
    #[serde(default)]
    pub readings_columns: ReadingColumns,
    #[serde(default)]
    pub thresholds: LossThresholds,
    #[serde(default)]
    pub meters: Vec<MeterConfig>,
}

fn default_unit() -> String {
    "m3".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    #[default]
    Water,
    Electricity,
    Sewage,
}

impl std::fmt::Display for UtilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Water => write!(f, "water"),
            Self::Electricity => write!(f, "electricity"),
            Self::Sewage => write!(f, "sewage"),
        }
    }
}

// ---------------------------------------------------------------------------
// Meter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MeterConfig {
    pub id: String,
    /// Defaults to the id.
    #[serde(default)]
    pub label: Option<String>,
    pub level: MeterLevel,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub readings: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Readings CSV column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReadingColumns {
    #[serde(default = "default_meter_id_column")]
    pub meter_id: String,
    #[serde(default = "default_period_column")]
    pub period: String,
    #[serde(default = "default_value_column")]
    pub value: String,
}

fn default_meter_id_column() -> String {
    "meter_id".into()
}

fn default_period_column() -> String {
    "period".into()
}

fn default_value_column() -> String {
    "value".into()
}

impl Default for ReadingColumns {
    fn default() -> Self {
        Self {
            meter_id: default_meter_id_column(),
            period: default_period_column(),
            value: default_value_column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loss thresholds
// ---------------------------------------------------------------------------

/// Loss-percentage cut-offs for `LossBand` classification.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, serde::Serialize)]
pub struct LossThresholds {
    #[serde(default = "default_elevated_pct")]
    pub elevated_pct: f64,
    #[serde(default = "default_critical_pct")]
    pub critical_pct: f64,
}

fn default_elevated_pct() -> f64 {
    10.0
}

fn default_critical_pct() -> f64 {
    25.0
}

impl Default for LossThresholds {
    fn default() -> Self {
        Self {
            elevated_pct: default_elevated_pct(),
            critical_pct: default_critical_pct(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loaded dataset
// ---------------------------------------------------------------------------

/// A validated dataset: descriptive metadata plus the read-only network.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub utility: UtilityKind,
    pub unit: String,
    pub thresholds: LossThresholds,
    pub network: MeterNetwork,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl DatasetConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: DatasetConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        if self.meters.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one meter is required".into(),
            ));
        }

        let t = &self.thresholds;
        if !(t.elevated_pct >= 0.0 && t.critical_pct >= 0.0) {
            return Err(ReconError::ConfigValidation(
                "thresholds must be non-negative".into(),
            ));
        }
        if t.elevated_pct > t.critical_pct {
            return Err(ReconError::ConfigValidation(format!(
                "elevated_pct ({}) must not exceed critical_pct ({})",
                t.elevated_pct, t.critical_pct
            )));
        }

        // Period strings must be canonical before anything is built
        if let Some(ref periods) = self.periods {
            for p in periods {
                p.parse::<PeriodKey>()?;
            }
        }
        for meter in &self.meters {
            for p in meter.readings.keys() {
                p.parse::<PeriodKey>()?;
            }
        }

        Ok(())
    }

    /// Merge inline readings with rows loaded from the readings CSV and
    /// build the validated network. CSV rows for the same meter and period
    /// are summed onto any inline value.
    pub fn into_dataset(self, extra_readings: Vec<ReadingRow>) -> Result<Dataset, ReconError> {
        let mut nodes = Vec::with_capacity(self.meters.len());
        for meter in self.meters {
            let mut node = MeterNode::new(
                meter.id.clone(),
                meter.label.unwrap_or(meter.id),
                meter.level,
            );
            node.zone = meter.zone;
            node.parent_id = meter.parent;
            for (period, value) in meter.readings {
                node.readings.insert(period.parse()?, value);
            }
            nodes.push(node);
        }

        let slots: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        for row in extra_readings {
            let &i = slots.get(&row.meter_id).ok_or_else(|| {
                ReconError::ConfigValidation(format!(
                    "readings reference unknown meter '{}'",
                    row.meter_id
                ))
            })?;
            *nodes[i].readings.entry(row.period).or_insert(0.0) += row.value;
        }

        let network = match self.periods {
            Some(periods) => {
                let keys = periods
                    .iter()
                    .map(|p| p.parse())
                    .collect::<Result<Vec<PeriodKey>, _>>()?;
                MeterNetwork::build(nodes, keys)?
            }
            None => MeterNetwork::from_nodes(nodes)?,
        };

        log::info!(
            "loaded dataset '{}': {} meters, {} periods",
            self.name,
            network.len(),
            network.periods().len()
        );

        Ok(Dataset {
            name: self.name,
            utility: self.utility,
            unit: self.unit,
            thresholds: self.thresholds,
            network,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Muscat Bay"
utility = "water"
unit = "m3"

[thresholds]
elevated_pct = 12.5
critical_pct = 30.0

[[meters]]
id = "L1"
label = "Main Bulk (NAMA)"
level = "main"
[meters.readings]
"2025-04" = 1000.0

[[meters]]
id = "Z1"
level = "zone_bulk"
zone = "Z1"
parent = "L1"
[meters.readings]
"2025-04" = 400.0

[[meters]]
id = "Z1-A"
level = "individual"
zone = "Z1"
parent = "Z1"
[meters.readings]
"2025-04" = 150.0
"#;

    #[test]
    fn parse_valid_dataset() {
        let config = DatasetConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Muscat Bay");
        assert_eq!(config.utility, UtilityKind::Water);
        assert_eq!(config.meters.len(), 3);
        assert_eq!(config.meters[1].level, MeterLevel::ZoneBulk);
        assert_eq!(config.thresholds.elevated_pct, 12.5);
        assert!(config.readings_file.is_none());
        assert_eq!(config.readings_columns.meter_id, "meter_id");
    }

    #[test]
    fn defaults_apply() {
        let input = r#"
name = "Minimal"

[[meters]]
id = "L1"
level = "main"
"#;
        let config = DatasetConfig::from_toml(input).unwrap();
        assert_eq!(config.unit, "m3");
        assert_eq!(config.utility, UtilityKind::Water);
        assert_eq!(config.thresholds, LossThresholds::default());
        let dataset = config.into_dataset(vec![]).unwrap();
        assert_eq!(dataset.network.main_node().label, "L1");
        assert!(dataset.network.periods().is_empty());
    }

    #[test]
    fn into_dataset_builds_network() {
        let dataset = DatasetConfig::from_toml(VALID)
            .unwrap()
            .into_dataset(vec![])
            .unwrap();
        assert_eq!(dataset.network.len(), 3);
        assert_eq!(dataset.network.main_node().label, "Main Bulk (NAMA)");
        assert_eq!(dataset.network.node("Z1-A").unwrap().parent_id.as_deref(), Some("Z1"));
        assert_eq!(dataset.thresholds.critical_pct, 30.0);
    }

    #[test]
    fn csv_rows_merge_onto_inline_readings() {
        let period: PeriodKey = "2025-04".parse().unwrap();
        let rows = vec![
            ReadingRow { meter_id: "Z1-A".into(), period, value: 10.0 },
            ReadingRow { meter_id: "Z1-A".into(), period, value: 5.0 },
        ];
        let dataset = DatasetConfig::from_toml(VALID).unwrap().into_dataset(rows).unwrap();
        assert_eq!(dataset.network.node("Z1-A").unwrap().reading(&period), 165.0);
    }

    #[test]
    fn reject_csv_row_for_unknown_meter() {
        let rows = vec![ReadingRow {
            meter_id: "ghost".into(),
            period: "2025-04".parse().unwrap(),
            value: 1.0,
        }];
        let err = DatasetConfig::from_toml(VALID).unwrap().into_dataset(rows).unwrap_err();
        assert!(err.to_string().contains("'ghost'"));
    }

    #[test]
    fn explicit_periods_are_authoritative() {
        let input = format!("periods = [\"2025-03\", \"2025-04\"]\n{VALID}");
        let dataset = DatasetConfig::from_toml(&input).unwrap().into_dataset(vec![]).unwrap();
        assert_eq!(dataset.network.periods().len(), 2);
    }

    #[test]
    fn structural_errors_surface() {
        let input = VALID.replace("parent = \"Z1\"", "parent = \"Z9\"");
        let err = DatasetConfig::from_toml(&input).unwrap().into_dataset(vec![]).unwrap_err();
        assert!(matches!(err, ReconError::Structural(_)));
        assert!(err.to_string().contains("structural data error"));
    }

    #[test]
    fn reject_empty_name() {
        let input = VALID.replace("name = \"Muscat Bay\"", "name = \"  \"");
        let err = DatasetConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn reject_no_meters() {
        let err = DatasetConfig::from_toml("name = \"Empty\"").unwrap_err();
        assert!(err.to_string().contains("at least one meter"));
    }

    #[test]
    fn reject_inverted_thresholds() {
        let input = VALID.replace("critical_pct = 30.0", "critical_pct = 5.0");
        let err = DatasetConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn reject_non_canonical_period() {
        let input = VALID.replace("\"2025-04\" = 150.0", "\"April-25\" = 150.0");
        let err = DatasetConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::PeriodParse { ref value } if value == "April-25"));
    }

    #[test]
    fn reject_unknown_level() {
        let input = VALID.replace("level = \"individual\"", "level = \"tenant\"");
        let err = DatasetConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }
}
