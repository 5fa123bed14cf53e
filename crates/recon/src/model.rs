use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

/// Canonical `YYYY-MM` reporting month. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    year: i32,
    month: u32,
}

impl PeriodKey {
    /// Years are limited to four digits so every key prints as `YYYY-MM`.
    pub fn new(year: i32, month: u32) -> Result<Self, ReconError> {
        (0..=9999)
            .contains(&year)
            .then(|| NaiveDate::from_ymd_opt(year, month, 1))
            .flatten()
            .map(|_| Self { year, month })
            .ok_or_else(|| ReconError::PeriodParse {
                value: format!("{year:04}-{month:02}"),
            })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl FromStr for PeriodKey {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ReconError::PeriodParse { value: s.to_string() };
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(err());
        }
        if !s[..4].bytes().chain(s[5..].bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let date = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").map_err(|_| err())?;
        Ok(Self {
            year: date.year(),
            month: date.month(),
        })
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = ReconError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Which period(s) a query collapses readings over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodSelector {
    Period(PeriodKey),
    /// Sum across every known period.
    AllPeriods,
}

impl From<PeriodKey> for PeriodSelector {
    fn from(key: PeriodKey) -> Self {
        Self::Period(key)
    }
}

impl fmt::Display for PeriodSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Period(key) => write!(f, "{key}"),
            Self::AllPeriods => write!(f, "all"),
        }
    }
}

impl Serialize for PeriodSelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Meters
// ---------------------------------------------------------------------------

/// Rank of a meter in the distribution hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterLevel {
    /// L1: the single bulk intake for the whole system.
    Main,
    /// L2: total inflow to one zone.
    ZoneBulk,
    /// L3: end-consumer meter.
    Individual,
    /// Draws from a zone or the main supply but is not an end-customer unit.
    DirectConnection,
}

impl MeterLevel {
    pub const ALL: [MeterLevel; 4] = [
        MeterLevel::Main,
        MeterLevel::ZoneBulk,
        MeterLevel::Individual,
        MeterLevel::DirectConnection,
    ];
}

impl fmt::Display for MeterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::ZoneBulk => write!(f, "zone_bulk"),
            Self::Individual => write!(f, "individual"),
            Self::DirectConnection => write!(f, "direct_connection"),
        }
    }
}

/// One metering point. Readings are historical facts and are never mutated
/// once the node is part of a network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterNode {
    pub id: String,
    pub label: String,
    pub level: MeterLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip)]
    pub readings: BTreeMap<PeriodKey, f64>,
}

impl MeterNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, level: MeterLevel) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            level,
            zone: None,
            parent_id: None,
            readings: BTreeMap::new(),
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_reading(mut self, period: PeriodKey, value: f64) -> Self {
        self.readings.insert(period, value);
        self
    }

    /// Reading for one period; a missing period reads as zero.
    pub fn reading(&self, period: &PeriodKey) -> f64 {
        self.readings.get(period).copied().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Which hierarchy boundary a metrics query aggregates over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    AllZones,
    /// An explicit set of zone codes. An empty set matches no meters.
    Zones(BTreeSet<String>),
    /// The L1 boundary: main intake vs. zone bulks plus direct connections.
    MainSupply,
}

impl Scope {
    pub fn zone(zone: impl Into<String>) -> Self {
        Self::Zones(BTreeSet::from([zone.into()]))
    }

    pub fn zones<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Zones(zones.into_iter().map(Into::into).collect())
    }

    /// Whether a zone-level meter with this zone code is in scope.
    /// `MainSupply` does not select by zone.
    pub fn includes_zone(&self, zone: Option<&str>) -> bool {
        match self {
            Self::AllZones => true,
            Self::Zones(set) => zone.is_some_and(|z| set.contains(z)),
            Self::MainSupply => false,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllZones => write!(f, "all zones"),
            Self::Zones(set) => {
                let zones: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "zones {}", zones.join(", "))
            }
            Self::MainSupply => write!(f, "main supply"),
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Supply vs. consumption at one hierarchy boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ZoneMetrics {
    pub supply: f64,
    pub consumption: f64,
    /// `supply - consumption`. Negative when consumption exceeds recorded supply.
    pub loss: f64,
    /// `loss / supply * 100`, or 0 when supply is not positive.
    pub loss_percentage: f64,
}

impl ZoneMetrics {
    pub fn from_totals(supply: f64, consumption: f64) -> Self {
        let loss = supply - consumption;
        let loss_percentage = if supply > 0.0 { loss / supply * 100.0 } else { 0.0 };
        Self {
            supply,
            consumption,
            loss,
            loss_percentage,
        }
    }
}

/// One element of a historical series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodMetrics {
    pub period: PeriodKey,
    #[serde(flatten)]
    pub metrics: ZoneMetrics,
}

/// A child meter annotated with its reading and share of the sibling total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildShare<'a> {
    pub node: &'a MeterNode,
    pub reading: f64,
    pub percent_of_parent: f64,
}

// ---------------------------------------------------------------------------
// Loss attribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossBand {
    /// Consumption exceeds supply (metering or timing mismatch).
    Gain,
    Normal,
    Elevated,
    Critical,
}

impl fmt::Display for LossBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gain => write!(f, "gain"),
            Self::Normal => write!(f, "normal"),
            Self::Elevated => write!(f, "elevated"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// The three loss stages reported side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemBreakdown {
    /// L1 vs. L2 bulks + direct connections.
    pub stage1: ZoneMetrics,
    /// L2 bulks vs. L3 individual meters.
    pub stage2: ZoneMetrics,
    /// L1 vs. L3 individual meters + direct connections.
    pub total: ZoneMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneLoss {
    pub zone: String,
    pub bulk_meter_ids: Vec<String>,
    pub individual_meters: usize,
    pub metrics: ZoneMetrics,
    pub band: LossBand,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReportMeta,
    pub summary: ReportSummary,
    pub system: SystemBreakdown,
    pub zones: Vec<ZoneLoss>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub dataset: String,
    pub utility: String,
    pub unit: String,
    pub period: PeriodSelector,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub zone_count: usize,
    pub meters_by_level: BTreeMap<String, usize>,
    pub band_counts: BTreeMap<String, usize>,
    pub critical_zones: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_key_parses_canonical_months() {
        let key: PeriodKey = "2025-04".parse().unwrap();
        assert_eq!((key.year(), key.month()), (2025, 4));
        assert_eq!(key.to_string(), "2025-04");
        assert!("2025-4".parse::<PeriodKey>().is_err());
        assert!("2025-13".parse::<PeriodKey>().is_err());
    }

    #[test]
    fn period_key_rejects_years_outside_four_digits() {
        assert!(PeriodKey::new(-1, 1).is_err());
        assert!(PeriodKey::new(10_000, 1).is_err());
        assert!(PeriodKey::new(2025, 0).is_err());

        let edge = PeriodKey::new(9999, 12).unwrap();
        let text = String::from(edge);
        assert_eq!(text, "9999-12");
        assert_eq!(PeriodKey::try_from(text).unwrap(), edge);
        assert_eq!(PeriodKey::new(0, 1).unwrap().to_string(), "0000-01");
    }
}
