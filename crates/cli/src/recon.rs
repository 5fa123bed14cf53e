//! `mwork validate | metrics | series | children | report`: dataset-driven
//! reconciliation commands.

use std::path::{Path, PathBuf};

use meterworks_recon::{
    build_report, Dataset, MeterLevel, PeriodKey, PeriodMetrics, PeriodSelector, ReconReport,
    ReconciliationEngine, Scope, ZoneMetrics,
};
use serde::Serialize;

use crate::dataset::load_dataset;
use crate::exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_REPORT_CRITICAL, EXIT_USAGE};
use crate::table::{fmt_pct, fmt_volume, Align, Table};
use crate::CliError;

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// `--main` wins over `--zone`; no flags at all means every zone.
pub(crate) fn scope_from_args(zones: Vec<String>, main: bool) -> Scope {
    if main {
        Scope::MainSupply
    } else if zones.is_empty() {
        Scope::AllZones
    } else {
        Scope::zones(zones)
    }
}

pub(crate) fn period_from_arg(period: Option<PeriodKey>) -> PeriodSelector {
    period.map_or(PeriodSelector::AllPeriods, PeriodSelector::Period)
}

fn warn_unknown_period(dataset: &Dataset, period: &PeriodSelector) {
    if let PeriodSelector::Period(key) = period {
        if !dataset.network.periods().contains(key) {
            log::warn!("period {key} is not registered in '{}'; values will be zero", dataset.name);
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| recon_err(EXIT_ERROR, format!("JSON serialization error: {e}")))
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(dataset_path: PathBuf) -> Result<(), CliError> {
    let dataset = load_dataset(&dataset_path)?;
    let net = &dataset.network;

    let by_level: Vec<String> = net
        .count_by_level()
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(level, n)| format!("{n} {level}"))
        .collect();

    let periods = match (net.periods().first(), net.periods().last()) {
        (Some(first), Some(last)) if first != last => {
            format!("{} periods ({first}..{last})", net.periods().len())
        }
        (Some(only), _) => format!("1 period ({only})"),
        _ => "no readings".to_string(),
    };

    eprintln!(
        "valid: {} dataset '{}' with {} meter(s) ({}), {} zone(s), {}",
        dataset.utility,
        dataset.name,
        net.len(),
        by_level.join(", "),
        net.zones().len(),
        periods,
    );
    Ok(())
}

// ============================================================================
// metrics
// ============================================================================

#[derive(Serialize)]
struct MetricsOutput<'a> {
    dataset: &'a str,
    unit: &'a str,
    scope: String,
    period: PeriodSelector,
    #[serde(flatten)]
    metrics: ZoneMetrics,
}

pub fn cmd_metrics(
    dataset_path: PathBuf,
    scope: Scope,
    period: PeriodSelector,
    json_output: bool,
) -> Result<(), CliError> {
    let dataset = load_dataset(&dataset_path)?;
    warn_unknown_period(&dataset, &period);

    let engine = ReconciliationEngine::new(&dataset.network);
    let metrics = engine.compute_zone_metrics(&scope, &period);

    if json_output {
        let out = MetricsOutput {
            dataset: &dataset.name,
            unit: &dataset.unit,
            scope: scope.to_string(),
            period,
            metrics,
        };
        println!("{}", to_json(&out)?);
        return Ok(());
    }

    let unit = &dataset.unit;
    println!("scope:        {scope}");
    println!("period:       {period}");
    println!("supply:       {} {unit}", fmt_volume(metrics.supply));
    println!("consumption:  {} {unit}", fmt_volume(metrics.consumption));
    println!(
        "loss:         {} {unit} ({})",
        fmt_volume(metrics.loss),
        fmt_pct(metrics.loss_percentage)
    );
    Ok(())
}

// ============================================================================
// series
// ============================================================================

#[derive(Serialize)]
struct SeriesOutput<'a> {
    dataset: &'a str,
    unit: &'a str,
    scope: String,
    periods: Vec<PeriodMetrics>,
}

pub fn cmd_series(dataset_path: PathBuf, scope: Scope, json_output: bool) -> Result<(), CliError> {
    let dataset = load_dataset(&dataset_path)?;
    let engine = ReconciliationEngine::new(&dataset.network);
    let periods: Vec<PeriodMetrics> = engine.historical_series(&scope).collect();

    if json_output {
        let out = SeriesOutput {
            dataset: &dataset.name,
            unit: &dataset.unit,
            scope: scope.to_string(),
            periods,
        };
        println!("{}", to_json(&out)?);
        return Ok(());
    }

    let mut table = Table::new(&[
        ("period", Align::Left),
        ("supply", Align::Right),
        ("consumption", Align::Right),
        ("loss", Align::Right),
        ("loss %", Align::Right),
    ]);
    for pm in &periods {
        let m = &pm.metrics;
        table.row(vec![
            pm.period.to_string(),
            fmt_volume(m.supply),
            fmt_volume(m.consumption),
            fmt_volume(m.loss),
            fmt_pct(m.loss_percentage),
        ]);
    }
    println!("{} ({}, {})", dataset.name, scope, dataset.unit);
    print!("{}", table.render());
    Ok(())
}

// ============================================================================
// children
// ============================================================================

#[derive(Serialize)]
struct ChildRow<'a> {
    id: &'a str,
    label: &'a str,
    level: MeterLevel,
    zone: Option<&'a str>,
    reading: f64,
    percent_of_parent: f64,
}

#[derive(Serialize)]
struct ChildrenOutput<'a> {
    parent: &'a str,
    period: PeriodSelector,
    children: Vec<ChildRow<'a>>,
}

pub fn cmd_children(
    dataset_path: PathBuf,
    parent_id: String,
    period: PeriodSelector,
    json_output: bool,
) -> Result<(), CliError> {
    let dataset = load_dataset(&dataset_path)?;
    if dataset.network.node(&parent_id).is_none() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!("unknown meter '{parent_id}'"),
            hint: Some(format!(
                "the main meter is '{}'",
                dataset.network.main_node().id
            )),
        });
    }
    warn_unknown_period(&dataset, &period);

    let engine = ReconciliationEngine::new(&dataset.network);
    let children: Vec<ChildRow<'_>> = engine
        .list_child_nodes(&parent_id, &period)
        .into_iter()
        .map(|c| ChildRow {
            id: &c.node.id,
            label: &c.node.label,
            level: c.node.level,
            zone: c.node.zone.as_deref(),
            reading: c.reading,
            percent_of_parent: c.percent_of_parent,
        })
        .collect();

    if json_output {
        let out = ChildrenOutput {
            parent: &parent_id,
            period,
            children,
        };
        println!("{}", to_json(&out)?);
        return Ok(());
    }

    if children.is_empty() {
        println!("{parent_id} has no child meters");
        return Ok(());
    }

    let mut table = Table::new(&[
        ("meter", Align::Left),
        ("label", Align::Left),
        ("level", Align::Left),
        ("reading", Align::Right),
        ("share", Align::Right),
    ]);
    for c in &children {
        table.row(vec![
            c.id.to_string(),
            c.label.to_string(),
            c.level.to_string(),
            fmt_volume(c.reading),
            fmt_pct(c.percent_of_parent),
        ]);
    }
    println!("children of {parent_id} ({period}, {})", dataset.unit);
    print!("{}", table.render());
    Ok(())
}

// ============================================================================
// report
// ============================================================================

pub fn cmd_report(
    dataset_path: PathBuf,
    period: PeriodSelector,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let dataset = load_dataset(&dataset_path)?;
    warn_unknown_period(&dataset, &period);

    let report = build_report(&dataset, &period);

    if json_output || output_file.is_some() {
        let json_str = to_json(&report)?;
        if let Some(ref path) = output_file {
            write_output(path, &json_str)?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    eprint!("{}", render_report(&report));

    let critical = &report.summary.critical_zones;
    if strict && !critical.is_empty() {
        return Err(recon_err(
            EXIT_REPORT_CRITICAL,
            format!("critical loss in zone(s): {}", critical.join(", ")),
        ));
    }
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents)
        .map_err(|e| recon_err(EXIT_IO, format!("cannot write output: {e}")))
}

pub(crate) fn render_report(report: &ReconReport) -> String {
    let meta = &report.meta;
    let mut out = format!(
        "{} ({}, {}), period {}\n\n",
        meta.dataset, meta.utility, meta.unit, meta.period
    );

    let mut stages = Table::new(&[
        ("stage", Align::Left),
        ("supply", Align::Right),
        ("consumption", Align::Right),
        ("loss", Align::Right),
        ("loss %", Align::Right),
    ]);
    let system = &report.system;
    for (name, m) in [
        ("L1 -> L2 + DC", &system.stage1),
        ("L2 -> L3", &system.stage2),
        ("total", &system.total),
    ] {
        stages.row(vec![
            name.to_string(),
            fmt_volume(m.supply),
            fmt_volume(m.consumption),
            fmt_volume(m.loss),
            fmt_pct(m.loss_percentage),
        ]);
    }
    out.push_str(&stages.render());

    if !report.zones.is_empty() {
        out.push('\n');
        let mut zones = Table::new(&[
            ("zone", Align::Left),
            ("meters", Align::Right),
            ("supply", Align::Right),
            ("consumption", Align::Right),
            ("loss", Align::Right),
            ("loss %", Align::Right),
            ("band", Align::Left),
        ]);
        for z in &report.zones {
            zones.row(vec![
                z.zone.clone(),
                z.individual_meters.to_string(),
                fmt_volume(z.metrics.supply),
                fmt_volume(z.metrics.consumption),
                fmt_volume(z.metrics.loss),
                fmt_pct(z.metrics.loss_percentage),
                z.band.to_string(),
            ]);
        }
        out.push_str(&zones.render());
    }

    let s = &report.summary;
    let bands: Vec<String> = s.band_counts.iter().map(|(b, n)| format!("{n} {b}")).collect();
    out.push_str(&format!(
        "\n{} zone(s): {}\n",
        s.zone_count,
        if bands.is_empty() { "none".to_string() } else { bands.join(", ") }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_flags() {
        assert_eq!(scope_from_args(vec![], false), Scope::AllZones);
        assert_eq!(scope_from_args(vec![], true), Scope::MainSupply);
        assert_eq!(
            scope_from_args(vec!["Z3".into(), "Z5".into(), "Z3".into()], false),
            Scope::zones(["Z3", "Z5"])
        );
        assert_eq!(scope_from_args(vec!["Z3".into()], true), Scope::MainSupply);
    }

    #[test]
    fn period_flag() {
        assert_eq!(period_from_arg(None), PeriodSelector::AllPeriods);
        let key: PeriodKey = "2025-01".parse().unwrap();
        assert_eq!(period_from_arg(Some(key)), PeriodSelector::Period(key));
    }
}
