use crate::output::{print_json, print_table};
use awtrix_sync_core::config::Config;
use awtrix_sync_core::CycleReport;

pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let engine = super::build_engine(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(engine.run_cycle());

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &CycleReport) {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for unit in &report.replayed {
        rows.push(vec![unit.clone(), "replayed".to_string(), String::new()]);
    }
    for unit in &report.published {
        rows.push(vec![unit.clone(), "published".to_string(), String::new()]);
    }
    for unit in &report.removed {
        rows.push(vec![unit.clone(), "removed".to_string(), String::new()]);
    }
    for failure in &report.failures {
        rows.push(vec![
            failure.unit.clone().unwrap_or_else(|| "-".to_string()),
            format!("{} failed", failure.kind.as_str()),
            failure.message.clone(),
        ]);
    }

    if rows.is_empty() {
        println!("Nothing to do.");
    } else {
        print_table(&["UNIT", "RESULT", "DETAIL"], rows);
    }

    println!();
    println!(
        "Known units: {}",
        if report.known_units.is_empty() {
            "(none)".to_string()
        } else {
            report.known_units.join(", ")
        }
    );
    println!("Pending payloads: {}", report.pending_remaining);
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}
