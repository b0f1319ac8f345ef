// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Report formatting

use comfy_table::{Table, presets::NOTHING};
use serde::Serialize;

use crate::report::EvacuationReport;

/// Create a new table with headers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(headers);
    table
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Instance placement after the evacuation
pub fn instances_table(report: &EvacuationReport) -> Table {
    let mut table = create_table(&["ID", "NAME", "HOST", "STATUS"]);
    for instance in &report.instances {
        table.add_row(vec![
            instance.id.clone(),
            instance.name.clone(),
            instance.host.clone(),
            instance.status.to_string(),
        ]);
    }
    table
}

/// Ping checks that passed
pub fn pings_table(report: &EvacuationReport) -> Table {
    let mut table = create_table(&["FROM", "TO", "IP"]);
    for ping in &report.pings {
        table.add_row(vec![ping.from.clone(), ping.to.clone(), ping.ip.clone()]);
    }
    table
}

/// Human-readable summary
pub fn print_report(report: &EvacuationReport) {
    println!(
        "Evacuated {} -> {} via {} ({:.1}s to converge)",
        report.source_host, report.target_host, report.trigger, report.converged_after_secs
    );
    println!();
    println!("{}", instances_table(report));
    println!();
    println!("{}", pings_table(report));
    for id in &report.skipped_self_pairs {
        println!("skipped self-pair: {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{InstanceOutcome, PingOutcome};
    use nova_api::ServerStatus;

    fn report() -> EvacuationReport {
        EvacuationReport {
            source_host: "node-1".to_string(),
            target_host: "node-2".to_string(),
            trigger: "nova-cli".to_string(),
            migration_requests: Vec::new(),
            instances: vec![InstanceOutcome {
                id: "id-1".to_string(),
                name: "vm1".to_string(),
                host: "node-2".to_string(),
                status: ServerStatus::Active,
            }],
            pings: vec![PingOutcome {
                from: "id-1".to_string(),
                to: "id-2".to_string(),
                ip: "10.1.0.6".to_string(),
            }],
            skipped_self_pairs: Vec::new(),
            converged_after_secs: 12.0,
        }
    }

    #[test]
    fn instance_table_has_one_row_per_instance() {
        let rendered = instances_table(&report()).to_string();
        assert!(rendered.contains("HOST"));
        assert!(rendered.contains("vm1"));
        assert!(rendered.contains("ACTIVE"));
    }

    #[test]
    fn json_omits_empty_self_pairs() {
        let value = serde_json::to_value(report()).unwrap();
        assert_eq!(value["target_host"], "node-2");
        assert_eq!(value["instances"][0]["status"], "ACTIVE");
        assert!(value.get("skipped_self_pairs").is_none());
    }
}
