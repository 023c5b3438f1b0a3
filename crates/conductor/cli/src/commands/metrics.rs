//! Metrics command: per-flow TSV export of stage durations
//!
//! One row per (contract, stage) the contract has entered, in flow
//! order. Contracts still sitting in a stage export an empty exited
//! column and an empty duration.

use crate::commands::seed;
use crate::error::{CliError, CliResult};
use conductor_engine::ConductorEngine;
use conductor_types::Flow;
use std::io::Write;
use std::path::Path;

const HEADER: &str = "contract\tstage\tentered\texited\tduration_days";

/// Render the per-stage duration table for one flow as TSV
pub fn render(engine: &ConductorEngine, flow: &Flow) -> CliResult<String> {
    let mut out = String::from(HEADER);
    out.push('\n');

    let mut contracts: Vec<_> = engine
        .store()
        .active_contracts()
        .into_iter()
        .filter(|c| c.flow_id.as_ref() == Some(&flow.id))
        .collect();
    contracts.sort_by(|a, b| a.description.cmp(&b.description));

    for contract in contracts {
        for stage_id in &flow.stage_order {
            let key = conductor_types::ContractStageKey::new(
                contract.id.clone(),
                stage_id.clone(),
                flow.id.clone(),
            );
            let row = engine.store().stage_row(&key)?;
            let Some(entered) = row.entered else {
                continue;
            };
            let stage = engine.registry().stage(stage_id)?;
            let exited = row
                .exited
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            let duration = row
                .duration()
                .map(|d| format!("{:.2}", d.num_seconds() as f64 / 86_400.0))
                .unwrap_or_default();
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                contract.description,
                stage.name,
                entered.to_rfc3339(),
                exited,
                duration
            ));
        }
    }
    Ok(out)
}

/// `conductor metrics --flow <name> --file seeds.json [--out file.tsv]`
pub fn execute(file: &Path, flow_name: &str, out: Option<&Path>) -> CliResult<()> {
    let doc = seed::read_document(file)?;
    let (engine, _) = seed::load_engine(&doc)?;
    let flow = engine
        .registry()
        .flow_by_name(flow_name)
        .map_err(|_| CliError::NotFound(format!("flow '{flow_name}'")))?;

    let table = render(&engine, flow)?;
    match out {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            file.write_all(table.as_bytes())?;
            tracing::info!(path = %path.display(), flow = flow_name, "Metrics written");
        }
        None => print!("{table}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::seed::{load_engine, SeedDocument};

    fn engine_with_history() -> ConductorEngine {
        let doc: SeedDocument = serde_json::from_str(
            r#"{
                "stages": [{"name": "Draft"}, {"name": "Award"}],
                "flows": [{"name": "Standard", "stages": ["Draft", "Award"]}],
                "contracts": [
                    {
                        "description": "Rock salt supply",
                        "flow": "Standard",
                        "history": [
                            {"stage": "Draft",
                             "entered": "2026-01-01T00:00:00Z",
                             "exited": "2026-01-15T00:00:00Z"},
                            {"stage": "Award",
                             "entered": "2026-01-15T00:00:00Z"}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();
        load_engine(&doc).unwrap().0
    }

    #[test]
    fn test_render_shape() {
        let engine = engine_with_history();
        let flow = engine.registry().flow_by_name("Standard").unwrap();
        let table = render(&engine, flow).unwrap();

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], HEADER);
        // One row per entered stage
        assert_eq!(lines.len(), 3);

        let draft: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(draft[0], "Rock salt supply");
        assert_eq!(draft[1], "Draft");
        assert_eq!(draft[4], "14.00");

        // Still in Award: empty exited and duration
        let award: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(award[1], "Award");
        assert_eq!(award[3], "");
        assert_eq!(award[4], "");
    }

    #[test]
    fn test_untraversed_stages_omitted() {
        let doc: SeedDocument = serde_json::from_str(
            r#"{
                "stages": [{"name": "Draft"}, {"name": "Award"}],
                "flows": [{"name": "Standard", "stages": ["Draft", "Award"]}],
                "contracts": [{"description": "Paving", "flow": "Standard"}]
            }"#,
        )
        .unwrap();
        let engine = load_engine(&doc).unwrap().0;
        let flow = engine.registry().flow_by_name("Standard").unwrap();
        let table = render(&engine, flow).unwrap();
        assert_eq!(table.lines().count(), 1); // header only
    }
}
