//! Seed command: build an engine from a JSON seed document
//!
//! The document carries stage and flow definitions plus contracts with
//! optional per-stage history. Seeding is safe to repeat: stages and
//! flows that already exist by name are skipped, not duplicated.

use crate::error::{CliError, CliResult};
use chrono::{DateTime, Utc};
use conductor_engine::ConductorEngine;
use conductor_types::{Contract, ContractStageKey, Flow, Stage, StageId};
use serde::Deserialize;
use std::path::Path;

/// A stage definition to register
#[derive(Debug, Deserialize)]
pub struct StageSeed {
    pub name: String,
    #[serde(default)]
    pub post_opportunities: bool,
    #[serde(default)]
    pub default_message: Option<String>,
}

/// A flow definition, referencing stages by name
#[derive(Debug, Deserialize)]
pub struct FlowSeed {
    pub name: String,
    pub stages: Vec<String>,
}

/// One traversed stage of a contract's history
#[derive(Debug, Deserialize)]
pub struct HistorySeed {
    pub stage: String,
    pub entered: DateTime<Utc>,
    #[serde(default)]
    pub exited: Option<DateTime<Utc>>,
}

/// A contract, optionally positioned on a flow with history
#[derive(Debug, Deserialize)]
pub struct ContractSeed {
    pub description: String,
    #[serde(default)]
    pub flow: Option<String>,
    #[serde(default)]
    pub history: Vec<HistorySeed>,
}

/// The full seed document
#[derive(Debug, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub stages: Vec<StageSeed>,
    #[serde(default)]
    pub flows: Vec<FlowSeed>,
    #[serde(default)]
    pub contracts: Vec<ContractSeed>,
}

/// What the seeding pass actually did
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub stages_created: usize,
    pub stages_skipped: usize,
    pub flows_created: usize,
    pub flows_skipped: usize,
    pub contracts_created: usize,
}

/// Parse a seed document from a file
pub fn read_document(path: &Path) -> CliResult<SeedDocument> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Build an engine from a seed document
pub fn load_engine(doc: &SeedDocument) -> CliResult<(ConductorEngine, SeedSummary)> {
    let mut engine = ConductorEngine::new();
    let mut summary = SeedSummary::default();

    for seed in &doc.stages {
        if engine.registry().stage_by_name(&seed.name).is_some() {
            summary.stages_skipped += 1;
            continue;
        }
        let mut stage = Stage::new(&seed.name).with_post_opportunities(seed.post_opportunities);
        if let Some(message) = &seed.default_message {
            stage = stage.with_default_message(message);
        }
        engine.registry_mut().register_stage(stage);
        summary.stages_created += 1;
    }

    for seed in &doc.flows {
        if engine.registry().flow_by_name(&seed.name).is_ok() {
            summary.flows_skipped += 1;
            continue;
        }
        let stage_order = seed
            .stages
            .iter()
            .map(|name| stage_id_by_name(&engine, name))
            .collect::<CliResult<Vec<StageId>>>()?;
        engine
            .registry_mut()
            .register_flow(Flow::new(&seed.name, stage_order))?;
        summary.flows_created += 1;
    }

    for seed in &doc.contracts {
        let contract_id = engine
            .store_mut()
            .insert_contract(Contract::new(&seed.description));
        summary.contracts_created += 1;

        let Some(flow_name) = &seed.flow else {
            if !seed.history.is_empty() {
                return Err(CliError::Seed(format!(
                    "contract '{}' has history but no flow",
                    seed.description
                )));
            }
            continue;
        };
        let flow_id = engine.registry().flow_by_name(flow_name)?.id.clone();
        engine.create_contract_stages(&contract_id, &flow_id)?;

        for entry in &seed.history {
            let stage_id = stage_id_by_name(&engine, &entry.stage)?;
            let key = ContractStageKey::new(contract_id.clone(), stage_id.clone(), flow_id.clone());
            let row = engine.store_mut().stage_row_mut(&key)?;
            row.enter(entry.entered);
            if let Some(exited) = entry.exited {
                row.exit(exited);
            } else {
                engine.store_mut().contract_mut(&contract_id)?.current_stage_id =
                    Some(stage_id);
            }
        }
    }

    Ok((engine, summary))
}

fn stage_id_by_name(engine: &ConductorEngine, name: &str) -> CliResult<StageId> {
    engine
        .registry()
        .stage_by_name(name)
        .map(|s| s.id.clone())
        .ok_or_else(|| CliError::NotFound(format!("stage '{name}'")))
}

/// `conductor seed --file seeds.json`
pub fn execute(file: &Path) -> CliResult<()> {
    let doc = read_document(file)?;
    let (_engine, summary) = load_engine(&doc)?;
    tracing::info!(
        stages = summary.stages_created,
        flows = summary.flows_created,
        contracts = summary.contracts_created,
        "Seed loaded"
    );
    println!(
        "Seeded {} stages ({} already present), {} flows ({} already present), {} contracts",
        summary.stages_created,
        summary.stages_skipped,
        summary.flows_created,
        summary.flows_skipped,
        summary.contracts_created
    );
    Ok(())
}
