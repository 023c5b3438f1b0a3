//! The conductor engine: assign, transition, switch-flow, complete
//!
//! All mutating operations take the acting user's identity for audit
//! attribution and an optional timestamp so retroactive entries can be
//! made (e.g. assigning a contract with a historical start date). Each
//! operation returns the action items it created so the surrounding
//! layer can compose notifications from them.

use crate::action_log;
use crate::{ContractStore, FlowRegistry, RefreshEvent, RefreshHook};
use chrono::{DateTime, Utc};
use conductor_types::{
    ActionItem, ActionKind, ConductorError, ConductorResult, ContractId, ContractStageKey, Flow,
    FlowId, StageId, UserId,
};

/// The workflow engine: owns the definition registry, the contract
/// store, and the registered refresh hooks.
pub struct ConductorEngine {
    registry: FlowRegistry,
    store: ContractStore,
    hooks: Vec<Box<dyn RefreshHook>>,
}

impl ConductorEngine {
    /// Create a new engine with empty registry and store
    pub fn new() -> Self {
        Self {
            registry: FlowRegistry::new(),
            store: ContractStore::new(),
            hooks: Vec::new(),
        }
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FlowRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &ContractStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ContractStore {
        &mut self.store
    }

    /// Register an on-write observer (e.g. a search view refresh
    /// trigger). Hooks are fire-and-forget.
    pub fn add_refresh_hook(&mut self, hook: Box<dyn RefreshHook>) {
        self.hooks.push(hook);
    }

    fn notify(&self, event: RefreshEvent) {
        for hook in &self.hooks {
            hook.on_write(&event);
        }
    }

    // ── Flow editing ─────────────────────────────────────────────────

    /// Replace a flow's stage order. Rejected once any contract history
    /// references the flow; archive it and create a new one instead.
    pub fn edit_flow_order(
        &mut self,
        flow_id: &FlowId,
        stage_order: Vec<StageId>,
    ) -> ConductorResult<()> {
        if self.store.flow_has_history(flow_id) {
            let name = self.registry.flow(flow_id)?.name.clone();
            return Err(ConductorError::FlowInUse(name));
        }
        self.registry.set_stage_order(flow_id, stage_order)
    }

    // ── Stage materialization ────────────────────────────────────────

    /// Materialize the ContractStage rows for a contract under a flow:
    /// one row per stage in the flow's order, get-or-create semantics.
    ///
    /// Idempotent: calling this twice yields the same rows, never
    /// duplicates. `reverted` is true when any row already existed,
    /// signalling that the contract has partially traversed this flow
    /// before and revert semantics apply to re-entry.
    ///
    /// Side effect: sets the contract's `flow_id`.
    pub fn create_contract_stages(
        &mut self,
        contract_id: &ContractId,
        flow_id: &FlowId,
    ) -> ConductorResult<(Vec<StageId>, Vec<ContractStageKey>, bool)> {
        let flow = self.registry.flow(flow_id)?.clone();
        self.store.contract(contract_id)?;

        let mut keys = Vec::with_capacity(flow.len());
        let mut reverted = false;
        for stage_id in &flow.stage_order {
            let key =
                ContractStageKey::new(contract_id.clone(), stage_id.clone(), flow_id.clone());
            let (key, created) = self.store.get_or_create_stage(key);
            reverted |= !created;
            keys.push(key);
        }

        let contract = self.store.contract_mut(contract_id)?;
        contract.flow_id = Some(flow_id.clone());
        contract.touch();

        Ok((flow.stage_order, keys, reverted))
    }

    // ── Transition state machine ─────────────────────────────────────

    /// Move a contract one step through its flow.
    ///
    /// - Not started: enters the first stage.
    /// - `destination` one stage ahead: normal forward step.
    /// - `destination` further ahead: error, skipping is not supported.
    /// - `destination` at or behind the current stage: revert; the
    ///   destination stage is reopened, every stage after it in the
    ///   traversed range is fully wiped.
    /// - No destination, on the last stage: exits it. The caller is
    ///   responsible for invoking `complete` afterwards; the transition
    ///   itself does not cascade into completion. A repeat call once
    ///   the exit is recorded is rejected, the flow is over.
    /// - Otherwise: exits the current stage and enters the next one as
    ///   one atomic step.
    ///
    /// `complete_time` defaults to now; supplying it backdates the
    /// enter/exit timestamps and the logged actions.
    pub fn transition(
        &mut self,
        contract_id: &ContractId,
        user: &UserId,
        destination: Option<&StageId>,
        complete_time: Option<DateTime<Utc>>,
    ) -> ConductorResult<Vec<ActionItem>> {
        let contract = self.store.contract(contract_id)?;
        let flow_id = contract
            .flow_id
            .clone()
            .ok_or_else(|| ConductorError::NotOnFlow(contract_id.clone()))?;
        let current = contract.current_stage_id.clone();
        let flow = self.registry.flow(&flow_id)?.clone();
        let at = complete_time.unwrap_or_else(Utc::now);

        let mut created = Vec::new();
        match current {
            None => {
                let first = flow
                    .first_stage()
                    .cloned()
                    .ok_or_else(|| ConductorError::EmptyFlow(flow.name.clone()))?;
                created.push(self.enter_stage(contract_id, &first, &flow_id, at, user)?);
                self.set_current_stage(contract_id, Some(first.clone()))?;
                tracing::info!(
                    contract_id = %contract_id,
                    stage = %first,
                    "Contract entered first stage"
                );
            }
            Some(current_stage) => {
                let current_idx = flow.position_of(&current_stage).ok_or_else(|| {
                    ConductorError::StageNotInFlow {
                        flow: flow_id.clone(),
                        stage: current_stage.clone(),
                    }
                })?;

                match destination {
                    Some(dest) => {
                        let dest_idx = flow.position_of(dest).ok_or_else(|| {
                            ConductorError::StageNotInFlow {
                                flow: flow_id.clone(),
                                stage: dest.clone(),
                            }
                        })?;
                        if dest_idx == current_idx + 1 {
                            self.forward_step(
                                contract_id,
                                &flow,
                                &flow_id,
                                current_idx,
                                at,
                                user,
                                &mut created,
                            )?;
                        } else if dest_idx > current_idx + 1 {
                            return Err(ConductorError::StageSkip {
                                current: current_idx,
                                requested: dest_idx,
                            });
                        } else {
                            self.revert(
                                contract_id,
                                &flow,
                                &flow_id,
                                dest_idx,
                                current_idx,
                                at,
                                user,
                                &mut created,
                            )?;
                        }
                    }
                    None if current_idx + 1 == flow.len() => {
                        // Final stage: exit only. Completion is the
                        // caller's next call, not a cascade from here.
                        let key = ContractStageKey::new(
                            contract_id.clone(),
                            current_stage.clone(),
                            flow_id.clone(),
                        );
                        if self.store.stage_row(&key)?.is_exited() {
                            return Err(ConductorError::InvalidTransition(
                                "contract has already completed its flow".into(),
                            ));
                        }
                        created.push(self.exit_stage(&key, at, user)?);
                        tracing::info!(
                            contract_id = %contract_id,
                            stage = %current_stage,
                            "Contract exited final stage"
                        );
                    }
                    None => {
                        self.forward_step(
                            contract_id,
                            &flow,
                            &flow_id,
                            current_idx,
                            at,
                            user,
                            &mut created,
                        )?;
                    }
                }
            }
        }

        self.notify(RefreshEvent::ContractChanged(contract_id.clone()));
        Ok(created)
    }

    /// Exit the current stage and enter the next, as one logical step
    #[allow(clippy::too_many_arguments)]
    fn forward_step(
        &mut self,
        contract_id: &ContractId,
        flow: &Flow,
        flow_id: &FlowId,
        current_idx: usize,
        at: DateTime<Utc>,
        user: &UserId,
        created: &mut Vec<ActionItem>,
    ) -> ConductorResult<()> {
        let current_stage = flow.stage_order[current_idx].clone();
        let next_stage = flow.stage_order[current_idx + 1].clone();

        let current_key =
            ContractStageKey::new(contract_id.clone(), current_stage.clone(), flow_id.clone());
        created.push(self.exit_stage(&current_key, at, user)?);
        created.push(self.enter_stage(contract_id, &next_stage, flow_id, at, user)?);
        self.set_current_stage(contract_id, Some(next_stage.clone()))?;

        tracing::info!(
            contract_id = %contract_id,
            from = %current_stage,
            to = %next_stage,
            "Contract advanced"
        );
        Ok(())
    }

    /// Roll the contract back to an earlier (or the current) stage.
    ///
    /// The destination stage is reopened: `entered` reset to the revert
    /// time, `exited` cleared, one reversion action logged. Every other
    /// stage in the traversed range is fully wiped with no log entry.
    #[allow(clippy::too_many_arguments)]
    fn revert(
        &mut self,
        contract_id: &ContractId,
        flow: &Flow,
        flow_id: &FlowId,
        dest_idx: usize,
        current_idx: usize,
        at: DateTime<Utc>,
        user: &UserId,
        created: &mut Vec<ActionItem>,
    ) -> ConductorResult<()> {
        for idx in dest_idx..=current_idx {
            let key = ContractStageKey::new(
                contract_id.clone(),
                flow.stage_order[idx].clone(),
                flow_id.clone(),
            );
            let row = self.store.stage_row_mut(&key)?;
            if idx == dest_idx {
                row.enter(at);
                let item = ActionItem::new(key, ActionKind::Reverted { reverted_at: at })
                    .with_taken_by(user.clone());
                self.store.record_action(item.clone());
                created.push(item);
            } else {
                row.full_revert();
            }
        }

        let dest_stage = flow.stage_order[dest_idx].clone();
        self.set_current_stage(contract_id, Some(dest_stage.clone()))?;
        tracing::info!(
            contract_id = %contract_id,
            to = %dest_stage,
            wiped = current_idx - dest_idx,
            "Contract reverted"
        );
        Ok(())
    }

    fn enter_stage(
        &mut self,
        contract_id: &ContractId,
        stage_id: &StageId,
        flow_id: &FlowId,
        at: DateTime<Utc>,
        user: &UserId,
    ) -> ConductorResult<ActionItem> {
        let key = ContractStageKey::new(contract_id.clone(), stage_id.clone(), flow_id.clone());
        self.store.stage_row_mut(&key)?.enter(at);
        let item = ActionItem::new(key, ActionKind::Entered)
            .with_taken_by(user.clone())
            .with_taken_at(at);
        self.store.record_action(item.clone());
        Ok(item)
    }

    fn exit_stage(
        &mut self,
        key: &ContractStageKey,
        at: DateTime<Utc>,
        user: &UserId,
    ) -> ConductorResult<ActionItem> {
        self.store.stage_row_mut(key)?.exit(at);
        let item = ActionItem::new(key.clone(), ActionKind::Exited)
            .with_taken_by(user.clone())
            .with_taken_at(at);
        self.store.record_action(item.clone());
        Ok(item)
    }

    fn set_current_stage(
        &mut self,
        contract_id: &ContractId,
        stage_id: Option<StageId>,
    ) -> ConductorResult<()> {
        let contract = self.store.contract_mut(contract_id)?;
        contract.current_stage_id = stage_id;
        contract.touch();
        Ok(())
    }

    // ── Assignment ───────────────────────────────────────────────────

    /// Assign a contract to a flow and advance it into the first stage.
    ///
    /// With `clone = true` (renewal work starting from an existing
    /// record) the contract is cloned first and the clone becomes the
    /// work subject; the original keeps its history. Returns the id of
    /// the work subject.
    ///
    /// `start_time` backdates the first stage entry. If the contract
    /// had already traversed part of this flow and a start time is
    /// given while the first stage is still current, the current stage
    /// is cleared first so the transition re-enters from scratch.
    ///
    /// A contract already mid-flight on a different flow cannot be
    /// assigned without cloning; moving it is `switch_flow`'s job. The
    /// check happens before anything is written so a rejected call
    /// leaves no partial state.
    pub fn assign(
        &mut self,
        contract_id: &ContractId,
        flow_id: &FlowId,
        user: &UserId,
        start_time: Option<DateTime<Utc>>,
        clone: bool,
    ) -> ConductorResult<ContractId> {
        let flow = self.registry.flow(flow_id)?;
        if flow.is_archived {
            return Err(ConductorError::FlowArchived(flow.name.clone()));
        }
        if !clone {
            let contract = self.store.contract(contract_id)?;
            if let Some(current) = &contract.current_stage_id {
                if flow.position_of(current).is_none() {
                    return Err(ConductorError::InvalidTransition(
                        "contract is mid-flight on another flow; use switch_flow".into(),
                    ));
                }
            }
        }

        let subject = if clone {
            let original = self.store.contract(contract_id)?;
            let renewal = original.clone_for_renewal();
            self.store.insert_contract(renewal)
        } else {
            contract_id.clone()
        };

        let (stage_order, _keys, reverted) = self.create_contract_stages(&subject, flow_id)?;

        if reverted && start_time.is_some() {
            let contract = self.store.contract(&subject)?;
            if contract.current_stage_id.as_ref() == stage_order.first() {
                self.set_current_stage(&subject, None)?;
            }
        }

        self.transition(&subject, user, None, start_time)?;

        let contract = self.store.contract_mut(&subject)?;
        contract.assigned_to = Some(user.clone());
        contract.touch();

        tracing::info!(
            contract_id = %subject,
            flow_id = %flow_id,
            user = %user,
            cloned = clone,
            "Contract assigned to flow"
        );
        self.notify(RefreshEvent::ContractChanged(subject.clone()));
        Ok(subject)
    }

    // ── Completion ───────────────────────────────────────────────────

    /// Finish a contract's renewal after the engine signalled the final
    /// stage exit. The original becomes the historical record: its
    /// followers move to its clones, it is archived and hidden, and
    /// each clone becomes visible and active. Returns the clone ids.
    pub fn complete(&mut self, contract_id: &ContractId) -> ConductorResult<Vec<ContractId>> {
        let followers = self.store.contract(contract_id)?.followers.clone();
        let children = self.store.children_of(contract_id);

        for child_id in &children {
            let child = self.store.contract_mut(child_id)?;
            for follower in &followers {
                child.add_follower(follower.clone());
            }
            child.reactivate();
        }

        let contract = self.store.contract_mut(contract_id)?;
        contract.followers.clear();
        contract.archive();

        tracing::info!(
            contract_id = %contract_id,
            children = children.len(),
            "Contract completed and archived"
        );
        self.notify(RefreshEvent::ContractCompleted(contract_id.clone()));
        Ok(children)
    }

    // ── Flow switching ───────────────────────────────────────────────

    /// Move a contract to a different flow mid-workflow.
    ///
    /// The old flow's filtered action log is captured and embedded in a
    /// single flow-switch marker on the new flow's first stage, the
    /// only place that history survives. Every entered stage row of the
    /// old flow is wiped and its log entries (flow-switch markers
    /// excepted) deleted so stale history does not bleed into the new
    /// flow's display.
    ///
    /// Switching back to a previously traversed flow starts it fresh:
    /// its rows were wiped when the contract left it, so the first
    /// stage is entered as a plain entry, not a reversion.
    pub fn switch_flow(
        &mut self,
        contract_id: &ContractId,
        new_flow_id: &FlowId,
        user: &UserId,
    ) -> ConductorResult<Vec<ActionItem>> {
        let contract = self.store.contract(contract_id)?;
        let old_flow_id = contract
            .flow_id
            .clone()
            .ok_or_else(|| ConductorError::NotOnFlow(contract_id.clone()))?;
        if &old_flow_id == new_flow_id {
            return Err(ConductorError::InvalidTransition(
                "contract is already on this flow".into(),
            ));
        }
        let new_flow = self.registry.flow(new_flow_id)?;
        if new_flow.is_archived {
            return Err(ConductorError::FlowArchived(new_flow.name.clone()));
        }
        let new_flow_name = new_flow.name.clone();
        let old_flow_name = self.registry.flow(&old_flow_id)?.name.clone();

        // Capture the old flow's clean log before anything is deleted.
        let old_log = self.filter_action_log(contract_id)?;
        let old_log_json = serde_json::to_value(&old_log).unwrap_or_default();

        // Wipe the old flow's entered rows and strip their log entries.
        let entered_keys: Vec<ContractStageKey> = self
            .store
            .stage_rows_for_contract_flow(contract_id, &old_flow_id)
            .iter()
            .filter(|r| r.entered.is_some())
            .map(|r| r.key.clone())
            .collect();
        for key in &entered_keys {
            self.store.stage_row_mut(key)?.full_revert();
            self.store.strip_stage_actions(key);
        }

        // Materialize the new flow's rows (idempotent).
        let (_stage_order, keys, _reverted) =
            self.create_contract_stages(contract_id, new_flow_id)?;
        let first_key = keys
            .first()
            .cloned()
            .ok_or_else(|| ConductorError::EmptyFlow(new_flow_name.clone()))?;

        // The single surviving record of the old flow's history.
        let marker = ActionItem::new(
            first_key,
            ActionKind::FlowSwitch {
                old_flow_id: old_flow_id.clone(),
                old_flow_name: old_flow_name.clone(),
                new_flow_name: new_flow_name.clone(),
                old_flow_actions: old_log_json,
            },
        )
        .with_taken_by(user.clone());
        self.store.record_action(marker.clone());

        self.set_current_stage(contract_id, None)?;

        // Enter the new flow's first stage. Rows from any earlier
        // traversal of this flow were wiped when the contract left it,
        // so re-entry is a fresh start and logs a plain entry.
        let mut actions = self.transition(contract_id, user, None, None)?;
        actions.insert(0, marker);

        tracing::info!(
            contract_id = %contract_id,
            from = %old_flow_name,
            to = %new_flow_name,
            "Contract switched flows"
        );
        self.notify(RefreshEvent::ContractChanged(contract_id.clone()));
        Ok(actions)
    }

    // ── Extension ────────────────────────────────────────────────────

    /// Keep the existing contract instead of renewing: the in-flight
    /// clone is deleted together with its stage rows and log, and its
    /// parent is made the active record again. Returns the parent id.
    pub fn extend(&mut self, clone_id: &ContractId) -> ConductorResult<ContractId> {
        let parent_id = self
            .store
            .contract(clone_id)?
            .parent_id
            .clone()
            .ok_or_else(|| ConductorError::NotAClone(clone_id.clone()))?;

        self.store.contract_mut(&parent_id)?.reactivate();
        self.store.delete_contract(clone_id)?;

        tracing::info!(
            contract_id = %parent_id,
            clone_id = %clone_id,
            "Contract extended; renewal clone deleted"
        );
        self.notify(RefreshEvent::ContractDeleted(clone_id.clone()));
        self.notify(RefreshEvent::ContractChanged(parent_id.clone()));
        Ok(parent_id)
    }

    // ── Action log view ──────────────────────────────────────────────

    /// The contract's action log cleaned up for display.
    ///
    /// Stages can be re-entered after reversion, so the raw log holds
    /// confusing duplicates. Per stage, only the most recent start
    /// action is kept (and only for stages at or before the current
    /// one), and only the most recent exit action (only for stages
    /// strictly before the current one); everything else passes through
    /// unfiltered. The result is in chronological display order.
    pub fn filter_action_log(&self, contract_id: &ContractId) -> ConductorResult<Vec<ActionItem>> {
        let contract = self.store.contract(contract_id)?;
        let flow = match &contract.flow_id {
            Some(flow_id) => Some(self.registry.flow(flow_id)?),
            None => None,
        };
        let current_pos = contract
            .current_stage_id
            .as_ref()
            .and_then(|s| flow.and_then(|f| f.position_of(s)));

        Ok(action_log::filter_for_display(
            self.store.actions_for_contract(contract_id),
            flow,
            current_pos,
        ))
    }
}

impl Default for ConductorEngine {
    fn default() -> Self {
        Self::new()
    }
}
