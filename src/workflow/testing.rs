// src/workflow/testing.rs
//
// In-memory gateway and confirmer for the workflow tests. The fake follows
// the server's rules: upsert on identity, writes only on T01, decisions only
// on T02.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{
    Action, ApproveAllResult, Centre, Objective, SaveTargetBody, SubmitResult, SuccessIndicator,
    TargetKey, TargetRecord, WeightMeta,
};

use super::confirm::{Confirmation, Confirmer};
use super::error::{Result, WorkflowError};
use super::gateway::TargetsGateway;
use super::row::Scope;

#[derive(Default)]
struct FakeState {
    objectives: Vec<Objective>,
    centres: Vec<Centre>,
    actions: Vec<Action>,
    indicators: Vec<SuccessIndicator>,
    targets: Vec<TargetRecord>,
    failing: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
    // decisions ignore the objective code, as an older server did
    loose_decisions: bool,
    // indicators that approve_all leaves pending and leaves out of its report
    held_back: HashSet<String>,
}

pub struct FakeGateway {
    state: RwLock<FakeState>,
}

fn objective(code: &str, mandatory: bool, multiple_entries: bool) -> Objective {
    Objective {
        objective_code: code.into(),
        description: format!("Objective {code}"),
        mandatory,
        multiple_entries,
    }
}

fn action(objective_code: &str, code: &str) -> Action {
    Action {
        objective_code: objective_code.into(),
        action_code: code.into(),
        description: format!("Action {code}"),
    }
}

fn indicator(objective_code: &str, action_code: &str, code: &str, weight_type: &str, weight: f64) -> SuccessIndicator {
    SuccessIndicator {
        objective_code: objective_code.into(),
        action_code: action_code.into(),
        success_indicator_code: code.into(),
        description: format!("Indicator {code}"),
        weight_type: weight_type.into(),
        weight_per_unit: weight,
    }
}

/// A persisted row in scope (2025-26, C01) with descending tiers 90..50,
/// or monthly dates for DATE indicators (S2).
pub fn record(objective_code: &str, action_code: &str, si: &str, weight: f64, status_code: &str) -> TargetRecord {
    let (weight_type, tiers) = if si == "S2" {
        ("DATE", ["2025-01-31", "2025-02-28", "2025-03-31", "2025-04-30", "2025-05-31"])
    } else {
        ("NUMBER", ["90", "80", "70", "60", "50"])
    };
    TargetRecord {
        financial_year: "2025-26".into(),
        centre_code: "C01".into(),
        objective_code: objective_code.into(),
        action_code: action_code.into(),
        success_indicator_code: si.into(),
        weight_type: weight_type.into(),
        weight_value: weight,
        excellent: tiers[0].into(),
        very_good: Some(tiers[1].into()),
        good: Some(tiers[2].into()),
        fair: Some(tiers[3].into()),
        poor: Some(tiers[4].into()),
        status_code: status_code.into(),
        approval_remarks: None,
        approved_by: None,
        approved_at: None,
        created_by: "planner01".into(),
        updated_at: Utc::now(),
    }
}

fn in_scope(t: &TargetRecord, scope: &Scope) -> bool {
    t.financial_year == scope.financial_year && t.centre_code == scope.centre_code
}

fn decision_match(t: &TargetRecord, key: &TargetKey, loose: bool) -> bool {
    t.financial_year == key.financial_year
        && t.centre_code == key.centre_code
        && (loose || t.objective_code == key.objective_code)
        && t.action_code == key.action_code
        && t.success_indicator_code == key.success_indicator_code
}

impl FakeGateway {
    /// O1 and O3 are mandatory single-entry objectives, O2 takes many rows.
    pub fn seeded() -> Self {
        let state = FakeState {
            objectives: vec![
                objective("O1", true, false),
                objective("O2", false, true),
                objective("O3", true, false),
            ],
            centres: vec![
                Centre { centre_code: "C01".into(), description: "Head office".into() },
                Centre { centre_code: "C02".into(), description: "Regional centre".into() },
            ],
            actions: vec![
                action("O1", "A1"),
                action("O2", "A2"),
                action("O2", "A3"),
                action("O3", "A4"),
            ],
            indicators: vec![
                indicator("O1", "A1", "S1", "NUMBER", 15.0),
                indicator("O2", "A2", "S2", "DATE", 10.0),
                indicator("O2", "A2", "S3", "PERCENTAGE", 25.0),
                indicator("O2", "A3", "S4", "NUMBER", 15.0),
                indicator("O3", "A4", "S5", "NUMBER", 20.0),
            ],
            ..Default::default()
        };
        Self { state: RwLock::new(state) }
    }

    pub fn fail(&self, op: &'static str) {
        self.state.write().unwrap().failing.insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.state.write().unwrap().failing.remove(op);
    }

    pub fn calls(&self, op: &'static str) -> usize {
        self.state.read().unwrap().calls.get(op).copied().unwrap_or(0)
    }

    /// Approve/reject pick the first pending row with the action and
    /// indicator, whatever its objective.
    pub fn match_decisions_without_objective(&self) {
        self.state.write().unwrap().loose_decisions = true;
    }

    /// `approve_all` leaves rows with this indicator pending and unreported.
    pub fn hold_back_from_bulk(&self, success_indicator_code: &str) {
        self.state.write().unwrap().held_back.insert(success_indicator_code.to_string());
    }

    pub fn insert_target(&self, record: TargetRecord) {
        self.state.write().unwrap().targets.push(record);
    }

    pub fn targets(&self) -> Vec<TargetRecord> {
        self.state.read().unwrap().targets.clone()
    }

    fn enter(&self, op: &'static str) -> Result<std::sync::RwLockWriteGuard<'_, FakeState>> {
        let mut state = self.state.write().unwrap();
        *state.calls.entry(op).or_insert(0) += 1;
        if state.failing.contains(op) {
            return Err(WorkflowError::Network(format!("500 Internal Server Error: {op} failed")));
        }
        Ok(state)
    }
}

fn conflict(message: &str) -> WorkflowError {
    WorkflowError::Network(format!("409 Conflict: {message}"))
}

#[async_trait]
impl TargetsGateway for FakeGateway {
    async fn fetch_objectives(&self) -> Result<Vec<Objective>> {
        Ok(self.enter("fetch_objectives")?.objectives.clone())
    }

    async fn fetch_centres(&self) -> Result<Vec<Centre>> {
        Ok(self.enter("fetch_centres")?.centres.clone())
    }

    async fn fetch_actions(&self, objective_code: &str) -> Result<Vec<Action>> {
        let state = self.enter("fetch_actions")?;
        Ok(state
            .actions
            .iter()
            .filter(|a| a.objective_code == objective_code)
            .cloned()
            .collect())
    }

    async fn fetch_success_indicators(
        &self,
        objective_code: &str,
        action_code: &str,
    ) -> Result<Vec<SuccessIndicator>> {
        let state = self.enter("fetch_success_indicators")?;
        Ok(state
            .indicators
            .iter()
            .filter(|si| si.objective_code == objective_code && si.action_code == action_code)
            .cloned()
            .collect())
    }

    async fn fetch_weight_meta(&self, objective_code: &str) -> Result<WeightMeta> {
        let state = self.enter("fetch_weight_meta")?;
        let matching: Vec<_> = state
            .indicators
            .iter()
            .filter(|si| si.objective_code == objective_code)
            .collect();
        let first_type = matching.first().map(|si| si.weight_type.clone());
        let uniform = matching.iter().all(|si| Some(&si.weight_type) == first_type.as_ref());
        Ok(WeightMeta {
            objective_code: objective_code.into(),
            weight_type: if uniform { first_type } else { None },
            weight_per_unit: matching.iter().map(|si| si.weight_per_unit).sum(),
            indicator_count: matching.len() as i64,
        })
    }

    async fn fetch_targets(&self, scope: &Scope) -> Result<Vec<TargetRecord>> {
        let state = self.enter("fetch_targets")?;
        Ok(state.targets.iter().filter(|t| in_scope(t, scope)).cloned().collect())
    }

    async fn save_target(&self, body: &SaveTargetBody) -> Result<TargetRecord> {
        let mut state = self.enter("save_target")?;
        let tiers = body.tiers.normalized();
        if let Some(existing) = state.targets.iter_mut().find(|t| t.key() == body.key) {
            if existing.status_code != "T01" {
                return Err(conflict("target is no longer editable"));
            }
            existing.weight_type = body.weight_type.as_str().into();
            existing.weight_value = body.weight_value;
            existing.excellent = tiers.excellent.clone().unwrap_or_default();
            existing.very_good = tiers.very_good;
            existing.good = tiers.good;
            existing.fair = tiers.fair;
            existing.poor = tiers.poor;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        let record = TargetRecord {
            financial_year: body.key.financial_year.clone(),
            centre_code: body.key.centre_code.clone(),
            objective_code: body.key.objective_code.clone(),
            action_code: body.key.action_code.clone(),
            success_indicator_code: body.key.success_indicator_code.clone(),
            weight_type: body.weight_type.as_str().into(),
            weight_value: body.weight_value,
            excellent: tiers.excellent.unwrap_or_default(),
            very_good: tiers.very_good,
            good: tiers.good,
            fair: tiers.fair,
            poor: tiers.poor,
            status_code: "T01".into(),
            approval_remarks: None,
            approved_by: None,
            approved_at: None,
            created_by: body.actor.clone(),
            updated_at: Utc::now(),
        };
        state.targets.push(record.clone());
        Ok(record)
    }

    async fn delete_target(&self, key: &TargetKey) -> Result<()> {
        let mut state = self.enter("delete_target")?;
        let before = state.targets.len();
        state.targets.retain(|t| !(t.key() == *key && t.status_code == "T01"));
        if state.targets.len() == before {
            return Err(conflict("target is not deletable"));
        }
        Ok(())
    }

    async fn submit_scope(&self, scope: &Scope, _actor: &str) -> Result<SubmitResult> {
        let mut state = self.enter("submit_scope")?;
        let mut submitted = Vec::new();
        for t in state.targets.iter_mut().filter(|t| in_scope(t, scope) && t.status_code == "T01") {
            t.status_code = "T02".into();
            submitted.push(t.key());
        }
        Ok(SubmitResult { submitted })
    }

    async fn approve_target(&self, key: &TargetKey, actor: &str) -> Result<TargetRecord> {
        let mut state = self.enter("approve_target")?;
        let loose = state.loose_decisions;
        let t = state
            .targets
            .iter_mut()
            .find(|t| decision_match(t, key, loose) && t.status_code == "T02")
            .ok_or_else(|| conflict("target is not awaiting approval"))?;
        t.status_code = "T04".into();
        t.approved_by = Some(actor.into());
        t.approved_at = Some(Utc::now());
        Ok(t.clone())
    }

    async fn reject_target(&self, key: &TargetKey, remarks: &str, actor: &str) -> Result<TargetRecord> {
        let mut state = self.enter("reject_target")?;
        let loose = state.loose_decisions;
        let t = state
            .targets
            .iter_mut()
            .find(|t| decision_match(t, key, loose) && t.status_code == "T02")
            .ok_or_else(|| conflict("target is not awaiting approval"))?;
        t.status_code = "T03".into();
        t.approval_remarks = Some(remarks.into());
        t.approved_by = Some(actor.into());
        t.approved_at = Some(Utc::now());
        Ok(t.clone())
    }

    async fn approve_all(&self, scope: &Scope, actor: &str) -> Result<ApproveAllResult> {
        let mut state = self.enter("approve_all")?;
        let held_back = state.held_back.clone();
        let now = Utc::now();
        let mut approved = Vec::new();
        let (mut skipped_rejected, mut already_approved) = (0, 0);
        for t in state.targets.iter_mut().filter(|t| in_scope(t, scope)) {
            match t.status_code.as_str() {
                "T02" if held_back.contains(&t.success_indicator_code) => {}
                "T02" => {
                    t.status_code = "T04".into();
                    t.approved_by = Some(actor.into());
                    t.approved_at = Some(now);
                    approved.push(t.key());
                }
                "T03" => skipped_rejected += 1,
                "T04" => already_approved += 1,
                _ => {}
            }
        }
        Ok(ApproveAllResult { approved, skipped_rejected, already_approved, approved_at: now })
    }
}

/// Answers with a switchable yes/no and remembers every question.
pub struct ScriptedConfirmer {
    answer: Mutex<bool>,
    asked: Mutex<Vec<Confirmation>>,
}

impl ScriptedConfirmer {
    pub fn yes() -> Arc<Self> {
        Arc::new(Self { answer: Mutex::new(true), asked: Mutex::new(Vec::new()) })
    }

    pub fn no() -> Arc<Self> {
        Arc::new(Self { answer: Mutex::new(false), asked: Mutex::new(Vec::new()) })
    }

    pub fn answer(&self, yes: bool) {
        *self.answer.lock().unwrap() = yes;
    }

    pub fn asked(&self) -> Vec<Confirmation> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, request: &Confirmation) -> bool {
        self.asked.lock().unwrap().push(request.clone());
        *self.answer.lock().unwrap()
    }
}
