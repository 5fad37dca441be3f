// src/workflow/lifecycle.rs

use std::sync::Arc;

use tracing::{info, warn};

use crate::models::{Centre, Objective, WeightMeta};

use super::aggregate::{format_weight, total_weight, totals_by_objective};
use super::cache::MasterDataCache;
use super::confirm::{Confirmation, Confirmer, Outcome};
use super::error::{FieldError, Result, RowField, WorkflowError};
use super::gateway::TargetsGateway;
use super::loading::LoadingState;
use super::row::{is_blank, RowId, Scope, TargetRow, Tier};
use super::selector::CascadingSelector;
use super::status::{StatusEvent, TargetStatus};
use super::validator::validate;

/// Formatted per-objective total for the weight panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveWeight {
    pub objective_code: String,
    pub description: Option<String>,
    pub total: String,
    pub weight_meta: Option<WeightMeta>,
}

/// Owns the target rows of the active (centre, financial year) scope and
/// mediates every create/edit/save/delete against the gateway. Nothing is
/// changed in memory until the gateway has confirmed a write.
pub struct TargetRowManager {
    gateway: Arc<dyn TargetsGateway>,
    confirmer: Arc<dyn Confirmer>,
    selector: CascadingSelector,
    actor: String,
    scope: Option<Scope>,
    rows: Vec<TargetRow>,
    loading: LoadingState,
}

impl TargetRowManager {
    pub fn new(
        gateway: Arc<dyn TargetsGateway>,
        confirmer: Arc<dyn Confirmer>,
        actor: impl Into<String>,
    ) -> Self {
        let loading = LoadingState::default();
        let selector = CascadingSelector::new(gateway.clone(), MasterDataCache::new(), loading.clone());
        Self {
            gateway,
            confirmer,
            selector,
            actor: actor.into(),
            scope: None,
            rows: Vec::new(),
            loading,
        }
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn rows(&self) -> &[TargetRow] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Result<&TargetRow> {
        self.rows
            .iter()
            .find(|r| r.id == id)
            .ok_or(WorkflowError::RowNotFound(id))
    }

    pub fn loading(&self) -> LoadingState {
        self.loading.clone()
    }

    pub fn selector(&self) -> &CascadingSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut CascadingSelector {
        &mut self.selector
    }

    fn index_of(&self, id: RowId) -> Result<usize> {
        self.rows
            .iter()
            .position(|r| r.id == id)
            .ok_or(WorkflowError::RowNotFound(id))
    }

    fn active_scope(&self) -> Result<Scope> {
        let scope = self.scope.clone().ok_or_else(WorkflowError::no_centre)?;
        scope.require_complete()?;
        Ok(scope)
    }

    fn allows_multiple(&self, objective_code: &str) -> bool {
        self.selector
            .cache()
            .objective(objective_code)
            .map_or(true, |o| o.multiple_entries)
    }

    /// A single-entry objective may appear on one row only (`except` aside).
    fn ensure_objective_free(&self, objective_code: &str, except: Option<RowId>) -> Result<()> {
        if self.allows_multiple(objective_code) {
            return Ok(());
        }
        let taken = self
            .rows
            .iter()
            .any(|r| Some(r.id) != except && r.objective_code.as_deref() == Some(objective_code));
        if taken {
            return Err(WorkflowError::DuplicateObjective(objective_code.to_string()));
        }
        Ok(())
    }

    fn ensure_identity_open(&self, idx: usize, field: RowField) -> Result<()> {
        let row = &self.rows[idx];
        if row.status != TargetStatus::Draft {
            return Err(WorkflowError::Selection(FieldError::new(
                field,
                format!("The {field} of a {} target cannot be changed", row.status),
            )));
        }
        Ok(())
    }

    pub async fn load_objectives(&mut self) -> Result<&[Objective]> {
        self.selector.load_objectives().await
    }

    /// Centres offered for the scope picker.
    pub async fn load_centres(&mut self) -> Result<&[Centre]> {
        self.selector.load_centres().await
    }

    /// Replaces the persisted rows with the server's set for the scope.
    /// Unsaved drafts move to the new scope, except single-entry drafts whose
    /// objective the new scope already covers. Returns how many rows lost
    /// unsaved work: those drafts plus reopened rows with pending edits.
    pub async fn load_rows_for_scope(&mut self, centre_code: &str, financial_year: &str) -> Result<usize> {
        let scope = Scope::new(financial_year.trim(), centre_code.trim());
        scope.require_complete()?;

        let records = {
            let _busy = self.loading.begin();
            self.gateway.fetch_targets(&scope).await.map_err(|e| {
                warn!(centre_code, financial_year, error = %e, "failed to load targets");
                e
            })?
        };
        let persisted = records
            .iter()
            .map(TargetRow::from_record)
            .collect::<Result<Vec<_>>>()?;

        let (mut drafts, previous): (Vec<TargetRow>, Vec<TargetRow>) = std::mem::take(&mut self.rows)
            .into_iter()
            .partition(|r| r.status == TargetStatus::Draft);
        let mut discarded = 0;
        for row in previous.iter().filter(|r| r.is_editing && r.has_changes) {
            warn!(
                objective_code = row.objective_code.as_deref().unwrap_or("-"),
                success_indicator_code = row.success_indicator_code.as_deref().unwrap_or("-"),
                "unsaved edits discarded on reload"
            );
            discarded += 1;
        }
        drafts.retain(|d| match d.objective_code.as_deref() {
            Some(code) => {
                let keep = self.allows_multiple(code)
                    || !persisted.iter().any(|p| p.objective_code.as_deref() == Some(code));
                if !keep {
                    warn!(
                        objective_code = code,
                        "draft dropped: objective already has a target in the new scope"
                    );
                    discarded += 1;
                }
                keep
            }
            None => true,
        });
        for draft in &mut drafts {
            draft.scope = scope.clone();
        }

        info!(
            centre_code = %scope.centre_code,
            financial_year = %scope.financial_year,
            persisted = persisted.len(),
            drafts = drafts.len(),
            discarded,
            "loaded targets for scope"
        );
        self.rows = persisted;
        self.rows.extend(drafts);
        self.scope = Some(scope);
        Ok(discarded)
    }

    /// Adds a draft row for `objective_code` and loads its actions. A failed
    /// action fetch stays on the new row as a field error.
    pub async fn add_row(&mut self, objective_code: &str) -> Result<RowId> {
        let scope = self.active_scope()?;
        if self.selector.cache().objective(objective_code).is_none() {
            return Err(WorkflowError::Selection(FieldError::new(
                RowField::Objective,
                format!("Objective {objective_code} is not available"),
            )));
        }
        self.ensure_objective_free(objective_code, None)?;

        let mut row = TargetRow::draft(scope, None);
        let id = row.id;
        if let Err(e) = self.selector.change_objective(&mut row, objective_code).await {
            warn!(objective_code, error = %e, "new row added without its action list");
        }
        self.rows.push(row);
        Ok(id)
    }

    /// Creates a draft template for each mandatory objective that has no row yet.
    pub async fn seed_templates(&mut self) -> Result<usize> {
        let scope = self.active_scope()?;
        let missing: Vec<String> = self
            .selector
            .cache()
            .objectives()
            .iter()
            .filter(|o| o.mandatory)
            .filter(|o| {
                !self
                    .rows
                    .iter()
                    .any(|r| r.objective_code.as_deref() == Some(o.objective_code.as_str()))
            })
            .map(|o| o.objective_code.clone())
            .collect();

        for code in &missing {
            let mut row = TargetRow::draft(scope.clone(), None);
            if let Err(e) = self.selector.change_objective(&mut row, code).await {
                warn!(objective_code = %code, error = %e, "template added without its action list");
            }
            self.rows.push(row);
        }
        Ok(missing.len())
    }

    /// Mandatory objectives with no persisted row in scope.
    pub fn missing_mandatory(&self) -> Vec<&Objective> {
        self.selector
            .cache()
            .objectives()
            .iter()
            .filter(|o| o.mandatory)
            .filter(|o| {
                !self.rows.iter().any(|r| {
                    r.status.is_persisted()
                        && r.objective_code.as_deref() == Some(o.objective_code.as_str())
                })
            })
            .collect()
    }

    pub async fn change_objective(&mut self, id: RowId, objective_code: &str) -> Result<()> {
        let idx = self.index_of(id)?;
        self.ensure_identity_open(idx, RowField::Objective)?;
        if !is_blank(objective_code) {
            self.ensure_objective_free(objective_code, Some(id))?;
        }
        self.selector
            .change_objective(&mut self.rows[idx], objective_code)
            .await
    }

    pub async fn change_action(&mut self, id: RowId, action_code: &str) -> Result<()> {
        let idx = self.index_of(id)?;
        self.ensure_identity_open(idx, RowField::Action)?;
        self.selector.change_action(&mut self.rows[idx], action_code).await
    }

    pub fn change_success_indicator(&mut self, id: RowId, indicator_code: &str) -> Result<()> {
        let idx = self.index_of(id)?;
        self.ensure_identity_open(idx, RowField::SuccessIndicator)?;
        let duplicate = !is_blank(indicator_code)
            && self.rows.iter().any(|r| {
                r.id != id
                    && r.objective_code == self.rows[idx].objective_code
                    && r.action_code == self.rows[idx].action_code
                    && r.success_indicator_code.as_deref() == Some(indicator_code)
            });
        if duplicate {
            return Err(WorkflowError::Selection(FieldError::new(
                RowField::SuccessIndicator,
                format!("A target for success indicator {indicator_code} already exists"),
            )));
        }
        self.selector
            .change_success_indicator(&mut self.rows[idx], indicator_code)
    }

    /// Sets one tier value on an editable row. Blank input clears the tier.
    pub fn update_field(&mut self, id: RowId, tier: Tier, value: impl Into<String>) -> Result<()> {
        let idx = self.index_of(id)?;
        let row = &mut self.rows[idx];
        if !row.is_editable() {
            return Err(WorkflowError::NotEditable(id));
        }
        let value = value.into();
        tier.set(&mut row.tiers, if is_blank(&value) { None } else { Some(value) });
        if row.status == TargetStatus::Saved {
            row.has_changes = true;
        }
        row.error = None;
        Ok(())
    }

    /// Validates and persists the row, then marks it saved. On any failure
    /// the row keeps its previous state.
    pub async fn save_row(&mut self, id: RowId) -> Result<()> {
        let idx = self.index_of(id)?;
        let scope = match self.active_scope() {
            Ok(scope) => scope,
            Err(e) => {
                self.rows[idx].error = e.field_error().cloned();
                return Err(e);
            }
        };

        let row = &self.rows[idx];
        if !row.is_editable() {
            return Err(WorkflowError::NotEditable(id));
        }
        row.status.next(StatusEvent::Persist)?;
        if row.scope != scope {
            return Err(WorkflowError::NotEditable(id));
        }
        if let Err(field_error) = validate(&row.view(), self.selector.cache().objectives()) {
            let err = match field_error.field {
                RowField::Objective | RowField::Action | RowField::SuccessIndicator => {
                    WorkflowError::Selection(field_error.clone())
                }
                _ => WorkflowError::Validation(field_error.clone()),
            };
            self.rows[idx].error = Some(field_error);
            return Err(err);
        }
        let body = row.save_body(&self.actor).ok_or_else(|| {
            WorkflowError::Selection(FieldError::new(RowField::Objective, "Please select an objective"))
        })?;

        let record = {
            let _busy = self.loading.begin();
            self.gateway.save_target(&body).await.map_err(|e| {
                warn!(row = %id, error = %e, "failed to save target");
                e
            })?
        };

        let row = &mut self.rows[idx];
        row.apply_record(&record)?;
        row.is_editing = false;
        row.has_changes = false;
        row.original_values = None;
        row.error = None;
        info!(
            objective_code = %record.objective_code,
            success_indicator_code = %record.success_indicator_code,
            "target saved"
        );
        Ok(())
    }

    /// Reopens a saved row for editing after confirmation, keeping a snapshot
    /// for `cancel_edit`.
    pub async fn edit_row(&mut self, id: RowId) -> Result<Outcome> {
        let row = self.row(id)?;
        if row.is_editable() {
            return Ok(Outcome::Unchanged);
        }
        row.status.next(StatusEvent::Reopen)?;
        let key = row.require_key()?;

        if !self.confirmer.confirm(&Confirmation::ReopenRow { key }).await {
            return Ok(Outcome::Declined);
        }

        let idx = self.index_of(id)?;
        let row = &mut self.rows[idx];
        row.original_values = Some(row.snapshot());
        row.is_editing = true;
        Ok(Outcome::Applied)
    }

    /// Drops unsaved edits of a reopened row and closes it again.
    pub fn cancel_edit(&mut self, id: RowId) -> Result<()> {
        let idx = self.index_of(id)?;
        let row = &mut self.rows[idx];
        if row.status != TargetStatus::Saved || !row.is_editing {
            return Err(WorkflowError::NotEditable(id));
        }
        if let Some(snapshot) = row.original_values.take() {
            row.restore(snapshot);
        }
        row.is_editing = false;
        row.has_changes = false;
        row.error = None;
        Ok(())
    }

    /// Deletes a draft or saved row after confirmation. Saved rows are
    /// removed from memory only once the gateway confirms.
    pub async fn delete_row(&mut self, id: RowId) -> Result<Outcome> {
        let row = self.row(id)?;
        row.status.next(StatusEvent::Delete)?;
        let key = if row.status.is_persisted() {
            Some(row.require_key()?)
        } else {
            None
        };
        let request = Confirmation::DeleteRow {
            objective_code: row.objective_code.clone(),
            success_indicator_code: row.success_indicator_code.clone(),
        };

        if !self.confirmer.confirm(&request).await {
            return Ok(Outcome::Declined);
        }

        if let Some(key) = &key {
            let _busy = self.loading.begin();
            self.gateway.delete_target(key).await.map_err(|e| {
                warn!(row = %id, error = %e, "failed to delete target");
                e
            })?;
        }
        self.rows.retain(|r| r.id != id);
        info!(row = %id, persisted = key.is_some(), "target deleted");
        Ok(Outcome::Applied)
    }

    /// Sends every saved row in scope for approval, then reloads the scope.
    pub async fn submit_scope(&mut self) -> Result<Outcome> {
        let scope = self.active_scope()?;
        let unsaved = self
            .rows
            .iter()
            .filter(|r| r.status == TargetStatus::Draft || r.is_editing)
            .count();
        if unsaved > 0 {
            return Err(WorkflowError::UnsavedRows(unsaved));
        }
        let saved = self
            .rows
            .iter()
            .filter(|r| r.status == TargetStatus::Saved)
            .count();
        if saved == 0 {
            return Ok(Outcome::Unchanged);
        }

        let request = Confirmation::SubmitScope {
            financial_year: scope.financial_year.clone(),
            centre_code: scope.centre_code.clone(),
            rows: saved,
        };
        if !self.confirmer.confirm(&request).await {
            return Ok(Outcome::Declined);
        }

        let result = {
            let _busy = self.loading.begin();
            self.gateway.submit_scope(&scope, &self.actor).await?
        };
        info!(
            centre_code = %scope.centre_code,
            financial_year = %scope.financial_year,
            submitted = result.submitted.len(),
            "targets submitted for approval"
        );
        self.load_rows_for_scope(&scope.centre_code, &scope.financial_year)
            .await?;
        Ok(Outcome::Applied)
    }

    /// Persisted weight of one objective in scope, two decimals.
    pub fn total_weight(&self, objective_code: &str) -> Option<String> {
        let scope = self.scope.as_ref()?;
        total_weight(&self.rows, scope, objective_code).map(format_weight)
    }

    pub fn weight_summary(&self) -> Vec<ObjectiveWeight> {
        let Some(scope) = self.scope.as_ref() else {
            return Vec::new();
        };
        let cache = self.selector.cache();
        totals_by_objective(&self.rows, scope)
            .into_iter()
            .map(|(code, total)| ObjectiveWeight {
                description: cache.objective(&code).map(|o| o.description.clone()),
                weight_meta: cache.weight_meta(&code).cloned(),
                total: format_weight(total),
                objective_code: code,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeightType;
    use crate::workflow::testing::{record, FakeGateway, ScriptedConfirmer};

    async fn manager(gateway: Arc<FakeGateway>, confirmer: Arc<ScriptedConfirmer>) -> TargetRowManager {
        let mut m = TargetRowManager::new(gateway, confirmer, "planner01");
        m.load_objectives().await.unwrap();
        m
    }

    async fn scoped(gateway: Arc<FakeGateway>) -> TargetRowManager {
        let mut m = manager(gateway, ScriptedConfirmer::yes()).await;
        m.load_rows_for_scope("C01", "2025-26").await.unwrap();
        m
    }

    fn fill(m: &mut TargetRowManager, id: RowId, values: [&str; 5]) {
        for (tier, value) in Tier::ALL.into_iter().zip(values) {
            m.update_field(id, tier, value).unwrap();
        }
    }

    async fn complete_row(m: &mut TargetRowManager, objective: &str, action: &str, si: &str) -> RowId {
        let id = m.add_row(objective).await.unwrap();
        m.change_action(id, action).await.unwrap();
        m.change_success_indicator(id, si).unwrap();
        id
    }

    #[tokio::test]
    async fn add_row_needs_a_centre() {
        let mut m = manager(Arc::new(FakeGateway::seeded()), ScriptedConfirmer::yes()).await;
        let err = m.add_row("O1").await.unwrap_err();
        assert_eq!(err.field_error().unwrap().field, RowField::Centre);

        let err = m.load_rows_for_scope("  ", "2025-26").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Scope(_)));
    }

    #[tokio::test]
    async fn single_entry_objectives_take_one_row() {
        let mut m = scoped(Arc::new(FakeGateway::seeded())).await;
        m.add_row("O1").await.unwrap();
        assert!(matches!(
            m.add_row("O1").await,
            Err(WorkflowError::DuplicateObjective(code)) if code == "O1"
        ));

        m.add_row("O2").await.unwrap();
        m.add_row("O2").await.unwrap();
        assert_eq!(m.rows().len(), 3);
    }

    #[tokio::test]
    async fn save_persists_and_closes_the_row() {
        let gateway = Arc::new(FakeGateway::seeded());
        let mut m = scoped(gateway.clone()).await;
        let id = complete_row(&mut m, "O1", "A1", "S1").await;
        fill(&mut m, id, ["90", "80", "70", "60", "50"]);

        m.save_row(id).await.unwrap();

        let row = m.row(id).unwrap();
        assert_eq!(row.status, TargetStatus::Saved);
        assert!(!row.is_editing);
        assert!(!row.has_changes);
        let stored = gateway.targets();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].created_by, "planner01");
        assert_eq!(stored[0].weight_value, 15.0);
    }

    #[tokio::test]
    async fn resaving_an_unchanged_row_keeps_one_record() {
        let gateway = Arc::new(FakeGateway::seeded());
        let mut m = scoped(gateway.clone()).await;
        let id = complete_row(&mut m, "O1", "A1", "S1").await;
        fill(&mut m, id, ["90", "", "", "", ""]);
        m.save_row(id).await.unwrap();
        let first = gateway.targets();

        assert_eq!(m.edit_row(id).await.unwrap(), Outcome::Applied);
        m.save_row(id).await.unwrap();

        let second = gateway.targets();
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].key(), second[0].key());
        assert_eq!(first[0].tiers(), second[0].tiers());
    }

    #[tokio::test]
    async fn invalid_row_is_never_sent() {
        let gateway = Arc::new(FakeGateway::seeded());
        let mut m = scoped(gateway.clone()).await;
        let id = complete_row(&mut m, "O1", "A1", "S1").await;
        fill(&mut m, id, ["90", "80", "70", "75", ""]);

        let err = m.save_row(id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        let row = m.row(id).unwrap();
        assert_eq!(row.status, TargetStatus::Draft);
        assert_eq!(row.error.as_ref().unwrap().field, RowField::Tier(Tier::Fair));
        assert_eq!(gateway.calls("save_target"), 0);

        m.update_field(id, Tier::Fair, "65").unwrap();
        assert!(m.row(id).unwrap().error.is_none());
        m.save_row(id).await.unwrap();
    }

    #[tokio::test]
    async fn incomplete_selection_is_a_selection_error() {
        let mut m = scoped(Arc::new(FakeGateway::seeded())).await;
        let id = m.add_row("O1").await.unwrap();
        m.update_field(id, Tier::Excellent, "90").unwrap();
        let err = m.save_row(id).await.unwrap_err();
        assert_eq!(err.field_error().unwrap().field, RowField::Action);
        assert!(matches!(err, WorkflowError::Selection(_)));
    }

    #[tokio::test]
    async fn failed_save_leaves_the_draft_alone() {
        let gateway = Arc::new(FakeGateway::seeded());
        let mut m = scoped(gateway.clone()).await;
        let id = complete_row(&mut m, "O1", "A1", "S1").await;
        fill(&mut m, id, ["90", "80", "", "", ""]);
        gateway.fail("save_target");

        let err = m.save_row(id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Network(_)));
        let row = m.row(id).unwrap();
        assert_eq!(row.status, TargetStatus::Draft);
        assert!(row.is_editing);
        assert!(row.error.is_none());
        assert!(!m.loading().is_loading());

        gateway.recover("save_target");
        m.save_row(id).await.unwrap();
        assert_eq!(m.row(id).unwrap().status, TargetStatus::Saved);
    }

    #[tokio::test]
    async fn saved_rows_need_a_confirmed_edit_before_changes() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O1", "A1", "S1", 15.0, "T01"));
        let confirmer = ScriptedConfirmer::no();
        let mut m = manager(gateway, confirmer.clone()).await;
        m.load_rows_for_scope("C01", "2025-26").await.unwrap();
        let id = m.rows()[0].id;

        assert!(matches!(
            m.update_field(id, Tier::Excellent, "95"),
            Err(WorkflowError::NotEditable(_))
        ));
        assert_eq!(m.edit_row(id).await.unwrap(), Outcome::Declined);
        assert!(!m.row(id).unwrap().is_editing);

        confirmer.answer(true);
        assert_eq!(m.edit_row(id).await.unwrap(), Outcome::Applied);
        m.update_field(id, Tier::Excellent, "95").unwrap();
        let row = m.row(id).unwrap();
        assert!(row.has_changes);
        assert_eq!(row.original_values.as_ref().unwrap().tiers.excellent.as_deref(), Some("90"));
        assert_eq!(confirmer.asked().len(), 2);
    }

    #[tokio::test]
    async fn cancel_edit_restores_the_snapshot() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O1", "A1", "S1", 15.0, "T01"));
        let mut m = scoped(gateway).await;
        let id = m.rows()[0].id;

        m.edit_row(id).await.unwrap();
        m.update_field(id, Tier::VeryGood, "85").unwrap();
        m.cancel_edit(id).unwrap();

        let row = m.row(id).unwrap();
        assert_eq!(row.tiers.very_good.as_deref(), Some("80"));
        assert!(!row.is_editing);
        assert!(!row.has_changes);
    }

    #[tokio::test]
    async fn saved_identity_is_fixed() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O2", "A2", "S3", 25.0, "T01"));
        let mut m = scoped(gateway).await;
        let id = m.rows()[0].id;
        m.edit_row(id).await.unwrap();

        let err = m.change_objective(id, "O1").await.unwrap_err();
        assert_eq!(err.field_error().unwrap().field, RowField::Objective);
        assert!(m.change_success_indicator(id, "S2").is_err());
        assert_eq!(m.row(id).unwrap().success_indicator_code.as_deref(), Some("S3"));
    }

    #[tokio::test]
    async fn deleting_a_row_reduces_the_total_by_its_weight() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O2", "A2", "S3", 25.0, "T01"));
        gateway.insert_target(record("O2", "A3", "S4", 15.0, "T01"));
        let mut m = scoped(gateway.clone()).await;
        assert_eq!(m.total_weight("O2").as_deref(), Some("40.00"));

        let id = m
            .rows()
            .iter()
            .find(|r| r.success_indicator_code.as_deref() == Some("S4"))
            .unwrap()
            .id;
        assert_eq!(m.delete_row(id).await.unwrap(), Outcome::Applied);

        assert_eq!(m.total_weight("O2").as_deref(), Some("25.00"));
        assert_eq!(gateway.targets().len(), 1);
        assert_eq!(m.total_weight("O1"), None);
    }

    #[tokio::test]
    async fn declined_or_failed_delete_keeps_the_row() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O2", "A2", "S3", 25.0, "T01"));
        let confirmer = ScriptedConfirmer::no();
        let mut m = manager(gateway.clone(), confirmer.clone()).await;
        m.load_rows_for_scope("C01", "2025-26").await.unwrap();
        let id = m.rows()[0].id;

        assert_eq!(m.delete_row(id).await.unwrap(), Outcome::Declined);
        assert_eq!(gateway.calls("delete_target"), 0);

        confirmer.answer(true);
        gateway.fail("delete_target");
        assert!(m.delete_row(id).await.is_err());
        assert_eq!(m.rows().len(), 1);
        assert_eq!(m.total_weight("O2").as_deref(), Some("25.00"));
    }

    #[tokio::test]
    async fn submitted_rows_cannot_be_deleted() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O2", "A2", "S3", 25.0, "T02"));
        let mut m = scoped(gateway).await;
        let id = m.rows()[0].id;
        assert!(matches!(
            m.delete_row(id).await,
            Err(WorkflowError::IllegalTransition { from: TargetStatus::Submitted, .. })
        ));
    }

    #[tokio::test]
    async fn unsaved_draft_deletes_without_a_request() {
        let gateway = Arc::new(FakeGateway::seeded());
        let mut m = scoped(gateway.clone()).await;
        let id = m.add_row("O2").await.unwrap();
        assert_eq!(m.delete_row(id).await.unwrap(), Outcome::Applied);
        assert!(m.rows().is_empty());
        assert_eq!(gateway.calls("delete_target"), 0);
    }

    #[tokio::test]
    async fn reload_keeps_drafts_and_replaces_saved_rows() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O2", "A2", "S3", 25.0, "T01"));
        let mut m = scoped(gateway.clone()).await;
        let draft = m.add_row("O2").await.unwrap();
        let single = m.add_row("O1").await.unwrap();

        let mut other = record("O1", "A1", "S1", 15.0, "T01");
        other.centre_code = "C02".into();
        gateway.insert_target(other);
        let discarded = m.load_rows_for_scope("C02", "2025-26").await.unwrap();
        assert_eq!(discarded, 1);

        assert_eq!(m.scope().unwrap().centre_code, "C02");
        assert!(m.row(draft).is_ok());
        assert_eq!(m.row(draft).unwrap().scope.centre_code, "C02");
        assert!(m.row(single).is_err());
        let persisted: Vec<_> = m.rows().iter().filter(|r| r.status.is_persisted()).collect();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].objective_code.as_deref(), Some("O1"));
    }

    #[tokio::test]
    async fn reload_reports_discarded_edits() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O2", "A2", "S3", 25.0, "T01"));
        let mut m = scoped(gateway).await;
        let id = m.rows()[0].id;
        m.edit_row(id).await.unwrap();
        m.update_field(id, Tier::Excellent, "95").unwrap();

        assert_eq!(m.load_rows_for_scope("C01", "2025-26").await.unwrap(), 1);
        let row = &m.rows()[0];
        assert!(!row.is_editing);
        assert_eq!(row.tiers.excellent.as_deref(), Some("90"));

        assert_eq!(m.load_rows_for_scope("C01", "2025-26").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn centres_are_fetched_once() {
        let gateway = Arc::new(FakeGateway::seeded());
        let mut m = manager(gateway.clone(), ScriptedConfirmer::yes()).await;
        let codes: Vec<String> = m
            .load_centres()
            .await
            .unwrap()
            .iter()
            .map(|c| c.centre_code.clone())
            .collect();
        assert_eq!(codes, vec!["C01", "C02"]);
        m.load_centres().await.unwrap();
        assert_eq!(gateway.calls("fetch_centres"), 1);
    }

    #[tokio::test]
    async fn templates_cover_mandatory_objectives() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O1", "A1", "S1", 15.0, "T01"));
        let mut m = scoped(gateway).await;

        let missing: Vec<_> = m.missing_mandatory().iter().map(|o| o.objective_code.clone()).collect();
        assert_eq!(missing, vec!["O3".to_string()]);

        assert_eq!(m.seed_templates().await.unwrap(), 1);
        assert_eq!(m.seed_templates().await.unwrap(), 0);
        let template = m.rows().iter().find(|r| r.status == TargetStatus::Draft).unwrap();
        assert_eq!(template.objective_code.as_deref(), Some("O3"));
        assert!(m.selector().cache().actions("O3").is_some());
    }

    #[tokio::test]
    async fn submit_waits_for_unsaved_rows() {
        let gateway = Arc::new(FakeGateway::seeded());
        let mut m = scoped(gateway.clone()).await;
        let id = complete_row(&mut m, "O2", "A2", "S2").await;
        fill(&mut m, id, ["2025-01-01", "2025-02-01", "", "", ""]);

        assert!(matches!(m.submit_scope().await, Err(WorkflowError::UnsavedRows(1))));

        m.save_row(id).await.unwrap();
        assert_eq!(m.row(id).unwrap().weight_type, WeightType::Date);
        assert_eq!(m.submit_scope().await.unwrap(), Outcome::Applied);
        assert!(m.rows().iter().all(|r| r.status == TargetStatus::Submitted));
        assert_eq!(m.submit_scope().await.unwrap(), Outcome::Unchanged);
    }

    #[tokio::test]
    async fn weight_summary_lists_persisted_objectives() {
        let gateway = Arc::new(FakeGateway::seeded());
        gateway.insert_target(record("O2", "A2", "S3", 25.0, "T04"));
        gateway.insert_target(record("O1", "A1", "S1", 15.0, "T03"));
        let mut m = scoped(gateway).await;
        m.add_row("O2").await.unwrap();

        let summary = m.weight_summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].objective_code, "O1");
        assert_eq!(summary[0].total, "15.00");
        assert_eq!(summary[1].total, "25.00");
        assert!(summary[1].weight_meta.is_some());
    }
}
