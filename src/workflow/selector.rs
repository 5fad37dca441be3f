// src/workflow/selector.rs

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{Action, Centre, Objective, SuccessIndicator, WeightMeta, WeightType};

use super::cache::MasterDataCache;
use super::error::{FieldError, Result, RowField, WorkflowError};
use super::gateway::TargetsGateway;
use super::loading::LoadingState;
use super::row::{is_blank, TargetRow};

/// Resolves option lists objective → action → success indicator and keeps a
/// row's downstream selections consistent with its upstream ones.
pub struct CascadingSelector {
    gateway: Arc<dyn TargetsGateway>,
    cache: MasterDataCache,
    loading: LoadingState,
}

impl CascadingSelector {
    pub fn new(gateway: Arc<dyn TargetsGateway>, cache: MasterDataCache, loading: LoadingState) -> Self {
        Self { gateway, cache, loading }
    }

    pub fn cache(&self) -> &MasterDataCache {
        &self.cache
    }

    pub async fn load_objectives(&mut self) -> Result<&[Objective]> {
        if self.cache.objectives().is_empty() {
            let _busy = self.loading.begin();
            let objectives = self.gateway.fetch_objectives().await?;
            self.cache.set_objectives(objectives);
        }
        Ok(self.cache.objectives())
    }

    pub async fn load_centres(&mut self) -> Result<&[Centre]> {
        if self.cache.centres().is_empty() {
            let _busy = self.loading.begin();
            let centres = self.gateway.fetch_centres().await?;
            self.cache.set_centres(centres);
        }
        Ok(self.cache.centres())
    }

    pub async fn actions_for(&mut self, objective_code: &str) -> Result<&[Action]> {
        if self.cache.actions(objective_code).is_some() {
            debug!(objective_code, "actions served from cache");
        } else {
            let _busy = self.loading.begin();
            let actions = self.gateway.fetch_actions(objective_code).await?;
            self.cache.insert_actions(objective_code, actions);
        }
        Ok(self.cache.actions(objective_code).unwrap_or_default())
    }

    pub async fn indicators_for(
        &mut self,
        objective_code: &str,
        action_code: &str,
    ) -> Result<&[SuccessIndicator]> {
        if self.cache.indicators(objective_code, action_code).is_some() {
            debug!(objective_code, action_code, "success indicators served from cache");
        } else {
            let _busy = self.loading.begin();
            let indicators = self
                .gateway
                .fetch_success_indicators(objective_code, action_code)
                .await?;
            self.cache.insert_indicators(objective_code, action_code, indicators);
        }
        Ok(self
            .cache
            .indicators(objective_code, action_code)
            .unwrap_or_default())
    }

    pub async fn weight_meta_for(&mut self, objective_code: &str) -> Result<&WeightMeta> {
        if self.cache.weight_meta(objective_code).is_none() {
            let _busy = self.loading.begin();
            let meta = self.gateway.fetch_weight_meta(objective_code).await?;
            self.cache.insert_weight_meta(meta);
        }
        self.cache.weight_meta(objective_code).ok_or_else(|| {
            WorkflowError::Network(format!("no weight metadata returned for {objective_code}"))
        })
    }

    /// Sets the row's objective and clears everything below it, then loads
    /// the new objective's actions and weight metadata. A failed action fetch
    /// is reported on the action field; the objective stays selected.
    pub async fn change_objective(&mut self, row: &mut TargetRow, objective_code: &str) -> Result<()> {
        row.clear_below_objective();
        row.error = None;
        if is_blank(objective_code) {
            row.objective_code = None;
            return Ok(());
        }
        row.objective_code = Some(objective_code.to_string());

        if let Err(e) = self.actions_for(objective_code).await {
            warn!(objective_code, error = %e, "failed to load actions");
            let field_error = FieldError::new(RowField::Action, format!("Could not load actions: {e}"));
            row.error = Some(field_error.clone());
            return Err(WorkflowError::Selection(field_error));
        }

        // The totals panel copes without it.
        if let Err(e) = self.weight_meta_for(objective_code).await {
            warn!(objective_code, error = %e, "failed to load objective weight metadata");
        }
        Ok(())
    }

    /// Sets the row's action, clears its success indicator and loads the
    /// indicators for the new action.
    pub async fn change_action(&mut self, row: &mut TargetRow, action_code: &str) -> Result<()> {
        let Some(objective_code) = row.objective_code.clone() else {
            let field_error = FieldError::new(RowField::Objective, "Please select an objective");
            row.error = Some(field_error.clone());
            return Err(WorkflowError::Selection(field_error));
        };

        row.clear_below_action();
        row.error = None;
        if is_blank(action_code) {
            row.action_code = None;
            return Ok(());
        }
        row.action_code = Some(action_code.to_string());

        if let Err(e) = self.indicators_for(&objective_code, action_code).await {
            warn!(objective_code = %objective_code, action_code, error = %e, "failed to load success indicators");
            let field_error = FieldError::new(
                RowField::SuccessIndicator,
                format!("Could not load success indicators: {e}"),
            );
            row.error = Some(field_error.clone());
            return Err(WorkflowError::Selection(field_error));
        }
        Ok(())
    }

    /// Picks a success indicator from the cached set for the row's action and
    /// takes its weight type and per-unit weight.
    pub fn change_success_indicator(&self, row: &mut TargetRow, indicator_code: &str) -> Result<()> {
        row.clear_below_action();
        row.error = None;
        if is_blank(indicator_code) {
            return Ok(());
        }

        let found = match (row.objective_code.as_deref(), row.action_code.as_deref()) {
            (Some(objective_code), Some(action_code)) => {
                self.cache.indicator(objective_code, action_code, indicator_code)
            }
            _ => None,
        };
        let Some(indicator) = found else {
            let field_error = FieldError::new(
                RowField::SuccessIndicator,
                format!("Success indicator {indicator_code} is not available for this action"),
            );
            row.error = Some(field_error.clone());
            return Err(WorkflowError::Selection(field_error));
        };

        row.weight_type = indicator
            .weight_type
            .parse::<WeightType>()
            .map_err(WorkflowError::UnknownWeightType)?;
        row.weight_value = indicator.weight_per_unit;
        row.success_indicator_code = Some(indicator.success_indicator_code.clone());
        Ok(())
    }
}
