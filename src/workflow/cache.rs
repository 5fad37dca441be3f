// src/workflow/cache.rs

use std::collections::HashMap;

use crate::models::{Action, Centre, Objective, SuccessIndicator, WeightMeta};

/// Master data fetched so far, keyed by parent code.
#[derive(Debug, Default, Clone)]
pub struct MasterDataCache {
    objectives: Vec<Objective>,
    centres: Vec<Centre>,
    actions: HashMap<String, Vec<Action>>,
    indicators: HashMap<(String, String), Vec<SuccessIndicator>>,
    weights: HashMap<String, WeightMeta>,
}

impl MasterDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn objective(&self, code: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.objective_code == code)
    }

    pub fn set_objectives(&mut self, objectives: Vec<Objective>) {
        self.objectives = objectives;
    }

    pub fn centres(&self) -> &[Centre] {
        &self.centres
    }

    pub fn set_centres(&mut self, centres: Vec<Centre>) {
        self.centres = centres;
    }

    pub fn actions(&self, objective_code: &str) -> Option<&[Action]> {
        self.actions.get(objective_code).map(Vec::as_slice)
    }

    pub fn insert_actions(&mut self, objective_code: &str, actions: Vec<Action>) {
        self.actions.insert(objective_code.to_string(), actions);
    }

    pub fn indicators(&self, objective_code: &str, action_code: &str) -> Option<&[SuccessIndicator]> {
        self.indicators
            .get(&(objective_code.to_string(), action_code.to_string()))
            .map(Vec::as_slice)
    }

    pub fn indicator(
        &self,
        objective_code: &str,
        action_code: &str,
        indicator_code: &str,
    ) -> Option<&SuccessIndicator> {
        self.indicators(objective_code, action_code)?
            .iter()
            .find(|si| si.success_indicator_code == indicator_code)
    }

    pub fn insert_indicators(
        &mut self,
        objective_code: &str,
        action_code: &str,
        indicators: Vec<SuccessIndicator>,
    ) {
        self.indicators
            .insert((objective_code.to_string(), action_code.to_string()), indicators);
    }

    pub fn weight_meta(&self, objective_code: &str) -> Option<&WeightMeta> {
        self.weights.get(objective_code)
    }

    pub fn insert_weight_meta(&mut self, meta: WeightMeta) {
        self.weights.insert(meta.objective_code.clone(), meta);
    }
}
