//! File-backed plan persistence.
//!
//! `plans.json` is owned exclusively by this store. Callers load a fresh store
//! per operation; every mutation validates and saves before returning.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "plans": [ { ... BlockingPlan fields ... } ]
//! }
//! ```
//!
//! Corrupt JSON or an unknown version loads as an empty store (logged), never
//! an error.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{BlockingPlan, PlanDraft};
use super::validation::validate_plan;
use crate::error::{Result, StrideError};
use crate::storage::{read_json, write_json_atomic};

pub const PLAN_STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PlanFile {
    version: u32,
    #[serde(default)]
    plans: Vec<BlockingPlan>,
}

pub struct PlanStore {
    plans: Vec<BlockingPlan>,
    file_path: PathBuf,
}

impl PlanStore {
    pub fn load(file_path: &Path) -> Self {
        let plans = match read_json::<PlanFile>(file_path) {
            Some(file) if file.version == PLAN_STORE_VERSION => file.plans,
            Some(file) => {
                tracing::warn!(
                    version = file.version,
                    expected = PLAN_STORE_VERSION,
                    "Unsupported plan file version, returning empty store"
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        Self {
            plans,
            file_path: file_path.to_path_buf(),
        }
    }

    pub fn plans(&self) -> &[BlockingPlan] {
        &self.plans
    }

    pub fn into_plans(self) -> Vec<BlockingPlan> {
        self.plans
    }

    pub fn get(&self, id: &str) -> Option<&BlockingPlan> {
        self.plans.iter().find(|plan| plan.id == id)
    }

    pub fn create(&mut self, draft: PlanDraft) -> Result<BlockingPlan> {
        validate_plan(&draft)?;
        let plan = new_plan(draft);
        self.plans.push(plan.clone());
        self.save()?;
        tracing::debug!(plan_id = %plan.id, "Plan created");
        Ok(plan)
    }

    pub fn update(&mut self, id: &str, draft: PlanDraft) -> Result<BlockingPlan> {
        validate_plan(&draft)?;
        let plan = self.get_mut(id)?;
        plan.name = draft.name;
        plan.days = draft.days;
        plan.duration = draft.duration;
        plan.criterion = draft.criterion;
        plan.blocked_apps = draft.blocked_apps;
        plan.active = draft.active;
        let updated = plan.clone();
        self.save()?;
        Ok(updated)
    }

    /// Copies a plan under a fresh id. The copy starts paused so it does not
    /// double the day's goal until the user edits it.
    pub fn duplicate(&mut self, id: &str) -> Result<BlockingPlan> {
        let source = self
            .get(id)
            .ok_or_else(|| StrideError::PlanNotFound(id.to_string()))?;
        let mut draft = PlanDraft::from(source);
        draft.name = format!("{} (copy)", source.name);
        draft.active = false;

        let plan = new_plan(draft);
        self.plans.push(plan.clone());
        self.save()?;
        Ok(plan)
    }

    /// Pause (`false`) or resume (`true`) a plan.
    pub fn set_active(&mut self, id: &str, active: bool) -> Result<BlockingPlan> {
        let plan = self.get_mut(id)?;
        plan.active = active;
        let updated = plan.clone();
        self.save()?;
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.plans.len();
        self.plans.retain(|plan| plan.id != id);
        if self.plans.len() == before {
            return Err(StrideError::PlanNotFound(id.to_string()));
        }
        self.save()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut BlockingPlan> {
        self.plans
            .iter_mut()
            .find(|plan| plan.id == id)
            .ok_or_else(|| StrideError::PlanNotFound(id.to_string()))
    }

    fn save(&self) -> Result<()> {
        let file = PlanFile {
            version: PLAN_STORE_VERSION,
            plans: self.plans.clone(),
        };
        write_json_atomic(&self.file_path, &file)
    }
}

fn new_plan(draft: PlanDraft) -> BlockingPlan {
    BlockingPlan {
        id: ulid::Ulid::new().to_string(),
        name: draft.name,
        days: draft.days,
        duration: draft.duration,
        criterion: draft.criterion,
        blocked_apps: draft.blocked_apps,
        active: draft.active,
        created_at: Utc::now().to_rfc3339(),
    }
}
