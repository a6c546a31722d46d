mod build;
mod conflicts;
mod extract;
mod search;
mod seed;
mod types;

pub use build::{build_model, ScheduleModel};
pub use conflicts::detect_violations;
pub use extract::{assignment_matrix, extract_roster, load_summary};
pub use search::search;
pub use types::{
    Attempt, AttemptOutcome, LoadSummary, ObjectiveMode, SchedError, SearchOptions, SearchOrder,
    Solution, Violation, ViolationKind, DEFAULT_TIME_LIMIT,
};

use crate::model::{Horizon, RosterRecord};
use crate::solver::Solver;
use crate::template::Rules;

/// Scheduler : un horizon figé, ses règles et les options de recherche.
#[derive(Debug, Clone)]
pub struct Scheduler {
    horizon: Horizon,
    rules: Rules,
    options: SearchOptions,
}

impl Scheduler {
    pub fn new(horizon: Horizon, rules: Rules) -> Self {
        Self {
            horizon,
            rules,
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }
    pub fn rules(&self) -> &Rules {
        &self.rules
    }
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Modèle neuf pour `staff` personnes, sans le résoudre.
    pub fn build_model(&self, staff: usize) -> ScheduleModel {
        build::build_model(&self.horizon, &self.rules, staff, self.options.objective)
    }

    pub fn solve(&self, solver: &dyn Solver) -> Result<Solution, SchedError> {
        search::search(&self.horizon, &self.rules, &self.options, solver)
    }

    pub fn detect_violations(&self, records: &[RosterRecord]) -> Vec<Violation> {
        conflicts::detect_violations(&self.horizon, &self.rules, records)
    }
}
