use crate::model::{PersonId, RosterRecord, RosterReport, RunMeta, RunStatus, ShiftKind};
use crate::solver::{SolveStatus, SolverError};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Objectif optimisé pour chaque candidat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveMode {
    /// Minimise l'écart entre la charge horaire maximale et minimale.
    #[default]
    Balance,
    /// Minimise le nombre de personnes effectivement mobilisées.
    MinimizeHeadcount,
}

impl FromStr for ObjectiveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balance" => Ok(ObjectiveMode::Balance),
            "headcount" | "minimize-headcount" => Ok(ObjectiveMode::MinimizeHeadcount),
            other => Err(format!("unknown objective: {other}")),
        }
    }
}

/// Ordre d'exploration des tailles d'équipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOrder {
    /// Balayage croissant ; s'arrête au premier candidat faisable.
    #[default]
    Linear,
    /// Dichotomie, valide grâce à la monotonie de la faisabilité en `n`.
    Bisect,
}

impl FromStr for SearchOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(SearchOrder::Linear),
            "bisect" | "binary" => Ok(SearchOrder::Bisect),
            other => Err(format!("unknown search order: {other}")),
        }
    }
}

/// Options de recherche
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub min_staff: usize,
    pub max_staff: usize,
    pub objective: ObjectiveMode,
    pub order: SearchOrder,
    /// Budget par appel au solveur.
    pub time_limit: Option<Duration>,
}

/// Budget par candidat quand l'appelant n'en fixe pas.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10);

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_staff: 15,
            max_staff: 50,
            objective: ObjectiveMode::Balance,
            order: SearchOrder::Linear,
            time_limit: Some(DEFAULT_TIME_LIMIT),
        }
    }
}

impl SearchOptions {
    pub fn validate(&self) -> Result<(), SchedError> {
        if self.min_staff == 0 {
            return Err(SchedError::invalid("min_staff", "must be >= 1"));
        }
        if self.min_staff > self.max_staff {
            return Err(SchedError::invalid("search_range", "empty range (min > max)"));
        }
        if self.time_limit.is_some_and(|d| d.is_zero()) {
            return Err(SchedError::invalid("time_limit", "must be > 0"));
        }
        Ok(())
    }
}

/// Issue d'un candidat `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Optimal,
    Feasible,
    Infeasible,
    /// Le solveur n'a pas conclu ; à relancer avec un budget plus large.
    Inconclusive,
}

impl From<SolveStatus> for AttemptOutcome {
    fn from(status: SolveStatus) -> Self {
        match status {
            SolveStatus::Optimal => AttemptOutcome::Optimal,
            SolveStatus::Feasible => AttemptOutcome::Feasible,
            SolveStatus::Infeasible => AttemptOutcome::Infeasible,
            SolveStatus::Unknown => AttemptOutcome::Inconclusive,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttemptOutcome::Optimal => "optimal",
            AttemptOutcome::Feasible => "feasible",
            AttemptOutcome::Infeasible => "infeasible",
            AttemptOutcome::Inconclusive => "inconclusive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub staff: usize,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

/// Charge horaire par personne.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub per_person: Vec<u64>,
    pub min: u64,
    pub max: u64,
}

/// Résultat d'une recherche réussie.
#[derive(Debug, Clone)]
pub struct Solution {
    pub staff_pool: usize,
    pub status: RunStatus,
    /// Matrice d'affectation `[personne][créneau]`.
    pub assignments: Vec<Vec<bool>>,
    pub records: Vec<RosterRecord>,
    /// Drapeaux actifs à 1 (mode effectif uniquement).
    pub active_count: Option<usize>,
    pub loads: LoadSummary,
    pub attempts: Vec<Attempt>,
}

impl Solution {
    /// Effectif annoncé à l'appelant.
    pub fn required_headcount(&self) -> usize {
        self.active_count
            .unwrap_or_else(|| self.loads.per_person.iter().filter(|&&h| h > 0).count())
    }

    pub fn inconclusive(&self) -> Vec<usize> {
        inconclusive_of(&self.attempts)
    }

    /// Métadonnées exportables de l'exécution.
    pub fn meta(&self) -> RunMeta {
        RunMeta {
            staff_pool: self.staff_pool,
            staff_count_used: self.required_headcount(),
            status: self.status,
            load_min: self.loads.min,
            load_max: self.loads.max,
        }
    }

    pub fn report(&self) -> RosterReport {
        RosterReport {
            meta: self.meta(),
            records: self.records.clone(),
        }
    }
}

pub(crate) fn inconclusive_of(attempts: &[Attempt]) -> Vec<usize> {
    attempts
        .iter()
        .filter(|a| a.outcome == AttemptOutcome::Inconclusive)
        .map(|a| a.staff)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    Coverage,
    DoubleBooking,
    RestAroundOnCall,
    OnCallTooClose,
    HorizonOnCallCap,
    WeeklyOnCallCap,
    HourCap,
    UnknownSlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub person: Option<PersonId>,
    pub date: NaiveDate,
    pub shift: Option<ShiftKind>,
    pub detail: String,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid configuration field `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    #[error(
        "no feasible roster for any staff count in {min}..={max} (inconclusive: {inconclusive:?})"
    )]
    Exhausted {
        min: usize,
        max: usize,
        inconclusive: Vec<usize>,
    },
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchedError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        SchedError::InvalidConfig { field, reason }
    }
}
