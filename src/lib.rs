#![forbid(unsafe_code)]
//! Tourgarde : génération de tableaux de garde par recherche de faisabilité.
//!
//! - Horizon décrit par gabarit JSON ou liste CSV explicite.
//! - Règles de repos et plafonds posés comme contraintes linéaires sur des booléens.
//! - Recherche de la plus petite équipe faisable, un modèle neuf par candidat.
//! - Résolution déléguée à un backend (`good_lp` par défaut).

pub mod io;
pub mod model;
pub mod scheduler;
pub mod solver;
pub mod template;

pub use model::{
    Horizon, PersonId, RosterRecord, RosterReport, RunMeta, RunStatus, ShiftKind, ShiftSlot,
};
pub use scheduler::{
    search, ObjectiveMode, SchedError, Scheduler, SearchOptions, SearchOrder, Solution, Violation,
    ViolationKind,
};
pub use solver::{LpSolver, Model, SolveOutcome, SolveStatus, Solver, SolverError};
pub use template::{
    export_template_json, generate_horizon, load_rules_from_file, load_template_from_file,
    presets, DayPattern, HorizonTemplate, Rules, SlotEntry, SlotTemplate,
};
