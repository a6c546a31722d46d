//! Capacité de résolution : formulation en mémoire + trait `Solver`.
//!
//! Le crate ne résout rien lui-même : il décrit des variables booléennes/entières,
//! des contraintes linéaires et un objectif, puis délègue à un backend.

mod lp;

pub use lp::LpSolver;

use std::time::Duration;
use thiserror::Error;

/// Poignée opaque sur une variable du modèle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Bool,
    Int { lb: i64, ub: i64 },
}

impl Domain {
    pub fn bounds(self) -> (i64, i64) {
        match self {
            Domain::Bool => (0, 1),
            Domain::Int { lb, ub } => (lb, ub),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDef {
    pub name: String,
    pub domain: Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Eq,
    Ge,
}

/// Somme pondérée de variables.
pub type Terms = Vec<(VarId, i64)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `Σ coef·var (rel) bound`
    Linear {
        terms: Terms,
        relation: Relation,
        bound: i64,
    },
    /// `target == max(sources)`
    MaxEquality { target: VarId, sources: Vec<VarId> },
    /// `target == min(sources)`
    MinEquality { target: VarId, sources: Vec<VarId> },
}

/// Modèle complet, reconstruit pour chaque candidat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: Option<Terms>,
    hints: Vec<(VarId, i64)>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool_var<S: Into<String>>(&mut self, name: S) -> VarId {
        self.push_var(name.into(), Domain::Bool)
    }

    pub fn new_int_var<S: Into<String>>(&mut self, lb: i64, ub: i64, name: S) -> VarId {
        debug_assert!(lb <= ub, "empty integer domain");
        self.push_var(name.into(), Domain::Int { lb, ub })
    }

    fn push_var(&mut self, name: String, domain: Domain) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef { name, domain });
        id
    }

    pub fn add_linear(&mut self, terms: Terms, relation: Relation, bound: i64) {
        self.constraints.push(Constraint::Linear {
            terms,
            relation,
            bound,
        });
    }

    /// Raccourci pour `a + b <= 1` (exclusion mutuelle de deux booléens).
    pub fn add_at_most_one_of(&mut self, a: VarId, b: VarId) {
        self.add_linear(vec![(a, 1), (b, 1)], Relation::Le, 1);
    }

    pub fn add_max_equality(&mut self, target: VarId, sources: Vec<VarId>) {
        self.constraints
            .push(Constraint::MaxEquality { target, sources });
    }

    pub fn add_min_equality(&mut self, target: VarId, sources: Vec<VarId>) {
        self.constraints
            .push(Constraint::MinEquality { target, sources });
    }

    /// Fixe l'objectif (minimisation). Un second appel remplace le premier.
    pub fn minimize(&mut self, terms: Terms) {
        self.objective = Some(terms);
    }

    /// Valeur de départ suggérée au backend ; sans effet sur la faisabilité.
    pub fn add_hint(&mut self, var: VarId, value: i64) {
        self.hints.push((var, value));
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }
    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.0]
    }
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
    pub fn objective(&self) -> Option<&Terms> {
        self.objective.as_ref()
    }
    pub fn hints(&self) -> &[(VarId, i64)] {
        &self.hints
    }
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Solution prouvée optimale.
    Optimal,
    /// Solution trouvée, optimalité non prouvée.
    Feasible,
    Infeasible,
    /// Le backend n'a pas conclu (budget de temps épuisé, abandon).
    Unknown,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    values: Vec<i64>,
}

impl SolveOutcome {
    pub fn with_values(status: SolveStatus, values: Vec<i64>) -> Self {
        Self { status, values }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolveStatus::Infeasible,
            values: Vec::new(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: SolveStatus::Unknown,
            values: Vec::new(),
        }
    }

    /// Valeur d'une variable ; 0 si l'issue ne porte pas de solution.
    pub fn value(&self, var: VarId) -> i64 {
        self.values.get(var.0).copied().unwrap_or(0)
    }

    pub fn is_true(&self, var: VarId) -> bool {
        self.value(var) != 0
    }
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("solver backend failure: {0}")]
    Backend(String),
    #[error("objective is unbounded")]
    Unbounded,
}

/// Backend capable de résoudre un `Model`, avec un budget optionnel.
pub trait Solver {
    fn solve(
        &self,
        model: &Model,
        time_limit: Option<Duration>,
    ) -> Result<SolveOutcome, SolverError>;
}

impl<S: Solver + ?Sized> Solver for &S {
    fn solve(
        &self,
        model: &Model,
        time_limit: Option<Duration>,
    ) -> Result<SolveOutcome, SolverError> {
        (**self).solve(model, time_limit)
    }
}
