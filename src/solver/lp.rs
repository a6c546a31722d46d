use super::{
    Constraint, Domain, Model, Relation, SolveOutcome, SolveStatus, Solver, SolverError, VarId,
};
use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable, WithInitialSolution, WithTimeLimit,
};
use std::time::Duration;

/// Backend `good_lp` + `microlp` (pur Rust, branch-and-bound sur les entiers).
///
/// Le budget de temps est confié à `microlp`, qui interrompt lui-même sa recherche :
/// rien ne continue de tourner après le retour. Les indications du modèle servent
/// de solution de départ.
#[derive(Debug, Default, Clone, Copy)]
pub struct LpSolver;

impl LpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for LpSolver {
    fn solve(
        &self,
        model: &Model,
        time_limit: Option<Duration>,
    ) -> Result<SolveOutcome, SolverError> {
        let mut problem_vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .vars()
            .iter()
            .map(|def| {
                let v = match def.domain {
                    Domain::Bool => variable().binary(),
                    Domain::Int { lb, ub } => variable().integer().min(lb as f64).max(ub as f64),
                };
                problem_vars.add(v.name(def.name.clone()))
            })
            .collect();

        let hinted = hint_table(model);
        let mut start: Vec<(Variable, f64)> = model
            .hints()
            .iter()
            .map(|&(var, value)| (handles[var.index()], value as f64))
            .collect();

        let mut selectors = Vec::new();
        for c in model.constraints() {
            let (sources, wants_max) = match c {
                Constraint::MaxEquality { sources, .. } => (sources, true),
                Constraint::MinEquality { sources, .. } => (sources, false),
                Constraint::Linear { .. } => continue,
            };
            let picks: Vec<Variable> = sources
                .iter()
                .map(|_| problem_vars.add(variable().binary()))
                .collect();
            if let Some(chosen) = hinted_extremum(&hinted, sources, wants_max) {
                for (i, pick) in picks.iter().enumerate() {
                    start.push((*pick, if i == chosen { 1.0 } else { 0.0 }));
                }
            }
            selectors.push(picks);
        }

        let objective = model
            .objective()
            .map(|terms| affine(&handles, terms))
            .unwrap_or_else(|| Expression::from(0.0));
        let mut problem = problem_vars.minimise(objective).using(microlp);

        let mut selectors = selectors.into_iter();
        for c in model.constraints() {
            match c {
                Constraint::Linear {
                    terms,
                    relation,
                    bound,
                } => {
                    let bound = *bound as f64;
                    let posted = match relation {
                        Relation::Le => constraint::leq(affine(&handles, terms), bound),
                        Relation::Eq => constraint::eq(affine(&handles, terms), bound),
                        Relation::Ge => constraint::leq(negated(&handles, terms), -bound),
                    };
                    problem = problem.with(posted);
                }
                Constraint::MaxEquality { target, sources } => {
                    let picks = selectors.next().unwrap_or_default();
                    let (_, target_ub) = model.var(*target).domain.bounds();
                    for (src, pick) in sources.iter().zip(&picks) {
                        let (src_lb, _) = model.var(*src).domain.bounds();
                        let big_m = (target_ub - src_lb).max(0) as f64;
                        // target >= src
                        problem = problem.with(constraint::leq(
                            affine(&handles, &[(*src, 1), (*target, -1)]),
                            0.0,
                        ));
                        // target <= src + M (1 - pick)
                        let mut e = affine(&handles, &[(*target, 1), (*src, -1)]);
                        e += big_m * *pick;
                        problem = problem.with(constraint::leq(e, big_m));
                    }
                    problem = problem.with(constraint::eq(sum_of(&picks), 1.0));
                }
                Constraint::MinEquality { target, sources } => {
                    let picks = selectors.next().unwrap_or_default();
                    let (target_lb, _) = model.var(*target).domain.bounds();
                    for (src, pick) in sources.iter().zip(&picks) {
                        let (_, src_ub) = model.var(*src).domain.bounds();
                        let big_m = (src_ub - target_lb).max(0) as f64;
                        // target <= src
                        problem = problem.with(constraint::leq(
                            affine(&handles, &[(*target, 1), (*src, -1)]),
                            0.0,
                        ));
                        // target >= src - M (1 - pick)
                        let mut e = affine(&handles, &[(*src, 1), (*target, -1)]);
                        e += big_m * *pick;
                        problem = problem.with(constraint::leq(e, big_m));
                    }
                    problem = problem.with(constraint::eq(sum_of(&picks), 1.0));
                }
            }
        }

        if let Some(limit) = time_limit {
            problem = problem.with_time_limit(limit.as_secs_f64());
        }
        if !start.is_empty() {
            problem = problem.with_initial_solution(start);
        }

        match problem.solve() {
            Ok(solution) => {
                let status = match solution.status() {
                    SolutionStatus::Optimal => SolveStatus::Optimal,
                    _ => SolveStatus::Feasible,
                };
                let values = handles
                    .iter()
                    .map(|h| solution.value(*h).round() as i64)
                    .collect();
                Ok(SolveOutcome::with_values(status, values))
            }
            Err(ResolutionError::Infeasible) => Ok(SolveOutcome::infeasible()),
            Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded),
            // seule erreur « Other » de microlp : budget écoulé sans solution
            Err(ResolutionError::Other(reason)) if time_limit.is_some() => {
                tracing::debug!(?time_limit, reason, "solver time budget exhausted");
                Ok(SolveOutcome::unknown())
            }
            Err(other) => Err(SolverError::Backend(other.to_string())),
        }
    }
}

/// Valeur indiquée pour chaque variable, par index.
fn hint_table(model: &Model) -> Vec<Option<i64>> {
    let mut table = vec![None; model.num_vars()];
    for &(var, value) in model.hints() {
        table[var.index()] = Some(value);
    }
    table
}

/// Position de la source extrême si toutes les sources sont indiquées.
fn hinted_extremum(hinted: &[Option<i64>], sources: &[VarId], wants_max: bool) -> Option<usize> {
    let values: Vec<i64> = sources
        .iter()
        .map(|v| hinted[v.index()])
        .collect::<Option<_>>()?;
    let best = if wants_max {
        values.iter().max()?
    } else {
        values.iter().min()?
    };
    values.iter().position(|v| v == best)
}

fn affine(handles: &[Variable], terms: &[(VarId, i64)]) -> Expression {
    let mut e = Expression::from(0.0);
    for (var, coef) in terms {
        e += *coef as f64 * handles[var.index()];
    }
    e
}

fn negated(handles: &[Variable], terms: &[(VarId, i64)]) -> Expression {
    let flipped: Vec<(VarId, i64)> = terms.iter().map(|(v, c)| (*v, -c)).collect();
    affine(handles, &flipped)
}

fn sum_of(vars: &[Variable]) -> Expression {
    let mut e = Expression::from(0.0);
    for v in vars {
        e += *v;
    }
    e
}
