use super::build::{build_model, ScheduleModel};
use super::conflicts::detect_violations;
use super::extract::{assignment_matrix, extract_roster, load_summary};
use super::types::{
    inconclusive_of, Attempt, AttemptOutcome, LoadSummary, SchedError, SearchOptions,
    SearchOrder, Solution,
};
use crate::model::{Horizon, RosterRecord, RunStatus};
use crate::solver::{SolveOutcome, SolveStatus, Solver};
use crate::template::Rules;
use std::time::Instant;

struct Accepted {
    built: ScheduleModel,
    outcome: SolveOutcome,
}

/// Cherche la plus petite équipe faisable dans `[min_staff, max_staff]`.
///
/// Chaque candidat reçoit un modèle neuf ; rien n'est partagé d'un candidat à l'autre.
pub fn search(
    horizon: &Horizon,
    rules: &Rules,
    opts: &SearchOptions,
    solver: &dyn Solver,
) -> Result<Solution, SchedError> {
    opts.validate()?;
    rules.validate()?;

    let mut attempts = Vec::new();
    let accepted = match opts.order {
        SearchOrder::Linear => linear(horizon, rules, opts, solver, &mut attempts)?,
        SearchOrder::Bisect => bisect(horizon, rules, opts, solver, &mut attempts)?,
    };

    match accepted {
        Some(acc) => Ok(finish(horizon, rules, acc, attempts)),
        None => {
            tracing::warn!(
                min = opts.min_staff,
                max = opts.max_staff,
                "search range exhausted"
            );
            Err(SchedError::Exhausted {
                min: opts.min_staff,
                max: opts.max_staff,
                inconclusive: inconclusive_of(&attempts),
            })
        }
    }
}

fn linear(
    horizon: &Horizon,
    rules: &Rules,
    opts: &SearchOptions,
    solver: &dyn Solver,
    attempts: &mut Vec<Attempt>,
) -> Result<Option<Accepted>, SchedError> {
    for staff in opts.min_staff..=opts.max_staff {
        if let Some(acc) = try_candidate(horizon, rules, opts, solver, staff, attempts)? {
            return Ok(Some(acc));
        }
    }
    Ok(None)
}

/// Dichotomie : si `n` est faisable, `n + 1` l'est aussi (une personne de plus, inactive).
fn bisect(
    horizon: &Horizon,
    rules: &Rules,
    opts: &SearchOptions,
    solver: &dyn Solver,
    attempts: &mut Vec<Attempt>,
) -> Result<Option<Accepted>, SchedError> {
    let (mut lo, mut hi) = (opts.min_staff, opts.max_staff);
    let mut best = None;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        match try_candidate(horizon, rules, opts, solver, mid, attempts)? {
            Some(acc) => {
                best = Some(acc);
                if mid == lo {
                    break;
                }
                hi = mid - 1;
            }
            None => lo = mid + 1,
        }
    }
    Ok(best)
}

fn try_candidate(
    horizon: &Horizon,
    rules: &Rules,
    opts: &SearchOptions,
    solver: &dyn Solver,
    staff: usize,
    attempts: &mut Vec<Attempt>,
) -> Result<Option<Accepted>, SchedError> {
    let started = Instant::now();
    let built = build_model(horizon, rules, staff, opts.objective);
    let outcome = solver.solve(&built.model, opts.time_limit)?;

    let attempt = Attempt {
        staff,
        outcome: AttemptOutcome::from(outcome.status),
        elapsed: started.elapsed(),
    };
    tracing::info!(
        staff,
        outcome = %attempt.outcome,
        elapsed_ms = attempt.elapsed.as_millis() as u64,
        "candidate staff count tried"
    );
    attempts.push(attempt);

    if outcome.status.has_solution() {
        Ok(Some(Accepted { built, outcome }))
    } else {
        Ok(None)
    }
}

fn finish(horizon: &Horizon, rules: &Rules, acc: Accepted, attempts: Vec<Attempt>) -> Solution {
    let Accepted { built, outcome } = acc;
    let assignments = assignment_matrix(horizon, &built, &outcome);
    let records = extract_roster(horizon, &assignments);
    let loads = loads_of(horizon, &built, &outcome, &records);
    let active_count = (!built.active().is_empty())
        .then(|| built.active().iter().filter(|&&f| outcome.is_true(f)).count());

    let violations = detect_violations(horizon, rules, &records);
    if !violations.is_empty() {
        tracing::warn!(
            count = violations.len(),
            first = ?violations[0],
            "solver returned a roster that breaks the rules"
        );
    }

    let status = match outcome.status {
        SolveStatus::Optimal => RunStatus::Optimal,
        _ => RunStatus::Feasible,
    };
    tracing::info!(
        staff_pool = built.staff,
        ?active_count,
        load_min = loads.min,
        load_max = loads.max,
        "roster accepted"
    );

    Solution {
        staff_pool: built.staff,
        status,
        assignments,
        records,
        active_count,
        loads,
        attempts,
    }
}

/// Charges lues dans la solution en mode équilibre, recalculées depuis le tableau sinon.
fn loads_of(
    horizon: &Horizon,
    built: &ScheduleModel,
    outcome: &SolveOutcome,
    records: &[RosterRecord],
) -> LoadSummary {
    let hours = |var| u64::try_from(outcome.value(var)).unwrap_or(0);
    match built.load_bounds() {
        Some((max_load, min_load)) => LoadSummary {
            per_person: built.loads().iter().map(|&v| hours(v)).collect(),
            min: hours(min_load),
            max: hours(max_load),
        },
        None => load_summary(horizon, records, built.staff),
    }
}
