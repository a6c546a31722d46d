use super::build::ScheduleModel;
use super::types::LoadSummary;
use crate::model::{Horizon, PersonId, RosterRecord};
use crate::solver::SolveOutcome;

/// Matrice `[personne][créneau]` lue depuis une solution.
pub fn assignment_matrix(
    horizon: &Horizon,
    built: &ScheduleModel,
    outcome: &SolveOutcome,
) -> Vec<Vec<bool>> {
    (0..built.staff)
        .map(|p| {
            horizon
                .slots()
                .iter()
                .map(|s| outcome.is_true(built.assign(p, s.index)))
                .collect()
        })
        .collect()
}

/// Aplatit la matrice en lignes (date, type, personne), triées.
pub fn extract_roster(horizon: &Horizon, assignments: &[Vec<bool>]) -> Vec<RosterRecord> {
    let mut out: Vec<RosterRecord> = assignments
        .iter()
        .enumerate()
        .flat_map(|(p, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &on)| on)
                .map(move |(slot, _)| {
                    let s = horizon.slot(slot);
                    RosterRecord {
                        date: s.date,
                        kind: s.kind,
                        person: PersonId::new(p),
                    }
                })
        })
        .collect();
    out.sort();
    out
}

/// Recalcule les charges horaires à partir des lignes ; les lignes qui ne
/// correspondent à aucun créneau sont ignorées.
pub fn load_summary(horizon: &Horizon, records: &[RosterRecord], staff: usize) -> LoadSummary {
    let pool = records
        .iter()
        .map(|r| r.person.index() + 1)
        .max()
        .unwrap_or(0)
        .max(staff);
    let mut per_person = vec![0u64; pool];
    for r in records {
        if let Some(slot) = horizon.find(r.date, r.kind) {
            per_person[r.person.index()] += u64::from(slot.duration_hours);
        }
    }
    let min = per_person.iter().copied().min().unwrap_or(0);
    let max = per_person.iter().copied().max().unwrap_or(0);
    LoadSummary {
        per_person,
        min,
        max,
    }
}
