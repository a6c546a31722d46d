use super::build::week_windows;
use crate::model::{Horizon, ShiftSlot};
use crate::template::Rules;

/// Tableau glouton, créneau par créneau dans l'ordre des dates : chaque place va à la
/// personne la moins chargée qui respecte encore toutes les règles.
///
/// `None` dès qu'un créneau ne trouve pas assez de monde ; ce n'est pas une preuve
/// d'infaisabilité, seulement l'absence de point de départ.
pub(crate) fn greedy_roster(
    horizon: &Horizon,
    rules: &Rules,
    staff: usize,
) -> Option<Vec<Vec<bool>>> {
    let slots = horizon.slots();
    let windows: Vec<(u32, u32)> = week_windows(horizon.days(), rules.week_length_days).collect();
    let mut matrix = vec![vec![false; slots.len()]; staff];
    let mut taken: Vec<Vec<&ShiftSlot>> = vec![Vec::new(); staff];
    let mut hours = vec![0u64; staff];
    let mut cursor = 0usize;

    for slot in slots {
        let mut order: Vec<usize> = (0..staff).collect();
        // à charge égale, rotation pour ne pas toujours solliciter les mêmes
        order.sort_by_key(|&p| (hours[p], (p + staff - cursor) % staff));

        let chosen: Vec<usize> = order
            .into_iter()
            .filter(|&p| fits(slot, &taken[p], hours[p], rules, &windows))
            .take(slot.required as usize)
            .collect();
        if chosen.len() < slot.required as usize {
            return None;
        }
        for p in chosen {
            matrix[p][slot.index] = true;
            taken[p].push(slot);
            hours[p] += u64::from(slot.duration_hours);
        }
        cursor = (cursor + 1) % staff.max(1);
    }
    Some(matrix)
}

fn fits(
    slot: &ShiftSlot,
    taken: &[&ShiftSlot],
    hours: u64,
    rules: &Rules,
    windows: &[(u32, u32)],
) -> bool {
    if hours + u64::from(slot.duration_hours) > u64::from(rules.max_hours_per_horizon) {
        return false;
    }
    for other in taken {
        let gap = slot.day.abs_diff(other.day);
        if gap == 0 {
            return false;
        }
        if gap == 1 && slot.kind.is_on_call() != other.kind.is_on_call() {
            return false;
        }
        if slot.kind.is_on_call() && other.kind.is_on_call() && gap < rules.min_days_between_oncall
        {
            return false;
        }
    }
    if !slot.kind.is_on_call() {
        return true;
    }

    let on_calls: Vec<u32> = taken
        .iter()
        .filter(|s| s.kind.is_on_call())
        .map(|s| s.day)
        .collect();
    if on_calls.len() as u32 >= rules.max_oncall_per_horizon {
        return false;
    }
    windows
        .iter()
        .filter(|&&(start, end)| slot.day >= start && slot.day < end)
        .all(|&(start, end)| {
            let inside = on_calls.iter().filter(|&&d| d >= start && d < end).count();
            (inside as u32) < rules.max_oncall_per_week
        })
}
