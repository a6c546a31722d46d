use super::seed::greedy_roster;
use super::types::ObjectiveMode;
use crate::model::{Horizon, ShiftKind};
use crate::solver::{Model, Relation, Terms, VarId};
use crate::template::Rules;

/// Modèle posé pour un candidat `n`, avec la correspondance variables ↔ domaine.
#[derive(Debug, Clone)]
pub struct ScheduleModel {
    pub model: Model,
    pub staff: usize,
    pub objective: ObjectiveMode,
    assign: Vec<Vec<VarId>>,
    active: Vec<VarId>,
    loads: Vec<VarId>,
    load_bounds: Option<(VarId, VarId)>,
}

impl ScheduleModel {
    /// Variable « la personne `person` tient le créneau `slot` ».
    pub fn assign(&self, person: usize, slot: usize) -> VarId {
        self.assign[person][slot]
    }
    /// Drapeaux actifs (vide hors mode effectif).
    pub fn active(&self) -> &[VarId] {
        &self.active
    }
    /// Charges horaires (vide hors mode équilibre).
    pub fn loads(&self) -> &[VarId] {
        &self.loads
    }
    /// `(max, min)` des charges en mode équilibre.
    pub fn load_bounds(&self) -> Option<(VarId, VarId)> {
        self.load_bounds
    }
}

/// Construit un modèle neuf pour `staff` personnes. Ne peut pas échouer :
/// l'infaisabilité n'apparaît qu'à la résolution.
pub fn build_model(
    horizon: &Horizon,
    rules: &Rules,
    staff: usize,
    objective: ObjectiveMode,
) -> ScheduleModel {
    let mut model = Model::new();

    let assign: Vec<Vec<VarId>> = (0..staff)
        .map(|p| {
            horizon
                .slots()
                .iter()
                .map(|s| model.new_bool_var(format!("x_{p}_{}_{}", s.date, s.kind)))
                .collect()
        })
        .collect();

    post_coverage(&mut model, horizon, &assign);
    for person in &assign {
        post_one_shift_per_day(&mut model, horizon, person);
        post_rest_around_on_call(&mut model, horizon, person);
        post_on_call_spacing(&mut model, horizon, rules, person);
        post_caps(&mut model, horizon, rules, person);
    }

    let mut built = ScheduleModel {
        model,
        staff,
        objective,
        assign,
        active: Vec::new(),
        loads: Vec::new(),
        load_bounds: None,
    };
    match objective {
        ObjectiveMode::Balance => wire_balance(&mut built, horizon, rules),
        ObjectiveMode::MinimizeHeadcount => wire_headcount(&mut built),
    }

    let seed = greedy_roster(horizon, rules, staff);
    if let Some(seed) = &seed {
        post_hints(&mut built, horizon, seed);
    }

    tracing::debug!(
        staff,
        vars = built.model.num_vars(),
        constraints = built.model.constraints().len(),
        seeded = seed.is_some(),
        "model built"
    );
    built
}

fn post_coverage(model: &mut Model, horizon: &Horizon, assign: &[Vec<VarId>]) {
    for slot in horizon.slots() {
        let terms: Terms = assign.iter().map(|p| (p[slot.index], 1)).collect();
        model.add_linear(terms, Relation::Eq, i64::from(slot.required));
    }
}

fn post_one_shift_per_day(model: &mut Model, horizon: &Horizon, person: &[VarId]) {
    for day in 0..i64::from(horizon.days()) {
        let slots = horizon.slots_on_day(day);
        if slots.len() < 2 {
            continue;
        }
        let terms: Terms = slots.iter().map(|&s| (person[s], 1)).collect();
        model.add_linear(terms, Relation::Le, 1);
    }
}

/// Pas de journée régulière la veille ni le lendemain d'une garde.
fn post_rest_around_on_call(model: &mut Model, horizon: &Horizon, person: &[VarId]) {
    for oncall in horizon.on_call_slots() {
        let day = i64::from(oncall.day);
        for neighbour in [day - 1, day + 1] {
            if let Some(regular) = horizon.slot_at(neighbour, ShiftKind::Regular) {
                model.add_at_most_one_of(person[regular], person[oncall.index]);
            }
        }
    }
}

/// Deux gardes séparées de moins de `min_days_between_oncall` jours calendaires
/// s'excluent. L'écart se mesure sur les dates, pas sur la position dans la liste.
fn post_on_call_spacing(model: &mut Model, horizon: &Horizon, rules: &Rules, person: &[VarId]) {
    let on_calls: Vec<_> = horizon.on_call_slots().collect();
    for (i, a) in on_calls.iter().enumerate() {
        for b in &on_calls[i + 1..] {
            if b.day - a.day >= rules.min_days_between_oncall {
                break;
            }
            model.add_at_most_one_of(person[a.index], person[b.index]);
        }
    }
}

fn post_caps(model: &mut Model, horizon: &Horizon, rules: &Rules, person: &[VarId]) {
    let on_call_terms: Terms = horizon
        .on_call_slots()
        .map(|s| (person[s.index], 1))
        .collect();
    model.add_linear(
        on_call_terms,
        Relation::Le,
        i64::from(rules.max_oncall_per_horizon),
    );

    for (start, end) in week_windows(horizon.days(), rules.week_length_days) {
        let terms: Terms = horizon
            .on_call_slots()
            .filter(|s| s.day >= start && s.day < end)
            .map(|s| (person[s.index], 1))
            .collect();
        if terms.is_empty() {
            continue;
        }
        model.add_linear(terms, Relation::Le, i64::from(rules.max_oncall_per_week));
    }

    let hours: Terms = horizon
        .slots()
        .iter()
        .map(|s| (person[s.index], i64::from(s.duration_hours)))
        .collect();
    model.add_linear(hours, Relation::Le, i64::from(rules.max_hours_per_horizon));
}

/// Fenêtres glissantes `[start, end)` : une par décalage valide. Un horizon plus court
/// qu'une semaine forme une seule fenêtre.
pub(crate) fn week_windows(days: u32, week: u32) -> impl Iterator<Item = (u32, u32)> {
    let len = week.min(days).max(1);
    (0..=days.saturating_sub(len)).map(move |start| (start, start + len))
}

fn wire_balance(built: &mut ScheduleModel, horizon: &Horizon, rules: &Rules) {
    let ub = i64::from(rules.load_upper_bound);
    let model = &mut built.model;

    for (p, person) in built.assign.iter().enumerate() {
        let load = model.new_int_var(0, ub, format!("load_{p}"));
        let mut terms: Terms = horizon
            .slots()
            .iter()
            .map(|s| (person[s.index], i64::from(s.duration_hours)))
            .collect();
        terms.push((load, -1));
        model.add_linear(terms, Relation::Eq, 0);
        built.loads.push(load);
    }

    let max_load = model.new_int_var(0, ub, "max_load");
    let min_load = model.new_int_var(0, ub, "min_load");
    model.add_max_equality(max_load, built.loads.clone());
    model.add_min_equality(min_load, built.loads.clone());
    model.minimize(vec![(max_load, 1), (min_load, -1)]);
    built.load_bounds = Some((max_load, min_load));
}

fn wire_headcount(built: &mut ScheduleModel) {
    let model = &mut built.model;
    for (p, person) in built.assign.iter().enumerate() {
        let flag = model.new_bool_var(format!("active_{p}"));
        for &x in person {
            model.add_linear(vec![(x, 1), (flag, -1)], Relation::Le, 0);
        }
        built.active.push(flag);
    }
    let objective: Terms = built.active.iter().map(|&f| (f, 1)).collect();
    model.minimize(objective);
}

/// Point de départ du backend : le tableau glouton et les auxiliaires qui en découlent.
fn post_hints(built: &mut ScheduleModel, horizon: &Horizon, seed: &[Vec<bool>]) {
    let model = &mut built.model;
    for (person, row) in built.assign.iter().zip(seed) {
        for (&x, &on) in person.iter().zip(row) {
            model.add_hint(x, i64::from(on));
        }
    }
    for (&flag, row) in built.active.iter().zip(seed) {
        model.add_hint(flag, i64::from(row.iter().any(|&on| on)));
    }

    let loads: Vec<i64> = seed
        .iter()
        .map(|row| {
            horizon
                .slots()
                .iter()
                .filter(|s| row[s.index])
                .map(|s| i64::from(s.duration_hours))
                .sum()
        })
        .collect();
    for (&var, &load) in built.loads.iter().zip(&loads) {
        model.add_hint(var, load);
    }
    if let Some((max_load, min_load)) = built.load_bounds {
        model.add_hint(max_load, loads.iter().copied().max().unwrap_or(0));
        model.add_hint(min_load, loads.iter().copied().min().unwrap_or(0));
    }
}
