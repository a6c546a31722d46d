use crate::model::{Horizon, ShiftKind, ShiftSlot};
use crate::scheduler::SchedError;
use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Description complète d'un horizon : période + gabarits de créneaux + règles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: NaiveDate,
    pub days: u32,
    pub pattern: DayPattern,
    #[serde(default)]
    pub rules: Option<Rules>,
}

/// Gabarit d'un créneau pour un jour donné.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTemplate {
    pub kind: ShiftKind,
    pub hours: u32,
    pub required: u32,
}

impl SlotTemplate {
    pub fn new(kind: ShiftKind, hours: u32, required: u32) -> Self {
        Self {
            kind,
            hours,
            required,
        }
    }
}

/// Créneaux d'un jour (1 = premier jour de l'horizon) pour un tableau fixe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDay {
    pub day: u32,
    pub slots: Vec<SlotTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DayPattern {
    /// Trois classes de jours. `friday_is` joue le rôle du vendredi,
    /// le jour suivant celui du samedi, tous les autres sont des jours de semaine.
    Weekly {
        #[serde(default)]
        weekday: Vec<SlotTemplate>,
        #[serde(default)]
        friday: Vec<SlotTemplate>,
        #[serde(default)]
        saturday: Vec<SlotTemplate>,
        #[serde(default = "default_friday")]
        friday_is: Weekday,
    },
    /// Table explicite par jour ; les jours absents n'ont aucun créneau.
    Fixed { days: Vec<FixedDay> },
}

fn default_friday() -> Weekday {
    Weekday::Fri
}

/// Classe d'un jour dans un motif hebdomadaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClass {
    Weekday,
    Friday,
    Saturday,
}

impl DayClass {
    pub fn of(date: NaiveDate, friday_is: Weekday) -> Self {
        let wd = date.weekday();
        if wd == friday_is {
            DayClass::Friday
        } else if wd == friday_is.succ() {
            DayClass::Saturday
        } else {
            DayClass::Weekday
        }
    }
}

/// Constantes de droit du travail appliquées à chaque personne.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub max_oncall_per_horizon: u32,
    pub max_oncall_per_week: u32,
    pub max_hours_per_horizon: u32,
    /// Écart minimal (en jours calendaires) entre deux gardes ; 2 = 48 h.
    pub min_days_between_oncall: u32,
    pub week_length_days: u32,
    /// Borne haute des variables de charge ; doit dépasser toute charge atteignable.
    pub load_upper_bound: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_oncall_per_horizon: 6,
            max_oncall_per_week: 2,
            max_hours_per_horizon: 286,
            min_days_between_oncall: 2,
            week_length_days: 7,
            load_upper_bound: 1000,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), SchedError> {
        if self.week_length_days == 0 {
            return Err(SchedError::invalid("week_length_days", "must be > 0"));
        }
        if self.load_upper_bound <= self.max_hours_per_horizon {
            return Err(SchedError::invalid(
                "load_upper_bound",
                "must exceed max_hours_per_horizon",
            ));
        }
        Ok(())
    }
}

impl HorizonTemplate {
    pub fn validate(&self) -> Result<(), SchedError> {
        if self.id.trim().is_empty() {
            return Err(SchedError::invalid("id", "cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(SchedError::invalid("name", "cannot be empty"));
        }
        if self.days == 0 {
            return Err(SchedError::invalid("days", "horizon length must be > 0"));
        }
        match &self.pattern {
            DayPattern::Weekly {
                weekday,
                friday,
                saturday,
                ..
            } => {
                validate_day_slots(weekday)?;
                validate_day_slots(friday)?;
                validate_day_slots(saturday)?;
            }
            DayPattern::Fixed { days } => {
                for fixed in days {
                    if fixed.day == 0 || fixed.day > self.days {
                        return Err(SchedError::invalid(
                            "pattern.days.day",
                            "day must lie within 1..=days",
                        ));
                    }
                    validate_day_slots(&fixed.slots)?;
                }
                for (i, a) in days.iter().enumerate() {
                    if days.iter().skip(i + 1).any(|b| b.day == a.day) {
                        return Err(SchedError::invalid(
                            "pattern.days.day",
                            "day listed twice",
                        ));
                    }
                }
            }
        }
        if let Some(rules) = &self.rules {
            rules.validate()?;
        }
        Ok(())
    }

    pub fn rules_or_default(&self) -> Rules {
        self.rules.unwrap_or_default()
    }

    fn slots_for(&self, offset: u32, date: NaiveDate) -> &[SlotTemplate] {
        match &self.pattern {
            DayPattern::Weekly {
                weekday,
                friday,
                saturday,
                friday_is,
            } => match DayClass::of(date, *friday_is) {
                DayClass::Weekday => weekday.as_slice(),
                DayClass::Friday => friday.as_slice(),
                DayClass::Saturday => saturday.as_slice(),
            },
            DayPattern::Fixed { days } => days
                .iter()
                .find(|d| d.day == offset + 1)
                .map(|d| d.slots.as_slice())
                .unwrap_or(&[]),
        }
    }
}

fn validate_day_slots(slots: &[SlotTemplate]) -> Result<(), SchedError> {
    for (i, slot) in slots.iter().enumerate() {
        if slot.hours == 0 {
            return Err(SchedError::invalid("hours", "slot duration must be > 0"));
        }
        if slots.iter().skip(i + 1).any(|o| o.kind == slot.kind) {
            return Err(SchedError::invalid(
                "kind",
                "a day may carry at most one slot per kind",
            ));
        }
    }
    Ok(())
}

/// Génère l'horizon (créneaux ordonnés par jour puis ordre du gabarit).
pub fn generate_horizon(template: &HorizonTemplate) -> Result<Horizon, SchedError> {
    template.validate()?;

    let mut slots = Vec::new();
    for offset in 0..template.days {
        let date = template
            .start
            .checked_add_days(Days::new(u64::from(offset)))
            .ok_or_else(|| SchedError::invalid("start", "date overflow"))?;
        for t in template.slots_for(offset, date) {
            slots.push(ShiftSlot {
                index: slots.len(),
                day: offset,
                date,
                kind: t.kind,
                duration_hours: t.hours,
                required: t.required,
            });
        }
    }

    Ok(Horizon::new(template.start, template.days, slots))
}

/// Ligne explicite (date, type, heures, effectif).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub date: NaiveDate,
    pub kind: ShiftKind,
    pub hours: u32,
    pub required: u32,
}

impl SlotEntry {
    pub fn new(date: NaiveDate, kind: ShiftKind, hours: u32, required: u32) -> Self {
        Self {
            date,
            kind,
            hours,
            required,
        }
    }
}

impl Horizon {
    /// Horizon construit depuis une liste explicite ; il couvre de la plus petite
    /// à la plus grande date.
    pub fn from_entries(mut entries: Vec<SlotEntry>) -> Result<Horizon, SchedError> {
        let (Some(first), Some(last)) = (
            entries.iter().map(|e| e.date).min(),
            entries.iter().map(|e| e.date).max(),
        ) else {
            return Err(SchedError::invalid("slots", "at least one slot is required"));
        };
        if entries.iter().any(|e| e.hours == 0) {
            return Err(SchedError::invalid("hours", "slot duration must be > 0"));
        }

        entries.sort_by_key(|e| e.date);
        for (i, a) in entries.iter().enumerate() {
            if entries
                .iter()
                .skip(i + 1)
                .take_while(|b| b.date == a.date)
                .any(|b| b.kind == a.kind)
            {
                return Err(SchedError::invalid(
                    "kind",
                    "duplicate (date, kind) slot",
                ));
            }
        }

        let days = last.signed_duration_since(first).num_days() + 1;
        let days =
            u32::try_from(days).map_err(|_| SchedError::invalid("date", "horizon too long"))?;
        let slots = entries
            .iter()
            .enumerate()
            .map(|(index, e)| ShiftSlot {
                index,
                day: e.date.signed_duration_since(first).num_days() as u32,
                date: e.date,
                kind: e.kind,
                duration_hours: e.hours,
                required: e.required,
            })
            .collect();
        Ok(Horizon::new(first, days, slots))
    }
}

pub fn export_template_json<P: AsRef<Path>>(path: P, template: &HorizonTemplate) -> Result<()> {
    let json = serde_json::to_string_pretty(template)?;
    crate::io::write_atomic(path.as_ref(), json.as_bytes())
}

pub fn load_template_from_file<P: AsRef<Path>>(path: P) -> Result<HorizonTemplate> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading template {}", path.display()))?;
    let template: HorizonTemplate = serde_json::from_slice(&data)
        .with_context(|| format!("parsing template {}", path.display()))?;
    template.validate()?;
    Ok(template)
}

/// Règles seules (JSON `Rules`), pour une liste de créneaux explicite.
pub fn load_rules_from_file<P: AsRef<Path>>(path: P) -> Result<Rules> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading rules {}", path.display()))?;
    let rules: Rules = serde_json::from_slice(&data)
        .with_context(|| format!("parsing rules {}", path.display()))?;
    rules.validate()?;
    Ok(rules)
}

/// Gabarits intégrés.
pub mod presets {
    use super::{DayPattern, FixedDay, HorizonTemplate, Rules, SlotTemplate};
    use crate::model::ShiftKind::{OnCall, Regular};
    use chrono::{NaiveDate, Weekday};

    pub const NAMES: [&str; 2] = ["fixed-13d", "month-2025-09"];

    /// Table fixe de 13 jours : semaine de gardes 16 h, week-end 19/24 h.
    pub fn fixed_13_days(start: NaiveDate) -> HorizonTemplate {
        let g16 = SlotTemplate::new(OnCall, 16, 4);
        let r8 = SlotTemplate::new(Regular, 8, 7);
        let fixed = |day, slots| FixedDay { day, slots };
        let mut days: Vec<FixedDay> = (1..=6).map(|day| fixed(day, vec![g16, r8])).collect();
        days.extend([
            fixed(7, vec![g16]),
            fixed(8, vec![g16]),
            fixed(9, vec![r8]),
            fixed(10, vec![g16]),
            fixed(
                11,
                vec![SlotTemplate::new(Regular, 5, 6), SlotTemplate::new(OnCall, 19, 4)],
            ),
            fixed(12, vec![SlotTemplate::new(OnCall, 24, 4)]),
            fixed(13, vec![SlotTemplate::new(OnCall, 24, 6)]),
        ]);
        HorizonTemplate {
            id: "fixed-13d".into(),
            name: "Table fixe 13 jours".into(),
            description: None,
            start,
            days: 13,
            pattern: DayPattern::Fixed { days },
            rules: Some(Rules::default()),
        }
    }

    /// Mois calendaire : jour de semaine 8 h×7 + garde 16 h×4, jour « vendredi »
    /// 5 h×6 + garde 19 h×4, jour « samedi » garde 24 h×4.
    /// Le rôle du vendredi tombe sur le sixième jour de la semaine civile.
    pub fn month(start: NaiveDate, days: u32) -> HorizonTemplate {
        HorizonTemplate {
            id: format!("month-{}", start.format("%Y-%m")),
            name: format!("Mois {}", start.format("%m/%Y")),
            description: None,
            start,
            days,
            pattern: DayPattern::Weekly {
                weekday: vec![
                    SlotTemplate::new(Regular, 8, 7),
                    SlotTemplate::new(OnCall, 16, 4),
                ],
                friday: vec![
                    SlotTemplate::new(Regular, 5, 6),
                    SlotTemplate::new(OnCall, 19, 4),
                ],
                saturday: vec![SlotTemplate::new(OnCall, 24, 4)],
                friday_is: Weekday::Sat,
            },
            rules: Some(Rules::default()),
        }
    }

    pub fn by_name(name: &str) -> Option<HorizonTemplate> {
        let sept = NaiveDate::from_ymd_opt(2025, 9, 1)?;
        match name {
            "fixed-13d" => Some(fixed_13_days(sept)),
            "month-2025-09" => Some(month(sept, 30)),
            _ => None,
        }
    }
}
