use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifiant d'une personne : index dans `[0, n)` pour une itération de recherche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(u32);

impl PersonId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type de créneau. Toutes les règles de repos reposent sur cette distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftKind {
    /// Garde longue (16/19/24 h), soumise aux règles de repos et aux plafonds.
    #[serde(alias = "long", alias = "garde")]
    OnCall,
    /// Journée régulière (5/8 h).
    Regular,
}

impl ShiftKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftKind::OnCall => "oncall",
            ShiftKind::Regular => "regular",
        }
    }

    pub fn is_on_call(self) -> bool {
        matches!(self, ShiftKind::OnCall)
    }
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oncall" | "on-call" | "long" | "garde" => Ok(ShiftKind::OnCall),
            "regular" | "day" | "jour" => Ok(ShiftKind::Regular),
            other => Err(format!("unknown shift kind: {other}")),
        }
    }
}

/// Créneau à pourvoir. Identité = (date, kind) ; `index` est sa position dense dans l'horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSlot {
    pub index: usize,
    /// Décalage en jours depuis le début de l'horizon.
    pub day: u32,
    pub date: NaiveDate,
    pub kind: ShiftKind,
    pub duration_hours: u32,
    /// Nombre exact de personnes requises.
    pub required: u32,
}

/// Horizon de planification : créneaux ordonnés + index par jour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Horizon {
    start: NaiveDate,
    days: u32,
    slots: Vec<ShiftSlot>,
    by_day: Vec<Vec<usize>>,
}

impl Horizon {
    /// Construit l'horizon ; les créneaux doivent déjà porter `day` < `days`
    /// et un `index` égal à leur position.
    pub(crate) fn new(start: NaiveDate, days: u32, slots: Vec<ShiftSlot>) -> Self {
        let mut by_day = vec![Vec::new(); days as usize];
        for slot in &slots {
            by_day[slot.day as usize].push(slot.index);
        }
        Self {
            start,
            days,
            slots,
            by_day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }
    pub fn days(&self) -> u32 {
        self.days
    }
    pub fn slots(&self) -> &[ShiftSlot] {
        &self.slots
    }
    pub fn slot(&self, index: usize) -> &ShiftSlot {
        &self.slots[index]
    }

    /// Indices des créneaux du jour `day` (vide hors horizon).
    pub fn slots_on_day(&self, day: i64) -> &[usize] {
        if day < 0 || day >= i64::from(self.days) {
            return &[];
        }
        &self.by_day[day as usize]
    }

    /// Créneau `(day, kind)` s'il existe.
    pub fn slot_at(&self, day: i64, kind: ShiftKind) -> Option<usize> {
        self.slots_on_day(day)
            .iter()
            .copied()
            .find(|&idx| self.slots[idx].kind == kind)
    }

    pub fn find(&self, date: NaiveDate, kind: ShiftKind) -> Option<&ShiftSlot> {
        let day = date.signed_duration_since(self.start).num_days();
        self.slot_at(day, kind).map(|idx| &self.slots[idx])
    }

    pub fn on_call_slots(&self) -> impl Iterator<Item = &ShiftSlot> {
        self.slots.iter().filter(|s| s.kind.is_on_call())
    }

    pub fn total_required_hours(&self) -> u64 {
        self.slots
            .iter()
            .map(|s| u64::from(s.duration_hours) * u64::from(s.required))
            .sum()
    }
}

/// Ligne du tableau de garde : une personne sur un créneau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RosterRecord {
    pub date: NaiveDate,
    pub kind: ShiftKind,
    pub person: PersonId,
}

/// Statut de résolution tel que rapporté à l'appelant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Optimal,
    Feasible,
}

/// Métadonnées d'une exécution réussie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    /// Taille de l'équipe candidate retenue.
    pub staff_pool: usize,
    /// Effectif réellement mobilisé : drapeaux actifs en mode effectif,
    /// sinon personnes distinctes.
    pub staff_count_used: usize,
    pub status: RunStatus,
    pub load_min: u64,
    pub load_max: u64,
}

/// Résultat exporté : métadonnées + lignes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterReport {
    pub meta: RunMeta,
    pub records: Vec<RosterRecord>,
}
