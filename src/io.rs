use crate::model::{Horizon, PersonId, RosterRecord, RosterReport, ShiftKind};
use crate::template::SlotEntry;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Import de créneaux depuis CSV: header `date,kind,hours,required`
pub fn import_slots_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<SlotEntry>> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening slots {}", path.display()))?;
    let mut out = Vec::new();
    for (row, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("reading {}", path.display()))?;
        let line = row + 2;
        let date = parse_date(rec.get(0).context("missing date")?)
            .with_context(|| format!("invalid date on line {line}"))?;
        let kind: ShiftKind = rec
            .get(1)
            .context("missing kind")?
            .parse::<ShiftKind>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid kind on line {line}"))?;
        let hours = parse_count(rec.get(2).context("missing hours")?)
            .with_context(|| format!("invalid hours on line {line}"))?;
        if hours == 0 {
            bail!("invalid hours on line {line}: must be > 0");
        }
        let required = parse_count(rec.get(3).context("missing required")?)
            .with_context(|| format!("invalid required on line {line}"))?;
        out.push(SlotEntry::new(date, kind, hours, required));
    }
    Ok(out)
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got {raw}"))
}

fn parse_count(raw: &str) -> anyhow::Result<u32> {
    let raw = raw.trim();
    if raw.starts_with('-') {
        bail!("must be non-negative, got {raw}");
    }
    raw.parse::<u32>()
        .with_context(|| format!("expected an integer, got {raw}"))
}

/// Export CSV des lignes: header `person,date,kind,hours`
pub fn export_roster_csv<P: AsRef<Path>>(
    path: P,
    horizon: &Horizon,
    records: &[RosterRecord],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    w.write_record(["person", "date", "kind", "hours"])?;
    for r in records {
        let hours = horizon
            .find(r.date, r.kind)
            .map(|s| s.duration_hours.to_string())
            .unwrap_or_default();
        w.write_record([
            r.person.to_string(),
            r.date.to_string(),
            r.kind.to_string(),
            hours,
        ])?;
    }
    let bytes = w.into_inner().map_err(|e| anyhow::anyhow!("flushing csv: {e}"))?;
    write_atomic(path.as_ref(), &bytes)
}

/// Import d'un tableau exporté (la colonne `hours` est ignorée).
pub fn import_roster_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<RosterRecord>> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening roster {}", path.display()))?;
    let mut out = Vec::new();
    for (row, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("reading {}", path.display()))?;
        let line = row + 2;
        let person = parse_count(rec.get(0).context("missing person")?)
            .with_context(|| format!("invalid person on line {line}"))?;
        let date = parse_date(rec.get(1).context("missing date")?)
            .with_context(|| format!("invalid date on line {line}"))?;
        let kind: ShiftKind = rec
            .get(2)
            .context("missing kind")?
            .parse::<ShiftKind>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid kind on line {line}"))?;
        out.push(RosterRecord {
            date,
            kind,
            person: PersonId::new(person as usize),
        });
    }
    Ok(out)
}

/// Export JSON du rapport (jolie mise en forme)
pub fn export_report_json<P: AsRef<Path>>(path: P, report: &RosterReport) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(report)?;
    write_atomic(path.as_ref(), &json)
}

/// Écriture atomique : fichier temporaire voisin puis renommage.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut tmp = NamedTempFile::new_in(dir).context("creating temp file")?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("atomic rename to {}", path.display()))?;
    Ok(())
}
