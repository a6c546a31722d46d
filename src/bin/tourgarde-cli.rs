#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tourgarde::{
    generate_horizon, io, load_rules_from_file, load_template_from_file, presets,
    scheduler::{
        ObjectiveMode, SchedError, Scheduler, SearchOptions, SearchOrder, DEFAULT_TIME_LIMIT,
    },
    template::export_template_json,
    Horizon, LpSolver, Rules,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de génération de tableaux de garde
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

/// Origine de l'horizon (une seule à la fois)
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Source {
    /// Gabarit JSON
    #[arg(long)]
    template: Option<PathBuf>,
    /// Gabarit intégré (`fixed-13d`, `month-2025-09`)
    #[arg(long)]
    preset: Option<String>,
    /// Liste explicite `date,kind,hours,required`
    #[arg(long)]
    slots_csv: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lister les créneaux générés
    Slots {
        #[command(flatten)]
        source: Source,
    },

    /// Chercher la plus petite équipe faisable
    Solve {
        #[command(flatten)]
        source: Source,
        #[arg(long, default_value_t = 15)]
        min: usize,
        #[arg(long, default_value_t = 50)]
        max: usize,
        /// `balance` ou `headcount`
        #[arg(long, default_value = "balance")]
        objective: ObjectiveMode,
        /// `linear` ou `bisect`
        #[arg(long, default_value = "linear")]
        order: SearchOrder,
        /// Règles JSON, prioritaires sur celles de la source
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Budget par candidat, en secondes
        #[arg(long, default_value_t = DEFAULT_TIME_LIMIT.as_secs())]
        time_limit_secs: u64,
        #[arg(long)]
        out_csv: Option<PathBuf>,
        #[arg(long)]
        out_json: Option<PathBuf>,
    },

    /// Vérifier un tableau CSV contre les règles
    Check {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        roster: PathBuf,
        /// Règles JSON, prioritaires sur celles de la source
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Écrire un gabarit intégré en JSON éditable
    ExportTemplate {
        #[arg(long)]
        preset: String,
        #[arg(long)]
        out: PathBuf,
    },
}

/// Horizon et règles de la source ; un fichier `--rules` remplace les règles.
fn load_with_rules(source: &Source, rules: Option<&Path>) -> Result<(Horizon, Rules)> {
    let (horizon, from_source) = load_source(source)?;
    match rules {
        Some(path) => Ok((horizon, load_rules_from_file(path)?)),
        None => Ok((horizon, from_source)),
    }
}

fn load_source(source: &Source) -> Result<(Horizon, Rules)> {
    if let Some(path) = &source.template {
        let template = load_template_from_file(path)?;
        let rules = template.rules_or_default();
        return Ok((generate_horizon(&template)?, rules));
    }
    if let Some(name) = &source.preset {
        let template = presets::by_name(name)
            .with_context(|| format!("unknown preset: {name} (known: {:?})", presets::NAMES))?;
        let rules = template.rules_or_default();
        return Ok((generate_horizon(&template)?, rules));
    }
    if let Some(path) = &source.slots_csv {
        let entries = io::import_slots_csv(path)?;
        return Ok((Horizon::from_entries(entries)?, Rules::default()));
    }
    anyhow::bail!("one of --template, --preset or --slots-csv is required")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Slots { source } => {
            let (horizon, _) = load_source(&source)?;
            for s in horizon.slots() {
                println!(
                    "{} | {} | {} h | x{}",
                    s.date, s.kind, s.duration_hours, s.required
                );
            }
            0
        }
        Commands::Solve {
            source,
            min,
            max,
            objective,
            order,
            rules,
            time_limit_secs,
            out_csv,
            out_json,
        } => {
            let (horizon, rules) = load_with_rules(&source, rules.as_deref())?;
            let opts = SearchOptions {
                min_staff: min,
                max_staff: max,
                objective,
                order,
                time_limit: Some(Duration::from_secs(time_limit_secs)),
            };
            let scheduler = Scheduler::new(horizon, rules).with_options(opts);
            match scheduler.solve(&LpSolver::new()) {
                Ok(solution) => {
                    for r in &solution.records {
                        println!("{} | {} | {}", r.date, r.kind, r.person);
                    }
                    let meta = solution.meta();
                    println!(
                        "OK: pool {} | staff used {} | status {:?} | load {}..{} h",
                        meta.staff_pool,
                        meta.staff_count_used,
                        meta.status,
                        meta.load_min,
                        meta.load_max
                    );
                    let inconclusive = solution.inconclusive();
                    if !inconclusive.is_empty() {
                        eprintln!("Inconclusive staff counts (time limit): {inconclusive:?}");
                    }
                    if let Some(path) = out_csv {
                        io::export_roster_csv(path, scheduler.horizon(), &solution.records)?;
                    }
                    if let Some(path) = out_json {
                        io::export_report_json(path, &solution.report())?;
                    }
                    0
                }
                Err(err @ SchedError::Exhausted { .. }) => {
                    eprintln!("{err}");
                    // Code 2 = aucun effectif faisable dans la plage
                    2
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Check {
            source,
            roster,
            rules,
        } => {
            let (horizon, rules) = load_with_rules(&source, rules.as_deref())?;
            let records = io::import_roster_csv(&roster)?;
            let scheduler = Scheduler::new(horizon, rules);
            let violations = scheduler.detect_violations(&records);
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                for v in &violations {
                    let person = v.person.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
                    let shift = v.shift.map(|k| k.to_string()).unwrap_or_default();
                    eprintln!("{:?} | {} | {} | {} | {}", v.kind, v.date, shift, person, v.detail);
                }
                2
            }
        }
        Commands::ExportTemplate { preset, out } => {
            let template = presets::by_name(&preset)
                .with_context(|| format!("unknown preset: {preset}"))?;
            export_template_json(&out, &template)?;
            println!("Template {} written to {}", template.id, out.display());
            0
        }
    };

    std::process::exit(code);
}
