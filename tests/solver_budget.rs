#![forbid(unsafe_code)]
use std::time::{Duration, Instant};
use tourgarde::scheduler::build_model;
use tourgarde::{generate_horizon, presets, LpSolver, ObjectiveMode, Solver};

#[cfg(target_os = "linux")]
fn live_threads() -> usize {
    let status = std::fs::read_to_string("/proc/self/status").unwrap();
    status
        .lines()
        .find_map(|l| l.strip_prefix("Threads:"))
        .and_then(|n| n.trim().parse().ok())
        .unwrap()
}

/// Un budget expiré rend la main sans laisser de calcul en arrière-plan.
#[cfg(target_os = "linux")]
#[test]
fn expired_budget_leaves_no_thread_behind() {
    let template = presets::by_name("month-2025-09").unwrap();
    let horizon = generate_horizon(&template).unwrap();
    let built = build_model(
        &horizon,
        &template.rules_or_default(),
        15,
        ObjectiveMode::MinimizeHeadcount,
    );

    let before = live_threads();
    let started = Instant::now();
    let out = LpSolver
        .solve(&built.model, Some(Duration::from_millis(50)))
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(live_threads(), before, "status {:?}", out.status);
    assert!(elapsed < Duration::from_secs(10), "{elapsed:?}");
}
