//! Fixed-step playback of a loaded fleet with real-time separation checks.

use serde::Serialize;
use std::collections::BTreeMap;
use swarm_core::{CollisionLog, ConflictEngine, FlightPhase, Fleet, Severity};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackReport {
    pub duration_s: f64,
    pub ticks: u64,
    /// Ticks that ran a separation check
    pub checks: u64,
    pub warning_events: usize,
    pub critical_events: usize,
    pub first_warning_time: Option<f64>,
    pub last_warning_time: Option<f64>,
}

/// Step the fleet from t=0 to its horizon, recording every live warning.
///
/// Loiter delays already applied to the fleet shape the playback.
pub fn run_playback(
    fleet: &mut Fleet,
    engine: &mut ConflictEngine,
    step: f64,
    log: &mut CollisionLog,
) -> PlaybackReport {
    let horizon = fleet.max_time();
    let mut report = PlaybackReport {
        duration_s: horizon,
        ..PlaybackReport::default()
    };
    if !(step.is_finite() && step > 0.0) {
        tracing::warn!("Playback step must be positive, got {}", step);
        return report;
    }

    engine.clear_warnings();
    let mut phases: BTreeMap<String, FlightPhase> = BTreeMap::new();
    let mut tick = 0u64;

    loop {
        let now = tick as f64 * step;
        if now > horizon {
            break;
        }
        tick += 1;

        for agent in fleet.agents() {
            let Some(state) = fleet.state_at(&agent.id, now) else {
                continue;
            };
            let previous = phases.insert(agent.id.clone(), state.phase);
            if previous != Some(state.phase) {
                tracing::debug!("t={:.1}s {} -> {}", now, agent.id, state.phase);
            }
        }

        let Some(warnings) = fleet.tick(engine, now) else {
            continue;
        };
        report.checks += 1;

        for warning in &warnings {
            let sample_a = fleet.sample_at(&warning.agent_a, now);
            let sample_b = fleet.sample_at(&warning.agent_b, now);
            log.record_warning(warning, sample_a.as_ref(), sample_b.as_ref());

            match warning.severity {
                Severity::Critical => report.critical_events += 1,
                Severity::Warning => report.warning_events += 1,
            }
            report.first_warning_time.get_or_insert(now);
            report.last_warning_time = Some(now);
        }
    }

    report.ticks = tick;
    tracing::info!(
        "Playback finished: {} ticks, {} checks, {} warnings, {} critical",
        report.ticks,
        report.checks,
        report.warning_events,
        report.critical_events
    );
    report
}
