//! Conflict detection module.
//!
//! Two entry points share the same separation thresholds:
//!
//! - [`ConflictEngine::analyze`] samples complete trajectories offline,
//!   reports every separation violation and computes how long the waiting
//!   agent must hold.
//! - [`ConflictEngine::check`] compares a snapshot of current positions
//!   for real-time display.
//!
//! Right of way goes to the agent whose id sorts first as a string, so
//! "Drone_10" outranks "Drone_2".

use crate::models::{
    ConflictEvent, HoldInstruction, LiveWarning, LoiterDelay, Position3, Severity,
    TrajectorySample,
};
use crate::rules::SafetyConfig;
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sampling step for offline trajectory analysis.
pub const ANALYSIS_STEP_S: f64 = 0.5;
/// Step used when searching for the priority agent to clear the conflict.
pub const WAIT_STEP_S: f64 = 0.1;
/// Extra clearance beyond the safety distance before the waiting agent may go.
pub const CLEARANCE_BUFFER_M: f64 = 2.0;
/// Floor for a wait that ends when the priority agent clears.
pub const MIN_ESCAPE_WAIT_S: f64 = 3.0;
/// Margin added when waiting for the priority agent to finish its mission.
pub const COMPLETION_MARGIN_S: f64 = 5.0;
/// Floor for a wait that ends when the priority agent finishes.
pub const MIN_COMPLETION_WAIT_S: f64 = 5.0;

/// Snapshot of engine state for status displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub trajectory_conflicts: usize,
    pub current_warnings: usize,
    pub safety_distance: f64,
    pub critical_distance: f64,
    pub check_interval: f64,
}

/// Separation checker over trajectories and position snapshots.
///
/// Apart from the last real-time warning list the engine keeps no state
/// between calls.
#[derive(Debug, Clone, Default)]
pub struct ConflictEngine {
    config: SafetyConfig,
    warnings: Vec<LiveWarning>,
}

impl ConflictEngine {
    pub fn new(config: SafetyConfig) -> Self {
        tracing::info!(
            "Conflict engine initialized with safety distance: {}m",
            config.safety_distance
        );
        Self {
            config,
            warnings: Vec::new(),
        }
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// Replace the safety thresholds. Takes effect on the next check.
    pub fn update_config(&mut self, config: SafetyConfig) {
        tracing::info!(
            "Safety configuration updated: distance {}m -> {}m",
            self.config.safety_distance,
            config.safety_distance
        );
        self.config = config;
    }

    /// Classify a separation distance, `None` when it is not a violation.
    pub fn classify(&self, distance: f64) -> Option<Severity> {
        if distance < self.config.critical_distance {
            Some(Severity::Critical)
        } else if distance < self.config.safety_distance {
            Some(Severity::Warning)
        } else {
            None
        }
    }

    /// Analyze every pair of trajectories for separation violations.
    ///
    /// Input order does not matter; ids are sorted before pairing. Pairs
    /// where either trajectory is empty are skipped.
    pub fn analyze<'a, I>(&self, trajectories: I) -> Vec<ConflictEvent>
    where
        I: IntoIterator<Item = (&'a str, &'a Trajectory)>,
    {
        let mut agents: Vec<(&str, &Trajectory)> = trajectories.into_iter().collect();
        agents.sort_by(|a, b| a.0.cmp(b.0));

        tracing::info!("Analyzing trajectory conflicts for {} agents", agents.len());

        let mut conflicts = Vec::new();
        for i in 0..agents.len() {
            for j in (i + 1)..agents.len() {
                let (priority_id, priority) = agents[i];
                let (waiting_id, waiting) = agents[j];
                if priority.is_empty() || waiting.is_empty() {
                    continue;
                }

                let found = self.analyze_pair(priority_id, priority, waiting_id, waiting);
                tracing::info!(
                    "Trajectory analysis: {} vs {} - found {} potential conflicts",
                    priority_id,
                    waiting_id,
                    found.len()
                );
                conflicts.extend(found);
            }
        }

        tracing::info!("Total trajectory conflicts found: {}", conflicts.len());
        conflicts
    }

    /// Conflicts between one priority/waiting pair, sampled every
    /// [`ANALYSIS_STEP_S`] over `[0, max end time)`.
    fn analyze_pair(
        &self,
        priority_id: &str,
        priority: &Trajectory,
        waiting_id: &str,
        waiting: &Trajectory,
    ) -> Vec<ConflictEvent> {
        let (Some(end1), Some(end2)) = (priority.end_time(), waiting.end_time()) else {
            return Vec::new();
        };
        let max_time = end1.max(end2);

        let mut conflicts = Vec::new();
        let mut step: u64 = 0;
        loop {
            let t = step as f64 * ANALYSIS_STEP_S;
            if t >= max_time {
                break;
            }
            step += 1;

            let (Some(pos1), Some(pos2)) = (priority.position_at(t), waiting.position_at(t))
            else {
                continue;
            };
            let distance = pos1.position.distance_to(&pos2.position);
            let Some(severity) = self.classify(distance) else {
                continue;
            };

            let waypoint_index_a = priority.nearest_waypoint_index(t).unwrap_or(0);
            let waypoint_index_b = waiting.nearest_waypoint_index(t).unwrap_or(0);
            let wait_time = self.wait_time(priority, t, &pos2.position);

            tracing::warn!(
                "Conflict detected: {}(WP{}) vs {}(WP{}) at {:.1}s distance {:.2}m",
                priority_id,
                waypoint_index_a,
                waiting_id,
                waypoint_index_b,
                t,
                distance
            );

            conflicts.push(ConflictEvent {
                time: t,
                distance,
                agent_a: priority_id.to_string(),
                agent_b: waiting_id.to_string(),
                position_a: pos1.position,
                position_b: pos2.position,
                waypoint_index_a,
                waypoint_index_b,
                severity,
                wait_time,
                priority_agent: priority_id.to_string(),
                waiting_agent: waiting_id.to_string(),
            });
        }

        conflicts
    }

    /// How long the waiting agent, frozen at `waiting_position`, must hold
    /// after a conflict at `conflict_time`.
    ///
    /// Walks the priority trajectory in [`WAIT_STEP_S`] steps until it is
    /// more than `safety_distance + CLEARANCE_BUFFER_M` away. If it never
    /// gets that far before its mission ends, the wait lasts until the end
    /// plus [`COMPLETION_MARGIN_S`].
    pub fn wait_time(
        &self,
        priority: &Trajectory,
        conflict_time: f64,
        waiting_position: &Position3,
    ) -> f64 {
        let Some(end_time) = priority.end_time() else {
            return MIN_COMPLETION_WAIT_S;
        };
        if !conflict_time.is_finite() {
            return MIN_COMPLETION_WAIT_S;
        }
        let clearance = self.config.safety_distance + CLEARANCE_BUFFER_M;

        let mut step: u64 = 0;
        loop {
            let t = conflict_time + step as f64 * WAIT_STEP_S;
            if t >= end_time {
                break;
            }
            step += 1;

            let Some(sample) = priority.position_at(t) else {
                continue;
            };
            if sample.position.distance_to(waiting_position) > clearance {
                let wait = t - conflict_time;
                tracing::debug!(
                    "Calculated wait time: {:.1}s (priority agent clears safety distance)",
                    wait
                );
                return wait.max(MIN_ESCAPE_WAIT_S);
            }
        }

        let completion_wait = end_time - conflict_time + COMPLETION_MARGIN_S;
        tracing::debug!("Using mission completion wait time: {:.1}s", completion_wait);
        completion_wait.max(MIN_COMPLETION_WAIT_S)
    }

    /// Real-time separation check over a position snapshot.
    ///
    /// Only reports; computing and applying remedies is left to the caller.
    pub fn check(
        &mut self,
        positions: &BTreeMap<String, Position3>,
        current_time: f64,
    ) -> Vec<LiveWarning> {
        self.warnings.clear();

        let agents: Vec<(&String, &Position3)> = positions.iter().collect();
        for i in 0..agents.len() {
            for j in (i + 1)..agents.len() {
                let (id1, pos1) = agents[i];
                let (id2, pos2) = agents[j];

                let distance = pos1.distance_to(pos2);
                let Some(severity) = self.classify(distance) else {
                    continue;
                };

                tracing::warn!(
                    "[{}] {} <-> {} @ {:.2}m (t={:.1}s)",
                    severity,
                    id1,
                    id2,
                    distance,
                    current_time
                );
                self.warnings.push(LiveWarning {
                    agent_a: id1.clone(),
                    agent_b: id2.clone(),
                    distance,
                    time: current_time,
                    midpoint: pos1.midpoint(pos2),
                    severity,
                });
            }
        }

        self.warnings.clone()
    }

    /// Warnings produced by the most recent [`ConflictEngine::check`].
    pub fn warnings(&self) -> &[LiveWarning] {
        &self.warnings
    }

    /// Drop the retained warnings, returning how many there were.
    pub fn clear_warnings(&mut self) -> usize {
        let count = self.warnings.len();
        self.warnings.clear();
        tracing::info!("Cleared {} collision warnings", count);
        count
    }

    pub fn summary(&self, trajectory_conflicts: &[ConflictEvent]) -> ConflictSummary {
        ConflictSummary {
            trajectory_conflicts: trajectory_conflicts.len(),
            current_warnings: self.warnings.len(),
            safety_distance: self.config.safety_distance,
            critical_distance: self.config.critical_distance,
            check_interval: self.config.check_interval,
        }
    }
}

/// Order a pair of agent ids as (priority, waiting).
pub fn right_of_way<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Playback time after applying loiter delays.
///
/// Only the first delay whose start time has been reached applies, even
/// when several are stored.
pub fn effective_time(delays: &[LoiterDelay], t: f64) -> f64 {
    delays
        .iter()
        .find(|delay| t >= delay.start_time)
        .map(|delay| delay.start_time.max(t - delay.duration))
        .unwrap_or(t)
}

/// Trajectory lookup at `t` with loiter delays applied.
pub fn position_with_loiter(
    trajectory: &Trajectory,
    delays: &[LoiterDelay],
    t: f64,
) -> Option<TrajectorySample> {
    trajectory.position_at(effective_time(delays, t))
}

/// One hold per waiting agent, taken from its earliest conflict.
///
/// Earliest means smallest conflict time across every pair the agent
/// waits in, not the first pair in id order.
pub fn plan_holds(conflicts: &[ConflictEvent]) -> Vec<HoldInstruction> {
    let mut earliest: BTreeMap<&str, &ConflictEvent> = BTreeMap::new();
    for conflict in conflicts {
        earliest
            .entry(conflict.waiting_agent.as_str())
            .and_modify(|current| {
                if conflict.time < current.time {
                    *current = conflict;
                }
            })
            .or_insert(conflict);
    }

    earliest
        .into_values()
        .map(|conflict| HoldInstruction {
            agent_id: conflict.waiting_agent.clone(),
            waypoint_index: conflict.waypoint_index_b,
            start_time: conflict.time,
            duration_s: conflict.wait_time,
        })
        .collect()
}
