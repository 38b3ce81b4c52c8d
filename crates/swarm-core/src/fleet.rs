//! Agent bookkeeping for one mission batch.
//!
//! The fleet owns the projector, the flight profile and every agent's
//! waypoints, trajectory and loiter delays. It is the single writer for
//! loiter delays; the conflict engine only ever sees read-only views.

use crate::conflict::{effective_time, ConflictEngine};
use crate::error::{CoreError, Result};
use crate::geo::{self, GeoProjector};
use crate::models::{
    ConflictEvent, FlightPhase, HoldInstruction, LiveWarning, LoiterDelay, Position3,
    TrajectorySample, Waypoint,
};
use crate::rules::FlightProfile;
use crate::trajectory::{Trajectory, TrajectorySynthesizer};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Slack on the check interval so a playback step equal to the interval
/// is not throttled by float rounding.
const THROTTLE_TOLERANCE_S: f64 = 1e-9;

/// One simulated drone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub waypoints: Vec<Waypoint>,
    pub trajectory: Trajectory,
    /// (lat, lon) of the first waypoint
    pub takeoff_position: (f64, f64),
    #[serde(default)]
    pub loiter_delays: Vec<LoiterDelay>,
}

impl Agent {
    /// Sum of every hold applied to this agent.
    pub fn total_loiter(&self) -> f64 {
        self.loiter_delays.iter().map(|delay| delay.duration).sum()
    }
}

/// Where an agent is at a given playback time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_id: String,
    pub position: Position3,
    pub phase: FlightPhase,
    /// Trajectory time after loiter delays were applied
    pub mission_time: f64,
    pub holding: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Fleet {
    projector: GeoProjector,
    profile: FlightProfile,
    agents: BTreeMap<String, Agent>,
    last_check: Option<f64>,
}

impl Fleet {
    pub fn new(profile: FlightProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            ..Self::default()
        })
    }

    pub fn projector(&self) -> &GeoProjector {
        &self.projector
    }

    pub fn profile(&self) -> &FlightProfile {
        &self.profile
    }

    /// Anchor the local frame explicitly. Ignored once an origin exists.
    pub fn set_origin(&mut self, lat: f64, lon: f64) {
        if self.projector.is_origin_set() {
            tracing::warn!("Coordinate origin already set, ignoring {:.6}, {:.6}", lat, lon);
            return;
        }
        self.projector.set_origin(lat, lon);
    }

    /// Add or replace an agent's mission and synthesize its trajectory.
    ///
    /// The first waypoint loaded into an empty batch becomes the origin.
    pub fn load_mission(
        &mut self,
        id: impl Into<String>,
        waypoints: Vec<Waypoint>,
    ) -> Result<&Agent> {
        let id = id.into();
        for (index, wp) in waypoints.iter().enumerate() {
            if !geo::validate(wp.lat, wp.lon) {
                return Err(CoreError::InvalidCoordinate {
                    agent_id: id,
                    index,
                    lat: wp.lat,
                    lon: wp.lon,
                });
            }
        }

        if let (false, Some(first)) = (self.projector.is_origin_set(), waypoints.first()) {
            self.projector.set_origin(first.lat, first.lon);
        }

        let trajectory =
            TrajectorySynthesizer::new(&self.projector, &self.profile).synthesize(&waypoints);
        let takeoff_position = waypoints
            .first()
            .map(|wp| (wp.lat, wp.lon))
            .unwrap_or_default();

        tracing::info!(
            "Loaded mission for {}: {} waypoints, {} trajectory samples, {:.1}s",
            id,
            waypoints.len(),
            trajectory.len(),
            trajectory.end_time().unwrap_or(0.0)
        );

        let agent = Agent {
            id: id.clone(),
            waypoints,
            trajectory,
            takeoff_position,
            loiter_delays: Vec::new(),
        };
        let slot = match self.agents.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.insert(agent);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(agent),
        };
        Ok(slot)
    }

    /// Switch phase timing and regenerate every trajectory.
    pub fn set_profile(&mut self, profile: FlightProfile) -> Result<()> {
        profile.validate()?;
        self.profile = profile;
        self.regenerate();
        Ok(())
    }

    /// Rebuild all trajectories from the stored waypoints.
    pub fn regenerate(&mut self) {
        let synthesizer = TrajectorySynthesizer::new(&self.projector, &self.profile);
        for agent in self.agents.values_mut() {
            agent.trajectory = synthesizer.synthesize(&agent.waypoints);
        }
        tracing::debug!("Regenerated {} trajectories", self.agents.len());
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Agents in priority order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn effective_time(&self, id: &str, t: f64) -> Option<f64> {
        self.agents
            .get(id)
            .map(|agent| effective_time(&agent.loiter_delays, t))
    }

    /// Loiter-aware trajectory lookup.
    pub fn position_at(&self, id: &str, t: f64) -> Option<TrajectorySample> {
        let agent = self.agents.get(id)?;
        agent
            .trajectory
            .position_at(effective_time(&agent.loiter_delays, t))
    }

    /// Loiter-aware sample tagged with the nearest waypoint index, so
    /// interpolated positions still name the leg the agent is on.
    pub fn sample_at(&self, id: &str, t: f64) -> Option<TrajectorySample> {
        let agent = self.agents.get(id)?;
        let mission_time = effective_time(&agent.loiter_delays, t);
        let mut sample = agent.trajectory.position_at(mission_time)?;
        if sample.waypoint_index.is_none() {
            sample.waypoint_index = agent.trajectory.nearest_waypoint_index(mission_time);
        }
        Some(sample)
    }

    /// Position and phase for display; the phase reads `Loiter` while a
    /// hold is freezing the agent's clock.
    pub fn state_at(&self, id: &str, t: f64) -> Option<AgentState> {
        let agent = self.agents.get(id)?;
        let mission_time = effective_time(&agent.loiter_delays, t);
        let sample = agent.trajectory.position_at(mission_time)?;

        let holding = agent
            .loiter_delays
            .iter()
            .find(|delay| t >= delay.start_time)
            .map(|delay| t < delay.start_time + delay.duration)
            .unwrap_or(false);

        Some(AgentState {
            agent_id: agent.id.clone(),
            position: sample.position,
            phase: if holding { FlightPhase::Loiter } else { sample.phase },
            mission_time,
            holding,
        })
    }

    /// Snapshot of every agent that has a position at `t`.
    pub fn positions_at(&self, t: f64) -> BTreeMap<String, Position3> {
        self.agents
            .keys()
            .filter_map(|id| {
                self.position_at(id, t)
                    .map(|sample| (id.clone(), sample.position))
            })
            .collect()
    }

    /// Simulation horizon: latest trajectory end plus that agent's holds.
    pub fn max_time(&self) -> f64 {
        self.agents
            .values()
            .filter_map(|agent| {
                agent
                    .trajectory
                    .end_time()
                    .map(|end| end + agent.total_loiter())
            })
            .fold(0.0, f64::max)
    }

    pub fn apply_hold(&mut self, id: &str, start_time: f64, duration: f64) -> Result<()> {
        let agent = self
            .agents
            .get_mut(id)
            .ok_or_else(|| CoreError::UnknownAgent(id.to_string()))?;
        agent.loiter_delays.push(LoiterDelay {
            start_time,
            duration,
        });
        tracing::info!(
            "Applied {:.1}s hold to {} at t={:.1}s",
            duration,
            id,
            start_time
        );
        Ok(())
    }

    pub fn apply_holds(&mut self, holds: &[HoldInstruction]) -> Result<()> {
        for hold in holds {
            self.apply_hold(&hold.agent_id, hold.start_time, hold.duration_s)?;
        }
        Ok(())
    }

    /// Offline analysis over the planned trajectories.
    pub fn analyze(&self, engine: &ConflictEngine) -> Vec<ConflictEvent> {
        engine.analyze(
            self.agents
                .iter()
                .map(|(id, agent)| (id.as_str(), &agent.trajectory)),
        )
    }

    /// Real-time check at playback time `now`.
    ///
    /// Returns `None` when less than the configured check interval has
    /// passed since the previous check. Moving backwards in time always
    /// triggers a check.
    pub fn tick(&mut self, engine: &mut ConflictEngine, now: f64) -> Option<Vec<LiveWarning>> {
        if let Some(last) = self.last_check {
            let elapsed = now - last;
            let interval = engine.config().check_interval - THROTTLE_TOLERANCE_S;
            if elapsed >= 0.0 && elapsed < interval {
                return None;
            }
        }
        self.last_check = Some(now);

        let positions = self.positions_at(now);
        Some(engine.check(&positions, now))
    }

    /// Back to t=0: drop every hold and the check throttle.
    pub fn reset(&mut self) {
        for agent in self.agents.values_mut() {
            agent.loiter_delays.clear();
        }
        self.last_check = None;
        tracing::info!("Simulation reset completed");
    }

    /// Forget every agent and the origin, ready for a new batch.
    pub fn clear(&mut self) {
        self.agents.clear();
        self.projector = GeoProjector::new();
        self.last_check = None;
    }
}
