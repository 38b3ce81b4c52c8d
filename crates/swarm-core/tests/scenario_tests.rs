//! End-to-end scenarios: waypoints in, conflicts and holds out.

use swarm_core::*;

fn sample(t: f64, x: f64, y: f64, z: f64) -> TrajectorySample {
    TrajectorySample::new(Position3::new(x, y, z), t, FlightPhase::Auto, None)
}

fn engine() -> ConflictEngine {
    ConflictEngine::new(SafetyConfig {
        safety_distance: 5.0,
        critical_distance: 3.0,
        ..SafetyConfig::default()
    })
}

#[test]
fn origin_offset_projects_to_expected_meters() {
    let projector = GeoProjector::with_origin(24.0, 121.0);
    let (x, y) = projector.to_local(24.001, 121.001);

    assert!((x - 101.5).abs() < 0.2, "x = {x}");
    assert!((y - 111.1).abs() < 0.05, "y = {y}");
}

#[test]
fn head_on_crossing_produces_one_warning_at_twelve_seconds() {
    let priority = Trajectory::new(vec![sample(0.0, -60.0, 0.0, 10.0), sample(24.0, 60.0, 0.0, 10.0)]);
    let waiting = Trajectory::new(vec![sample(0.0, 60.0, 4.0, 10.0), sample(24.0, -60.0, 4.0, 10.0)]);

    let conflicts = engine().analyze([("Drone_1", &priority), ("Drone_2", &waiting)]);
    assert_eq!(conflicts.len(), 1);
    assert!((conflicts[0].time - 12.0).abs() < 1e-9);
    assert_eq!(conflicts[0].severity, Severity::Warning);
    // no indexed samples, attributed to waypoint 0
    assert_eq!(conflicts[0].waypoint_index_a, 0);
    assert_eq!(conflicts[0].waypoint_index_b, 0);
}

#[test]
fn wait_ends_at_floor_once_priority_clears() {
    let priority = Trajectory::new(vec![sample(0.0, -28.8, 0.0, 10.0), sample(40.0, 67.2, 0.0, 10.0)]);
    let wait = engine().wait_time(&priority, 12.0, &Position3::new(0.0, 0.0, 10.0));
    assert!((wait - 3.0).abs() < 1e-6, "wait = {wait}");
}

#[test]
fn wait_runs_to_mission_end_when_priority_never_clears() {
    let priority = Trajectory::new(vec![sample(0.0, 0.0, 0.0, 10.0), sample(40.0, 2.0, 0.0, 10.0)]);
    let wait = engine().wait_time(&priority, 12.0, &Position3::new(1.0, 3.0, 10.0));
    assert!((wait - 33.0).abs() < 1e-9, "wait = {wait}");
}

#[test]
fn fleet_resolves_crossing_with_a_hold() {
    let mut fleet = Fleet::new(FlightProfile::default()).unwrap();
    fleet.set_origin(24.0, 121.0);
    let projector = fleet.projector().clone();
    let at = |x: f64, y: f64| projector.to_geodetic(x, y);

    let (a0, a1) = (at(-100.0, 0.0), at(100.0, 0.0));
    let (b0, b1) = (at(0.0, -100.0), at(0.0, 100.0));
    fleet
        .load_mission(
            "Drone_1",
            vec![Waypoint::home(a0.0, a0.1), Waypoint::navigate(a1.0, a1.1, 10.0)],
        )
        .unwrap();
    fleet
        .load_mission(
            "Drone_2",
            vec![Waypoint::home(b0.0, b0.1), Waypoint::navigate(b1.0, b1.1, 10.0)],
        )
        .unwrap();

    let mut engine = ConflictEngine::new(SafetyConfig::default());
    let conflicts = fleet.analyze(&engine);
    assert!(!conflicts.is_empty());
    assert!(conflicts.iter().all(|c| c.priority_agent == "Drone_1"));
    assert!(conflicts.iter().all(|c| c.waypoint_index_b == 1));

    let holds = plan_holds(&conflicts);
    assert_eq!(holds.len(), 1);
    assert_eq!(holds[0].agent_id, "Drone_2");
    fleet.apply_holds(&holds).unwrap();

    // replay with the hold applied: Drone_2 waits at the conflict point
    // and nothing is reported once the hold is over
    let hold_end = holds[0].start_time + holds[0].duration_s;
    let mut log = CollisionLog::new();
    let end = fleet.max_time();
    let mut step = 0u32;
    loop {
        let t = f64::from(step) * 0.1;
        if t > end {
            break;
        }
        step += 1;
        if let Some(warnings) = fleet.tick(&mut engine, t) {
            for warning in &warnings {
                log.record_warning(warning, None, None);
            }
        }
    }
    assert!(!log.is_empty());
    assert!(log
        .records()
        .iter()
        .all(|record| record.simulation_time < hold_end));
}
