//! Pre-defined swarm missions for testing.

use swarm_core::{FormationConfig, GeoProjector, Waypoint};

/// Side of the square each formation agent flies.
const SQUARE_SIDE_M: f64 = 80.0;
const SQUARE_ALTITUDE_M: f64 = 15.0;

/// Mission region offsets from the base, one per formation slot.
const REGION_OFFSETS: [(f64, f64); 4] = [
    (-100.0, -50.0), // southwest
    (100.0, -50.0),  // southeast
    (-100.0, 50.0),  // northwest
    (100.0, 50.0),   // northeast
];

/// A named set of agent missions.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub missions: Vec<(String, Vec<Waypoint>)>,
}

impl Scenario {
    pub fn agent_count(&self) -> usize {
        self.missions.len()
    }
}

/// Takeoff slots of the 2x2 grid, in local meters from the base.
///
/// Slots fill west to east, then south to north.
pub fn takeoff_grid(formation: &FormationConfig) -> [(f64, f64); 4] {
    let spacing = formation.formation_spacing_m;
    let east = formation.east_offset_m;
    [
        (east, 0.0),
        (east + spacing, 0.0),
        (east, spacing),
        (east + spacing, spacing),
    ]
}

/// Four agents taking off from a grid east of the base, each flying an
/// 80 m square in its own quadrant.
pub fn formation_mission(base_lat: f64, base_lon: f64, formation: &FormationConfig) -> Scenario {
    let projector = GeoProjector::with_origin(base_lat, base_lon);

    let missions = takeoff_grid(formation)
        .iter()
        .zip(REGION_OFFSETS)
        .enumerate()
        .map(|(i, (&(tx, ty), (ox, oy)))| {
            let (home_lat, home_lon) = projector.to_geodetic(tx, ty);
            let square = [
                (ox, oy),
                (ox + SQUARE_SIDE_M, oy),
                (ox + SQUARE_SIDE_M, oy + SQUARE_SIDE_M),
                (ox, oy + SQUARE_SIDE_M),
                (ox, oy),
            ];

            let mut waypoints = vec![Waypoint::home(home_lat, home_lon)];
            waypoints.extend(square.iter().map(|&(x, y)| {
                let (lat, lon) = projector.to_geodetic(x, y);
                Waypoint::navigate(lat, lon, SQUARE_ALTITUDE_M)
            }));

            (format!("Drone_{}", i + 1), waypoints)
        })
        .collect();

    Scenario {
        name: "formation".to_string(),
        missions,
    }
}

/// Two agents flying head-on along the east axis.
///
/// - Drone_1: west to east along y = 0
/// - Drone_2: east to west along y = `lateral_offset_m`
pub fn crossing_mission(
    base_lat: f64,
    base_lon: f64,
    half_length_m: f64,
    lateral_offset_m: f64,
) -> Scenario {
    let projector = GeoProjector::with_origin(base_lat, base_lon);
    let leg = |from: (f64, f64), to: (f64, f64)| {
        let (lat0, lon0) = projector.to_geodetic(from.0, from.1);
        let (lat1, lon1) = projector.to_geodetic(to.0, to.1);
        vec![
            Waypoint::home(lat0, lon0),
            Waypoint::navigate(lat1, lon1, SQUARE_ALTITUDE_M),
        ]
    };

    Scenario {
        name: "crossing".to_string(),
        missions: vec![
            (
                "Drone_1".to_string(),
                leg((-half_length_m, 0.0), (half_length_m, 0.0)),
            ),
            (
                "Drone_2".to_string(),
                leg(
                    (half_length_m, lateral_offset_m),
                    (-half_length_m, lateral_offset_m),
                ),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::MissionCommand;

    #[test]
    fn test_formation_creates_four_agents() {
        let scenario = formation_mission(24.0, 121.0, &FormationConfig::default());
        assert_eq!(scenario.agent_count(), 4);
        assert_eq!(scenario.name, "formation");

        let ids: Vec<_> = scenario.missions.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["Drone_1", "Drone_2", "Drone_3", "Drone_4"]);

        for (_, waypoints) in &scenario.missions {
            assert_eq!(waypoints.len(), 6);
            assert_eq!(waypoints[0].command, MissionCommand::Home);
            assert_eq!(waypoints[0].altitude_m, 0.0);
            assert!(waypoints[1..].iter().all(|wp| wp.altitude_m == 15.0));
            assert_eq!(waypoints[1], waypoints[5]);
        }
    }

    #[test]
    fn test_formation_takeoff_slots_are_spaced() {
        let formation = FormationConfig::default();
        let scenario = formation_mission(24.0, 121.0, &formation);
        let projector = GeoProjector::with_origin(24.0, 121.0);

        let homes: Vec<_> = scenario
            .missions
            .iter()
            .map(|(_, wps)| projector.to_local(wps[0].lat, wps[0].lon))
            .collect();
        assert!((homes[0].0 - 50.0).abs() < 1e-6);
        assert!((homes[1].0 - homes[0].0 - 6.0).abs() < 1e-6);
        assert!((homes[2].1 - homes[0].1 - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_formation_squares_sit_in_quadrants() {
        let scenario = formation_mission(24.0, 121.0, &FormationConfig::default());
        let projector = GeoProjector::with_origin(24.0, 121.0);

        let (x, y) = projector.to_local(
            scenario.missions[3].1[3].lat,
            scenario.missions[3].1[3].lon,
        );
        assert!((x - 180.0).abs() < 1e-6);
        assert!((y - 130.0).abs() < 1e-6);
    }

    #[test]
    fn test_crossing_creates_two_agents() {
        let scenario = crossing_mission(24.0, 121.0, 60.0, 4.0);
        assert_eq!(scenario.agent_count(), 2);
        assert_eq!(scenario.name, "crossing");

        let projector = GeoProjector::with_origin(24.0, 121.0);
        let end = &scenario.missions[1].1[1];
        let (x, y) = projector.to_local(end.lat, end.lon);
        assert!((x + 60.0).abs() < 1e-6);
        assert!((y - 4.0).abs() < 1e-6);
    }
}
