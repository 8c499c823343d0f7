//! Helpers the dashboard actions use to feed the flows.

use std::time::Duration;

use serde_json::json;

use cleovent_core::{AlertMessageInput, SimulationOutcome, SuggestInterventionsInput, Zone};

pub const DEFAULT_INTERVENTION_TYPES: [&str; 3] =
    ["Amine Scrubber", "Vertical Garden", "Roadside DAC"];

pub const DEFAULT_SIMULATION_DELAY: Duration = Duration::from_secs(2);

const SPIKE_CAUSE: &str = "unusually high industrial activity";
const SPIKE_ACTION: &str = "Activate standby capture units";
const CALM_CAUSE: &str = "decreased traffic flow";
const CALM_ACTION: &str = "No action needed";

pub fn is_spike(zone: &Zone, predicted_value: f64) -> bool {
    predicted_value > zone.base_emissions
}

/// Alert-flow input for a predicted reading in `zone`.
pub fn alert_input_for_zone(zone: &Zone, predicted_value: f64) -> AlertMessageInput {
    let (cause, action) = if is_spike(zone, predicted_value) {
        (SPIKE_CAUSE, SPIKE_ACTION)
    } else {
        (CALM_CAUSE, CALM_ACTION)
    };
    AlertMessageInput {
        zone_name: zone.name.clone(),
        predicted_value,
        baseline_value: zone.base_emissions,
        cause: cause.to_string(),
        action_recommended: action.to_string(),
    }
}

/// Suggestion-flow input built from the zone list: a GeoJSON point per zone
/// and the per-zone emissions. Empty `intervention_types` falls back to
/// [`DEFAULT_INTERVENTION_TYPES`].
pub fn recommendation_input(
    zones: &[Zone],
    intervention_types: &[String],
    optimization_goals: &[String],
) -> SuggestInterventionsInput {
    let features: Vec<_> = zones
        .iter()
        .map(|z| {
            json!({
                "type": "Feature",
                "properties": { "id": z.id, "name": z.name, "type": z.zone_type.as_str() },
                "geometry": {
                    "type": "Point",
                    "coordinates": [z.placement.lng, z.placement.lat],
                },
            })
        })
        .collect();
    let layout = json!({ "type": "FeatureCollection", "features": features });

    let emissions: Vec<_> = zones
        .iter()
        .map(|z| json!({ "zoneId": z.id, "emissions": z.base_emissions }))
        .collect();

    let intervention_types = if intervention_types.is_empty() {
        DEFAULT_INTERVENTION_TYPES.iter().map(|s| s.to_string()).collect()
    } else {
        intervention_types.to_vec()
    };

    SuggestInterventionsInput {
        urban_layout: layout.to_string(),
        emissions_data: serde_json::Value::Array(emissions).to_string(),
        intervention_types,
        optimization_goals: optimization_goals.to_vec(),
    }
}

/// Placeholder simulation: waits `delay` and reports success.
pub async fn run_scenario_simulation(scenario_id: &str, delay: Duration) -> SimulationOutcome {
    tracing::info!(scenario_id, "running scenario simulation");
    tokio::time::sleep(delay).await;
    SimulationOutcome {
        success: true,
        message: format!("Scenario {scenario_id} simulated successfully."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleovent_core::{Placement, ZoneType};
    use serde_json::Value;

    fn zone(id: &str, base: f64) -> Zone {
        Zone {
            id: id.to_string(),
            name: format!("Zone {id}"),
            zone_type: ZoneType::Industrial,
            placement: Placement {
                lat: 28.61,
                lng: 77.23,
            },
            base_emissions: base,
        }
    }

    #[test]
    fn spike_picks_mitigation() {
        let input = alert_input_for_zone(&zone("a", 500.0), 640.0);
        assert_eq!(input.zone_name, "Zone a");
        assert_eq!(input.baseline_value, 500.0);
        assert_eq!(input.cause, SPIKE_CAUSE);
        assert_eq!(input.action_recommended, SPIKE_ACTION);
    }

    #[test]
    fn drop_needs_no_action() {
        let input = alert_input_for_zone(&zone("a", 500.0), 500.0);
        assert_eq!(input.cause, CALM_CAUSE);
        assert_eq!(input.action_recommended, CALM_ACTION);
    }

    #[test]
    fn recommendation_input_builds_geojson_and_emissions() {
        let input = recommendation_input(
            &[zone("a", 2000.0), zone("b", 620.0)],
            &[],
            &["cost".to_string()],
        );
        let layout: Value = serde_json::from_str(&input.urban_layout).unwrap();
        assert_eq!(layout["type"], "FeatureCollection");
        assert_eq!(layout["features"].as_array().unwrap().len(), 2);
        assert_eq!(
            layout["features"][0]["geometry"]["coordinates"],
            serde_json::json!([77.23, 28.61])
        );
        assert_eq!(layout["features"][1]["properties"]["type"], "Industrial");

        let emissions: Value = serde_json::from_str(&input.emissions_data).unwrap();
        assert_eq!(emissions[1]["zoneId"], "b");
        assert_eq!(emissions[1]["emissions"], 620.0);

        assert_eq!(input.intervention_types, DEFAULT_INTERVENTION_TYPES);
        assert_eq!(input.optimization_goals, vec!["cost"]);
    }

    #[tokio::test(start_paused = true)]
    async fn simulation_reports_success_after_delay() {
        let started = tokio::time::Instant::now();
        let outcome = run_scenario_simulation("s1", DEFAULT_SIMULATION_DELAY).await;
        assert!(started.elapsed() >= DEFAULT_SIMULATION_DELAY);
        assert!(outcome.success);
        assert_eq!(outcome.message, "Scenario s1 simulated successfully.");
    }
}
