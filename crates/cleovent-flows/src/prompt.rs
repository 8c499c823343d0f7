use cleovent_core::Schema;

pub const ALERT_MESSAGE_TEMPLATE: &str = "\
You write alert messages for city officials about predicted CO2 spikes in urban zones.

Using the details below, write a concise, informative alert that explains the predicted cause, \
how severe the spike is compared with the baseline, and the recommended action.

Zone Name: {{zoneName}}
Predicted CO2 Value: {{predictedValue}} ppm
Baseline CO2 Value: {{baselineValue}} ppm
Cause: {{cause}}
Recommended Action: {{actionRecommended}}
";

pub const SUGGEST_INTERVENTIONS_TEMPLATE: &str = "\
You are an urban planner specializing in carbon capture interventions.

From the urban layout, emissions data, available intervention types and optimization goals \
below, suggest the best locations and types of carbon capture interventions.

Urban Layout (GeoJSON):
{{urbanLayout}}

Emissions Data (JSON):
{{emissionsData}}

Available Intervention Types:
{{#each interventionTypes}}
Optimization Goals:
{{#each optimizationGoals}}
For each suggestion give the zone ID, the location (latitude and longitude), the intervention \
type, the expected impact (tons of CO2 captured per day, cost per ton of CO2 and energy \
consumption per day) and a short explanation of why it suits that location.
";

/// System prompt instructing the model to answer with `output`'s shape.
pub fn system_prompt(output: &Schema) -> String {
    let shape = serde_json::to_string_pretty(&output.shape())
        .unwrap_or_else(|_| output.shape().to_string());
    format!(
        "You are a backend service that answers only with JSON.\n\n\
Respond with a single JSON object of this shape. Each leaf names the expected type, \
followed by what the value means:\n{shape}\n\n\
Output ONLY the JSON object, nothing else."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleovent_core::FieldKind;

    #[test]
    fn system_prompt_embeds_output_shape() {
        let schema = Schema::new("out", 1).required("alertMessage", FieldKind::String, "The alert");
        let system = system_prompt(&schema);
        assert!(system.contains("\"alertMessage\": \"string: The alert\""));
        assert!(system.ends_with("nothing else."));
    }
}
