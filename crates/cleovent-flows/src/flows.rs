//! Flow definitions: input schema, output schema, and (for generative flows)
//! the compiled prompt template. Built once per [`crate::Gateway`].

use serde::Serialize;

use cleovent_core::{FieldKind, FlowError, PromptTemplate, Schema};

use crate::prompt;

pub const ALERT_MESSAGE: &str = "generateDescriptiveAlertMessage";
pub const LOCATION_DATA: &str = "getLocationData";
pub const SUGGEST_INTERVENTIONS: &str = "suggestOptimalInterventions";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    pub name: &'static str,
    pub input: Schema,
    pub output: Schema,
    #[serde(skip)]
    pub template: Option<PromptTemplate>,
}

impl FlowDefinition {
    /// A flow answered by the language model. Fails if the template does not
    /// match the input schema.
    pub fn generative(
        name: &'static str,
        input: Schema,
        output: Schema,
        template: &str,
    ) -> Result<Self, FlowError> {
        let template = PromptTemplate::compile(template, &input)?;
        Ok(Self {
            name,
            input,
            output,
            template: Some(template),
        })
    }

    /// A flow answered by a REST service; no prompt involved.
    pub fn rest(name: &'static str, input: Schema, output: Schema) -> Self {
        Self {
            name,
            input,
            output,
            template: None,
        }
    }

    pub fn is_generative(&self) -> bool {
        self.template.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct FlowRegistry {
    pub alert_message: FlowDefinition,
    pub location_data: FlowDefinition,
    pub suggest_interventions: FlowDefinition,
}

impl FlowRegistry {
    pub fn new() -> Result<Self, FlowError> {
        Ok(Self {
            alert_message: FlowDefinition::generative(
                ALERT_MESSAGE,
                alert_message_input(),
                alert_message_output(),
                prompt::ALERT_MESSAGE_TEMPLATE,
            )?,
            location_data: FlowDefinition::rest(
                LOCATION_DATA,
                location_input(),
                location_output(),
            ),
            suggest_interventions: FlowDefinition::generative(
                SUGGEST_INTERVENTIONS,
                suggest_interventions_input(),
                suggest_interventions_output(),
                prompt::SUGGEST_INTERVENTIONS_TEMPLATE,
            )?,
        })
    }

    pub fn all(&self) -> [&FlowDefinition; 3] {
        [
            &self.alert_message,
            &self.location_data,
            &self.suggest_interventions,
        ]
    }

    pub fn get(&self, name: &str) -> Option<&FlowDefinition> {
        self.all().into_iter().find(|f| f.name == name)
    }
}

pub fn alert_message_input() -> Schema {
    Schema::new("GenerateDescriptiveAlertMessageInput", 1)
        .required("zoneName", FieldKind::String, "The name of the zone where the CO2 spike is predicted.")
        .required("predictedValue", FieldKind::Number, "The predicted CO2 value (in ppm).")
        .required("baselineValue", FieldKind::Number, "The baseline CO2 value (in ppm).")
        .required(
            "cause",
            FieldKind::String,
            "The predicted cause of the CO2 spike (e.g., increased traffic, industrial activity).",
        )
        .required(
            "actionRecommended",
            FieldKind::String,
            "The recommended action to mitigate the CO2 spike (e.g., activate capture units).",
        )
}

pub fn alert_message_output() -> Schema {
    Schema::new("GenerateDescriptiveAlertMessageOutput", 1).required(
        "alertMessage",
        FieldKind::String,
        "A descriptive alert message explaining the predicted CO2 spike, its cause, severity, and recommended action.",
    )
}

pub fn location_input() -> Schema {
    Schema::new("GetLocationDataInput", 1)
        .required("lat", FieldKind::Number, "Latitude of the location.")
        .required("lng", FieldKind::Number, "Longitude of the location.")
}

pub fn location_output() -> Schema {
    Schema::new("GetLocationDataOutput", 1)
        .required("co2", FieldKind::Number, "CO2 level in ppm. May be unavailable (0).")
        .required("aqi", FieldKind::Number, "Air Quality Index (AQI).")
        .required(
            "aqiDescription",
            FieldKind::String,
            "A one-sentence qualitative description of the air quality.",
        )
}

pub fn suggest_interventions_input() -> Schema {
    Schema::new("SuggestOptimalInterventionsInput", 1)
        .required(
            "urbanLayout",
            FieldKind::String,
            "GeoJSON data representing the urban layout, including building footprints, roads, and green spaces.",
        )
        .required(
            "emissionsData",
            FieldKind::String,
            "JSON data containing CO2 emissions data for different zones in the city.",
        )
        .required(
            "interventionTypes",
            FieldKind::StringArray,
            "List of available intervention types (e.g., Amine Scrubber, Vertical Garden).",
        )
        .required(
            "optimizationGoals",
            FieldKind::StringArray,
            "Goals to consider when providing recommendations, e.g. cost, carbon capture, available space.",
        )
}

fn location_point() -> Schema {
    Schema::new("Location", 1)
        .required("latitude", FieldKind::Number, "Latitude of the suggested location.")
        .required("longitude", FieldKind::Number, "Longitude of the suggested location.")
}

fn expected_impact() -> Schema {
    Schema::new("ExpectedImpact", 1)
        .required("tco2CapturedPerDay", FieldKind::Number, "Estimated tons of CO2 captured per day.")
        .required("costPerTonCO2", FieldKind::Number, "Estimated cost per ton of CO2 captured.")
        .required("energyConsumptionPerDay", FieldKind::Number, "Estimated energy consumption per day.")
}

fn recommendation() -> Schema {
    Schema::new("Recommendation", 1)
        .required("zoneId", FieldKind::String, "The ID of the zone where the intervention is suggested.")
        .required(
            "location",
            FieldKind::Object {
                schema: location_point(),
            },
            "Suggested location for the intervention.",
        )
        .required(
            "interventionType",
            FieldKind::String,
            "The type of intervention suggested (e.g., Amine Scrubber).",
        )
        .required(
            "expectedImpact",
            FieldKind::Object {
                schema: expected_impact(),
            },
            "Estimated impact of the intervention.",
        )
        .required(
            "reasoning",
            FieldKind::String,
            "Why this intervention is recommended for this location.",
        )
}

pub fn suggest_interventions_output() -> Schema {
    Schema::new("SuggestOptimalInterventionsOutput", 1).required(
        "suggestions",
        FieldKind::ObjectArray {
            items: recommendation(),
        },
        "A list of suggested intervention locations and types.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_compiles_all_templates() {
        let registry = FlowRegistry::new().unwrap();
        assert!(registry.alert_message.is_generative());
        assert!(registry.suggest_interventions.is_generative());
        assert!(!registry.location_data.is_generative());
        assert_eq!(registry.get(LOCATION_DATA).unwrap().name, LOCATION_DATA);
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn template_referencing_unknown_field_is_rejected_at_registration() {
        let err = FlowDefinition::generative(
            "broken",
            alert_message_input(),
            alert_message_output(),
            "Zone {{zoneId}}",
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::Configuration(_)));
    }

    #[test]
    fn alert_input_reports_three_field_errors() {
        let input = json!({"zoneName": "A", "predictedValue": "bad", "baselineValue": 500});
        let err = alert_message_input().validate(&input).unwrap_err();
        let mut paths: Vec<&str> = err.field_errors().iter().map(|e| e.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec!["actionRecommended", "cause", "predictedValue"]);
    }

    #[test]
    fn suggestion_output_checks_nested_impact() {
        let reply = json!({"suggestions": [{
            "zoneId": "z1",
            "location": {"latitude": 1.0, "longitude": 2.0},
            "interventionType": "Biofilter",
            "expectedImpact": {"tco2CapturedPerDay": 1, "costPerTonCO2": "cheap"},
            "reasoning": "r"
        }]});
        let err = suggest_interventions_output().validate(&reply).unwrap_err();
        let paths: Vec<&str> = err.field_errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "suggestions[0].expectedImpact.costPerTonCO2",
                "suggestions[0].expectedImpact.energyConsumptionPerDay"
            ]
        );
    }

    #[test]
    fn descriptors_serialize_without_template() {
        let registry = FlowRegistry::new().unwrap();
        let value = serde_json::to_value(registry.all()).unwrap();
        assert_eq!(value[0]["name"], json!(ALERT_MESSAGE));
        assert_eq!(value[0]["input"]["fields"][0]["name"], json!("zoneName"));
        assert!(value[0].get("template").is_none());
    }
}
