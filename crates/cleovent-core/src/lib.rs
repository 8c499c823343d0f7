pub mod aqi;
pub mod error;
pub mod schema;
pub mod settings;
pub mod template;

pub use aqi::AqiBand;
pub use error::{FieldError, FieldProblem, FlowError};
pub use schema::{FieldKind, FieldSpec, Schema};
pub use settings::{AirQualitySettings, ModelSettings, Settings};
pub use template::PromptTemplate;

use serde::{Deserialize, Serialize};

// --- Dashboard records ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct Placement {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub enum ZoneType {
    Industrial,
    Transport,
    Residential,
    Commercial,
    #[serde(rename = "Urban Park")]
    UrbanPark,
    #[serde(rename = "Power Plant")]
    PowerPlant,
    Waterfront,
    University,
}

impl ZoneType {
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneType::Industrial => "Industrial",
            ZoneType::Transport => "Transport",
            ZoneType::Residential => "Residential",
            ZoneType::Commercial => "Commercial",
            ZoneType::UrbanPark => "Urban Park",
            ZoneType::PowerPlant => "Power Plant",
            ZoneType::Waterfront => "Waterfront",
            ZoneType::University => "University",
        }
    }
}

/// An urban zone being monitored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub placement: Placement,
    /// Baseline CO2 level in ppm
    pub base_emissions: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertLevel {
    Warning,
    Critical,
    Info,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertStatus {
    Active,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub zone_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    pub level: AlertLevel,
    pub message: String,
    /// RFC 3339
    pub timestamp: String,
    pub status: AlertStatus,
    pub predicted_value: f64,
    pub baseline_value: f64,
    pub action_recommended: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationOutcome {
    pub success: bool,
    pub message: String,
}

// --- Flow inputs and outputs ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertMessageInput {
    /// The name of the zone where the CO2 spike is predicted.
    pub zone_name: String,
    /// The predicted CO2 value (in ppm).
    pub predicted_value: f64,
    /// The baseline CO2 value (in ppm).
    pub baseline_value: f64,
    /// The predicted cause of the CO2 spike (e.g., increased traffic, industrial activity).
    pub cause: String,
    /// The recommended action to mitigate the CO2 spike (e.g., activate capture units).
    pub action_recommended: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertMessageOutput {
    pub alert_message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct LocationQuery {
    /// Latitude of the location.
    pub lat: f64,
    /// Longitude of the location.
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    /// WAQI's carbon monoxide reading, used as a CO2 stand-in. 0 when unavailable.
    pub co2: f64,
    pub aqi: f64,
    pub aqi_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestInterventionsInput {
    /// GeoJSON text describing the urban layout (buildings, roads, green spaces).
    pub urban_layout: String,
    /// JSON text with CO2 emissions per zone.
    pub emissions_data: String,
    /// Available intervention types, e.g. "Amine Scrubber", "Vertical Garden".
    pub intervention_types: Vec<String>,
    /// Goals to weigh, e.g. cost, carbon capture, available space.
    pub optimization_goals: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedImpact {
    pub tco2_captured_per_day: f64,
    #[serde(rename = "costPerTonCO2")]
    pub cost_per_ton_co2: f64,
    pub energy_consumption_per_day: f64,
}

/// One model-proposed intervention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub zone_id: String,
    pub location: GeoPoint,
    pub intervention_type: String,
    pub expected_impact: ExpectedImpact,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestInterventionsOutput {
    pub suggestions: Vec<Recommendation>,
}
