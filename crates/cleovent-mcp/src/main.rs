use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use cleovent_core::{AlertMessageInput, FlowError, LocationQuery, Settings, SuggestInterventionsInput, Zone};
use cleovent_flows::{actions, Gateway};

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ZoneAlertRequest {
    /// The zone the prediction is for. Its baseEmissions is the baseline.
    zone: Zone,
    /// Predicted CO2 value in ppm. Above the baseline counts as a spike.
    predicted_value: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RecommendRequest {
    /// Zones to plan for. Each becomes a GeoJSON point and an emissions entry.
    zones: Vec<Zone>,
    /// Intervention types to choose from. Default: Amine Scrubber, Vertical Garden, Roadside DAC.
    #[serde(default)]
    intervention_types: Vec<String>,
    /// Goals to weigh, e.g. "cost", "carbon capture", "available space".
    #[serde(default)]
    optimization_goals: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SimulateRequest {
    /// ID of the scenario to simulate
    scenario_id: String,
}

// --- Server ---

#[derive(Clone)]
pub struct CleoventServer {
    tool_router: ToolRouter<Self>,
    gateway: Arc<Gateway>,
}

#[tool_router]
impl CleoventServer {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            tool_router: Self::tool_router(),
            gateway: Arc::new(gateway),
        }
    }

    #[tool(
        description = "Generate a human-readable alert message for a predicted CO2 spike. Input: {zoneName, predictedValue, baselineValue, cause, actionRecommended}. Returns {alertMessage}."
    )]
    async fn generate_alert_message(
        &self,
        Parameters(req): Parameters<AlertMessageInput>,
    ) -> Result<CallToolResult, McpError> {
        to_result(self.gateway.generate_descriptive_alert_message(&req).await)
    }

    #[tool(
        description = "Build and run an alert for a zone given a predicted CO2 value. Picks cause, recommended action and level (Warning on a spike above baseline, Info otherwise) and returns a full Alert record."
    )]
    async fn generate_zone_alert(
        &self,
        Parameters(req): Parameters<ZoneAlertRequest>,
    ) -> Result<CallToolResult, McpError> {
        to_result(
            self.gateway
                .generate_zone_alert(&req.zone, req.predicted_value)
                .await,
        )
    }

    #[tool(
        description = "Current air quality at a coordinate from WAQI. Returns {co2, aqi, aqiDescription}. co2 is WAQI's carbon monoxide reading and is 0 when the station does not report it."
    )]
    async fn get_location_data(
        &self,
        Parameters(req): Parameters<LocationQuery>,
    ) -> Result<CallToolResult, McpError> {
        to_result(self.gateway.get_location_data(req).await)
    }

    #[tool(
        description = "Suggest carbon capture interventions from an urban layout (GeoJSON text), emissions data (JSON text), available intervention types and optimization goals. Returns {suggestions: [{zoneId, location, interventionType, expectedImpact, reasoning}]}."
    )]
    async fn suggest_interventions(
        &self,
        Parameters(req): Parameters<SuggestInterventionsInput>,
    ) -> Result<CallToolResult, McpError> {
        to_result(self.gateway.suggest_optimal_interventions(&req).await)
    }

    #[tool(
        description = "Suggest interventions for a list of zones. Builds the urban layout and emissions data from the zones, then runs suggest_interventions."
    )]
    async fn recommend_for_zones(
        &self,
        Parameters(req): Parameters<RecommendRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.zones.is_empty() {
            return Ok(CallToolResult::error(vec![Content::text(
                "At least one zone is required",
            )]));
        }
        let input = actions::recommendation_input(
            &req.zones,
            &req.intervention_types,
            &req.optimization_goals,
        );
        to_result(self.gateway.suggest_optimal_interventions(&input).await)
    }

    #[tool(description = "Run the scenario simulation for a scenario ID. Returns {success, message}.")]
    async fn run_scenario_simulation(
        &self,
        Parameters(req): Parameters<SimulateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome =
            actions::run_scenario_simulation(&req.scenario_id, actions::DEFAULT_SIMULATION_DELAY)
                .await;
        to_result(Ok(outcome))
    }

    #[tool(description = "List the registered flows with their input and output schemas")]
    fn describe_flows(&self) -> Result<CallToolResult, McpError> {
        to_result(Ok(self.gateway.flows().all()))
    }
}

#[tool_handler]
impl ServerHandler for CleoventServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// --- Helpers ---

/// Flow failures become MCP error results; the server keeps running.
fn to_result<T: Serialize>(result: Result<T, FlowError>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => {
            let json = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|e| format!("Serialization error: {}", e));
            Ok(CallToolResult::success(vec![Content::text(json)]))
        }
        Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
            "{} ({})",
            e.user_message(),
            e
        ))])),
    }
}

const INSTRUCTIONS: &str = r#"cleovent plans urban CO2-capture interventions.

## Tools
- **generate_alert_message** / **generate_zone_alert**: turn a CO2 prediction into an alert text. Each call asks the language model again, so wording varies between calls.
- **get_location_data**: live air quality (AQI, description, CO reading) for a latitude/longitude.
- **suggest_interventions** / **recommend_for_zones**: model-generated intervention suggestions. Impact figures are estimates from the model and are not checked locally.
- **run_scenario_simulation**: placeholder simulation, always succeeds after a short delay.
- **describe_flows**: input/output schemas of every flow.

## Errors
Requests are checked against the flow's input schema before anything is sent, and every offending field is reported. Replies that do not match the output schema are errors, never partial results. Nothing is retried automatically."#;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let settings = Settings::load();
    tracing::info!(
        provider = %settings.model.provider,
        model = %settings.model.model,
        "starting cleovent MCP server"
    );
    let gateway = Gateway::from_settings(settings)?;

    let service = CleoventServer::new(gateway)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_flows_lists_every_flow() {
        let server = CleoventServer::new(Gateway::from_settings(Settings::default()).unwrap());
        let result = server.describe_flows().unwrap();
        let text = serde_json::to_string(&result.content).unwrap();
        for name in ["generateDescriptiveAlertMessage", "getLocationData", "suggestOptimalInterventions"] {
            assert!(text.contains(name), "{name}");
        }
        assert_ne!(result.is_error, Some(true));
    }

    #[test]
    fn flow_errors_become_tool_errors() {
        let result = to_result::<()>(Err(FlowError::configuration("API token for WAQI is missing"))).unwrap();
        assert_eq!(result.is_error, Some(true));
    }
}
