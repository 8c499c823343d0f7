use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use cleovent_core::{
    Alert, AlertLevel, AlertMessageInput, AlertMessageOutput, AlertStatus, FlowError,
    LocationData, LocationQuery, Settings, SuggestInterventionsInput, SuggestInterventionsOutput,
    Zone,
};

use crate::actions;
use crate::engine::{self, CompletionBackend, CompletionRequest, LlmEngine};
use crate::flows::{self, FlowDefinition, FlowRegistry};
use crate::http::{HttpTransport, ReqwestTransport};
use crate::{location, parse, prompt};

/// Validates requests, calls the external service, and validates replies for
/// every registered flow. Holds no per-call state, so one instance can serve
/// concurrent callers.
#[derive(Clone)]
pub struct Gateway {
    settings: Settings,
    flows: FlowRegistry,
    completion: Arc<dyn CompletionBackend>,
    http: Arc<dyn HttpTransport>,
}

impl Gateway {
    pub fn new(
        settings: Settings,
        completion: Arc<dyn CompletionBackend>,
        http: Arc<dyn HttpTransport>,
    ) -> Result<Self, FlowError> {
        let flows = FlowRegistry::new()?;
        Ok(Self {
            settings,
            flows,
            completion,
            http,
        })
    }

    /// Production wiring: `llm` for the model, `reqwest` for WAQI.
    pub fn from_settings(settings: Settings) -> Result<Self, FlowError> {
        Self::new(
            settings,
            Arc::new(LlmEngine),
            Arc::new(ReqwestTransport::new()),
        )
    }

    pub fn flows(&self) -> &FlowRegistry {
        &self.flows
    }

    pub async fn generate_descriptive_alert_message(
        &self,
        input: &AlertMessageInput,
    ) -> Result<AlertMessageOutput, FlowError> {
        let flow = &self.flows.alert_message;
        logged(flow.name, self.run_generative(flow, input)).await
    }

    pub async fn suggest_optimal_interventions(
        &self,
        input: &SuggestInterventionsInput,
    ) -> Result<SuggestInterventionsOutput, FlowError> {
        let flow = &self.flows.suggest_interventions;
        logged(flow.name, self.run_generative(flow, input)).await
    }

    pub async fn get_location_data(&self, query: LocationQuery) -> Result<LocationData, FlowError> {
        let flow = &self.flows.location_data;
        logged(flow.name, async {
            flow.input.check(&query)?;
            let data =
                location::fetch_location_data(&self.settings.air_quality, self.http.as_ref(), query)
                    .await?;
            flow.output.check(&data)?;
            Ok(data)
        })
        .await
    }

    /// Run a flow by name on an untyped request, returning the validated reply.
    pub async fn invoke(&self, name: &str, request: &Value) -> Result<Value, FlowError> {
        let flow = self
            .flows
            .get(name)
            .ok_or_else(|| FlowError::configuration(format!("no flow named '{name}'")))?;
        match flow.name {
            flows::LOCATION_DATA => {
                let query: LocationQuery = flow.input.conform(request)?;
                let data = self.get_location_data(query).await?;
                flow.output.check(&data)
            }
            _ => {
                logged(flow.name, async {
                    flow.input.validate(request)?;
                    let reply = self.complete(flow, request).await?;
                    flow.output.validate(&reply)?;
                    Ok(reply)
                })
                .await
            }
        }
    }

    /// Run the alert flow for a predicted reading and wrap the result in an
    /// [`Alert`] record.
    pub async fn generate_zone_alert(
        &self,
        zone: &Zone,
        predicted_value: f64,
    ) -> Result<Alert, FlowError> {
        let input = actions::alert_input_for_zone(zone, predicted_value);
        let output = self.generate_descriptive_alert_message(&input).await?;
        let now = chrono::Utc::now();
        Ok(Alert {
            id: format!("alert_{}", now.timestamp_millis()),
            zone_id: zone.id.clone(),
            zone_name: Some(zone.name.clone()),
            level: if actions::is_spike(zone, predicted_value) {
                AlertLevel::Warning
            } else {
                AlertLevel::Info
            },
            message: output.alert_message,
            timestamp: now.to_rfc3339(),
            status: AlertStatus::Active,
            predicted_value,
            baseline_value: zone.base_emissions,
            action_recommended: input.action_recommended,
        })
    }

    async fn run_generative<I, O>(&self, flow: &FlowDefinition, input: &I) -> Result<O, FlowError>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let request = flow.input.check(input)?;
        let reply = self.complete(flow, &request).await?;
        flow.output.conform(&reply)
    }

    /// Render, call the model within its timeout, and parse the reply as JSON.
    async fn complete(&self, flow: &FlowDefinition, request: &Value) -> Result<Value, FlowError> {
        self.settings.model.ensure_configured()?;
        let template = flow.template.as_ref().ok_or_else(|| {
            FlowError::configuration(format!("flow '{}' has no prompt template", flow.name))
        })?;

        let user_msg = template.render(request);
        let system = prompt::system_prompt(&flow.output);
        tracing::debug!(flow = flow.name, prompt = %user_msg, "rendered prompt");

        let request = CompletionRequest {
            flow: flow.name,
            settings: &self.settings.model,
            system: &system,
            prompt: &user_msg,
        };
        let raw = tokio::time::timeout(
            self.settings.model.timeout(),
            self.completion.complete(&request),
        )
        .await
        .map_err(|_| {
            FlowError::transport(
                engine::SERVICE,
                format!("no reply within {}s", self.settings.model.timeout_secs),
            )
        })??;
        tracing::debug!(flow = flow.name, raw = %raw, "raw model reply");

        parse::parse_reply(&raw)
    }
}

async fn logged<T>(
    flow: &'static str,
    fut: impl Future<Output = Result<T, FlowError>>,
) -> Result<T, FlowError> {
    tracing::info!(flow, "flow started");
    let result = fut.await;
    match &result {
        Ok(_) => tracing::info!(flow, "flow finished"),
        Err(e) => tracing::error!(flow, error = %e, "flow failed"),
    }
    result
}
