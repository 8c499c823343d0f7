//! Current air quality for a coordinate, from the WAQI feed API.

use serde::Deserialize;
use serde_json::Value;

use cleovent_core::{AirQualitySettings, AqiBand, FlowError, LocationData, LocationQuery};

use crate::http::{HttpRequest, HttpTransport};

pub const SERVICE: &str = "waqi";

#[derive(Debug, Deserialize)]
struct WaqiEnvelope {
    status: String,
    #[serde(default)]
    data: Value,
}

/// Fetch and normalize. The token is checked before the transport is touched,
/// and the request is abandoned after the configured timeout.
pub async fn fetch_location_data(
    settings: &AirQualitySettings,
    transport: &dyn HttpTransport,
    query: LocationQuery,
) -> Result<LocationData, FlowError> {
    let token = settings.require_token()?;
    let url = feed_url(&settings.base_url, query, token);

    let request = HttpRequest {
        service: SERVICE,
        url: &url,
    };
    let response = tokio::time::timeout(settings.timeout(), transport.get(&request))
        .await
        .map_err(|_| {
            FlowError::transport(
                SERVICE,
                format!("no response within {}s", settings.timeout_secs),
            )
        })??;

    if !response.is_success() {
        return Err(FlowError::Transport {
            service: SERVICE,
            status: Some(response.status),
            message: format!("WAQI API request failed with status: {}", response.status),
        });
    }

    let envelope: WaqiEnvelope = serde_json::from_str(&response.body)
        .map_err(|e| FlowError::upstream(SERVICE, format!("malformed payload: {e}")))?;

    if envelope.status != "ok" {
        let detail = match &envelope.data {
            Value::String(s) => s.clone(),
            Value::Null => envelope.status.clone(),
            other => other.to_string(),
        };
        return Err(FlowError::upstream(
            SERVICE,
            format!("WAQI API returned an error: {detail}"),
        ));
    }

    normalize(&envelope.data)
}

fn feed_url(base_url: &str, query: LocationQuery, token: &str) -> String {
    format!(
        "{}/feed/geo:{};{}/?token={}",
        base_url.trim_end_matches('/'),
        query.lat,
        query.lng,
        token
    )
}

/// Map a WAQI `data` object onto [`LocationData`].
///
/// `data` must be an object carrying `aqi`. WAQI reports `"-"` for stations
/// without a current index; that becomes 0. The carbon monoxide reading stands
/// in for CO2 and is 0 when absent.
fn normalize(data: &Value) -> Result<LocationData, FlowError> {
    let aqi = match data.get("aqi") {
        Some(v) => v.as_f64().unwrap_or(0.0),
        None => return Err(FlowError::upstream(SERVICE, "payload has no data")),
    };
    let co2 = match data.pointer("/iaqi/co/v").and_then(Value::as_f64) {
        Some(v) => v,
        None => {
            tracing::warn!("WAQI payload has no CO reading, reporting co2 = 0");
            0.0
        }
    };
    Ok(LocationData {
        co2,
        aqi,
        aqi_description: AqiBand::from_index(aqi.ceil() as i64).description(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_has_geo_feed_shape() {
        let url = feed_url(
            "https://api.waqi.info/",
            LocationQuery {
                lat: 28.61,
                lng: 77.23,
            },
            "t0k",
        );
        assert_eq!(url, "https://api.waqi.info/feed/geo:28.61;77.23/?token=t0k");
    }

    #[test]
    fn normalizes_full_payload() {
        let data = normalize(&json!({"aqi": 152, "iaqi": {"co": {"v": 7.1}, "pm25": {"v": 152}}})).unwrap();
        assert_eq!(data.aqi, 152.0);
        assert_eq!(data.co2, 7.1);
        assert_eq!(data.aqi_description, "Air quality is Unhealthy.");
    }

    #[test]
    fn missing_co_is_zero() {
        let data = normalize(&json!({"aqi": 42, "iaqi": {"pm10": {"v": 12}}})).unwrap();
        assert_eq!(data.co2, 0.0);
        assert_eq!(data.aqi_description, "Air quality is Good.");
    }

    #[test]
    fn dash_aqi_is_zero() {
        let data = normalize(&json!({"aqi": "-"})).unwrap();
        assert_eq!(data.aqi, 0.0);
        assert_eq!(data.co2, 0.0);
    }

    #[test]
    fn fractional_aqi_above_threshold_moves_up_a_band() {
        let data = normalize(&json!({"aqi": 50.5})).unwrap();
        assert_eq!(data.aqi_description, "Air quality is Moderate.");
    }

    #[test]
    fn data_without_aqi_is_upstream_error() {
        for data in [Value::Null, json!({}), json!("oops"), json!({"iaqi": {"co": {"v": 3}}})] {
            let err = normalize(&data).unwrap_err();
            assert!(matches!(err, FlowError::Upstream { .. }), "{data}");
        }
    }
}
