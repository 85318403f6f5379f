//! Thin client for the Facebook Graph API `/events` endpoint (Conversions
//! API), plus the payload types it accepts. Delivery policy (retries,
//! timeouts) is left to the reqwest transport.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    error::{PixelError, Result},
    event_layer::Params,
};

pub const GRAPH_API_VERSION: &str = "v19.0";

/// SHA-256 over the normalized (trimmed, lowercased) identifier, hex-encoded.
/// The Conversions API requires advanced-matching fields to arrive hashed.
pub fn hash_identifier(value: &str) -> String {
    let normalized = value.trim().to_lowercase();
    format!("{:x}", Sha256::digest(normalized.as_bytes()))
}

/// Where the conversion physically happened. Server-side pixel events are
/// always reported as `website`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    #[default]
    Website,
    Email,
    App,
    PhoneCall,
    Chat,
    PhysicalStore,
    SystemGenerated,
    Other,
}

/// Advanced-matching user identification payload. `em`/`ph` carry hashed
/// values only; use [`UserData::email`]/[`UserData::phone`] which hash for
/// you.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserData {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub em: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ph: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbp: Option<String>,
}

impl UserData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(mut self, email: &str) -> Self {
        self.em.push(hash_identifier(email));
        self
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.ph.push(hash_identifier(phone));
        self
    }

    pub fn external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    pub fn client_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.client_ip_address = Some(ip.into());
        self
    }

    pub fn client_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.client_user_agent = Some(user_agent.into());
        self
    }

    pub fn fbc(mut self, fbc: impl Into<String>) -> Self {
        self.fbc = Some(fbc.into());
        self
    }

    pub fn fbp(mut self, fbp: impl Into<String>) -> Self {
        self.fbp = Some(fbp.into());
        self
    }
}

/// Business parameters of the event (order value, contents, ...). Anything
/// beyond the standard fields goes into `properties`, flattened into the
/// same JSON object.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_items: Option<u32>,
    #[serde(flatten)]
    pub properties: Params,
}

impl CustomData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn properties(mut self, properties: Params) -> Self {
        self.properties = properties;
        self
    }
}

/// One conversion event, as accepted by the `/events` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServerEvent {
    pub event_name: String,
    pub event_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub action_source: ActionSource,
    pub user_data: UserData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ServerEvent {
    /// A `website` event stamped with the current server time.
    pub fn website(
        event_name: impl Into<String>,
        source_url: impl Into<String>,
        user_data: UserData,
        custom_data: CustomData,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            event_time: unix_now(),
            event_source_url: Some(source_url.into()),
            event_id: None,
            action_source: ActionSource::Website,
            user_data,
            custom_data: Some(custom_data),
        }
    }

    /// Deduplication id matching a browser-side pixel event.
    pub fn event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A batch of events for one submission.
#[derive(Debug, Clone, Serialize)]
pub struct EventRequest {
    pub data: Vec<ServerEvent>,
    /// Routes the batch to the Events Manager test console instead of
    /// production measurement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_event_code: Option<String>,
}

impl EventRequest {
    pub fn single(event: ServerEvent) -> Self {
        Self {
            data: vec![event],
            test_event_code: None,
        }
    }

    pub fn test_event_code(mut self, code: impl Into<String>) -> Self {
        self.test_event_code = Some(code.into());
        self
    }
}

/// Confirmation returned by the endpoint, passed through to callers
/// unreinterpreted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventResponse {
    #[serde(default)]
    pub events_received: Option<u64>,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

/// The remote-API collaborator seam. The facade only ever needs one
/// operation; tests substitute a recording double here.
pub trait ConversionsApi: Send + Sync {
    async fn submit(
        &self,
        pixel_id: &str,
        token: &str,
        request: &EventRequest,
    ) -> Result<EventResponse>;
}

/// Default `ConversionsApi` over the public Graph API.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
}

impl GraphClient {
    pub fn new() -> Self {
        Self::with_base_url(format!("https://graph.facebook.com/{GRAPH_API_VERSION}"))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionsApi for GraphClient {
    async fn submit(
        &self,
        pixel_id: &str,
        token: &str,
        request: &EventRequest,
    ) -> Result<EventResponse> {
        let url = format!("{}/{}/events", self.base_url, pixel_id);
        let response = self
            .http
            .post(&url)
            .query(&[("access_token", token)])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.json::<serde_json::Value>().await?;
        if !status.is_success() {
            return Err(PixelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(pixel_id, events = request.data.len(), "conversions api accepted batch");
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_identifier_normalizes_before_hashing() {
        let canonical = hash_identifier("john@example.com");
        assert_eq!(hash_identifier("  John@Example.COM "), canonical);
        assert_eq!(canonical.len(), 64);
        assert!(canonical.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn user_data_hashes_email_and_phone() {
        let user_data = UserData::new().email("john@example.com").phone("+15551234567");
        assert_eq!(user_data.em, vec![hash_identifier("john@example.com")]);
        assert_eq!(user_data.ph, vec![hash_identifier("+15551234567")]);
    }

    #[test]
    fn server_event_serializes_website_action_source_and_omits_absent_fields() {
        let event = ServerEvent::website(
            "Purchase",
            "https://shop.example/checkout",
            UserData::new(),
            CustomData::new().value(10.0).currency("USD"),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_name"], "Purchase");
        assert_eq!(json["action_source"], "website");
        assert_eq!(json["event_source_url"], "https://shop.example/checkout");
        assert_eq!(json["custom_data"], json!({"value": 10.0, "currency": "USD"}));
        assert!(json["event_time"].as_u64().is_some());
        // Empty user_data and absent event_id stay out of the payload.
        assert_eq!(json["user_data"], json!({}));
        assert!(json.get("event_id").is_none());
    }

    #[test]
    fn custom_data_flattens_extra_properties() {
        let mut properties = Params::new();
        properties.insert("delivery_category".into(), json!("home_delivery"));
        let custom = CustomData::new().value(42.5).properties(properties);

        let json = serde_json::to_value(&custom).unwrap();
        assert_eq!(json["value"], 42.5);
        assert_eq!(json["delivery_category"], "home_delivery");
    }

    #[test]
    fn event_request_wraps_a_single_event_batch() {
        let request = EventRequest::single(ServerEvent::website(
            "Lead",
            "https://example.com",
            UserData::new(),
            CustomData::new(),
        ))
        .test_event_code("TEST123");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["test_event_code"], "TEST123");
    }

    #[test]
    fn event_response_tolerates_missing_fields() {
        let response: EventResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response, EventResponse::default());

        let response: EventResponse =
            serde_json::from_value(json!({"events_received": 1, "fbtrace_id": "abc"})).unwrap();
        assert_eq!(response.events_received, Some(1));
        assert_eq!(response.fbtrace_id.as_deref(), Some("abc"));
    }
}
