use std::collections::HashMap;

use crate::{
    auth::AuthSource,
    config::PixelConfig,
    conversions::{ConversionsApi, CustomData, EventRequest, EventResponse, GraphClient, ServerEvent, UserData},
    error::{PixelError, Result},
    event_layer::{EventEntry, EventLayer, Params},
};

/// Central access point for pixel tracking: accumulates events into four
/// independent layers during request handling and submits server-side
/// conversions on demand.
///
/// Build one instance per request/context and pass it explicitly; nothing
/// here is a process-wide singleton. The standard, custom, flash and inertia
/// layers never share entries.
pub struct FacebookPixel<C = GraphClient> {
    enabled: bool,
    pixel_id: String,
    token: String,
    session_key: String,
    event_layer: EventLayer,
    custom_event_layer: EventLayer,
    flash_event_layer: EventLayer,
    inertia_event_layer: EventLayer,
    auth: Option<Box<dyn AuthSource>>,
    client: C,
}

impl FacebookPixel<GraphClient> {
    pub fn new(config: PixelConfig) -> Self {
        Self::with_client(config, GraphClient::new())
    }

    pub fn from_env() -> Self {
        Self::new(PixelConfig::from_env())
    }
}

impl<C: ConversionsApi> FacebookPixel<C> {
    /// Build the facade over a specific Conversions API client.
    pub fn with_client(config: PixelConfig, client: C) -> Self {
        Self {
            enabled: config.enabled,
            pixel_id: config.pixel_id,
            token: config.token,
            session_key: config.session_key,
            event_layer: EventLayer::new(),
            custom_event_layer: EventLayer::new(),
            flash_event_layer: EventLayer::new(),
            inertia_event_layer: EventLayer::new(),
            auth: None,
            client,
        }
    }

    /// Attach the authentication collaborator used by [`user_email`].
    ///
    /// [`user_email`]: FacebookPixel::user_email
    pub fn with_auth(mut self, auth: impl AuthSource + 'static) -> Self {
        self.auth = Some(Box::new(auth));
        self
    }

    pub fn pixel_id(&self) -> &str {
        &self.pixel_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn set_pixel_id(&mut self, id: impl Into<String>) {
        self.pixel_id = id.into();
    }

    /// Add a standard event to the event layer.
    pub fn track(&mut self, event_name: impl Into<String>, parameters: Params) {
        self.event_layer.set(event_name, parameters, None);
    }

    /// Add a standard event with a deduplication id matching a browser-side
    /// pixel event.
    pub fn track_with_id(
        &mut self,
        event_name: impl Into<String>,
        parameters: Params,
        event_id: impl Into<String>,
    ) {
        self.event_layer.set(event_name, parameters, Some(event_id.into()));
    }

    /// Add a custom (non-standard) event to the custom event layer.
    pub fn track_custom(&mut self, event_name: impl Into<String>, parameters: Params) {
        self.custom_event_layer.set(event_name, parameters, None);
    }

    /// Stage an event for the next request cycle. Persisting it across the
    /// boundary is the session collaborator's job.
    pub fn flash_event(&mut self, event_name: impl Into<String>, parameters: Params) {
        self.flash_event_layer.set(event_name, parameters, None);
    }

    /// Add an event to the client-hydration (Inertia) layer.
    pub fn track_inertia(&mut self, event_name: impl Into<String>, parameters: Params) {
        self.inertia_event_layer.set(event_name, parameters, None);
    }

    /// Merge restored session data into the primary event layer
    /// (shallow top-level replace).
    pub fn merge(&mut self, session_data: HashMap<String, EventEntry>) {
        self.event_layer.merge(session_data);
    }

    pub fn event_layer(&self) -> &EventLayer {
        &self.event_layer
    }

    pub fn event_layer_mut(&mut self) -> &mut EventLayer {
        &mut self.event_layer
    }

    pub fn custom_event_layer(&self) -> &EventLayer {
        &self.custom_event_layer
    }

    pub fn custom_event_layer_mut(&mut self) -> &mut EventLayer {
        &mut self.custom_event_layer
    }

    pub fn inertia_event_layer(&self) -> &EventLayer {
        &self.inertia_event_layer
    }

    pub fn inertia_event_layer_mut(&mut self) -> &mut EventLayer {
        &mut self.inertia_event_layer
    }

    /// Snapshot of the flash layer, for handing to the session store.
    pub fn flashed_events(&self) -> HashMap<String, EventEntry> {
        self.flash_event_layer.to_map()
    }

    /// Email of the authenticated user, for advanced matching. `None` when
    /// no auth collaborator is attached or nobody is signed in.
    pub fn user_email(&self) -> Option<String> {
        self.auth.as_ref().and_then(|auth| auth.current_user_email())
    }

    /// Submit one conversion event server-side.
    ///
    /// Disabled tracking short-circuits to `Ok(None)`. A missing token is a
    /// configuration error and is raised. Delivery failures are logged and
    /// swallowed (`Ok(None)`): tracking is best-effort and must never break
    /// the request it rides on.
    pub async fn send(
        &self,
        event_name: &str,
        source_url: &str,
        user_data: UserData,
        custom_data: CustomData,
    ) -> Result<Option<EventResponse>> {
        let event = ServerEvent::website(event_name, source_url, user_data, custom_data);
        self.send_event(event).await
    }

    /// Submit a fully-built event (custom timestamp, dedup id, test code
    /// routing go through here). Same policy as [`send`].
    ///
    /// [`send`]: FacebookPixel::send
    pub async fn send_event(&self, event: ServerEvent) -> Result<Option<EventResponse>> {
        self.send_request(EventRequest::single(event)).await
    }

    /// Submit a prepared event batch (e.g. one carrying a
    /// `test_event_code`). Same policy as [`send`].
    ///
    /// [`send`]: FacebookPixel::send
    pub async fn send_request(&self, request: EventRequest) -> Result<Option<EventResponse>> {
        if !self.is_enabled() {
            return Ok(None);
        }
        if self.token.is_empty() {
            return Err(PixelError::MissingToken);
        }

        match self.client.submit(&self.pixel_id, &self.token, &request).await {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                tracing::error!(
                    pixel_id = %self.pixel_id,
                    error = %e,
                    "conversions api submission failed, dropping event"
                );
                Ok(None)
            }
        }
    }

    /// Discard the primary event layer. Custom, flash and inertia layers are
    /// untouched.
    pub fn clear(&mut self) {
        self.event_layer = EventLayer::new();
    }
}
