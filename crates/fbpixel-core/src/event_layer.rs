use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form event parameters, as sent to the browser pixel or the
/// Conversions API (`value`, `currency`, `content_ids`, ...).
pub type Params = Map<String, Value>;

/// One accumulated event: its parameters plus an optional client-supplied
/// event id used to deduplicate against the browser-side pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub data: Params,
    pub event_id: Option<String>,
}

impl EventEntry {
    pub fn new(data: Params, event_id: Option<String>) -> Self {
        Self { data, event_id }
    }
}

/// A named bag of events accumulated during one request cycle.
///
/// Names are unique: a later `set` for the same name replaces the whole
/// entry. All operations are total in-memory mutations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLayer {
    data: HashMap<String, EventEntry>,
}

impl EventLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `event_name`.
    pub fn set(
        &mut self,
        event_name: impl Into<String>,
        parameters: Params,
        event_id: Option<String>,
    ) {
        self.data
            .insert(event_name.into(), EventEntry::new(parameters, event_id));
    }

    /// Shallow top-level union: entries in `new_data` replace equally-named
    /// existing entries, everything else is preserved. `data` sub-objects are
    /// never merged per key.
    pub fn merge(&mut self, new_data: HashMap<String, EventEntry>) {
        self.data.extend(new_data);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The accumulated entries, by value. Mutating the returned map does not
    /// affect the layer.
    pub fn to_map(&self) -> HashMap<String, EventEntry> {
        self.data.clone()
    }

    pub fn get(&self, event_name: &str) -> Option<&EventEntry> {
        self.data.get(event_name)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn set_inserts_entry_with_data_and_event_id() {
        let mut layer = EventLayer::new();
        layer.set(
            "Purchase",
            params(json!({"value": 10, "currency": "USD"})),
            Some("evt-1".into()),
        );

        let entry = layer.get("Purchase").unwrap();
        assert_eq!(entry.data, params(json!({"value": 10, "currency": "USD"})));
        assert_eq!(entry.event_id.as_deref(), Some("evt-1"));
    }

    #[test]
    fn set_overwrites_whole_entry_last_write_wins() {
        let mut layer = EventLayer::new();
        layer.set("Purchase", params(json!({"value": 10})), Some("evt-1".into()));
        layer.set("Purchase", params(json!({"value": 20})), None);

        assert_eq!(layer.len(), 1);
        let entry = layer.get("Purchase").unwrap();
        assert_eq!(entry.data, params(json!({"value": 20})));
        assert_eq!(entry.event_id, None);
    }

    #[test]
    fn clear_empties_any_prior_state() {
        let mut layer = EventLayer::new();
        layer.set("ViewContent", Params::new(), None);
        layer.set("AddToCart", params(json!({"id": 5})), None);

        layer.clear();
        assert!(layer.to_map().is_empty());
    }

    #[test]
    fn merge_replaces_colliding_names_and_preserves_others() {
        let mut layer = EventLayer::new();
        layer.set("Purchase", params(json!({"value": 10})), None);
        layer.set("ViewContent", params(json!({"id": 1})), None);

        let incoming = HashMap::from([(
            "Purchase".to_string(),
            EventEntry::new(params(json!({"currency": "EUR"})), Some("evt-9".into())),
        )]);
        layer.merge(incoming);

        // Colliding name: replaced wholesale, value key is gone.
        let purchase = layer.get("Purchase").unwrap();
        assert_eq!(purchase.data, params(json!({"currency": "EUR"})));
        assert_eq!(purchase.event_id.as_deref(), Some("evt-9"));

        // Untouched name: unchanged.
        let view = layer.get("ViewContent").unwrap();
        assert_eq!(view.data, params(json!({"id": 1})));
    }

    #[test]
    fn to_map_returns_a_copy() {
        let mut layer = EventLayer::new();
        layer.set("Lead", Params::new(), None);

        let mut snapshot = layer.to_map();
        snapshot.remove("Lead");

        assert!(layer.get("Lead").is_some());
    }

    #[test]
    fn serializes_entries_with_data_and_event_id_keys() {
        let mut layer = EventLayer::new();
        layer.set("Purchase", params(json!({"value": 20})), None);

        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(
            json,
            json!({"Purchase": {"data": {"value": 20}, "event_id": null}})
        );
    }
}
