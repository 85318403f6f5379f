//! fbpixel Core Library
//!
//! Server-side Facebook Pixel tracking: per-request event layers for page
//! payloads plus one-shot conversion delivery through the Conversions API.

pub mod auth;
pub mod config;
pub mod conversions;
pub mod error;
pub mod event_layer;
pub mod pixel;

// Re-export commonly used items at crate root
pub use auth::{AuthSource, StaticAuth};
pub use config::PixelConfig;
pub use conversions::{
    ActionSource, ConversionsApi, CustomData, EventRequest, EventResponse, GraphClient,
    ServerEvent, UserData, hash_identifier,
};
pub use error::{PixelError, Result};
pub use event_layer::{EventEntry, EventLayer, Params};
pub use pixel::FacebookPixel;
