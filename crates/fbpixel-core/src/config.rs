use std::env;

const ENABLED_VAR: &str = "FACEBOOK_PIXEL_ENABLED";
const PIXEL_ID_VAR: &str = "FACEBOOK_PIXEL_ID";
const TOKEN_VAR: &str = "FACEBOOK_PIXEL_TOKEN";
const SESSION_KEY_VAR: &str = "FACEBOOK_PIXEL_SESSION_KEY";

const DEFAULT_SESSION_KEY: &str = "facebook_pixel";

/// Configuration supplied to the facade at construction time.
///
/// There is no runtime reload: a facade built from one config keeps it for
/// its whole (request-scoped) lifetime.
#[derive(Debug, Clone)]
pub struct PixelConfig {
    pub enabled: bool,
    pub pixel_id: String,
    pub token: String,
    pub session_key: String,
}

impl Default for PixelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pixel_id: String::new(),
            token: String::new(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

impl PixelConfig {
    pub fn new(pixel_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            pixel_id: pixel_id.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    /// Read the config from `FACEBOOK_PIXEL_*` environment variables.
    ///
    /// Tracking is enabled unless `FACEBOOK_PIXEL_ENABLED` is explicitly set
    /// to a false-ish value. Unset id/token come back empty; `send` surfaces
    /// the missing token as a configuration error.
    pub fn from_env() -> Self {
        Self {
            enabled: env::var(ENABLED_VAR)
                .map(|v| !matches!(v.trim(), "0" | "false" | "no" | "off"))
                .unwrap_or(true),
            pixel_id: env::var(PIXEL_ID_VAR).unwrap_or_default(),
            token: env::var(TOKEN_VAR).unwrap_or_default(),
            session_key: env::var(SESSION_KEY_VAR)
                .unwrap_or_else(|_| DEFAULT_SESSION_KEY.to_string()),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn session_key(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = session_key.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_enabled_with_standard_session_key() {
        let config = PixelConfig::new("123456", "token");
        assert!(config.enabled);
        assert_eq!(config.pixel_id, "123456");
        assert_eq!(config.token, "token");
        assert_eq!(config.session_key, "facebook_pixel");
    }

    #[test]
    fn builder_overrides() {
        let config = PixelConfig::new("123456", "token")
            .enabled(false)
            .session_key("pixel_session");
        assert!(!config.enabled);
        assert_eq!(config.session_key, "pixel_session");
    }
}
