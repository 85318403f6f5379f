use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixelError {
    #[error(
        "No Conversions API token is set. Provide one via PixelConfig or FACEBOOK_PIXEL_TOKEN."
    )]
    MissingToken,

    #[error("Conversions API rejected the request with status {status}: {body}")]
    Api { status: u16, body: serde_json::Value },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PixelError>;
