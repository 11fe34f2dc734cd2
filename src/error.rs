use thiserror::Error;

/// Errors that can occur while encoding or decoding canvas snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Invalid image data URL")]
    InvalidDataUrl,

    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors surfaced by the image generation workflow.
///
/// The `Display` text is what the user sees inline, so keep it readable.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Please enter a prompt")]
    EmptyPrompt,

    #[error("No API key configured. Set GEMINI_API_KEY and restart.")]
    MissingApiKey,

    #[error("A generation is already in progress")]
    Busy,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Image service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response from image service: {0}")]
    MalformedResponse(String),

    #[error("The image service did not return an image")]
    NoImage,

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        GenerateError::Network(err.to_string())
    }
}

/// Errors that can occur while reading or writing the gallery
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Failed to serialize gallery: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write gallery: {0}")]
    Write(#[from] std::io::Error),

    #[error("No saved item with id {0}")]
    NotFound(uuid::Uuid),

    #[error("There is no generated image to save")]
    NoResult,

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
