//! Turning a sketch plus a prompt into a rendered image.

mod gemini;
mod job;

use crate::error::GenerateError;
use crate::snapshot::Snapshot;

pub use gemini::GeminiGenerator;
pub use job::GenerationJob;

/// A service that renders a sketch according to a text prompt
pub trait ImageGenerator: Send + Sync {
    fn generate(&self, sketch: &Snapshot, prompt: &str) -> Result<Snapshot, GenerateError>;
}

/// A finished render together with what produced it
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub sketch: Snapshot,
    pub image: Snapshot,
    pub prompt: String,
    /// Unix timestamp in milliseconds
    pub created_at: u64,
}

/// Wrap the user's prompt in the instruction sent alongside the sketch
pub fn build_instruction(prompt: &str) -> String {
    format!(
        "Transform this rough sketch into a photorealistic product render. \
         Keep the composition and proportions of the sketch. {}",
        prompt.trim()
    )
}
