use std::sync::Arc;

use uuid::Uuid;

use crate::error::{GalleryError, GenerateError, SnapshotError};
use crate::gallery::{GalleryRepository, SavedItem};
use crate::generation::{GenerationJob, GenerationResult, ImageGenerator};
use crate::surface::CanvasControl;
use crate::tool::ToolSettings;
use crate::util::time;

/// Everything the UI shows besides the canvas itself: tool settings, the
/// prompt, the latest render, inline errors and the gallery.
///
/// The shell only reaches the canvas through [`CanvasControl`].
pub struct AppShell {
    pub settings: ToolSettings,
    pub prompt: String,
    result: Option<GenerationResult>,
    error: Option<String>,
    gallery: GalleryRepository,
    generator: Option<Arc<dyn ImageGenerator>>,
    job: Option<GenerationJob>,
}

impl AppShell {
    pub fn new(
        settings: ToolSettings,
        gallery: GalleryRepository,
        generator: Option<Arc<dyn ImageGenerator>>,
    ) -> Self {
        Self {
            settings,
            prompt: String::new(),
            result: None,
            error: None,
            gallery,
            generator,
            job: None,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.job.is_some()
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    /// The inline error message, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn gallery(&self) -> &GalleryRepository {
        &self.gallery
    }

    /// Start rendering the current canvas with the current prompt.
    ///
    /// Input problems are reported inline and no request is made.
    pub fn generate(&mut self, canvas: &dyn CanvasControl) -> Result<(), GenerateError> {
        let started = self.start_generation(canvas);
        if let Err(err) = &started {
            self.error = Some(err.to_string());
        }
        started
    }

    fn start_generation(&mut self, canvas: &dyn CanvasControl) -> Result<(), GenerateError> {
        if self.job.is_some() {
            return Err(GenerateError::Busy);
        }

        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }

        let generator = self.generator.clone().ok_or(GenerateError::MissingApiKey)?;
        let sketch = canvas.canvas_data()?;

        log::info!("Starting generation for prompt {:?}", prompt);
        self.error = None;
        self.job = Some(GenerationJob::spawn(generator, sketch, prompt.to_owned()));
        Ok(())
    }

    /// Check on the running generation. Returns true when it finished during
    /// this call.
    pub fn poll_generation(&mut self) -> bool {
        let Some(job) = &mut self.job else {
            return false;
        };
        let Some(outcome) = job.poll() else {
            return false;
        };

        self.job = None;
        self.apply_outcome(outcome);
        true
    }

    /// Block until the running generation finishes
    pub fn wait_for_generation(&mut self) {
        if let Some(job) = self.job.take() {
            self.apply_outcome(job.wait());
        }
    }

    fn apply_outcome(&mut self, outcome: Result<GenerationResult, GenerateError>) {
        match outcome {
            Ok(result) => {
                log::info!(
                    "Generation finished: {}x{} image",
                    result.image.width(),
                    result.image.height()
                );
                self.result = Some(result);
                self.error = None;
            }
            Err(err) => {
                log::warn!("Generation failed: {}", err);
                self.error = Some(err.to_string());
            }
        }
    }

    pub fn clear_result(&mut self) {
        self.result = None;
    }

    /// Save the latest render to the front of the gallery
    pub fn save_result(&mut self) -> Result<Uuid, GalleryError> {
        let saved = self.try_save_result();
        self.report(saved)
    }

    fn try_save_result(&mut self) -> Result<Uuid, GalleryError> {
        let result = self.result.as_ref().ok_or(GalleryError::NoResult)?;
        let item = SavedItem::new(
            result.sketch.clone(),
            result.image.clone(),
            result.prompt.clone(),
            time::timestamp_millis(),
        );
        let id = item.id;
        self.gallery.add(item)?;
        Ok(id)
    }

    pub fn delete_item(&mut self, id: Uuid) -> Result<(), GalleryError> {
        let deleted = self.gallery.remove(id).map(|_| ());
        self.report(deleted)
    }

    /// Draw the latest render onto the canvas (undoable)
    pub fn load_result_into(&mut self, canvas: &mut dyn CanvasControl) -> Result<(), SnapshotError> {
        let Some(result) = &self.result else {
            return Ok(());
        };
        let loaded = canvas.load_image(&result.image);
        self.report(loaded)
    }

    /// Draw a saved render onto the canvas (undoable)
    pub fn load_item_into(
        &mut self,
        id: Uuid,
        canvas: &mut dyn CanvasControl,
    ) -> Result<(), GalleryError> {
        let loaded = match self.gallery.get(id) {
            Some(item) => canvas.load_image(&item.result).map_err(GalleryError::from),
            None => Err(GalleryError::NotFound(id)),
        };
        self.report(loaded)
    }

    fn report<T, E: std::fmt::Display>(&mut self, outcome: Result<T, E>) -> Result<T, E> {
        if let Err(err) = &outcome {
            log::warn!("{}", err);
            self.error = Some(err.to_string());
        }
        outcome
    }
}
