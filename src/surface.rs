//! The drawing surface: a raster canvas, the stroke in progress, and the
//! undo history behind it.
//!
//! Every mutating operation except resizing records the pre-mutation pixels
//! in the history first. Restores (undo, load) decode synchronously, so the
//! most recently issued restore is always the one that shows.

use egui::{Color32, Pos2};

use crate::canvas::CanvasBuffer;
use crate::error::SnapshotError;
use crate::history::SnapshotHistory;
use crate::snapshot::Snapshot;
use crate::stroke::Stroke;
use crate::tool::ToolSettings;

/// The narrow set of operations the rest of the application may perform on
/// the canvas.
pub trait CanvasControl {
    /// Record an undo step, then fill the canvas with its background
    fn clear(&mut self);

    /// Restore the most recent undo step. Returns false when there was none.
    fn undo(&mut self) -> bool;

    /// Encode the current canvas contents
    fn canvas_data(&self) -> Result<Snapshot, SnapshotError>;

    /// Record an undo step, then show `snapshot` at the origin
    fn load_image(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError>;
}

#[derive(Debug)]
pub struct DrawingSurface {
    canvas: CanvasBuffer,
    history: SnapshotHistory,
    stroke: Option<Stroke>,
    revision: u64,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32, background: Color32) -> Self {
        Self::with_history(width, height, background, SnapshotHistory::new())
    }

    pub fn with_history(
        width: u32,
        height: u32,
        background: Color32,
        history: SnapshotHistory,
    ) -> Self {
        Self {
            canvas: CanvasBuffer::new(width, height, background),
            history,
            stroke: None,
            revision: 0,
        }
    }

    pub fn canvas(&self) -> &CanvasBuffer {
        &self.canvas
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Incremented whenever the pixels change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Start a stroke at `position` using the current tool settings
    pub fn begin_stroke(&mut self, position: Pos2, settings: &ToolSettings) {
        self.checkpoint();

        let color = settings.stroke_color(self.canvas.background());
        let stroke = Stroke::new(position, color, settings.size);
        self.canvas.draw_dot(position, stroke.thickness(), stroke.color());
        self.stroke = Some(stroke);
        self.touch();
    }

    /// Extend the stroke in progress and rasterize the new segment
    pub fn extend_stroke(&mut self, position: Pos2) {
        let Some(stroke) = &mut self.stroke else {
            return;
        };

        if let Some((from, to)) = stroke.add_point(position) {
            self.canvas.draw_segment(from, to, stroke.thickness(), stroke.color());
            self.touch();
        }
    }

    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.stroke.take() {
            log::debug!("Finished stroke with {} points", stroke.points().len());
        }
    }

    /// Fit the canvas to new display dimensions without scaling.
    ///
    /// Returns true if the buffer was reallocated. Unchanged or zero-sized
    /// requests are ignored.
    pub fn resize_to_fit(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        if width == self.canvas.width() && height == self.canvas.height() {
            return false;
        }

        log::debug!(
            "Resizing canvas from {}x{} to {}x{}",
            self.canvas.width(),
            self.canvas.height(),
            width,
            height
        );
        self.canvas.reallocate(width, height);
        self.touch();
        true
    }

    /// Push the current pixels onto the undo history
    fn checkpoint(&mut self) {
        match Snapshot::capture(self.canvas.pixels()) {
            Ok(snapshot) => self.history.push(snapshot),
            Err(err) => log::error!("Failed to record undo step: {}", err),
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl CanvasControl for DrawingSurface {
    fn clear(&mut self) {
        self.checkpoint();
        self.canvas.fill_background();
        self.touch();
    }

    fn undo(&mut self) -> bool {
        self.stroke = None;

        let Some(snapshot) = self.history.pop() else {
            return false;
        };

        match snapshot.decode() {
            Ok(pixels) => {
                self.canvas.restore(&pixels);
                self.touch();
                true
            }
            Err(err) => {
                log::error!("Failed to restore undo step: {}", err);
                false
            }
        }
    }

    fn canvas_data(&self) -> Result<Snapshot, SnapshotError> {
        Snapshot::capture(self.canvas.pixels())
    }

    fn load_image(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let pixels = snapshot.decode()?;

        self.stroke = None;
        self.checkpoint();
        self.canvas.restore(&pixels);
        self.touch();
        log::info!(
            "Loaded {}x{} image into {}x{} canvas",
            snapshot.width(),
            snapshot.height(),
            self.canvas.width(),
            self.canvas.height()
        );
        Ok(())
    }
}
