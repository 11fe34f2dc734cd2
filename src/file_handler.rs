use eframe::egui;
use crate::snapshot::Snapshot;

/// Turns image files dropped onto the window into snapshots the canvas can load
#[derive(Debug, Default)]
pub struct FileHandler {
    dropped_files: Vec<egui::DroppedFile>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect newly dropped files from the UI context.
    /// Returns true if any files were dropped this frame.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        ctx.input(|i| {
            if !i.raw.dropped_files.is_empty() {
                self.dropped_files = i.raw.dropped_files.clone();
            }
        });

        !self.dropped_files.is_empty()
    }

    /// Decode the pending dropped files. Files that are not images or cannot
    /// be decoded are logged and skipped.
    pub fn process_dropped_files(&mut self) -> Vec<Snapshot> {
        std::mem::take(&mut self.dropped_files)
            .iter()
            .filter_map(|file| {
                let file_name = display_name(file);
                if !is_image_file(file) {
                    log::warn!("Dropped file is not a supported type: {}", file_name);
                    return None;
                }
                load_image_file(file, &file_name)
            })
            .collect()
    }

    /// Preview files being dragged over the application
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, Id, LayerId, Order, TextStyle};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }

        let text = ctx.input(|i| {
            let mut text = "Drop an image to load it onto the canvas:\n".to_owned();
            for file in &i.raw.hovered_files {
                if let Some(path) = &file.path {
                    text += &format!("\n{}", path.display());
                } else if !file.mime.is_empty() {
                    text += &format!("\n{}", file.mime);
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));

        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }
}

fn display_name(file: &egui::DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

/// Check if a file is an image based on MIME type or extension
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }

    let name = match &file.path {
        Some(path) => path.to_string_lossy().into_owned(),
        None => file.name.clone(),
    };
    std::path::Path::new(&name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp")
        })
        .unwrap_or(false)
}

fn load_image_file(file: &egui::DroppedFile, file_name: &str) -> Option<Snapshot> {
    let decoded = if let Some(bytes) = &file.bytes {
        log::info!("Loading dropped image from memory: {} ({} bytes)", file_name, bytes.len());
        Snapshot::from_image_bytes(bytes)
    } else if let Some(path) = &file.path {
        log::info!("Loading dropped image from path: {}", path.display());
        match std::fs::read(path) {
            Ok(bytes) => Snapshot::from_image_bytes(&bytes),
            Err(err) => {
                log::error!("Failed to read image file: {}: {}", path.display(), err);
                return None;
            }
        }
    } else {
        log::warn!("Dropped file has no accessible data: {}", file_name);
        return None;
    };

    match decoded {
        Ok(snapshot) => {
            log::debug!("Decoded dropped image: {}x{}", snapshot.width(), snapshot.height());
            Some(snapshot)
        }
        Err(err) => {
            log::error!("Failed to decode {}: {}", file_name, err);
            None
        }
    }
}
