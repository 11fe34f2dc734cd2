use std::sync::Arc;
use std::time::Duration;

use egui::{ColorImage, Id, TextureId};

use crate::config::{AppConfig, CONFIG_KEY};
use crate::file_handler::FileHandler;
use crate::gallery::{FileStore, GalleryRepository, MemoryStore};
use crate::generation::{GeminiGenerator, ImageGenerator};
use crate::history::SnapshotHistory;
use crate::input::PointerNormalizer;
use crate::panels;
use crate::shell::AppShell;
use crate::snapshot::Snapshot;
use crate::surface::{CanvasControl, DrawingSurface};
use crate::texture_manager::{TextureGenerationError, TextureManager};

/// Used for the window title and the per-app data directory
pub const APP_ID: &str = "Sketch Render";

const CANVAS_TEXTURE: &str = "canvas";
const TEXTURE_CACHE_SIZE: usize = 64;

pub struct SketchApp {
    pub(crate) config: AppConfig,
    pub(crate) surface: DrawingSurface,
    pub(crate) shell: AppShell,
    pub(crate) pointer: PointerNormalizer,
    pub(crate) textures: TextureManager,
    file_handler: FileHandler,
}

impl SketchApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = AppConfig::load(cc.storage);

        let gallery = match FileStore::default_path(APP_ID) {
            Some(path) => {
                log::info!("Gallery stored at {}", path.display());
                GalleryRepository::load(FileStore::open(path))
            }
            None => {
                log::warn!("No data directory available, saved items will not persist");
                GalleryRepository::load(MemoryStore::new())
            }
        };

        let generator = build_generator(&config);
        Self::with_parts(config, gallery, generator)
    }

    /// Assemble the app from explicit collaborators
    pub fn with_parts(
        config: AppConfig,
        gallery: GalleryRepository,
        generator: Option<Arc<dyn ImageGenerator>>,
    ) -> Self {
        // The canvas is sized to its panel on the first frame
        let surface = DrawingSurface::with_history(
            1,
            1,
            config.background_color(),
            SnapshotHistory::with_capacity(config.history_capacity),
        );
        let shell = AppShell::new(config.tool_settings(), gallery, generator);

        Self {
            config,
            surface,
            shell,
            pointer: PointerNormalizer::new(egui::Rect::NOTHING),
            textures: TextureManager::new(TEXTURE_CACHE_SIZE),
            file_handler: FileHandler::new(),
        }
    }

    /// Texture showing the current canvas pixels
    pub(crate) fn canvas_texture(&mut self, ctx: &egui::Context) -> Option<TextureId> {
        let surface = &self.surface;
        self.textures
            .get_or_create_texture(
                Id::new(CANVAS_TEXTURE),
                surface.revision(),
                || Ok(surface.canvas().to_color_image()),
                ctx,
            )
            .map_err(|err| log::error!("Failed to upload canvas: {}", err))
            .ok()
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // Let text fields keep their own undo
        if ctx.wants_keyboard_input() {
            return;
        }

        let undo = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Z);
        if ctx.input_mut(|i| i.consume_shortcut(&undo)) {
            self.surface.undo();
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        if !self.file_handler.check_for_dropped_files(ctx) {
            return;
        }

        // Only the last image survives on screen, but each load is an undo step
        for snapshot in self.file_handler.process_dropped_files() {
            if let Err(err) = self.surface.load_image(&snapshot) {
                log::error!("Failed to load dropped image: {}", err);
            }
        }
    }
}

/// Texture for a snapshot, cached by its contents
pub(crate) fn snapshot_texture(
    textures: &mut TextureManager,
    snapshot: &Snapshot,
    ctx: &egui::Context,
) -> Option<TextureId> {
    textures
        .get_or_create_texture(
            Id::new(snapshot.content_hash()),
            0,
            || {
                let pixels = snapshot
                    .decode()
                    .map_err(|err| TextureGenerationError::GenerationFailed(err.to_string()))?;
                Ok(ColorImage::from_rgba_unmultiplied(snapshot.size(), pixels.as_raw()))
            },
            ctx,
        )
        .map_err(|err| log::error!("Failed to upload image: {}", err))
        .ok()
}

fn build_generator(config: &AppConfig) -> Option<Arc<dyn ImageGenerator>> {
    let Some(api_key) = AppConfig::resolve_api_key(|key| std::env::var(key).ok()) else {
        log::warn!("No API key in the environment, rendering is disabled");
        return None;
    };

    match GeminiGenerator::new(config, api_key) {
        Ok(generator) => {
            log::info!("Rendering with {}", generator.model());
            Some(Arc::new(generator))
        }
        Err(err) => {
            log::error!("Failed to set up image generation: {}", err);
            None
        }
    }
}

impl eframe::App for SketchApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.config.remember_tool_settings(&self.shell.settings);
        eframe::set_value(storage, CONFIG_KEY, &self.config);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.textures.begin_frame();

        if self.shell.poll_generation() {
            ctx.request_repaint();
        }
        if self.shell.is_generating() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        self.handle_shortcuts(ctx);
        self.handle_dropped_files(ctx);

        panels::tools_panel(self, ctx);
        panels::gallery_panel(self, ctx);
        panels::prompt_panel(self, ctx);
        panels::central_panel(self, ctx);

        self.file_handler.preview_files_being_dropped(ctx);
    }
}
