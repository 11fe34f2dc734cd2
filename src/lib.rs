#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod canvas;
pub mod components;
pub mod config;
pub mod error;
pub mod file_handler;
pub mod gallery;
pub mod generation;
pub mod history;
pub mod input;
pub mod panels;
pub mod shell;
pub mod snapshot;
pub mod stroke;
pub mod surface;
pub mod texture_manager;
pub mod tool;
pub mod util;

pub use app::SketchApp;
pub use canvas::CanvasBuffer;
pub use config::AppConfig;
pub use error::{GalleryError, GenerateError, SnapshotError};
pub use gallery::{GalleryRepository, KeyValueStore, MemoryStore, SavedItem};
pub use generation::{GenerationResult, ImageGenerator};
pub use history::SnapshotHistory;
pub use input::{CanvasPointer, PointerNormalizer};
pub use shell::AppShell;
pub use snapshot::Snapshot;
pub use stroke::Stroke;
pub use surface::{CanvasControl, DrawingSurface};
pub use tool::{ToolSettings, ToolType};
