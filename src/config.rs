use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::tool::ToolSettings;

/// Storage key for the persisted settings
pub const CONFIG_KEY: &str = "sketch_render.config";

pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
pub const MODEL_VAR: &str = "SKETCH_RENDER_MODEL";
pub const BASE_URL_VAR: &str = "SKETCH_RENDER_BASE_URL";

/// Application settings.
///
/// Persisted through eframe's storage on shutdown. The API key is never part
/// of this struct; it only comes from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct AppConfig {
    /// Image model used for renders
    pub model: String,
    /// Base URL of the generative language API
    pub base_url: String,
    /// Canvas background, RGB
    pub background: [u8; 3],
    /// Pen color on startup, RGBA
    pub default_color: [u8; 4],
    pub default_brush_size: f32,
    pub history_capacity: usize,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-image-preview".to_owned(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            background: [255, 255, 255],
            default_color: [0, 0, 0, 255],
            default_brush_size: 5.0,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            request_timeout_secs: 120,
        }
    }
}

impl AppConfig {
    /// Load persisted settings, then apply environment overrides
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        let persisted: Option<AppConfig> =
            storage.and_then(|storage| eframe::get_value(storage, CONFIG_KEY));
        if persisted.is_none() {
            log::debug!("No persisted settings, using defaults");
        }
        persisted
            .unwrap_or_default()
            .with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply endpoint overrides from `lookup` (normally the environment)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(model) = non_empty(lookup(MODEL_VAR)) {
            self.model = model;
        }
        if let Some(base_url) = non_empty(lookup(BASE_URL_VAR)) {
            self.base_url = base_url;
        }
        self
    }

    /// Find the API key, preferring `GEMINI_API_KEY`
    pub fn resolve_api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        API_KEY_VARS
            .iter()
            .find_map(|key| non_empty(lookup(*key)))
    }

    pub fn background_color(&self) -> Color32 {
        let [r, g, b] = self.background;
        Color32::from_rgb(r, g, b)
    }

    pub fn tool_settings(&self) -> ToolSettings {
        let [r, g, b, a] = self.default_color;
        ToolSettings {
            color: Color32::from_rgba_unmultiplied(r, g, b, a),
            size: self.default_brush_size,
            ..Default::default()
        }
    }

    /// Remember the current pen so it is restored on the next start
    pub fn remember_tool_settings(&mut self, settings: &ToolSettings) {
        self.default_color = settings.color.to_srgba_unmultiplied();
        self.default_brush_size = settings.size;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
