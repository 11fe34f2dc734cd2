use egui::Color32;
use serde::{Deserialize, Serialize};

/// Tools available on the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolType {
    #[default]
    Pen,
    Eraser,
}

impl ToolType {
    pub const ALL: [ToolType; 2] = [ToolType::Pen, ToolType::Eraser];

    pub fn name(&self) -> &'static str {
        match self {
            ToolType::Pen => "Pen",
            ToolType::Eraser => "Eraser",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ToolType::Pen => "✏",
            ToolType::Eraser => "⌫",
        }
    }
}

/// What the next stroke will look like
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub tool: ToolType,
    pub color: Color32,
    pub size: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolType::Pen,
            color: Color32::BLACK,
            size: 5.0,
        }
    }
}

impl ToolSettings {
    /// The eraser paints with the canvas background
    pub fn stroke_color(&self, background: Color32) -> Color32 {
        match self.tool {
            ToolType::Pen => self.color,
            ToolType::Eraser => background,
        }
    }
}
