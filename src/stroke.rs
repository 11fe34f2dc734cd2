use egui::{Color32, Pos2};

/// A stroke being drawn on the canvas.
///
/// Strokes are transient: only their rasterized effect survives in the
/// canvas buffer once the pointer is released.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Pos2>,
    color: Color32,
    thickness: f32,
}

impl Stroke {
    /// Start a new stroke at `start`
    pub fn new(start: Pos2, color: Color32, thickness: f32) -> Self {
        Self {
            points: vec![start],
            color,
            thickness,
        }
    }

    /// Extend the path, returning the segment that now needs rasterizing
    pub fn add_point(&mut self, point: Pos2) -> Option<(Pos2, Pos2)> {
        let from = self.last_point()?;
        self.points.push(point);
        Some((from, point))
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn last_point(&self) -> Option<Pos2> {
        self.points.last().copied()
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }
}
