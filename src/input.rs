use egui::{Event, PointerButton, Pos2, Rect, TouchId, TouchPhase};

/// Pointer input already mapped into canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasPointer {
    Down(Pos2),
    Move(Pos2),
    Up,
}

/// Where the gesture in progress came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveGesture {
    Mouse,
    Touch(TouchId),
}

/// Normalizes mouse and touch events into one stream of [`CanvasPointer`]s.
///
/// A gesture must start inside the canvas rect; once started it is followed
/// until release even if the pointer leaves the canvas. Only one gesture is
/// tracked at a time, so the pointer events egui synthesizes for a touch are
/// ignored while the touch itself is being followed.
#[derive(Debug, Clone)]
pub struct PointerNormalizer {
    canvas_rect: Rect,
    active: Option<ActiveGesture>,
}

impl PointerNormalizer {
    pub fn new(canvas_rect: Rect) -> Self {
        Self {
            canvas_rect,
            active: None,
        }
    }

    /// Update the canvas rectangle (e.g. if window is resized)
    pub fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = rect;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Map a screen position into canvas coordinates
    pub fn to_canvas(&self, screen: Pos2) -> Pos2 {
        (screen - self.canvas_rect.min).to_pos2()
    }

    /// Process one frame worth of raw egui events
    pub fn process_events(&mut self, events: &[Event]) -> Vec<CanvasPointer> {
        let mut out = Vec::new();

        for event in events {
            match event {
                Event::Touch { id, phase, pos, .. } => self.on_touch(*id, *phase, *pos, &mut out),
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    if *pressed {
                        if self.active.is_none() && self.canvas_rect.contains(*pos) {
                            self.active = Some(ActiveGesture::Mouse);
                            out.push(CanvasPointer::Down(self.to_canvas(*pos)));
                        }
                    } else if self.active == Some(ActiveGesture::Mouse) {
                        self.active = None;
                        out.push(CanvasPointer::Up);
                    }
                }
                Event::PointerMoved(pos) => {
                    if self.active == Some(ActiveGesture::Mouse) {
                        out.push(CanvasPointer::Move(self.to_canvas(*pos)));
                    }
                }
                Event::PointerGone => {
                    if self.active == Some(ActiveGesture::Mouse) {
                        self.active = None;
                        out.push(CanvasPointer::Up);
                    }
                }
                _ => {}
            }
        }

        out
    }

    fn on_touch(&mut self, id: TouchId, phase: TouchPhase, pos: Pos2, out: &mut Vec<CanvasPointer>) {
        match phase {
            TouchPhase::Start => {
                if self.active.is_none() && self.canvas_rect.contains(pos) {
                    self.active = Some(ActiveGesture::Touch(id));
                    out.push(CanvasPointer::Down(self.to_canvas(pos)));
                }
            }
            TouchPhase::Move => {
                if self.active == Some(ActiveGesture::Touch(id)) {
                    out.push(CanvasPointer::Move(self.to_canvas(pos)));
                }
            }
            TouchPhase::End | TouchPhase::Cancel => {
                if self.active == Some(ActiveGesture::Touch(id)) {
                    self.active = None;
                    out.push(CanvasPointer::Up);
                }
            }
        }
    }
}
