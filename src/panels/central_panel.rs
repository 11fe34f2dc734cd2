use crate::SketchApp;
use crate::input::CanvasPointer;

pub fn central_panel(app: &mut SketchApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::drag());
            let rect = response.rect;

            app.surface
                .resize_to_fit(rect.width().floor() as u32, rect.height().floor() as u32);
            app.pointer.set_canvas_rect(rect);

            // Popups over the canvas (e.g. the color picker) keep their clicks
            if response.hovered() || app.pointer.is_active() {
                let events = ui.input(|i| i.events.clone());
                for pointer in app.pointer.process_events(&events) {
                    match pointer {
                        CanvasPointer::Down(pos) => app.surface.begin_stroke(pos, &app.shell.settings),
                        CanvasPointer::Move(pos) => app.surface.extend_stroke(pos),
                        CanvasPointer::Up => app.surface.end_stroke(),
                    }
                }
            }

            if let Some(texture) = app.canvas_texture(ctx) {
                let size = egui::vec2(app.surface.width() as f32, app.surface.height() as f32);
                painter.image(
                    texture,
                    egui::Rect::from_min_size(rect.min, size),
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            if response.hovered() {
                ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
            }
        });
}
