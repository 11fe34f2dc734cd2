use crate::SketchApp;
use crate::components::ToolButton;
use crate::surface::CanvasControl;
use crate::tool::ToolType;

pub fn tools_panel(app: &mut SketchApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(false)
        .default_width(170.0)
        .show(ctx, |ui| {
            ui.heading("Tools");

            ui.horizontal(|ui| {
                for tool in ToolType::ALL {
                    let selected = app.shell.settings.tool == tool;
                    if ToolButton::new(tool, selected).show(ui).clicked() {
                        log::info!("Tool selected from UI: {}", tool.name());
                        app.shell.settings.tool = tool;
                    }
                }
            });
            ui.separator();

            let settings = &mut app.shell.settings;
            ui.horizontal(|ui| {
                ui.label("Color:");
                egui::color_picker::color_edit_button_srgba(
                    ui,
                    &mut settings.color,
                    egui::color_picker::Alpha::Opaque,
                );
            });
            ui.horizontal(|ui| {
                ui.label("Size:");
                ui.add(egui::Slider::new(&mut settings.size, 1.0..=60.0));
            });
            ui.separator();

            ui.horizontal(|ui| {
                if ui.add_enabled(app.surface.can_undo(), egui::Button::new("Undo")).clicked() {
                    app.surface.undo();
                }
                if ui.button("Clear").clicked() {
                    app.surface.clear();
                }
            });

            let history = app.surface.history();
            ui.label(format!("Undo steps: {}/{}", history.len(), history.capacity()));
            ui.separator();

            ui.small("Drop an image onto the window to load it into the canvas.");
        });
}
