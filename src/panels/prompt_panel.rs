use crate::SketchApp;

pub fn prompt_panel(app: &mut SketchApp, ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("prompt_panel")
        .resizable(false)
        .show(ctx, |ui| {
            ui.add_space(6.0);
            let generating = app.shell.is_generating();

            ui.horizontal(|ui| {
                let prompt_width = (ui.available_width() - 140.0).max(120.0);
                ui.add_enabled(
                    !generating,
                    egui::TextEdit::multiline(&mut app.shell.prompt)
                        .hint_text("Describe the product, e.g. \"brushed steel desk lamp\"")
                        .desired_rows(2)
                        .desired_width(prompt_width),
                );

                ui.vertical(|ui| {
                    let can_generate = !generating && app.shell.has_generator();
                    if ui.add_enabled(can_generate, egui::Button::new("Generate")).clicked() {
                        // Failures are shown inline by the shell
                        let _ = app.shell.generate(&app.surface);
                    }
                    if generating {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Rendering…");
                        });
                    }
                });
            });

            if !app.shell.has_generator() {
                ui.colored_label(
                    ui.visuals().warn_fg_color,
                    "Set GEMINI_API_KEY and restart to enable rendering.",
                );
            }

            if let Some(error) = app.shell.error().map(str::to_owned) {
                ui.horizontal(|ui| {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                    if ui.small_button("✖").clicked() {
                        app.shell.dismiss_error();
                    }
                });
            }
            ui.add_space(6.0);
        });
}
