use egui::load::SizedTexture;
use uuid::Uuid;

use crate::SketchApp;
use crate::app::snapshot_texture;
use crate::util::time;

const THUMBNAIL_SIZE: f32 = 64.0;

pub fn gallery_panel(app: &mut SketchApp, ctx: &egui::Context) {
    egui::SidePanel::right("gallery_panel")
        .resizable(true)
        .default_width(280.0)
        .show(ctx, |ui| {
            ui.heading("Result");
            result_section(app, ui);
            ui.separator();

            ui.heading(format!("Gallery ({})", app.shell.gallery().len()));
            gallery_section(app, ui);
        });
}

fn result_section(app: &mut SketchApp, ui: &mut egui::Ui) {
    let Some(result) = app.shell.result().cloned() else {
        ui.label("Draw a sketch, describe it below and press Generate.");
        return;
    };

    let ctx = ui.ctx().clone();
    if let Some(texture) = snapshot_texture(&mut app.textures, &result.image, &ctx) {
        let size = fit_size(result.image.size(), ui.available_width());
        ui.add(egui::Image::new(SizedTexture::new(texture, size)));
    }
    ui.label(result.prompt.as_str());

    // Failures below are shown inline by the shell
    ui.horizontal(|ui| {
        if ui.button("Save").clicked() {
            let _ = app.shell.save_result();
        }
        if ui.button("Load into canvas").clicked() {
            let _ = app.shell.load_result_into(&mut app.surface);
        }
        if ui.button("Dismiss").clicked() {
            app.shell.clear_result();
        }
    });
}

fn gallery_section(app: &mut SketchApp, ui: &mut egui::Ui) {
    if app.shell.gallery().is_empty() {
        ui.label("Saved renders appear here.");
        return;
    }

    let ctx = ui.ctx().clone();
    let items = app.shell.gallery().items().to_vec();
    let now = time::timestamp_millis();
    let mut to_load: Option<Uuid> = None;
    let mut to_delete: Option<Uuid> = None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        for item in &items {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    if let Some(texture) = snapshot_texture(&mut app.textures, &item.result, &ctx) {
                        let size = fit_size(item.result.size(), THUMBNAIL_SIZE);
                        ui.add(egui::Image::new(SizedTexture::new(texture, size)));
                    }
                    ui.vertical(|ui| {
                        ui.label(item.prompt.as_str());
                        ui.small(format_age(item.created_at, now));
                        ui.horizontal(|ui| {
                            if ui.small_button("Load").clicked() {
                                to_load = Some(item.id);
                            }
                            if ui.small_button("Delete").clicked() {
                                to_delete = Some(item.id);
                            }
                        });
                    });
                });
            });
        }
    });

    if let Some(id) = to_load {
        let _ = app.shell.load_item_into(id, &mut app.surface);
    }
    if let Some(id) = to_delete {
        let _ = app.shell.delete_item(id);
    }
}

/// Scale `[width, height]` down to fit `max_width`, never up
fn fit_size(size: [usize; 2], max_width: f32) -> egui::Vec2 {
    let [width, height] = size;
    if width == 0 || height == 0 {
        return egui::Vec2::ZERO;
    }
    let scale = (max_width / width as f32).min(1.0);
    egui::vec2(width as f32 * scale, height as f32 * scale)
}

/// Short human description of how long ago `created_at` was
fn format_age(created_at: u64, now: u64) -> String {
    let secs = now.saturating_sub(created_at) / 1000;
    match secs {
        0..=59 => "saved just now".to_owned(),
        60..=3599 => format!("saved {} min ago", secs / 60),
        3600..=86_399 => format!("saved {} h ago", secs / 3600),
        _ => format!("saved {} days ago", secs / 86_400),
    }
}
