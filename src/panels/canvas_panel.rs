use crate::SketchApp;
use egui::{pos2, Color32, Rect, Sense};

pub fn canvas_panel(app: &mut SketchApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| {
            let available = ui.available_size();
            app.ensure_board(available);

            let (response, painter) = ui.allocate_painter(available, Sense::drag());
            app.handle_canvas_input(ctx, response.rect, response.contains_pointer());

            painter.rect_filled(response.rect, 0.0, Color32::WHITE);
            if let Some((texture, size)) = app.canvas_texture(ctx) {
                let canvas = Rect::from_min_size(response.rect.min, size);
                let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                painter.image(texture, canvas, uv, Color32::WHITE);
            }
        });
}
