use crate::board::ToolbarAction;
use crate::SketchApp;
use egui::color_picker::Alpha;
use egui::{Key, KeyboardShortcut, Modifiers};

const UNDO_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
const REDO_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Y);

pub fn toolbar_panel(app: &mut SketchApp, ctx: &egui::Context) {
    let mut actions = Vec::new();
    let mut share_requested = false;

    let availability = app.availability();
    if availability.can_undo && ctx.input_mut(|i| i.consume_shortcut(&UNDO_SHORTCUT)) {
        actions.push(ToolbarAction::Undo);
    }
    if availability.can_redo && ctx.input_mut(|i| i.consume_shortcut(&REDO_SHORTCUT)) {
        actions.push(ToolbarAction::Redo);
    }

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let Some(board) = app.board() else {
                ui.label("Preparing canvas…");
                return;
            };
            let mut style = board.style();

            ui.label("Stroke:");
            if egui::color_picker::color_edit_button_srgba(ui, &mut style.color, Alpha::Opaque).changed() {
                actions.push(ToolbarAction::SetColor(style.color));
            }

            ui.label("Width:");
            let range = app.settings().line_width_range();
            if ui.add(egui::Slider::new(&mut style.width, range)).changed() {
                actions.push(ToolbarAction::SetLineWidth(style.width));
            }

            ui.separator();

            if ui.button("Clear").clicked() {
                actions.push(ToolbarAction::Clear);
            }
            if ui.add_enabled(availability.can_undo, egui::Button::new("Undo")).clicked() {
                actions.push(ToolbarAction::Undo);
            }
            if ui.add_enabled(availability.can_redo, egui::Button::new("Redo")).clicked() {
                actions.push(ToolbarAction::Redo);
            }

            ui.separator();

            if ui.button("Share").clicked() {
                share_requested = true;
            }

            if let Some(status) = app.status() {
                ui.separator();
                ui.label(status);
            }
        });
    });

    for action in actions {
        log::debug!("Toolbar action: {:?}", action);
        app.apply(action, ctx);
    }
    if share_requested {
        app.share(ctx);
    }
}
