use eframe::egui;

use crate::app::FractalsApp;

impl FractalsApp {
    pub(crate) fn handle_canvas_input(&mut self, ctx: &egui::Context, response: &egui::Response) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.scheduler.pointer_pressed();
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            self.scheduler.pointer_moved(delta.x as f64, delta.y as f64);
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.scheduler.pointer_released();
        }

        // egui reports wheel-up as positive; the engine zooms in on negative.
        let scroll_y = ctx.input(|i| i.raw_scroll_delta.y);
        if scroll_y != 0.0 && response.hovered() {
            self.scheduler.wheel(-scroll_y as f64);
        }

        if self.scheduler.is_dragging() {
            ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
        } else if response.hovered() {
            ctx.set_cursor_icon(egui::CursorIcon::Grab);
        }
    }

    pub(crate) fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }

        let (reset, export, toggle_hud, toggle_settings, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::R),
                i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::H),
                i.key_pressed(egui::Key::Tab),
                i.key_pressed(egui::Key::Escape),
            )
        });

        if reset {
            self.scheduler.reset_view();
        }
        if export {
            self.export_snapshot();
        }
        if toggle_hud {
            self.show_hud = !self.show_hud;
        }
        if toggle_settings {
            self.show_settings = !self.show_settings;
        }
        if escape {
            self.show_settings = false;
        }
    }
}
