use eframe::egui;

use fractals_core::{ColorMode, FractalKind, MAX_ITERATIONS, MIN_ITERATIONS};

use crate::app::FractalsApp;

impl FractalsApp {
    pub(crate) fn show_settings_panel(&mut self, ctx: &egui::Context) {
        if !self.show_hud {
            return;
        }

        egui::Area::new(egui::Id::new("settings_toggle"))
            .anchor(egui::Align2::RIGHT_TOP, [-crate::app::HUD_MARGIN, crate::app::HUD_MARGIN])
            .show(ctx, |ui| {
                if ui
                    .button(if self.show_settings { "Hide settings" } else { "Settings" })
                    .clicked()
                {
                    self.show_settings = !self.show_settings;
                }
            });

        if !self.show_settings {
            return;
        }

        let mut open = true;
        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(false)
            .default_width(300.0)
            .anchor(egui::Align2::RIGHT_TOP, [-crate::app::HUD_MARGIN, 40.0])
            .frame(
                egui::Frame::window(&ctx.style())
                    .fill(egui::Color32::from_rgba_unmultiplied(10, 10, 10, 210)),
            )
            .show(ctx, |ui| {
                self.fractal_section(ui);
                ui.separator();
                self.color_section(ui);
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Reset view").clicked() {
                        self.scheduler.reset_view();
                    }
                    if ui.button("Save PNG").clicked() {
                        self.export_snapshot();
                    }
                });
                ui.label("Drag to pan, scroll to zoom. R reset, S save, H hide HUD, Tab settings.");
            });
        if !open {
            self.show_settings = false;
        }
    }

    fn fractal_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Fractal");

        let mut kind = self.scheduler.fractal().kind;
        egui::ComboBox::from_label("Kind")
            .selected_text(kind.label())
            .show_ui(ui, |ui| {
                for k in [FractalKind::Mandelbrot, FractalKind::Julia] {
                    ui.selectable_value(&mut kind, k, k.label());
                }
            });
        self.scheduler.set_fractal_kind(kind);

        if kind == FractalKind::Julia {
            let seed = self.scheduler.fractal().julia_seed;
            let (mut re, mut im) = (seed.re, seed.im);
            ui.horizontal(|ui| {
                ui.label("Seed");
                let re_changed = ui
                    .add(egui::DragValue::new(&mut re).speed(0.001).range(-2.0..=2.0))
                    .changed();
                let im_changed = ui
                    .add(
                        egui::DragValue::new(&mut im)
                            .speed(0.001)
                            .range(-2.0..=2.0)
                            .suffix("i"),
                    )
                    .changed();
                if re_changed || im_changed {
                    self.scheduler.set_julia_seed(re, im);
                }
            });
        }

        let mut iterations = self.scheduler.max_iterations();
        if ui
            .add(
                egui::Slider::new(&mut iterations, MIN_ITERATIONS..=MAX_ITERATIONS)
                    .logarithmic(true)
                    .text("Iterations"),
            )
            .changed()
        {
            self.scheduler.set_max_iterations(iterations);
        }
    }

    fn color_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Color");

        let color = self.scheduler.color();
        let (mut hue, mut saturation, mut value) = (color.hue, color.saturation, color.value);
        let mut changed = ui
            .add(egui::Slider::new(&mut hue, 0.0..=360.0).text("Hue"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut saturation, 0.0..=1.0).text("Saturation"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut value, 0.0..=1.0).text("Value"))
            .changed();
        if changed {
            self.scheduler.set_hsv(hue, saturation, value);
        }

        let mut mode = color.mode;
        egui::ComboBox::from_label("Varying channel")
            .selected_text(mode.label())
            .show_ui(ui, |ui| {
                for m in ColorMode::ALL {
                    ui.selectable_value(&mut mode, m, m.label());
                }
            });
        self.scheduler.set_color_mode(mode);

        let mut smooth = color.smooth_full_res();
        if ui.checkbox(&mut smooth, "Smooth coloring").changed() {
            self.scheduler.set_smooth_full_res(smooth);
        }
        let mut smooth_preview = self.scheduler.color().smooth_preview();
        if ui
            .add_enabled(
                self.scheduler.color().smooth_full_res(),
                egui::Checkbox::new(&mut smooth_preview, "Smooth preview"),
            )
            .changed()
        {
            self.scheduler.set_smooth_preview(smooth_preview);
        }
    }
}
