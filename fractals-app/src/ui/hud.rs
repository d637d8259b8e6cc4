use eframe::egui;

use fractals_core::FractalKind;
use fractals_engine::RenderState;

use crate::app::{FractalsApp, HUD_CORNER_RADIUS, HUD_MARGIN};

const HUD_ALPHA: u8 = 166;

fn hud_frame() -> egui::Frame {
    egui::Frame::NONE
        .fill(egui::Color32::from_black_alpha(HUD_ALPHA))
        .inner_margin(egui::Margin::same(8))
        .corner_radius(HUD_CORNER_RADIUS)
}

impl FractalsApp {
    pub(crate) fn show_hud(&mut self, ctx: &egui::Context) {
        if !self.show_hud {
            return;
        }

        // -- Top-left: view parameters --
        egui::Area::new(egui::Id::new("hud_params"))
            .anchor(egui::Align2::LEFT_TOP, [HUD_MARGIN, HUD_MARGIN])
            .show(ctx, |ui| {
                hud_frame().show(ui, |ui| {
                    ui.style_mut().visuals.override_text_color =
                        Some(egui::Color32::from_rgb(220, 220, 220));

                    let fractal = self.scheduler.fractal();
                    ui.label(format!("Fractal: {}", fractal.kind.label()));
                    if fractal.kind == FractalKind::Julia {
                        ui.label(format!(
                            "Seed: {:.6} {:+.6}i",
                            fractal.julia_seed.re, fractal.julia_seed.im
                        ));
                    }

                    let plane = self.scheduler.viewport().plane();
                    let cx = (plane.x_min + plane.x_max) / 2.0;
                    let cy = (plane.y_min + plane.y_max) / 2.0;
                    ui.label(format!("Center: {cx:.10} {cy:+.10}i"));
                    ui.label(format!("Width: {:.3e}", plane.x_max - plane.x_min));
                    ui.label(format!("Iterations: {}", self.scheduler.max_iterations()));

                    let color = self.scheduler.color();
                    ui.label(format!(
                        "Color: {} ({})",
                        color.mode.label(),
                        if color.smooth_full_res() { "smooth" } else { "banded" }
                    ));

                    if let Some(pad) = &self.gamepad_status {
                        let state = if pad.connected { "connected" } else { "disconnected" };
                        ui.label(format!("Gamepad {}: {state}", pad.device_id));
                    }
                    if let Some(msg) = &self.status_message {
                        ui.colored_label(egui::Color32::from_rgb(255, 180, 50), msg);
                    }
                });
            });

        // -- Bottom-centre: render progress and worker stats --
        egui::Area::new(egui::Id::new("hud_render"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -HUD_MARGIN])
            .show(ctx, |ui| {
                hud_frame().show(ui, |ui| {
                    ui.set_min_width(220.0);
                    ui.style_mut().visuals.override_text_color =
                        Some(egui::Color32::from_rgb(200, 200, 200));
                    ui.style_mut().spacing.item_spacing.y = 2.0;

                    ui.horizontal(|ui| {
                        if self.fetching {
                            ui.spinner();
                            ui.colored_label(egui::Color32::YELLOW, "Rendering");
                        } else {
                            ui.colored_label(egui::Color32::from_rgb(100, 255, 100), "Done");
                        }
                        let phase = match self.scheduler.state() {
                            RenderState::Idle => "idle",
                            RenderState::Dirty => "dirty",
                            RenderState::PreviewDispatched => "preview",
                            RenderState::FullResArmed => "full-res armed",
                            RenderState::FullResDispatched => "full-res",
                        };
                        ui.label(format!("({phase})"));
                    });

                    let res = self.scheduler.resolution();
                    let counts = self.scheduler.dispatch_counts();
                    ui.label(format!(
                        "{}x{}, {} previews, {} full-res",
                        res.width, res.height, counts.previews, counts.full_res
                    ));
                    if !self.initial_rendered {
                        ui.label("Waiting for first frame...");
                    }

                    egui::Grid::new("worker_stats")
                        .num_columns(3)
                        .spacing([12.0, 2.0])
                        .show(ui, |ui| {
                            ui.label("Worker");
                            ui.label("Preview");
                            ui.label("Full");
                            ui.end_row();
                            for stat in &self.worker_stats {
                                ui.label(format!("#{}", stat.worker_id));
                                ui.label(format!("{:.1} ms", stat.last_preview_ms));
                                ui.label(format!("{:.1} ms", stat.last_full_res_ms));
                                ui.end_row();
                            }
                        });
                });
            });
    }
}
