mod app;
mod app_dir;
mod gamepad;
mod input;
mod preferences;
mod ui;

fn main() -> eframe::Result {
    app::run()
}
