mod hud;
mod settings;
