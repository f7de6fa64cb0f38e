pub mod achievements_panel;
pub mod dashboard;
pub mod hud;
pub mod menu;
pub mod notification;
pub mod progress_bar;
pub mod typing_area;
