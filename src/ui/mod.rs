//! Terminal shell: sidebar navigation, the login surface, and the two record
//! screens, drawn with ratatui on top of crossterm.

mod app;
mod forms;
mod helpers;
mod loader;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
