pub mod photo;
pub mod tui;
