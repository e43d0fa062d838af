pub mod keymap;

pub use keymap::{AppKey, app_key_for, nav_key_for};
