//! Saving and loading battles

pub mod save;

pub use save::{from_json, load_battle, save_battle, to_json};
