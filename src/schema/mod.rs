//! Schema model the engine validates against

mod loader;
mod model;

pub use model::{Column, Schema, Table};
