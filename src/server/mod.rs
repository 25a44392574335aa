pub mod node;
pub mod settings;

pub use settings::*;
