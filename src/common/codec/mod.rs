pub mod decoder;
pub mod types;

pub use decoder::*;
pub use types::*;
