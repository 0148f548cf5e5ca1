mod block;
mod decoder;
mod galois;

pub use block::*;
pub use decoder::*;
pub(crate) use galois::G;
