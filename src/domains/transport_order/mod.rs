pub mod order;
pub mod sequence;

pub use order::*;
pub use sequence::*;
