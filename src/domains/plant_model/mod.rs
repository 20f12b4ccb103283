pub mod events;
pub mod model;
pub mod ports;

pub use events::*;
pub use model::*;
pub use ports::*;
