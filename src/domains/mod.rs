pub mod dispatching;
pub mod fleet;
pub mod plant_model;
pub mod transport_order;

pub use dispatching::*;
pub use fleet::*;
pub use plant_model::*;
pub use transport_order::*;
