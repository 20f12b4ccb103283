pub mod ports;
pub mod vehicle;

pub use ports::*;
pub use vehicle::*;
