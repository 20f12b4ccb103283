//! The transport order dispatcher.

pub mod actors;
pub mod builder;
pub mod candidate;
pub mod context;
pub mod cycle;
pub mod evaluator;
pub mod filters;
pub mod positions;
pub mod priorities;
pub mod reservation;
pub mod trigger;

pub use actors::*;
pub use builder::*;
pub use candidate::*;
pub use context::*;
pub use cycle::*;
pub use evaluator::*;
pub use positions::*;
pub use reservation::*;
pub use trigger::*;
