pub mod graph_router;
pub mod in_memory_plant;
pub mod plant_data;
pub mod vehicle_controllers;

pub use graph_router::*;
pub use in_memory_plant::*;
pub use plant_data::*;
pub use vehicle_controllers::*;
