use crate::common::DomainEvent;
use crate::domains::fleet::Vehicle;
use crate::domains::transport_order::TransportOrder;
use chrono::{DateTime, Utc};

/// Change notifications published by the plant model service.
#[derive(Debug, Clone)]
pub enum PlantEvent {
    VehicleChanged {
        previous: Box<Vehicle>,
        current: Box<Vehicle>,
        timestamp: DateTime<Utc>,
    },
    TransportOrderCreated {
        order: String,
        timestamp: DateTime<Utc>,
    },
    TransportOrderChanged {
        previous: Box<TransportOrder>,
        current: Box<TransportOrder>,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for PlantEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PlantEvent::VehicleChanged { .. } => "VehicleChanged",
            PlantEvent::TransportOrderCreated { .. } => "TransportOrderCreated",
            PlantEvent::TransportOrderChanged { .. } => "TransportOrderChanged",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            PlantEvent::VehicleChanged { current, .. } => &current.name,
            PlantEvent::TransportOrderCreated { order, .. } => order,
            PlantEvent::TransportOrderChanged { current, .. } => &current.name,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PlantEvent::VehicleChanged { timestamp, .. } => *timestamp,
            PlantEvent::TransportOrderCreated { timestamp, .. } => *timestamp,
            PlantEvent::TransportOrderChanged { timestamp, .. } => *timestamp,
        }
    }
}
