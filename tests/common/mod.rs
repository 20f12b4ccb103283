#![allow(dead_code)]

use fleet_dispatch::adapters::outbound::{GraphRouter, InMemoryPlantModel, InMemoryVehicleControllerPool};
use fleet_dispatch::config::DispatcherConfig;
use fleet_dispatch::domains::dispatching::{build_dispatch_cycle, DispatchCycle};
use fleet_dispatch::domains::fleet::{ProcState, Vehicle};
use fleet_dispatch::domains::plant_model::{Location, PlantEvent, PlantModel, PlantModelService, PointType};
use fleet_dispatch::domains::transport_order::{DriveOrder, OrderState, TransportOrder};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Points p1..p6 in a line, 10 apart, with two stations.
///
/// ```text
/// p1 -- p2 -- p3 -- p4 -- p5 -- p6
///             |                 |
///         Station-A         Station-B
/// ```
pub fn line_model() -> PlantModel {
    PlantModel::new()
        .with_point("p1", PointType::HaltPosition)
        .with_point("p2", PointType::HaltPosition)
        .with_point("p3", PointType::HaltPosition)
        .with_point("p4", PointType::HaltPosition)
        .with_point("p5", PointType::HaltPosition)
        .with_point("p6", PointType::HaltPosition)
        .with_bidirectional_path("p1", "p2", 10)
        .with_bidirectional_path("p2", "p3", 10)
        .with_bidirectional_path("p3", "p4", 10)
        .with_bidirectional_path("p4", "p5", 10)
        .with_bidirectional_path("p5", "p6", 10)
        .with_location_type("Station", &["LOAD", "UNLOAD"])
        .with_location_type("Charger", &["CHARGE"])
        .with_location_type("Parking", &["PARK"])
        .with_location(Location::new("Station-A", "Station").with_link("p3"))
        .with_location(Location::new("Station-B", "Station").with_link("p6"))
}

/// Defaults without the periodic timer and without parking.
pub fn test_config() -> DispatcherConfig {
    DispatcherConfig {
        dispatch_interval_ms: 0,
        park_idle_vehicles: false,
        ..DispatcherConfig::default()
    }
}

pub fn order_to(name: &str, location: &str, operation: &str) -> TransportOrder {
    TransportOrder::new(name, vec![DriveOrder::new(location, operation)])
}

pub struct TestPlant {
    pub service: Arc<InMemoryPlantModel>,
    pub router: Arc<GraphRouter>,
    pub controllers: Arc<InMemoryVehicleControllerPool>,
}

impl TestPlant {
    pub fn new(model: PlantModel) -> Self {
        Self::from_service(model.clone(), InMemoryPlantModel::new(model))
    }

    /// Also returns the receiver of the plant's change events.
    pub fn with_events(model: PlantModel) -> (Self, mpsc::UnboundedReceiver<PlantEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let service = InMemoryPlantModel::new(model.clone()).with_event_sink(sender);
        (Self::from_service(model, service), receiver)
    }

    fn from_service(model: PlantModel, service: InMemoryPlantModel) -> Self {
        Self {
            service: Arc::new(service),
            router: Arc::new(GraphRouter::new(&model)),
            controllers: Arc::new(InMemoryVehicleControllerPool::new()),
        }
    }

    pub fn cycle(&self, config: &DispatcherConfig) -> DispatchCycle {
        build_dispatch_cycle(
            config,
            self.service.clone(),
            self.router.clone(),
            self.controllers.clone(),
        )
        .unwrap()
    }

    pub fn add_vehicle(&self, vehicle: Vehicle) {
        self.service.add_vehicle(vehicle);
    }

    pub fn add_order(&self, order: TransportOrder) {
        self.service.create_transport_order(order).unwrap();
    }

    pub fn order(&self, name: &str) -> TransportOrder {
        self.service.transport_order(name).unwrap()
    }

    pub fn vehicle(&self, name: &str) -> Vehicle {
        self.service.vehicle(name).unwrap()
    }

    pub fn orders_in_state(&self, state: OrderState) -> Vec<TransportOrder> {
        self.service
            .transport_orders()
            .into_iter()
            .filter(|o| o.state == state)
            .collect()
    }

    /// Orders whose name starts with the prefix, e.g. the generated "Park-" orders.
    pub fn orders_named(&self, prefix: &str) -> Vec<TransportOrder> {
        self.service
            .transport_orders()
            .into_iter()
            .filter(|o| o.name.starts_with(prefix))
            .collect()
    }

    /// Reports the current drive order as done, as the vehicle's driver would.
    pub fn finish_drive_order(&self, vehicle: &str) {
        self.service
            .update_vehicle(vehicle, |v| v.proc_state = ProcState::AwaitingOrder)
            .unwrap();
    }

    /// Moves the vehicle to the point.
    pub fn move_vehicle(&self, vehicle: &str, point: &str) {
        self.service
            .update_vehicle(vehicle, |v| v.current_position = Some(point.to_string()))
            .unwrap();
    }
}
