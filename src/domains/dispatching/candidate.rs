use crate::domains::fleet::Vehicle;
use crate::domains::transport_order::{DriveOrder, TransportOrder};

/// A prospective pairing of a vehicle and a transport order with routed drive orders.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentCandidate {
    vehicle: Vehicle,
    order: TransportOrder,
    drive_orders: Vec<DriveOrder>,
    initial_routing_costs: u64,
    complete_routing_costs: u64,
}

impl AssignmentCandidate {
    /// `drive_orders` must carry the routes computed for this vehicle.
    pub fn new(vehicle: Vehicle, order: TransportOrder, drive_orders: Vec<DriveOrder>) -> Self {
        let costs: Vec<u64> = drive_orders
            .iter()
            .map(|d| d.route.as_ref().map(|r| r.costs).unwrap_or(0))
            .collect();
        Self {
            initial_routing_costs: costs.first().copied().unwrap_or(0),
            complete_routing_costs: costs.iter().sum(),
            vehicle,
            order,
            drive_orders,
        }
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn order(&self) -> &TransportOrder {
        &self.order
    }

    pub fn drive_orders(&self) -> &[DriveOrder] {
        &self.drive_orders
    }

    /// Costs of the route to the first destination.
    pub fn initial_routing_costs(&self) -> u64 {
        self.initial_routing_costs
    }

    pub fn complete_routing_costs(&self) -> u64 {
        self.complete_routing_costs
    }
}
