use crate::common::DomainResult;
use crate::domains::fleet::{ProcState, Vehicle};
use crate::domains::plant_model::PlantModel;
use crate::domains::transport_order::{
    DriveOrder, OrderSequence, OrderState, Rejection, Route, TransportOrder,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Port to the kernel's object service.
///
/// Reads return value copies; the dispatcher never holds references into the
/// service's state. Every mutation goes through the write methods below.
pub trait PlantModelService: Send + Sync {
    fn plant_model(&self) -> Arc<PlantModel>;

    fn vehicles(&self) -> Vec<Vehicle>;
    fn vehicle(&self, name: &str) -> Option<Vehicle>;
    fn transport_orders(&self) -> Vec<TransportOrder>;
    fn transport_order(&self, name: &str) -> Option<TransportOrder>;
    fn order_sequences(&self) -> Vec<OrderSequence>;
    fn order_sequence(&self, name: &str) -> Option<OrderSequence>;

    fn create_transport_order(&self, order: TransportOrder) -> DomainResult<()>;
    /// Fails with `IllegalStateTransition` if the order is already in a final state.
    fn update_order_state(&self, order: &str, state: OrderState) -> DomainResult<()>;
    fn update_order_drive_orders(&self, order: &str, drive_orders: Vec<DriveOrder>) -> DomainResult<()>;
    fn update_order_processing(
        &self,
        order: &str,
        processing_vehicle: Option<&str>,
        current_drive_order: Option<usize>,
    ) -> DomainResult<()>;
    fn add_order_rejection(&self, order: &str, rejection: Rejection) -> DomainResult<()>;
    fn update_order_sequence(&self, sequence: OrderSequence) -> DomainResult<()>;

    fn update_vehicle_proc_state(&self, vehicle: &str, proc_state: ProcState) -> DomainResult<()>;
    fn update_vehicle_transport_order(&self, vehicle: &str, order: Option<&str>) -> DomainResult<()>;
    fn update_vehicle_order_sequence(&self, vehicle: &str, sequence: Option<&str>) -> DomainResult<()>;
}

/// Port to the kernel's router.
pub trait Router: Send + Sync {
    /// Up to `max_alternatives` routes between two points, cheapest first. Empty if unroutable.
    fn routes(
        &self,
        vehicle: &Vehicle,
        source_point: &str,
        destination_point: &str,
        resources_to_avoid: &BTreeSet<String>,
        max_alternatives: usize,
    ) -> Vec<Route>;

    /// Cost of the cheapest route between two points, `None` if unroutable.
    fn costs(
        &self,
        vehicle: &Vehicle,
        source_point: &str,
        destination_point: &str,
        resources_to_avoid: &BTreeSet<String>,
    ) -> Option<u64>;
}
