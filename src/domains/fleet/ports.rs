use crate::common::DomainResult;
use crate::domains::fleet::Vehicle;
use crate::domains::transport_order::TransportOrder;

/// Port to the controllers executing orders on the vehicles.
pub trait VehicleControllerPool: Send + Sync {
    /// Reasons why the vehicle cannot execute the order's operations; empty if it can.
    fn can_process(&self, vehicle: &Vehicle, order: &TransportOrder) -> Vec<String>;

    /// Hands a freshly assigned order, with routes, to the vehicle.
    fn set_transport_order(&self, vehicle: &str, order: &TransportOrder) -> DomainResult<()>;

    /// Replaces the drive orders of the order the vehicle is processing.
    fn update_transport_order(&self, vehicle: &str, order: &TransportOrder) -> DomainResult<()>;

    fn abort_transport_order(&self, vehicle: &str, immediate: bool);
}
