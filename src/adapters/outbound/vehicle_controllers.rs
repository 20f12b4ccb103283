use crate::common::{DomainError, DomainResult};
use crate::domains::fleet::{Vehicle, VehicleControllerPool};
use crate::domains::transport_order::TransportOrder;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// What the dispatcher told a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCommand {
    SetTransportOrder { order: String },
    UpdateTransportOrder { order: String },
    AbortTransportOrder { immediate: bool },
}

#[derive(Default)]
struct ControllerState {
    refused_operations: BTreeMap<String, BTreeSet<String>>,
    unreachable: BTreeSet<String>,
    commands: Vec<(String, ControllerCommand)>,
}

/// Vehicle controllers that accept everything except explicitly refused operations
/// and record the commands they receive.
#[derive(Default)]
pub struct InMemoryVehicleControllerPool {
    state: Mutex<ControllerState>,
}

impl InMemoryVehicleControllerPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes the vehicle refuse orders containing the operation.
    pub fn refuse_operation(&self, vehicle: &str, operation: &str) {
        self.lock()
            .refused_operations
            .entry(vehicle.to_string())
            .or_default()
            .insert(operation.to_string());
    }

    /// Makes handing orders to the vehicle fail until further notice.
    pub fn disconnect(&self, vehicle: &str) {
        self.lock().unreachable.insert(vehicle.to_string());
    }

    pub fn reconnect(&self, vehicle: &str) {
        self.lock().unreachable.remove(vehicle);
    }

    fn ensure_reachable(&self, vehicle: &str) -> DomainResult<()> {
        if self.lock().unreachable.contains(vehicle) {
            return Err(DomainError::InfrastructureError(format!(
                "controller of {} unreachable",
                vehicle
            )));
        }
        Ok(())
    }

    pub fn commands(&self) -> Vec<(String, ControllerCommand)> {
        self.lock().commands.clone()
    }

    pub fn commands_for(&self, vehicle: &str) -> Vec<ControllerCommand> {
        self.lock()
            .commands
            .iter()
            .filter(|(v, _)| v == vehicle)
            .map(|(_, c)| c.clone())
            .collect()
    }

    fn record(&self, vehicle: &str, command: ControllerCommand) {
        self.lock().commands.push((vehicle.to_string(), command));
    }
}

impl VehicleControllerPool for InMemoryVehicleControllerPool {
    fn can_process(&self, vehicle: &Vehicle, order: &TransportOrder) -> Vec<String> {
        let state = self.lock();
        let Some(refused) = state.refused_operations.get(&vehicle.name) else {
            return Vec::new();
        };
        order
            .drive_orders
            .iter()
            .map(|d| &d.destination.operation)
            .filter(|op| refused.contains(*op))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|op| format!("operation {} not supported", op))
            .collect()
    }

    fn set_transport_order(&self, vehicle: &str, order: &TransportOrder) -> DomainResult<()> {
        self.ensure_reachable(vehicle)?;
        info!(%vehicle, order = %order.name, "Controller received transport order");
        self.record(
            vehicle,
            ControllerCommand::SetTransportOrder {
                order: order.name.clone(),
            },
        );
        Ok(())
    }

    fn update_transport_order(&self, vehicle: &str, order: &TransportOrder) -> DomainResult<()> {
        self.ensure_reachable(vehicle)?;
        self.record(
            vehicle,
            ControllerCommand::UpdateTransportOrder {
                order: order.name.clone(),
            },
        );
        Ok(())
    }

    fn abort_transport_order(&self, vehicle: &str, immediate: bool) {
        info!(%vehicle, immediate, "Controller told to abort transport order");
        self.record(vehicle, ControllerCommand::AbortTransportOrder { immediate });
    }
}
