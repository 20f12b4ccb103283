use super::DispatchCycle;
use crate::common::{DomainError, DomainResult};
use crate::domains::dispatching::PlantSnapshot;
use crate::domains::fleet::{ProcState, Vehicle};
use crate::domains::transport_order::{DriveOrderState, OrderState, TransportOrder};
use tracing::{debug, info, warn};

impl DispatchCycle {
    /// RAW orders become ACTIVE if they can be processed at all, FAILED otherwise.
    /// ACTIVE orders become DISPATCHABLE once their dependencies are finished.
    pub(super) fn check_new_orders(&mut self) {
        let snapshot = self.snapshot();
        for order in snapshot.orders.values().filter(|o| o.state == OrderState::Raw) {
            let result = match Self::activation_problem(order, &snapshot) {
                Some(problem) => {
                    warn!(order = %order.name, %problem, "Transport order cannot be processed");
                    self.plant
                        .update_order_state(&order.name, OrderState::Failed)
                        .and_then(|_| self.finish_sequence_order(order, None, true))
                }
                None => {
                    debug!(order = %order.name, "Transport order activated");
                    self.plant.update_order_state(&order.name, OrderState::Active)
                }
            };
            if let Err(e) = result {
                warn!(order = %order.name, error = %e, "Failed to check new transport order");
            }
        }

        let snapshot = self.snapshot();
        for order in snapshot.orders.values().filter(|o| o.state == OrderState::Active) {
            let ready = order.dependencies.iter().all(|dep| {
                snapshot
                    .orders
                    .get(dep)
                    .is_some_and(|d| d.state == OrderState::Finished)
            });
            if !ready {
                continue;
            }
            if let Err(e) = self.plant.update_order_state(&order.name, OrderState::Dispatchable) {
                warn!(order = %order.name, error = %e, "Failed to mark transport order dispatchable");
            }
        }
    }

    fn activation_problem(order: &TransportOrder, snapshot: &PlantSnapshot) -> Option<String> {
        if order.drive_orders.is_empty() {
            return Some("no drive orders".to_string());
        }
        let model = &snapshot.model;
        for drive_order in &order.drive_orders {
            let destination = &drive_order.destination;
            let valid = match model.locations.get(&destination.location) {
                Some(location) => model.location_offers_operation(location, &destination.operation),
                None => model.is_point(&destination.location),
            };
            if !valid {
                return Some(format!(
                    "{} does not offer {}",
                    destination.location, destination.operation
                ));
            }
        }
        if let Some(intended) = order.intended_vehicle.as_deref() {
            if !snapshot.vehicles.contains_key(intended) {
                return Some(format!("intended vehicle {} unknown", intended));
            }
        }
        None
    }

    /// Vehicles that finished a drive order get the next one, or finish their order.
    pub(super) fn assign_next_drive_orders(&mut self) {
        let snapshot = self.snapshot();
        for vehicle in snapshot
            .vehicles
            .values()
            .filter(|v| v.proc_state == ProcState::AwaitingOrder)
        {
            let Some(order) = snapshot.order_of(vehicle) else {
                continue;
            };
            if order.state != OrderState::BeingProcessed {
                continue;
            }
            if let Err(e) = self.advance_order(vehicle, order) {
                warn!(vehicle = %vehicle.name, order = %order.name, error = %e, "Failed to advance transport order");
            }
        }
    }

    fn advance_order(&self, vehicle: &Vehicle, order: &TransportOrder) -> DomainResult<()> {
        let index = order.current_drive_order.unwrap_or(0);
        let mut drive_orders = order.drive_orders.clone();
        if let Some(finished) = drive_orders.get_mut(index) {
            finished.state = DriveOrderState::Finished;
        }

        if index + 1 < drive_orders.len() {
            drive_orders[index + 1].state = DriveOrderState::Travelling;
            self.plant.update_order_drive_orders(&order.name, drive_orders)?;
            self.plant
                .update_order_processing(&order.name, Some(&vehicle.name), Some(index + 1))?;
            let updated = self
                .plant
                .transport_order(&order.name)
                .ok_or_else(|| DomainError::unknown_order(&order.name))?;
            self.controllers.update_transport_order(&vehicle.name, &updated)?;
            self.plant
                .update_vehicle_proc_state(&vehicle.name, ProcState::ProcessingOrder)?;
            debug!(vehicle = %vehicle.name, order = %order.name, drive_order = index + 1, "Assigned next drive order");
            return Ok(());
        }

        self.plant.update_order_drive_orders(&order.name, drive_orders)?;
        self.plant.update_order_state(&order.name, OrderState::Finished)?;
        self.plant.update_vehicle_transport_order(&vehicle.name, None)?;
        self.plant.update_vehicle_proc_state(&vehicle.name, ProcState::Idle)?;
        self.finish_sequence_order(order, Some(&vehicle.name), false)?;
        info!(vehicle = %vehicle.name, order = %order.name, "Transport order finished");
        Ok(())
    }

    /// Records a final order in its sequence. Failing an order of a failure-fatal
    /// sequence fails every order after it. A finished sequence releases its vehicle.
    pub(super) fn finish_sequence_order(
        &self,
        order: &TransportOrder,
        vehicle: Option<&str>,
        failed: bool,
    ) -> DomainResult<()> {
        let Some(name) = order.wrapping_sequence.as_deref() else {
            return Ok(());
        };
        let Some(mut sequence) = self.plant.order_sequence(name) else {
            warn!(order = %order.name, sequence = %name, "Order sequence unknown");
            return Ok(());
        };

        sequence.mark_finished(&order.name);
        if failed && sequence.failure_fatal {
            for following in sequence.orders_after(&order.name) {
                let pending = self
                    .plant
                    .transport_order(&following)
                    .is_some_and(|o| !o.state.is_final());
                if pending {
                    self.plant.update_order_state(&following, OrderState::Failed)?;
                }
                sequence.mark_finished(&following);
            }
            sequence.finished = true;
            info!(sequence = %sequence.name, "Order sequence failed");
        }

        let finished = sequence.finished;
        let owner = vehicle
            .map(str::to_string)
            .or_else(|| sequence.processing_vehicle.clone());
        self.plant.update_order_sequence(sequence)?;

        if finished {
            if let Some(owner) = owner {
                let bound = self
                    .plant
                    .vehicle(&owner)
                    .is_some_and(|v| v.order_sequence.as_deref() == Some(name));
                if bound {
                    self.plant.update_vehicle_order_sequence(&owner, None)?;
                }
            }
        }
        Ok(())
    }
}
