use super::{DispatchCycle, ReroutingType};
use crate::common::{DomainError, DomainResult};
use crate::domains::fleet::ProcState;
use crate::domains::plant_model::PlantModel;
use crate::domains::transport_order::{OrderState, Route, TransportOrder};
use tracing::{debug, info, warn};

impl DispatchCycle {
    /// Withdrawn orders whose vehicle has stopped are failed and the vehicle freed.
    pub(super) fn finish_withdrawals(&mut self) {
        let snapshot = self.snapshot();
        for vehicle in snapshot
            .vehicles
            .values()
            .filter(|v| v.proc_state == ProcState::AwaitingOrder)
        {
            let Some(order) = snapshot.order_of(vehicle) else {
                continue;
            };
            if order.state != OrderState::Withdrawn {
                continue;
            }
            if let Err(e) = self.finalize_withdrawal(&vehicle.name, order) {
                warn!(vehicle = %vehicle.name, order = %order.name, error = %e, "Failed to finish withdrawal");
            }
        }
    }

    fn finalize_withdrawal(&mut self, vehicle: &str, order: &TransportOrder) -> DomainResult<()> {
        self.plant.update_order_state(&order.name, OrderState::Failed)?;
        self.plant.update_vehicle_transport_order(vehicle, None)?;
        self.plant.update_vehicle_proc_state(vehicle, ProcState::Idle)?;
        self.finish_sequence_order(order, Some(vehicle), true)?;
        info!(%vehicle, order = %order.name, "Withdrawal finished");
        Ok(())
    }

    /// Unassigned orders fail at once. Assigned orders are withdrawn and the vehicle
    /// told to stop; with `immediate` the vehicle is freed without waiting for it.
    pub fn withdraw_by_order(&mut self, order_name: &str, immediate: bool) -> DomainResult<()> {
        let order = self
            .plant
            .transport_order(order_name)
            .ok_or_else(|| DomainError::unknown_order(order_name))?;
        if order.state.is_final() {
            debug!(order = %order_name, state = %order.state, "Order already final, nothing to withdraw");
            return Ok(());
        }
        self.reservations.release_order(order_name);

        let processing_vehicle = order
            .processing_vehicle
            .clone()
            .filter(|_| matches!(order.state, OrderState::BeingProcessed | OrderState::Withdrawn));
        let Some(vehicle) = processing_vehicle else {
            self.plant.update_order_state(order_name, OrderState::Failed)?;
            self.finish_sequence_order(&order, None, true)?;
            info!(order = %order_name, "Unassigned transport order withdrawn");
            return Ok(());
        };

        if order.state != OrderState::Withdrawn {
            self.plant.update_order_state(order_name, OrderState::Withdrawn)?;
            self.controllers.abort_transport_order(&vehicle, immediate);
            info!(%vehicle, order = %order_name, immediate, "Transport order withdrawn");
        }
        if immediate {
            self.finalize_withdrawal(&vehicle, &order)?;
        }
        Ok(())
    }

    /// Withdraws the vehicle's current order and drops its reservations.
    pub fn withdraw_by_vehicle(&mut self, vehicle_name: &str, immediate: bool) -> DomainResult<()> {
        let vehicle = self
            .plant
            .vehicle(vehicle_name)
            .ok_or_else(|| DomainError::unknown_vehicle(vehicle_name))?;
        self.reservations.release_vehicle(vehicle_name);
        match vehicle.transport_order.as_deref() {
            Some(order) => self.withdraw_by_order(order, immediate),
            None => {
                debug!(vehicle = %vehicle_name, "Vehicle processes no order, nothing to withdraw");
                Ok(())
            }
        }
    }

    /// Recomputes the routes of the vehicle's remaining drive orders.
    pub fn reroute(&mut self, vehicle_name: &str, reroute_type: ReroutingType) -> DomainResult<()> {
        let snapshot = self.snapshot();
        let vehicle = snapshot
            .vehicles
            .get(vehicle_name)
            .ok_or_else(|| DomainError::unknown_vehicle(vehicle_name))?;
        let Some(order) = snapshot.order_of(vehicle) else {
            debug!(vehicle = %vehicle_name, "Vehicle processes no order, nothing to reroute");
            return Ok(());
        };
        if order.state != OrderState::BeingProcessed {
            return Ok(());
        }

        let start = match reroute_type {
            ReroutingType::Regular => vehicle
                .next_position
                .as_deref()
                .or(vehicle.current_position.as_deref()),
            ReroutingType::Forced => vehicle.current_position.as_deref(),
        };
        let Some(start) = start else {
            debug!(vehicle = %vehicle_name, "Position unknown, cannot reroute");
            return Ok(());
        };

        let index = order.current_drive_order.unwrap_or(0).min(order.drive_orders.len());
        let avoid = self.evaluator.resources_to_avoid(vehicle, order, &snapshot);
        let Some(rerouted) = self.evaluator.route_drive_orders(
            vehicle,
            start,
            &order.drive_orders[index..],
            &avoid,
            &snapshot.model,
        ) else {
            warn!(vehicle = %vehicle_name, order = %order.name, "No route found while rerouting");
            return Ok(());
        };

        let new_costs: u64 = rerouted
            .iter()
            .filter_map(|d| d.route.as_ref())
            .map(|r| r.costs)
            .sum();
        let old_costs = remaining_costs_from(order, index, start, &snapshot.model);
        if reroute_type == ReroutingType::Regular {
            if let Some(old_costs) = old_costs.filter(|old| new_costs >= *old) {
                debug!(vehicle = %vehicle_name, new_costs, old_costs, "Current route kept");
                return Ok(());
            }
        }

        let mut drive_orders = order.drive_orders[..index].to_vec();
        drive_orders.extend(rerouted);
        let updated = TransportOrder {
            drive_orders: drive_orders.clone(),
            ..order.clone()
        };
        self.controllers.update_transport_order(vehicle_name, &updated)?;
        self.plant.update_order_drive_orders(&order.name, drive_orders)?;
        info!(vehicle = %vehicle_name, order = %order.name, ?reroute_type, new_costs, ?old_costs, "Vehicle rerouted");
        Ok(())
    }
}

/// What is left of `route` once the vehicle stands at `point`.
/// `None` if the point is not on the route.
fn route_costs_from(route: &Route, point: &str, model: &PlantModel) -> Option<u64> {
    let starts_here = route
        .steps
        .first()
        .is_some_and(|step| step.source_point.as_deref() == Some(point));
    if starts_here {
        return Some(route.costs);
    }
    let reached = route
        .steps
        .iter()
        .rposition(|step| step.destination_point == point)?;
    Some(
        route.steps[reached + 1..]
            .iter()
            .filter_map(|step| step.path.as_ref())
            .filter_map(|path| model.paths.get(path))
            .map(|path| path.length)
            .sum(),
    )
}

/// Costs of the order's current routes from `start` on, comparable to a route
/// freshly computed from the same point.
fn remaining_costs_from(order: &TransportOrder, index: usize, start: &str, model: &PlantModel) -> Option<u64> {
    let mut remaining = order.drive_orders.get(index..)?.iter();
    let current = remaining.next()?.route.as_ref()?;
    let later: u64 = remaining.filter_map(|d| d.route.as_ref()).map(|r| r.costs).sum();
    Some(route_costs_from(current, start, model)? + later)
}
