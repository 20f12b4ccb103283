use super::DispatchCycle;
use crate::common::{DomainError, DomainResult};
use crate::domains::dispatching::{AssignmentCandidate, CandidateOutcome, DispatchContext, PlantSnapshot};
use crate::domains::fleet::{IntegrationLevel, ProcState, Vehicle};
use crate::domains::transport_order::{DriveOrderState, OrderState, TransportOrder};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Evaluations of one phase, so no pair is routed or rejected twice.
#[derive(Default)]
struct CandidateCache {
    outcomes: BTreeMap<(String, String), Option<AssignmentCandidate>>,
}

fn is_free(vehicle: &Vehicle) -> bool {
    vehicle.proc_state == ProcState::Idle && vehicle.transport_order.is_none()
}

impl DispatchCycle {
    /// Orders held for vehicles whose previous order has since been given up.
    pub(super) fn assign_reserved_orders(&mut self) {
        let snapshot = self.snapshot();
        let held: Vec<(String, String)> = snapshot
            .vehicles
            .keys()
            .flat_map(|vehicle| {
                self.reservations
                    .held_by(vehicle)
                    .into_iter()
                    .map(move |order| (vehicle.clone(), order))
            })
            .collect();

        for (vehicle_name, order_name) in held {
            let (Some(vehicle), Some(order)) = (
                snapshot.vehicles.get(&vehicle_name),
                snapshot.orders.get(&order_name),
            ) else {
                self.reservations.release(&order_name, &vehicle_name);
                continue;
            };
            if !matches!(order.state, OrderState::Active | OrderState::Dispatchable)
                || vehicle.integration_level != IntegrationLevel::ToBeUtilized
                || vehicle.paused
            {
                debug!(vehicle = %vehicle_name, order = %order_name, "Releasing stale held reservation");
                self.reservations.release(&order_name, &vehicle_name);
                continue;
            }
            if !is_free(vehicle) {
                continue;
            }

            let outcome = {
                let ctx = snapshot.context(&self.reservations);
                self.evaluator
                    .evaluate(vehicle, order, &self.filters.candidates, &ctx)
            };
            self.reservations.release(&order_name, &vehicle_name);
            match outcome {
                CandidateOutcome::Accepted(candidate) => {
                    if let Err(e) = self.assign_order(&candidate) {
                        warn!(vehicle = %vehicle_name, order = %order_name, error = %e, "Failed to assign held order");
                    }
                }
                CandidateOutcome::Rejected(rejection) => self.record_rejection(&rejection),
                CandidateOutcome::Unroutable => {}
            }
        }
    }

    /// Free vehicles bound to a sequence take its next order.
    pub(super) fn assign_sequence_successors(&mut self) {
        let snapshot = self.snapshot();
        for vehicle in snapshot.vehicles.values().filter(|v| is_free(v)) {
            let Some(sequence) = vehicle
                .order_sequence
                .as_deref()
                .and_then(|name| snapshot.sequences.get(name))
            else {
                continue;
            };
            let Some(order) = sequence
                .next_unfinished_order()
                .and_then(|name| snapshot.orders.get(name))
            else {
                continue;
            };

            let outcome = {
                let ctx = snapshot.context(&self.reservations);
                if !self.filters.vehicles.accepts(vehicle, &ctx) || !self.filters.orders.accepts(order, &ctx) {
                    continue;
                }
                self.evaluator
                    .evaluate(vehicle, order, &self.filters.candidates, &ctx)
            };
            match outcome {
                CandidateOutcome::Accepted(candidate) => {
                    if let Err(e) = self.assign_order(&candidate) {
                        warn!(vehicle = %vehicle.name, order = %order.name, error = %e, "Failed to assign sequence successor");
                    }
                }
                CandidateOutcome::Rejected(rejection) => self.record_rejection(&rejection),
                CandidateOutcome::Unroutable => {}
            }
        }
    }

    /// Matches dispatchable orders and available vehicles in both directions.
    /// The smaller side seeks first; the other direction runs over what remains.
    pub(super) fn assign_free_orders(&mut self) {
        let snapshot = self.snapshot();
        let (vehicles, orders) = {
            let ctx = snapshot.context(&self.reservations);
            let ranking = ctx.ranking();
            let vehicles: Vec<&Vehicle> = snapshot
                .vehicles
                .values()
                .filter(|v| self.filters.vehicles.accepts(v, &ctx))
                .collect();
            let orders: Vec<&TransportOrder> = snapshot
                .orders
                .values()
                .filter(|o| self.filters.orders.accepts(o, &ctx))
                .collect();
            let mut vehicles = vehicles;
            vehicles.sort_by(|a, b| self.priorities.vehicles.compare(a, b, &ranking));
            let mut orders = orders;
            orders.sort_by(|a, b| self.priorities.orders.compare(a, b, &ranking));
            (vehicles, orders)
        };
        if vehicles.is_empty() || orders.is_empty() {
            debug!(vehicles = vehicles.len(), orders = orders.len(), "Nothing to match");
            return;
        }

        let mut cache = CandidateCache::default();
        let mut taken_vehicles = BTreeSet::new();
        let mut taken_orders = BTreeSet::new();
        let vehicles_first = vehicles.len() <= orders.len();

        for vehicle_seeks in [vehicles_first, !vehicles_first] {
            if vehicle_seeks {
                for vehicle in &vehicles {
                    if taken_vehicles.contains(&vehicle.name) {
                        continue;
                    }
                    let mut candidates = Vec::new();
                    for order in &orders {
                        if taken_orders.contains(&order.name) {
                            continue;
                        }
                        if let Some(candidate) = self.cached_candidate(&mut cache, vehicle, order, &snapshot) {
                            candidates.push(candidate);
                        }
                    }
                    let ranking = snapshot.context(&self.reservations).ranking();
                    let best = self
                        .priorities
                        .order_candidates
                        .best(&candidates, &ranking)
                        .cloned();
                    if let Some(best) = best {
                        self.commit(&best, &mut taken_vehicles, &mut taken_orders);
                    }
                }
            } else {
                for order in &orders {
                    if taken_orders.contains(&order.name) {
                        continue;
                    }
                    let mut candidates = Vec::new();
                    for vehicle in &vehicles {
                        if taken_vehicles.contains(&vehicle.name) {
                            continue;
                        }
                        if let Some(candidate) = self.cached_candidate(&mut cache, vehicle, order, &snapshot) {
                            candidates.push(candidate);
                        }
                    }
                    let ranking = snapshot.context(&self.reservations).ranking();
                    let best = self
                        .priorities
                        .vehicle_candidates
                        .best(&candidates, &ranking)
                        .cloned();
                    if let Some(best) = best {
                        self.commit(&best, &mut taken_vehicles, &mut taken_orders);
                    }
                }
            }
        }
    }

    /// Evaluates the pair once per phase and reserves accepted candidates tentatively.
    fn cached_candidate(
        &mut self,
        cache: &mut CandidateCache,
        vehicle: &Vehicle,
        order: &TransportOrder,
        snapshot: &PlantSnapshot,
    ) -> Option<AssignmentCandidate> {
        let key = (vehicle.name.clone(), order.name.clone());
        if let Some(cached) = cache.outcomes.get(&key) {
            return cached.clone();
        }
        // Busy vehicles only give up a dispensable order for one that is not.
        if vehicle.is_processing_order() && order.dispensable {
            cache.outcomes.insert(key, None);
            return None;
        }

        let outcome = {
            let ctx: DispatchContext<'_> = snapshot.context(&self.reservations);
            self.evaluator
                .evaluate(vehicle, order, &self.filters.candidates, &ctx)
        };
        let candidate = match outcome {
            CandidateOutcome::Accepted(candidate) => {
                self.reservations.reserve(&order.name, &vehicle.name);
                Some(candidate)
            }
            CandidateOutcome::Rejected(rejection) => {
                self.record_rejection(&rejection);
                None
            }
            CandidateOutcome::Unroutable => None,
        };
        cache.outcomes.insert(key, candidate.clone());
        candidate
    }

    fn commit(
        &mut self,
        candidate: &AssignmentCandidate,
        taken_vehicles: &mut BTreeSet<String>,
        taken_orders: &mut BTreeSet<String>,
    ) {
        let vehicle = candidate.vehicle().name.clone();
        let order = candidate.order().name.clone();
        let result = if candidate.vehicle().is_processing_order() {
            self.preempt_dispensable_order(candidate)
        } else {
            self.assign_order(candidate)
        };
        match result {
            Ok(()) => {
                taken_vehicles.insert(vehicle);
                taken_orders.insert(order);
            }
            Err(e) => {
                self.reservations.release(&order, &vehicle);
                warn!(%vehicle, %order, error = %e, "Failed to assign transport order");
            }
        }
    }

    /// The vehicle gives up its dispensable order and holds the new one until it is free.
    fn preempt_dispensable_order(&mut self, candidate: &AssignmentCandidate) -> DomainResult<()> {
        let vehicle = &candidate.vehicle().name;
        let order = &candidate.order().name;
        let current = candidate
            .vehicle()
            .transport_order
            .clone()
            .ok_or_else(|| DomainError::InvalidCommand {
                reason: format!("{} processes no order", vehicle),
            })?;

        self.reservations.release_order(order);
        self.reservations.hold(order, vehicle);
        self.withdraw_by_order(&current, false)?;
        info!(%vehicle, %order, withdrawn = %current, "Dispensable order pre-empted");
        Ok(())
    }

    /// Commits the candidate. The vehicle receives the order before any state is
    /// written, so a refused handover leaves order and vehicle untouched.
    pub(super) fn assign_order(&mut self, candidate: &AssignmentCandidate) -> DomainResult<()> {
        let vehicle = candidate.vehicle().name.as_str();
        let order = candidate.order();

        let mut drive_orders = candidate.drive_orders().to_vec();
        if let Some(first) = drive_orders.first_mut() {
            first.state = DriveOrderState::Travelling;
        }
        let assigned = TransportOrder {
            drive_orders: drive_orders.clone(),
            processing_vehicle: Some(vehicle.to_string()),
            current_drive_order: Some(0),
            state: OrderState::BeingProcessed,
            ..order.clone()
        };
        self.controllers.set_transport_order(vehicle, &assigned)?;

        self.plant.update_order_drive_orders(&order.name, drive_orders)?;
        self.plant
            .update_order_processing(&order.name, Some(vehicle), Some(0))?;
        self.plant
            .update_order_state(&order.name, OrderState::BeingProcessed)?;
        self.plant
            .update_vehicle_transport_order(vehicle, Some(&order.name))?;
        self.plant
            .update_vehicle_proc_state(vehicle, ProcState::ProcessingOrder)?;

        if let Some(sequence_name) = order.wrapping_sequence.as_deref() {
            if let Some(mut sequence) = self.plant.order_sequence(sequence_name) {
                sequence.processing_vehicle = Some(vehicle.to_string());
                self.plant.update_order_sequence(sequence)?;
            }
            self.plant
                .update_vehicle_order_sequence(vehicle, Some(sequence_name))?;
        }
        self.reservations.release_order(&order.name);

        info!(
            %vehicle,
            order = %order.name,
            costs = candidate.complete_routing_costs(),
            "Assigned transport order"
        );
        Ok(())
    }
}
