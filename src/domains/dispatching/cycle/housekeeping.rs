use super::DispatchCycle;
use crate::common::DomainResult;
use crate::domains::dispatching::filters::CompositeFilter;
use crate::domains::dispatching::{CandidateOutcome, PlantSnapshot};
use crate::domains::fleet::Vehicle;
use crate::domains::transport_order::{Destination, DriveOrder, OrderState, TransportOrder};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Housekeeping {
    Recharge,
    Park,
    Repark,
}

impl Housekeeping {
    fn prefix(self) -> &'static str {
        match self {
            Housekeeping::Recharge => "Recharge",
            Housekeeping::Park | Housekeeping::Repark => "Park",
        }
    }
}

impl DispatchCycle {
    pub(super) fn recharge_idle_vehicles(&mut self) {
        self.send_idle_vehicles(Housekeeping::Recharge);
    }

    pub(super) fn park_idle_vehicles(&mut self) {
        self.send_idle_vehicles(Housekeeping::Park);
    }

    pub(super) fn repark_idle_vehicles(&mut self) {
        self.send_idle_vehicles(Housekeeping::Repark);
    }

    fn housekeeping_filter(&self, kind: Housekeeping) -> &CompositeFilter<Vehicle> {
        match kind {
            Housekeeping::Recharge => &self.filters.recharge,
            Housekeeping::Park => &self.filters.park,
            Housekeeping::Repark => &self.filters.repark,
        }
    }

    fn destinations_for(&self, kind: Housekeeping, vehicle: &Vehicle, snapshot: &PlantSnapshot) -> Vec<Destination> {
        let park_operation = self.config.park_operation.as_str();
        match kind {
            Housekeeping::Recharge => self.supplier.find_recharge_destinations(vehicle, snapshot),
            Housekeeping::Park => self.supplier.find_parking_destinations(vehicle, snapshot, park_operation),
            Housekeeping::Repark => self.supplier.find_repark_destinations(vehicle, snapshot, park_operation),
        }
    }

    /// Vehicles are handled in name order. The snapshot is taken again after each
    /// issued order so the next vehicle sees the destination as targeted.
    fn send_idle_vehicles(&mut self, kind: Housekeeping) {
        let names: Vec<String> = {
            let snapshot = self.snapshot();
            let ctx = snapshot.context(&self.reservations);
            let filter = self.housekeeping_filter(kind);
            snapshot
                .vehicles
                .values()
                .filter(|v| filter.accepts(v, &ctx))
                .map(|v| v.name.clone())
                .collect()
        };

        for name in names {
            let snapshot = self.snapshot();
            let Some(vehicle) = snapshot.vehicles.get(&name) else {
                continue;
            };
            {
                let ctx = snapshot.context(&self.reservations);
                if !self.housekeeping_filter(kind).accepts(vehicle, &ctx) {
                    continue;
                }
            }
            let destinations = self.destinations_for(kind, vehicle, &snapshot);
            if destinations.is_empty() {
                debug!(vehicle = %name, kind = ?kind, "No destination for idle vehicle");
                continue;
            }
            if let Err(e) = self.issue_housekeeping_order(kind, vehicle, destinations) {
                warn!(vehicle = %name, kind = ?kind, error = %e, "Failed to send idle vehicle");
            }
        }
    }

    /// Creates the order only once the vehicle is known to accept it, so a refusing
    /// vehicle leaves no trace in the plant and triggers no further cycles.
    fn issue_housekeeping_order(
        &mut self,
        kind: Housekeeping,
        vehicle: &Vehicle,
        destinations: Vec<Destination>,
    ) -> DomainResult<()> {
        let name = format!("{}-{}", kind.prefix(), Uuid::new_v4());
        let drive_orders = destinations
            .iter()
            .map(|d| DriveOrder::new(&d.location, &d.operation))
            .collect();
        let order = TransportOrder::new(&name, drive_orders)
            .with_intended_vehicle(&vehicle.name)
            .with_state(OrderState::Dispatchable)
            .dispensable();

        let outcome = {
            let snapshot = self.snapshot();
            let ctx = snapshot.context(&self.reservations);
            self.evaluator
                .evaluate(vehicle, &order, &self.filters.candidates, &ctx)
        };

        match outcome {
            CandidateOutcome::Accepted(candidate) => {
                self.plant.create_transport_order(order)?;
                if let Err(e) = self.assign_order(&candidate) {
                    self.plant.update_order_state(&name, OrderState::Failed)?;
                    return Err(e);
                }
                info!(
                    vehicle = %vehicle.name,
                    order = %name,
                    location = %destinations[0].location,
                    kind = ?kind,
                    "Sent idle vehicle"
                );
                Ok(())
            }
            CandidateOutcome::Rejected(rejection) => {
                debug!(vehicle = %vehicle.name, kind = ?kind, reason = %rejection.reason(), "Idle vehicle refuses destination");
                Ok(())
            }
            CandidateOutcome::Unroutable => {
                debug!(vehicle = %vehicle.name, kind = ?kind, "Idle vehicle cannot reach destination");
                Ok(())
            }
        }
    }
}
