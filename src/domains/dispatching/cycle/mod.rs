//! The dispatch cycle and the other operations running on the dispatcher's serialized context.

mod assignment;
mod housekeeping;
mod orders;
mod withdrawal;

use crate::config::DispatcherConfig;
use crate::domains::dispatching::filters::FilterChains;
use crate::domains::dispatching::priorities::PriorityChains;
use crate::domains::dispatching::{
    CandidateEvaluator, CandidateRejection, OrderReservationPool, PlantSnapshot, PositionSupplier,
};
use crate::domains::fleet::VehicleControllerPool;
use crate::domains::plant_model::PlantModelService;
use crate::domains::transport_order::Rejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReroutingType {
    /// Takes the new route only if it is cheaper than the current one.
    Regular,
    /// Takes the new route whenever one exists, starting at the vehicle's current position.
    Forced,
}

pub struct DispatchCycle {
    config: DispatcherConfig,
    plant: Arc<dyn PlantModelService>,
    controllers: Arc<dyn VehicleControllerPool>,
    evaluator: CandidateEvaluator,
    supplier: PositionSupplier,
    filters: FilterChains,
    priorities: PriorityChains,
    reservations: OrderReservationPool,
}

impl DispatchCycle {
    pub(crate) fn new(
        config: DispatcherConfig,
        plant: Arc<dyn PlantModelService>,
        controllers: Arc<dyn VehicleControllerPool>,
        evaluator: CandidateEvaluator,
        supplier: PositionSupplier,
        filters: FilterChains,
        priorities: PriorityChains,
    ) -> Self {
        Self {
            config,
            plant,
            controllers,
            evaluator,
            supplier,
            filters,
            priorities,
            reservations: OrderReservationPool::new(),
        }
    }

    /// One complete dispatch pass.
    pub fn run(&mut self) {
        let started = Instant::now();

        self.finish_withdrawals();
        self.check_new_orders();
        self.assign_next_drive_orders();
        self.assign_reserved_orders();
        self.assign_sequence_successors();
        self.assign_free_orders();
        if self.config.recharge_idle_vehicles {
            self.recharge_idle_vehicles();
        }
        if self.config.park_idle_vehicles {
            self.park_idle_vehicles();
        }
        if self.config.repark_idle_vehicles {
            self.repark_idle_vehicles();
        }
        self.reservations.release_tentative();

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Dispatch cycle finished");
    }

    pub fn reservations(&self) -> &OrderReservationPool {
        &self.reservations
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn plant(&self) -> &Arc<dyn PlantModelService> {
        &self.plant
    }

    fn snapshot(&self) -> PlantSnapshot {
        PlantSnapshot::capture(self.plant.as_ref())
    }

    /// Appends the rejection unless the vehicle's latest rejection of the order says the same.
    fn record_rejection(&self, rejection: &CandidateRejection) {
        let reason = rejection.reason();
        let repeated = self
            .plant
            .transport_order(&rejection.order)
            .and_then(|order| {
                order
                    .rejections
                    .iter()
                    .rev()
                    .find(|r| r.vehicle == rejection.vehicle)
                    .map(|r| r.reason == reason)
            })
            .unwrap_or(false);
        if repeated {
            return;
        }

        debug!(vehicle = %rejection.vehicle, order = %rejection.order, %reason, "Candidate rejected");
        let entry = Rejection {
            vehicle: rejection.vehicle.clone(),
            reason,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.plant.add_order_rejection(&rejection.order, entry) {
            warn!(order = %rejection.order, error = %e, "Failed to record rejection");
        }
    }
}
