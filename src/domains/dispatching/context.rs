use crate::domains::dispatching::OrderReservationPool;
use crate::domains::fleet::Vehicle;
use crate::domains::plant_model::{Location, PlantModel, PlantModelService};
use crate::domains::transport_order::{OrderSequence, OrderState, TransportOrder};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Value copy of the plant state a dispatch phase works on.
#[derive(Debug, Clone)]
pub struct PlantSnapshot {
    pub model: Arc<PlantModel>,
    pub vehicles: BTreeMap<String, Vehicle>,
    pub orders: BTreeMap<String, TransportOrder>,
    pub sequences: BTreeMap<String, OrderSequence>,
    pub taken_at: DateTime<Utc>,
}

impl PlantSnapshot {
    pub fn capture(service: &dyn PlantModelService) -> Self {
        Self {
            model: service.plant_model(),
            vehicles: service
                .vehicles()
                .into_iter()
                .map(|v| (v.name.clone(), v))
                .collect(),
            orders: service
                .transport_orders()
                .into_iter()
                .map(|o| (o.name.clone(), o))
                .collect(),
            sequences: service
                .order_sequences()
                .into_iter()
                .map(|s| (s.name.clone(), s))
                .collect(),
            taken_at: Utc::now(),
        }
    }

    pub fn new(model: Arc<PlantModel>, vehicles: Vec<Vehicle>, orders: Vec<TransportOrder>) -> Self {
        Self {
            model,
            vehicles: vehicles.into_iter().map(|v| (v.name.clone(), v)).collect(),
            orders: orders.into_iter().map(|o| (o.name.clone(), o)).collect(),
            sequences: BTreeMap::new(),
            taken_at: Utc::now(),
        }
    }

    pub fn with_sequences(mut self, sequences: Vec<OrderSequence>) -> Self {
        self.sequences = sequences.into_iter().map(|s| (s.name.clone(), s)).collect();
        self
    }

    pub fn context<'a>(&'a self, reservations: &'a OrderReservationPool) -> DispatchContext<'a> {
        DispatchContext {
            snapshot: self,
            reservations,
            now: self.taken_at,
        }
    }

    pub fn order_of(&self, vehicle: &Vehicle) -> Option<&TransportOrder> {
        vehicle
            .transport_order
            .as_ref()
            .and_then(|name| self.orders.get(name))
    }

    /// Points other vehicles stand on or have allocated.
    pub fn points_occupied_by_others(&self, vehicle: &str) -> BTreeSet<String> {
        self.vehicles
            .values()
            .filter(|v| v.name != vehicle)
            .flat_map(|v| {
                v.current_position
                    .iter()
                    .cloned()
                    .chain(v.allocated_resources.iter().cloned())
                    .collect::<Vec<_>>()
            })
            .filter(|resource| self.model.is_point(resource))
            .collect()
    }

    /// Route destinations of orders other vehicles are still travelling to.
    pub fn points_targeted_by_others(&self, vehicle: &str) -> BTreeSet<String> {
        self.orders
            .values()
            .filter(|o| matches!(o.state, OrderState::BeingProcessed | OrderState::Withdrawn))
            .filter(|o| o.processing_vehicle.as_deref().is_some_and(|p| p != vehicle))
            .flat_map(|o| o.targeted_points())
            .collect()
    }

    pub fn resources_allocated_by_others(&self, vehicle: &str) -> BTreeSet<String> {
        self.vehicles
            .values()
            .filter(|v| v.name != vehicle)
            .flat_map(|v| v.allocated_resources.iter().cloned())
            .collect()
    }

    /// Location offering the operation that the vehicle currently stands at, if any.
    pub fn location_at_vehicle(&self, vehicle: &Vehicle, operation: &str) -> Option<&Location> {
        let position = vehicle.current_position.as_deref()?;
        self.model.locations.values().find(|location| {
            !location.locked
                && location.links.iter().any(|link| {
                    link.point == position && self.model.link_allows(location, link, operation)
                })
        })
    }
}

/// What selection filters may look at besides their subject.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub snapshot: &'a PlantSnapshot,
    pub reservations: &'a OrderReservationPool,
    pub now: DateTime<Utc>,
}

/// What priority comparators may look at besides the compared values.
#[derive(Debug, Clone, Copy)]
pub struct RankingContext {
    pub now: DateTime<Utc>,
}

impl RankingContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl<'a> DispatchContext<'a> {
    pub fn ranking(&self) -> RankingContext {
        RankingContext::at(self.now)
    }
}
