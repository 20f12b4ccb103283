//! Destinations for vehicles that should recharge, park or move to a better parking spot.

use crate::domains::dispatching::PlantSnapshot;
use crate::domains::fleet::{
    Vehicle, ASSIGNED_PARKING_LOCATION, ASSIGNED_RECHARGE_LOCATION, PREFERRED_PARKING_LOCATION,
    PREFERRED_RECHARGE_LOCATION,
};
use crate::domains::plant_model::{Location, PlantModel, Router};
use crate::domains::transport_order::Destination;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Location property ranking parking locations; lower values are better.
pub const PARKING_PRIORITY: &str = "parkingPriority";

pub fn parking_priority(location: &Location) -> Option<i64> {
    location
        .properties
        .get(PARKING_PRIORITY)
        .and_then(|value| value.trim().parse().ok())
}

/// Points occupied or targeted by vehicles other than the one looking for a destination.
struct Claims {
    points: BTreeSet<String>,
}

impl Claims {
    fn of_others(snapshot: &PlantSnapshot, vehicle: &str) -> Self {
        let mut points = snapshot.points_occupied_by_others(vehicle);
        points.extend(snapshot.points_targeted_by_others(vehicle));
        Self { points }
    }
}

pub struct PositionSupplier {
    router: Arc<dyn Router>,
    avoid_allocated_by_others: bool,
    /// Access point -> points mutually exclusive with it.
    blocked_sets: BTreeMap<String, BTreeSet<String>>,
}

impl PositionSupplier {
    pub fn new(router: Arc<dyn Router>, avoid_allocated_by_others: bool) -> Self {
        Self {
            router,
            avoid_allocated_by_others,
            blocked_sets: BTreeMap::new(),
        }
    }

    /// Precomputes the blocked sets of all access points of locations offering any of the operations.
    pub fn initialize(&mut self, model: &PlantModel, operations: &[String]) {
        self.blocked_sets.clear();
        for location in model.locations.values() {
            for link in &location.links {
                let relevant = operations
                    .iter()
                    .any(|op| model.link_allows(location, link, op));
                if relevant && !self.blocked_sets.contains_key(&link.point) {
                    self.blocked_sets
                        .insert(link.point.clone(), model.blocked_set(&link.point));
                }
            }
        }
        debug!(access_points = self.blocked_sets.len(), "Initialized position supplier");
    }

    pub fn blocked_set(&self, point: &str) -> Option<&BTreeSet<String>> {
        self.blocked_sets.get(point)
    }

    pub fn find_recharge_destinations(&self, vehicle: &Vehicle, snapshot: &PlantSnapshot) -> Vec<Destination> {
        let operation = vehicle.recharge_operation.as_str();
        self.find_destinations(
            vehicle,
            snapshot,
            operation,
            ASSIGNED_RECHARGE_LOCATION,
            PREFERRED_RECHARGE_LOCATION,
        )
    }

    pub fn find_parking_destinations(&self, vehicle: &Vehicle, snapshot: &PlantSnapshot, operation: &str) -> Vec<Destination> {
        self.find_destinations(
            vehicle,
            snapshot,
            operation,
            ASSIGNED_PARKING_LOCATION,
            PREFERRED_PARKING_LOCATION,
        )
    }

    /// A parking location with a strictly better priority than the one the vehicle is parked at.
    pub fn find_repark_destinations(&self, vehicle: &Vehicle, snapshot: &PlantSnapshot, operation: &str) -> Vec<Destination> {
        let Some(current) = snapshot.location_at_vehicle(vehicle, operation) else {
            return Vec::new();
        };
        let current_priority = parking_priority(current);
        let claims = Claims::of_others(snapshot, &vehicle.name);
        let avoid = self.avoid_set(vehicle, snapshot);

        let mut best: Option<((i64, u64), &Location)> = None;
        for location in snapshot.model.locations.values() {
            if location.name == current.name || !snapshot.model.location_offers_operation(location, operation) {
                continue;
            }
            let Some(priority) = parking_priority(location) else {
                continue;
            };
            if current_priority.is_some_and(|current| priority >= current) {
                continue;
            }
            let Some(costs) = self.location_costs(vehicle, snapshot, location, operation, &claims, &avoid) else {
                continue;
            };
            if best.map_or(true, |(key, _)| (priority, costs) < key) {
                best = Some(((priority, costs), location));
            }
        }

        best.map(|(_, location)| destination(location, operation))
            .into_iter()
            .collect()
    }

    fn find_destinations(
        &self,
        vehicle: &Vehicle,
        snapshot: &PlantSnapshot,
        operation: &str,
        assigned_property: &str,
        preferred_property: &str,
    ) -> Vec<Destination> {
        let model = &snapshot.model;

        if let Some(assigned) = vehicle.properties.get(assigned_property) {
            return match model.locations.get(assigned) {
                Some(location) => vec![destination(location, operation)],
                None => {
                    warn!(vehicle = %vehicle.name, location = %assigned, "Assigned location does not exist");
                    Vec::new()
                }
            };
        }

        let claims = Claims::of_others(snapshot, &vehicle.name);
        let avoid = self.avoid_set(vehicle, snapshot);

        if let Some(preferred) = vehicle
            .properties
            .get(preferred_property)
            .and_then(|name| model.locations.get(name))
        {
            if model.location_offers_operation(preferred, operation)
                && self
                    .location_costs(vehicle, snapshot, preferred, operation, &claims, &avoid)
                    .is_some()
            {
                return vec![destination(preferred, operation)];
            }
            debug!(vehicle = %vehicle.name, location = %preferred.name, "Preferred location unusable");
        }

        let mut best: Option<(u64, &Location)> = None;
        for location in model.locations.values() {
            if !model.location_offers_operation(location, operation) {
                continue;
            }
            let Some(costs) = self.location_costs(vehicle, snapshot, location, operation, &claims, &avoid) else {
                continue;
            };
            if best.map_or(true, |(best_costs, _)| costs < best_costs) {
                best = Some((costs, location));
            }
        }

        best.map(|(_, location)| destination(location, operation))
            .into_iter()
            .collect()
    }

    /// Cheapest usable link of the location, `None` if no link is usable and routable.
    fn location_costs(
        &self,
        vehicle: &Vehicle,
        snapshot: &PlantSnapshot,
        location: &Location,
        operation: &str,
        claims: &Claims,
        avoid: &BTreeSet<String>,
    ) -> Option<u64> {
        let position = vehicle.current_position.as_deref()?;
        let mut best: Option<u64> = None;

        for link in &location.links {
            if !snapshot.model.link_allows(location, link, operation) {
                continue;
            }
            if !self.is_usable(&snapshot.model, &link.point, claims) {
                continue;
            }
            let costs = if link.point == position {
                Some(0)
            } else {
                self.router.costs(vehicle, position, &link.point, avoid)
            };
            if let Some(costs) = costs {
                if best.map_or(true, |b| costs < b) {
                    best = Some(costs);
                }
            }
        }
        best
    }

    fn is_usable(&self, model: &PlantModel, access_point: &str, claims: &Claims) -> bool {
        match self.blocked_sets.get(access_point) {
            Some(blocked) => blocked.is_disjoint(&claims.points),
            None => model.blocked_set(access_point).is_disjoint(&claims.points),
        }
    }

    fn avoid_set(&self, vehicle: &Vehicle, snapshot: &PlantSnapshot) -> BTreeSet<String> {
        if self.avoid_allocated_by_others {
            snapshot.resources_allocated_by_others(&vehicle.name)
        } else {
            BTreeSet::new()
        }
    }
}

fn destination(location: &Location, operation: &str) -> Destination {
    Destination {
        location: location.name.clone(),
        operation: operation.to_string(),
    }
}
