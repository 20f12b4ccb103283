use std::collections::{BTreeMap, BTreeSet};

/// Claims of vehicles on transport orders.
///
/// Tentative reservations live only while candidates are evaluated and are
/// dropped by [`OrderReservationPool::release_tentative`]. Held reservations
/// survive across dispatch cycles until the order is assigned to the vehicle
/// or the reservation is released.
///
/// Only ever touched from the dispatcher's serialized context.
#[derive(Debug, Clone, Default)]
pub struct OrderReservationPool {
    reservations: BTreeMap<String, BTreeSet<String>>,
    held: BTreeSet<(String, String)>,
}

impl OrderReservationPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, order: &str, vehicle: &str) {
        self.reservations
            .entry(order.to_string())
            .or_default()
            .insert(vehicle.to_string());
    }

    /// Reserves the order and keeps the reservation across cycles.
    pub fn hold(&mut self, order: &str, vehicle: &str) {
        self.reserve(order, vehicle);
        self.held.insert((order.to_string(), vehicle.to_string()));
    }

    pub fn release(&mut self, order: &str, vehicle: &str) {
        if let Some(vehicles) = self.reservations.get_mut(order) {
            vehicles.remove(vehicle);
            if vehicles.is_empty() {
                self.reservations.remove(order);
            }
        }
        self.held.remove(&(order.to_string(), vehicle.to_string()));
    }

    /// Drops every reservation on the order.
    pub fn release_order(&mut self, order: &str) {
        self.reservations.remove(order);
        self.held.retain(|(o, _)| o != order);
    }

    /// Drops every reservation the vehicle holds.
    pub fn release_vehicle(&mut self, vehicle: &str) {
        for order in self.find_reservations(vehicle) {
            self.release(&order, vehicle);
        }
    }

    /// Drops all reservations that are not held.
    pub fn release_tentative(&mut self) {
        let held = &self.held;
        self.reservations.retain(|order, vehicles| {
            vehicles.retain(|v| held.contains(&(order.clone(), v.clone())));
            !vehicles.is_empty()
        });
    }

    /// Orders reserved by the vehicle, in name order.
    pub fn find_reservations(&self, vehicle: &str) -> Vec<String> {
        self.reservations
            .iter()
            .filter(|(_, vehicles)| vehicles.contains(vehicle))
            .map(|(order, _)| order.clone())
            .collect()
    }

    pub fn reserved_by(&self, order: &str) -> BTreeSet<String> {
        self.reservations.get(order).cloned().unwrap_or_default()
    }

    pub fn is_reserved(&self, order: &str) -> bool {
        self.reservations.contains_key(order)
    }

    pub fn is_held(&self, order: &str) -> bool {
        self.held.iter().any(|(o, _)| o == order)
    }

    /// Vehicles holding the order across cycles, in name order.
    pub fn holders_of(&self, order: &str) -> Vec<String> {
        self.held
            .iter()
            .filter(|(o, _)| o == order)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Orders the vehicle holds across cycles, in name order.
    pub fn held_by(&self, vehicle: &str) -> Vec<String> {
        self.held
            .iter()
            .filter(|(_, v)| v == vehicle)
            .map(|(o, _)| o.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}
