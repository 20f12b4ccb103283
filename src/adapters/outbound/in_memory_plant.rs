use crate::common::{DomainError, DomainResult};
use crate::domains::fleet::{ProcState, Vehicle};
use crate::domains::plant_model::{PlantEvent, PlantModel, PlantModelService};
use crate::domains::transport_order::{
    DriveOrder, OrderSequence, OrderState, Rejection, TransportOrder,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Default)]
struct PlantState {
    vehicles: BTreeMap<String, Vehicle>,
    orders: BTreeMap<String, TransportOrder>,
    sequences: BTreeMap<String, OrderSequence>,
}

/// Object service keeping the whole plant in memory and publishing every change.
pub struct InMemoryPlantModel {
    model: Arc<PlantModel>,
    state: RwLock<PlantState>,
    events: Option<mpsc::UnboundedSender<PlantEvent>>,
}

impl InMemoryPlantModel {
    pub fn new(model: PlantModel) -> Self {
        Self {
            model: Arc::new(model),
            state: RwLock::new(PlantState::default()),
            events: None,
        }
    }

    /// Publishes change events to `sink`.
    pub fn with_event_sink(mut self, sink: mpsc::UnboundedSender<PlantEvent>) -> Self {
        self.events = Some(sink);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, PlantState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, PlantState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: PlantEvent) {
        if let Some(sink) = &self.events {
            if sink.send(event).is_err() {
                debug!("No listener for plant events");
            }
        }
    }

    pub fn add_vehicle(&self, vehicle: Vehicle) {
        self.write().vehicles.insert(vehicle.name.clone(), vehicle);
    }

    pub fn add_order_sequence(&self, sequence: OrderSequence) {
        self.write().sequences.insert(sequence.name.clone(), sequence);
    }

    /// Applies a change reported from the field, as a vehicle driver would.
    pub fn update_vehicle<F>(&self, name: &str, change: F) -> DomainResult<()>
    where
        F: FnOnce(&mut Vehicle),
    {
        let (previous, current) = {
            let mut state = self.write();
            let vehicle = state
                .vehicles
                .get_mut(name)
                .ok_or_else(|| DomainError::unknown_vehicle(name))?;
            let previous = vehicle.clone();
            change(vehicle);
            if previous.proc_state != ProcState::Idle && vehicle.proc_state == ProcState::Idle {
                vehicle.idle_since = Some(Utc::now());
            }
            (previous, vehicle.clone())
        };
        self.publish(PlantEvent::VehicleChanged {
            previous: Box::new(previous),
            current: Box::new(current),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn change_order<F>(&self, name: &str, change: F) -> DomainResult<()>
    where
        F: FnOnce(&mut TransportOrder) -> DomainResult<()>,
    {
        let (previous, current) = {
            let mut state = self.write();
            let order = state
                .orders
                .get_mut(name)
                .ok_or_else(|| DomainError::unknown_order(name))?;
            let previous = order.clone();
            change(order)?;
            (previous, order.clone())
        };
        self.publish(PlantEvent::TransportOrderChanged {
            previous: Box::new(previous),
            current: Box::new(current),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

impl PlantModelService for InMemoryPlantModel {
    fn plant_model(&self) -> Arc<PlantModel> {
        self.model.clone()
    }

    fn vehicles(&self) -> Vec<Vehicle> {
        self.read().vehicles.values().cloned().collect()
    }

    fn vehicle(&self, name: &str) -> Option<Vehicle> {
        self.read().vehicles.get(name).cloned()
    }

    fn transport_orders(&self) -> Vec<TransportOrder> {
        self.read().orders.values().cloned().collect()
    }

    fn transport_order(&self, name: &str) -> Option<TransportOrder> {
        self.read().orders.get(name).cloned()
    }

    fn order_sequences(&self) -> Vec<OrderSequence> {
        self.read().sequences.values().cloned().collect()
    }

    fn order_sequence(&self, name: &str) -> Option<OrderSequence> {
        self.read().sequences.get(name).cloned()
    }

    fn create_transport_order(&self, order: TransportOrder) -> DomainResult<()> {
        let name = order.name.clone();
        {
            let mut state = self.write();
            if state.orders.contains_key(&name) {
                return Err(DomainError::InvalidCommand {
                    reason: format!("transport order {} already exists", name),
                });
            }
            state.orders.insert(name.clone(), order);
        }
        self.publish(PlantEvent::TransportOrderCreated {
            order: name,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn update_order_state(&self, order: &str, state: OrderState) -> DomainResult<()> {
        self.change_order(order, |o| {
            if o.state.is_final() {
                return Err(DomainError::IllegalStateTransition {
                    object: o.name.clone(),
                    from: o.state.to_string(),
                    to: state.to_string(),
                });
            }
            o.state = state;
            if state.is_final() {
                o.finished_time = Some(Utc::now());
            }
            Ok(())
        })
    }

    fn update_order_drive_orders(&self, order: &str, drive_orders: Vec<DriveOrder>) -> DomainResult<()> {
        self.change_order(order, |o| {
            o.drive_orders = drive_orders;
            Ok(())
        })
    }

    fn update_order_processing(
        &self,
        order: &str,
        processing_vehicle: Option<&str>,
        current_drive_order: Option<usize>,
    ) -> DomainResult<()> {
        self.change_order(order, |o| {
            o.processing_vehicle = processing_vehicle.map(str::to_string);
            o.current_drive_order = current_drive_order;
            Ok(())
        })
    }

    fn add_order_rejection(&self, order: &str, rejection: Rejection) -> DomainResult<()> {
        self.change_order(order, |o| {
            o.rejections.push(rejection);
            Ok(())
        })
    }

    fn update_order_sequence(&self, sequence: OrderSequence) -> DomainResult<()> {
        let mut state = self.write();
        if !state.sequences.contains_key(&sequence.name) {
            return Err(DomainError::unknown_sequence(&sequence.name));
        }
        state.sequences.insert(sequence.name.clone(), sequence);
        Ok(())
    }

    fn update_vehicle_proc_state(&self, vehicle: &str, proc_state: ProcState) -> DomainResult<()> {
        self.update_vehicle(vehicle, |v| v.proc_state = proc_state)
    }

    fn update_vehicle_transport_order(&self, vehicle: &str, order: Option<&str>) -> DomainResult<()> {
        self.update_vehicle(vehicle, |v| v.transport_order = order.map(str::to_string))
    }

    fn update_vehicle_order_sequence(&self, vehicle: &str, sequence: Option<&str>) -> DomainResult<()> {
        self.update_vehicle(vehicle, |v| v.order_sequence = sequence.map(str::to_string))
    }
}
