use crate::common::{ApplicationError, ApplicationResult, DomainEvent};
use crate::config::DispatcherConfig;
use crate::domains::dispatching::{DispatcherHandle, ReroutingType};
use crate::domains::fleet::{ProcState, Vehicle};
use crate::domains::plant_model::PlantEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerAction {
    Dispatch,
    Reroute(String),
    Ignore,
}

/// Whether a vehicle change may have made new assignments possible.
pub fn vehicle_change_requires_dispatch(previous: &Vehicle, current: &Vehicle) -> bool {
    let became_available = previous.proc_state != current.proc_state
        && matches!(current.proc_state, ProcState::Idle | ProcState::AwaitingOrder);
    let left_sequence = previous.order_sequence.is_some() && current.order_sequence.is_none();
    // A vehicle skipped for recharging may need it now.
    let drained_while_idle =
        current.proc_state == ProcState::Idle && current.energy_level < previous.energy_level;

    became_available || left_sequence || drained_while_idle
}

/// Turns plant events and timer ticks into dispatcher requests.
pub struct DispatchTrigger {
    events: mpsc::UnboundedReceiver<PlantEvent>,
    handle: DispatcherHandle,
    reroute_on_drive_order_finished: bool,
    period: Option<Duration>,
}

impl DispatchTrigger {
    pub fn new(
        events: mpsc::UnboundedReceiver<PlantEvent>,
        handle: DispatcherHandle,
        config: &DispatcherConfig,
    ) -> Self {
        Self {
            events,
            handle,
            reroute_on_drive_order_finished: config.reroute_on_drive_order_finished,
            period: config.dispatch_interval(),
        }
    }

    pub fn action_for(&self, event: &PlantEvent) -> TriggerAction {
        match event {
            PlantEvent::VehicleChanged { previous, current, .. } => {
                if vehicle_change_requires_dispatch(previous, current) {
                    TriggerAction::Dispatch
                } else {
                    TriggerAction::Ignore
                }
            }
            PlantEvent::TransportOrderCreated { .. } => TriggerAction::Dispatch,
            PlantEvent::TransportOrderChanged { previous, current, .. } => {
                let advanced = matches!(
                    (previous.current_drive_order, current.current_drive_order),
                    (Some(before), Some(after)) if after > before
                );
                match current.processing_vehicle.as_deref() {
                    Some(vehicle)
                        if self.reroute_on_drive_order_finished
                            && advanced
                            && current.has_future_drive_orders() =>
                    {
                        TriggerAction::Reroute(vehicle.to_string())
                    }
                    _ => TriggerAction::Ignore,
                }
            }
        }
    }

    fn handle_event(&self, event: &PlantEvent) -> ApplicationResult<()> {
        let action = self.action_for(event);
        if action != TriggerAction::Ignore {
            debug!(
                event = event.event_type(),
                object = event.aggregate_id(),
                at = %event.occurred_at(),
                ?action,
                "Plant event triggers dispatcher"
            );
        }
        match action {
            TriggerAction::Dispatch => self.handle.dispatch(),
            TriggerAction::Reroute(vehicle) => self.handle.reroute(&vehicle, ReroutingType::Regular),
            TriggerAction::Ignore => Ok(()),
        }
    }

    /// Runs until the event stream closes or the dispatcher stops.
    pub async fn run(mut self) {
        info!(period = ?self.period, "Dispatch trigger started");
        let mut ticker = self.period.map(|period| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            let result = tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(&event),
                    None => {
                        debug!("Event stream closed");
                        break;
                    }
                },
                _ = tick(&mut ticker) => self.handle.dispatch(),
            };
            match result {
                Ok(()) => {}
                Err(ApplicationError::DispatcherUnavailable) => {
                    warn!("Dispatcher unavailable, stopping trigger");
                    break;
                }
                Err(e) => debug!(error = %e, "Trigger request refused"),
            }
        }
        info!("Dispatch trigger stopped");
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
