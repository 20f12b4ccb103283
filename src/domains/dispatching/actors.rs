use crate::common::{ApplicationError, ApplicationResult, DomainError};
use crate::domains::dispatching::{DispatchCycle, ReroutingType};
use crate::domains::plant_model::PlantModelService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum DispatcherCommand {
    Dispatch,
    Reroute {
        vehicle: String,
        reroute_type: ReroutingType,
    },
    WithdrawByOrder {
        order: String,
        immediate: bool,
    },
    WithdrawByVehicle {
        vehicle: String,
        immediate: bool,
    },
    /// Completes once every command queued before it has run.
    Flush(oneshot::Sender<()>),
}

/// The dispatcher's serialized context: runs one command at a time, in submission order.
pub struct DispatcherActor {
    cycle: DispatchCycle,
    commands: mpsc::UnboundedReceiver<DispatcherCommand>,
    dispatch_pending: Arc<AtomicBool>,
}

impl DispatcherActor {
    pub fn new(cycle: DispatchCycle) -> (Self, DispatcherHandle) {
        let (sender, commands) = mpsc::unbounded_channel();
        let dispatch_pending = Arc::new(AtomicBool::new(false));
        let handle = DispatcherHandle {
            commands: sender,
            dispatch_pending: dispatch_pending.clone(),
            plant: cycle.plant().clone(),
        };
        let actor = Self {
            cycle,
            commands,
            dispatch_pending,
        };
        (actor, handle)
    }

    /// Runs until every handle is dropped.
    pub async fn run(mut self) {
        info!("Dispatcher started");
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        info!("Dispatcher stopped");
    }

    fn handle(&mut self, command: DispatcherCommand) {
        match command {
            DispatcherCommand::Dispatch => {
                self.dispatch_pending.store(false, Ordering::SeqCst);
                self.cycle.run();
            }
            DispatcherCommand::Reroute {
                vehicle,
                reroute_type,
            } => {
                if let Err(e) = self.cycle.reroute(&vehicle, reroute_type) {
                    warn!(%vehicle, error = %e, "Rerouting failed");
                }
            }
            DispatcherCommand::WithdrawByOrder { order, immediate } => {
                if let Err(e) = self.cycle.withdraw_by_order(&order, immediate) {
                    warn!(%order, error = %e, "Withdrawal failed");
                }
            }
            DispatcherCommand::WithdrawByVehicle { vehicle, immediate } => {
                if let Err(e) = self.cycle.withdraw_by_vehicle(&vehicle, immediate) {
                    warn!(%vehicle, error = %e, "Withdrawal failed");
                }
            }
            DispatcherCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Submits work to the dispatcher without blocking. Cheap to clone.
#[derive(Clone)]
pub struct DispatcherHandle {
    commands: mpsc::UnboundedSender<DispatcherCommand>,
    dispatch_pending: Arc<AtomicBool>,
    plant: Arc<dyn PlantModelService>,
}

impl DispatcherHandle {
    /// Requests a dispatch cycle. Requests arriving while one is still queued are merged into it.
    pub fn dispatch(&self) -> ApplicationResult<()> {
        if self.dispatch_pending.swap(true, Ordering::SeqCst) {
            debug!("Dispatch already pending");
            return Ok(());
        }
        self.submit(DispatcherCommand::Dispatch).inspect_err(|_| {
            self.dispatch_pending.store(false, Ordering::SeqCst);
        })
    }

    pub fn is_dispatch_pending(&self) -> bool {
        self.dispatch_pending.load(Ordering::SeqCst)
    }

    pub fn reroute(&self, vehicle: &str, reroute_type: ReroutingType) -> ApplicationResult<()> {
        self.plant
            .vehicle(vehicle)
            .ok_or_else(|| DomainError::unknown_vehicle(vehicle))?;
        self.submit(DispatcherCommand::Reroute {
            vehicle: vehicle.to_string(),
            reroute_type,
        })
    }

    pub fn withdraw_by_order(&self, order: &str, immediate: bool) -> ApplicationResult<()> {
        self.plant
            .transport_order(order)
            .ok_or_else(|| DomainError::unknown_order(order))?;
        self.submit(DispatcherCommand::WithdrawByOrder {
            order: order.to_string(),
            immediate,
        })
    }

    pub fn withdraw_by_vehicle(&self, vehicle: &str, immediate: bool) -> ApplicationResult<()> {
        self.plant
            .vehicle(vehicle)
            .ok_or_else(|| DomainError::unknown_vehicle(vehicle))?;
        self.submit(DispatcherCommand::WithdrawByVehicle {
            vehicle: vehicle.to_string(),
            immediate,
        })
    }

    /// Waits until everything submitted so far has been processed.
    pub async fn flush(&self) -> ApplicationResult<()> {
        let (done, wait) = oneshot::channel();
        self.submit(DispatcherCommand::Flush(done))?;
        wait.await.map_err(|_| ApplicationError::DispatcherUnavailable)
    }

    fn submit(&self, command: DispatcherCommand) -> ApplicationResult<()> {
        self.commands
            .send(command)
            .map_err(|_| ApplicationError::DispatcherUnavailable)
    }
}
