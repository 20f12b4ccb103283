use crate::common::ApplicationResult;
use crate::config::DispatcherConfig;
use crate::domains::dispatching::{build_dispatch_cycle, DispatchTrigger, DispatcherActor, DispatcherHandle};
use crate::domains::fleet::VehicleControllerPool;
use crate::domains::plant_model::{PlantEvent, PlantModelService, Router};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Runs the dispatcher actor and its trigger on the current tokio runtime.
pub struct DispatcherService {
    handle: DispatcherHandle,
    actor_task: JoinHandle<()>,
    trigger_task: JoinHandle<()>,
}

impl DispatcherService {
    /// Fails on invalid configuration before anything is spawned.
    pub fn start(
        config: &DispatcherConfig,
        plant: Arc<dyn PlantModelService>,
        router: Arc<dyn Router>,
        controllers: Arc<dyn VehicleControllerPool>,
        events: mpsc::UnboundedReceiver<PlantEvent>,
    ) -> ApplicationResult<Self> {
        let cycle = build_dispatch_cycle(config, plant, router, controllers)?;
        let (actor, handle) = DispatcherActor::new(cycle);
        let trigger = DispatchTrigger::new(events, handle.clone(), config);

        let actor_task = tokio::spawn(actor.run());
        let trigger_task = tokio::spawn(trigger.run());
        info!("Dispatcher service started");

        Ok(Self {
            handle,
            actor_task,
            trigger_task,
        })
    }

    pub fn handle(&self) -> DispatcherHandle {
        self.handle.clone()
    }

    /// Stops the trigger, lets queued work finish, then stops the actor.
    pub async fn shutdown(self) -> ApplicationResult<()> {
        self.trigger_task.abort();
        let _ = self.trigger_task.await;
        self.handle.flush().await?;
        self.actor_task.abort();
        let _ = self.actor_task.await;
        info!("Dispatcher service stopped");
        Ok(())
    }
}
