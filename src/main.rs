use fleet_dispatch::adapters::outbound::{
    load_plant_data, resolve_plant_model_path, GraphRouter, InMemoryPlantModel,
    InMemoryVehicleControllerPool,
};
use fleet_dispatch::application::DispatcherService;
use fleet_dispatch::domains::plant_model::PlantModelService;
use fleet_dispatch::Config;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load("config.toml")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting fleet dispatcher");

    let plant_path = resolve_plant_model_path();
    let data = load_plant_data(&plant_path).await?;
    let model = data.model;
    info!(
        path = %plant_path.display(),
        points = model.points.len(),
        locations = model.locations.len(),
        vehicles = data.vehicles.len(),
        transport_orders = data.transport_orders.len(),
        "Plant model loaded"
    );

    let (event_sender, event_receiver) = mpsc::unbounded_channel();
    let router = Arc::new(GraphRouter::new(&model));
    let plant = Arc::new(InMemoryPlantModel::new(model).with_event_sink(event_sender));
    let controllers = Arc::new(InMemoryVehicleControllerPool::new());
    for seed in &data.vehicles {
        plant.add_vehicle(seed.to_vehicle());
    }

    let service = DispatcherService::start(
        &config.dispatcher,
        plant.clone(),
        router,
        controllers,
        event_receiver,
    )?;
    service.handle().dispatch()?;
    for seed in &data.transport_orders {
        plant.create_transport_order(seed.to_order())?;
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down fleet dispatcher");
    service.shutdown().await?;

    Ok(())
}
