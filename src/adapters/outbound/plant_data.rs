use crate::domains::fleet::Vehicle;
use crate::domains::plant_model::PlantModel;
use crate::domains::transport_order::{Destination, DriveOrder, TransportOrder};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the plant model file.
pub const PLANT_MODEL_ENV: &str = "FLEET_PLANT_MODEL";

/// A vehicle standing idle somewhere in the plant at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleSeed {
    pub name: String,
    pub position: String,
    #[serde(default = "full_energy")]
    pub energy_level: u8,
}

fn full_energy() -> u8 {
    100
}

impl VehicleSeed {
    pub fn to_vehicle(&self) -> Vehicle {
        Vehicle::idle_at(&self.name, &self.position).with_energy_level(self.energy_level)
    }
}

/// A transport order to be created at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSeed {
    pub name: String,
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub intended_vehicle: Option<String>,
}

impl OrderSeed {
    pub fn to_order(&self) -> TransportOrder {
        let drive_orders = self
            .destinations
            .iter()
            .map(|d| DriveOrder::new(&d.location, &d.operation))
            .collect();
        let order = TransportOrder::new(&self.name, drive_orders);
        match self.intended_vehicle.as_deref() {
            Some(vehicle) => order.with_intended_vehicle(vehicle),
            None => order,
        }
    }
}

/// Contents of a plant file: the topology plus an optional initial fleet and workload.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantData {
    #[serde(flatten)]
    pub model: PlantModel,
    #[serde(default)]
    pub vehicles: Vec<VehicleSeed>,
    #[serde(default)]
    pub transport_orders: Vec<OrderSeed>,
}

/// Resolves the plant model file: `FLEET_PLANT_MODEL`, then `./plant.json`,
/// then `resources/plant.json`.
pub fn resolve_plant_model_path() -> PathBuf {
    if let Ok(path) = env::var(PLANT_MODEL_ENV) {
        return PathBuf::from(path);
    }
    let cwd_default = Path::new("plant.json");
    if cwd_default.exists() {
        return cwd_default.to_path_buf();
    }
    PathBuf::from("resources/plant.json")
}

pub fn parse_plant_data(json: &str) -> Result<PlantData> {
    let data: PlantData = serde_json::from_str(json).context("invalid plant data")?;
    Ok(data)
}

pub fn parse_plant_model(json: &str) -> Result<PlantModel> {
    Ok(parse_plant_data(json)?.model)
}

pub async fn load_plant_data<P: AsRef<Path>>(path: P) -> Result<PlantData> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading plant model {}", path.display()))?;
    parse_plant_data(&content)
}

pub async fn load_plant_model<P: AsRef<Path>>(path: P) -> Result<PlantModel> {
    Ok(load_plant_data(path).await?.model)
}
