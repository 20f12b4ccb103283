use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Vehicle property naming a recharge location the vehicle must always use.
pub const ASSIGNED_RECHARGE_LOCATION: &str = "assignedRechargeLocation";
/// Vehicle property naming a recharge location used whenever it is available.
pub const PREFERRED_RECHARGE_LOCATION: &str = "preferredRechargeLocation";
pub const ASSIGNED_PARKING_LOCATION: &str = "assignedParkingLocation";
pub const PREFERRED_PARKING_LOCATION: &str = "preferredParkingLocation";

/// Order type accepted by vehicles that take any order.
pub const ANY_ORDER_TYPE: &str = "*";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationLevel {
    ToBeIgnored,
    ToBeNoticed,
    ToBeRespected,
    ToBeUtilized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleState {
    Unknown,
    Unavailable,
    Error,
    Idle,
    Executing,
    Charging,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcState {
    Idle,
    AwaitingOrder,
    ProcessingOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptableOrderType {
    pub name: String,
    /// Lower value means higher priority.
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub name: String,
    pub integration_level: IntegrationLevel,
    pub state: VehicleState,
    pub proc_state: ProcState,
    pub current_position: Option<String>,
    pub next_position: Option<String>,
    pub energy_level: u8,
    pub energy_level_critical: u8,
    pub energy_level_good: u8,
    pub energy_level_sufficiently_recharged: u8,
    pub energy_level_fully_recharged: u8,
    pub recharge_operation: String,
    pub paused: bool,
    pub acceptable_order_types: Vec<AcceptableOrderType>,
    pub order_sequence: Option<String>,
    pub transport_order: Option<String>,
    /// Resources (points/paths) currently claimed for this vehicle by the scheduler.
    pub allocated_resources: BTreeSet<String>,
    /// Set whenever the processing state switches to IDLE.
    pub idle_since: Option<DateTime<Utc>>,
    pub properties: BTreeMap<String, String>,
}

impl Vehicle {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            integration_level: IntegrationLevel::ToBeRespected,
            state: VehicleState::Unknown,
            proc_state: ProcState::Idle,
            current_position: None,
            next_position: None,
            energy_level: 100,
            energy_level_critical: 30,
            energy_level_good: 90,
            energy_level_sufficiently_recharged: 30,
            energy_level_fully_recharged: 90,
            recharge_operation: "CHARGE".to_string(),
            paused: false,
            acceptable_order_types: vec![AcceptableOrderType {
                name: ANY_ORDER_TYPE.to_string(),
                priority: 0,
            }],
            order_sequence: None,
            transport_order: None,
            allocated_resources: BTreeSet::new(),
            idle_since: None,
            properties: BTreeMap::new(),
        }
    }

    /// An utilizable, idle vehicle standing at the given point.
    pub fn idle_at(name: &str, point: &str) -> Self {
        Self {
            integration_level: IntegrationLevel::ToBeUtilized,
            state: VehicleState::Idle,
            current_position: Some(point.to_string()),
            idle_since: Some(Utc::now()),
            ..Self::new(name)
        }
    }

    pub fn with_energy_level(mut self, energy_level: u8) -> Self {
        self.energy_level = energy_level;
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_acceptable_order_types(mut self, types: &[(&str, i32)]) -> Self {
        self.acceptable_order_types = types
            .iter()
            .map(|(name, priority)| AcceptableOrderType {
                name: name.to_string(),
                priority: *priority,
            })
            .collect();
        self
    }

    pub fn is_energy_level_critical(&self) -> bool {
        self.energy_level <= self.energy_level_critical
    }

    pub fn is_energy_level_good(&self) -> bool {
        self.energy_level > self.energy_level_good
    }

    pub fn is_sufficiently_recharged(&self) -> bool {
        self.energy_level >= self.energy_level_sufficiently_recharged
    }

    pub fn is_processing_order(&self) -> bool {
        self.transport_order.is_some()
    }

    /// Priority of the given order type for this vehicle, `None` if not accepted.
    pub fn order_type_priority(&self, order_type: &str) -> Option<i32> {
        self.acceptable_order_types
            .iter()
            .filter(|t| t.name == order_type || t.name == ANY_ORDER_TYPE)
            .map(|t| t.priority)
            .min()
    }

    pub fn accepts_order_type(&self, order_type: &str) -> bool {
        self.order_type_priority(order_type).is_some()
    }
}
