use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Order type of orders that do not ask for a specific kind of vehicle.
pub const DEFAULT_ORDER_TYPE: &str = "-";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Raw,
    Active,
    Dispatchable,
    BeingProcessed,
    Withdrawn,
    Failed,
    Finished,
}

impl OrderState {
    pub fn is_final(&self) -> bool {
        matches!(self, OrderState::Failed | OrderState::Finished)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriveOrderState {
    Pristine,
    Travelling,
    Operating,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destination {
    pub location: String,
    pub operation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub path: Option<String>,
    pub source_point: Option<String>,
    pub destination_point: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub steps: Vec<Step>,
    pub costs: u64,
}

impl Route {
    /// Route of a vehicle that is already standing at its destination.
    pub fn stationary(point: &str) -> Self {
        Self {
            steps: vec![Step {
                path: None,
                source_point: None,
                destination_point: point.to_string(),
            }],
            costs: 0,
        }
    }

    pub fn final_point(&self) -> Option<&str> {
        self.steps.last().map(|s| s.destination_point.as_str())
    }

    /// Every point and path the route passes, in travel order.
    pub fn resources(&self) -> Vec<String> {
        let mut resources = Vec::new();
        for step in &self.steps {
            if let Some(path) = &step.path {
                resources.push(path.clone());
            }
            resources.push(step.destination_point.clone());
        }
        resources
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveOrder {
    pub destination: Destination,
    pub route: Option<Route>,
    pub state: DriveOrderState,
}

impl DriveOrder {
    pub fn new(location: &str, operation: &str) -> Self {
        Self {
            destination: Destination {
                location: location.to_string(),
                operation: operation.to_string(),
            },
            route: None,
            state: DriveOrderState::Pristine,
        }
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rejection {
    pub vehicle: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportOrder {
    pub name: String,
    pub drive_orders: Vec<DriveOrder>,
    /// Index of the drive order currently being processed.
    pub current_drive_order: Option<usize>,
    pub state: OrderState,
    pub intended_vehicle: Option<String>,
    pub processing_vehicle: Option<String>,
    pub order_type: String,
    pub dispensable: bool,
    pub deadline: DateTime<Utc>,
    pub creation_time: DateTime<Utc>,
    pub finished_time: Option<DateTime<Utc>>,
    /// Orders that must be finished before this one may be dispatched.
    pub dependencies: BTreeSet<String>,
    pub wrapping_sequence: Option<String>,
    pub resources_to_avoid: BTreeSet<String>,
    pub rejections: Vec<Rejection>,
    pub properties: BTreeMap<String, String>,
}

impl TransportOrder {
    pub fn new(name: &str, drive_orders: Vec<DriveOrder>) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            drive_orders,
            current_drive_order: None,
            state: OrderState::Raw,
            intended_vehicle: None,
            processing_vehicle: None,
            order_type: DEFAULT_ORDER_TYPE.to_string(),
            dispensable: false,
            deadline: now + Duration::days(365),
            creation_time: now,
            finished_time: None,
            dependencies: BTreeSet::new(),
            wrapping_sequence: None,
            resources_to_avoid: BTreeSet::new(),
            rejections: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_state(mut self, state: OrderState) -> Self {
        self.state = state;
        self
    }

    pub fn with_intended_vehicle(mut self, vehicle: &str) -> Self {
        self.intended_vehicle = Some(vehicle.to_string());
        self
    }

    pub fn with_order_type(mut self, order_type: &str) -> Self {
        self.order_type = order_type.to_string();
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_creation_time(mut self, creation_time: DateTime<Utc>) -> Self {
        self.creation_time = creation_time;
        self
    }

    pub fn with_dependency(mut self, order: &str) -> Self {
        self.dependencies.insert(order.to_string());
        self
    }

    pub fn with_resources_to_avoid(mut self, resources: &[&str]) -> Self {
        self.resources_to_avoid = resources.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn dispensable(mut self) -> Self {
        self.dispensable = true;
        self
    }

    pub fn current_drive_order(&self) -> Option<&DriveOrder> {
        self.current_drive_order.and_then(|i| self.drive_orders.get(i))
    }

    /// Drive orders not yet finished, including the current one.
    pub fn remaining_drive_orders(&self) -> &[DriveOrder] {
        let start = self.current_drive_order.unwrap_or(0).min(self.drive_orders.len());
        &self.drive_orders[start..]
    }

    pub fn has_future_drive_orders(&self) -> bool {
        match self.current_drive_order {
            Some(i) => i + 1 < self.drive_orders.len(),
            None => !self.drive_orders.is_empty(),
        }
    }

    /// Final points of the routes this order still has to travel.
    pub fn targeted_points(&self) -> Vec<String> {
        self.remaining_drive_orders()
            .iter()
            .filter_map(|d| d.route.as_ref())
            .filter_map(|r| r.final_point().map(str::to_string))
            .collect()
    }
}
