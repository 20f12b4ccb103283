use serde::{Deserialize, Serialize};

/// Transport orders that must be processed one after another by the same vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSequence {
    pub name: String,
    pub orders: Vec<String>,
    /// Index of the last finished order, `None` before the first one finished.
    pub finished_index: Option<usize>,
    /// No more orders will be added.
    pub complete: bool,
    /// Failing one order fails all orders following it.
    pub failure_fatal: bool,
    pub intended_vehicle: Option<String>,
    pub processing_vehicle: Option<String>,
    pub finished: bool,
}

impl OrderSequence {
    pub fn new(name: &str, orders: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            orders: orders.iter().map(|o| o.to_string()).collect(),
            finished_index: None,
            complete: false,
            failure_fatal: false,
            intended_vehicle: None,
            processing_vehicle: None,
            finished: false,
        }
    }

    pub fn completed(mut self) -> Self {
        self.complete = true;
        self
    }

    pub fn failure_fatal(mut self) -> Self {
        self.failure_fatal = true;
        self
    }

    pub fn next_unfinished_order(&self) -> Option<&str> {
        let next = self.finished_index.map(|i| i + 1).unwrap_or(0);
        self.orders.get(next).map(String::as_str)
    }

    pub fn orders_after(&self, order: &str) -> Vec<String> {
        match self.orders.iter().position(|o| o == order) {
            Some(i) => self.orders[i + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Records the order as finished; the sequence finishes with its last order once complete.
    pub fn mark_finished(&mut self, order: &str) {
        if let Some(i) = self.orders.iter().position(|o| o == order) {
            self.finished_index = Some(self.finished_index.map_or(i, |f| f.max(i)));
        }
        if self.complete && self.next_unfinished_order().is_none() {
            self.finished = true;
        }
    }
}
