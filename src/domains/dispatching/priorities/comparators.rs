use super::PriorityComparator;
use crate::domains::dispatching::{AssignmentCandidate, RankingContext};
use crate::domains::fleet::{ProcState, Vehicle};
use crate::domains::transport_order::TransportOrder;
use chrono::Duration;
use std::cmp::Ordering;

pub const IDLE_FIRST: &str = "IDLE_FIRST";
pub const BY_ENERGY_LEVEL: &str = "BY_ENERGY_LEVEL";
pub const BY_NAME: &str = "BY_NAME";
pub const BY_AGE: &str = "BY_AGE";
pub const BY_DEADLINE: &str = "BY_DEADLINE";
pub const DEADLINE_AT_RISK_FIRST: &str = "DEADLINE_AT_RISK_FIRST";
pub const BY_COMPLETE_ROUTING_COSTS: &str = "BY_COMPLETE_ROUTING_COSTS";
pub const BY_INITIAL_ROUTING_COSTS: &str = "BY_INITIAL_ROUTING_COSTS";
pub const BY_ORDER_TYPE_PRIORITY: &str = "BY_ORDER_TYPE_PRIORITY";

// Vehicles

/// Vehicles without an order before those processing one.
pub struct IdleFirst;

impl PriorityComparator<Vehicle> for IdleFirst {
    fn key(&self) -> &'static str {
        IDLE_FIRST
    }

    fn compare(&self, a: &Vehicle, b: &Vehicle, _ctx: &RankingContext) -> Ordering {
        let busy = |v: &Vehicle| v.proc_state != ProcState::Idle || v.transport_order.is_some();
        busy(a).cmp(&busy(b))
    }
}

/// Higher energy level first.
pub struct ByEnergyLevel;

impl PriorityComparator<Vehicle> for ByEnergyLevel {
    fn key(&self) -> &'static str {
        BY_ENERGY_LEVEL
    }

    fn compare(&self, a: &Vehicle, b: &Vehicle, _ctx: &RankingContext) -> Ordering {
        b.energy_level.cmp(&a.energy_level)
    }
}

pub struct ByVehicleName;

impl PriorityComparator<Vehicle> for ByVehicleName {
    fn key(&self) -> &'static str {
        BY_NAME
    }

    fn compare(&self, a: &Vehicle, b: &Vehicle, _ctx: &RankingContext) -> Ordering {
        a.name.cmp(&b.name)
    }
}

// Transport orders

/// Older orders first.
pub struct ByAge;

impl PriorityComparator<TransportOrder> for ByAge {
    fn key(&self) -> &'static str {
        BY_AGE
    }

    fn compare(&self, a: &TransportOrder, b: &TransportOrder, _ctx: &RankingContext) -> Ordering {
        a.creation_time.cmp(&b.creation_time)
    }
}

pub struct ByDeadline;

impl PriorityComparator<TransportOrder> for ByDeadline {
    fn key(&self) -> &'static str {
        BY_DEADLINE
    }

    fn compare(&self, a: &TransportOrder, b: &TransportOrder, _ctx: &RankingContext) -> Ordering {
        a.deadline.cmp(&b.deadline)
    }
}

/// Orders whose deadline falls within the risk period come first; no order among them.
pub struct DeadlineAtRiskFirst {
    period: Duration,
}

impl DeadlineAtRiskFirst {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    fn at_risk(&self, order: &TransportOrder, ctx: &RankingContext) -> bool {
        order.deadline - ctx.now < self.period
    }
}

impl PriorityComparator<TransportOrder> for DeadlineAtRiskFirst {
    fn key(&self) -> &'static str {
        DEADLINE_AT_RISK_FIRST
    }

    fn compare(&self, a: &TransportOrder, b: &TransportOrder, ctx: &RankingContext) -> Ordering {
        self.at_risk(b, ctx).cmp(&self.at_risk(a, ctx))
    }
}

pub struct ByOrderName;

impl PriorityComparator<TransportOrder> for ByOrderName {
    fn key(&self) -> &'static str {
        BY_NAME
    }

    fn compare(&self, a: &TransportOrder, b: &TransportOrder, _ctx: &RankingContext) -> Ordering {
        a.name.cmp(&b.name)
    }
}

// Assignment candidates

pub struct ByCompleteRoutingCosts;

impl PriorityComparator<AssignmentCandidate> for ByCompleteRoutingCosts {
    fn key(&self) -> &'static str {
        BY_COMPLETE_ROUTING_COSTS
    }

    fn compare(&self, a: &AssignmentCandidate, b: &AssignmentCandidate, _ctx: &RankingContext) -> Ordering {
        a.complete_routing_costs().cmp(&b.complete_routing_costs())
    }
}

pub struct ByInitialRoutingCosts;

impl PriorityComparator<AssignmentCandidate> for ByInitialRoutingCosts {
    fn key(&self) -> &'static str {
        BY_INITIAL_ROUTING_COSTS
    }

    fn compare(&self, a: &AssignmentCandidate, b: &AssignmentCandidate, _ctx: &RankingContext) -> Ordering {
        a.initial_routing_costs().cmp(&b.initial_routing_costs())
    }
}

/// Candidates whose order type the vehicle prioritizes higher come first.
pub struct ByOrderTypePriority;

impl PriorityComparator<AssignmentCandidate> for ByOrderTypePriority {
    fn key(&self) -> &'static str {
        BY_ORDER_TYPE_PRIORITY
    }

    fn compare(&self, a: &AssignmentCandidate, b: &AssignmentCandidate, _ctx: &RankingContext) -> Ordering {
        let priority = |c: &AssignmentCandidate| {
            c.vehicle()
                .order_type_priority(&c.order().order_type)
                .unwrap_or(i32::MAX)
        };
        priority(a).cmp(&priority(b))
    }
}

/// Compares candidates by their vehicles.
pub struct ByVehicle<C>(pub C);

impl<C: PriorityComparator<Vehicle>> PriorityComparator<AssignmentCandidate> for ByVehicle<C> {
    fn key(&self) -> &'static str {
        self.0.key()
    }

    fn compare(&self, a: &AssignmentCandidate, b: &AssignmentCandidate, ctx: &RankingContext) -> Ordering {
        self.0.compare(a.vehicle(), b.vehicle(), ctx)
    }
}

/// Compares candidates by their orders.
pub struct ByOrder<C>(pub C);

impl<C: PriorityComparator<TransportOrder>> PriorityComparator<AssignmentCandidate> for ByOrder<C> {
    fn key(&self) -> &'static str {
        self.0.key()
    }

    fn compare(&self, a: &AssignmentCandidate, b: &AssignmentCandidate, ctx: &RankingContext) -> Ordering {
        self.0.compare(a.order(), b.order(), ctx)
    }
}
