use super::SelectionFilter;
use crate::domains::dispatching::DispatchContext;
use crate::domains::transport_order::{OrderState, TransportOrder};

pub struct IsDispatchable;

impl SelectionFilter<TransportOrder> for IsDispatchable {
    fn name(&self) -> &'static str {
        "IsDispatchable"
    }

    fn apply(&self, order: &TransportOrder, _ctx: &DispatchContext<'_>) -> Vec<String> {
        match order.state {
            OrderState::Active | OrderState::Dispatchable => Vec::new(),
            other => vec![format!("order state {}", other)],
        }
    }
}

/// Unknown dependencies count as unfinished.
pub struct DependenciesFinished;

impl SelectionFilter<TransportOrder> for DependenciesFinished {
    fn name(&self) -> &'static str {
        "DependenciesFinished"
    }

    fn apply(&self, order: &TransportOrder, ctx: &DispatchContext<'_>) -> Vec<String> {
        order
            .dependencies
            .iter()
            .filter(|dep| {
                ctx.snapshot
                    .orders
                    .get(*dep)
                    .map(|d| d.state != OrderState::Finished)
                    .unwrap_or(true)
            })
            .map(|dep| format!("dependency {} not finished", dep))
            .collect()
    }
}

pub struct IsNotHeldByAnyVehicle;

impl SelectionFilter<TransportOrder> for IsNotHeldByAnyVehicle {
    fn name(&self) -> &'static str {
        "IsNotHeldByAnyVehicle"
    }

    fn apply(&self, order: &TransportOrder, ctx: &DispatchContext<'_>) -> Vec<String> {
        let holders = ctx.reservations.holders_of(&order.name);
        if holders.is_empty() {
            Vec::new()
        } else {
            vec![format!("reserved by {}", holders.join(", "))]
        }
    }
}

/// Orders of a sequence are processed strictly in sequence order.
pub struct IsNextInSequence;

impl SelectionFilter<TransportOrder> for IsNextInSequence {
    fn name(&self) -> &'static str {
        "IsNextInSequence"
    }

    fn apply(&self, order: &TransportOrder, ctx: &DispatchContext<'_>) -> Vec<String> {
        let Some(sequence_name) = order.wrapping_sequence.as_deref() else {
            return Vec::new();
        };
        match ctx.snapshot.sequences.get(sequence_name) {
            Some(sequence) if sequence.next_unfinished_order() == Some(order.name.as_str()) => Vec::new(),
            Some(sequence) => vec![format!("not next in sequence {}", sequence.name)],
            None => vec![format!("sequence {} unknown", sequence_name)],
        }
    }
}
