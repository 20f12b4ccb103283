//! Selection filters decide whether vehicles, orders and candidates take part in dispatching.
//!
//! A filter returns the reasons for rejecting its subject; no reasons means
//! the subject is accepted. New rules are added by registering another filter
//! in [`FilterChains::standard`], never by editing an existing one.

pub mod candidate;
pub mod housekeeping;
pub mod order;
pub mod vehicle;

use crate::config::DispatcherConfig;
use crate::domains::dispatching::{AssignmentCandidate, DispatchContext};
use crate::domains::fleet::{Vehicle, VehicleControllerPool};
use crate::domains::transport_order::TransportOrder;
use std::sync::Arc;

pub trait SelectionFilter<T>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reasons for rejecting the subject, empty if it is accepted.
    fn apply(&self, subject: &T, ctx: &DispatchContext<'_>) -> Vec<String>;
}

/// All registered filters for one kind of subject. Every member is evaluated.
pub struct CompositeFilter<T> {
    filters: Vec<Box<dyn SelectionFilter<T>>>,
}

impl<T> CompositeFilter<T> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn with_filter<F: SelectionFilter<T> + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn register(&mut self, filter: Box<dyn SelectionFilter<T>>) {
        self.filters.push(filter);
    }

    pub fn apply(&self, subject: &T, ctx: &DispatchContext<'_>) -> Vec<String> {
        self.filters
            .iter()
            .flat_map(|f| f.apply(subject, ctx))
            .collect()
    }

    pub fn accepts(&self, subject: &T, ctx: &DispatchContext<'_>) -> bool {
        self.apply(subject, ctx).is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<T> Default for CompositeFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The filter chains the dispatch cycle consults.
pub struct FilterChains {
    pub vehicles: CompositeFilter<Vehicle>,
    pub orders: CompositeFilter<TransportOrder>,
    pub candidates: CompositeFilter<AssignmentCandidate>,
    pub park: CompositeFilter<Vehicle>,
    pub recharge: CompositeFilter<Vehicle>,
    pub repark: CompositeFilter<Vehicle>,
}

impl FilterChains {
    /// The complete registration list.
    pub fn standard(config: &DispatcherConfig, controllers: Arc<dyn VehicleControllerPool>) -> Self {
        use housekeeping::*;
        use vehicle::*;

        let vehicles = CompositeFilter::new()
            .with_filter(IsUtilizable)
            .with_filter(IsNotPaused)
            .with_filter(HasKnownPosition)
            .with_filter(IsOperational)
            .with_filter(IsFreeForOrder)
            .with_filter(HasNoHeldReservation)
            .with_filter(IsSufficientlyCharged);

        let orders = CompositeFilter::new()
            .with_filter(order::IsDispatchable)
            .with_filter(order::DependenciesFinished)
            .with_filter(order::IsNotHeldByAnyVehicle)
            .with_filter(order::IsNextInSequence);

        let candidates = CompositeFilter::new()
            .with_filter(candidate::CanProcess::new(controllers))
            .with_filter(candidate::AcceptsOrderType)
            .with_filter(candidate::IntendedVehicleMatches)
            .with_filter(candidate::SequenceVehicleMatches);

        let park = CompositeFilter::new()
            .with_filter(IsUtilizable)
            .with_filter(IsNotPaused)
            .with_filter(HasKnownPosition)
            .with_filter(IsIdle)
            .with_filter(HasNoOrderSequence)
            .with_filter(HasNoHeldReservation)
            .with_filter(IsNotParked::new(&config.park_operation));

        let recharge = CompositeFilter::new()
            .with_filter(IsUtilizable)
            .with_filter(IsNotPaused)
            .with_filter(HasKnownPosition)
            .with_filter(IsIdle)
            .with_filter(HasNoOrderSequence)
            .with_filter(HasNoHeldReservation)
            .with_filter(NeedsRecharge)
            .with_filter(IdleLongEnough::new(config.recharge_idle_delay()));

        let repark = CompositeFilter::new()
            .with_filter(IsUtilizable)
            .with_filter(IsNotPaused)
            .with_filter(HasKnownPosition)
            .with_filter(IsIdle)
            .with_filter(HasNoOrderSequence)
            .with_filter(HasNoHeldReservation)
            .with_filter(ParkedBelowTopPriority::new(&config.park_operation));

        Self {
            vehicles,
            orders,
            candidates,
            park,
            recharge,
            repark,
        }
    }
}
