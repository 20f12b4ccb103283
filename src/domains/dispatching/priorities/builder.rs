use super::comparators::*;
use super::{PriorityChain, PriorityComparator};
use crate::common::ConfigurationError;
use crate::config::DispatcherConfig;
use crate::domains::dispatching::AssignmentCandidate;
use crate::domains::fleet::Vehicle;
use crate::domains::transport_order::TransportOrder;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub type ComparatorFactory<T> = fn(&DispatcherConfig) -> Box<dyn PriorityComparator<T>>;

fn boxed<T, C: PriorityComparator<T> + 'static>(comparator: C) -> Box<dyn PriorityComparator<T>> {
    Box::new(comparator)
}

/// Maps configuration keys to comparator factories for one chain.
pub struct ComparatorRegistry<T> {
    chain: &'static str,
    factories: BTreeMap<&'static str, ComparatorFactory<T>>,
    tie_breakers: Vec<ComparatorFactory<T>>,
}

impl<T: 'static> ComparatorRegistry<T> {
    pub fn new(chain: &'static str) -> Self {
        Self {
            chain,
            factories: BTreeMap::new(),
            tie_breakers: Vec::new(),
        }
    }

    pub fn register(mut self, key: &'static str, factory: ComparatorFactory<T>) -> Self {
        self.factories.insert(key, factory);
        self
    }

    /// Appends a tie-breaker applied after every configured key.
    pub fn tie_breaker(mut self, factory: ComparatorFactory<T>) -> Self {
        self.tie_breakers.push(factory);
        self
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Builds a chain ranking by `keys` in order of precedence, then by the tie-breakers.
    pub fn build(&self, keys: &[String], config: &DispatcherConfig) -> Result<PriorityChain<T>, ConfigurationError> {
        let mut seen = BTreeSet::new();
        for key in keys {
            if !seen.insert(key.as_str()) {
                return Err(ConfigurationError::DuplicatePriorityKey {
                    chain: self.chain,
                    key: key.clone(),
                });
            }
        }

        let mut segments: Vec<Box<dyn PriorityComparator<T>>> =
            self.tie_breakers.iter().map(|factory| factory(config)).collect();
        for key in keys.iter().rev() {
            let factory = self.factories.get(key.as_str()).ok_or_else(|| {
                ConfigurationError::UnknownPriorityKey {
                    chain: self.chain,
                    key: key.clone(),
                }
            })?;
            segments.insert(0, factory(config));
        }

        let chain = PriorityChain::new(segments);
        debug!(chain = self.chain, keys = ?chain.keys(), "Built priority chain");
        Ok(chain)
    }
}

pub fn vehicle_registry() -> ComparatorRegistry<Vehicle> {
    ComparatorRegistry::<Vehicle>::new("vehicle_priorities")
        .register(IDLE_FIRST, |_| boxed(IdleFirst))
        .register(BY_ENERGY_LEVEL, |_| boxed(ByEnergyLevel))
        .register(BY_NAME, |_| boxed(ByVehicleName))
        .tie_breaker(|_| boxed(ByEnergyLevel))
        .tie_breaker(|_| boxed(ByVehicleName))
}

pub fn order_registry() -> ComparatorRegistry<TransportOrder> {
    ComparatorRegistry::<TransportOrder>::new("order_priorities")
        .register(BY_AGE, |_| boxed(ByAge))
        .register(BY_DEADLINE, |_| boxed(ByDeadline))
        .register(DEADLINE_AT_RISK_FIRST, |config| {
            boxed(DeadlineAtRiskFirst::new(config.deadline_at_risk_period()))
        })
        .register(BY_NAME, |_| boxed(ByOrderName))
        .tie_breaker(|_| boxed(ByAge))
        .tie_breaker(|_| boxed(ByOrderName))
}

fn candidate_registry(chain: &'static str) -> ComparatorRegistry<AssignmentCandidate> {
    ComparatorRegistry::<AssignmentCandidate>::new(chain)
        .register(IDLE_FIRST, |_| boxed(ByVehicle(IdleFirst)))
        .register(BY_ENERGY_LEVEL, |_| boxed(ByVehicle(ByEnergyLevel)))
        .register(BY_AGE, |_| boxed(ByOrder(ByAge)))
        .register(BY_DEADLINE, |_| boxed(ByOrder(ByDeadline)))
        .register(DEADLINE_AT_RISK_FIRST, |config| {
            boxed(ByOrder(DeadlineAtRiskFirst::new(config.deadline_at_risk_period())))
        })
        .register(BY_COMPLETE_ROUTING_COSTS, |_| boxed(ByCompleteRoutingCosts))
        .register(BY_INITIAL_ROUTING_COSTS, |_| boxed(ByInitialRoutingCosts))
        .register(BY_ORDER_TYPE_PRIORITY, |_| boxed(ByOrderTypePriority))
}

/// Ranks the candidates of one order, i.e. the vehicles competing for it.
pub fn vehicle_candidate_registry() -> ComparatorRegistry<AssignmentCandidate> {
    candidate_registry("vehicle_candidate_priorities")
        .tie_breaker(|_| boxed(ByVehicle(ByEnergyLevel)))
        .tie_breaker(|_| boxed(ByVehicle(ByVehicleName)))
}

/// Ranks the candidates of one vehicle, i.e. the orders competing for it.
pub fn order_candidate_registry() -> ComparatorRegistry<AssignmentCandidate> {
    candidate_registry("order_candidate_priorities")
        .tie_breaker(|_| boxed(ByOrder(ByAge)))
        .tie_breaker(|_| boxed(ByOrder(ByOrderName)))
}

/// The four ranking chains of the dispatcher.
pub struct PriorityChains {
    pub vehicles: PriorityChain<Vehicle>,
    pub orders: PriorityChain<TransportOrder>,
    pub vehicle_candidates: PriorityChain<AssignmentCandidate>,
    pub order_candidates: PriorityChain<AssignmentCandidate>,
}

pub struct PriorityComparatorBuilder<'a> {
    config: &'a DispatcherConfig,
}

impl<'a> PriorityComparatorBuilder<'a> {
    pub fn new(config: &'a DispatcherConfig) -> Self {
        Self { config }
    }

    /// Fails on the first unknown or duplicate key of any chain.
    pub fn build(&self) -> Result<PriorityChains, ConfigurationError> {
        let config = self.config;
        Ok(PriorityChains {
            vehicles: vehicle_registry().build(&config.vehicle_priorities, config)?,
            orders: order_registry().build(&config.order_priorities, config)?,
            vehicle_candidates: vehicle_candidate_registry()
                .build(&config.vehicle_candidate_priorities, config)?,
            order_candidates: order_candidate_registry()
                .build(&config.order_candidate_priorities, config)?,
        })
    }
}
