use crate::common::ConfigurationError;
use crate::config::DispatcherConfig;
use crate::domains::dispatching::filters::FilterChains;
use crate::domains::dispatching::priorities::PriorityComparatorBuilder;
use crate::domains::dispatching::{CandidateEvaluator, DispatchCycle, PositionSupplier};
use crate::domains::fleet::VehicleControllerPool;
use crate::domains::plant_model::{PlantModelService, Router};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Assembles filters, priority chains, evaluator and position supplier into a dispatch cycle.
///
/// All configuration problems surface here, before the first cycle runs.
pub fn build_dispatch_cycle(
    config: &DispatcherConfig,
    plant: Arc<dyn PlantModelService>,
    router: Arc<dyn Router>,
    controllers: Arc<dyn VehicleControllerPool>,
) -> Result<DispatchCycle, ConfigurationError> {
    config.validate()?;
    let priorities = PriorityComparatorBuilder::new(config).build()?;
    let filters = FilterChains::standard(config, controllers.clone());

    let evaluator = CandidateEvaluator::new(
        router.clone(),
        config.max_routes_to_consider,
        config.avoid_resources_allocated_by_others,
    );

    let mut operations: BTreeSet<String> = plant
        .vehicles()
        .into_iter()
        .map(|v| v.recharge_operation)
        .collect();
    operations.insert(config.park_operation.clone());
    let operations: Vec<String> = operations.into_iter().collect();

    let mut supplier = PositionSupplier::new(router, config.avoid_resources_allocated_by_others);
    supplier.initialize(&plant.plant_model(), &operations);

    info!(
        vehicle_priorities = ?priorities.vehicles.keys(),
        order_priorities = ?priorities.orders.keys(),
        ?operations,
        "Dispatcher configured"
    );

    Ok(DispatchCycle::new(
        config.clone(),
        plant,
        controllers,
        evaluator,
        supplier,
        filters,
        priorities,
    ))
}
