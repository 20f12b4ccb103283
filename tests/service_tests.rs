mod common;

use common::*;
use fleet_dispatch::application::DispatcherService;
use fleet_dispatch::common::{ApplicationError, ConfigurationError, DomainError};
use fleet_dispatch::config::DispatcherConfig;
use fleet_dispatch::domains::dispatching::ReroutingType;
use fleet_dispatch::domains::fleet::{ProcState, Vehicle};
use fleet_dispatch::domains::plant_model::{PlantEvent, PlantModelService};
use fleet_dispatch::domains::transport_order::OrderState;
use std::time::Duration;
use tokio::sync::mpsc;

fn start(plant: &TestPlant, events: mpsc::UnboundedReceiver<PlantEvent>) -> DispatcherService {
    DispatcherService::start(
        &test_config(),
        plant.service.clone(),
        plant.router.clone(),
        plant.controllers.clone(),
        events,
    )
    .unwrap()
}

/// Lets queued work and the events it causes settle until the check holds.
async fn eventually<F: Fn() -> bool>(service: &DispatcherService, check: F) -> bool {
    for _ in 0..100 {
        service.handle().flush().await.unwrap();
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_service_assigns_orders_as_they_arrive() {
    let (plant, events) = TestPlant::with_events(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    let service = start(&plant, events);

    plant
        .service
        .create_transport_order(order_to("T1", "Station-A", "LOAD"))
        .unwrap();
    assert!(eventually(&service, || plant.order("T1").state == OrderState::BeingProcessed).await);

    // The vehicle arrives; its driver reports the drive order done.
    plant.move_vehicle("V1", "p3");
    plant.finish_drive_order("V1");
    assert!(eventually(&service, || plant.order("T1").state == OrderState::Finished).await);
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_withdrawal_through_handle() {
    let (plant, events) = TestPlant::with_events(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    let service = start(&plant, events);
    plant
        .service
        .create_transport_order(order_to("T1", "Station-A", "LOAD"))
        .unwrap();
    assert!(eventually(&service, || plant.order("T1").state == OrderState::BeingProcessed).await);

    service.handle().withdraw_by_order("T1", true).unwrap();
    service.handle().flush().await.unwrap();

    assert_eq!(plant.order("T1").state, OrderState::Failed);
    assert_eq!(plant.vehicle("V1").transport_order, None);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_requests_for_unknown_objects_fail_synchronously() {
    let (plant, events) = TestPlant::with_events(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    let service = start(&plant, events);
    let handle = service.handle();

    assert!(matches!(
        handle.withdraw_by_order("T404", false),
        Err(ApplicationError::Domain(DomainError::ObjectUnknown { .. }))
    ));
    assert!(matches!(
        handle.withdraw_by_vehicle("V404", false),
        Err(ApplicationError::Domain(DomainError::ObjectUnknown { .. }))
    ));
    assert!(matches!(
        handle.reroute("V404", ReroutingType::Forced),
        Err(ApplicationError::Domain(DomainError::ObjectUnknown { .. }))
    ));
    assert!(handle.reroute("V1", ReroutingType::Regular).is_ok());

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_configuration_prevents_start() {
    let (plant, events) = TestPlant::with_events(line_model());
    let config = DispatcherConfig {
        vehicle_candidate_priorities: vec!["BY_LUCK".to_string()],
        ..test_config()
    };

    let result = DispatcherService::start(
        &config,
        plant.service.clone(),
        plant.router.clone(),
        plant.controllers.clone(),
        events,
    );

    assert!(matches!(
        result,
        Err(ApplicationError::Configuration(ConfigurationError::UnknownPriorityKey { .. }))
    ));
}

#[tokio::test]
async fn test_zero_routes_to_consider_is_rejected() {
    let (plant, events) = TestPlant::with_events(line_model());
    let config = DispatcherConfig {
        max_routes_to_consider: 0,
        ..test_config()
    };

    let result = DispatcherService::start(
        &config,
        plant.service.clone(),
        plant.router.clone(),
        plant.controllers.clone(),
        events,
    );

    assert!(matches!(
        result,
        Err(ApplicationError::Configuration(ConfigurationError::InvalidValue {
            field: "max_routes_to_consider",
            ..
        }))
    ));
}

#[tokio::test]
async fn test_handle_fails_after_shutdown() {
    let (plant, events) = TestPlant::with_events(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    let service = start(&plant, events);
    let handle = service.handle();

    service.shutdown().await.unwrap();

    assert!(matches!(handle.dispatch(), Err(ApplicationError::DispatcherUnavailable)));
    assert!(!handle.is_dispatch_pending());
    assert!(matches!(
        handle.flush().await,
        Err(ApplicationError::DispatcherUnavailable)
    ));
}
