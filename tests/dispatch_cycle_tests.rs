mod common;

use chrono::{Duration, Utc};
use common::*;
use fleet_dispatch::adapters::outbound::ControllerCommand;
use fleet_dispatch::config::DispatcherConfig;
use fleet_dispatch::domains::fleet::{ProcState, Vehicle};
use fleet_dispatch::domains::plant_model::{Location, PlantModelService, PointType};
use fleet_dispatch::domains::transport_order::{
    DriveOrder, DriveOrderState, OrderSequence, OrderState, TransportOrder,
};

fn with_charger_and_parking() -> fleet_dispatch::domains::plant_model::PlantModel {
    line_model()
        .with_location(Location::new("Charger-1", "Charger").with_link("p5"))
        .with_location(Location::new("Parking-1", "Parking").with_link("p1"))
}

fn in_sequence(order: TransportOrder, sequence: &str) -> TransportOrder {
    TransportOrder {
        wrapping_sequence: Some(sequence.to_string()),
        ..order
    }
}

#[test]
fn test_idle_vehicle_receives_active_order() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Station-A", "LOAD").with_state(OrderState::Active));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.state, OrderState::BeingProcessed);
    assert_eq!(order.processing_vehicle.as_deref(), Some("V1"));
    assert_eq!(order.current_drive_order, Some(0));
    assert_eq!(order.drive_orders[0].state, DriveOrderState::Travelling);
    assert_eq!(order.drive_orders[0].route.as_ref().unwrap().costs, 20);

    let vehicle = plant.vehicle("V1");
    assert_eq!(vehicle.proc_state, ProcState::ProcessingOrder);
    assert_eq!(vehicle.transport_order.as_deref(), Some("T1"));

    assert_eq!(
        plant.controllers.commands_for("V1"),
        vec![ControllerCommand::SetTransportOrder {
            order: "T1".to_string()
        }]
    );
}

#[test]
fn test_raw_order_is_activated_and_assigned_in_one_cycle() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Station-B", "UNLOAD"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::BeingProcessed);
}

#[test]
fn test_nearest_vehicle_wins_single_order() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_vehicle(Vehicle::idle_at("V2", "p4"));
    plant.add_order(order_to("T1", "Station-A", "LOAD"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    assert_eq!(plant.order("T1").processing_vehicle.as_deref(), Some("V2"));
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);
}

#[test]
fn test_vehicle_takes_order_with_earliest_deadline() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(
        order_to("T1", "Station-A", "LOAD").with_deadline(Utc::now() + Duration::hours(2)),
    );
    plant.add_order(
        order_to("T2", "Station-B", "LOAD").with_deadline(Utc::now() + Duration::hours(1)),
    );

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    assert_eq!(plant.vehicle("V1").transport_order.as_deref(), Some("T2"));
    assert_eq!(plant.order("T1").state, OrderState::Dispatchable);
}

#[test]
fn test_each_order_assigned_to_at_most_one_vehicle() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_vehicle(Vehicle::idle_at("V2", "p2"));
    plant.add_vehicle(Vehicle::idle_at("V3", "p6"));
    plant.add_order(order_to("T1", "Station-A", "LOAD"));
    plant.add_order(order_to("T2", "Station-B", "UNLOAD"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    let t1 = plant.order("T1");
    let t2 = plant.order("T2");
    assert_eq!(t1.state, OrderState::BeingProcessed);
    assert_eq!(t2.state, OrderState::BeingProcessed);
    assert_ne!(t1.processing_vehicle, t2.processing_vehicle);

    let busy = plant
        .service
        .vehicles()
        .into_iter()
        .filter(|v| v.transport_order.is_some())
        .count();
    assert_eq!(busy, 2);
    assert!(cycle.reservations().is_empty());
}

#[test]
fn test_second_cycle_without_changes_does_nothing() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Station-A", "LOAD"));
    plant.add_order(order_to("T2", "Station-B", "LOAD"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();
    let orders_after_first = plant.service.transport_orders();
    let commands_after_first = plant.controllers.commands();

    cycle.run();

    assert_eq!(plant.service.transport_orders().len(), orders_after_first.len());
    for order in orders_after_first {
        assert_eq!(plant.order(&order.name).state, order.state);
    }
    assert_eq!(plant.controllers.commands(), commands_after_first);
    assert!(cycle.reservations().is_empty());
}

#[test]
fn test_paused_vehicle_is_left_alone() {
    let plant = TestPlant::new(with_charger_and_parking());
    plant.add_vehicle(Vehicle {
        paused: true,
        ..Vehicle::idle_at("V1", "p3").with_energy_level(50)
    });
    plant.add_order(order_to("T1", "Station-A", "LOAD"));

    let config = DispatcherConfig {
        park_idle_vehicles: true,
        ..test_config()
    };
    let mut cycle = plant.cycle(&config);
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::Dispatchable);
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);
    assert!(plant.orders_named("Recharge-").is_empty());
    assert!(plant.orders_named("Park-").is_empty());
    assert!(plant.controllers.commands().is_empty());
}

#[test]
fn test_vehicle_paused_between_cycles_gets_no_further_orders() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Station-A", "LOAD"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();
    assert_eq!(plant.order("T1").state, OrderState::BeingProcessed);

    plant.finish_drive_order("V1");
    plant.service.update_vehicle("V1", |v| v.paused = true).unwrap();
    plant.add_order(order_to("T2", "Station-B", "LOAD"));
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::Finished);
    assert_eq!(plant.order("T2").state, OrderState::Dispatchable);
    assert_eq!(plant.vehicle("V1").transport_order, None);
}

#[test]
fn test_order_for_intended_vehicle_skips_closer_vehicle() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p3"));
    plant.add_vehicle(Vehicle::idle_at("V2", "p1"));
    plant.add_order(order_to("T1", "Station-A", "LOAD").with_intended_vehicle("V2"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.processing_vehicle.as_deref(), Some("V2"));
    assert!(order
        .rejections
        .iter()
        .any(|r| r.vehicle == "V1" && r.reason == "intended for V2"));
}

#[test]
fn test_repeated_rejection_is_recorded_once() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Station-A", "LOAD"));
    plant.controllers.refuse_operation("V1", "LOAD");

    let mut cycle = plant.cycle(&test_config());
    cycle.run();
    cycle.run();
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.state, OrderState::Dispatchable);
    assert_eq!(order.rejections.len(), 1);
    assert_eq!(order.rejections[0].vehicle, "V1");
    assert_eq!(order.rejections[0].reason, "operation LOAD not supported");
}

#[test]
fn test_vehicle_not_accepting_order_type_is_rejected() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1").with_acceptable_order_types(&[("Tow", 1)]));
    plant.add_order(order_to("T1", "Station-A", "LOAD").with_order_type("Transport"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.state, OrderState::Dispatchable);
    assert_eq!(order.rejections[0].reason, "order type Transport not accepted");
}

#[test]
fn test_unroutable_order_stays_dispatchable() {
    let model = line_model()
        .with_point("island", PointType::HaltPosition)
        .with_location(Location::new("Remote", "Station").with_link("island"));
    let plant = TestPlant::new(model);
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Remote", "LOAD"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.state, OrderState::Dispatchable);
    assert!(order.rejections.is_empty());
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);
}

#[test]
fn test_order_with_invalid_destination_fails() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Nowhere", "LOAD"));
    plant.add_order(order_to("T2", "Station-A", "CHARGE"));
    plant.add_order(TransportOrder::new("T3", Vec::new()));
    plant.add_order(order_to("T4", "Station-A", "LOAD").with_intended_vehicle("V9"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    for name in ["T1", "T2", "T3", "T4"] {
        let order = plant.order(name);
        assert_eq!(order.state, OrderState::Failed, "{}", name);
        assert!(order.finished_time.is_some());
    }
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);
}

#[test]
fn test_order_waits_for_dependencies() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Station-A", "LOAD"));
    plant.add_order(order_to("T2", "Station-B", "UNLOAD").with_dependency("T1"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::BeingProcessed);
    assert_eq!(plant.order("T2").state, OrderState::Active);

    plant.finish_drive_order("V1");
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::Finished);
    assert_eq!(plant.order("T2").state, OrderState::BeingProcessed);
    assert_eq!(plant.vehicle("V1").transport_order.as_deref(), Some("T2"));
}

#[test]
fn test_order_with_unknown_dependency_is_never_dispatched() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Station-A", "LOAD").with_dependency("T0"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::Active);
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);
}

#[test]
fn test_drive_orders_are_handed_out_one_after_another() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(TransportOrder::new(
        "T1",
        vec![
            DriveOrder::new("Station-A", "LOAD"),
            DriveOrder::new("Station-B", "UNLOAD"),
        ],
    ));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.drive_orders[0].route.as_ref().unwrap().costs, 20);
    assert_eq!(order.drive_orders[1].route.as_ref().unwrap().costs, 30);
    assert_eq!(order.drive_orders[1].state, DriveOrderState::Pristine);

    plant.finish_drive_order("V1");
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.state, OrderState::BeingProcessed);
    assert_eq!(order.current_drive_order, Some(1));
    assert_eq!(order.drive_orders[0].state, DriveOrderState::Finished);
    assert_eq!(order.drive_orders[1].state, DriveOrderState::Travelling);
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::ProcessingOrder);
    assert_eq!(
        plant.controllers.commands_for("V1").last(),
        Some(&ControllerCommand::UpdateTransportOrder {
            order: "T1".to_string()
        })
    );

    plant.finish_drive_order("V1");
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.state, OrderState::Finished);
    assert!(order.finished_time.is_some());
    let vehicle = plant.vehicle("V1");
    assert_eq!(vehicle.proc_state, ProcState::Idle);
    assert_eq!(vehicle.transport_order, None);
}

#[test]
fn test_idle_vehicle_with_low_energy_is_sent_to_recharge() {
    let plant = TestPlant::new(with_charger_and_parking());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1").with_energy_level(50));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    let orders = plant.orders_named("Recharge-");
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.state, OrderState::BeingProcessed);
    assert!(order.dispensable);
    assert_eq!(order.intended_vehicle.as_deref(), Some("V1"));
    assert_eq!(order.drive_orders[0].destination.location, "Charger-1");
    assert_eq!(order.drive_orders[0].destination.operation, "CHARGE");
    assert_eq!(plant.vehicle("V1").transport_order.as_ref(), Some(&order.name));
}

#[test]
fn test_critical_vehicle_recharges_instead_of_taking_orders() {
    let plant = TestPlant::new(with_charger_and_parking());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1").with_energy_level(20));
    plant.add_order(order_to("T1", "Station-A", "LOAD"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::Dispatchable);
    assert_eq!(plant.orders_named("Recharge-").len(), 1);
}

#[test]
fn test_charged_vehicle_is_not_sent_to_recharge() {
    let plant = TestPlant::new(with_charger_and_parking());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    assert!(plant.orders_named("Recharge-").is_empty());
}

#[test]
fn test_recharge_waits_for_idle_delay() {
    let plant = TestPlant::new(with_charger_and_parking());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1").with_energy_level(50));

    let config = DispatcherConfig {
        recharge_idle_delay_ms: 60_000,
        ..test_config()
    };
    let mut cycle = plant.cycle(&config);
    cycle.run();

    assert!(plant.orders_named("Recharge-").is_empty());
}

#[test]
fn test_recharge_disabled_by_configuration() {
    let plant = TestPlant::new(with_charger_and_parking());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1").with_energy_level(50));

    let config = DispatcherConfig {
        recharge_idle_vehicles: false,
        ..test_config()
    };
    let mut cycle = plant.cycle(&config);
    cycle.run();

    assert!(plant.orders_named("Recharge-").is_empty());
}

#[test]
fn test_idle_vehicle_is_parked() {
    let plant = TestPlant::new(with_charger_and_parking());
    plant.add_vehicle(Vehicle::idle_at("V1", "p4"));

    let config = DispatcherConfig {
        park_idle_vehicles: true,
        ..test_config()
    };
    let mut cycle = plant.cycle(&config);
    cycle.run();

    let orders = plant.orders_named("Park-");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].drive_orders[0].destination.location, "Parking-1");
    assert_eq!(orders[0].drive_orders[0].destination.operation, "PARK");
    assert_eq!(orders[0].drive_orders[0].route.as_ref().unwrap().costs, 30);
    assert_eq!(orders[0].state, OrderState::BeingProcessed);
}

#[test]
fn test_parked_vehicle_stays_put() {
    let plant = TestPlant::new(with_charger_and_parking());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));

    let config = DispatcherConfig {
        park_idle_vehicles: true,
        ..test_config()
    };
    let mut cycle = plant.cycle(&config);
    cycle.run();

    assert!(plant.orders_named("Park-").is_empty());
}

#[test]
fn test_vehicle_refusing_to_park_leaves_no_orders() {
    let (plant, mut events) = TestPlant::with_events(with_charger_and_parking());
    plant.add_vehicle(Vehicle::idle_at("V1", "p4"));
    plant.controllers.refuse_operation("V1", "PARK");

    let config = DispatcherConfig {
        park_idle_vehicles: true,
        ..test_config()
    };
    let mut cycle = plant.cycle(&config);
    for _ in 0..5 {
        cycle.run();
    }

    assert!(plant.orders_named("Park-").is_empty());
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);
    assert!(plant.controllers.commands().is_empty());
    // Nothing changed in the plant, so nothing asks for another cycle.
    assert!(events.try_recv().is_err());
}

#[test]
fn test_failed_handover_leaves_order_and_vehicle_untouched() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_order(order_to("T1", "Station-A", "LOAD"));
    plant.controllers.disconnect("V1");

    let mut cycle = plant.cycle(&test_config());
    cycle.run();
    cycle.run();

    let order = plant.order("T1");
    assert_eq!(order.state, OrderState::Dispatchable);
    assert_eq!(order.processing_vehicle, None);
    assert_eq!(order.current_drive_order, None);
    let vehicle = plant.vehicle("V1");
    assert_eq!(vehicle.proc_state, ProcState::Idle);
    assert_eq!(vehicle.transport_order, None);
    assert!(cycle.reservations().is_empty());

    plant.controllers.reconnect("V1");
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::BeingProcessed);
    assert_eq!(plant.vehicle("V1").transport_order.as_deref(), Some("T1"));
}

#[test]
fn test_dispensable_order_is_given_up_for_real_work() {
    let model = line_model().with_location(Location::new("Parking-1", "Parking").with_link("p6"));
    let plant = TestPlant::new(model);
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));

    let config = DispatcherConfig {
        park_idle_vehicles: true,
        ..test_config()
    };
    let mut cycle = plant.cycle(&config);
    cycle.run();

    let park_order = plant.orders_named("Park-").remove(0).name;
    assert_eq!(plant.vehicle("V1").transport_order.as_ref(), Some(&park_order));

    plant.add_order(order_to("T1", "Station-A", "LOAD"));
    cycle.run();

    assert_eq!(plant.order(&park_order).state, OrderState::Withdrawn);
    assert_eq!(plant.order("T1").state, OrderState::Dispatchable);
    assert_eq!(cycle.reservations().held_by("V1"), vec!["T1".to_string()]);
    assert!(plant
        .controllers
        .commands_for("V1")
        .contains(&ControllerCommand::AbortTransportOrder { immediate: false }));

    // The vehicle reports it has stopped.
    plant.finish_drive_order("V1");
    cycle.run();

    assert_eq!(plant.order(&park_order).state, OrderState::Failed);
    let order = plant.order("T1");
    assert_eq!(order.state, OrderState::BeingProcessed);
    assert_eq!(order.processing_vehicle.as_deref(), Some("V1"));
    assert!(cycle.reservations().is_empty());
}

#[test]
fn test_busy_vehicle_does_not_swap_dispensable_orders() {
    let model = line_model().with_location(Location::new("Parking-1", "Parking").with_link("p6"));
    let plant = TestPlant::new(model);
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));

    let config = DispatcherConfig {
        park_idle_vehicles: true,
        ..test_config()
    };
    let mut cycle = plant.cycle(&config);
    cycle.run();

    plant.add_order(order_to("T1", "Station-A", "LOAD").dispensable());
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::Dispatchable);
    let park_order = plant.orders_named("Park-").remove(0);
    assert_eq!(park_order.state, OrderState::BeingProcessed);
    assert!(cycle.reservations().is_empty());
}

#[test]
fn test_order_sequence_is_processed_by_one_vehicle() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.add_vehicle(Vehicle::idle_at("V2", "p4"));
    plant
        .service
        .add_order_sequence(OrderSequence::new("S1", &["T1", "T2"]).completed());
    plant.add_order(in_sequence(order_to("T1", "Station-A", "LOAD"), "S1"));
    plant.add_order(in_sequence(order_to("T2", "Station-B", "UNLOAD"), "S1"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    assert_eq!(plant.order("T1").processing_vehicle.as_deref(), Some("V2"));
    assert_eq!(plant.order("T2").state, OrderState::Dispatchable);
    assert_eq!(plant.vehicle("V2").order_sequence.as_deref(), Some("S1"));
    assert_eq!(
        plant.service.order_sequence("S1").unwrap().processing_vehicle.as_deref(),
        Some("V2")
    );

    plant.finish_drive_order("V2");
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::Finished);
    assert_eq!(plant.order("T2").processing_vehicle.as_deref(), Some("V2"));
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);

    plant.finish_drive_order("V2");
    cycle.run();

    let sequence = plant.service.order_sequence("S1").unwrap();
    assert!(sequence.finished);
    assert_eq!(sequence.finished_index, Some(1));
    assert_eq!(plant.vehicle("V2").order_sequence, None);
}

#[test]
fn test_failure_fatal_sequence_fails_following_orders() {
    let plant = TestPlant::new(line_model());
    plant.add_vehicle(Vehicle::idle_at("V1", "p1"));
    plant.service.add_order_sequence(
        OrderSequence::new("S1", &["T1", "T2"])
            .completed()
            .failure_fatal(),
    );
    plant.add_order(in_sequence(order_to("T1", "Nowhere", "LOAD"), "S1"));
    plant.add_order(in_sequence(order_to("T2", "Station-B", "UNLOAD"), "S1"));

    let mut cycle = plant.cycle(&test_config());
    cycle.run();

    assert_eq!(plant.order("T1").state, OrderState::Failed);
    assert_eq!(plant.order("T2").state, OrderState::Failed);
    assert!(plant.service.order_sequence("S1").unwrap().finished);
    assert_eq!(plant.vehicle("V1").proc_state, ProcState::Idle);
}
