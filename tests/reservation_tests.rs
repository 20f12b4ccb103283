use fleet_dispatch::domains::dispatching::OrderReservationPool;
use std::collections::BTreeSet;

#[test]
fn test_reserve_and_find() {
    let mut pool = OrderReservationPool::new();
    pool.reserve("T2", "V1");
    pool.reserve("T1", "V1");
    pool.reserve("T1", "V2");

    assert!(pool.is_reserved("T1"));
    assert!(!pool.is_reserved("T3"));
    assert_eq!(pool.find_reservations("V1"), vec!["T1".to_string(), "T2".to_string()]);
    assert_eq!(
        pool.reserved_by("T1"),
        BTreeSet::from(["V1".to_string(), "V2".to_string()])
    );
}

#[test]
fn test_release_single_reservation() {
    let mut pool = OrderReservationPool::new();
    pool.reserve("T1", "V1");
    pool.reserve("T1", "V2");

    pool.release("T1", "V1");
    assert_eq!(pool.reserved_by("T1"), BTreeSet::from(["V2".to_string()]));

    pool.release("T1", "V2");
    assert!(!pool.is_reserved("T1"));
    assert!(pool.is_empty());
}

#[test]
fn test_release_order_and_vehicle() {
    let mut pool = OrderReservationPool::new();
    pool.reserve("T1", "V1");
    pool.hold("T1", "V2");
    pool.reserve("T2", "V1");

    pool.release_order("T1");
    assert!(!pool.is_reserved("T1"));
    assert!(!pool.is_held("T1"));
    assert!(pool.held_by("V2").is_empty());

    pool.release_vehicle("V1");
    assert!(pool.is_empty());
}

#[test]
fn test_tentative_reservations_do_not_survive_the_cycle() {
    let mut pool = OrderReservationPool::new();
    pool.reserve("T1", "V1");
    pool.reserve("T2", "V2");
    pool.hold("T2", "V3");

    pool.release_tentative();

    assert!(!pool.is_reserved("T1"));
    assert_eq!(pool.reserved_by("T2"), BTreeSet::from(["V3".to_string()]));
    assert_eq!(pool.held_by("V3"), vec!["T2".to_string()]);
    assert!(pool.find_reservations("V2").is_empty());
}

#[test]
fn test_releasing_held_reservation_clears_hold() {
    let mut pool = OrderReservationPool::new();
    pool.hold("T1", "V1");
    assert!(pool.is_held("T1"));

    pool.release("T1", "V1");

    assert!(!pool.is_held("T1"));
    pool.release_tentative();
    assert!(pool.is_empty());
}

#[test]
fn test_releasing_unknown_reservation_is_harmless() {
    let mut pool = OrderReservationPool::new();
    pool.release("T1", "V1");
    pool.release_order("T1");
    pool.release_vehicle("V1");

    assert!(pool.is_empty());
}

#[test]
fn test_holders_exclude_tentative_reservations() {
    let mut pool = OrderReservationPool::new();
    pool.reserve("T1", "V1");
    pool.hold("T1", "V2");

    assert_eq!(pool.holders_of("T1"), vec!["V2".to_string()]);
    assert!(pool.holders_of("T2").is_empty());
}
