//! Tests for the backward charging-slot search.

use chrono::{DateTime, Duration, Utc};
use fleet_engine::charging::snap_to_grid;
use fleet_engine::{
    Availability, EngineConfig, InMemoryRepository, NewChargingReservation,
    NewDrivingReservation, Priority, ReservationRepository, SlotSearch, Vehicle, VehicleId,
};

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn vehicle() -> Vehicle {
    Vehicle {
        id: VehicleId(1),
        name: "Zoe".to_string(),
        summer_range: 300,
        winter_range: 200,
        charging_duration: 4,
        members: vec!["alice".to_string()],
    }
}

fn repo() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.insert_vehicle(vehicle()).unwrap();
    repo
}

fn drive(start: &str, end: &str, distance: u32) -> NewDrivingReservation {
    NewDrivingReservation {
        vehicle_id: VehicleId(1),
        owner: "alice".to_string(),
        description: String::new(),
        location: String::new(),
        start_time: at(start),
        end_time: at(end),
        distance,
        priority: Priority::Medium,
        must_fully_charge: false,
    }
}

#[test]
fn snap_rounds_down_to_half_hour() {
    assert_eq!(snap_to_grid(at("2026-07-01T11:47:12Z"), 30), at("2026-07-01T11:30:00Z"));
    assert_eq!(snap_to_grid(at("2026-07-01T11:30:00Z"), 30), at("2026-07-01T11:30:00Z"));
    assert_eq!(snap_to_grid(at("2026-07-01T11:29:59Z"), 30), at("2026-07-01T11:00:00Z"));
    assert_eq!(snap_to_grid(at("2026-07-01T11:00:00Z"), 30), at("2026-07-01T11:00:00Z"));
}

#[test]
fn no_charge_needed_when_battery_full() {
    let repo = repo();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let result = a
        .search_charging_slot(&vehicle(), at("2026-07-01T12:00:00Z"), None)
        .unwrap();
    assert_eq!(result, SlotSearch::NotNeeded);
    assert_eq!(
        a.find_charging_slot(&vehicle(), at("2026-07-01T12:00:00Z"), None).unwrap(),
        None
    );
}

#[test]
fn finds_window_ending_before_blocking_trip() {
    // 250 km at 10:00-11:00 leaves 50 km at noon. Windows ending after 10:00
    // overlap the trip; [06:00, 10:00) is the first free one.
    let repo = repo();
    repo.create_driving_reservation(drive("2026-07-01T10:00:00Z", "2026-07-01T11:00:00Z", 250))
        .unwrap();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let slot = a
        .find_charging_slot(&vehicle(), at("2026-07-01T12:00:00Z"), None)
        .unwrap();
    assert_eq!(slot, Some(at("2026-07-01T05:30:00Z")));

    let recommended = slot.unwrap();
    assert!(recommended + vehicle().charging_duration() <= at("2026-07-01T10:00:00Z"));
}

#[test]
fn first_window_is_anchored_on_half_hour_grid() {
    let repo = repo();
    repo.create_driving_reservation(drive("2026-07-01T02:00:00Z", "2026-07-01T03:00:00Z", 100))
        .unwrap();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);
    let v = vehicle();

    // 12:47 anchors at 12:30: window [08:30, 12:30), recommended 08:00.
    assert_eq!(
        a.find_charging_slot(&v, at("2026-07-01T12:47:00Z"), None).unwrap(),
        Some(at("2026-07-01T08:00:00Z"))
    );
    // 12:10 anchors at 12:00: window [08:00, 12:00), recommended 07:30.
    assert_eq!(
        a.find_charging_slot(&v, at("2026-07-01T12:10:00Z"), None).unwrap(),
        Some(at("2026-07-01T07:30:00Z"))
    );
}

#[test]
fn search_stops_at_last_full_charge() {
    let repo = repo();
    repo.create_charging_reservation(NewChargingReservation {
        vehicle_id: VehicleId(1),
        start_time: at("2026-07-01T04:00:00Z"),
        end_time: at("2026-07-01T08:00:00Z"),
    })
    .unwrap();
    repo.create_driving_reservation(drive("2026-07-01T09:00:00Z", "2026-07-01T11:00:00Z", 250))
        .unwrap();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    // The first candidate window would start at 08:00, which is not after the
    // last full charge.
    let result = a
        .search_charging_slot(&vehicle(), at("2026-07-01T12:00:00Z"), None)
        .unwrap();
    assert_eq!(result, SlotSearch::Exhausted);
    assert_eq!(result.found(), None);
}

#[test]
fn search_stops_at_horizon() {
    let repo = repo();
    repo.create_driving_reservation(drive("2026-06-28T00:00:00Z", "2026-07-01T11:00:00Z", 50))
        .unwrap();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let result = a
        .search_charging_slot(&vehicle(), at("2026-07-01T12:00:00Z"), None)
        .unwrap();
    assert_eq!(result, SlotSearch::Exhausted);
}

#[test]
fn wider_horizon_reaches_further_back() {
    let repo = repo();
    repo.create_driving_reservation(drive("2026-06-28T00:00:00Z", "2026-07-01T11:00:00Z", 50))
        .unwrap();
    let mut config = EngineConfig::default();
    config.slot_search.horizon_hours = 24 * 7;
    let a = Availability::new(&repo, &config);

    let slot = a
        .find_charging_slot(&vehicle(), at("2026-07-01T12:00:00Z"), None)
        .unwrap();
    assert_eq!(slot, Some(at("2026-06-27T19:30:00Z")));
}

#[test]
fn excluded_reservation_does_not_block_window() {
    let repo = repo();
    let stored = repo
        .create_driving_reservation(drive("2026-07-01T10:00:00Z", "2026-07-01T11:00:00Z", 250))
        .unwrap();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let slot = a
        .find_charging_slot(&vehicle(), at("2026-07-01T12:00:00Z"), Some(stored.id))
        .unwrap();
    assert_eq!(slot, Some(at("2026-07-01T07:30:00Z")));
}

#[test]
fn spacing_is_configurable() {
    let repo = repo();
    repo.create_driving_reservation(drive("2026-07-01T02:00:00Z", "2026-07-01T03:00:00Z", 100))
        .unwrap();
    let mut config = EngineConfig::default();
    config.slot_search.spacing_minutes = 0;
    let a = Availability::new(&repo, &config);

    let slot = a
        .find_charging_slot(&vehicle(), at("2026-07-01T12:00:00Z"), None)
        .unwrap();
    assert_eq!(slot, Some(at("2026-07-01T12:00:00Z") - Duration::hours(4)));
}
