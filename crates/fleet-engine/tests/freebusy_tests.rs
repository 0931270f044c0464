//! Tests for the per-vehicle free/busy calendar.

use chrono::{DateTime, Utc};
use fleet_engine::{
    Availability, EngineConfig, InMemoryRepository, NewChargingReservation,
    NewDrivingReservation, Priority, ReservationRepository, Vehicle, VehicleId,
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

fn drive(start: &str, end: &str) -> NewDrivingReservation {
    NewDrivingReservation {
        vehicle_id: VehicleId(1),
        owner: "alice".to_string(),
        description: String::new(),
        location: String::new(),
        start_time: at(start),
        end_time: at(end),
        distance: 20,
        priority: Priority::High,
        must_fully_charge: false,
    }
}

#[test]
fn empty_calendar_is_one_free_window() {
    let repo = repo();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let free = a
        .free_windows(&vehicle(), at("2026-03-16T08:00:00Z"), at("2026-03-16T17:00:00Z"))
        .unwrap();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].duration_minutes, 9 * 60);
}

#[test]
fn adjacent_drive_and_charge_merge_into_one_block() {
    let repo = repo();
    repo.create_driving_reservation(drive("2026-03-16T09:00:00Z", "2026-03-16T10:00:00Z"))
        .unwrap();
    repo.create_charging_reservation(NewChargingReservation {
        vehicle_id: VehicleId(1),
        start_time: at("2026-03-16T10:00:00Z"),
        end_time: at("2026-03-16T14:00:00Z"),
    })
    .unwrap();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let cal = a
        .calendar(&vehicle(), at("2026-03-16T08:00:00Z"), at("2026-03-16T17:00:00Z"))
        .unwrap();

    assert_eq!(cal.busy.len(), 1);
    assert_eq!(cal.busy[0].start, at("2026-03-16T09:00:00Z"));
    assert_eq!(cal.busy[0].end, at("2026-03-16T14:00:00Z"));
    assert_eq!(cal.busy[0].driving, 1);
    assert_eq!(cal.busy[0].charging, 1);

    assert_eq!(cal.free.len(), 2);
    assert_eq!(cal.free[0].duration_minutes, 60);
    assert_eq!(cal.free[1].start, at("2026-03-16T14:00:00Z"));
    assert_eq!(cal.free[1].duration_minutes, 180);
}

#[test]
fn bookings_are_clipped_to_window() {
    let repo = repo();
    repo.create_driving_reservation(drive("2026-03-16T06:00:00Z", "2026-03-16T09:00:00Z"))
        .unwrap();
    repo.create_driving_reservation(drive("2026-03-16T16:00:00Z", "2026-03-16T19:00:00Z"))
        .unwrap();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let cal = a
        .calendar(&vehicle(), at("2026-03-16T08:00:00Z"), at("2026-03-16T17:00:00Z"))
        .unwrap();

    assert_eq!(cal.busy.len(), 2);
    assert_eq!(cal.busy[0].start, at("2026-03-16T08:00:00Z"));
    assert_eq!(cal.busy[1].end, at("2026-03-16T17:00:00Z"));
    assert_eq!(cal.free.len(), 1);
    assert_eq!(cal.free[0].start, at("2026-03-16T09:00:00Z"));
    assert_eq!(cal.free[0].end, at("2026-03-16T16:00:00Z"));
}

#[test]
fn inverted_window_is_empty() {
    let repo = repo();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let cal = a
        .calendar(&vehicle(), at("2026-03-16T17:00:00Z"), at("2026-03-16T08:00:00Z"))
        .unwrap();
    assert!(cal.busy.is_empty());
    assert!(cal.free.is_empty());
}

#[test]
fn bookings_touching_the_window_edges_are_not_busy() {
    let repo = repo();
    repo.create_driving_reservation(drive("2026-03-16T06:00:00Z", "2026-03-16T08:00:00Z"))
        .unwrap();
    repo.create_charging_reservation(NewChargingReservation {
        vehicle_id: VehicleId(1),
        start_time: at("2026-03-16T17:00:00Z"),
        end_time: at("2026-03-16T21:00:00Z"),
    })
    .unwrap();
    let config = EngineConfig::default();
    let a = Availability::new(&repo, &config);

    let cal = a
        .calendar(&vehicle(), at("2026-03-16T08:00:00Z"), at("2026-03-16T17:00:00Z"))
        .unwrap();
    assert!(cal.busy.is_empty());
    assert_eq!(cal.free.len(), 1);
    assert_eq!(cal.free[0].duration_minutes, 9 * 60);
}
