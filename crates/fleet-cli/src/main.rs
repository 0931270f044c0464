//! `fleet` CLI: inspect and book reservations in a fleet snapshot.
//!
//! ## Usage
//!
//! ```sh
//! # Range left on vehicle 1 at noon
//! fleet -f fleet.json range --vehicle 1 --at 2026-07-01T12:00:00Z
//!
//! # Where could a full charge go before noon?
//! fleet -f fleet.json find-slot --vehicle 1 --at 2026-07-01T12:00:00Z
//!
//! # Would a 100 km trip fit?
//! fleet -f fleet.json check-drive --vehicle 1 \
//!   --start 2026-07-01T12:00:00Z --end 2026-07-01T13:00:00Z --distance 100
//!
//! # Book it and write the updated snapshot back
//! fleet -f fleet.json book-drive --user alice --vehicle 1 \
//!   --start 2026-07-01T12:00:00Z --end 2026-07-01T13:00:00Z --distance 100 -o fleet.json
//! ```
//!
//! Rejected requests exit with status 2 and the reason on stderr; other
//! failures exit with status 1. Set `FLEET_LOG` (e.g. `FLEET_LOG=debug`) to
//! see engine tracing.

use std::process;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fleet_engine::{
    Availability, ChargingReservationId, EngineConfig, FleetError, FleetSnapshot,
    InMemoryRepository, NewChargingReservation, NewDrivingReservation, Priority, ReservationId,
    ReservationRepository, ReservationService, SlotSearch, Vehicle, VehicleId,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fleet",
    version,
    about = "Availability and range checks for a shared electric car fleet"
)]
struct Cli {
    /// Fleet snapshot (JSON: vehicles, driving and charging reservations)
    #[arg(short, long)]
    fleet: String,

    /// Engine configuration (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show seasonal range, last full charge and distance left
    Range {
        #[arg(long)]
        vehicle: u64,
        #[arg(long)]
        at: String,
    },
    /// Search backwards for a free charging window
    FindSlot {
        #[arg(long)]
        vehicle: u64,
        #[arg(long)]
        at: String,
        /// Driving reservation to ignore (the one being edited)
        #[arg(long)]
        exclude: Option<u64>,
    },
    /// Validate a driving reservation without booking it
    CheckDrive {
        #[command(flatten)]
        trip: TripArgs,
        /// Driving reservation to ignore (the one being edited)
        #[arg(long)]
        exclude: Option<u64>,
    },
    /// Validate a charging reservation without booking it
    CheckCharge {
        #[command(flatten)]
        window: ChargeArgs,
        /// Charging reservation to ignore (the one being edited)
        #[arg(long)]
        exclude: Option<u64>,
    },
    /// List free windows between two instants
    Free {
        #[arg(long)]
        vehicle: u64,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Book a driving reservation and write the updated snapshot
    BookDrive {
        #[arg(long)]
        user: String,
        #[command(flatten)]
        trip: TripArgs,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Book a charging reservation and write the updated snapshot
    BookCharge {
        #[arg(long)]
        user: String,
        #[command(flatten)]
        window: ChargeArgs,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Args)]
struct TripArgs {
    #[arg(long)]
    vehicle: u64,
    #[arg(long)]
    start: String,
    #[arg(long)]
    end: String,
    /// Kilometres the trip needs
    #[arg(long)]
    distance: u32,
    #[arg(long, default_value = "")]
    location: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, value_enum, default_value_t = PriorityArg::Low)]
    priority: PriorityArg,
    #[arg(long)]
    must_fully_charge: bool,
}

impl TripArgs {
    fn to_new(&self, owner: &str) -> Result<NewDrivingReservation> {
        Ok(NewDrivingReservation {
            vehicle_id: VehicleId(self.vehicle),
            owner: owner.to_string(),
            description: self.description.clone(),
            location: self.location.clone(),
            start_time: parse_datetime(&self.start)?,
            end_time: parse_datetime(&self.end)?,
            distance: self.distance,
            priority: self.priority.into(),
            must_fully_charge: self.must_fully_charge,
        })
    }
}

#[derive(Args)]
struct ChargeArgs {
    #[arg(long)]
    vehicle: u64,
    #[arg(long)]
    start: String,
    #[arg(long)]
    end: String,
}

impl ChargeArgs {
    fn to_new(&self) -> Result<NewChargingReservation> {
        Ok(NewChargingReservation {
            vehicle_id: VehicleId(self.vehicle),
            start_time: parse_datetime(&self.start)?,
            end_time: parse_datetime(&self.end)?,
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(p: PriorityArg) -> Self {
        match p {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FLEET_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let snapshot = load_fleet(&cli.fleet)?;
    let service = ReservationService::new(InMemoryRepository::from_snapshot(snapshot), config)
        .context("Invalid engine configuration")?;

    if let Err(err) = run(&service, cli.command) {
        if let Some(rejection) = err
            .downcast_ref::<FleetError>()
            .filter(|e| e.is_rejection())
        {
            eprintln!("rejected: {}", rejection);
            process::exit(2);
        }
        return Err(err);
    }
    Ok(())
}

fn run(service: &ReservationService<InMemoryRepository>, command: Commands) -> Result<()> {
    let availability = service.availability();
    match command {
        Commands::Range { vehicle, at } => {
            let vehicle = find_vehicle(&availability, vehicle)?;
            let at = parse_datetime(&at)?;
            let last_charge = availability.last_qualifying_charge_before(&vehicle, at)?;
            println!("vehicle:          {} {}", vehicle.id, vehicle.name);
            println!(
                "seasonal range:   {} km",
                availability.seasonal_range(&vehicle, at)
            );
            if last_charge == fleet_engine::energy::epoch() {
                println!("last full charge: never");
            } else {
                println!("last full charge: {}", format_time(last_charge));
            }
            println!(
                "distance left:    {} km",
                availability.distance_left(&vehicle, at, None)?
            );
        }
        Commands::FindSlot {
            vehicle,
            at,
            exclude,
        } => {
            let vehicle = find_vehicle(&availability, vehicle)?;
            let at = parse_datetime(&at)?;
            match availability.search_charging_slot(&vehicle, at, exclude.map(ReservationId))? {
                SlotSearch::NotNeeded => println!("no charge needed"),
                SlotSearch::Found(start) => println!(
                    "charge from {} to {}",
                    format_time(start),
                    format_time(start + vehicle.charging_duration())
                ),
                SlotSearch::Exhausted => println!("no free charging slot found"),
            }
        }
        Commands::CheckDrive { trip, exclude } => {
            let candidate = trip.to_new("")?;
            availability.validate_driving_reservation(&candidate, exclude.map(ReservationId))?;
            println!("ok");
        }
        Commands::CheckCharge { window, exclude } => {
            let candidate = window.to_new()?;
            availability
                .validate_charging_reservation(&candidate, exclude.map(ChargingReservationId))?;
            println!("ok");
        }
        Commands::Free { vehicle, from, to } => {
            let vehicle = find_vehicle(&availability, vehicle)?;
            let windows =
                availability.free_windows(&vehicle, parse_datetime(&from)?, parse_datetime(&to)?)?;
            for window in windows {
                println!(
                    "{}  {}  {} min",
                    format_time(window.start),
                    format_time(window.end),
                    window.duration_minutes
                );
            }
        }
        Commands::BookDrive { user, trip, output } => {
            let booking = service.create_driving_reservation(&user, trip.to_new(&user)?)?;
            eprintln!("booked driving reservation {}", booking.reservation.id);
            for notice in &booking.notices {
                eprintln!("{}", notice);
            }
            write_snapshot(service, output.as_deref())?;
        }
        Commands::BookCharge {
            user,
            window,
            output,
        } => {
            let charge = service.create_charging_reservation(&user, window.to_new()?)?;
            eprintln!("booked charging reservation {}", charge.id);
            write_snapshot(service, output.as_deref())?;
        }
    }
    Ok(())
}

fn find_vehicle(
    availability: &Availability<'_, InMemoryRepository>,
    id: u64,
) -> Result<Vehicle> {
    availability
        .repository()
        .vehicle(VehicleId(id))?
        .ok_or_else(|| FleetError::UnknownVehicle(VehicleId(id)).into())
}

/// Parse RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .with_context(|| format!("Invalid datetime '{}'", s))
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path))?;
            toml::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_fleet(path: &str) -> Result<FleetSnapshot> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse fleet snapshot: {}", path))
}

fn write_snapshot(
    service: &ReservationService<InMemoryRepository>,
    path: Option<&str>,
) -> Result<()> {
    let snapshot = service.repository().snapshot()?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    match path {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => println!("{}", json),
    }
    Ok(())
}
