//! Core state for the essentials plugin: named locations and teleport requests.
//!
//! This crate has no dependency on the plugin API or any host. Registries are
//! owned objects, shared behind `Arc` by the command layer.

pub mod clock;
pub mod error;
pub mod location;
pub mod teleport;
pub mod world;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{HomeLimitReached, TeleportRequestError};
pub use location::{
    LocationRecord, LocationRegistry, NamedLocation, PlayerId, PlayerLocations, RegistrySnapshot,
};
pub use teleport::{AcceptedRequest, DeniedRequest, PendingRequest, TeleportRequestBroker, REQUEST_TTL};
pub use world::readable_world;
