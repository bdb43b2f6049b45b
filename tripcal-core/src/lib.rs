//! Core types for tripcal.
//!
//! This crate owns the trip itinerary and everything that keeps it in sync:
//! - `event` defines `EventRecord` and its normalization rules
//! - `defaults` supplies the seed itinerary
//! - `local` persists the collection to a local key/value store
//! - `remote` talks to the optional realtime database
//! - `itinerary` reconciles those sources and is the entry point for front-ends

pub mod config;
pub mod defaults;
pub mod error;
pub mod event;
pub mod itinerary;
pub mod local;
pub mod remote;
pub mod travel;

pub use error::{TripCalError, TripCalResult};
pub use event::{EventPatch, EventRecord, Notes};
pub use itinerary::{Itinerary, Mode};
