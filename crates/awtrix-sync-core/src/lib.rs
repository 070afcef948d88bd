//! `awtrix-sync-core` keeps the custom apps on an AWTRIX pixel display in
//! step with a set of widget producers.
//!
//! Each cycle the [`ReconciliationEngine`] replays payloads the display
//! refused earlier, asks its [`ProducerRegistry`] for producers, publishes
//! every unit's [`SlideSet`], deletes units that disappeared since the last
//! committed cycle and records the units that reached the display.

pub mod apps;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod io;
pub mod known;
pub mod paths;
pub mod pending;
pub mod producer;
pub mod productive;
pub mod report;
pub mod scheduler;
pub mod slide;

pub use display::{AwtrixClient, DisplayClient, DisplayError};
pub use engine::{EngineOptions, ReconciliationEngine};
pub use error::{ProducerError, RegistryError, Result, SyncError};
pub use producer::{Producer, ProducerRegistry, Widget};
pub use report::{CycleFailure, CycleReport, FailureKind};
pub use slide::{Color, Slide, SlideSet};
