//! Bright Data dataset client and profile projection.
//!
//! The dataset API is a job system: a trigger call returns a snapshot id,
//! the snapshot is polled until it is ready, and the records are downloaded
//! afterwards. [`BrightDataClient`] drives that cycle under a bounded
//! back-off budget; [`project`] turns the downloaded record into a
//! [`wykra_core::ProjectedProfile`].

pub mod client;
pub mod error;
pub mod job;
pub mod project;
pub mod types;

pub use client::BrightDataClient;
pub use error::{ProjectionError, ScrapeError};
pub use job::{JobStatus, PollSettings, ScrapeJob};
pub use project::project;
pub use types::RawProfileRecord;
