//! Core types, scheduling logic and the repository for the Courtly
//! case-management backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::KvStore`]; higher layers talk to a
//! [`repo::CourtRepository`] injected with one of them.

pub mod calendar;
pub mod case;
pub mod error;
pub mod hearing;
pub mod lifecycle;
pub mod message;
pub mod reminder;
pub mod repo;
pub mod store;
pub mod user;
pub mod visibility;

pub use error::{Error, Result};
