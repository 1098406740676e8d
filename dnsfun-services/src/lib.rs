//! Reference services for dnsfun.
//!
//! Each module implements one [`dnsfun_core::Service`]; [`builder`] turns the
//! enabled sections of a [`dnsfun_core::Config`] into registrations.

pub mod builder;
pub mod dice;
pub mod dict;
pub mod error;
pub mod fx;
pub mod ip;
pub mod pi;
pub mod random;
mod record;

pub use builder::{build_enabled, KNOWN_SERVICES};
pub use error::BuildError;
