//! Checksum and input validation helpers shared across the crate.

pub mod checksum;
pub mod validation;
