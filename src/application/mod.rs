//! Use-case services driven by the binary.

pub mod error;
pub mod query;
pub mod sites;
pub mod warm;
