//! Configuration types
//!
//! Plain-data descriptions of devices, ports and polling. With the
//! `serde` feature they can be loaded from any serde format; validation
//! is always explicit.

pub mod hardware;

pub use hardware::*;
