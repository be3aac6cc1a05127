//! Musify CLI
//!
//! Wires configuration, the source resolver, the catalog client and the
//! playback engine together for the `musify` binary.

pub mod config;
pub mod error;
pub mod report;
pub mod tracks;
pub mod transport;
pub mod wiring;
