//! Types shared by the album driver and the download oracle: configuration,
//! platform paths and the plain-text wire protocol spoken between them.

pub mod config;
pub mod platform;
pub mod protocol;
