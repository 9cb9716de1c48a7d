//! Shared code for the geofile binaries

pub mod common;
