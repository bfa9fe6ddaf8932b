//! Local service management for the binary.

pub mod chromedriver;
