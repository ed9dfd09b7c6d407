//! # Canister Support
//!
//! Shared text helpers for the canister service container:
//! identifier shortening, dependency-chain rendering, and
//! "did you mean" suggestions for error output.

pub mod rendering;
