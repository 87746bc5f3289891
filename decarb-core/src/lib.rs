//! Embeddable core library for decarb.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into a host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`CatalogSource`](ports::CatalogSource) loads the measure and funding catalogs
//! - [`ProfileSource`](ports::ProfileSource) loads company profiles
//! - [`WritePort`](ports::WritePort) writes files and creates directories
//!
//! The [`adapters`] module provides default filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_eligibility`](pipeline::run_eligibility) assesses one company
//! - [`run_plan`](pipeline::run_plan) plans one company
//! - [`run_batch`](pipeline::run_batch) plans many companies against shared budgets

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export loader types so embedders don't need decarb-catalog directly.
pub use decarb_catalog::{LoadedCatalog, LoadedProfile, ProfileLoadError};

// Re-export the cancellation handle used by `run_batch`.
pub use decarb_domain::CancellationToken;
