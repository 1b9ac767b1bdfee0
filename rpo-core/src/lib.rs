#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the sibling crates.
//! [rpo_core]: https://docs.rs/rpo_core/latest/rpo_core/index.html
//! [rpo_solver]: https://docs.rs/rpo_solver/latest/rpo_solver/index.html
//! [rpo_sqlite]: https://docs.rs/rpo_sqlite/latest/rpo_sqlite/index.html
#![doc = include_str!("../README.md")]

/// Core domain models for retail price optimization.
///
/// This module contains the data structures that flow between the warehouse,
/// the optimization engine and the command-line tooling: pricing rows, price
/// ranges, optimization results, elasticity histories and the engine
/// configuration.
///
/// The models are plain data with minimal behaviour, following the hexagonal
/// architecture: they are independent of how they are persisted or computed.
pub mod models;

/// Interface traits for the price optimization system.
///
/// This module contains the "ports" of the hexagonal architecture. The engine
/// only ever talks to the warehouse through these traits, so any storage
/// backend offering bulk reads and full-table replaces can be swapped in.
pub mod ports;
