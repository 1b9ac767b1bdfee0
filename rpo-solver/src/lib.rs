#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the sibling crates.
//! [rpo_core]: https://docs.rs/rpo_core/latest/rpo_core/index.html
//! [rpo_solver]: https://docs.rs/rpo_solver/latest/rpo_solver/index.html
//! [rpo_sqlite]: https://docs.rs/rpo_sqlite/latest/rpo_sqlite/index.html
#![doc = include_str!("../README.md")]

/// Category and channel dependent price ranges.
pub mod policy;

/// The demand-response formulations and their shared effective elasticity.
pub mod demand;

/// A bounded sequential quadratic programming solver for scalar problems.
pub mod sqp;

/// Optimization of a single pricing row under a single demand model.
pub mod optimize;

/// Post-hoc selection between the approximate and exact models.
pub mod select;

/// The batch driver that ties validation, optimization and selection together.
pub mod batch;

/// Repair of anomalous historical elasticity estimates.
pub mod smooth;

/// Flattening of sub-threshold moves in weekly series.
pub mod unify;

mod error;
pub use error::BatchError;
