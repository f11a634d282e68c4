//! Startup initialization for the tcresults database.
//!
//! Selects `tcresults`, creates the `tc_usr` principal with `readWrite` on that
//! database, and creates the empty `trashcan_results` collection.

pub mod routine;
pub mod steps;
pub mod verify;

pub use routine::initialize;
pub use verify::{verify, VerifyOptions, VerifyReport};
