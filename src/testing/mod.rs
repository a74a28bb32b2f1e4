//! Testing infrastructure.
//!
//! Mock implementations of the driver's capability traits, so retry
//! logic can be exercised without any real fixer or test runner.

pub mod mocks;

pub use mocks::{MockFixProvider, MockValidator};
