//! Cohort Testing Infrastructure
//!
//! Deterministic collaborator doubles and study fixtures shared by the
//! feature crate's unit and integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```rust,no_run
//! use cohort_testkit::*;
//!
//! # async fn demo() {
//! let effects = MockEffects::new().with_client_id(CLIENT_SHORT);
//! effects.set_now(T0);
//! let config = two_arm_config();
//! # }
//! ```

pub mod fixtures;
pub mod mock_effects;

pub use fixtures::*;
pub use mock_effects::{MockEffects, WriteFailure};
