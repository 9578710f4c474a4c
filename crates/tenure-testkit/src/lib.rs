//! # Tenure Testkit
//!
//! Testing utilities for Tenure.
//!
//! ## Overview
//!
//! - **Fixtures**: a manager wired to an in-memory store, directory, and
//!   recording audit sink, with a small catalog and known members
//! - **Generators**: proptest strategies for grants around a fixed clock
//!
//! ## Test Fixtures
//!
//! ```rust
//! use tenure_testkit::fixtures::{TestFixture, NOW};
//!
//! # tokio_test_block(async {
//! let fixture = TestFixture::new();
//! let manager = fixture.manager();
//! manager.enroll_at("alice", "gold", 30, NOW).await.unwrap();
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use tenure_testkit::generators::{grant_from_params, GrantParams};
//!
//! proptest! {
//!     #[test]
//!     fn expiry_is_absolute(params: GrantParams) {
//!         let grant = grant_from_params(&params);
//!         prop_assert_eq!(grant.expires_at, tenure_testkit::NOW + params.offset_ms);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{TestFixture, NOW};
pub use generators::{grant_from_params, GrantParams};
