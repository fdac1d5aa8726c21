//! Guard (Route Protection) Client Module
//!
//! Role-based route guards over the session core. One parameterized guard
//! covers the three historical shapes:
//! - admin-only routes (redirect on any mismatch)
//! - role-scoped routes with the required role injected (seller sections)
//! - user routes that can show a friendly in-page notice instead of
//!   redirecting
//!
//! ## Security Model
//! - Pure decisions: `evaluate` is a function of the session snapshot and
//!   static configuration, nothing else
//! - Fail closed: any ambiguity about authorization resolves to deny
//! - Live verification on route entry: a token that the server no longer
//!   accepts is treated exactly like not being logged in

pub mod decision;
pub mod policy;

pub use decision::{AccessNotice, Denial, GuardDecision};
pub use policy::RouteGuard;
