//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Persistent credential storage (the browser-local-storage analog)
//! - HTTP client with request/response interceptors
//! - Transport configuration
//!
//! Nothing in here knows about the auth domain; the seams are the
//! [`storage::CredentialStore`], [`http::TokenSource`] and
//! [`http::UnauthorizedObserver`] traits.

pub mod config;
pub mod http;
pub mod storage;
