//! Client for the hosted backend-as-a-service.
//!
//! All persistence and identity is delegated to an external project that
//! exposes GoTrue-style auth routes under `/auth/v1` and PostgREST-style
//! table routes under `/rest/v1`. This crate provides:
//!
//! - [`BackendClient`] — shared HTTP plumbing for the table routes.
//! - [`auth`] — the auth API (signup, login, refresh, resend, logout).
//! - [`session`] — the process-wide session/identity context and its
//!   auth-event stream.
//! - [`models`] — one module per table: entity struct plus create DTO.
//! - [`repositories`] — zero-sized repo structs with async CRUD methods
//!   that accept `&BackendClient` as the first argument.
//!
//! Row-level access control, uniqueness constraints, and conditional
//! updates are all enforced server-side; this crate never holds a lock
//! and never runs a multi-statement transaction.

pub mod auth;
pub mod client;
pub mod models;
pub mod repositories;
pub mod session;

pub use client::{best_effort, BackendClient, BackendError};
pub use session::{AuthEvent, SessionContext, SessionUser};
