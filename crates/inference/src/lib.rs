//! REST client for the LUT inference service.
//!
//! Wraps the two HTTP endpoints of the external GPU proxy:
//!
//! - `POST /generate` — produce a completion against a tenant's lookup
//!   table ([`InferenceClient::generate`]).
//! - `POST /train_lut` — write a new (label, context) pair into a tenant's
//!   lookup table ([`InferenceClient::train`]).
//!
//! The [`InferenceApi`] trait is the seam orchestrators depend on, so
//! tests can substitute the live service with a stub.

mod client;

pub use client::{
    GenerateResponse, InferenceApi, InferenceClient, InferenceError, TuningParams,
};
