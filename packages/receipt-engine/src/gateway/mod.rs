//! Ecomkassa fiscal gateway client.
//!
//! Submission is a two-step flow: acquire a bearer token with the
//! merchant's login/password, then POST the translated receipt to the
//! operation-specific endpoint under the merchant's group code.

mod client;
mod payload;

pub use client::EcomkassaClient;
pub use payload::{build_payload, measurement_unit, permalink};
