//! HTTP routes

pub mod failures;
pub mod requests;
