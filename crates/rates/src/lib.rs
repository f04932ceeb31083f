//! Exchange rate lookups.
//!
//! This crate provides:
//! - The `RateSource` trait consumed by the threshold dispatcher
//! - An exchangeratesapi.io client
//! - A recording mock for tests

pub mod client;
pub mod error;
pub mod response;
pub mod source;

pub use client::ExchangeRatesClient;
pub use error::{RateError, RateResult};
pub use response::{LatestRatesResponse, ProviderErrorBody};
pub use source::{MockRateSource, RateSource};
