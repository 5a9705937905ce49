//! Retry and backoff for remote store calls
//!
//! Every call that leaves the process goes through [`RetryPolicy`], which
//! absorbs transient faults (rate limits, network blips, 5xx) up to a
//! configured attempt ceiling and lets everything else through untouched.

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy, RetryableError};
