//! Test utilities for the Bayes client
//!
//! This module provides builders and fixtures for testing.

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
