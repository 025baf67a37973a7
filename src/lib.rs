// Library entry point
// The `bayes` binary in main.rs is a thin command line front end over these modules

pub mod auth;
pub mod bayes;
pub mod config;
pub mod time;

#[cfg(test)]
mod testutil;
