//! Store visit image processing jobs.
//!
//! A batch of store visits is written atomically as one job, every image of
//! the job is processed concurrently in the background, and the outcomes are
//! rolled up into a single job status that clients poll for.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
