//! Event collectors. Each one turns a single external data source into
//! narrative sentences for the broadcast script.
//!
//! Contract: a collector never lets an error escape its boundary. Internals
//! return a typed `Result` so failure reasons stay inspectable; the public
//! `collect` functions log the reason and fall back to a sentinel sentence or
//! an empty list, so one dead source never blocks the others or the pipeline.

pub mod camera;
pub mod mailbox;
pub mod thermostat;
pub mod weather;
