//! Product catalog feature
//!
//! CSV upload ingestion plus listing, search and bulk deletion of the
//! stored catalog.

pub mod commands;
pub mod queries;
pub mod routes;
