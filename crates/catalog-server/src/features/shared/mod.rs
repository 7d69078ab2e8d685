//! Utilities shared across feature slices

pub mod pagination;
