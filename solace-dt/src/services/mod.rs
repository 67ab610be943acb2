//! Tracking flows that sit between the HTTP handlers and the store

pub mod refresh;
pub mod registration;
