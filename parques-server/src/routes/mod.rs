//! HTTP route handlers

pub mod board;
pub mod error;
pub mod matches;
pub mod status;
