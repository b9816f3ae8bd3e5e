//! HTTP service exposing the cost model, optimization scan and setup session

pub mod api;
pub mod config;
