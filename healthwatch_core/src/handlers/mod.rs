//! HTTP handlers exposing the health engine

pub mod health;
pub mod routes;
