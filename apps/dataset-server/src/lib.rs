pub mod config;
pub mod metrics;
pub mod routes;
pub mod seed;
pub mod state;
pub mod telemetry;
