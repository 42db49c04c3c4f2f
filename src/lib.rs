// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain layer
pub mod fcm;
pub mod gateway;

// Application layer
pub mod api;
pub mod server;
