pub mod api;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod finnhub;
pub mod market_data;
pub mod model;
pub mod portfolio;
pub mod scheduler;
pub mod signal_engine;
