pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod event_scheduler;
pub mod job;
pub mod manager;
pub mod metrics;
pub mod observer;
pub mod operation;
pub mod station;
pub mod transport;
pub mod types;
