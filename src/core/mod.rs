pub mod clock;
pub mod config;
pub mod event;
pub mod log;
pub mod pipeline;
pub mod queue;
