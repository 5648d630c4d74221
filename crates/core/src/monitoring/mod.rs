pub mod annotation;
pub mod config;
pub mod confidence_gate;
pub mod event_log;
pub mod frame_processor;
pub mod frame_worker;
pub mod runtime;
pub mod settings;
