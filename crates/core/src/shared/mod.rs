pub mod config_error;
pub mod constants;
pub mod frame;
pub mod region;
pub mod timestamp;
