pub mod image_evidence_store;
pub mod push_config;
pub mod telegram_push;
pub mod terminal_bell;
