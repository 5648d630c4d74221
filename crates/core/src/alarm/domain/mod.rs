pub mod alarm_aggregator;
pub mod alarm_stack;
pub mod evidence_store;
pub mod notifier;
