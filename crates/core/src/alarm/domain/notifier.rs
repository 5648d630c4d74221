use std::path::Path;

/// Local, attention-grabbing alert (bell, siren, buzzer).
pub trait AudibleNotifier: Send + Sync {
    fn dispatch(&self) -> Result<(), Box<dyn std::error::Error>>;
}

/// Remote notification, optionally carrying the alarm snapshot.
pub trait PushNotifier: Send + Sync {
    fn dispatch(&self, snapshot: Option<&Path>) -> Result<(), Box<dyn std::error::Error>>;
}
