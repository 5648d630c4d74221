pub mod face_localizer;
pub mod tracker_pool;
