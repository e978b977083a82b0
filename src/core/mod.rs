pub mod camera_registry;
pub mod event_processor;
pub mod event_source;
pub mod file_event;
pub mod heuristics;
