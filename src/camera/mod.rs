pub mod alert_stream;
pub mod camera_worker;
pub mod event_filter;
pub mod isapi_client;
pub mod isapi_event_source;

pub use camera_worker::{WorkerHandle, WorkerSettings, WorkerState};
pub use isapi_event_source::IsapiEventSource;
