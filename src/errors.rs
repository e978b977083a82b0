use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    // Connection refused, timeouts, stream resets. Always retried by the worker.
    #[error("Transport Error for camera {camera_ip}: {details}")]
    Transport { camera_ip: String, details: String },

    #[error("HTTP status {status} from camera {camera_ip}")]
    HttpStatus { camera_ip: String, status: u16 },

    #[error("Empty snapshot body from camera {0}")]
    EmptyBody(String),

    #[error("Image Store Error: {0}")]
    Store(String),

    #[error("File I/O Error: {0}")]
    Io(String),
}

impl AppError {
    pub fn transport(camera_ip: &str, details: impl std::fmt::Display) -> Self {
        AppError::Transport {
            camera_ip: camera_ip.to_string(),
            details: details.to_string(),
        }
    }
}

// Allow conversion from std::io::Error to AppError::Io
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}
