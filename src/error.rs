use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepthcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("System error: {message}")]
    System { message: String },
}

/// Errors raised while locating, configuring or reading from a camera
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("No device detected. Is it plugged in?")]
    NoDevice,

    #[error("No device from {product_line} product line detected. Is it plugged in?")]
    ProductLineNotFound { product_line: String },

    #[error("Failed to configure {stream} stream: {details}")]
    StreamConfiguration { stream: String, details: String },

    #[error("Failed to start capture pipeline: {details}")]
    PipelineStart { details: String },

    #[error("{stream} frame is {actual} bytes, expected {expected}")]
    FrameSize {
        stream: String,
        expected: usize,
        actual: usize,
    },

    #[error("Option {option} is not supported by any sensor")]
    OptionUnsupported { option: String },

    #[error("Failed to set option {option}: {details}")]
    OptionSet { option: String, details: String },

    #[error("SDK error: {details}")]
    Sdk { details: String },
}

impl DepthcamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DepthcamError>;
