use thiserror::Error;

/// A result type for gpviz sessions
pub type Result<T> = std::result::Result<T, GpvizError>;

/// An error when configuring or running a regression session
#[derive(Error, Debug)]
pub enum GpvizError {
    /// When configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
    /// When GP fitting, prediction or sampling fails
    #[error(transparent)]
    GpError(#[from] gpviz_gp::GpError),
    /// When IO fails
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    /// When (de)serialization of configuration or report fails
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),
}
