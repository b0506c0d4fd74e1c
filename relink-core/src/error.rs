use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    MissingInput(String),

    #[error("The product with SKU \"{0}\" does not exist.")]
    ProductNotFound(String),

    #[error("The product with SKU \"{0}\" is disabled and cannot have links added.")]
    ProductDisabled(String),

    #[error("Unknown link type \"{0}\"")]
    UnknownLinkType(String),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("Other error: {0}")]
    Other(String),
}
