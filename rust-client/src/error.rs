#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored reading value '{0}' is not a decimal number")]
    CorruptValue(String),
    #[error("stored register type '{0}' is not recognised")]
    UnknownRegisterType(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
