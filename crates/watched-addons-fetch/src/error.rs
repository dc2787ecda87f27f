use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error("Invalid default header {name}: {message}")]
    InvalidHeader { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
