pub use libraryhub_core::error::ApiError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// HTTP status behind the error; 0 when the request never got a response.
    pub fn status(&self) -> u16 {
        match self {
            Error::Api(err) => err.status(),
            Error::Network(_) | Error::InvalidRequest(_) => 0,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Api(err) if err.is_authentication())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(err) if err.is_not_found())
    }
}
