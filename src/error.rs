use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unexpected API response: status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("unexpected API response: no Date header")]
    MissingDate,

    #[error("odds request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::UnexpectedStatus { status } => Some(*status),
            FetchError::MissingDate => None,
            FetchError::Request(err) => err.status().map(|s| s.as_u16()),
        }
    }
}
