use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MathNotesError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(Uuid),

    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    #[error("Page not found: {key} page {index}")]
    PageNotFound { key: String, index: usize },

    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

/// Coarse failure classes the persistence layer reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Corrupt,
    IoFailure,
    InvalidInput,
}

impl MathNotesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CollectionNotFound(_) | Self::DocumentNotFound(_) | Self::PageNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::Corrupt(_) | Self::Serialization(_) => ErrorKind::Corrupt,
            Self::Io(_) | Self::Store(_) => ErrorKind::IoFailure,
            Self::Api(_) => ErrorKind::InvalidInput,
        }
    }
}

pub type Result<T> = std::result::Result<T, MathNotesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            MathNotesError::DocumentNotFound(Uuid::new_v4()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MathNotesError::PageNotFound {
                key: "k".to_string(),
                index: 3
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MathNotesError::Corrupt("bad".to_string()).kind(),
            ErrorKind::Corrupt
        );
        assert_eq!(
            MathNotesError::Store("disk full".to_string()).kind(),
            ErrorKind::IoFailure
        );

        assert_eq!(
            MathNotesError::Api("no such folder".to_string()).kind(),
            ErrorKind::InvalidInput
        );

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(MathNotesError::from(json_err).kind(), ErrorKind::Corrupt);
    }
}
