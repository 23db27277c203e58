use std::fmt;
use thiserror::Error;

/// Nature d'un échec du stockage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    NotFound,
    InsertFailure,
    UpdateFailure,
    DeleteFailure,
    ConnectionFailure,
    DuplicateKey,
    ForeignKeyViolation,
    Unknown,
}

impl StorageErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageErrorKind::NotFound => "not-found",
            StorageErrorKind::InsertFailure => "insert-failure",
            StorageErrorKind::UpdateFailure => "update-failure",
            StorageErrorKind::DeleteFailure => "delete-failure",
            StorageErrorKind::ConnectionFailure => "connection-failure",
            StorageErrorKind::DuplicateKey => "duplicate-key",
            StorageErrorKind::ForeignKeyViolation => "foreign-key-violation",
            StorageErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Échec remonté par le collaborateur de persistance, cause d'origine comprise.
#[derive(Error, Debug)]
#[error("storage {kind}: {source:#}")]
pub struct StorageError {
    kind: StorageErrorKind,
    source: anyhow::Error,
}

impl StorageError {
    pub fn new<E>(kind: StorageErrorKind, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn msg<M>(kind: StorageErrorKind, message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::new(kind, anyhow::Error::msg(message))
    }

    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }
}

/// Erreurs du coeur métier.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Étiquette stable d'une erreur, pour le rendu côté appelant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Storage(StorageErrorKind),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Storage(e) => ErrorKind::Storage(e.kind()),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
