/// Core error type for the directory bot.
///
/// Adapter crates map their transport errors into `Delivery`/`External` so the
/// dispatcher can tell them apart from storage failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("permission denied")]
    PermissionDenied,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_storage_errors() {
        assert!(!Error::Delivery("blocked".into()).is_storage());
        assert!(!Error::PermissionDenied.is_storage());
        assert!(Error::Storage(rusqlite::Error::InvalidQuery).is_storage());
    }
}
