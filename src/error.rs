use thiserror::Error;

/// Failures of the local key-value store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,

    #[error("write of '{key}' rejected: {reason}")]
    WriteRejected { key: String, reason: String },

    #[error("could not encode '{key}': {reason}")]
    Encode { key: String, reason: String },
}

/// Failures talking to the shared remote leaderboard table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote store is not available")]
    Unavailable,

    #[error("remote call failed: {0}")]
    Js(String),
}

/// Credential check failures. Each variant carries the text shown on the
/// login overlay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect password")]
    WrongSecret,

    #[error("User account not found")]
    UnknownIdentity,

    #[error("Invalid email format")]
    MalformedInput,

    #[error("Too many failed attempts. Try again later.")]
    RateLimited,

    #[error("Please enter a password")]
    MissingSecret,

    #[error("Authentication failed")]
    Unavailable,
}

impl AuthError {
    /// Map a credential backend error code onto a failure category.
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/wrong-password" | "auth/invalid-credential" => AuthError::WrongSecret,
            "auth/user-not-found" => AuthError::UnknownIdentity,
            "auth/invalid-email" => AuthError::MalformedInput,
            "auth/too-many-requests" => AuthError::RateLimited,
            _ => AuthError::Unavailable,
        }
    }
}
