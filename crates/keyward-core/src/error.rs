//! Error types for Keyward

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors are `Clone` so that the outcome of one coalesced directory refresh
/// can be handed to every caller that waited on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Directory Errors
    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Directory operation timed out: {0}")]
    DirectoryTimeout(String),

    // Keys File Errors
    #[error("Keys file error: {0}")]
    KeysFile(String),

    #[error("Malformed keys file: {0}")]
    MalformedKeysFile(String),

    // Record Errors
    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("Attribute {attribute} has the wrong type (expected {expected})")]
    WrongAttributeType {
        attribute: String,
        expected: &'static str,
    },

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("No directory entry for user: {0}")]
    UserNotFound(String),

    // Configuration Errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Directory(_) => "DirectoryError",
            Error::DirectoryTimeout(_) => "DirectoryTimeout",
            Error::KeysFile(_) => "KeysFileError",
            Error::MalformedKeysFile(_) => "MalformedKeysFile",
            Error::MissingAttribute(_) => "MissingAttribute",
            Error::WrongAttributeType { .. } => "WrongAttributeType",
            Error::InvalidPublicKey(_) => "InvalidPublicKey",
            Error::UserNotFound(_) => "UserNotFound",
            Error::InvalidConfig(_) => "InvalidConfig",
        }
    }

    /// Whether the error came from the backing directory rather than from a
    /// single malformed record.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Directory(_)
                | Error::DirectoryTimeout(_)
                | Error::KeysFile(_)
                | Error::MalformedKeysFile(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::KeysFile(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Directory("down".into()).code(), "DirectoryError");
        assert_eq!(
            Error::WrongAttributeType {
                attribute: "roles".into(),
                expected: "list of strings",
            }
            .code(),
            "WrongAttributeType"
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(Error::DirectoryTimeout("search".into()).is_transport());
        assert!(Error::KeysFile("gone".into()).is_transport());
        assert!(!Error::MissingAttribute("username".into()).is_transport());
        assert!(!Error::InvalidPublicKey("junk".into()).is_transport());
    }

    #[test]
    fn test_io_error_maps_to_keys_file() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        assert!(matches!(err, Error::KeysFile(_)));
    }
}
