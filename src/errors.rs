//! Error types for the index manager.
use std::fmt;

/// All error kinds the session and its collaborators can surface.
///
/// `DuplicateKey` and `MalformedInput` are recoverable by the caller (the shell
/// keeps running); `IOFailure` and `Corruption` abort only the operation that
/// triggered them.
#[derive(Debug)]
pub enum Error {
    /// A mutating or querying command was issued with no index file open.
    NoIndexOpen,
    /// `create` targeted a path that already exists and the caller declined to
    /// overwrite it.
    FileExists,
    /// `open` or `load` targeted a path that does not exist.
    FileNotFound,
    /// The file's magic bytes don't match `BTREEIDX`.
    InvalidIndexFile,
    /// `insert` targeted a key that is already present. The tree is left
    /// unchanged.
    DuplicateKey(u32),
    /// A `load` line wasn't `int,int`.
    MalformedInput(String),
    /// Underlying block I/O failed.
    IOFailure(std::io::Error),
    /// A node decoded to a value that can't be a valid node (bad `num_keys`,
    /// out-of-file child offset, etc).
    Corruption(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoIndexOpen => write!(f, "No index file is open."),
            Error::FileExists => write!(f, "File already exists."),
            Error::FileNotFound => write!(f, "File does not exist."),
            Error::InvalidIndexFile => write!(f, "Not a valid index file (bad magic)."),
            Error::DuplicateKey(k) => write!(f, "Duplicate key {}.", k),
            Error::MalformedInput(line) => write!(f, "Malformed input line: {:?}", line),
            Error::IOFailure(e) => write!(f, "I/O error: {}", e),
            Error::Corruption(msg) => write!(f, "Index file is corrupt: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IOFailure(err)
    }
}

/// Build an `Error` with a formatted message, the way `format!` builds a
/// `String`. Used for the variants that carry a message.
#[macro_export]
macro_rules! err {
    (Corruption, $($arg:tt)*) => {
        $crate::errors::Error::Corruption(format!($($arg)*))
    };
    (MalformedInput, $($arg:tt)*) => {
        $crate::errors::Error::MalformedInput(format!($($arg)*))
    };
}
