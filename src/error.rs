use thiserror::Error;

pub type Result<T> = std::result::Result<T, PackError>;

/// Failure taxonomy of the codec.  Every variant except `BracketMismatch`
/// carries the fragment of the format string that was active when the
/// failure was detected; the fragment is diagnostic only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    #[error("out of buffer at `{0}`")]
    OutOfBuffer(String),
    #[error("unrecognized type tag at `{0}`")]
    NotFormat(String),
    #[error("unbalanced brackets in format")]
    BracketMismatch,
    #[error("format ends after a prefix at `{0}`")]
    ExpectFormat(String),
    #[error("length exceeds declared capacity at `{0}`")]
    Truncated(String),
    #[error("value stream exhausted at `{0}`")]
    MissingValue(String),
    #[error("value does not match directive at `{0}`")]
    TypeMismatch(String),
    #[error("string field is not valid UTF-8 at `{0}`")]
    InvalidUtf8(String),
}

impl PackError {
    /// Stable negative code identifying the error kind, matching the
    /// return-value contract of the wire protocol's reference tooling.
    pub fn code(&self) -> i32 {
        match self {
            PackError::OutOfBuffer(_)   => -1,
            PackError::NotFormat(_)     => -2,
            PackError::BracketMismatch  => -3,
            PackError::ExpectFormat(_)  => -4,
            PackError::Truncated(_)     => -5,
            PackError::MissingValue(_)  => -6,
            PackError::TypeMismatch(_)  => -7,
            PackError::InvalidUtf8(_)   => -8,
        }
    }

    /// Attach the active format fragment if the lower level left it empty.
    pub(crate) fn with_context(self, frag: &str) -> Self {
        fn fill(s: String, frag: &str) -> String {
            if s.is_empty() { frag.to_string() } else { s }
        }
        match self {
            PackError::OutOfBuffer(s)  => PackError::OutOfBuffer(fill(s, frag)),
            PackError::NotFormat(s)    => PackError::NotFormat(fill(s, frag)),
            PackError::BracketMismatch => PackError::BracketMismatch,
            PackError::ExpectFormat(s) => PackError::ExpectFormat(fill(s, frag)),
            PackError::Truncated(s)    => PackError::Truncated(fill(s, frag)),
            PackError::MissingValue(s) => PackError::MissingValue(fill(s, frag)),
            PackError::TypeMismatch(s) => PackError::TypeMismatch(fill(s, frag)),
            PackError::InvalidUtf8(s)  => PackError::InvalidUtf8(fill(s, frag)),
        }
    }
}
