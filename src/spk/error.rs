use thiserror::Error;

use crate::spk::{NAME_LEN, SHORTNAME_LEN};

#[derive(Error, Debug)]
pub enum SpkError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("package name {name:?} is {len} bytes, at most {NAME_LEN} allowed")]
    NameTooLong { name: String, len: usize },
    #[error("package shortname {name:?} is {len} bytes, at most {SHORTNAME_LEN} allowed")]
    ShortnameTooLong { name: String, len: usize },
    #[error("{what} {text:?} must be ascii without NUL bytes")]
    InvalidText { what: &'static str, text: String },
    #[error("path {0:?} appears more than once in the package")]
    DuplicatePath(String),
    #[error("file {path:?} declared {expected} bytes but holds {actual}")]
    LengthMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },
    #[error("{field} value {value} does not fit a narrow record")]
    OffsetOverflow { field: &'static str, value: u64 },
}
