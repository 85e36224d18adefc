use thiserror::Error;

use crate::marking::MarkingClass;

/// Errors raised when marking geometry is handled by code that does not know its class.
///
/// These are programmer errors: a closed enumeration is missing a case, or a patch
/// targets a field the marking does not carry. Callers log them and drop the attempt.
#[derive(Debug, Error, PartialEq)]
pub enum MarkingError {
    #[error("Unsupported marking class: {0}")]
    UnsupportedMarkingClass(String),

    #[error("Marking class {class} has no field `{field}`")]
    FieldNotSupported {
        class: MarkingClass,
        field: &'static str,
    },
}

pub type MarkingResult<T> = Result<T, MarkingError>;
