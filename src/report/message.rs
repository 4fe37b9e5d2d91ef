use super::{Error, ErrorKind};
use std::fmt::Display;

pub const UNEXPECTED_TOKEN: &str = "unexpected token";
pub const UNEXPECTED_BLOCK: &str = "unexpected block";
pub const UNEXPECTED_EOF: &str = "unexpected eof";
pub const INVALID_SYNTAX: &str = "invalid syntax";
pub const INVALID_PATH: &str = "invalid path";
pub const UNCLOSED_BLOCK: &str = "unclosed block";

/// Return an [`Error`] explaining that the end of source was not expected.
pub fn error_eof(source: &str) -> Error {
    let source_len = source.len();
    Error::with_kind(ErrorKind::Parse, UNEXPECTED_EOF)
        .with_pointer(source, source_len..source_len)
        .with_help("expected additional tokens, did you close all blocks and expressions?")
}

/// Return an [`Error`] explaining that the write operation failed.
///
/// This is likely caused by a failure during a `write!` macro operation.
pub fn error_write() -> Error {
    Error::with_kind(ErrorKind::Write, "write failure")
        .with_help("failed to write result of render to the output")
}

/// Return an [`Error`] describing a helper that is not registered.
pub fn error_missing_helper(name: &str) -> Error {
    Error::with_kind(
        ErrorKind::HelperNotFound {
            name: name.to_owned(),
        },
        "helper not found",
    )
    .with_help(format!(
        "template wants to use the `{name}` helper, but a helper with that name was \
        not found in this engine, did you register it with `.register_helper`?"
    ))
}

/// Return an [`Error`] describing a helper called with the wrong argument count.
pub fn error_arity(name: &str, expected: usize, received: usize) -> Error {
    Error::with_kind(
        ErrorKind::HelperArity {
            name: name.to_owned(),
            expected,
            received,
        },
        "wrong number of arguments",
    )
    .with_help(format!(
        "helper `{name}` expects `{expected}` argument(s), received `{received}`"
    ))
}

/// Return an [`Error`] describing a missing partial.
pub fn error_missing_partial(name: &str) -> Error {
    Error::with_kind(
        ErrorKind::PartialNotFound {
            name: name.to_owned(),
        },
        "partial not found",
    )
    .with_help(format!(
        "partial `{name}` not found in engine, add it with `.register_template`"
    ))
}

/// Return an [`Error`] describing a missing named template.
pub fn error_missing_template(name: &str) -> Error {
    error_missing_partial(name)
        .with_reason("template not found")
        .with_help(format!(
            "template `{name}` not found in engine, add it with `.register_template`"
        ))
}

/// Return an [`Error`] describing runaway recursion.
pub fn error_recursion(limit: usize) -> Error {
    Error::with_kind(ErrorKind::RecursionLimit { limit }, "recursion limit reached")
        .with_help(format!(
            "partials nested deeper than `{limit}` levels, is a partial including itself?"
        ))
}

/// Return an [`Error`] describing a binding that did not resolve.
pub fn error_undefined(path: &str, missing_key: &str) -> Error {
    Error::with_kind(
        ErrorKind::UndefinedBinding {
            path: path.to_owned(),
            missing_key: missing_key.to_owned(),
        },
        format!("undefined binding `{path}`"),
    )
    .with_help(format!("`{missing_key}` was not found in the data"))
}

/// Return a string describing the expected closing name of a block.
pub fn expected_close<T>(received: T) -> String
where
    T: Display,
{
    format!("did you close the `{received}` block with `{{{{/{received}}}}}`?")
}
