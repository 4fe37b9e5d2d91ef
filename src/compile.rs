mod lex;
mod parse;
pub(crate) mod path;
mod template;

pub use crate::compile::{
    parse::{scope::Scope, tree, Parser},
    path::Path,
    template::Template,
};

use crate::Error;

/// Compile a [`Template`] from the given text.
///
/// Provides a shortcut to quickly compile a `Template` without creating
/// an `Engine`.
///
/// # Errors
///
/// Returns an [`Error`] when the text contains invalid syntax.
///
/// # Examples
///
/// ```
/// use stache::compile;
///
/// let template = compile("hello, {{ name }}!");
/// assert!(template.is_ok());
/// ```
pub fn compile(text: &str) -> Result<Template, Error> {
    Parser::new(text).compile(None)
}
