use super::{error_write, Pointer, RED, RESET};
use crate::{region::Region, report::Visual};
use std::fmt::{Debug, Display, Formatter, Result};

/// Classifies an [`Error`] so callers can react to specific failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The template source could not be lexed or parsed.
    Parse,
    /// A binding could not be resolved and the engine is configured to throw.
    UndefinedBinding {
        /// The full dotted path that was requested.
        path: String,
        /// The segment at which resolution failed.
        missing_key: String,
    },
    /// A helper was invoked that is not registered.
    HelperNotFound {
        /// Name of the missing helper.
        name: String,
    },
    /// A helper was invoked with the wrong number of arguments.
    HelperArity {
        /// Name of the helper.
        name: String,
        /// Number of positional arguments the helper accepts.
        expected: usize,
        /// Number of positional arguments received.
        received: usize,
    },
    /// A partial was included that the engine could not resolve.
    PartialNotFound {
        /// Name of the missing partial.
        name: String,
    },
    /// Partial inclusion went deeper than allowed.
    RecursionLimit {
        /// The configured limit.
        limit: usize,
    },
    /// An error raised by helper code.
    Helper,
    /// Data could not be converted into a [`Value`][`crate::Value`].
    Serialize,
    /// Writing to the output failed.
    Write,
}

/// Describes an error, and allows adding a contextual help text and visualization.
///
/// # Examples
///
/// Creating an [`Error`] that includes a [`Visual`] of type [`Pointer`]:
///
/// ```
/// use stache::{Error, Region};
///
/// Error::build("unexpected token")
///     .with_pointer("{{#each items}", Region::new(13..14))
///     .with_name("list.hbs")
///     .with_help("expected `}}`");
/// ```
///
/// When printed with `println!("{:#}", error)` the [`Error`] produces this output:
///
/// ```text
/// error: unexpected token
///   --> list.hbs:1:14
///    |
///  1 | {{#each items}
///    |              ^---
///    |
///   = help: expected `}}`
/// ```
pub struct Error {
    /// The category of the [`Error`].
    kind: ErrorKind,
    /// Describes the cause of the [`Error`].
    reason: String,
    /// A visualization to help illustrate the [`Error`].
    visual: Option<Box<dyn Visual>>,
    /// Additional information to display with the [`Error`].
    help: Option<String>,
    /// The name of the Template that the [`Error`] comes from.
    name: Option<String>,
}

impl Error {
    /// Create a new [`Error`] with the given reason text.
    ///
    /// The kind of an `Error` created this way is [`ErrorKind::Helper`], which
    /// makes it the natural constructor for errors returned from helper code.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Error;
    ///
    /// Error::build("helper `link` expects a url")
    ///     .with_help("pass the url as the first argument");
    /// ```
    pub fn build<T>(reason: T) -> Self
    where
        T: Into<String>,
    {
        Self::with_kind(ErrorKind::Helper, reason)
    }

    /// Create a new [`Error`] of the given kind.
    pub fn with_kind<T>(kind: ErrorKind, reason: T) -> Self
    where
        T: Into<String>,
    {
        Error {
            kind,
            reason: reason.into(),
            name: None,
            visual: None,
            help: None,
        }
    }

    /// Set the reason text, which is a short summary of the [`Error`].
    pub fn with_reason<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.reason = text.into();

        self
    }

    /// Set the name of the [`Template`][`crate::Template`] that the [`Error`]
    /// is related to.
    ///
    /// An existing name is kept, so errors bubbling out of a partial keep
    /// pointing at the partial.
    pub fn with_name<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        if self.name.is_none() {
            self.name = Some(text.into());
        }

        self
    }

    /// Set the [`Visual`], which is a visualization that helps illustrate the
    /// cause of the error.
    pub fn with_visual(mut self, visual: impl Visual + 'static) -> Self {
        self.visual = Some(Box::new(visual));

        self
    }

    /// Set the visualization to a new [`Pointer`] with the given source text and
    /// [`Region`].
    ///
    /// Errors that already carry a visual keep it.
    pub fn with_pointer<T>(mut self, source: &str, region: T) -> Self
    where
        T: Into<Region>,
    {
        if self.visual.is_none() {
            self.visual = Some(Box::new(Pointer::new(source, region.into())));
        }

        self
    }

    /// Set the help text, which is contextual information to accompany the
    /// reason text.
    pub fn with_help<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.help = Some(text.into());

        self
    }

    /// Return the [`ErrorKind`].
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Return the reason text.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Return the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Return the name of the `Template` that the error is related to.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if !f.alternate() {
            writeln!(f, "{self:#}")?;
        }
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("reason", &self.reason)
            .field("name", &self.name)
            .field("visual", &self.visual)
            .field("help", &self.help)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let header = format!("{RED}error{RESET}");
        write!(f, "{header}: {}", self.reason)?;

        if f.alternate() {
            if let Some(visual) = &self.visual {
                return visual.display(f, self.name.as_deref(), self.help.as_deref());
            }
            if let Some(help) = &self.help {
                write!(f, "\n = help: {help}")?;
            }
        }

        Ok(())
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.reason == other.reason
            && self.help == other.help
            && self.name == other.name
    }
}

impl std::error::Error for Error {}

impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self {
        error_write()
    }
}
