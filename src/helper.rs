//! Contains the `Helper` and `BlockHelper` traits and other types useful for
//! creating and using helpers.
//!
//! A helper is any type which implements [`Helper`] or [`BlockHelper`]. You
//! can register a helper with an [`Engine`][`crate::Engine`] through
//! [`register_helper`][`crate::Engine::register_helper`] or
//! [`register_block_helper`][`crate::Engine::register_block_helper`], and it
//! will be available in any [`Template`][`crate::Template`] rendered by that
//! engine, including templates compiled before the helper was registered.
//!
//! Given this expression:
//!
//! ```html
//! {{ link "home" url class="active" }}
//! ```
//!
//! Stache will search the engine for a helper named "link" and call it with
//! two positional arguments, the literal "home" and whatever "url" resolves
//! to, and one hash argument named "class".
//!
//! A plain helper writes its output to a [`Pipe`]. Text written through
//! [`std::fmt::Write`] is not escaped, use [`Pipe::write_escaped`] for text
//! that should be.
//!
//! # Examples
//!
//! You can either create a struct and implement the trait on that, or just
//! create a function matching the trait signature. Stache will accept both.
//!
//! ```rust
//! use stache::{Arguments, Engine, Error, Pipe, Value};
//! use std::fmt::Write;
//!
//! fn shout(pipe: &mut Pipe, _: &Value, arguments: &Arguments) -> Result<(), Error> {
//!     let Some(text) = arguments.get(0).and_then(Value::as_str) else {
//!         return Err(Error::build("helper `shout` requires string input")
//!             .with_help("use quotes to coerce data to string"));
//!     };
//!     write!(pipe, "{}!", text.to_uppercase())?;
//!
//!     Ok(())
//! }
//!
//! let engine = Engine::default().with_helper("shout", shout);
//! let template = engine.compile("{{ shout name }}").unwrap();
//! let result = engine.render(&template, &serde_json::json!({"name": "taylor"}));
//!
//! assert_eq!(result.unwrap(), "TAYLOR!");
//! ```
//!
//! If you return an [`Error`] from your helper without setting your own
//! visualization, Stache will generate one that points to the tag that called
//! the helper.
pub(crate) mod builtin;

pub use self::builtin::FacadeLogger;

use crate::{
    compile::{tree::Block, Template},
    render::{Frame, Iteration, Renderer},
    Error, Pipe, Value,
};
use log::Level;
use std::collections::HashMap;

/// Describes a type which can be called from an expression to produce output.
pub trait Helper: Send + Sync {
    /// Execute the helper with the current context and the evaluated
    /// arguments, writing output to the pipe.
    fn call(&self, pipe: &mut Pipe, context: &Value, arguments: &Arguments) -> Result<(), Error>;
}

/// Allows assignment of any function matching the signature of `call` as a
/// `Helper`, instead of requiring a struct be created.
impl<F> Helper for F
where
    F: Fn(&mut Pipe, &Value, &Arguments) -> Result<(), Error> + Send + Sync,
{
    fn call(&self, pipe: &mut Pipe, context: &Value, arguments: &Arguments) -> Result<(), Error> {
        self(pipe, context, arguments)
    }
}

/// Describes a type which controls the rendering of a block.
///
/// The block helper decides whether the body or the inverse is rendered, how
/// many times, and against which context, with the [`Options`] it receives.
pub trait BlockHelper: Send + Sync {
    /// Execute the block helper.
    fn call(
        &self,
        pipe: &mut Pipe,
        options: &Options,
        context: &Value,
        arguments: &Arguments,
    ) -> Result<(), Error>;
}

impl<F> BlockHelper for F
where
    F: Fn(&mut Pipe, &Options, &Value, &Arguments) -> Result<(), Error> + Send + Sync,
{
    fn call(
        &self,
        pipe: &mut Pipe,
        options: &Options,
        context: &Value,
        arguments: &Arguments,
    ) -> Result<(), Error> {
        self(pipe, options, context, arguments)
    }
}

/// The evaluated arguments of a helper call.
///
/// Arguments that refer to data which does not exist are [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    hash: HashMap<String, Value>,
}

impl Arguments {
    /// Create a new set of [`Arguments`].
    pub fn new(positional: Vec<Value>, hash: HashMap<String, Value>) -> Self {
        Self { positional, hash }
    }

    /// Return the number of positional arguments.
    #[inline]
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Return true if there are no positional arguments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    /// Return the positional argument at the given index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Return all positional arguments in order.
    #[inline]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Return the hash argument with the given name.
    #[inline]
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.hash.get(name)
    }

    /// Return all hash arguments.
    #[inline]
    pub fn hash(&self) -> &HashMap<String, Value> {
        &self.hash
    }
}

/// Gives a [`BlockHelper`] control over the body and inverse of its block.
pub struct Options<'render> {
    pub(crate) renderer: &'render Renderer<'render>,
    pub(crate) template: &'render Template,
    pub(crate) block: &'render Block,
    pub(crate) frame: &'render Frame<'render>,
    pub(crate) hash: &'render HashMap<String, Value>,
}

impl Options<'_> {
    /// Render the body against the current context.
    pub fn render(&self, pipe: &mut Pipe) -> Result<(), Error> {
        self.renderer
            .render_scope(self.template, &self.block.body, self.frame, pipe)
    }

    /// Render the body against a new context.
    ///
    /// The current context becomes the parent, reachable with `../`.
    pub fn render_with(&self, pipe: &mut Pipe, context: &Value) -> Result<(), Error> {
        let frame = self.frame.child(context);
        self.renderer
            .render_scope(self.template, &self.block.body, &frame, pipe)
    }

    /// Render the body against one entry of an iteration, making `@index`,
    /// `@key`, `@first` and `@last` available to it.
    pub fn render_item(
        &self,
        pipe: &mut Pipe,
        context: &Value,
        iteration: Iteration,
    ) -> Result<(), Error> {
        let frame = self.frame.item(context, iteration);
        self.renderer
            .render_scope(self.template, &self.block.body, &frame, pipe)
    }

    /// Render the inverse against the current context.
    ///
    /// Renders nothing if the block has no `else` branch.
    pub fn inverse(&self, pipe: &mut Pipe) -> Result<(), Error> {
        match &self.block.inverse {
            Some(inverse) => self
                .renderer
                .render_scope(self.template, inverse, self.frame, pipe),
            None => Ok(()),
        }
    }

    /// Render the inverse against a new context.
    pub fn inverse_with(&self, pipe: &mut Pipe, context: &Value) -> Result<(), Error> {
        match &self.block.inverse {
            Some(inverse) => {
                let frame = self.frame.child(context);
                self.renderer
                    .render_scope(self.template, inverse, &frame, pipe)
            }
            None => Ok(()),
        }
    }

    /// Return true if the block has an `else` branch.
    #[inline]
    pub fn has_inverse(&self) -> bool {
        self.block.inverse.is_some()
    }

    /// Return the context the block was opened in.
    #[inline]
    pub fn context(&self) -> &Value {
        self.frame.value()
    }

    /// Return the hash arguments of the block.
    #[inline]
    pub fn hash(&self) -> &HashMap<String, Value> {
        self.hash
    }
}

/// A sink for messages written by the `log` helper.
pub trait Logger: Send + Sync {
    /// Record one message.
    fn log(&self, level: Level, message: &str);
}
