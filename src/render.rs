mod frame;
mod resolve;
mod truthy;

pub use self::{
    frame::{Frame, Iteration},
    resolve::{resolve, resolve_segment, Missing},
    truthy::is_truthy,
};

use crate::{
    compile::{
        tree::{Block, Call, Expression, Output, Partial, PartialName, Tree},
        Path, Scope, Template,
    },
    helper::{Arguments, Options},
    report::{
        error_missing_helper, error_missing_partial, error_recursion, error_undefined,
        error_write,
    },
    Engine, Error, Pipe, Unresolved, Value,
};
use serde::Serialize;
use std::{borrow::Cow, cell::Cell, collections::HashMap, fmt::Write};

/// Render a [`Template`] with the given data.
///
/// Provides a shortcut to quickly render a `Template` without creating
/// an `Engine`. Only the built-in helpers are available.
///
/// # Errors
///
/// Returns an [`Error`] if the data cannot be serialized, or rendering fails.
///
/// # Examples
///
/// ```
/// use stache::{compile, render};
/// use serde_json::json;
///
/// let template = compile("hello, {{ name }}!").unwrap();
/// let result = render(&template, &json!({"name": "taylor"}));
///
/// assert_eq!(result.unwrap(), "hello, taylor!");
/// ```
pub fn render<T>(template: &Template, data: &T) -> Result<String, Error>
where
    T: Serialize + ?Sized,
{
    Engine::default().render(template, data)
}

/// Walks the Abstract Syntax Tree of a [`Template`] and writes its output.
///
/// A Renderer lives for one render call. It holds nothing but the [`Engine`]
/// and the current partial depth, so templates stay immutable.
pub struct Renderer<'engine> {
    /// An engine containing any registered helpers and templates.
    engine: &'engine Engine,
    /// Number of partials currently entered.
    depth: Cell<usize>,
}

impl<'engine> Renderer<'engine> {
    /// Create a new Renderer.
    pub fn new(engine: &'engine Engine) -> Self {
        Self {
            engine,
            depth: Cell::new(0),
        }
    }

    /// Render the whole [`Template`] against the given frame.
    pub fn render_template(
        &self,
        template: &Template,
        frame: &Frame,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        self.render_scope(template, &template.scope, frame, pipe)
            .map_err(|error| match template.name() {
                Some(name) => error.with_name(name),
                None => error,
            })
    }

    /// Render each [`Tree`] in the [`Scope`].
    pub(crate) fn render_scope(
        &self,
        template: &Template,
        scope: &Scope,
        frame: &Frame,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        for tree in &scope.data {
            match tree {
                Tree::Raw(region) => pipe
                    .write_str(region.literal(&template.source))
                    .map_err(|_| error_write())?,
                Tree::Output(output) => self
                    .render_output(template, output, frame, pipe)
                    .map_err(|error| error.with_pointer(&template.source, output.region))?,
                Tree::Block(block) => self
                    .render_block(template, block, frame, pipe)
                    .map_err(|error| error.with_pointer(&template.source, block.region))?,
                Tree::Partial(partial) => self
                    .render_partial(template, partial, frame, pipe)
                    .map_err(|error| error.with_pointer(&template.source, partial.region))?,
            }
        }

        Ok(())
    }

    /// Render an Output.
    ///
    /// A registered helper is called and writes its own output. Otherwise the
    /// head is evaluated and its text form is written through the channel the
    /// tag asks for.
    fn render_output(
        &self,
        template: &Template,
        output: &Output,
        frame: &Frame,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        let call = &output.call;
        if let Some(helper) = call.helper_name().and_then(|name| self.engine.get_helper(name)) {
            let arguments = self.eval_arguments(template, call, frame)?;
            return helper
                .call(pipe, frame.value(), &arguments)
                .map_err(|error| error.with_pointer(&template.source, call.region));
        }
        if call.has_arguments() {
            return Err(self.error_missing_helper(template, call));
        }

        let value = match &call.head {
            Expression::Path(path) => match resolve(path, frame) {
                Ok(value) => value,
                Err(missing) => return self.render_unresolved(template, path, missing, pipe),
            },
            head => self.eval_expression(template, head, frame)?,
        };

        let written = if output.escape {
            pipe.write_value(&value)
        } else {
            pipe.write_value_raw(&value)
        };

        written.map_err(|_| error_write())
    }

    /// Handle a path that did not resolve, following the configured policy.
    fn render_unresolved(
        &self,
        template: &Template,
        path: &Path,
        missing: Missing,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        match &self.engine.config().unresolved {
            Unresolved::Empty => Ok(()),
            Unresolved::Format(format) => pipe
                .write_str(&format.replace("{0}", path.last_segment(&template.source)))
                .map_err(|_| error_write()),
            Unresolved::Throw => Err(error_undefined(&path.dotted(), &missing.key)
                .with_pointer(&template.source, path.region)),
        }
    }

    /// Render a Block.
    fn render_block(
        &self,
        template: &Template,
        block: &Block,
        frame: &Frame,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        let call = &block.call;
        if block.negated {
            // {{^x}}B{{else}}A{{/x}} behaves like {{#x}}A{{else}}B{{/x}}.
            let value = self.eval_expression(template, &call.head, frame)?;
            return match &block.inverse {
                Some(inverse) if is_entered(&value) => {
                    self.render_section(template, inverse, &value, frame, pipe)
                }
                None if is_entered(&value) => Ok(()),
                _ => self.render_scope(template, &block.body, frame, pipe),
            };
        }

        if let Some(helper) = call
            .helper_name()
            .and_then(|name| self.engine.get_block_helper(name))
        {
            let arguments = self.eval_arguments(template, call, frame)?;
            let options = Options {
                renderer: self,
                template,
                block,
                frame,
                hash: arguments.hash(),
            };
            return helper
                .call(pipe, &options, frame.value(), &arguments)
                .map_err(|error| error.with_pointer(&template.source, call.region));
        }
        if call.has_arguments() {
            return Err(self.error_missing_helper(template, call));
        }

        let value = self.eval_expression(template, &call.head, frame)?;
        if is_entered(&value) {
            self.render_section(template, &block.body, &value, frame, pipe)
        } else {
            self.render_inverse(template, block, frame, pipe)
        }
    }

    /// Render the scope of a block headed by a plain path.
    ///
    /// Sequences and mappings are iterated, `true` keeps the current context,
    /// and any other value becomes the context of the scope.
    fn render_section(
        &self,
        template: &Template,
        scope: &Scope,
        value: &Value,
        frame: &Frame,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let iteration = Iteration::new(Value::from(index as u64), index, items.len());
                    let frame = frame.item(item, iteration);
                    self.render_scope(template, scope, &frame, pipe)?;
                }
                Ok(())
            }
            Value::Map(map) => {
                for (index, (key, item)) in map.iter().enumerate() {
                    let iteration = Iteration::new(key.to_value(), index, map.len());
                    let frame = frame.item(item, iteration);
                    self.render_scope(template, scope, &frame, pipe)?;
                }
                Ok(())
            }
            Value::Bool(true) => self.render_scope(template, scope, frame, pipe),
            value => {
                let frame = frame.child(value);
                self.render_scope(template, scope, &frame, pipe)
            }
        }
    }

    /// Render the inverse of a Block, if it has one.
    fn render_inverse(
        &self,
        template: &Template,
        block: &Block,
        frame: &Frame,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        match &block.inverse {
            Some(inverse) => self.render_scope(template, inverse, frame, pipe),
            None => Ok(()),
        }
    }

    /// Render a Partial.
    ///
    /// The partial is looked up in the engine first, then through the
    /// external resolver. A context expression makes its value the context
    /// of the partial.
    fn render_partial(
        &self,
        template: &Template,
        partial: &Partial,
        frame: &Frame,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        let name = match &partial.name {
            PartialName::Static(name) => Cow::Borrowed(name.as_str()),
            PartialName::Dynamic(call) => {
                Cow::Owned(self.eval_call(template, call, frame)?.to_text().into_owned())
            }
        };

        let Some(included) = self.engine.resolve_partial(&name) else {
            if self.engine.config().tolerate_missing_partials {
                log::trace!("partial `{name}` not found, rendering nothing");
                return Ok(());
            }
            return Err(error_missing_partial(&name));
        };
        log::trace!("including partial `{name}`");

        let context = partial
            .context
            .as_ref()
            .map(|expression| self.eval_expression(template, expression, frame))
            .transpose()?;

        // Only errors raised inside the partial are named after it, the
        // limit itself is reported at the inclusion.
        self.descend(|| {
            match &context {
                Some(value) => {
                    let frame = frame.child(value);
                    self.render_template(&included, &frame, pipe)
                }
                None => self.render_template(&included, frame, pipe),
            }
            .map_err(|error| error.with_name(name.as_ref()))
        })
    }

    /// Evaluate an Expression.
    ///
    /// Paths that do not resolve evaluate to [`Value::Null`], and
    /// subexpressions to the text their helper wrote.
    fn eval_expression<'a>(
        &self,
        template: &'a Template,
        expression: &'a Expression,
        frame: &'a Frame<'a>,
    ) -> Result<Cow<'a, Value>, Error> {
        let value = match expression {
            Expression::Literal(literal) => Cow::Borrowed(&literal.value),
            Expression::Path(path) => resolve(path, frame).unwrap_or(Cow::Owned(Value::Null)),
            Expression::Call(call) => Cow::Owned(self.eval_call(template, call, frame)?),
        };

        Ok(value)
    }

    /// Evaluate a subexpression.
    fn eval_call(&self, template: &Template, call: &Call, frame: &Frame) -> Result<Value, Error> {
        let Some(helper) = call.helper_name().and_then(|name| self.engine.get_helper(name)) else {
            return Err(self.error_missing_helper(template, call));
        };

        let arguments = self.eval_arguments(template, call, frame)?;
        let mut buffer = String::new();
        helper
            .call(&mut Pipe::new(&mut buffer), frame.value(), &arguments)
            .map_err(|error| error.with_pointer(&template.source, call.region))?;

        Ok(Value::String(buffer))
    }

    /// Evaluate the positional and hash arguments of a Call.
    fn eval_arguments(
        &self,
        template: &Template,
        call: &Call,
        frame: &Frame,
    ) -> Result<Arguments, Error> {
        let positional = call
            .arguments
            .iter()
            .map(|argument| {
                self.eval_expression(template, argument, frame)
                    .map(Cow::into_owned)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut hash = HashMap::with_capacity(call.hash.len());
        for (name, argument) in &call.hash {
            let value = self.eval_expression(template, argument, frame)?;
            hash.insert(name.clone(), value.into_owned());
        }

        Ok(Arguments::new(positional, hash))
    }

    /// Run the closure one partial inclusion deeper.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] without running the closure if the configured
    /// recursion limit would be exceeded.
    fn descend<F>(&self, f: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        let limit = self.engine.config().recursion_limit;
        let depth = self.depth.get() + 1;
        if depth > limit {
            return Err(error_recursion(limit));
        }

        self.depth.set(depth);
        let result = f();
        self.depth.set(depth - 1);

        result
    }

    fn error_missing_helper(&self, template: &Template, call: &Call) -> Error {
        error_missing_helper(call.head.get_region().literal(&template.source))
            .with_pointer(&template.source, call.head.get_region())
    }
}

/// Return true if a block headed by a plain path renders its scope for the
/// value, rather than the inverse.
///
/// Mappings are always truthy, but an empty one has nothing to iterate.
fn is_entered(value: &Value) -> bool {
    match value {
        Value::Map(map) => !map.is_empty(),
        value => is_truthy(value),
    }
}
