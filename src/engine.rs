use crate::{
    compile::{Parser, Template},
    helper::{
        builtin::{builtin_helpers, LoggerSlot, Registered},
        BlockHelper, Helper, Logger,
    },
    render::{Frame, Renderer},
    report::{error_missing_template, error_write},
    to_value, Config, Error, Pipe, Value,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::{collections::HashMap, fmt::Write, sync::Arc};

/// Looks up templates the [`Engine`] does not know about, such as templates
/// stored on disk.
///
/// The resolver is consulted for partials after the templates registered
/// with [`Engine::register_template`].
///
/// # Examples
///
/// ```
/// use stache::{compile, Engine, Template};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// fn footer(name: &str) -> Option<Arc<Template>> {
///     (name == "footer").then(|| Arc::new(compile("(c) {{year}}").unwrap()))
/// }
///
/// let engine = Engine::default().with_resolver(footer);
/// let template = engine.compile("{{> footer}}").unwrap();
///
/// assert_eq!(engine.render(&template, &json!({"year": 2024})).unwrap(), "(c) 2024");
/// ```
pub trait Resolver: Send + Sync {
    /// Return the template with the given name, if any.
    fn resolve(&self, name: &str) -> Option<Arc<Template>>;
}

impl<F> Resolver for F
where
    F: Fn(&str) -> Option<Arc<Template>> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<Arc<Template>> {
        self(name)
    }
}

/// Facilitates compiling and rendering templates, and provides storage
/// for helpers and templates.
///
/// Registration takes `&self`, so an `Engine` can be shared between threads
/// and extended while renders are running. A render observes the helpers
/// that were registered when it looked them up.
pub struct Engine {
    /// Settings used when rendering.
    config: Config,
    /// Helpers that this engine is aware of.
    helpers: RwLock<HashMap<String, Registered>>,
    /// Templates that this engine is aware of.
    templates: RwLock<HashMap<String, Arc<Template>>>,
    /// Source of templates that are not registered.
    resolver: Option<Box<dyn Resolver>>,
    /// Sink read by the built-in `log` helper.
    logger: LoggerSlot,
}

impl Engine {
    /// Create a new [`Engine`] with the given [`Config`].
    ///
    /// The built-in helpers `if`, `unless`, `each`, `with`, `lookup` and `log`
    /// are registered, and may be replaced.
    pub fn new(config: Config) -> Self {
        let logger = LoggerSlot::default();
        let helpers = builtin_helpers(Arc::clone(&logger), config.log_level)
            .into_iter()
            .map(|(name, helper)| (name.to_owned(), helper))
            .collect();

        Self {
            config,
            helpers: RwLock::new(helpers),
            templates: RwLock::new(HashMap::new()),
            resolver: None,
            logger,
        }
    }

    /// Return the [`Config`] of the [`Engine`].
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set the [`Resolver`] consulted for unknown partials.
    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));

        self
    }

    /// Set the sink that the built-in `log` helper writes to.
    ///
    /// A `log` helper registered by the caller is left in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::{Engine, FacadeLogger};
    ///
    /// let engine = Engine::default().with_logger(FacadeLogger);
    /// ```
    pub fn with_logger(self, logger: impl Logger + 'static) -> Self {
        *self.logger.write() = Some(Arc::new(logger));

        self
    }

    /// Register the helper and return the [`Engine`].
    #[inline]
    pub fn with_helper(self, name: &str, helper: impl Helper + 'static) -> Self {
        self.register_helper(name, helper);

        self
    }

    /// Register the block helper and return the [`Engine`].
    #[inline]
    pub fn with_block_helper(self, name: &str, helper: impl BlockHelper + 'static) -> Self {
        self.register_block_helper(name, helper);

        self
    }

    /// Register a [`Helper`] with the given name.
    ///
    /// A helper or block helper already registered with the name is replaced.
    pub fn register_helper(&self, name: &str, helper: impl Helper + 'static) {
        log::debug!("registering helper `{name}`");
        self.helpers
            .write()
            .insert(name.to_owned(), Registered::Helper(Arc::new(helper)));
    }

    /// Register a [`BlockHelper`] with the given name.
    ///
    /// A helper or block helper already registered with the name is replaced.
    pub fn register_block_helper(&self, name: &str, helper: impl BlockHelper + 'static) {
        log::debug!("registering block helper `{name}`");
        self.helpers
            .write()
            .insert(name.to_owned(), Registered::Block(Arc::new(helper)));
    }

    /// Return the [`Helper`] with the given name.
    pub fn get_helper(&self, name: &str) -> Option<Arc<dyn Helper>> {
        match self.helpers.read().get(name)? {
            Registered::Helper(helper) => Some(Arc::clone(helper)),
            Registered::Block(_) => None,
        }
    }

    /// Return the [`BlockHelper`] with the given name.
    pub fn get_block_helper(&self, name: &str) -> Option<Arc<dyn BlockHelper>> {
        match self.helpers.read().get(name)? {
            Registered::Block(helper) => Some(Arc::clone(helper)),
            Registered::Helper(_) => None,
        }
    }

    /// Compile a new [`Template`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Engine;
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile("hello, {{ name }}!");
    /// assert!(template.is_ok());
    /// ```
    #[inline]
    pub fn compile(&self, text: &str) -> Result<Template, Error> {
        log::debug!("compiling template of {} bytes", text.len());
        Parser::new(text).compile(None)
    }

    /// Compile and store a new [`Template`] with the given name.
    ///
    /// The template is available to other templates as a partial, and through
    /// [`render_named`][`Engine::render_named`]. A template already stored with
    /// the name is replaced.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Engine;
    ///
    /// let engine = Engine::default();
    /// let result = engine.register_template("greeting", "hello, {{ name }}!");
    /// assert!(result.is_ok());
    /// ```
    pub fn register_template(&self, name: &str, text: &str) -> Result<(), Error> {
        log::debug!("registering template `{name}`");
        let template = Parser::new(text).compile(Some(name))?;
        self.templates
            .write()
            .insert(name.to_owned(), Arc::new(template));

        Ok(())
    }

    /// Return the registered [`Template`] with the given name.
    pub fn get_template(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.read().get(name).cloned()
    }

    /// Render a [`Template`] with the given data.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the data cannot be serialized, a helper returns
    /// an `Error` itself, or the template cannot be rendered for a reason that
    /// will be described by the `Error`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Engine;
    /// use serde_json::json;
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile("hello, {{ name }}!").unwrap();
    /// let result = engine.render(&template, &json!({"name": "taylor"}));
    ///
    /// assert_eq!(result.unwrap(), "hello, taylor!");
    /// ```
    pub fn render<T>(&self, template: &Template, data: &T) -> Result<String, Error>
    where
        T: Serialize + ?Sized,
    {
        self.render_value(template, &to_value(data)?)
    }

    /// Render a [`Template`] with a [`Value`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if rendering fails.
    pub fn render_value(&self, template: &Template, value: &Value) -> Result<String, Error> {
        let mut buffer = String::with_capacity(template.source().len());
        let frame = Frame::new(value);
        Renderer::new(self).render_template(template, &frame, &mut Pipe::new(&mut buffer))?;

        Ok(buffer)
    }

    /// Render a [`Template`] into the given sink.
    ///
    /// Output is written to the sink only when the whole render succeeds.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if rendering fails, or the sink refuses the output.
    pub fn render_to<T, W>(&self, template: &Template, data: &T, sink: &mut W) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
        W: Write + ?Sized,
    {
        let output = self.render(template, data)?;
        sink.write_str(&output).map_err(|_| error_write())
    }

    /// Render the registered [`Template`] with the given name.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if no template is registered with the name, or
    /// rendering fails.
    pub fn render_named<T>(&self, name: &str, data: &T) -> Result<String, Error>
    where
        T: Serialize + ?Sized,
    {
        let template = self
            .get_template(name)
            .ok_or_else(|| error_missing_template(name))?;

        self.render(&template, data)
    }

    /// Find the template that a partial refers to.
    pub(crate) fn resolve_partial(&self, name: &str) -> Option<Arc<Template>> {
        self.get_template(name).or_else(|| {
            self.resolver
                .as_ref()
                .and_then(|resolver| resolver.resolve(name))
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::{Arguments, Error, ErrorKind, Pipe, Value};
    use serde_json::json;
    use std::fmt::Write;

    fn first(pipe: &mut Pipe, _: &Value, _: &Arguments) -> Result<(), Error> {
        write!(pipe, "first")?;
        Ok(())
    }

    fn second(pipe: &mut Pipe, _: &Value, _: &Arguments) -> Result<(), Error> {
        write!(pipe, "second")?;
        Ok(())
    }

    #[test]
    fn test_helper_registered_after_compile() {
        let engine = Engine::default();
        let template = engine.compile("{{greet}}").unwrap();
        engine.register_helper("greet", first);

        assert_eq!(engine.render(&template, &json!({})).unwrap(), "first");
    }

    #[test]
    fn test_helper_replaced() {
        let engine = Engine::default().with_helper("greet", first);
        engine.register_helper("greet", second);
        let template = engine.compile("{{greet}}").unwrap();

        assert_eq!(engine.render(&template, &json!({})).unwrap(), "second");
    }

    #[test]
    fn test_builtin_overridden() {
        let engine = Engine::default().with_helper("lookup", first);
        let template = engine.compile("{{lookup a b}}").unwrap();

        assert_eq!(engine.render(&template, &json!({})).unwrap(), "first");
        assert!(engine.get_block_helper("lookup").is_none());
    }

    #[test]
    fn test_render_named_missing() {
        let error = Engine::default()
            .render_named("nope", &json!({}))
            .unwrap_err();

        assert_eq!(
            error.kind(),
            &ErrorKind::PartialNotFound {
                name: "nope".into()
            }
        );
    }

    #[test]
    fn test_render_to_is_atomic() {
        let engine = Engine::default();
        let template = engine.compile("before {{missing 1}} after").unwrap();
        let mut sink = String::new();

        assert!(engine.render_to(&template, &json!({}), &mut sink).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_register_template_error_carries_name() {
        let error = Engine::default()
            .register_template("broken", "{{#if a}}")
            .unwrap_err();

        assert_eq!(error.name(), Some("broken"));
    }
}
