use super::Scope;

/// A compiled [`Template`] that can be rendered with any serializable data.
///
/// A `Template` owns its source text and the Abstract Syntax Tree generated
/// during compilation. It holds no state between renders, so a single
/// `Template` may be rendered concurrently from many threads.
#[derive(Debug, Clone)]
pub struct Template {
    /// The name of the [`Template`].
    pub(crate) name: Option<String>,
    /// The source data from which this [`Template`] was generated.
    pub(crate) source: String,
    /// The Abstract Syntax Tree generated during compilation.
    pub(crate) scope: Scope,
}

impl Template {
    /// Create a new [`Template`].
    pub(crate) fn new(name: Option<String>, source: String, scope: Scope) -> Self {
        Self {
            name,
            source,
            scope,
        }
    }

    /// Return the name of the [`Template`], if it has one.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return the source text of the [`Template`].
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }
}
