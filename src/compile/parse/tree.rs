use crate::{
    compile::{path::Path, Scope},
    region::Region,
    Value,
};

/// A node of the compiled Abstract Syntax Tree.
#[derive(Debug, Clone)]
pub enum Tree {
    /// Raw text, written as it is.
    Raw(Region),
    /// An expression such as `{{ name }}` or `{{{ body }}}`.
    Output(Output),
    /// A block such as `{{#each people}} ... {{/each}}`.
    Block(Block),
    /// A partial inclusion such as `{{> header }}`.
    Partial(Partial),
}

/// Renders the result of a [`Call`].
#[derive(Debug, Clone)]
pub struct Output {
    /// The expression inside the tag.
    pub call: Call,
    /// True when the output is written through the escaped channel.
    pub escape: bool,
    /// Area of the whole tag.
    pub region: Region,
}

/// A block with a body and an optional inverse.
///
/// An `else NAME` chain is represented as a [`Block`] placed inside the
/// inverse of the block before it.
#[derive(Debug, Clone)]
pub struct Block {
    /// The head of the block, either a helper or a path.
    pub call: Call,
    /// True for blocks opened with `{{^`.
    pub negated: bool,
    /// Rendered when the block is entered.
    pub body: Scope,
    /// Rendered by the `else` branch.
    pub inverse: Option<Scope>,
    /// Area of the opening tag.
    pub region: Region,
}

/// Includes another template.
#[derive(Debug, Clone)]
pub struct Partial {
    /// Name of the included template.
    pub name: PartialName,
    /// Optional new context for the included template.
    pub context: Option<Expression>,
    /// Area of the whole tag.
    pub region: Region,
}

/// The name of a [`Partial`].
#[derive(Debug, Clone)]
pub enum PartialName {
    /// A name known at compile time, `{{> header }}` or `{{> "page header" }}`.
    Static(String),
    /// A name computed by a subexpression, `{{> (layout) }}`.
    Dynamic(Box<Call>),
}

/// A head followed by positional and hash arguments.
///
/// `{{ link "home" url class="active" }}`
#[derive(Debug, Clone)]
pub struct Call {
    /// The helper name, path or literal that begins the call.
    pub head: Expression,
    /// Positional arguments in source order.
    pub arguments: Vec<Expression>,
    /// Hash arguments in source order.
    pub hash: Vec<(String, Expression)>,
    /// Area of the call.
    pub region: Region,
}

impl Call {
    /// Return the helper name this call could refer to.
    pub fn helper_name(&self) -> Option<&str> {
        match &self.head {
            Expression::Path(path) => path.helper_name(),
            _ => None,
        }
    }

    /// Return true if the call received any arguments.
    pub fn has_arguments(&self) -> bool {
        !self.arguments.is_empty() || !self.hash.is_empty()
    }
}

/// A value inside of a tag.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A literal value, `"text"`, `10`, `true` or `null`.
    Literal(Literal),
    /// A reference into the context stack.
    Path(Path),
    /// A subexpression `(helper arguments)`.
    Call(Box<Call>),
}

impl Expression {
    /// Return the [`Region`] of the expression.
    pub fn get_region(&self) -> Region {
        match self {
            Expression::Literal(literal) => literal.region,
            Expression::Path(path) => path.region,
            Expression::Call(call) => call.region,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone)]
pub struct Literal {
    /// The value.
    pub value: Value,
    /// Location of the literal in source.
    pub region: Region,
}
