//! Stache parser.
//!
//! Utilizes a Lexer to receive instances of Region, which it uses to construct
//! a new Template containing the Abstract Syntax Tree.
//!
//! Blocks are tracked with an explicit stack instead of recursion, so deeply
//! nested templates do not grow the call stack while compiling.
pub mod scope;
pub mod tree;

mod block;

use self::{
    block::BlockState,
    scope::Scope,
    tree::{Call, Expression, Literal, Output, Partial, PartialName, Tree},
};
use crate::{
    compile::{
        lex::{
            token::{Fault, Token},
            Lexer,
        },
        path::parse_path,
        Template,
    },
    region::Region,
    report::{
        error_eof, expected_close, ErrorKind, INVALID_SYNTAX, UNCLOSED_BLOCK, UNEXPECTED_BLOCK,
        UNEXPECTED_TOKEN,
    },
    Error, Number, Value,
};

/// The meaning of one `{{ ... }}` tag.
enum Tag {
    /// A tag that produces a [`Tree`] in the current scope.
    Tree(Tree),
    /// Opens a new block.
    Open(BlockState),
    /// Switches the innermost block to its inverse.
    Else,
    /// Switches the innermost block to its inverse, and opens a chained block
    /// inside of it.
    ElseChain(BlockState),
    /// Closes the innermost block, optionally naming it.
    Close(Option<Region>, Region),
}

pub struct Parser<'source> {
    /// Lexer used to pull from source as tokens instead of raw text.
    lexer: Lexer<'source>,
    /// Store peeked tokens.
    ///
    /// Double option is used to remember when the next token is None.
    buffer: Option<Option<(Token, Region)>>,
}

impl<'source> Parser<'source> {
    /// Create a new Parser from the given string.
    #[inline]
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
            buffer: None,
        }
    }

    /// Compile the template.
    ///
    /// Returns a new Template, which can be rendered with some data to receive
    /// output.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] with [`ErrorKind::Parse`] when the source contains
    /// invalid syntax, or blocks that are not closed properly.
    pub fn compile(self, name: Option<&str>) -> Result<Template, Error> {
        let source = self.lexer.source;

        self.compile_scope()
            .map(|scope| Template::new(name.map(str::to_owned), source.to_owned(), scope))
            .map_err(|error| match name {
                Some(name) => error.with_name(name),
                None => error,
            })
    }

    /// Parse the whole source into a [`Scope`].
    fn compile_scope(mut self) -> Result<Scope, Error> {
        let source = self.lexer.source;

        // Blocks that have been opened but not closed, innermost last.
        let mut blocks: Vec<BlockState> = vec![];

        // Contains the distinct Tree instances within a specific area of the source.
        //
        // There is always one more scope than open blocks, the first scope is the
        // template itself.
        let mut scopes: Vec<Scope> = vec![Scope::new()];

        while let Some(next) = self.next() {
            let tag = match next {
                (Token::Raw, region) => Tag::Tree(Tree::Raw(region)),
                (Token::Comment, _) => continue,
                (Token::BeginRaw, region) => self.parse_raw_output(region)?,
                (Token::BeginExpression, region) => self.parse_tag(region)?,
                (Token::Invalid(fault), region) => return Err(self.error_fault(fault, region)),
                (_, region) => {
                    return Err(self
                        .error(UNEXPECTED_TOKEN, region)
                        .with_help("expected raw text or the beginning of a tag"))
                }
            };

            match tag {
                Tag::Tree(tree) => push_tree(&mut scopes, tree),
                Tag::Open(state) => {
                    blocks.push(state);
                    scopes.push(Scope::new());
                }
                Tag::Else => self.switch_inverse(&mut blocks, &mut scopes, next.1)?,
                Tag::ElseChain(state) => {
                    self.switch_inverse(&mut blocks, &mut scopes, next.1)?;
                    blocks.push(state);
                    scopes.push(Scope::new());
                }
                Tag::Close(name, region) => loop {
                    let Some(state) = blocks.pop() else {
                        return Err(self
                            .error(UNEXPECTED_BLOCK, region)
                            .with_help("there is no open block to close here"));
                    };
                    let scope = scopes.pop().unwrap_or_default();

                    if state.chained {
                        push_tree(&mut scopes, state.finish(scope));
                        continue;
                    }
                    if let Some(name) = name {
                        let expected = state.name(source);
                        if name.literal(source) != expected {
                            return Err(self
                                .error(UNEXPECTED_BLOCK, name)
                                .with_help(expected_close(expected)));
                        }
                    }

                    push_tree(&mut scopes, state.finish(scope));
                    break;
                },
            }
        }

        if let Some(state) = blocks.iter().rev().find(|state| !state.chained) {
            return Err(self
                .error(UNCLOSED_BLOCK, state.region)
                .with_help(expected_close(state.name(source))));
        }

        Ok(scopes.pop().unwrap_or_default())
    }

    /// Move the innermost open block from its body to its inverse.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if there is no open block, or the block is already
    /// in its inverse.
    fn switch_inverse(
        &self,
        blocks: &mut [BlockState],
        scopes: &mut Vec<Scope>,
        region: Region,
    ) -> Result<(), Error> {
        let Some(state) = blocks.last_mut() else {
            return Err(self
                .error(UNEXPECTED_BLOCK, region)
                .with_help("`else` is only valid inside of a block"));
        };
        if state.body.is_some() {
            return Err(self.error(UNEXPECTED_BLOCK, region).with_help(format!(
                "the `{}` block already has an `else` branch",
                state.name(self.lexer.source)
            )));
        }

        state.body = Some(scopes.pop().unwrap_or_default());
        scopes.push(Scope::new());

        Ok(())
    }

    /// Parse a raw output tag, `{{{ body }}}` or `{{& body }}`.
    fn parse_raw_output(&mut self, begin: Region) -> Result<Tag, Error> {
        // The lexer pairs `{{{` with `}}}`, and `{{&` with `}}`.
        let end_token = if begin.literal(self.lexer.source).ends_with('{') {
            Token::EndRaw
        } else {
            Token::EndExpression
        };

        let call = self.parse_call()?;
        let (_, end) = self.next_must(end_token)?;

        Ok(Tag::Tree(Tree::Output(Output {
            call,
            escape: false,
            region: begin.combine(end),
        })))
    }

    /// Parse the tag following a `{{`.
    fn parse_tag(&mut self, begin: Region) -> Result<Tag, Error> {
        // {{#each people}}  {{^empty}}  {{else}}  {{else if x}}  {{/each}}
        // {{> header}}  {{ name }}
        match self.peek() {
            Some((Token::Hash, _)) => {
                self.next();
                let call = self.parse_block_head()?;
                let (_, end) = self.next_must(Token::EndExpression)?;

                Ok(Tag::Open(BlockState::new(
                    call,
                    false,
                    false,
                    begin.combine(end),
                )))
            }
            Some((Token::Caret, _)) => {
                self.next();
                if self.next_is(Token::EndExpression) {
                    self.next();
                    return Ok(Tag::Else);
                }

                let call = self.parse_block_head()?;
                if call.has_arguments() {
                    return Err(self
                        .error(INVALID_SYNTAX, call.region)
                        .with_help("an inverted block takes a single path, such as `{{^items}}`"));
                }
                let (_, end) = self.next_must(Token::EndExpression)?;

                Ok(Tag::Open(BlockState::new(
                    call,
                    true,
                    false,
                    begin.combine(end),
                )))
            }
            Some((Token::Else, _)) => {
                self.next();
                if self.next_is(Token::EndExpression) {
                    self.next();
                    return Ok(Tag::Else);
                }

                let call = self.parse_block_head()?;
                let (_, end) = self.next_must(Token::EndExpression)?;

                Ok(Tag::ElseChain(BlockState::new(
                    call,
                    false,
                    true,
                    begin.combine(end),
                )))
            }
            Some((Token::Slash, _)) => {
                self.next();
                let name = match self.peek() {
                    Some((Token::Path, region)) => {
                        self.next();
                        Some(region)
                    }
                    _ => None,
                };
                let (_, end) = self.next_must(Token::EndExpression)?;

                Ok(Tag::Close(name, begin.combine(end)))
            }
            Some((Token::Angle, _)) => {
                self.next();
                self.parse_partial(begin)
            }
            _ => {
                let call = self.parse_call()?;
                let (_, end) = self.next_must(Token::EndExpression)?;

                Ok(Tag::Tree(Tree::Output(Output {
                    call,
                    escape: true,
                    region: begin.combine(end),
                })))
            }
        }
    }

    /// Parse a partial tag, following the `>`.
    fn parse_partial(&mut self, begin: Region) -> Result<Tag, Error> {
        // {{> header }}  {{> "page header" person }}  {{> (layout) }}
        let name = match self.next_any_must()? {
            (Token::Path, region) => {
                PartialName::Static(region.literal(self.lexer.source).to_owned())
            }
            (Token::String, region) => PartialName::Static(self.parse_string(region)?),
            (Token::BeginGroup, region) => PartialName::Dynamic(Box::new(self.parse_group(region)?)),
            (Token::Invalid(fault), region) => return Err(self.error_fault(fault, region)),
            (_, region) => {
                return Err(self
                    .error(UNEXPECTED_TOKEN, region)
                    .with_help("expected the name of a partial, such as `{{> header}}`"))
            }
        };

        let context = if self.next_is(Token::EndExpression) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let (_, end) = self.next_must(Token::EndExpression)?;

        Ok(Tag::Tree(Tree::Partial(Partial {
            name,
            context,
            region: begin.combine(end),
        })))
    }

    /// Parse the head of a block, which must be a path or helper name.
    fn parse_block_head(&mut self) -> Result<Call, Error> {
        let call = self.parse_call()?;
        if !matches!(call.head, Expression::Path(_)) {
            return Err(self
                .error(INVALID_SYNTAX, call.head.get_region())
                .with_help("a block must begin with a helper name or a path"));
        }

        Ok(call)
    }

    /// Parse a Call.
    ///
    /// A call begins with a head, and is followed by any number of positional
    /// arguments and then any number of hash arguments.
    ///
    /// ```text
    /// link "home" url class="active"
    /// ```
    fn parse_call(&mut self) -> Result<Call, Error> {
        let head = self.parse_expression()?;
        let mut region = head.get_region();
        let mut arguments = vec![];
        let mut hash = vec![];

        loop {
            match self.peek() {
                Some((Token::EndExpression | Token::EndRaw | Token::EndGroup, _)) | None => break,
                _ => {}
            }

            let argument = self.parse_expression()?;
            if let Expression::Path(path) = &argument {
                if self.next_is(Token::Assign) {
                    let (_, assign) = self.next_must(Token::Assign)?;
                    let Some(key) = path.helper_name().map(str::to_owned) else {
                        return Err(self
                            .error(INVALID_SYNTAX, path.region.combine(assign))
                            .with_help("the name of a hash argument must be a plain identifier"));
                    };

                    let value = self.parse_expression()?;
                    region = region.combine(value.get_region());
                    hash.push((key, value));
                    continue;
                }
            }
            if !hash.is_empty() {
                return Err(self
                    .error(INVALID_SYNTAX, argument.get_region())
                    .with_help("positional arguments must come before hash arguments"));
            }

            region = region.combine(argument.get_region());
            arguments.push(argument);
        }

        Ok(Call {
            head,
            arguments,
            hash,
            region,
        })
    }

    /// Parse a subexpression, following the `(`.
    fn parse_group(&mut self, begin: Region) -> Result<Call, Error> {
        let mut call = self.parse_call()?;
        let (_, end) = self.next_must(Token::EndGroup)?;
        if call.helper_name().is_none() {
            return Err(self
                .error(INVALID_SYNTAX, call.head.get_region())
                .with_help("a subexpression must begin with the name of a helper"));
        }
        call.region = begin.combine(end);

        Ok(call)
    }

    /// Parse an Expression.
    ///
    /// An Expression may be a literal, a path or a subexpression.
    ///
    /// ```text
    /// "hello world"  -1000  10.2  true  null  person.name  (helper arg)
    /// ```
    fn parse_expression(&mut self) -> Result<Expression, Error> {
        let expression = match self.next_any_must()? {
            (Token::Path, region) => Expression::Path(parse_path(self.lexer.source, region)?),
            (Token::String, region) => Expression::Literal(Literal {
                value: Value::String(self.parse_string(region)?),
                region,
            }),
            (Token::Number, region) => Expression::Literal(self.parse_number_literal(region)?),
            (Token::True, region) => literal(Value::Bool(true), region),
            (Token::False, region) => literal(Value::Bool(false), region),
            (Token::Null, region) => literal(Value::Null, region),
            (Token::BeginGroup, region) => Expression::Call(Box::new(self.parse_group(region)?)),
            (Token::Invalid(fault), region) => return Err(self.error_fault(fault, region)),
            (token, region) => {
                return Err(self.error(UNEXPECTED_TOKEN, region).with_help(format!(
                    "expected a path, a literal or a subexpression, found {token}"
                )))
            }
        };

        Ok(expression)
    }

    /// Parse a String from the literal value of the given Region.
    ///
    /// # Errors
    ///
    /// Returns an error if an unrecognized escape character is found.
    fn parse_string(&self, region: Region) -> Result<String, Error> {
        let window = region.literal(self.lexer.source);
        let inner = window
            .get(1..window.len().saturating_sub(1))
            .unwrap_or_default();

        if !inner.contains('\\') {
            return Ok(inner.to_owned());
        }

        let mut string = String::with_capacity(inner.len());
        let mut iter = inner.chars();
        while let Some(c) = iter.next() {
            if c != '\\' {
                string.push(c);
                continue;
            }
            let escaped = match iter.next() {
                Some('n') => '\n',
                Some('r') => '\r',
                Some('t') => '\t',
                Some(c @ ('\\' | '"' | '\'')) => c,
                _ => {
                    return Err(self
                        .error("unexpected escape character", region)
                        .with_help("recognized escapes are `\\n`, `\\r`, `\\t`, `\\\\`, `\\\"` and `\\'`"))
                }
            };
            string.push(escaped);
        }

        Ok(string)
    }

    /// Parse a Literal containing a Value::Number from the given Region.
    ///
    /// # Errors
    ///
    /// Returns an error if the literal value of the Region cannot be converted
    /// to a Value::Number.
    fn parse_number_literal(&self, region: Region) -> Result<Literal, Error> {
        let number: Number = region.literal(self.lexer.source).parse().map_err(|_| {
            self.error("unrecognizable number", region).with_help(
                "numbers may begin with `-` to indicate a negative \
                number and must not end with a decimal",
            )
        })?;

        Ok(Literal {
            value: Value::Number(number),
            region,
        })
    }

    /// Return a parse [`Error`] with a pointer to the given [`Region`].
    fn error(&self, reason: &str, region: Region) -> Error {
        Error::with_kind(ErrorKind::Parse, reason).with_pointer(self.lexer.source, region)
    }

    /// Return a parse [`Error`] describing a [`Token::Invalid`].
    fn error_fault(&self, fault: Fault, region: Region) -> Error {
        self.error(INVALID_SYNTAX, region).with_help(fault.help())
    }

    /// Peek the next token.
    fn peek(&mut self) -> Option<(Token, Region)> {
        if let o @ None = &mut self.buffer {
            *o = Some(self.lexer.next());
        }

        self.buffer.flatten()
    }

    /// Get the next token.
    ///
    /// Prefers to pull a token from the internal buffer first, but will pull from
    /// the lexer when the buffer is empty.
    fn next(&mut self) -> Option<(Token, Region)> {
        match self.buffer.take() {
            Some(t) => t,
            None => self.lexer.next(),
        }
    }

    /// Returns true if the given token matches the upcoming token.
    fn next_is(&mut self, expect: Token) -> bool {
        self.peek().is_some_and(|(token, _)| token == expect)
    }

    /// Get the next token, and compare it to the given token.
    ///
    /// # Errors
    ///
    /// An error is returned if the next token does not match the given token,
    /// or when [next()] returns None.
    fn next_must(&mut self, expect: Token) -> Result<(Token, Region), Error> {
        match self.next_any_must()? {
            (token, region) if token == expect => Ok((token, region)),
            (Token::Invalid(fault), region) => Err(self.error_fault(fault, region)),
            (_, region) => Err(self
                .error(UNEXPECTED_TOKEN, region)
                .with_help(format!("expected {expect}"))),
        }
    }

    /// Get the next token.
    ///
    /// Similar to "next()" but requires that a token is returned.
    ///
    /// # Errors
    ///
    /// An error is returned if no more tokens are left.
    fn next_any_must(&mut self) -> Result<(Token, Region), Error> {
        self.next().ok_or_else(|| error_eof(self.lexer.source))
    }
}

/// Push the [`Tree`] into the innermost [`Scope`].
fn push_tree(scopes: &mut [Scope], tree: Tree) {
    if let Some(scope) = scopes.last_mut() {
        scope.data.push(tree);
    }
}

fn literal(value: Value, region: Region) -> Expression {
    Expression::Literal(Literal { value, region })
}

#[cfg(test)]
mod tests {
    use super::{
        tree::{Expression, PartialName, Tree},
        Parser,
    };
    use crate::{compile::lex::token::Token, report::ErrorKind, Value};

    fn helper_compile(text: &str) -> Vec<Tree> {
        Parser::new(text).compile(None).unwrap().scope.data
    }

    #[test]
    fn test_parser_lexer_integration() {
        let mut parser = Parser::new("hello");
        assert_eq!(parser.next(), Some((Token::Raw, (0..5).into())));
        assert_eq!(parser.next(), None);
    }

    #[test]
    fn test_peek_multiple() {
        let mut parser = Parser::new("{{ one two");
        assert!(parser.next().is_some());
        assert_eq!(parser.peek(), Some((Token::Path, (3..6).into())));
        assert_eq!(parser.peek(), Some((Token::Path, (3..6).into())));
    }

    #[test]
    fn test_parse_output_with_arguments() {
        let trees = helper_compile("{{ link \"home\" url class=\"active\" }}");
        let Tree::Output(output) = &trees[0] else {
            panic!("expected output");
        };

        assert!(output.escape);
        assert_eq!(output.call.helper_name(), Some("link"));
        assert_eq!(output.call.arguments.len(), 2);
        assert_eq!(output.call.hash[0].0, "class");
    }

    #[test]
    fn test_parse_raw_output() {
        let trees = helper_compile("{{{ body }}}{{& body }}");

        assert!(trees
            .iter()
            .all(|tree| matches!(tree, Tree::Output(output) if !output.escape)));
    }

    #[test]
    fn test_parse_comment_is_dropped() {
        let trees = helper_compile("a{{! note }}b");

        assert_eq!(trees.len(), 2);
    }

    #[test]
    fn test_parse_block_with_inverse() {
        let trees = helper_compile("{{#if ok}}yes{{else}}no{{/if}}");
        let Tree::Block(block) = &trees[0] else {
            panic!("expected block");
        };

        assert_eq!(block.body.data.len(), 1);
        assert_eq!(block.inverse.as_ref().map(|scope| scope.data.len()), Some(1));
    }

    #[test]
    fn test_parse_else_chain_nests() {
        let trees = helper_compile("{{#if a}}A{{else if b}}B{{else}}C{{/if}}");
        let Tree::Block(outer) = &trees[0] else {
            panic!("expected block");
        };
        let inverse = outer.inverse.as_ref().unwrap();
        let Tree::Block(inner) = &inverse.data[0] else {
            panic!("expected chained block");
        };

        assert_eq!(inner.call.helper_name(), Some("if"));
        assert!(inner.inverse.is_some());
    }

    #[test]
    fn test_parse_negated_block() {
        let trees = helper_compile("{{^items}}none{{/items}}");

        assert!(matches!(&trees[0], Tree::Block(block) if block.negated));
    }

    #[test]
    fn test_parse_partial() {
        let trees = helper_compile("{{> header person }}");
        let Tree::Partial(partial) = &trees[0] else {
            panic!("expected partial");
        };

        assert!(matches!(&partial.name, PartialName::Static(name) if name == "header"));
        assert!(matches!(partial.context, Some(Expression::Path(_))));
    }

    #[test]
    fn test_parse_literals() {
        let trees = helper_compile("{{eval 'it\\'s' -2.5 false}}");
        let Tree::Output(output) = &trees[0] else {
            panic!("expected output");
        };
        let values: Vec<_> = output
            .call
            .arguments
            .iter()
            .map(|argument| match argument {
                Expression::Literal(literal) => literal.value.clone(),
                _ => panic!("expected literal"),
            })
            .collect();

        assert_eq!(
            values,
            vec![Value::from("it's"), Value::from(-2.5), Value::from(false)]
        );
    }

    #[test]
    fn test_parse_subexpression() {
        let trees = helper_compile("{{outer (inner 1) 2}}");
        let Tree::Output(output) = &trees[0] else {
            panic!("expected output");
        };

        assert!(matches!(&output.call.arguments[0], Expression::Call(call) if call.helper_name() == Some("inner")));
    }

    #[test]
    fn test_error_mismatched_close() {
        let error = Parser::new("{{#each items}}{{/with}}")
            .compile(None)
            .unwrap_err();

        assert_eq!(error.kind(), &ErrorKind::Parse);
        assert_eq!(
            error.help(),
            Some("did you close the `each` block with `{{/each}}`?")
        );
    }

    #[test]
    fn test_unnamed_close() {
        assert!(Parser::new("{{#each items}}x{{/}}").compile(None).is_ok());
    }

    #[test]
    fn test_error_unclosed_block() {
        let error = Parser::new("{{#if a}}{{#each b}}{{/each}}")
            .compile(None)
            .unwrap_err();

        assert_eq!(error.reason(), "unclosed block");
    }

    #[test]
    fn test_error_close_without_open() {
        assert!(Parser::new("text{{/if}}").compile(None).is_err());
    }

    #[test]
    fn test_error_double_else() {
        assert!(Parser::new("{{#if a}}{{else}}{{else}}{{/if}}")
            .compile(None)
            .is_err());
    }

    #[test]
    fn test_error_unterminated_expression() {
        let error = Parser::new("hello {{ name").compile(None).unwrap_err();

        assert_eq!(error.reason(), "unexpected eof");
    }

    #[test]
    fn test_error_carries_name() {
        let error = Parser::new("{{#if a}}").compile(Some("page")).unwrap_err();

        assert_eq!(error.name(), Some("page"));
    }
}
