use std::fmt::Display;

/// Types emitted by the Lexer.
///
/// An abstraction over raw text to make construction of Tree types easier.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Token {
    /// Raw text.
    Raw,
    /// A complete comment, `{{! }}` or `{{!-- --}}`.
    Comment,
    /// Beginning of an escaped expression, `{{`.
    BeginExpression,
    /// Beginning of a raw expression, `{{{` or `{{&`.
    BeginRaw,
    /// End of an expression, `}}`.
    EndExpression,
    /// End of a triple-stash expression, `}}}`.
    EndRaw,
    /// #
    Hash,
    /// ^
    Caret,
    /// /
    Slash,
    /// >
    Angle,
    /// =
    Assign,
    /// (
    BeginGroup,
    /// )
    EndGroup,
    /// String literal within a tag.
    String,
    /// Number within a tag.
    Number,
    /// Path (unquoted name, possibly dotted) within a tag.
    Path,
    /// A boolean true.
    True,
    /// A boolean false.
    False,
    /// `null` or `undefined`.
    Null,
    /// The `else` keyword.
    Else,
    /// Whitespace within a tag.
    Whitespace,
    /// Text the Lexer could not make sense of.
    Invalid(Fault),
}

/// Describes why the Lexer emitted [`Token::Invalid`].
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Fault {
    /// A comment is missing its closing marker.
    UnterminatedComment,
    /// A string literal is missing its closing quote.
    UnterminatedString,
    /// A `[segment literal]` is missing its closing bracket.
    UnterminatedSegment,
    /// A new tag was opened before the previous one was closed.
    UnclosedTag,
    /// A tag was closed with the wrong marker, such as `{{{name}}`.
    MismatchedClose,
    /// A character that has no meaning inside of a tag.
    UnexpectedCharacter,
}

impl Fault {
    /// Return a help text describing the fault.
    pub fn help(&self) -> &'static str {
        match self {
            Fault::UnterminatedComment => "this comment is never closed, try closing it with `}}` or `--}}`",
            Fault::UnterminatedString => "this might be an undelimited string, try closing it with a matching quote",
            Fault::UnterminatedSegment => "this segment literal is never closed, try closing it with `]`",
            Fault::UnclosedTag => "did you close the previous tag with `}}`?",
            Fault::MismatchedClose => "a tag opened with `{{{` must be closed with `}}}`, and a tag opened with `{{` must be closed with `}}`",
            Fault::UnexpectedCharacter => "expected a path, a literal, a subexpression or the end of the tag",
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Raw => write!(f, "raw"),
            Token::Comment => write!(f, "comment"),
            Token::BeginExpression => write!(f, "begin expression ({{{{)"),
            Token::BeginRaw => write!(f, "begin raw expression ({{{{{{)"),
            Token::EndExpression => write!(f, "end expression (}}}})"),
            Token::EndRaw => write!(f, "end raw expression (}}}}}})"),
            Token::Hash => write!(f, "hash (#)"),
            Token::Caret => write!(f, "caret (^)"),
            Token::Slash => write!(f, "slash (/)"),
            Token::Angle => write!(f, "angle (>)"),
            Token::Assign => write!(f, "assign (=)"),
            Token::BeginGroup => write!(f, "begin group (()"),
            Token::EndGroup => write!(f, "end group ())"),
            Token::String => write!(f, "string"),
            Token::Number => write!(f, "number"),
            Token::Path => write!(f, "path"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Else => write!(f, "else"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Invalid(_) => write!(f, "invalid"),
        }
    }
}
