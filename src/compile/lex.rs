pub mod token;

mod state;

use self::{
    state::CursorState,
    token::{Fault, Token},
};
use crate::region::Region;

/// Provides methods to read a source string as [`Token`] instances.
///
/// The Lexer never fails. Text it cannot make sense of is emitted as
/// [`Token::Invalid`], and the Parser decides how to report it.
pub struct Lexer<'source> {
    /// Reference to the source text.
    pub source: &'source str,
    /// Position within source.
    pub cursor: usize,
    /// Tracks the [`Lexer`] state and determines the action taken
    /// when `.next` is called.
    state: CursorState,
    /// When true, the following [`Token::Raw`] read while in
    /// [`CursorState::Default`] state will be left trimmed.
    left_trim: bool,
    /// Temporary storage for the a [`Token`] that will be read
    /// on the following call to `.next`
    buffer: Option<(Token, Region)>,
}

impl<'source> Lexer<'source> {
    /// Create a new [`Lexer`] from the given source.
    #[inline]
    pub fn new(source: &'source str) -> Self {
        Self {
            state: CursorState::Default,
            source,
            left_trim: false,
            cursor: 0,
            buffer: None,
        }
    }

    /// Return the next [`Token`] and [`Region`].
    ///
    /// Any instance of [`Token::Whitespace`] is ignored, as is raw text that
    /// was trimmed away completely.
    pub fn next(&mut self) -> Option<(Token, Region)> {
        loop {
            // Always prefer taking from the buffer when possible.
            if let Some(next) = self.buffer.take() {
                return Some(next);
            }
            if self.cursor >= self.source.len() {
                return None;
            }

            let from = self.cursor;
            let (token, region) = match self.state {
                CursorState::Default => self.lex_default(from),
                CursorState::Inside { end_token } => self.lex_tag(from, end_token),
            };

            match token {
                Token::Whitespace => continue,
                Token::Raw if region.is_empty() => continue,
                _ => return Some((token, region)),
            }
        }
    }

    /// Return the next [`Token`] and [`Region`] in
    /// [`Inside`][`CursorState::Inside`] configuration.
    ///
    /// Assumes the cursor is inside of a tag.
    fn lex_tag(&mut self, from: usize, end_token: Token) -> (Token, Region) {
        let rest = &self.source[from..];

        if let Some((token, length, is_trimmed)) = match_close(rest, end_token) {
            self.state = CursorState::Default;
            self.cursor = from + length;
            let region = (from..from + length).into();

            if token != end_token {
                return (Token::Invalid(Fault::MismatchedClose), region);
            }
            self.left_trim = is_trimmed;

            return (token, region);
        }
        if rest.starts_with("{{") {
            self.cursor = from + 2;

            return (Token::Invalid(Fault::UnclosedTag), (from..from + 2).into());
        }

        let mut iterator = rest.char_indices().map(|(d, c)| (from + d, c));
        let Some((index, char)) = iterator.next() else {
            self.cursor = self.source.len();
            return (Token::Whitespace, (from..from).into());
        };

        match char {
            '#' => self.advance(index, 1, Token::Hash),
            '^' => self.advance(index, 1, Token::Caret),
            '/' => self.advance(index, 1, Token::Slash),
            '>' => self.advance(index, 1, Token::Angle),
            '=' => self.advance(index, 1, Token::Assign),
            '(' => self.advance(index, 1, Token::BeginGroup),
            ')' => self.advance(index, 1, Token::EndGroup),
            '"' | '\'' => self.lex_string(iterator, index, char),
            '-' if rest[1..].starts_with(|c: char| c.is_ascii_digit()) => {
                self.lex_number(iterator, index)
            }
            c if c.is_whitespace() => self.lex_whitespace(iterator, index),
            c if c.is_ascii_digit() => self.lex_number(iterator, index),
            c if is_path_start(c) => self.lex_path(iterator, index, c),
            c => self.advance(
                index,
                c.len_utf8(),
                Token::Invalid(Fault::UnexpectedCharacter),
            ),
        }
    }

    /// Move the cursor past a token of the given length and return it.
    fn advance(&mut self, from: usize, length: usize, token: Token) -> (Token, Region) {
        self.cursor = from + length;

        (token, (from..from + length).into())
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::Number`].
    ///
    /// The first character, a digit or a minus sign, has already been read.
    fn lex_number<T>(&mut self, iter: T, from: usize) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        for (index, char) in iter {
            if !is_number(char) {
                self.cursor = index;

                return (Token::Number, (from..index).into());
            }
        }
        self.cursor = self.source.len();

        (Token::Number, (from..self.source.len()).into())
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::Whitespace`].
    fn lex_whitespace<T>(&mut self, iter: T, from: usize) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        for (index, char) in iter {
            if !char.is_whitespace() {
                self.cursor = index;

                return (Token::Whitespace, (from..index).into());
            }
        }
        self.cursor = self.source.len();

        (Token::Whitespace, (from..self.source.len()).into())
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::String`].
    ///
    /// The string ends at the next unescaped occurrence of the quote it
    /// began with. The [`Region`] includes both quotes.
    fn lex_string<T>(&mut self, iter: T, from: usize, quote: char) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        let mut escaped = false;
        for (index, char) in iter {
            if escaped {
                escaped = false;
                continue;
            }
            if char == '\\' {
                escaped = true;
            } else if char == quote {
                // Add one to the index of the character to comply with string slice
                // semantics.
                let to = index + 1;
                self.cursor = to;

                return (Token::String, (from..to).into());
            }
        }
        self.cursor = self.source.len();

        (
            Token::Invalid(Fault::UnterminatedString),
            (from..self.source.len()).into(),
        )
    }

    /// Return a [`Token`] and [`Region`] containing a [`Token::Path`], or
    /// one of the keywords and literals that look like a path.
    ///
    /// Bracketed segment literals may contain any character but `]`.
    fn lex_path<T>(&mut self, iter: T, from: usize, first: char) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        let mut in_segment = first == '[';
        for (index, char) in iter {
            if in_segment {
                in_segment = char != ']';
                continue;
            }
            match char {
                '[' => in_segment = true,
                c if is_path_continue(c) => {}
                _ => {
                    self.cursor = index;
                    return self.check_keyword(from, index);
                }
            }
        }
        self.cursor = self.source.len();

        if in_segment {
            return (
                Token::Invalid(Fault::UnterminatedSegment),
                (from..self.source.len()).into(),
            );
        }

        self.check_keyword(from, self.source.len())
    }

    /// Return the keyword or literal [`Token`] for the text in the given
    /// range, falling back to [`Token::Path`].
    fn check_keyword(&self, from: usize, to: usize) -> (Token, Region) {
        let token = match &self.source[from..to] {
            "else" => Token::Else,
            "true" => Token::True,
            "false" => Token::False,
            "null" | "undefined" => Token::Null,
            _ => Token::Path,
        };

        (token, (from..to).into())
    }

    /// Return the next [`Token`] and [`Region`] in
    /// [`Default`][`CursorState::Default`] configuration.
    ///
    /// Assumes the cursor is outside of a tag.
    fn lex_default(&mut self, from: usize) -> (Token, Region) {
        let Some(offset) = self.source[from..].find("{{") else {
            self.cursor = self.source.len();
            return self.trim_raw(from, self.source.len(), false);
        };
        let begin = from + offset;

        // \{{name}} is emitted as the literal text {{name}}, while \\{{name}}
        // is a single backslash followed by the expression.
        let before = &self.source[from..begin];
        let is_literal_backslash = before.ends_with("\\\\");
        if before.ends_with('\\') && !is_literal_backslash {
            let end = self.find_escaped_end(begin);
            self.cursor = end;
            self.buffer = Some((Token::Raw, (begin..end).into()));

            return self.trim_raw(from, begin - 1, false);
        }

        let is_trimmed = self.source[begin + 2..].starts_with('~');
        let raw_end = if is_literal_backslash { begin - 1 } else { begin };
        let raw = self.trim_raw(from, raw_end, is_trimmed);
        let marker = self.lex_marker(begin, is_trimmed);

        if raw.1.is_empty() {
            marker
        } else {
            self.buffer = Some(marker);
            raw
        }
    }

    /// Return the [`Token`] and [`Region`] of the opening marker at the given
    /// position, and move into the matching [`CursorState`].
    ///
    /// Comments are read completely, the Lexer stays in its default state.
    fn lex_marker(&mut self, begin: usize, is_trimmed: bool) -> (Token, Region) {
        let mut position = begin + 2 + usize::from(is_trimmed);

        let (token, end_token) = match self.source.as_bytes().get(position) {
            Some(b'!') => return self.lex_comment(begin, position + 1),
            Some(b'{') => {
                position += 1;
                (Token::BeginRaw, Token::EndRaw)
            }
            Some(b'&') => {
                position += 1;
                (Token::BeginRaw, Token::EndExpression)
            }
            _ => (Token::BeginExpression, Token::EndExpression),
        };
        self.state = CursorState::Inside { end_token };
        self.cursor = position;

        (token, (begin..position).into())
    }

    /// Return a [`Token::Comment`] covering the comment that begins at the
    /// given position.
    ///
    /// A comment opened with `{{!--` only ends at `--}}`, so it may contain
    /// other tags. `{{!--}}` is an empty comment.
    fn lex_comment(&mut self, begin: usize, content: usize) -> (Token, Region) {
        let is_dashed = self.source[content..].starts_with("--");
        let search_from = if is_dashed { content + 2 } else { content };

        let mut offset = search_from;
        while let Some(found) = self.source[offset..].find("}}") {
            let close = offset + found;
            let before = &self.source[search_from..close];
            let (before, is_trimmed) = match before.strip_suffix('~') {
                Some(before) => (before, true),
                None => (before, false),
            };

            if !is_dashed || before.is_empty() || before.ends_with("--") {
                self.left_trim = is_trimmed;
                self.cursor = close + 2;

                return (Token::Comment, (begin..close + 2).into());
            }
            offset = close + 1;
        }
        self.cursor = self.source.len();

        (
            Token::Invalid(Fault::UnterminatedComment),
            (begin..self.source.len()).into(),
        )
    }

    /// Return the position after the construct following an escaped opening
    /// marker, or the end of source if it is never closed.
    fn find_escaped_end(&self, begin: usize) -> usize {
        let rest = &self.source[begin..];
        let closer = if rest.starts_with("{{{") { "}}}" } else { "}}" };

        rest.find(closer)
            .map_or(self.source.len(), |offset| begin + offset + closer.len())
    }

    /// Return a [`Token::Raw`] covering the given range, with whitespace
    /// trimmed as requested by the surrounding markers.
    fn trim_raw(&mut self, mut begin: usize, mut end: usize, right_trim: bool) -> (Token, Region) {
        if right_trim {
            end = begin + self.source[begin..end].trim_end().len();
        }
        if self.left_trim {
            self.left_trim = false;
            let s = &self.source[begin..end];
            begin += s.len() - s.trim_start().len();
        }

        (Token::Raw, (begin..end).into())
    }
}

/// Return the closing marker at the start of the given text, its length, and
/// true if it trims the whitespace that follows.
///
/// The triple-stash closer is only recognized when it is expected, so
/// `{{name}}}` closes after `}}`.
fn match_close(rest: &str, end_token: Token) -> Option<(Token, usize, bool)> {
    if end_token == Token::EndRaw {
        if rest.starts_with("}}}") {
            return Some((Token::EndRaw, 3, false));
        }
        if rest.starts_with("}~}}") {
            return Some((Token::EndRaw, 4, true));
        }
    }
    if rest.starts_with("~}}") {
        return Some((Token::EndExpression, 3, true));
    }
    if rest.starts_with("}}") {
        return Some((Token::EndExpression, 2, false));
    }

    None
}

/// Return true if the given character may begin a path.
fn is_path_start(c: char) -> bool {
    matches!(c, '_' | '.' | '@' | '[' | '$') || unicode_ident::is_xid_start(c)
}

/// Return true if the given character may continue a path.
fn is_path_continue(c: char) -> bool {
    matches!(c, '.' | '/' | '@' | '-' | '$') || unicode_ident::is_xid_continue(c)
}

/// Return true if the given character is a number (0-9) or a period.
fn is_number(c: char) -> bool {
    matches!(c, '0'..='9' | '.')
}

#[cfg(test)]
mod tests {
    use super::{
        state::CursorState,
        token::{Fault, Token},
        Lexer,
    };
    use crate::region::Region;

    #[test]
    fn test_lex_default_no_match() {
        let expect = vec![(Token::Raw, 0..11)];

        helper_lex_next_auto("lorem ipsum", expect)
    }

    #[test]
    fn test_lex_single_curly_is_raw() {
        helper_lex_next_auto("{name}", vec![(Token::Raw, 0..6)])
    }

    #[test]
    fn test_lex_expression() {
        let expect = vec![
            (Token::Raw, 0..6),
            (Token::BeginExpression, 6..8),
            (Token::Path, 9..13),
            (Token::EndExpression, 14..16),
            (Token::Raw, 16..17),
        ];

        helper_lex_next_auto("hello {{ name }}!", expect);
    }

    #[test]
    fn test_lex_trim() {
        let expect = vec![
            (Token::Raw, 0..1),
            (Token::BeginExpression, 3..6),
            (Token::Path, 7..11),
            (Token::EndExpression, 12..15),
            (Token::Raw, 17..18),
        ];

        helper_lex_next_auto("a  {{~ name ~}}  b", expect);
    }

    #[test]
    fn test_lex_state_change() {
        let mut expression_lexer = Lexer::new("lorem {{");
        let mut raw_lexer = Lexer::new("lorem {{{");
        expression_lexer.next();
        raw_lexer.next();

        assert_eq!(
            expression_lexer.state,
            CursorState::Inside {
                end_token: Token::EndExpression
            }
        );
        assert_eq!(
            raw_lexer.state,
            CursorState::Inside {
                end_token: Token::EndRaw
            }
        );
    }

    #[test]
    fn test_lex_triple_stash() {
        let expect = vec![
            (Token::BeginRaw, 0..3),
            (Token::Path, 3..7),
            (Token::EndRaw, 7..10),
        ];

        helper_lex_next_auto("{{{body}}}", expect);
    }

    #[test]
    fn test_lex_ampersand() {
        let expect = vec![
            (Token::BeginRaw, 0..3),
            (Token::Path, 4..8),
            (Token::EndExpression, 8..10),
        ];

        helper_lex_next_auto("{{& body}}", expect);
    }

    #[test]
    fn test_lex_dashed_comment_contains_tags() {
        let expect = vec![
            (Token::Raw, 0..1),
            (Token::Comment, 1..17),
            (Token::Raw, 17..18),
        ];

        helper_lex_next_auto("a{{!-- {{x}} --}}b", expect);
    }

    #[test]
    fn test_lex_comment() {
        helper_lex_next_auto("{{! note }}", vec![(Token::Comment, 0..11)]);
    }

    #[test]
    fn test_lex_escaped_expression() {
        let expect = vec![
            (Token::Raw, 0..7),
            (Token::Raw, 8..21),
            (Token::Raw, 21..22),
        ];

        helper_lex_next_auto(r"Hello, \{{raw_value}}!", expect);
    }

    #[test]
    fn test_lex_escaped_backslash() {
        let expect = vec![
            (Token::Raw, 0..2),
            (Token::BeginExpression, 3..5),
            (Token::Path, 5..6),
            (Token::EndExpression, 6..8),
        ];

        helper_lex_next_auto(r"a\\{{b}}", expect);
    }

    #[test]
    fn test_lex_empty_dashed_comment() {
        helper_lex_next_auto("{{!--}}x", vec![(Token::Comment, 0..7), (Token::Raw, 7..8)]);
    }

    #[test]
    fn test_lex_block() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Hash, 2..3),
            (Token::Path, 3..7),
            (Token::Path, 8..13),
            (Token::EndExpression, 13..15),
            (Token::BeginExpression, 15..17),
            (Token::Slash, 17..18),
            (Token::Path, 18..22),
            (Token::EndExpression, 22..24),
        ];

        helper_lex_next_auto("{{#each items}}{{/each}}", expect);
    }

    #[test]
    fn test_lex_literals_and_hash() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Path, 2..6),
            (Token::String, 7..12),
            (Token::Number, 13..17),
            (Token::True, 18..22),
            (Token::Null, 23..27),
            (Token::Path, 28..31),
            (Token::Assign, 31..32),
            (Token::Path, 32..33),
            (Token::EndExpression, 33..35),
        ];

        helper_lex_next_auto("{{eval 'a}}' -1.5 true null key=x}}", expect);
    }

    #[test]
    fn test_lex_else_and_caret() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Else, 2..6),
            (Token::EndExpression, 6..8),
            (Token::BeginExpression, 8..10),
            (Token::Caret, 10..11),
            (Token::EndExpression, 11..13),
        ];

        helper_lex_next_auto("{{else}}{{^}}", expect);
    }

    #[test]
    fn test_lex_segment_literal() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Path, 2..14),
            (Token::EndExpression, 14..16),
        ];

        helper_lex_next_auto("{{[my key].[x]}}", expect);
    }

    #[test]
    fn test_lex_mismatched_close() {
        let expect = vec![
            (Token::BeginRaw, 0..3),
            (Token::Path, 3..7),
            (Token::Invalid(Fault::MismatchedClose), 7..9),
        ];

        helper_lex_next_auto("{{{name}}", expect);
    }

    #[test]
    fn test_lex_unclosed_tag() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Path, 3..4),
            (Token::Invalid(Fault::UnclosedTag), 5..7),
            (Token::Path, 8..9),
            (Token::EndExpression, 10..12),
        ];

        helper_lex_next_auto("{{ a {{ b }}", expect);
    }

    #[test]
    fn test_lex_unterminated_comment() {
        let expect = vec![(Token::Invalid(Fault::UnterminatedComment), 0..10)];

        helper_lex_next_auto("{{!-- oops", expect);
    }

    /// Helper function which takes in a source string, creates a lexer on that
    /// string and iterates [expect.len()] amount of times and compares the result
    /// against [lexer.next()].
    fn helper_lex_next_auto<T>(source: &str, expect: Vec<(Token, T)>)
    where
        T: Into<Region>,
    {
        let mut lexer = Lexer::new(source);
        for (token, region) in expect {
            assert_eq!(lexer.next(), Some((token, region.into())))
        }

        assert_eq!(lexer.next(), None);
        assert_eq!(lexer.next(), None);
    }
}
