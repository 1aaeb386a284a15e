use std::ops::Range;

use smol_str::SmolStr;

use crate::errors::SQLLexError;
use crate::helpers::keyword_eq;

/// One atomic unit of SQL text.
///
/// Besides its decoded text and byte span, a lexeme carries the trivia
/// around it: the verbatim whitespace that follows it, comments that
/// end on the same logical line (`inline_comments`) and comments that
/// sit on their own lines before it (`leading_comments`). The parsers
/// turn that trivia into positioned comments on the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    /// Decoded text: quoted identifiers and strings are stored without
    /// their delimiters, everything else verbatim.
    pub text: SmolStr,
    /// The verbatim source slice of the lexeme itself.
    pub raw: SmolStr,
    pub span: Range<usize>,
    /// Whitespace between this lexeme and the next, verbatim.
    pub following_whitespace: SmolStr,
    /// Everything between this lexeme and the next (whitespace and
    /// comments interleaved), verbatim. Feeds byte-exact restoration.
    pub raw_trailing: SmolStr,
    pub leading_comments: Vec<SmolStr>,
    pub inline_comments: Vec<SmolStr>,
}

impl Lexeme {
    pub fn is_word(&self, keyword: &str) -> bool {
        self.kind == LexemeKind::Word && keyword_eq(&self.text, keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    Word,
    QuotedIdentifier,
    StringLiteral,
    /// A `$tag$ ... $tag$` literal, kept verbatim in `text`.
    DollarString,
    Number,
    Operator,
    Comma,
    Dot,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Parameter,
    Terminator,
}

/// The lexeme stream for one input string. `prelude` is the verbatim
/// trivia before the first lexeme; comments inside it surface as the
/// first lexeme's `leading_comments`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexemeSequence {
    pub prelude: SmolStr,
    pub lexemes: Vec<Lexeme>,
}

/// A start/end delimiter pair for quoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapePair {
    pub start: char,
    pub end: char,
}

impl EscapePair {
    pub const DOUBLE_QUOTE: EscapePair = EscapePair {
        start: '"',
        end: '"',
    };
    pub const BACKTICK: EscapePair = EscapePair {
        start: '`',
        end: '`',
    };
    pub const BRACKET: EscapePair = EscapePair {
        start: '[',
        end: ']',
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerOptions {
    /// Which identifier quoting styles the lexer recognizes. When the
    /// bracket pair is absent, `[` lexes as an array subscript opener.
    pub identifier_escape: Vec<EscapePair>,
}

impl Default for LexerOptions {
    fn default() -> Self {
        LexerOptions {
            identifier_escape: vec![EscapePair::DOUBLE_QUOTE, EscapePair::BACKTICK],
        }
    }
}

pub struct Lexer {
    options: LexerOptions,
}

impl Default for Lexer {
    fn default() -> Self {
        Lexer::new(LexerOptions::default())
    }
}

// Multi-character operators, longest first for maximal munch.
const OPERATORS: &[&str] = &[
    "->>", "#>>", "<=>", "::", "<=", ">=", "<>", "!=", "||", "->", "#>", "!~", "~*", "<<", ">>",
    "+", "-", "*", "/", "%", "<", ">", "=", "|", "&", "#", "~", "^",
];

impl Lexer {
    pub fn new(options: LexerOptions) -> Self {
        Lexer { options }
    }

    pub fn tokenize(&self, src: &str) -> Result<LexemeSequence, SQLLexError> {
        let mut cursor = Cursor::new(src);
        let (prelude, leading) = cursor.take_trivia()?;

        let mut lexemes: Vec<Lexeme> = Vec::new();
        let mut pending_leading = leading;

        while !cursor.is_eof() {
            let start = cursor.pos;
            let (kind, text) = self.next_lexeme(&mut cursor)?;
            let span = start..cursor.pos;
            let raw = SmolStr::new(&src[span.clone()]);

            let trivia_start = cursor.pos;
            let (inline, next_leading, whitespace) = cursor.take_trailing_trivia()?;
            let raw_trailing = SmolStr::new(&src[trivia_start..cursor.pos]);

            lexemes.push(Lexeme {
                kind,
                text,
                raw,
                span,
                following_whitespace: whitespace,
                raw_trailing,
                leading_comments: std::mem::take(&mut pending_leading),
                inline_comments: inline,
            });
            pending_leading = next_leading;
        }

        if !pending_leading.is_empty() {
            // Comments after the last lexeme already live in its
            // raw_trailing; keep them addressable as inline comments so
            // clause-level attachment still sees them.
            if let Some(last) = lexemes.last_mut() {
                last.inline_comments.extend(pending_leading);
            }
        }

        Ok(LexemeSequence {
            prelude: SmolStr::new(prelude),
            lexemes,
        })
    }

    fn next_lexeme(&self, cursor: &mut Cursor) -> Result<(LexemeKind, SmolStr), SQLLexError> {
        let ch = cursor.peek().expect("next_lexeme called at EOF");

        for pair in &self.options.identifier_escape {
            if ch == pair.start {
                return self.quoted_identifier(cursor, *pair);
            }
        }

        match ch {
            '\'' => self.string_literal(cursor),
            '$' => self.dollar(cursor),
            ':' | '@' | '?' => self.parameter(cursor),
            ',' => Ok(cursor.single(LexemeKind::Comma)),
            ';' => Ok(cursor.single(LexemeKind::Terminator)),
            '(' => Ok(cursor.single(LexemeKind::OpenParen)),
            ')' => Ok(cursor.single(LexemeKind::CloseParen)),
            '[' => Ok(cursor.single(LexemeKind::OpenBracket)),
            ']' => Ok(cursor.single(LexemeKind::CloseBracket)),
            '.' => {
                if cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.number(cursor)
                } else {
                    Ok(cursor.single(LexemeKind::Dot))
                }
            }
            c if c.is_ascii_digit() => self.number(cursor),
            c if is_word_start(c) => Ok(self.word(cursor)),
            _ => self.operator(cursor),
        }
    }

    fn word(&self, cursor: &mut Cursor) -> (LexemeKind, SmolStr) {
        let start = cursor.pos;
        while cursor.peek().is_some_and(is_word_part) {
            cursor.bump();
        }
        (LexemeKind::Word, SmolStr::new(&cursor.src[start..cursor.pos]))
    }

    fn number(&self, cursor: &mut Cursor) -> Result<(LexemeKind, SmolStr), SQLLexError> {
        let start = cursor.pos;
        while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
            cursor.bump();
        }
        if cursor.peek() == Some('.') && cursor.peek_at(1).is_none_or(|c| c.is_ascii_digit()) {
            cursor.bump();
            while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                cursor.bump();
            }
        }
        if matches!(cursor.peek(), Some('e' | 'E'))
            && cursor
                .peek_at(1)
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            cursor.bump();
            if matches!(cursor.peek(), Some('+' | '-')) {
                cursor.bump();
            }
            while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                cursor.bump();
            }
        }
        Ok((LexemeKind::Number, SmolStr::new(&cursor.src[start..cursor.pos])))
    }

    fn operator(&self, cursor: &mut Cursor) -> Result<(LexemeKind, SmolStr), SQLLexError> {
        let rest = &cursor.src[cursor.pos..];
        for op in OPERATORS {
            if rest.starts_with(op) {
                cursor.advance(op.len());
                return Ok((LexemeKind::Operator, SmolStr::new(*op)));
            }
        }
        Err(SQLLexError::new(
            format!("unexpected character {:?}", rest.chars().next().unwrap()),
            cursor.pos,
        ))
    }

    fn quoted_identifier(
        &self,
        cursor: &mut Cursor,
        pair: EscapePair,
    ) -> Result<(LexemeKind, SmolStr), SQLLexError> {
        let start = cursor.pos;
        cursor.bump();
        let inner_start = cursor.pos;
        loop {
            match cursor.peek() {
                Some(c) if c == pair.end => {
                    let text = SmolStr::new(&cursor.src[inner_start..cursor.pos]);
                    cursor.bump();
                    return Ok((LexemeKind::QuotedIdentifier, text));
                }
                Some(_) => cursor.bump(),
                None => {
                    return Err(SQLLexError::new("unterminated quoted identifier", start));
                }
            }
        }
    }

    fn string_literal(&self, cursor: &mut Cursor) -> Result<(LexemeKind, SmolStr), SQLLexError> {
        let start = cursor.pos;
        cursor.bump();
        let mut decoded = String::new();
        loop {
            match cursor.peek() {
                Some('\'') => {
                    if cursor.peek_at(1) == Some('\'') {
                        decoded.push('\'');
                        cursor.advance(2);
                    } else {
                        cursor.bump();
                        return Ok((LexemeKind::StringLiteral, SmolStr::new(decoded)));
                    }
                }
                Some(c) => {
                    decoded.push(c);
                    cursor.bump();
                }
                None => return Err(SQLLexError::new("unterminated string literal", start)),
            }
        }
    }

    /// `$tag$ ... $tag$` dollar strings, `$1` positional parameters and
    /// `${name}` delimited parameters all start with a dollar sign.
    fn dollar(&self, cursor: &mut Cursor) -> Result<(LexemeKind, SmolStr), SQLLexError> {
        let start = cursor.pos;

        if cursor.peek_at(1) == Some('{') {
            cursor.advance(2);
            let name_start = cursor.pos;
            while cursor.peek().is_some_and(|c| c != '}') {
                cursor.bump();
            }
            if cursor.is_eof() {
                return Err(SQLLexError::new("unterminated ${...} parameter", start));
            }
            let name = SmolStr::new(&cursor.src[name_start..cursor.pos]);
            cursor.bump();
            return Ok((LexemeKind::Parameter, name));
        }

        // Scan a potential dollar-quote tag.
        let mut probe = cursor.clone();
        probe.bump();
        let tag_start = probe.pos;
        while probe.peek().is_some_and(is_word_part) {
            probe.bump();
        }
        if probe.peek() == Some('$') {
            let tag = &cursor.src[tag_start..probe.pos];
            let open = format!("${tag}$");
            let close = open.clone();
            let body_start = start + open.len();
            match cursor.src[body_start..].find(&close) {
                Some(rel) => {
                    let end = body_start + rel + close.len();
                    let text = SmolStr::new(&cursor.src[start..end]);
                    cursor.advance(end - cursor.pos);
                    return Ok((LexemeKind::DollarString, text));
                }
                None => return Err(SQLLexError::new("unterminated dollar-quoted string", start)),
            }
        }

        // `$1` style positional parameter.
        if cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            cursor.bump();
            let num_start = cursor.pos;
            while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                cursor.bump();
            }
            return Ok((
                LexemeKind::Parameter,
                SmolStr::new(&cursor.src[num_start..cursor.pos]),
            ));
        }

        Err(SQLLexError::new("unexpected character '$'", start))
    }

    fn parameter(&self, cursor: &mut Cursor) -> Result<(LexemeKind, SmolStr), SQLLexError> {
        let ch = cursor.peek().unwrap();

        if ch == '?' {
            cursor.bump();
            return Ok((LexemeKind::Parameter, SmolStr::default()));
        }

        // `::` is the cast operator, not a parameter prefix.
        if ch == ':' && cursor.peek_at(1) == Some(':') {
            cursor.advance(2);
            return Ok((LexemeKind::Operator, SmolStr::new("::")));
        }

        if cursor.peek_at(1).is_some_and(is_word_start) {
            cursor.bump();
            let name_start = cursor.pos;
            while cursor.peek().is_some_and(is_word_part) {
                cursor.bump();
            }
            return Ok((
                LexemeKind::Parameter,
                SmolStr::new(&cursor.src[name_start..cursor.pos]),
            ));
        }

        // A lone `:` is the array-slice separator.
        if ch == ':' {
            cursor.bump();
            return Ok((LexemeKind::Operator, SmolStr::new(":")));
        }

        Err(SQLLexError::new(
            format!("unexpected character {ch:?}"),
            cursor.pos,
        ))
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[derive(Clone)]
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor { src, pos: 0 }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn single(&mut self, kind: LexemeKind) -> (LexemeKind, SmolStr) {
        let c = self.peek().unwrap();
        self.bump();
        (kind, SmolStr::new(c.to_string()))
    }

    /// Trivia at the very start of the input. Returns the verbatim
    /// prelude and the comments inside it (they become the first
    /// lexeme's leading comments).
    fn take_trivia(&mut self) -> Result<(&'a str, Vec<SmolStr>), SQLLexError> {
        let start = self.pos;
        let mut comments = Vec::new();
        loop {
            if let Some(c) = self.peek()
                && c.is_whitespace()
            {
                self.bump();
                continue;
            }
            if let Some(comment) = self.comment()? {
                comments.push(comment);
                continue;
            }
            break;
        }
        Ok((&self.src[start..self.pos], comments))
    }

    /// Trivia after a lexeme. Comments before the first newline are
    /// inline (same logical line as the lexeme's end); comments after
    /// it lead the next lexeme. Returns (inline, leading, whitespace).
    #[allow(clippy::type_complexity)]
    fn take_trailing_trivia(
        &mut self,
    ) -> Result<(Vec<SmolStr>, Vec<SmolStr>, SmolStr), SQLLexError> {
        let mut inline = Vec::new();
        let mut leading = Vec::new();
        let mut whitespace = String::new();
        let mut seen_newline = false;

        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    if c == '\n' {
                        seen_newline = true;
                    }
                    whitespace.push(c);
                    self.bump();
                }
                _ => {
                    let before_line_comment =
                        self.peek() == Some('-') && self.peek_at(1) == Some('-');
                    match self.comment()? {
                        Some(comment) => {
                            if seen_newline {
                                leading.push(comment);
                            } else {
                                inline.push(comment);
                                // A line comment ends its own line.
                                if before_line_comment {
                                    seen_newline = true;
                                }
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        Ok((inline, leading, SmolStr::new(whitespace)))
    }

    /// Consume one comment if the cursor sits on one. The returned text
    /// excludes the delimiters and is trimmed.
    fn comment(&mut self) -> Result<Option<SmolStr>, SQLLexError> {
        let rest = &self.src[self.pos..];
        if let Some(stripped) = rest.strip_prefix("--") {
            let len = stripped.find('\n').unwrap_or(stripped.len());
            let text = stripped[..len].trim();
            self.advance(2 + len);
            return Ok(Some(SmolStr::new(text)));
        }
        if rest.starts_with("/*") {
            let start = self.pos;
            match rest[2..].find("*/") {
                Some(rel) => {
                    let text = rest[2..2 + rel].trim();
                    self.advance(2 + rel + 2);
                    Ok(Some(SmolStr::new(text)))
                }
                None => Err(SQLLexError::new("unterminated block comment", start)),
            }
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lex(src: &str) -> Vec<Lexeme> {
        Lexer::default().tokenize(src).unwrap().lexemes
    }

    fn kinds(src: &str) -> Vec<LexemeKind> {
        lex(src).into_iter().map(|l| l.kind).collect()
    }

    #[test]
    fn words_and_punctuation() {
        let lexemes = lex("select id, name from users;");
        let texts: Vec<_> = lexemes.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["select", "id", ",", "name", "from", "users", ";"]);
        assert_eq!(lexemes[0].kind, LexemeKind::Word);
        assert_eq!(lexemes[2].kind, LexemeKind::Comma);
        assert_eq!(lexemes[6].kind, LexemeKind::Terminator);
    }

    #[test]
    fn spans_are_monotonic() {
        let lexemes = lex("select  a .b\n from t");
        for pair in lexemes.windows(2) {
            assert!(pair[0].span.start < pair[0].span.end);
            assert!(pair[0].span.end <= pair[1].span.start);
        }
    }

    #[test]
    fn quoted_identifiers_decode() {
        let lexemes = lex("select \"user id\", `weird` from t");
        assert_eq!(lexemes[1].kind, LexemeKind::QuotedIdentifier);
        assert_eq!(lexemes[1].text, "user id");
        assert_eq!(lexemes[1].raw, "\"user id\"");
        assert_eq!(lexemes[3].text, "weird");
    }

    #[test]
    fn bracket_identifiers_when_configured() {
        let lexer = Lexer::new(LexerOptions {
            identifier_escape: vec![EscapePair::BRACKET],
        });
        let lexemes = lexer.tokenize("select [user id] from t").unwrap().lexemes;
        assert_eq!(lexemes[1].kind, LexemeKind::QuotedIdentifier);
        assert_eq!(lexemes[1].text, "user id");
    }

    #[test]
    fn string_escape_decodes() {
        let lexemes = lex("select 'it''s'");
        assert_eq!(lexemes[1].kind, LexemeKind::StringLiteral);
        assert_eq!(lexemes[1].text, "it's");
    }

    #[test]
    fn dollar_quoted_string_is_verbatim() {
        let lexemes = lex("select $tag$ 'raw' $x$ $tag$");
        assert_eq!(lexemes[1].kind, LexemeKind::DollarString);
        assert_eq!(lexemes[1].text, "$tag$ 'raw' $x$ $tag$");
    }

    #[test]
    fn parameters() {
        let lexemes = lex("select :a, @b, $3, ${cfg}, ?");
        let params: Vec<_> = lexemes
            .iter()
            .filter(|l| l.kind == LexemeKind::Parameter)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(params, ["a", "b", "3", "cfg", ""]);
    }

    #[test]
    fn double_colon_is_an_operator() {
        assert_eq!(
            kinds("x::int"),
            [LexemeKind::Word, LexemeKind::Operator, LexemeKind::Word]
        );
    }

    #[test]
    fn inline_vs_leading_comments() {
        let lexemes = lex("select a -- trailing\n/* next */ from t");
        assert_eq!(lexemes[1].inline_comments, vec![SmolStr::new("trailing")]);
        assert_eq!(lexemes[2].leading_comments, vec![SmolStr::new("next")]);
        assert_eq!(lexemes[2].text, "from");
    }

    #[test]
    fn block_comment_same_line_is_inline() {
        let lexemes = lex("select a /* c */ from t");
        assert_eq!(lexemes[1].inline_comments, vec![SmolStr::new("c")]);
        assert!(lexemes[2].leading_comments.is_empty());
    }

    #[test]
    fn prelude_comments_lead_first_lexeme() {
        let seq = Lexer::default()
            .tokenize("-- header\n-- more\nselect 1")
            .unwrap();
        assert_eq!(
            seq.lexemes[0].leading_comments,
            vec![SmolStr::new("header"), SmolStr::new("more")]
        );
        assert!(seq.prelude.as_str().contains("-- header"));
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = Lexer::default().tokenize("select 'oops").unwrap_err();
        assert_eq!(err.position, 7);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn unterminated_block_comment_is_fatal() {
        let err = Lexer::default().tokenize("select 1 /* nope").unwrap_err();
        assert!(err.message.contains("block comment"));
    }

    #[test]
    fn raw_trailing_reassembles_source() {
        let src = "select a,  -- c\n b from t  ";
        let seq = Lexer::default().tokenize(src).unwrap();
        let mut rebuilt = seq.prelude.to_string();
        for lexeme in &seq.lexemes {
            rebuilt.push_str(&lexeme.raw);
            rebuilt.push_str(&lexeme.raw_trailing);
        }
        assert_eq!(rebuilt, src);
    }
}
