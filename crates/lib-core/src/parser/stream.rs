use smol_str::SmolStr;

use crate::errors::SQLParseError;
use crate::lexer::{Lexeme, LexemeKind};

/// Cursor over a lexeme sequence. Sub-parsers advance it and report
/// how much they consumed through position deltas, so callers can
/// checkpoint and rewind cheaply.
///
/// The cursor owns its lexemes: comment trivia is drained as it is
/// attached to nodes, which guarantees each comment lands on exactly
/// one node.
pub(crate) struct TokenCursor {
    lexemes: Vec<Lexeme>,
    pos: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint(usize);

impl TokenCursor {
    pub(crate) fn new(lexemes: Vec<Lexeme>) -> Self {
        TokenCursor { lexemes, pos: 0 }
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub(crate) fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    pub(crate) fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.pos)
    }

    pub(crate) fn peek_at(&self, n: usize) -> Option<&Lexeme> {
        self.lexemes.get(self.pos + n)
    }

    pub(crate) fn peek_kind(&self) -> Option<LexemeKind> {
        self.peek().map(|l| l.kind)
    }

    /// Byte position for error reporting: the current lexeme's start,
    /// or the end of input.
    pub(crate) fn byte_pos(&self) -> usize {
        match self.lexemes.get(self.pos) {
            Some(lexeme) => lexeme.span.start,
            None => self.lexemes.last().map_or(0, |l| l.span.end),
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> SQLParseError {
        SQLParseError::new(message, self.byte_pos())
    }

    pub(crate) fn bump(&mut self) -> usize {
        let at = self.pos;
        if self.pos < self.lexemes.len() {
            self.pos += 1;
        }
        at
    }

    pub(crate) fn is_word(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|l| l.is_word(keyword))
    }

    pub(crate) fn is_word_at(&self, n: usize, keyword: &str) -> bool {
        self.peek_at(n).is_some_and(|l| l.is_word(keyword))
    }

    pub(crate) fn is_any_word(&self, keywords: &[&str]) -> bool {
        self.peek()
            .is_some_and(|l| keywords.iter().any(|kw| l.is_word(kw)))
    }

    pub(crate) fn is_kind(&self, kind: LexemeKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Consume the current lexeme when it is the given keyword.
    pub(crate) fn take_word(&mut self, keyword: &str) -> bool {
        if self.is_word(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume a fixed keyword sequence, all or nothing.
    pub(crate) fn take_words(&mut self, keywords: &[&str]) -> bool {
        for (i, keyword) in keywords.iter().enumerate() {
            if !self.is_word_at(i, keyword) {
                return false;
            }
        }
        for _ in keywords {
            self.bump();
        }
        true
    }

    pub(crate) fn expect_word(&mut self, keyword: &str) -> Result<usize, SQLParseError> {
        if self.is_word(keyword) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {}", keyword.to_uppercase())))
        }
    }

    pub(crate) fn take_kind(&mut self, kind: LexemeKind) -> bool {
        if self.is_kind(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_kind(
        &mut self,
        kind: LexemeKind,
        what: &str,
    ) -> Result<usize, SQLParseError> {
        if self.is_kind(kind) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    pub(crate) fn is_operator(&self, op: &str) -> bool {
        self.peek()
            .is_some_and(|l| l.kind == LexemeKind::Operator && l.text == op)
    }

    pub(crate) fn take_operator(&mut self, op: &str) -> bool {
        if self.is_operator(op) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Text of the current lexeme.
    pub(crate) fn text(&self) -> Option<&SmolStr> {
        self.peek().map(|l| &l.text)
    }

    // ---- comment trivia -------------------------------------------------

    /// Drain the leading comments of the current lexeme. The caller is
    /// the node that consumes this lexeme.
    pub(crate) fn take_leading_here(&mut self) -> Vec<SmolStr> {
        match self.lexemes.get_mut(self.pos) {
            Some(lexeme) => std::mem::take(&mut lexeme.leading_comments),
            None => Vec::new(),
        }
    }

    /// Drain the inline comments of the lexeme at `idx` (as returned by
    /// `bump`). First caller wins; later calls see nothing.
    pub(crate) fn take_inline_at(&mut self, idx: usize) -> Vec<SmolStr> {
        match self.lexemes.get_mut(idx) {
            Some(lexeme) => std::mem::take(&mut lexeme.inline_comments),
            None => Vec::new(),
        }
    }

    /// Drain the inline comments of the most recently consumed lexeme.
    pub(crate) fn take_inline_prev(&mut self) -> Vec<SmolStr> {
        if self.pos == 0 {
            return Vec::new();
        }
        let idx = self.pos - 1;
        self.take_inline_at(idx)
    }

    /// Comments that sit between a just-consumed keyword and whatever
    /// follows: the keyword's inline comments plus the next lexeme's
    /// leading comments.
    pub(crate) fn take_comments_after_keyword(&mut self) -> Vec<SmolStr> {
        let mut comments = self.take_inline_prev();
        comments.extend(self.take_leading_here());
        comments
    }
}
