//! The token emitter: walks a statement tree and produces the print
//! stream. Works on a private clone of the tree so positioned-comment
//! lists can be drained as they are rendered, which is what keeps
//! every comment in the output exactly once.

mod ddl;
mod dml;
mod expr;
mod joins;
mod query;

use ahash::AHashMap;
use smol_str::SmolStr;
use sqlforge_lib_core::ast::Statement;
use sqlforge_lib_core::ast::comments::Comments;
use sqlforge_lib_core::ast::expr::ParameterExpr;
use sqlforge_lib_core::ast::query::Query;

use crate::config::{FormatConfig, KeywordCase, ParameterStyle};
use crate::tokens::{ContainerType, SqlToken};

pub struct TokenEmitter {
    cfg: FormatConfig,
    param_index: usize,
    /// Alias-declaration-order contexts for JOIN-ON normalization.
    /// Strictly nested: pushed entering a FROM subtree, popped on the
    /// way out, on every path.
    join_contexts: Vec<AHashMap<String, usize>>,
}

impl TokenEmitter {
    pub fn new(cfg: FormatConfig) -> Self {
        TokenEmitter {
            cfg,
            param_index: 0,
            join_contexts: Vec::new(),
        }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.cfg
    }

    /// Emit the token stream for a statement. Parameter indices are
    /// assigned 1-based in visit order, per call.
    pub fn emit_statement(&mut self, statement: &Statement) -> Vec<SqlToken> {
        let mut statement = statement.clone();
        self.param_index = 0;
        let mut out = Vec::new();
        self.statement(&mut statement, &mut out);
        debug_assert!(self.join_contexts.is_empty());
        out
    }

    pub fn emit_query(&mut self, query: &Query) -> Vec<SqlToken> {
        let mut query = query.clone();
        self.param_index = 0;
        let mut out = Vec::new();
        self.query(&mut query, &mut out);
        debug_assert!(self.join_contexts.is_empty());
        out
    }

    // ---- keywords and identifiers ---------------------------------------

    pub(crate) fn kw(&self, text: &str) -> SqlToken {
        match self.cfg.keyword_case {
            KeywordCase::Lower => SqlToken::Keyword(SmolStr::new(text)),
            KeywordCase::Upper => SqlToken::Keyword(SmolStr::new(text.to_ascii_uppercase())),
        }
    }

    pub(crate) fn push_kw(&self, out: &mut Vec<SqlToken>, text: &str) {
        out.push(self.kw(text));
    }

    /// Keyword preceded by a space: the common mid-clause shape.
    pub(crate) fn push_sp_kw(&self, out: &mut Vec<SqlToken>, text: &str) {
        out.push(SqlToken::Space);
        out.push(self.kw(text));
    }

    /// Identifiers are wrapped verbatim in the dialect delimiters; the
    /// wildcard is the one exception.
    pub(crate) fn ident_token(&self, name: &str) -> SqlToken {
        if name == "*" {
            return SqlToken::value("*");
        }
        let pair = self.cfg.identifier_escape;
        let mut text = String::with_capacity(name.len() + 2);
        text.push(pair.start);
        text.push_str(name);
        text.push(pair.end);
        SqlToken::value(text)
    }

    pub(crate) fn push_ident(&self, out: &mut Vec<SqlToken>, name: &str) {
        out.push(self.ident_token(name));
    }

    // ---- parameters -----------------------------------------------------

    pub(crate) fn param_token(&mut self, param: &ParameterExpr) -> SqlToken {
        self.param_index += 1;
        let symbol = &self.cfg.parameter_symbol;
        let text = match self.cfg.parameter_style {
            ParameterStyle::Anonymous => symbol.prefix.to_string(),
            ParameterStyle::Indexed => format!("{}{}", symbol.prefix, self.param_index),
            ParameterStyle::Named => {
                let suffix = symbol.suffix.as_deref().unwrap_or("");
                format!("{}{}{}", symbol.prefix, param.name, suffix)
            }
        };
        SqlToken::Parameter(SmolStr::new(text))
    }

    // ---- comments -------------------------------------------------------

    /// A single-line block comment token, `None` when comment export
    /// is off.
    pub(crate) fn comment_token(&self, text: &str) -> Option<SqlToken> {
        if !self.cfg.export_comment {
            return None;
        }
        let sanitized = sanitize_comment(text);
        Some(SqlToken::Comment(SmolStr::new(format!(
            "/* {sanitized} */"
        ))))
    }

    /// A block comment spanning several lines, two-space indented.
    pub(crate) fn multiline_comment_token(&self, lines: &[SmolStr]) -> Option<SqlToken> {
        if !self.cfg.export_comment {
            return None;
        }
        let mut text = String::from("/*\n");
        for line in lines {
            text.push_str("  ");
            text.push_str(&sanitize_comment(line));
            text.push('\n');
        }
        text.push_str("*/");
        Some(SqlToken::Comment(SmolStr::new(text)))
    }

    /// Rule: a node's `before` comments sit immediately before its
    /// first text token, each followed by a single space.
    pub(crate) fn comments_before(&self, out: &mut Vec<SqlToken>, comments: &mut Comments) {
        let before: Vec<SmolStr> = comments.before().cloned().collect();
        self.comment_run_before(out, &before);
        retain_after_only(comments);
    }

    /// Rule: a node's `after` comments follow its last text token,
    /// each preceded by a single space.
    pub(crate) fn comments_after(&self, out: &mut Vec<SqlToken>, comments: &mut Comments) {
        let after: Vec<SmolStr> = comments.after().cloned().collect();
        for text in &after {
            if let Some(token) = self.comment_token(text) {
                out.push(SqlToken::Space);
                out.push(token);
            }
        }
        comments.clear();
    }

    pub(crate) fn comment_run_before(&self, out: &mut Vec<SqlToken>, texts: &[SmolStr]) {
        for text in texts {
            if let Some(token) = self.comment_token(text) {
                out.push(token);
                out.push(SqlToken::Space);
            }
        }
    }

    pub(crate) fn container(
        &self,
        container: ContainerType,
        children: Vec<SqlToken>,
    ) -> SqlToken {
        SqlToken::Container(container, children)
    }
}

/// Keep only `after` entries; used once the `before` half of an
/// overlay is rendered.
fn retain_after_only(comments: &mut Comments) {
    let after: Vec<SmolStr> = comments.after().cloned().collect();
    comments.clear();
    comments.push(
        sqlforge_lib_core::ast::comments::CommentSlot::After,
        after,
    );
}

/// Defang comment delimiters and fold newlines so no emitted comment
/// can terminate early.
pub(crate) fn sanitize_comment(text: &str) -> String {
    text.replace("*/", "* /")
        .replace("/*", "/ *")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_defangs_delimiters() {
        assert_eq!(sanitize_comment("a */ b /* c"), "a * / b / * c");
        assert_eq!(sanitize_comment("line\nbreak"), "line break");
    }
}
