//! The line printer: token stream in, text out. Multiline mode breaks
//! on clause containers and indents by container nesting; oneliner
//! mode keeps everything on a single line and drops comment-only
//! newlines.

use smol_str::SmolStr;

use crate::tokens::SqlToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    #[default]
    Multiline,
    Oneliner,
}

pub struct LinePrinter {
    indent: &'static str,
}

impl Default for LinePrinter {
    fn default() -> Self {
        LinePrinter { indent: "    " }
    }
}

impl LinePrinter {
    pub fn print(&self, tokens: &[SqlToken], mode: PrintMode) -> String {
        let mut out = String::new();
        match mode {
            PrintMode::Oneliner => self.oneline(tokens, &mut out),
            PrintMode::Multiline => self.multiline(tokens, 0, &mut out),
        }
        out.trim_end().to_string()
    }

    fn oneline(&self, tokens: &[SqlToken], out: &mut String) {
        for token in tokens {
            match token {
                SqlToken::Container(_, children) => self.oneline(children, out),
                // The newline itself is dropped, but the separation it
                // provided must survive as a space.
                SqlToken::CommentNewline => push_space(out),
                SqlToken::Space => push_space(out),
                SqlToken::Comment(text) => {
                    // Multi-line comment bodies collapse onto the line.
                    push_text(out, &text.replace('\n', " "));
                }
                other => push_text(out, &other_text(other)),
            }
        }
    }

    fn multiline(&self, tokens: &[SqlToken], depth: usize, out: &mut String) {
        for token in tokens {
            match token {
                SqlToken::Container(container, children) => {
                    if container.starts_line() {
                        self.break_line(out, depth);
                    } else if container.is_list_item() {
                        self.break_line(out, depth + 1);
                    }

                    let child_depth =
                        depth + usize::from(container.indents() || container.is_list_item());

                    // An indenting container closes its parenthesis on
                    // its opening column.
                    if container.indents()
                        && matches!(children.last(), Some(SqlToken::Parenthesis(p)) if p == ")")
                    {
                        self.multiline(&children[..children.len() - 1], child_depth, out);
                        self.break_line(out, depth);
                        push_text(out, ")");
                    } else {
                        self.multiline(children, child_depth, out);
                    }
                }
                SqlToken::CommentNewline => self.break_line(out, depth),
                SqlToken::Space => push_space(out),
                SqlToken::Comment(text) => {
                    push_text(out, &indent_comment(text, self.indent, depth));
                }
                other => push_text(out, &other_text(other)),
            }
        }
    }

    /// Start a fresh line at `depth`, dropping any space that would
    /// otherwise dangle at the end of the current line.
    fn break_line(&self, out: &mut String, depth: usize) {
        while out.ends_with(' ') {
            out.pop();
        }
        if out.is_empty() || out.ends_with('\n') {
            // Already at a line start; just set the indent.
        } else {
            out.push('\n');
        }
        if !out.is_empty() {
            for _ in 0..depth {
                out.push_str(self.indent);
            }
        }
    }
}

fn other_text(token: &SqlToken) -> String {
    match token {
        SqlToken::Keyword(t)
        | SqlToken::Value(t)
        | SqlToken::Operator(t)
        | SqlToken::Parenthesis(t)
        | SqlToken::ArgumentSplitter(t)
        | SqlToken::Parameter(t) => t.to_string(),
        SqlToken::Comma => ",".to_string(),
        SqlToken::Dot => ".".to_string(),
        _ => String::new(),
    }
}

fn push_text(out: &mut String, text: &str) {
    out.push_str(text);
}

fn push_space(out: &mut String) {
    if !out.is_empty() && !out.ends_with(' ') && !out.ends_with('\n') {
        out.push(' ');
    }
}

/// Re-indent the body lines of a multi-line block comment to the
/// current depth.
fn indent_comment(text: &SmolStr, indent: &str, depth: usize) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    let prefix = indent.repeat(depth);
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("\n{prefix}{line}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tokens::ContainerType as CT;

    fn kw(text: &str) -> SqlToken {
        SqlToken::keyword(text)
    }

    #[test]
    fn oneliner_joins_with_single_spaces() {
        let tokens = vec![
            kw("select"),
            SqlToken::Space,
            SqlToken::Space,
            SqlToken::value("1"),
            SqlToken::CommentNewline,
        ];
        let printed = LinePrinter::default().print(&tokens, PrintMode::Oneliner);
        assert_eq!(printed, "select 1");
    }

    #[test]
    fn multiline_breaks_on_clause_containers() {
        let tokens = vec![SqlToken::Container(
            CT::SimpleSelectQuery,
            vec![
                SqlToken::Container(
                    CT::SelectClause,
                    vec![
                        kw("select"),
                        SqlToken::Space,
                        SqlToken::Container(CT::SelectItem, vec![SqlToken::value("\"a\"")]),
                        SqlToken::Comma,
                        SqlToken::Space,
                        SqlToken::Container(CT::SelectItem, vec![SqlToken::value("\"b\"")]),
                    ],
                ),
                SqlToken::Space,
                SqlToken::Container(
                    CT::FromClause,
                    vec![kw("from"), SqlToken::Space, SqlToken::value("\"t\"")],
                ),
            ],
        )];
        let printed = LinePrinter::default().print(&tokens, PrintMode::Multiline);
        assert_eq!(printed, "select\n    \"a\",\n    \"b\"\nfrom \"t\"");
    }

    #[test]
    fn space_before_break_is_filtered() {
        let tokens = vec![
            kw("select"),
            SqlToken::Space,
            SqlToken::Container(CT::FromClause, vec![kw("from")]),
        ];
        let printed = LinePrinter::default().print(&tokens, PrintMode::Multiline);
        assert_eq!(printed, "select\nfrom");
    }
}
