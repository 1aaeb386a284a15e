//! Value-expression emission, including the comment placement rules
//! that make CASE, parentheses and function calls round-trip.

use ahash::AHashSet;
use smol_str::SmolStr;
use sqlforge_lib_core::ast::comments::CommentSlot;
use sqlforge_lib_core::ast::expr::*;

use super::TokenEmitter;
use crate::config::CastStyle;
use crate::tokens::{ContainerType, SqlToken};

/// Word operators render as keywords; everything else as symbols.
fn is_word_operator(op: &str) -> bool {
    op.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

impl TokenEmitter {
    pub(crate) fn value_expr(&mut self, expr: &mut ValueExpr, out: &mut Vec<SqlToken>) {
        match expr {
            ValueExpr::Literal(literal) => self.literal(literal, out),
            ValueExpr::Identifier(identifier) => {
                let mut comments = identifier.comments.take();
                self.comments_before(out, &mut comments);
                self.push_ident(out, &identifier.name);
                self.comments_after(out, &mut comments);
            }
            ValueExpr::Column(column) => self.column_ref(column, out),
            ValueExpr::Parameter(parameter) => {
                let mut comments = parameter.comments.take();
                self.comments_before(out, &mut comments);
                let token = self.param_token(parameter);
                out.push(token);
                self.comments_after(out, &mut comments);
            }
            ValueExpr::Function(call) => self.function_call(call, out),
            ValueExpr::Unary(unary) => {
                self.comments_before(out, &mut unary.comments);
                if is_word_operator(&unary.op) {
                    self.push_kw(out, &unary.op);
                    out.push(SqlToken::Space);
                } else {
                    out.push(SqlToken::Operator(unary.op.clone()));
                }
                self.value_expr(&mut unary.operand, out);
                self.comments_after(out, &mut unary.comments);
            }
            ValueExpr::Binary(binary) => {
                self.comments_before(out, &mut binary.comments);
                self.value_expr(&mut binary.left, out);
                out.push(SqlToken::Space);
                if is_word_operator(&binary.op) {
                    self.push_kw(out, &binary.op);
                } else {
                    out.push(SqlToken::Operator(binary.op.clone()));
                }
                out.push(SqlToken::Space);
                self.value_expr(&mut binary.right, out);
                self.comments_after(out, &mut binary.comments);
            }
            ValueExpr::Paren(paren) => self.paren_expr(paren, out),
            ValueExpr::Cast(cast) => self.cast_expr(cast, out),
            ValueExpr::Case(case) => self.case_expr(case, out),
            ValueExpr::Between(between) => {
                self.comments_before(out, &mut between.comments);
                self.value_expr(&mut between.operand, out);
                if between.negated {
                    self.push_sp_kw(out, "not");
                }
                self.push_sp_kw(out, "between");
                out.push(SqlToken::Space);
                self.value_expr(&mut between.lower, out);
                self.push_sp_kw(out, "and");
                out.push(SqlToken::Space);
                self.value_expr(&mut between.upper, out);
                self.comments_after(out, &mut between.comments);
            }
            ValueExpr::Tuple(tuple) => {
                self.comments_before(out, &mut tuple.comments);
                out.push(SqlToken::Parenthesis(SmolStr::new("(")));
                let mut items = std::mem::take(&mut tuple.items);
                self.comma_separated(&mut items, out);
                tuple.items = items;
                out.push(SqlToken::Parenthesis(SmolStr::new(")")));
                self.comments_after(out, &mut tuple.comments);
            }
            ValueExpr::ValueList(list) => {
                let mut items = std::mem::take(&mut list.items);
                self.comma_separated(&mut items, out);
                list.items = items;
            }
            ValueExpr::InlineQuery(inline) => {
                self.comments_before(out, &mut inline.comments);
                let mut children = vec![SqlToken::Parenthesis(SmolStr::new("("))];
                self.query(&mut inline.query, &mut children);
                children.push(SqlToken::Parenthesis(SmolStr::new(")")));
                out.push(self.container(ContainerType::InlineQuery, children));
                self.comments_after(out, &mut inline.comments);
            }
            ValueExpr::Array(array) => {
                self.comments_before(out, &mut array.comments);
                self.push_kw(out, "array");
                out.push(SqlToken::Parenthesis(SmolStr::new("[")));
                let mut items = std::mem::take(&mut array.items);
                self.comma_separated(&mut items, out);
                array.items = items;
                out.push(SqlToken::Parenthesis(SmolStr::new("]")));
                self.comments_after(out, &mut array.comments);
            }
            ValueExpr::ArrayQuery(array) => {
                self.comments_before(out, &mut array.comments);
                self.push_kw(out, "array");
                let mut children = vec![SqlToken::Parenthesis(SmolStr::new("("))];
                self.query(&mut array.query, &mut children);
                children.push(SqlToken::Parenthesis(SmolStr::new(")")));
                out.push(self.container(ContainerType::InlineQuery, children));
                self.comments_after(out, &mut array.comments);
            }
            ValueExpr::ArrayIndex(index) => {
                self.value_expr(&mut index.base, out);
                out.push(SqlToken::Parenthesis(SmolStr::new("[")));
                self.value_expr(&mut index.index, out);
                out.push(SqlToken::Parenthesis(SmolStr::new("]")));
            }
            ValueExpr::ArraySlice(slice) => {
                self.value_expr(&mut slice.base, out);
                out.push(SqlToken::Parenthesis(SmolStr::new("[")));
                if let Some(lower) = &mut slice.lower {
                    self.value_expr(lower, out);
                }
                out.push(SqlToken::Operator(SmolStr::new(":")));
                if let Some(upper) = &mut slice.upper {
                    self.value_expr(upper, out);
                }
                out.push(SqlToken::Parenthesis(SmolStr::new("]")));
            }
            ValueExpr::TypeName(ty) => self.type_expr(ty, out),
            ValueExpr::Hint(hint) => {
                if self.config().export_comment {
                    out.push(SqlToken::Comment(SmolStr::new(format!(
                        "/*+ {} */",
                        super::sanitize_comment(&hint.text)
                    ))));
                }
            }
        }
    }

    pub(crate) fn comma_separated(&mut self, items: &mut [ValueExpr], out: &mut Vec<SqlToken>) {
        for (i, item) in items.iter_mut().enumerate() {
            if i > 0 {
                out.push(SqlToken::Comma);
                out.push(SqlToken::Space);
            }
            self.value_expr(item, out);
        }
    }

    /// Literal emission: a container is created only when comments
    /// exist, so the surrounding space has somewhere to live.
    fn literal(&mut self, literal: &mut LiteralValue, out: &mut Vec<SqlToken>) {
        let value = match literal.kind {
            LiteralKind::String => {
                let escaped = literal.value.replace('\'', "''");
                SqlToken::value(format!("'{escaped}'"))
            }
            LiteralKind::DollarString
            | LiteralKind::Number
            | LiteralKind::Boolean
            | LiteralKind::Null
            | LiteralKind::Raw => SqlToken::Value(literal.value.clone()),
        };

        if literal.comments.is_empty() {
            out.push(value);
            return;
        }

        let mut comments = literal.comments.take();
        let mut children = Vec::new();
        self.comments_before(&mut children, &mut comments);
        children.push(value);
        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::LiteralValue, children));
    }

    fn column_ref(&mut self, column: &mut ColumnRef, out: &mut Vec<SqlToken>) {
        let mut tokens = Vec::new();
        for namespace in &column.namespaces {
            tokens.push(self.ident_token(namespace));
            tokens.push(SqlToken::Dot);
        }
        tokens.push(self.ident_token(&column.name));

        if column.comments.is_empty() {
            out.extend(tokens);
            return;
        }

        let mut comments = column.comments.take();
        let mut children = Vec::new();
        self.comments_before(&mut children, &mut comments);
        children.extend(tokens);
        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::IdentifierString, children));
    }

    pub(crate) fn qualified_name(&mut self, name: &mut QualifiedName, out: &mut Vec<SqlToken>) {
        let mut comments = name.comments.take();
        self.comments_before(out, &mut comments);
        for namespace in &name.namespaces {
            self.push_ident(out, namespace);
            out.push(SqlToken::Dot);
        }
        self.push_ident(out, &name.name);
        self.comments_after(out, &mut comments);
    }

    /// Function names are not identifier-escaped.
    fn plain_name(&self, name: &QualifiedName, out: &mut Vec<SqlToken>) {
        for namespace in &name.namespaces {
            out.push(SqlToken::Value(namespace.clone()));
            out.push(SqlToken::Dot);
        }
        out.push(SqlToken::Value(name.name.clone()));
    }

    pub(crate) fn function_call(&mut self, call: &mut FunctionCall, out: &mut Vec<SqlToken>) {
        let mut comments = call.comments.take();
        self.comments_before(out, &mut comments);

        self.plain_name(&call.name, out);
        if let Some(args) = &mut call.args {
            out.push(SqlToken::Parenthesis(SmolStr::new("(")));
            self.comma_separated(args, out);
            if let Some(order_by) = &mut call.internal_order_by {
                out.push(SqlToken::Space);
                self.order_by_inline(order_by, out);
            }
            out.push(SqlToken::Parenthesis(SmolStr::new(")")));
        }

        // The closing parenthesis carries the node's own comments, and
        // the list is drained so no later visit can repeat them.
        self.comments_after(out, &mut comments);

        if call.with_ordinality {
            self.push_sp_kw(out, "with ordinality");
        }

        if let Some(over) = &mut call.over {
            self.push_sp_kw(out, "over");
            out.push(SqlToken::Space);
            match &mut over.window {
                OverWindow::Name(name) => self.push_ident(out, name),
                OverWindow::Spec(spec) => {
                    out.push(SqlToken::Parenthesis(SmolStr::new("(")));
                    self.window_spec(spec, out);
                    out.push(SqlToken::Parenthesis(SmolStr::new(")")));
                }
            }
        }
    }

    pub(crate) fn window_spec(&mut self, spec: &mut WindowSpec, out: &mut Vec<SqlToken>) {
        let mut first = true;
        if !spec.partition_by.is_empty() {
            self.push_kw(out, "partition by");
            out.push(SqlToken::Space);
            let mut items = std::mem::take(&mut spec.partition_by);
            self.comma_separated(&mut items, out);
            spec.partition_by = items;
            first = false;
        }
        if let Some(order_by) = &mut spec.order_by {
            if !first {
                out.push(SqlToken::Space);
            }
            self.order_by_inline(order_by, out);
            first = false;
        }
        if let Some(frame) = &mut spec.frame {
            if !first {
                out.push(SqlToken::Space);
            }
            let unit = match frame.unit {
                FrameUnit::Rows => "rows",
                FrameUnit::Range => "range",
                FrameUnit::Groups => "groups",
            };
            self.push_kw(out, unit);
            if frame.end.is_some() {
                self.push_sp_kw(out, "between");
                out.push(SqlToken::Space);
                self.frame_bound(&mut frame.start, out);
                self.push_sp_kw(out, "and");
                out.push(SqlToken::Space);
                let mut end = frame.end.take().expect("checked above");
                self.frame_bound(&mut end, out);
                frame.end = Some(end);
            } else {
                out.push(SqlToken::Space);
                self.frame_bound(&mut frame.start, out);
            }
        }
    }

    fn frame_bound(&mut self, bound: &mut FrameBound, out: &mut Vec<SqlToken>) {
        match bound {
            FrameBound::UnboundedPreceding => self.push_kw(out, "unbounded preceding"),
            FrameBound::UnboundedFollowing => self.push_kw(out, "unbounded following"),
            FrameBound::CurrentRow => self.push_kw(out, "current row"),
            FrameBound::Preceding(offset) => {
                self.value_expr(offset, out);
                self.push_sp_kw(out, "preceding");
            }
            FrameBound::Following(offset) => {
                self.value_expr(offset, out);
                self.push_sp_kw(out, "following");
            }
        }
    }

    /// Inner-expression comments sit adjacent to the parentheses:
    /// `(/* c */ expr /* c */)`.
    fn paren_expr(&mut self, paren: &mut ParenExpr, out: &mut Vec<SqlToken>) {
        let mut children = vec![SqlToken::Parenthesis(SmolStr::new("("))];

        let inner_comments = paren.inner.comments_mut().take();
        for text in inner_comments.before() {
            if let Some(token) = self.comment_token(text) {
                children.push(token);
                children.push(SqlToken::Space);
            }
        }
        self.value_expr(&mut paren.inner, &mut children);
        for text in inner_comments.after() {
            if let Some(token) = self.comment_token(text) {
                children.push(SqlToken::Space);
                children.push(token);
            }
        }

        children.push(SqlToken::Parenthesis(SmolStr::new(")")));

        let mut comments = paren.comments.take();
        self.comments_before(out, &mut comments);
        out.push(self.container(ContainerType::ParenExpression, children));
        self.comments_after(out, &mut comments);
    }

    fn cast_expr(&mut self, cast: &mut CastExpr, out: &mut Vec<SqlToken>) {
        let mut comments = cast.comments.take();
        self.comments_before(out, &mut comments);
        match self.config().cast_style {
            CastStyle::Standard => {
                self.push_kw(out, "cast");
                out.push(SqlToken::Parenthesis(SmolStr::new("(")));
                self.value_expr(&mut cast.input, out);
                self.push_sp_kw(out, "as");
                out.push(SqlToken::Space);
                self.type_expr(&mut cast.ty, out);
                out.push(SqlToken::Parenthesis(SmolStr::new(")")));
            }
            CastStyle::Postgres => {
                self.value_expr(&mut cast.input, out);
                out.push(SqlToken::Operator(SmolStr::new("::")));
                self.type_expr(&mut cast.ty, out);
            }
        }
        self.comments_after(out, &mut comments);
    }

    pub(crate) fn type_expr(&mut self, ty: &mut TypeExpr, out: &mut Vec<SqlToken>) {
        out.push(SqlToken::Value(ty.name.clone()));
        if let Some(args) = &mut ty.args {
            out.push(SqlToken::Parenthesis(SmolStr::new("(")));
            self.comma_separated(args, out);
            out.push(SqlToken::Parenthesis(SmolStr::new(")")));
        }
    }

    /// CASE emission. Comments that lead the condition (or the first
    /// WHEN key) are promoted to sit before the `case` keyword; the
    /// switch's `after` comments land after `end` on their own line.
    fn case_expr(&mut self, case: &mut CaseExpr, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut node_comments = case.comments.take();
        self.comments_before(&mut children, &mut node_comments);

        let hoisted = hoist_leading_case_comments(case);
        self.comment_run_before(&mut children, &hoisted);

        self.push_kw(&mut children, "case");

        if let Some(condition) = &mut case.condition {
            children.push(SqlToken::Space);
            self.value_expr(condition, &mut children);
        }

        let mut switch_children = Vec::new();
        let mut switch_comments = case.switch.comments.take();
        for pair in &mut case.switch.cases {
            let mut pair_children = Vec::new();
            let mut pair_comments = pair.comments.take();
            self.comments_before(&mut pair_children, &mut pair_comments);
            self.push_kw(&mut pair_children, "when");
            pair_children.push(SqlToken::Space);
            self.value_expr(&mut pair.key, &mut pair_children);
            self.push_sp_kw(&mut pair_children, "then");
            pair_children.push(SqlToken::Space);
            self.comment_run_before(
                &mut pair_children,
                &std::mem::take(&mut pair.then_comments),
            );
            self.value_expr(&mut pair.value, &mut pair_children);
            self.comments_after(&mut pair_children, &mut pair_comments);
            switch_children.push(SqlToken::Space);
            switch_children
                .push(self.container(ContainerType::CaseKeyValuePair, pair_children));
        }
        if let Some(else_value) = &mut case.switch.else_value {
            switch_children.push(SqlToken::Space);
            self.push_kw(&mut switch_children, "else");
            switch_children.push(SqlToken::Space);
            self.value_expr(else_value, &mut switch_children);
        }
        children.push(self.container(ContainerType::SwitchCaseArgument, switch_children));

        self.push_sp_kw(&mut children, "end");
        self.comment_run_after_inline(&mut children, &std::mem::take(&mut case.end_comments));

        // Switch-level after comments are extracted to sit after END
        // on a new line.
        let switch_after: Vec<SmolStr> = switch_comments.after().cloned().collect();
        switch_comments.clear();
        for text in &switch_after {
            if let Some(token) = self.comment_token(text) {
                children.push(SqlToken::CommentNewline);
                children.push(token);
            }
        }

        self.comments_after(&mut children, &mut node_comments);
        out.push(self.container(ContainerType::CaseExpression, children));
    }

    fn comment_run_after_inline(&self, out: &mut Vec<SqlToken>, texts: &[SmolStr]) {
        for text in texts {
            if let Some(token) = self.comment_token(text) {
                out.push(SqlToken::Space);
                out.push(token);
            }
        }
    }
}

/// Collect the comments that lead the CASE's condition (or, with no
/// condition, its first WHEN key), traversing transparent wrappers.
/// A signature over the comment texts deduplicates hoists that nested
/// wrappers would otherwise repeat.
fn hoist_leading_case_comments(case: &mut CaseExpr) -> Vec<SmolStr> {
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut texts: Vec<SmolStr> = Vec::new();

    let target = match &mut case.condition {
        Some(condition) => Some(condition),
        None => case.switch.cases.first_mut().map(|pair| &mut pair.key),
    };
    if let Some(target) = target {
        hoist_from(target, &mut seen, &mut texts);
    }
    texts
}

fn hoist_from(expr: &mut ValueExpr, seen: &mut AHashSet<String>, texts: &mut Vec<SmolStr>) {
    let before: Vec<SmolStr> = expr.comments().before().cloned().collect();
    if !before.is_empty() {
        let signature = before
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("|");
        let after: Vec<SmolStr> = expr.comments().after().cloned().collect();
        let comments = expr.comments_mut();
        comments.clear();
        comments.push(CommentSlot::After, after);
        if seen.insert(signature) {
            texts.extend(before);
        }
    }

    // Transparent wrappers only; anything else keeps its comments.
    match expr {
        ValueExpr::Paren(paren) => hoist_from(&mut paren.inner, seen, texts),
        ValueExpr::Unary(unary) => hoist_from(&mut unary.operand, seen, texts),
        _ => {}
    }
}
