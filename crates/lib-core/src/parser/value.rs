//! Value-expression parsing: precedence climbing over the lexeme
//! stream, with comment trivia attached to the node that consumes it.

use smol_str::SmolStr;

use crate::ast::comments::CommentSlot;
use crate::ast::expr::*;
use crate::errors::SQLParseError;
use crate::lexer::LexemeKind;
use crate::parser::select;
use crate::parser::stream::TokenCursor;

/// Words that terminate an expression context. A bare word atom is
/// never one of these; they belong to the surrounding clause grammar.
const STOP_WORDS: &[&str] = &[
    "from",
    "where",
    "group",
    "having",
    "window",
    "order",
    "limit",
    "offset",
    "fetch",
    "for",
    "union",
    "intersect",
    "except",
    "on",
    "using",
    "join",
    "inner",
    "left",
    "right",
    "full",
    "cross",
    "lateral",
    "as",
    "when",
    "then",
    "else",
    "end",
    "asc",
    "desc",
    "nulls",
    "returning",
    "set",
    "values",
    "into",
    "and",
    "or",
];

pub(crate) fn parse_value(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    parse_binary(cur, 0)
}

const BP_OR: u8 = 1;
const BP_AND: u8 = 2;
const BP_COMPARISON: u8 = 3;
const BP_CONCAT: u8 = 4;
const BP_ADDITIVE: u8 = 5;
const BP_MULTIPLICATIVE: u8 = 6;

fn parse_binary(cur: &mut TokenCursor, min_bp: u8) -> Result<ValueExpr, SQLParseError> {
    let mut lhs = parse_unary(cur)?;

    loop {
        let Some((op, bp)) = peek_operator(cur) else {
            break;
        };
        if bp < min_bp {
            break;
        }

        match op.as_str() {
            "between" | "not between" => {
                consume_operator(cur, &op);
                lhs = parse_between(cur, lhs, op == "not between")?;
            }
            "in" | "not in" => {
                consume_operator(cur, &op);
                let rhs = parse_in_rhs(cur)?;
                lhs = binary(lhs, op, rhs);
            }
            "is" | "is not" => {
                consume_operator(cur, &op);
                let rhs = parse_unary(cur)?;
                lhs = binary(lhs, op, rhs);
            }
            _ => {
                consume_operator(cur, &op);
                let rhs = parse_binary(cur, bp + 1)?;
                lhs = binary(lhs, op, rhs);
            }
        }
    }

    Ok(lhs)
}

/// The operator at the cursor, with its binding power. Multi-lexeme
/// operators (IS NOT, NOT IN, ...) are reported as one.
fn peek_operator(cur: &TokenCursor) -> Option<(SmolStr, u8)> {
    if let Some(lexeme) = cur.peek()
        && lexeme.kind == LexemeKind::Operator
    {
        let bp = match lexeme.text.as_str() {
            "=" | "<>" | "!=" | "<" | ">" | "<=" | ">=" | "<=>" => BP_COMPARISON,
            "||" => BP_CONCAT,
            "+" | "-" => BP_ADDITIVE,
            "::" | "[" | ":" => return None,
            _ => BP_MULTIPLICATIVE,
        };
        return Some((lexeme.text.clone(), bp));
    }

    let word = cur.peek().filter(|l| l.kind == LexemeKind::Word)?;
    let lowered = word.text.to_ascii_lowercase();
    match lowered.as_str() {
        "or" => Some((SmolStr::new("or"), BP_OR)),
        "and" => Some((SmolStr::new("and"), BP_AND)),
        "like" | "ilike" | "in" | "between" => Some((SmolStr::new(lowered), BP_COMPARISON)),
        "is" => {
            if cur.is_word_at(1, "not") {
                Some((SmolStr::new("is not"), BP_COMPARISON))
            } else {
                Some((SmolStr::new("is"), BP_COMPARISON))
            }
        }
        "not" => {
            let next = cur.peek_at(1)?;
            if next.kind == LexemeKind::Word {
                match next.text.to_ascii_lowercase().as_str() {
                    "in" => Some((SmolStr::new("not in"), BP_COMPARISON)),
                    "like" => Some((SmolStr::new("not like"), BP_COMPARISON)),
                    "ilike" => Some((SmolStr::new("not ilike"), BP_COMPARISON)),
                    "between" => Some((SmolStr::new("not between"), BP_COMPARISON)),
                    _ => None,
                }
            } else {
                None
            }
        }
        _ => None,
    }
}

fn consume_operator(cur: &mut TokenCursor, op: &str) {
    let words = op.split(' ').count();
    for _ in 0..words {
        cur.bump();
    }
}

fn binary(left: ValueExpr, op: SmolStr, right: ValueExpr) -> ValueExpr {
    ValueExpr::Binary(Box::new(BinaryExpr {
        left,
        op,
        right,
        comments: Default::default(),
    }))
}

fn parse_between(
    cur: &mut TokenCursor,
    operand: ValueExpr,
    negated: bool,
) -> Result<ValueExpr, SQLParseError> {
    let lower = parse_binary(cur, BP_CONCAT)?;
    cur.expect_word("and")?;
    let upper = parse_binary(cur, BP_CONCAT)?;
    Ok(ValueExpr::Between(Box::new(BetweenExpr {
        negated,
        operand,
        lower,
        upper,
        comments: Default::default(),
    })))
}

fn parse_in_rhs(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    cur.expect_kind(LexemeKind::OpenParen, "( after IN")?;
    if cur.is_any_word(&["select", "with", "values"]) {
        let query = select::parse_query(cur)?;
        cur.expect_kind(LexemeKind::CloseParen, ") after subquery")?;
        return Ok(ValueExpr::InlineQuery(Box::new(InlineQuery {
            query,
            comments: Default::default(),
        })));
    }
    let mut items = vec![parse_value(cur)?];
    while cur.take_kind(LexemeKind::Comma) {
        items.push(parse_value(cur)?);
    }
    cur.expect_kind(LexemeKind::CloseParen, ") after IN list")?;
    Ok(ValueExpr::Tuple(TupleExpr::new(items)))
}

fn parse_unary(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    if cur.is_word("not") && peek_operator(cur).is_none() {
        cur.bump();
        let operand = parse_binary(cur, BP_COMPARISON)?;
        return Ok(unary("not", operand));
    }
    if cur.is_word("exists") {
        cur.bump();
        let operand = parse_atom(cur)?;
        return Ok(unary("exists", operand));
    }
    if cur.is_operator("-") || cur.is_operator("+") || cur.is_operator("~") {
        let op = cur.text().unwrap().clone();
        cur.bump();
        let operand = parse_unary(cur)?;
        return Ok(ValueExpr::Unary(Box::new(UnaryExpr {
            op,
            operand,
            comments: Default::default(),
        })));
    }
    parse_postfix(cur)
}

fn unary(op: &str, operand: ValueExpr) -> ValueExpr {
    ValueExpr::Unary(Box::new(UnaryExpr {
        op: SmolStr::new(op),
        operand,
        comments: Default::default(),
    }))
}

/// Postfix operators bind tighter than anything infix: `::type`,
/// `[index]` and `[lower:upper]`.
fn parse_postfix(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    let mut expr = parse_atom(cur)?;
    loop {
        if cur.take_operator("::") {
            let ty = parse_type(cur)?;
            expr = ValueExpr::Cast(Box::new(CastExpr {
                input: expr,
                ty,
                comments: Default::default(),
            }));
        } else if cur.take_kind(LexemeKind::OpenBracket) {
            expr = parse_subscript(cur, expr)?;
        } else {
            break;
        }
    }
    Ok(expr)
}

fn parse_subscript(cur: &mut TokenCursor, base: ValueExpr) -> Result<ValueExpr, SQLParseError> {
    let lower = if cur.is_operator(":") {
        None
    } else {
        Some(parse_value(cur)?)
    };

    if cur.take_operator(":") {
        let upper = if cur.is_kind(LexemeKind::CloseBracket) {
            None
        } else {
            Some(parse_value(cur)?)
        };
        cur.expect_kind(LexemeKind::CloseBracket, "] after array slice")?;
        return Ok(ValueExpr::ArraySlice(Box::new(ArraySliceExpr {
            base,
            lower,
            upper,
            comments: Default::default(),
        })));
    }

    cur.expect_kind(LexemeKind::CloseBracket, "] after array index")?;
    let index = lower.ok_or_else(|| cur.error("expected array index"))?;
    Ok(ValueExpr::ArrayIndex(Box::new(ArrayIndexExpr {
        base,
        index,
        comments: Default::default(),
    })))
}

fn parse_atom(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    let lead = cur.take_leading_here();
    let mut expr = parse_atom_inner(cur)?;
    expr.comments_mut().push(CommentSlot::Before, lead);
    Ok(expr)
}

fn parse_atom_inner(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    let Some(lexeme) = cur.peek() else {
        return Err(cur.error("expected expression"));
    };

    match lexeme.kind {
        LexemeKind::Number => {
            let value = lexeme.text.clone();
            cur.bump();
            Ok(ValueExpr::Literal(LiteralValue::new(
                value,
                LiteralKind::Number,
            )))
        }
        LexemeKind::StringLiteral => {
            let value = lexeme.text.clone();
            cur.bump();
            Ok(ValueExpr::Literal(LiteralValue::new(
                value,
                LiteralKind::String,
            )))
        }
        LexemeKind::DollarString => {
            let value = lexeme.text.clone();
            cur.bump();
            Ok(ValueExpr::Literal(LiteralValue::new(
                value,
                LiteralKind::DollarString,
            )))
        }
        LexemeKind::Parameter => {
            let name = lexeme.text.clone();
            cur.bump();
            let index = name.parse::<usize>().ok();
            Ok(ValueExpr::Parameter(ParameterExpr {
                name,
                index,
                value: None,
                comments: Default::default(),
            }))
        }
        LexemeKind::OpenParen => parse_paren(cur),
        LexemeKind::Operator if lexeme.text == "*" => {
            cur.bump();
            Ok(ValueExpr::Column(ColumnRef::new(Vec::new(), "*")))
        }
        LexemeKind::Word | LexemeKind::QuotedIdentifier => parse_word_atom(cur),
        _ => Err(cur.error(format!("unexpected {:?}", lexeme.text))),
    }
}

fn parse_word_atom(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    let lexeme = cur.peek().expect("caller checked");

    if lexeme.kind == LexemeKind::Word {
        let lowered = lexeme.text.to_ascii_lowercase();
        match lowered.as_str() {
            "case" => return parse_case(cur),
            "cast" => return parse_cast(cur),
            "array" => return parse_array(cur),
            "true" | "false" => {
                let value = lexeme.text.clone();
                cur.bump();
                return Ok(ValueExpr::Literal(LiteralValue::new(
                    value,
                    LiteralKind::Boolean,
                )));
            }
            "null" => {
                let value = lexeme.text.clone();
                cur.bump();
                return Ok(ValueExpr::Literal(LiteralValue::new(
                    value,
                    LiteralKind::Null,
                )));
            }
            "default" | "current_date" | "current_time" | "current_timestamp" | "localtime"
            | "localtimestamp" => {
                let value = lexeme.text.clone();
                cur.bump();
                return Ok(ValueExpr::Literal(LiteralValue::new(
                    value,
                    LiteralKind::Raw,
                )));
            }
            "distinct" => {
                // Inside aggregate arguments: count(distinct x).
                cur.bump();
                let operand = parse_value(cur)?;
                return Ok(unary("distinct", operand));
            }
            _ if STOP_WORDS.contains(&lowered.as_str()) => {
                return Err(cur.error(format!("expected expression, found {:?}", lexeme.text)));
            }
            _ => {}
        }
    }

    // A dotted name path, possibly ending in `*` or a call.
    let mut parts: Vec<SmolStr> = vec![cur.text().unwrap().clone()];
    cur.bump();
    let mut wildcard = false;
    while cur.is_kind(LexemeKind::Dot) {
        cur.bump();
        if cur.is_operator("*") {
            cur.bump();
            wildcard = true;
            break;
        }
        let Some(part) = cur.peek().filter(|l| {
            matches!(l.kind, LexemeKind::Word | LexemeKind::QuotedIdentifier)
        }) else {
            return Err(cur.error("expected identifier after ."));
        };
        parts.push(part.text.clone());
        cur.bump();
    }

    if wildcard {
        return Ok(ValueExpr::Column(ColumnRef::new(parts, "*")));
    }

    if cur.is_kind(LexemeKind::OpenParen) {
        return parse_function_call(cur, parts);
    }

    let name = parts.pop().expect("at least one part");
    Ok(ValueExpr::Column(ColumnRef::new(parts, name)))
}

fn parse_paren(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    let open = cur.bump();
    let after_open = cur.take_inline_at(open);

    if cur.is_any_word(&["select", "with", "values"]) {
        let query = select::parse_query(cur)?;
        cur.expect_kind(LexemeKind::CloseParen, ") after subquery")?;
        let mut inline = InlineQuery {
            query,
            comments: Default::default(),
        };
        inline.comments.push(CommentSlot::Before, after_open);
        return Ok(ValueExpr::InlineQuery(Box::new(inline)));
    }

    let mut inner = parse_value(cur)?;
    inner.comments_mut().push(CommentSlot::Before, after_open);

    if cur.is_kind(LexemeKind::Comma) {
        let mut items = vec![inner];
        while cur.take_kind(LexemeKind::Comma) {
            items.push(parse_value(cur)?);
        }
        cur.expect_kind(LexemeKind::CloseParen, ") after tuple")?;
        return Ok(ValueExpr::Tuple(TupleExpr::new(items)));
    }

    let before_close = cur.take_inline_prev();
    let mut closing = cur.take_leading_here();
    cur.expect_kind(LexemeKind::CloseParen, ") after expression")?;
    let mut after = before_close;
    after.append(&mut closing);
    inner.comments_mut().push(CommentSlot::After, after);

    Ok(ValueExpr::Paren(Box::new(ParenExpr {
        inner,
        comments: Default::default(),
    })))
}

fn parse_case(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    cur.expect_word("case")?;
    let after_case = cur.take_comments_after_keyword();

    let condition = if cur.is_word("when") {
        None
    } else {
        let mut condition = parse_value(cur)?;
        condition
            .comments_mut()
            .push(CommentSlot::Before, after_case.clone());
        Some(condition)
    };

    let mut switch = SwitchCaseArgument {
        cases: Vec::new(),
        else_value: None,
        comments: Default::default(),
    };

    let mut first = true;
    while cur.take_word("when") {
        let mut key = parse_value(cur)?;
        if first && condition.is_none() {
            key.comments_mut()
                .push(CommentSlot::Before, after_case.clone());
        }
        first = false;
        cur.expect_word("then")?;
        let then_comments = cur.take_comments_after_keyword();
        let value = parse_value(cur)?;
        switch.cases.push(CaseKeyValuePair {
            key,
            value,
            then_comments,
            comments: Default::default(),
        });
    }
    if switch.cases.is_empty() {
        return Err(cur.error("CASE requires at least one WHEN"));
    }

    if cur.take_word("else") {
        switch.else_value = Some(parse_value(cur)?);
    }

    let before_end = cur.take_leading_here();
    switch.comments.push(CommentSlot::After, before_end);
    cur.expect_word("end")?;

    Ok(ValueExpr::Case(Box::new(CaseExpr {
        condition,
        switch,
        end_comments: Vec::new(),
        comments: Default::default(),
    })))
}

fn parse_cast(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    cur.expect_word("cast")?;
    cur.expect_kind(LexemeKind::OpenParen, "( after CAST")?;
    let input = parse_value(cur)?;
    cur.expect_word("as")?;
    let ty = parse_type(cur)?;
    cur.expect_kind(LexemeKind::CloseParen, ") after CAST")?;
    Ok(ValueExpr::Cast(Box::new(CastExpr {
        input,
        ty,
        comments: Default::default(),
    })))
}

fn parse_array(cur: &mut TokenCursor) -> Result<ValueExpr, SQLParseError> {
    cur.expect_word("array")?;

    if cur.take_kind(LexemeKind::OpenBracket) {
        let mut items = Vec::new();
        if !cur.is_kind(LexemeKind::CloseBracket) {
            items.push(parse_value(cur)?);
            while cur.take_kind(LexemeKind::Comma) {
                items.push(parse_value(cur)?);
            }
        }
        cur.expect_kind(LexemeKind::CloseBracket, "] after array literal")?;
        return Ok(ValueExpr::Array(Box::new(ArrayExpr {
            items,
            comments: Default::default(),
        })));
    }

    cur.expect_kind(LexemeKind::OpenParen, "( or [ after ARRAY")?;
    let query = select::parse_query(cur)?;
    cur.expect_kind(LexemeKind::CloseParen, ") after array subquery")?;
    Ok(ValueExpr::ArrayQuery(Box::new(ArrayQueryExpr {
        query,
        comments: Default::default(),
    })))
}

pub(crate) fn parse_function_call(
    cur: &mut TokenCursor,
    parts: Vec<SmolStr>,
) -> Result<ValueExpr, SQLParseError> {
    let mut parts = parts;
    let name = parts.pop().expect("function name");
    let name = QualifiedName::new(parts, name);

    cur.expect_kind(LexemeKind::OpenParen, "( after function name")?;
    let mut args = Vec::new();
    let mut internal_order_by = None;
    if !cur.is_kind(LexemeKind::CloseParen) {
        args.push(parse_value(cur)?);
        while cur.take_kind(LexemeKind::Comma) {
            args.push(parse_value(cur)?);
        }
        if cur.is_word("order") {
            internal_order_by = Some(select::parse_order_by(cur)?);
        }
    }
    cur.expect_kind(LexemeKind::CloseParen, ") after function arguments")?;

    let mut call = FunctionCall::new(name, args);
    call.internal_order_by = internal_order_by;

    if cur.take_words(&["with", "ordinality"]) {
        call.with_ordinality = true;
    }

    if cur.take_word("over") {
        call.over = Some(parse_over(cur)?);
    }

    Ok(ValueExpr::Function(Box::new(call)))
}

fn parse_over(cur: &mut TokenCursor) -> Result<OverClause, SQLParseError> {
    if !cur.is_kind(LexemeKind::OpenParen) {
        let Some(name) = cur.text().cloned() else {
            return Err(cur.error("expected window name or specification"));
        };
        cur.bump();
        return Ok(OverClause {
            window: OverWindow::Name(name),
            comments: Default::default(),
        });
    }

    cur.bump();
    let spec = parse_window_spec(cur)?;
    cur.expect_kind(LexemeKind::CloseParen, ") after window specification")?;
    Ok(OverClause {
        window: OverWindow::Spec(spec),
        comments: Default::default(),
    })
}

pub(crate) fn parse_window_spec(cur: &mut TokenCursor) -> Result<WindowSpec, SQLParseError> {
    let mut spec = WindowSpec {
        partition_by: Vec::new(),
        order_by: None,
        frame: None,
        comments: Default::default(),
    };

    if cur.take_words(&["partition", "by"]) {
        spec.partition_by.push(parse_value(cur)?);
        while cur.take_kind(LexemeKind::Comma) {
            spec.partition_by.push(parse_value(cur)?);
        }
    }
    if cur.is_word("order") {
        spec.order_by = Some(select::parse_order_by(cur)?);
    }

    let unit = if cur.take_word("rows") {
        Some(FrameUnit::Rows)
    } else if cur.take_word("range") {
        Some(FrameUnit::Range)
    } else if cur.take_word("groups") {
        Some(FrameUnit::Groups)
    } else {
        None
    };

    if let Some(unit) = unit {
        let (start, end) = if cur.take_word("between") {
            let start = parse_frame_bound(cur)?;
            cur.expect_word("and")?;
            let end = parse_frame_bound(cur)?;
            (start, Some(end))
        } else {
            (parse_frame_bound(cur)?, None)
        };
        spec.frame = Some(WindowFrameSpec {
            unit,
            start,
            end,
            comments: Default::default(),
        });
    }

    Ok(spec)
}

fn parse_frame_bound(cur: &mut TokenCursor) -> Result<FrameBound, SQLParseError> {
    if cur.take_words(&["unbounded", "preceding"]) {
        return Ok(FrameBound::UnboundedPreceding);
    }
    if cur.take_words(&["unbounded", "following"]) {
        return Ok(FrameBound::UnboundedFollowing);
    }
    if cur.take_words(&["current", "row"]) {
        return Ok(FrameBound::CurrentRow);
    }
    let offset = parse_value(cur)?;
    if cur.take_word("preceding") {
        Ok(FrameBound::Preceding(offset))
    } else if cur.take_word("following") {
        Ok(FrameBound::Following(offset))
    } else {
        Err(cur.error("expected PRECEDING or FOLLOWING"))
    }
}

/// Parse a type name: a word (with the standard multi-word spellings)
/// plus optional precision arguments.
pub(crate) fn parse_type(cur: &mut TokenCursor) -> Result<TypeExpr, SQLParseError> {
    let Some(lexeme) = cur
        .peek()
        .filter(|l| matches!(l.kind, LexemeKind::Word | LexemeKind::QuotedIdentifier))
    else {
        return Err(cur.error("expected type name"));
    };
    let mut name = lexeme.text.to_string();
    cur.bump();

    let lowered = name.to_ascii_lowercase();
    match lowered.as_str() {
        "double" if cur.is_word("precision") => {
            cur.bump();
            name.push_str(" precision");
        }
        "character" if cur.is_word("varying") => {
            cur.bump();
            name.push_str(" varying");
        }
        "timestamp" | "time" => {
            if cur.take_words(&["with", "time", "zone"]) {
                name.push_str(" with time zone");
            } else if cur.take_words(&["without", "time", "zone"]) {
                name.push_str(" without time zone");
            }
        }
        _ => {}
    }

    let mut ty = TypeExpr::new(name);

    if cur.is_kind(LexemeKind::OpenParen) {
        cur.bump();
        let mut args = vec![parse_value(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            args.push(parse_value(cur)?);
        }
        cur.expect_kind(LexemeKind::CloseParen, ") after type arguments")?;
        ty.args = Some(args);
    }

    Ok(ty)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> ValueExpr {
        let lexemes = Lexer::default().tokenize(src).unwrap().lexemes;
        let mut cur = TokenCursor::new(lexemes);
        let expr = parse_value(&mut cur).unwrap();
        assert!(cur.is_eof(), "trailing input in {src:?}");
        expr
    }

    #[test]
    fn precedence_and_over_or() {
        let ValueExpr::Binary(top) = parse("a or b and c") else {
            panic!("expected binary");
        };
        assert_eq!(top.op, "or");
        let ValueExpr::Binary(rhs) = &top.right else {
            panic!("expected nested and");
        };
        assert_eq!(rhs.op, "and");
    }

    #[test]
    fn comparison_binds_tighter_than_and() {
        let ValueExpr::Binary(top) = parse("x = 1 and y = 2") else {
            panic!("expected binary");
        };
        assert_eq!(top.op, "and");
    }

    #[test]
    fn multiplication_over_addition() {
        let ValueExpr::Binary(top) = parse("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(top.op, "+");
        let ValueExpr::Binary(rhs) = &top.right else {
            panic!("expected nested mul");
        };
        assert_eq!(rhs.op, "*");
    }

    #[test]
    fn qualified_column_and_wildcard() {
        let ValueExpr::Column(col) = parse("s.t.c") else {
            panic!("expected column");
        };
        assert_eq!(col.namespaces, vec![SmolStr::new("s"), SmolStr::new("t")]);
        assert_eq!(col.name, "c");

        let ValueExpr::Column(star) = parse("t.*") else {
            panic!("expected wildcard");
        };
        assert!(star.is_wildcard());
        assert_eq!(star.qualifier().map(|s| s.as_str()), Some("t"));
    }

    #[test]
    fn function_call_with_over() {
        let ValueExpr::Function(call) = parse("row_number() over (partition by d order by x)")
        else {
            panic!("expected function");
        };
        assert_eq!(call.name.name, "row_number");
        let Some(OverClause {
            window: OverWindow::Spec(spec),
            ..
        }) = &call.over
        else {
            panic!("expected window spec");
        };
        assert_eq!(spec.partition_by.len(), 1);
        assert!(spec.order_by.is_some());
    }

    #[test]
    fn double_colon_cast_matches_cast_call() {
        let a = parse("cast(x as int)");
        let b = parse("x::int");
        assert_eq!(a, b);
    }

    #[test]
    fn between_and_not_between() {
        let ValueExpr::Between(between) = parse("x between 1 and 10") else {
            panic!("expected between");
        };
        assert!(!between.negated);

        let ValueExpr::Between(negated) = parse("x not between 1 and 10") else {
            panic!("expected between");
        };
        assert!(negated.negated);
    }

    #[test]
    fn in_list_and_in_subquery() {
        let ValueExpr::Binary(list) = parse("x in (1, 2, 3)") else {
            panic!("expected binary");
        };
        assert_eq!(list.op, "in");
        assert!(matches!(list.right, ValueExpr::Tuple(_)));

        let ValueExpr::Binary(sub) = parse("x not in (select id from t)") else {
            panic!("expected binary");
        };
        assert_eq!(sub.op, "not in");
        assert!(matches!(sub.right, ValueExpr::InlineQuery(_)));
    }

    #[test]
    fn is_not_null() {
        let ValueExpr::Binary(expr) = parse("x is not null") else {
            panic!("expected binary");
        };
        assert_eq!(expr.op, "is not");
        assert!(matches!(
            expr.right,
            ValueExpr::Literal(LiteralValue {
                kind: LiteralKind::Null,
                ..
            })
        ));
    }

    #[test]
    fn case_with_leading_comment_attaches_to_first_key() {
        let expr = parse("case /*c*/ when x then 1 end");
        let ValueExpr::Case(case) = expr else {
            panic!("expected case");
        };
        assert!(case.condition.is_none());
        let before: Vec<_> = case.switch.cases[0]
            .key
            .comments()
            .before()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(before, ["c"]);
    }

    #[test]
    fn array_literal_index_and_slice() {
        assert!(matches!(parse("array[1, 2]"), ValueExpr::Array(_)));
        assert!(matches!(parse("xs[1]"), ValueExpr::ArrayIndex(_)));
        assert!(matches!(parse("xs[1:3]"), ValueExpr::ArraySlice(_)));
        assert!(matches!(parse("xs[:3]"), ValueExpr::ArraySlice(_)));
    }

    #[test]
    fn parameters_parse_with_index() {
        let ValueExpr::Parameter(named) = parse(":limit_rows") else {
            panic!("expected parameter");
        };
        assert_eq!(named.name, "limit_rows");
        assert_eq!(named.index, None);

        let ValueExpr::Parameter(indexed) = parse("$2") else {
            panic!("expected parameter");
        };
        assert_eq!(indexed.index, Some(2));
    }

    #[test]
    fn paren_comments_attach_to_inner() {
        let ValueExpr::Paren(paren) = parse("(/* in */ x /* out */)") else {
            panic!("expected paren");
        };
        let before: Vec<_> = paren.inner.comments().before().map(|s| s.as_str()).collect();
        let after: Vec<_> = paren.inner.comments().after().map(|s| s.as_str()).collect();
        assert_eq!(before, ["in"]);
        assert_eq!(after, ["out"]);
    }
}
