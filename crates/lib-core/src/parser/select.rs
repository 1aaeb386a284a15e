//! SELECT parsing: query terms, set operations, WITH clauses and the
//! clause ladder of a simple select.

use smol_str::SmolStr;

use crate::ast::comments::CommentSlot;
use crate::ast::expr::{HintExpr, TupleExpr};
use crate::ast::query::*;
use crate::errors::SQLParseError;
use crate::lexer::LexemeKind;
use crate::parser::stream::TokenCursor;
use crate::parser::{source, value};

/// Words that can never alias a select item.
const ITEM_STOP_WORDS: &[&str] = &[
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
    "returning",
    "into",
    "on",
    "when",
    "then",
    "end",
];

pub(crate) fn parse_query(cur: &mut TokenCursor) -> Result<Query, SQLParseError> {
    let mut left = parse_query_term(cur)?;

    loop {
        let op = if cur.take_word("union") {
            if cur.take_word("all") {
                SetOperator::UnionAll
            } else {
                SetOperator::Union
            }
        } else if cur.take_word("intersect") {
            if cur.take_word("all") {
                SetOperator::IntersectAll
            } else {
                SetOperator::Intersect
            }
        } else if cur.take_word("except") {
            if cur.take_word("all") {
                SetOperator::ExceptAll
            } else {
                SetOperator::Except
            }
        } else {
            break;
        };

        let right = parse_query_term(cur)?;
        left = Query::Binary(Box::new(BinarySelect {
            left,
            op,
            right,
            comments: Default::default(),
        }));
    }

    Ok(left)
}

fn parse_query_term(cur: &mut TokenCursor) -> Result<Query, SQLParseError> {
    if cur.is_word("values") {
        return Ok(Query::Values(Box::new(parse_values(cur)?)));
    }

    if cur.is_kind(LexemeKind::OpenParen) {
        cur.bump();
        let query = parse_query(cur)?;
        cur.expect_kind(LexemeKind::CloseParen, ") after query")?;
        return Ok(query);
    }

    Ok(Query::Select(Box::new(parse_simple_select(cur)?)))
}

pub(crate) fn parse_values(cur: &mut TokenCursor) -> Result<ValuesQuery, SQLParseError> {
    cur.expect_word("values")?;
    let mut rows = vec![parse_values_row(cur)?];
    while cur.take_kind(LexemeKind::Comma) {
        rows.push(parse_values_row(cur)?);
    }
    Ok(ValuesQuery {
        rows,
        comments: Default::default(),
    })
}

fn parse_values_row(cur: &mut TokenCursor) -> Result<TupleExpr, SQLParseError> {
    let open = cur.expect_kind(LexemeKind::OpenParen, "( to start a VALUES row")?;
    let after_open = cur.take_inline_at(open);
    let mut first = value::parse_value(cur)?;
    first.comments_mut().push(CommentSlot::Before, after_open);

    let mut items = vec![first];
    while cur.take_kind(LexemeKind::Comma) {
        items.push(value::parse_value(cur)?);
    }
    cur.expect_kind(LexemeKind::CloseParen, ") to end a VALUES row")?;
    Ok(TupleExpr::new(items))
}

pub(crate) fn parse_simple_select(cur: &mut TokenCursor) -> Result<SimpleSelect, SQLParseError> {
    let mut select = SimpleSelect::default();

    if cur.is_word("with") {
        select.with = Some(parse_with_clause(cur)?);
    }

    let lead = cur.take_leading_here();
    let select_kw = cur.expect_word("select")?;
    select.comments.push(CommentSlot::Before, lead);

    // Optimizer hints ride on the SELECT keyword as `+`-prefixed block
    // comments; everything else stays clause commentary.
    let mut clause_comments = Vec::new();
    for comment in cur.take_inline_at(select_kw) {
        if let Some(hint) = comment.strip_prefix('+') {
            select.select.hints.push(HintExpr {
                text: SmolStr::new(hint.trim()),
                comments: Default::default(),
            });
        } else {
            clause_comments.push(comment);
        }
    }
    select
        .select
        .comments
        .push(CommentSlot::Before, clause_comments);

    if cur.take_word("all") {
        // ALL is the default set quantifier; nothing to record.
    } else if cur.take_word("distinct") {
        if cur.take_word("on") {
            cur.expect_kind(LexemeKind::OpenParen, "( after DISTINCT ON")?;
            let mut exprs = vec![value::parse_value(cur)?];
            while cur.take_kind(LexemeKind::Comma) {
                exprs.push(value::parse_value(cur)?);
            }
            cur.expect_kind(LexemeKind::CloseParen, ") after DISTINCT ON")?;
            select.select.distinct = Some(Distinct::DistinctOn(exprs));
        } else {
            select.select.distinct = Some(Distinct::Distinct);
        }
    }

    select.select.items.push(parse_select_item(cur)?);
    while cur.take_kind(LexemeKind::Comma) {
        select.select.items.push(parse_select_item(cur)?);
    }

    if cur.is_word("from") {
        select.from = Some(source::parse_from_clause(cur)?);
    }
    if cur.is_word("where") {
        let lead = cur.take_leading_here();
        cur.bump();
        let condition = value::parse_value(cur)?;
        let mut clause = WhereClause {
            condition,
            comments: Default::default(),
        };
        clause.comments.push(CommentSlot::Before, lead);
        clause
            .comments
            .push(CommentSlot::After, cur.take_inline_prev());
        select.where_clause = Some(clause);
    }
    if cur.take_words(&["group", "by"]) {
        let mut items = vec![value::parse_value(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            items.push(value::parse_value(cur)?);
        }
        let mut clause = GroupByClause {
            items,
            comments: Default::default(),
        };
        clause
            .comments
            .push(CommentSlot::After, cur.take_inline_prev());
        select.group_by = Some(clause);
    }
    if cur.take_word("having") {
        let condition = value::parse_value(cur)?;
        let mut clause = HavingClause {
            condition,
            comments: Default::default(),
        };
        clause
            .comments
            .push(CommentSlot::After, cur.take_inline_prev());
        select.having = Some(clause);
    }
    if cur.take_word("window") {
        let mut windows = vec![parse_window_def(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            windows.push(parse_window_def(cur)?);
        }
        select.window = Some(WindowClause {
            windows,
            comments: Default::default(),
        });
    }
    if cur.is_word("order") {
        let mut clause = parse_order_by(cur)?;
        clause
            .comments
            .push(CommentSlot::After, cur.take_inline_prev());
        select.order_by = Some(clause);
    }
    if cur.take_word("limit") {
        let mut clause = LimitClause {
            value: value::parse_value(cur)?,
            comments: Default::default(),
        };
        clause
            .comments
            .push(CommentSlot::After, cur.take_inline_prev());
        select.limit = Some(clause);
    }
    if cur.take_word("offset") {
        let value = value::parse_value(cur)?;
        if !cur.take_word("rows") {
            cur.take_word("row");
        }
        let mut clause = OffsetClause {
            value,
            comments: Default::default(),
        };
        clause
            .comments
            .push(CommentSlot::After, cur.take_inline_prev());
        select.offset = Some(clause);
    }
    if cur.is_word("fetch") {
        select.fetch = Some(parse_fetch(cur)?);
    }
    if cur.is_word("for") {
        select.locking = Some(parse_for(cur)?);
    }

    select.rebuild_cte_cache();
    Ok(select)
}

pub(crate) fn parse_with_clause(cur: &mut TokenCursor) -> Result<WithClause, SQLParseError> {
    let lead = cur.take_leading_here();
    cur.expect_word("with")?;
    let recursive = cur.take_word("recursive");

    let mut with = WithClause {
        recursive,
        tables: Vec::new(),
        comments: Default::default(),
    };
    with.comments.push(CommentSlot::Before, lead);

    loop {
        with.tables.push(parse_common_table(cur)?);
        if !cur.take_kind(LexemeKind::Comma) {
            break;
        }
    }

    Ok(with)
}

fn parse_common_table(cur: &mut TokenCursor) -> Result<CommonTable, SQLParseError> {
    let lead = cur.take_leading_here();
    let name = source::parse_identifier(cur)?;

    let mut columns = None;
    if cur.is_kind(LexemeKind::OpenParen) {
        cur.bump();
        let mut list = vec![source::parse_identifier(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            list.push(source::parse_identifier(cur)?);
        }
        cur.expect_kind(LexemeKind::CloseParen, ") after CTE columns")?;
        columns = Some(list);
    }

    let mut as_comments = cur.take_leading_here();
    cur.expect_word("as")?;
    as_comments.extend(cur.take_comments_after_keyword());

    let materialized = if cur.take_word("materialized") {
        Some(Materialized::Materialized)
    } else if cur.take_words(&["not", "materialized"]) {
        Some(Materialized::NotMaterialized)
    } else {
        None
    };

    cur.expect_kind(LexemeKind::OpenParen, "( to start the CTE body")?;
    let query = parse_query(cur)?;
    cur.expect_kind(LexemeKind::CloseParen, ") to end the CTE body")?;

    let mut table = CommonTable {
        name,
        columns,
        materialized,
        query,
        as_comments,
        comments: Default::default(),
    };
    table.comments.push(CommentSlot::Before, lead);
    Ok(table)
}

fn parse_select_item(cur: &mut TokenCursor) -> Result<SelectItem, SQLParseError> {
    let expr = value::parse_value(cur)?;
    let mut item = SelectItem::new(expr);

    if cur.is_word("as") {
        item.as_comments = cur.take_leading_here();
        cur.bump();
        item.as_comments.extend(cur.take_comments_after_keyword());
        item.alias = Some(source::parse_identifier(cur)?);
    } else if cur.peek().is_some_and(|l| match l.kind {
        LexemeKind::QuotedIdentifier => true,
        LexemeKind::Word => !ITEM_STOP_WORDS
            .iter()
            .any(|kw| l.text.eq_ignore_ascii_case(kw)),
        _ => false,
    }) {
        item.alias = Some(source::parse_identifier(cur)?);
    }

    item.comments
        .push(CommentSlot::After, cur.take_inline_prev());
    Ok(item)
}

fn parse_window_def(cur: &mut TokenCursor) -> Result<WindowDef, SQLParseError> {
    let name = source::parse_identifier(cur)?;
    cur.expect_word("as")?;
    cur.expect_kind(LexemeKind::OpenParen, "( after window name")?;
    let spec = value::parse_window_spec(cur)?;
    cur.expect_kind(LexemeKind::CloseParen, ") after window specification")?;
    Ok(WindowDef {
        name,
        spec,
        comments: Default::default(),
    })
}

pub(crate) fn parse_order_by(cur: &mut TokenCursor) -> Result<OrderByClause, SQLParseError> {
    cur.expect_word("order")?;
    cur.expect_word("by")?;

    let mut items = vec![parse_order_by_item(cur)?];
    while cur.take_kind(LexemeKind::Comma) {
        items.push(parse_order_by_item(cur)?);
    }

    Ok(OrderByClause {
        items,
        comments: Default::default(),
    })
}

fn parse_order_by_item(cur: &mut TokenCursor) -> Result<OrderByItem, SQLParseError> {
    let value = value::parse_value(cur)?;

    let direction = if cur.take_word("asc") {
        Some(SortDirection::Asc)
    } else if cur.take_word("desc") {
        Some(SortDirection::Desc)
    } else {
        None
    };

    let nulls = if cur.take_word("nulls") {
        if cur.take_word("first") {
            Some(NullsPosition::First)
        } else if cur.take_word("last") {
            Some(NullsPosition::Last)
        } else {
            return Err(cur.error("expected FIRST or LAST after NULLS"));
        }
    } else {
        None
    };

    Ok(OrderByItem {
        value,
        direction,
        nulls,
        comments: Default::default(),
    })
}

fn parse_fetch(cur: &mut TokenCursor) -> Result<FetchClause, SQLParseError> {
    cur.expect_word("fetch")?;
    let first = if cur.take_word("first") {
        FetchFirst::First
    } else if cur.take_word("next") {
        FetchFirst::Next
    } else {
        return Err(cur.error("expected FIRST or NEXT after FETCH"));
    };

    let count = if cur.is_any_word(&["row", "rows"]) {
        None
    } else {
        Some(value::parse_value(cur)?)
    };

    let unit = if cur.take_word("rows") {
        FetchUnit::Rows
    } else if cur.take_word("row") {
        FetchUnit::Row
    } else {
        return Err(cur.error("expected ROW or ROWS"));
    };

    let ties = if cur.take_word("only") {
        FetchTies::Only
    } else if cur.take_words(&["with", "ties"]) {
        FetchTies::WithTies
    } else {
        return Err(cur.error("expected ONLY or WITH TIES"));
    };

    Ok(FetchClause {
        first,
        count,
        unit,
        ties,
        comments: Default::default(),
    })
}

fn parse_for(cur: &mut TokenCursor) -> Result<ForClause, SQLParseError> {
    cur.expect_word("for")?;
    let lock = if cur.take_word("update") {
        LockMode::Update
    } else if cur.take_words(&["no", "key", "update"]) {
        LockMode::NoKeyUpdate
    } else if cur.take_word("share") {
        LockMode::Share
    } else if cur.take_words(&["key", "share"]) {
        LockMode::KeyShare
    } else {
        return Err(cur.error("expected a lock mode after FOR"));
    };

    Ok(ForClause {
        lock,
        comments: Default::default(),
    })
}
