//! INSERT / UPDATE / DELETE / MERGE parsing.

use smol_str::SmolStr;

use crate::ast::dml::*;
use crate::ast::expr::{ColumnRef, IdentifierExpr, QualifiedName};
use crate::ast::query::{SelectItem, WhereClause, WithClause};
use crate::errors::SQLParseError;
use crate::lexer::LexemeKind;
use crate::parser::stream::TokenCursor;
use crate::parser::{select, source, value};

pub(crate) fn parse_insert(
    cur: &mut TokenCursor,
    with: Option<WithClause>,
) -> Result<InsertQuery, SQLParseError> {
    cur.expect_word("insert")?;
    cur.expect_word("into")?;
    let target = parse_qualified_name(cur)?;

    // A parenthesized column list is only a column list when it is
    // followed by a row source; `insert into t (select ...)` is legal.
    let mut columns = None;
    if cur.is_kind(LexemeKind::OpenParen) {
        let checkpoint = cur.checkpoint();
        cur.bump();
        if !cur.is_any_word(&["select", "with", "values"]) {
            let mut list = vec![source::parse_identifier(cur)?];
            let mut ok = true;
            while cur.take_kind(LexemeKind::Comma) {
                match source::parse_identifier(cur) {
                    Ok(identifier) => list.push(identifier),
                    Err(_) => {
                        ok = false;
                        break;
                    }
                }
            }
            if ok && cur.take_kind(LexemeKind::CloseParen) {
                columns = Some(list);
            } else {
                cur.rewind(checkpoint);
            }
        } else {
            cur.rewind(checkpoint);
        }
    }

    let source = if cur.take_words(&["default", "values"]) {
        InsertSource::DefaultValues
    } else {
        InsertSource::Query(select::parse_query(cur)?)
    };

    let returning = parse_returning(cur)?;

    Ok(InsertQuery {
        with,
        target,
        columns,
        source,
        returning,
        header_comments: Vec::new(),
        comments: Default::default(),
    })
}

pub(crate) fn parse_update(
    cur: &mut TokenCursor,
    with: Option<WithClause>,
) -> Result<UpdateQuery, SQLParseError> {
    cur.expect_word("update")?;
    let target = source::parse_source(cur)?;
    cur.expect_word("set")?;
    let set = parse_set_items(cur)?;

    let from = if cur.is_word("from") {
        Some(source::parse_from_clause(cur)?)
    } else {
        None
    };
    let where_clause = parse_where(cur)?;
    let returning = parse_returning(cur)?;

    Ok(UpdateQuery {
        with,
        target,
        set,
        from,
        where_clause,
        returning,
        header_comments: Vec::new(),
        comments: Default::default(),
    })
}

pub(crate) fn parse_delete(
    cur: &mut TokenCursor,
    with: Option<WithClause>,
) -> Result<DeleteQuery, SQLParseError> {
    cur.expect_word("delete")?;
    cur.expect_word("from")?;
    let target = source::parse_source(cur)?;

    let using = if cur.take_word("using") {
        let mut sources = vec![source::parse_source(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            sources.push(source::parse_source(cur)?);
        }
        Some(UsingClause {
            sources,
            comments: Default::default(),
        })
    } else {
        None
    };

    let where_clause = parse_where(cur)?;
    let returning = parse_returning(cur)?;

    Ok(DeleteQuery {
        with,
        target,
        using,
        where_clause,
        returning,
        header_comments: Vec::new(),
        comments: Default::default(),
    })
}

pub(crate) fn parse_merge(
    cur: &mut TokenCursor,
    with: Option<WithClause>,
) -> Result<MergeQuery, SQLParseError> {
    cur.expect_word("merge")?;
    cur.expect_word("into")?;
    let target = source::parse_source(cur)?;
    cur.expect_word("using")?;
    let merge_source = source::parse_source(cur)?;
    cur.expect_word("on")?;
    let on = value::parse_value(cur)?;

    let mut when_clauses = Vec::new();
    while cur.is_word("when") {
        when_clauses.push(parse_merge_when(cur)?);
    }
    if when_clauses.is_empty() {
        return Err(cur.error("MERGE requires at least one WHEN clause"));
    }

    Ok(MergeQuery {
        with,
        target,
        source: merge_source,
        on,
        when_clauses,
        header_comments: Vec::new(),
        comments: Default::default(),
    })
}

fn parse_merge_when(cur: &mut TokenCursor) -> Result<MergeWhenClause, SQLParseError> {
    cur.expect_word("when")?;

    let kind = if cur.take_word("matched") {
        MergeMatchKind::Matched
    } else if cur.take_words(&["not", "matched", "by", "source"]) {
        MergeMatchKind::NotMatchedBySource
    } else if cur.take_words(&["not", "matched", "by", "target"]) {
        MergeMatchKind::NotMatchedByTarget
    } else if cur.take_words(&["not", "matched"]) {
        MergeMatchKind::NotMatched
    } else {
        return Err(cur.error("expected MATCHED or NOT MATCHED"));
    };

    let condition = if cur.take_word("and") {
        Some(value::parse_value(cur)?)
    } else {
        None
    };

    cur.expect_word("then")?;
    let then_comments = cur.take_comments_after_keyword();

    let action = if cur.take_word("update") {
        cur.expect_word("set")?;
        MergeAction::UpdateSet(parse_set_items(cur)?)
    } else if cur.take_word("delete") {
        MergeAction::Delete
    } else if cur.take_words(&["do", "nothing"]) {
        MergeAction::DoNothing
    } else if cur.take_word("insert") {
        parse_merge_insert(cur)?
    } else {
        return Err(cur.error("expected UPDATE, DELETE, INSERT or DO NOTHING"));
    };

    Ok(MergeWhenClause {
        kind,
        condition,
        action,
        then_comments,
        comments: Default::default(),
    })
}

fn parse_merge_insert(cur: &mut TokenCursor) -> Result<MergeAction, SQLParseError> {
    if cur.take_words(&["default", "values"]) {
        return Ok(MergeAction::Insert {
            columns: None,
            values: None,
            values_comments: Vec::new(),
        });
    }

    let mut columns = None;
    if cur.is_kind(LexemeKind::OpenParen) {
        cur.bump();
        let mut list = vec![source::parse_identifier(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            list.push(source::parse_identifier(cur)?);
        }
        cur.expect_kind(LexemeKind::CloseParen, ") after INSERT columns")?;
        columns = Some(list);
    }

    cur.expect_word("values")?;
    let values_comments = cur.take_comments_after_keyword();
    cur.expect_kind(LexemeKind::OpenParen, "( after VALUES")?;
    let mut items = vec![value::parse_value(cur)?];
    while cur.take_kind(LexemeKind::Comma) {
        items.push(value::parse_value(cur)?);
    }
    cur.expect_kind(LexemeKind::CloseParen, ") after VALUES row")?;

    Ok(MergeAction::Insert {
        columns,
        values: Some(crate::ast::expr::TupleExpr::new(items)),
        values_comments,
    })
}

fn parse_set_items(cur: &mut TokenCursor) -> Result<SetClause, SQLParseError> {
    let mut set = SetClause::default();
    loop {
        let column = parse_column_ref(cur)?;
        if !cur.take_operator("=") {
            return Err(cur.error("expected = in SET item"));
        }
        let value = value::parse_value(cur)?;
        set.items.push(SetItem {
            column,
            value,
            comments: Default::default(),
        });
        if !cur.take_kind(LexemeKind::Comma) {
            break;
        }
    }
    Ok(set)
}

fn parse_where(cur: &mut TokenCursor) -> Result<Option<WhereClause>, SQLParseError> {
    if !cur.take_word("where") {
        return Ok(None);
    }
    Ok(Some(WhereClause {
        condition: value::parse_value(cur)?,
        comments: Default::default(),
    }))
}

fn parse_returning(cur: &mut TokenCursor) -> Result<Option<ReturningClause>, SQLParseError> {
    if !cur.take_word("returning") {
        return Ok(None);
    }
    let mut items = vec![SelectItem::new(value::parse_value(cur)?)];
    while cur.take_kind(LexemeKind::Comma) {
        items.push(SelectItem::new(value::parse_value(cur)?));
    }
    Ok(Some(ReturningClause {
        items,
        comments: Default::default(),
    }))
}

pub(crate) fn parse_qualified_name(cur: &mut TokenCursor) -> Result<QualifiedName, SQLParseError> {
    let first = parse_name_part(cur)?;
    let mut parts = vec![first];
    while cur.is_kind(LexemeKind::Dot) {
        cur.bump();
        parts.push(parse_name_part(cur)?);
    }
    let name = parts.pop().expect("at least one part");
    Ok(QualifiedName::new(parts, name))
}

pub(crate) fn parse_column_ref(cur: &mut TokenCursor) -> Result<ColumnRef, SQLParseError> {
    let name = parse_qualified_name(cur)?;
    Ok(ColumnRef::new(name.namespaces, name.name))
}

fn parse_name_part(cur: &mut TokenCursor) -> Result<SmolStr, SQLParseError> {
    let identifier: IdentifierExpr = source::parse_identifier(cur)?;
    Ok(identifier.name)
}
