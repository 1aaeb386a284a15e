//! Source-expression parsing: tables, subquery sources, function
//! sources, aliases and the JOIN chain.

use smol_str::SmolStr;

use crate::ast::comments::CommentSlot;
use crate::ast::expr::{IdentifierExpr, QualifiedName, ValueExpr};
use crate::ast::query::{
    FromClause, JoinClause, JoinCondition, JoinKind, SourceAlias, SourceExpr, SourceKind,
};
use crate::errors::SQLParseError;
use crate::lexer::LexemeKind;
use crate::parser::stream::TokenCursor;
use crate::parser::{select, value};

/// Words that can never be a source alias; seeing one after a source
/// means the alias is absent and a clause follows.
const NON_ALIAS_WORDS: &[&str] = &[
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
    "returning",
    "set",
    "when",
    "then",
    "values",
    "with",
];

pub(crate) fn parse_from_clause(cur: &mut TokenCursor) -> Result<FromClause, SQLParseError> {
    cur.expect_word("from")?;
    let source = parse_source(cur)?;

    let mut joins = Vec::new();
    loop {
        if let Some(join) = parse_join(cur)? {
            joins.push(join);
        } else if cur.take_kind(LexemeKind::Comma) {
            // A comma-separated source list is an unconditioned join.
            let source = parse_source(cur)?;
            joins.push(JoinClause {
                kind: JoinKind::Cross,
                lateral: false,
                source,
                condition: None,
                join_comments: Vec::new(),
                comments: Default::default(),
            });
        } else {
            break;
        }
    }

    let mut clause = FromClause {
        source,
        joins,
        comments: Default::default(),
    };
    clause
        .comments
        .push(CommentSlot::After, cur.take_inline_prev());
    Ok(clause)
}

pub(crate) fn parse_source(cur: &mut TokenCursor) -> Result<SourceExpr, SQLParseError> {
    let lead = cur.take_leading_here();
    let mut source = parse_source_inner(cur)?;
    source.comments.push(CommentSlot::Before, lead);
    source.alias = parse_alias(cur)?;
    Ok(source)
}

fn parse_source_inner(cur: &mut TokenCursor) -> Result<SourceExpr, SQLParseError> {
    if cur.is_kind(LexemeKind::OpenParen) {
        cur.bump();
        let query = select::parse_query(cur)?;
        cur.expect_kind(LexemeKind::CloseParen, ") after subquery source")?;
        return Ok(SourceExpr {
            kind: SourceKind::SubQuery(Box::new(query)),
            alias: None,
            comments: Default::default(),
        });
    }

    let Some(lexeme) = cur.peek().filter(|l| {
        matches!(l.kind, LexemeKind::Word | LexemeKind::QuotedIdentifier)
    }) else {
        return Err(cur.error("expected table, subquery or function source"));
    };
    let mut parts: Vec<SmolStr> = vec![lexeme.text.clone()];
    cur.bump();
    while cur.is_kind(LexemeKind::Dot) {
        cur.bump();
        let Some(part) = cur.peek().filter(|l| {
            matches!(l.kind, LexemeKind::Word | LexemeKind::QuotedIdentifier)
        }) else {
            return Err(cur.error("expected identifier after ."));
        };
        parts.push(part.text.clone());
        cur.bump();
    }

    if cur.is_kind(LexemeKind::OpenParen) {
        let call = value::parse_function_call(cur, parts)?;
        let ValueExpr::Function(call) = call else {
            unreachable!("parse_function_call returns a function");
        };
        return Ok(SourceExpr {
            kind: SourceKind::Function(call),
            alias: None,
            comments: Default::default(),
        });
    }

    let name = parts.pop().expect("at least one part");
    Ok(SourceExpr {
        kind: SourceKind::Table(QualifiedName::new(parts, name)),
        alias: None,
        comments: Default::default(),
    })
}

fn parse_alias(cur: &mut TokenCursor) -> Result<Option<SourceAlias>, SQLParseError> {
    let mut as_comments = Vec::new();
    let explicit_as = if cur.is_word("as") {
        as_comments = cur.take_leading_here();
        cur.bump();
        as_comments.extend(cur.take_comments_after_keyword());
        true
    } else {
        false
    };

    let aliasable = cur.peek().is_some_and(|l| match l.kind {
        LexemeKind::QuotedIdentifier => true,
        LexemeKind::Word => !NON_ALIAS_WORDS
            .iter()
            .any(|kw| l.text.eq_ignore_ascii_case(kw)),
        _ => false,
    });

    if !aliasable {
        if explicit_as {
            return Err(cur.error("expected alias after AS"));
        }
        return Ok(None);
    }

    let name = IdentifierExpr::new(cur.text().unwrap().clone());
    cur.bump();

    let mut alias = SourceAlias {
        name,
        columns: None,
        as_comments,
        comments: Default::default(),
    };

    if cur.is_kind(LexemeKind::OpenParen) {
        cur.bump();
        let mut columns = vec![parse_identifier(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            columns.push(parse_identifier(cur)?);
        }
        cur.expect_kind(LexemeKind::CloseParen, ") after alias columns")?;
        alias.columns = Some(columns);
    }

    Ok(Some(alias))
}

pub(crate) fn parse_identifier(cur: &mut TokenCursor) -> Result<IdentifierExpr, SQLParseError> {
    let Some(lexeme) = cur.peek().filter(|l| {
        matches!(l.kind, LexemeKind::Word | LexemeKind::QuotedIdentifier)
    }) else {
        return Err(cur.error("expected identifier"));
    };
    let identifier = IdentifierExpr::new(lexeme.text.clone());
    cur.bump();
    Ok(identifier)
}

/// Parse one JOIN clause when the cursor sits on a join keyword.
fn parse_join(cur: &mut TokenCursor) -> Result<Option<JoinClause>, SQLParseError> {
    let join_comments = match cur.peek() {
        Some(lexeme)
            if lexeme.kind == LexemeKind::Word
                && ["join", "inner", "left", "right", "full", "cross"]
                    .iter()
                    .any(|kw| lexeme.is_word(kw)) =>
        {
            cur.take_leading_here()
        }
        _ => return Ok(None),
    };

    let kind = if cur.take_word("join") || cur.take_words(&["inner", "join"]) {
        JoinKind::Inner
    } else if cur.take_words(&["left", "outer", "join"]) || cur.take_words(&["left", "join"]) {
        JoinKind::Left
    } else if cur.take_words(&["right", "outer", "join"]) || cur.take_words(&["right", "join"]) {
        JoinKind::Right
    } else if cur.take_words(&["full", "outer", "join"]) || cur.take_words(&["full", "join"]) {
        JoinKind::Full
    } else if cur.take_words(&["cross", "join"]) {
        JoinKind::Cross
    } else {
        // `left`, `right` and friends are valid column names in other
        // positions; not a join after all.
        return Ok(None);
    };

    let lateral = cur.take_word("lateral");
    let source = parse_source(cur)?;

    let condition = if cur.take_word("on") {
        Some(JoinCondition::On(value::parse_value(cur)?))
    } else if cur.take_word("using") {
        cur.expect_kind(LexemeKind::OpenParen, "( after USING")?;
        let mut columns = vec![parse_identifier(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            columns.push(parse_identifier(cur)?);
        }
        cur.expect_kind(LexemeKind::CloseParen, ") after USING columns")?;
        Some(JoinCondition::Using(columns))
    } else {
        None
    };

    Ok(Some(JoinClause {
        kind,
        lateral,
        source,
        condition,
        join_comments,
        comments: Default::default(),
    }))
}
