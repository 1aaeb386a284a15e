//! DDL parsing: CREATE/ALTER/DROP for tables, indexes, schemas and
//! sequences, plus EXPLAIN and ANALYZE.

use crate::ast::Statement;
use crate::ast::ddl::*;
use crate::ast::query::WhereClause;
use crate::errors::SQLParseError;
use crate::lexer::LexemeKind;
use crate::parser::dml::parse_qualified_name;
use crate::parser::stream::TokenCursor;
use crate::parser::{source, statement_inner, value};

pub(crate) fn parse_create(cur: &mut TokenCursor) -> Result<Statement, SQLParseError> {
    cur.expect_word("create")?;

    if cur.is_word("table") || cur.is_word("temporary") || cur.is_word("temp") {
        return Ok(Statement::CreateTable(Box::new(parse_create_table(cur)?)));
    }
    if cur.is_word("index") || cur.is_word("unique") {
        return Ok(Statement::CreateIndex(Box::new(parse_create_index(cur)?)));
    }
    if cur.take_word("schema") {
        let if_not_exists = cur.take_words(&["if", "not", "exists"]);
        let name = parse_qualified_name(cur)?;
        return Ok(Statement::CreateSchema(CreateSchemaStatement {
            if_not_exists,
            name,
            comments: Default::default(),
        }));
    }
    if cur.take_word("sequence") {
        let if_not_exists = cur.take_words(&["if", "not", "exists"]);
        let name = parse_qualified_name(cur)?;
        let options = parse_sequence_options(cur)?;
        return Ok(Statement::CreateSequence(Box::new(
            CreateSequenceStatement {
                if_not_exists,
                name,
                options,
                comments: Default::default(),
            },
        )));
    }

    Err(cur.error("expected TABLE, INDEX, SCHEMA or SEQUENCE after CREATE"))
}

fn parse_create_table(cur: &mut TokenCursor) -> Result<CreateTableStatement, SQLParseError> {
    let temporary = cur.take_word("temporary") || cur.take_word("temp");
    cur.expect_word("table")?;
    let if_not_exists = cur.take_words(&["if", "not", "exists"]);
    let name = parse_qualified_name(cur)?;

    cur.expect_kind(LexemeKind::OpenParen, "( to start the column list")?;
    let mut columns = Vec::new();
    let mut constraints = Vec::new();
    loop {
        if is_table_constraint_start(cur) {
            constraints.push(parse_table_constraint(cur)?);
        } else {
            columns.push(parse_column_def(cur)?);
        }
        if !cur.take_kind(LexemeKind::Comma) {
            break;
        }
    }
    cur.expect_kind(LexemeKind::CloseParen, ") to end the column list")?;

    Ok(CreateTableStatement {
        temporary,
        if_not_exists,
        name,
        columns,
        constraints,
        comments: Default::default(),
    })
}

fn is_table_constraint_start(cur: &TokenCursor) -> bool {
    cur.is_word("constraint")
        || cur.is_word("primary")
        || cur.is_word("unique") && cur.peek_at(1).is_some_and(|l| l.kind == LexemeKind::OpenParen)
        || cur.is_word("foreign")
        || cur.is_word("check")
}

fn parse_column_def(cur: &mut TokenCursor) -> Result<ColumnDef, SQLParseError> {
    let name = source::parse_identifier(cur)?;
    let ty = value::parse_type(cur)?;

    let mut constraints = Vec::new();
    loop {
        let constraint_name = if cur.take_word("constraint") {
            Some(source::parse_identifier(cur)?)
        } else {
            None
        };

        let kind = if cur.take_words(&["not", "null"]) {
            ColumnConstraintKind::NotNull
        } else if cur.take_word("null") {
            ColumnConstraintKind::Null
        } else if cur.take_word("default") {
            ColumnConstraintKind::Default(value::parse_value(cur)?)
        } else if cur.take_words(&["primary", "key"]) {
            ColumnConstraintKind::PrimaryKey
        } else if cur.take_word("unique") {
            ColumnConstraintKind::Unique
        } else if cur.take_word("references") {
            ColumnConstraintKind::References(parse_reference(cur)?)
        } else if cur.take_word("check") {
            cur.expect_kind(LexemeKind::OpenParen, "( after CHECK")?;
            let expr = value::parse_value(cur)?;
            cur.expect_kind(LexemeKind::CloseParen, ") after CHECK expression")?;
            ColumnConstraintKind::Check(expr)
        } else {
            if constraint_name.is_some() {
                return Err(cur.error("expected a constraint after CONSTRAINT name"));
            }
            break;
        };

        constraints.push(ColumnConstraint {
            name: constraint_name,
            kind,
            comments: Default::default(),
        });
    }

    Ok(ColumnDef {
        name,
        ty,
        constraints,
        comments: Default::default(),
    })
}

fn parse_table_constraint(cur: &mut TokenCursor) -> Result<TableConstraint, SQLParseError> {
    let name = if cur.take_word("constraint") {
        Some(source::parse_identifier(cur)?)
    } else {
        None
    };

    let kind = if cur.take_words(&["primary", "key"]) {
        TableConstraintKind::PrimaryKey(parse_paren_identifiers(cur)?)
    } else if cur.take_word("unique") {
        TableConstraintKind::Unique(parse_paren_identifiers(cur)?)
    } else if cur.take_words(&["foreign", "key"]) {
        let columns = parse_paren_identifiers(cur)?;
        cur.expect_word("references")?;
        TableConstraintKind::ForeignKey {
            columns,
            reference: parse_reference(cur)?,
        }
    } else if cur.take_word("check") {
        cur.expect_kind(LexemeKind::OpenParen, "( after CHECK")?;
        let expr = value::parse_value(cur)?;
        cur.expect_kind(LexemeKind::CloseParen, ") after CHECK expression")?;
        TableConstraintKind::Check(expr)
    } else {
        return Err(cur.error("expected a table constraint"));
    };

    Ok(TableConstraint {
        name,
        kind,
        comments: Default::default(),
    })
}

fn parse_reference(cur: &mut TokenCursor) -> Result<ReferenceDef, SQLParseError> {
    let table = parse_qualified_name(cur)?;
    let columns = if cur.is_kind(LexemeKind::OpenParen) {
        Some(parse_paren_identifiers(cur)?)
    } else {
        None
    };

    let mut on_delete = None;
    let mut on_update = None;
    loop {
        if cur.take_words(&["on", "delete"]) {
            on_delete = Some(parse_referential_action(cur)?);
        } else if cur.take_words(&["on", "update"]) {
            on_update = Some(parse_referential_action(cur)?);
        } else {
            break;
        }
    }

    Ok(ReferenceDef {
        table,
        columns,
        on_delete,
        on_update,
        comments: Default::default(),
    })
}

fn parse_referential_action(cur: &mut TokenCursor) -> Result<ReferentialAction, SQLParseError> {
    if cur.take_words(&["no", "action"]) {
        Ok(ReferentialAction::NoAction)
    } else if cur.take_word("restrict") {
        Ok(ReferentialAction::Restrict)
    } else if cur.take_word("cascade") {
        Ok(ReferentialAction::Cascade)
    } else if cur.take_words(&["set", "null"]) {
        Ok(ReferentialAction::SetNull)
    } else if cur.take_words(&["set", "default"]) {
        Ok(ReferentialAction::SetDefault)
    } else {
        Err(cur.error("expected a referential action"))
    }
}

fn parse_paren_identifiers(
    cur: &mut TokenCursor,
) -> Result<Vec<crate::ast::expr::IdentifierExpr>, SQLParseError> {
    cur.expect_kind(LexemeKind::OpenParen, "( to start the column list")?;
    let mut columns = vec![source::parse_identifier(cur)?];
    while cur.take_kind(LexemeKind::Comma) {
        columns.push(source::parse_identifier(cur)?);
    }
    cur.expect_kind(LexemeKind::CloseParen, ") to end the column list")?;
    Ok(columns)
}

fn parse_create_index(cur: &mut TokenCursor) -> Result<CreateIndexStatement, SQLParseError> {
    let unique = cur.take_word("unique");
    cur.expect_word("index")?;
    let concurrently = cur.take_word("concurrently");
    let if_not_exists = cur.take_words(&["if", "not", "exists"]);

    let name = if cur.is_word("on") {
        None
    } else {
        Some(parse_qualified_name(cur)?)
    };
    cur.expect_word("on")?;
    let table = parse_qualified_name(cur)?;

    let using = if cur.take_word("using") {
        let Some(method) = cur.text().cloned() else {
            return Err(cur.error("expected index method after USING"));
        };
        cur.bump();
        Some(method)
    } else {
        None
    };

    cur.expect_kind(LexemeKind::OpenParen, "( to start index columns")?;
    let mut columns = vec![parse_index_column(cur)?];
    while cur.take_kind(LexemeKind::Comma) {
        columns.push(parse_index_column(cur)?);
    }
    cur.expect_kind(LexemeKind::CloseParen, ") to end index columns")?;

    let include = if cur.take_word("include") {
        parse_paren_identifiers(cur)?
    } else {
        Vec::new()
    };

    let mut with_options = Vec::new();
    if cur.take_word("with") {
        cur.expect_kind(LexemeKind::OpenParen, "( after WITH")?;
        with_options.push(value::parse_value(cur)?);
        while cur.take_kind(LexemeKind::Comma) {
            with_options.push(value::parse_value(cur)?);
        }
        cur.expect_kind(LexemeKind::CloseParen, ") after WITH options")?;
    }

    let tablespace = if cur.take_word("tablespace") {
        Some(source::parse_identifier(cur)?)
    } else {
        None
    };

    let where_clause = if cur.take_word("where") {
        Some(WhereClause {
            condition: value::parse_value(cur)?,
            comments: Default::default(),
        })
    } else {
        None
    };

    Ok(CreateIndexStatement {
        unique,
        concurrently,
        if_not_exists,
        name,
        table,
        using,
        columns,
        include,
        with_options,
        tablespace,
        where_clause,
        comments: Default::default(),
    })
}

fn parse_index_column(cur: &mut TokenCursor) -> Result<IndexColumn, SQLParseError> {
    let expr = value::parse_value(cur)?;

    let direction = if cur.take_word("asc") {
        Some(crate::ast::query::SortDirection::Asc)
    } else if cur.take_word("desc") {
        Some(crate::ast::query::SortDirection::Desc)
    } else {
        None
    };

    let nulls = if cur.take_word("nulls") {
        if cur.take_word("first") {
            Some(crate::ast::query::NullsPosition::First)
        } else if cur.take_word("last") {
            Some(crate::ast::query::NullsPosition::Last)
        } else {
            return Err(cur.error("expected FIRST or LAST after NULLS"));
        }
    } else {
        None
    };

    Ok(IndexColumn {
        expr,
        direction,
        nulls,
        comments: Default::default(),
    })
}

pub(crate) fn parse_drop(cur: &mut TokenCursor) -> Result<Statement, SQLParseError> {
    cur.expect_word("drop")?;

    if cur.take_word("table") {
        let if_exists = cur.take_words(&["if", "exists"]);
        let names = parse_name_list(cur)?;
        let behavior = parse_drop_behavior(cur);
        return Ok(Statement::DropTable(DropTableStatement {
            if_exists,
            names,
            behavior,
            comments: Default::default(),
        }));
    }
    if cur.take_word("index") {
        let concurrently = cur.take_word("concurrently");
        let if_exists = cur.take_words(&["if", "exists"]);
        let names = parse_name_list(cur)?;
        let behavior = parse_drop_behavior(cur);
        return Ok(Statement::DropIndex(DropIndexStatement {
            concurrently,
            if_exists,
            names,
            behavior,
            comments: Default::default(),
        }));
    }
    if cur.take_word("schema") {
        let if_exists = cur.take_words(&["if", "exists"]);
        let names = parse_name_list(cur)?;
        let behavior = parse_drop_behavior(cur);
        return Ok(Statement::DropSchema(DropSchemaStatement {
            if_exists,
            names,
            behavior,
            comments: Default::default(),
        }));
    }

    Err(cur.error("expected TABLE, INDEX or SCHEMA after DROP"))
}

fn parse_name_list(
    cur: &mut TokenCursor,
) -> Result<Vec<crate::ast::expr::QualifiedName>, SQLParseError> {
    let mut names = vec![parse_qualified_name(cur)?];
    while cur.take_kind(LexemeKind::Comma) {
        names.push(parse_qualified_name(cur)?);
    }
    Ok(names)
}

fn parse_drop_behavior(cur: &mut TokenCursor) -> Option<DropBehavior> {
    if cur.take_word("cascade") {
        Some(DropBehavior::Cascade)
    } else if cur.take_word("restrict") {
        Some(DropBehavior::Restrict)
    } else {
        None
    }
}

pub(crate) fn parse_alter(cur: &mut TokenCursor) -> Result<Statement, SQLParseError> {
    cur.expect_word("alter")?;

    if cur.take_word("table") {
        let if_exists = cur.take_words(&["if", "exists"]);
        let only = cur.take_word("only");
        let name = parse_qualified_name(cur)?;

        let mut actions = vec![parse_alter_table_action(cur)?];
        while cur.take_kind(LexemeKind::Comma) {
            actions.push(parse_alter_table_action(cur)?);
        }

        return Ok(Statement::AlterTable(Box::new(AlterTableStatement {
            if_exists,
            only,
            name,
            actions,
            comments: Default::default(),
        })));
    }

    if cur.take_word("sequence") {
        let if_exists = cur.take_words(&["if", "exists"]);
        let name = parse_qualified_name(cur)?;
        let options = parse_sequence_options(cur)?;
        if options.is_empty() {
            return Err(cur.error("expected at least one sequence option"));
        }
        return Ok(Statement::AlterSequence(Box::new(AlterSequenceStatement {
            if_exists,
            name,
            options,
            comments: Default::default(),
        })));
    }

    Err(cur.error("expected TABLE or SEQUENCE after ALTER"))
}

fn parse_alter_table_action(cur: &mut TokenCursor) -> Result<AlterTableAction, SQLParseError> {
    if cur.take_word("add") {
        if cur.take_word("constraint") {
            let name = source::parse_identifier(cur)?;
            let kind = parse_table_constraint(cur)?.kind;
            return Ok(AlterTableAction::AddConstraint(TableConstraint {
                name: Some(name),
                kind,
                comments: Default::default(),
            }));
        }
        cur.take_word("column");
        let if_not_exists = cur.take_words(&["if", "not", "exists"]);
        let def = parse_column_def(cur)?;
        return Ok(AlterTableAction::AddColumn { if_not_exists, def });
    }

    if cur.take_word("drop") {
        if cur.take_word("constraint") {
            let if_exists = cur.take_words(&["if", "exists"]);
            let name = source::parse_identifier(cur)?;
            let behavior = parse_drop_behavior(cur);
            return Ok(AlterTableAction::DropConstraint {
                if_exists,
                name,
                behavior,
            });
        }
        cur.take_word("column");
        let if_exists = cur.take_words(&["if", "exists"]);
        let name = source::parse_identifier(cur)?;
        let behavior = parse_drop_behavior(cur);
        return Ok(AlterTableAction::DropColumn {
            if_exists,
            name,
            behavior,
        });
    }

    if cur.take_words(&["alter", "column"]) || cur.take_word("alter") {
        let column = source::parse_identifier(cur)?;
        if cur.take_words(&["set", "default"]) {
            let default = value::parse_value(cur)?;
            return Ok(AlterTableAction::AlterColumnDefault {
                column,
                default: Some(default),
            });
        }
        if cur.take_words(&["drop", "default"]) {
            return Ok(AlterTableAction::AlterColumnDefault {
                column,
                default: None,
            });
        }
        return Err(cur.error("expected SET DEFAULT or DROP DEFAULT"));
    }

    Err(cur.error("expected ADD, DROP or ALTER COLUMN"))
}

fn parse_sequence_options(cur: &mut TokenCursor) -> Result<Vec<SequenceOption>, SQLParseError> {
    let mut options = Vec::new();
    loop {
        if cur.take_word("increment") {
            cur.take_word("by");
            options.push(SequenceOption::IncrementBy(value::parse_value(cur)?));
        } else if cur.take_word("start") {
            cur.take_word("with");
            options.push(SequenceOption::StartWith(value::parse_value(cur)?));
        } else if cur.take_word("minvalue") {
            options.push(SequenceOption::MinValue(value::parse_value(cur)?));
        } else if cur.take_word("maxvalue") {
            options.push(SequenceOption::MaxValue(value::parse_value(cur)?));
        } else if cur.take_words(&["no", "minvalue"]) {
            options.push(SequenceOption::NoMinValue);
        } else if cur.take_words(&["no", "maxvalue"]) {
            options.push(SequenceOption::NoMaxValue);
        } else if cur.take_words(&["no", "cycle"]) {
            options.push(SequenceOption::NoCycle);
        } else if cur.take_word("cache") {
            options.push(SequenceOption::Cache(value::parse_value(cur)?));
        } else if cur.take_word("cycle") {
            options.push(SequenceOption::Cycle);
        } else if cur.take_word("restart") {
            if cur.take_word("with") {
                options.push(SequenceOption::Restart(Some(value::parse_value(cur)?)));
            } else if cur.is_kind(LexemeKind::Number) {
                options.push(SequenceOption::Restart(Some(value::parse_value(cur)?)));
            } else {
                options.push(SequenceOption::Restart(None));
            }
        } else if cur.take_words(&["owned", "by"]) {
            if cur.take_word("none") {
                options.push(SequenceOption::OwnedBy(None));
            } else {
                options.push(SequenceOption::OwnedBy(Some(
                    crate::parser::dml::parse_column_ref(cur)?,
                )));
            }
        } else {
            break;
        }
    }
    Ok(options)
}

pub(crate) fn parse_explain(cur: &mut TokenCursor) -> Result<ExplainStatement, SQLParseError> {
    cur.expect_word("explain")?;

    let mut options = Vec::new();
    if cur.is_kind(LexemeKind::OpenParen) {
        cur.bump();
        loop {
            let Some(name) = cur.text().cloned() else {
                return Err(cur.error("expected EXPLAIN option name"));
            };
            cur.bump();
            let value = if cur.is_kind(LexemeKind::Word) || cur.is_kind(LexemeKind::Number) {
                let v = cur.text().cloned();
                cur.bump();
                v
            } else {
                None
            };
            options.push((name, value));
            if !cur.take_kind(LexemeKind::Comma) {
                break;
            }
        }
        cur.expect_kind(LexemeKind::CloseParen, ") after EXPLAIN options")?;
    }

    let statement = statement_inner(cur)?;
    Ok(ExplainStatement {
        options,
        statement: Box::new(statement),
        comments: Default::default(),
    })
}

pub(crate) fn parse_analyze(cur: &mut TokenCursor) -> Result<AnalyzeStatement, SQLParseError> {
    cur.expect_word("analyze")?;
    let verbose = cur.take_word("verbose");

    let target = if cur.is_kind(LexemeKind::Word) || cur.is_kind(LexemeKind::QuotedIdentifier) {
        Some(parse_qualified_name(cur)?)
    } else {
        None
    };

    let columns = if target.is_some() && cur.is_kind(LexemeKind::OpenParen) {
        parse_paren_identifiers(cur)?
    } else {
        Vec::new()
    };

    Ok(AnalyzeStatement {
        verbose,
        target,
        columns,
        comments: Default::default(),
    })
}
