//! Comment stripping. Transformations that compare trees (CTE dedup,
//! round-trip checks) do so modulo comments; these walkers clear every
//! positioned-comment overlay and keyword comment slot in place.

use crate::ast::Statement;
use crate::ast::ddl::*;
use crate::ast::dml::*;
use crate::ast::expr::*;
use crate::ast::query::*;

pub fn stripped_query(query: &Query) -> Query {
    let mut clone = query.clone();
    strip_query(&mut clone);
    clone
}

pub fn stripped_statement(statement: &Statement) -> Statement {
    let mut clone = statement.clone();
    strip_statement(&mut clone);
    clone
}

pub fn strip_statement(statement: &mut Statement) {
    match statement {
        Statement::Query(query) => strip_query(query),
        Statement::Insert(insert) => {
            insert.comments.clear();
            insert.header_comments.clear();
            if let Some(with) = &mut insert.with {
                strip_with(with);
            }
            insert.target.comments.clear();
            if let Some(columns) = &mut insert.columns {
                columns.iter_mut().for_each(|c| c.comments.clear());
            }
            match &mut insert.source {
                InsertSource::Query(query) => strip_query(query),
                InsertSource::DefaultValues => {}
            }
            if let Some(returning) = &mut insert.returning {
                strip_returning(returning);
            }
        }
        Statement::Update(update) => {
            update.comments.clear();
            update.header_comments.clear();
            if let Some(with) = &mut update.with {
                strip_with(with);
            }
            strip_source(&mut update.target);
            strip_set(&mut update.set);
            if let Some(from) = &mut update.from {
                strip_from(from);
            }
            if let Some(where_clause) = &mut update.where_clause {
                strip_where(where_clause);
            }
            if let Some(returning) = &mut update.returning {
                strip_returning(returning);
            }
        }
        Statement::Delete(delete) => {
            delete.comments.clear();
            delete.header_comments.clear();
            if let Some(with) = &mut delete.with {
                strip_with(with);
            }
            strip_source(&mut delete.target);
            if let Some(using) = &mut delete.using {
                using.comments.clear();
                using.sources.iter_mut().for_each(strip_source);
            }
            if let Some(where_clause) = &mut delete.where_clause {
                strip_where(where_clause);
            }
            if let Some(returning) = &mut delete.returning {
                strip_returning(returning);
            }
        }
        Statement::Merge(merge) => {
            merge.comments.clear();
            merge.header_comments.clear();
            if let Some(with) = &mut merge.with {
                strip_with(with);
            }
            strip_source(&mut merge.target);
            strip_source(&mut merge.source);
            strip_expr(&mut merge.on);
            for when in &mut merge.when_clauses {
                when.comments.clear();
                when.then_comments.clear();
                if let Some(condition) = &mut when.condition {
                    strip_expr(condition);
                }
                match &mut when.action {
                    MergeAction::UpdateSet(set) => strip_set(set),
                    MergeAction::Insert {
                        columns,
                        values,
                        values_comments,
                    } => {
                        values_comments.clear();
                        if let Some(columns) = columns {
                            columns.iter_mut().for_each(|c| c.comments.clear());
                        }
                        if let Some(values) = values {
                            values.comments.clear();
                            values.items.iter_mut().for_each(strip_expr);
                        }
                    }
                    MergeAction::Delete | MergeAction::DoNothing => {}
                }
            }
        }
        Statement::CreateTable(create) => {
            create.comments.clear();
            create.name.comments.clear();
            create.columns.iter_mut().for_each(strip_column_def);
            create.constraints.iter_mut().for_each(strip_table_constraint);
        }
        Statement::CreateIndex(create) => {
            create.comments.clear();
            if let Some(name) = &mut create.name {
                name.comments.clear();
            }
            create.table.comments.clear();
            for column in &mut create.columns {
                column.comments.clear();
                strip_expr(&mut column.expr);
            }
            create.include.iter_mut().for_each(|c| c.comments.clear());
            create.with_options.iter_mut().for_each(strip_expr);
            if let Some(tablespace) = &mut create.tablespace {
                tablespace.comments.clear();
            }
            if let Some(where_clause) = &mut create.where_clause {
                strip_where(where_clause);
            }
        }
        Statement::CreateSchema(create) => {
            create.comments.clear();
            create.name.comments.clear();
        }
        Statement::CreateSequence(create) => {
            create.comments.clear();
            create.name.comments.clear();
            create.options.iter_mut().for_each(strip_sequence_option);
        }
        Statement::AlterSequence(alter) => {
            alter.comments.clear();
            alter.name.comments.clear();
            alter.options.iter_mut().for_each(strip_sequence_option);
        }
        Statement::AlterTable(alter) => {
            alter.comments.clear();
            alter.name.comments.clear();
            for action in &mut alter.actions {
                match action {
                    AlterTableAction::AddConstraint(constraint) => {
                        strip_table_constraint(constraint)
                    }
                    AlterTableAction::DropConstraint { name, .. }
                    | AlterTableAction::DropColumn { name, .. } => name.comments.clear(),
                    AlterTableAction::AddColumn { def, .. } => strip_column_def(def),
                    AlterTableAction::AlterColumnDefault { column, default } => {
                        column.comments.clear();
                        if let Some(default) = default {
                            strip_expr(default);
                        }
                    }
                }
            }
        }
        Statement::DropTable(drop) => {
            drop.comments.clear();
            drop.names.iter_mut().for_each(|n| n.comments.clear());
        }
        Statement::DropIndex(drop) => {
            drop.comments.clear();
            drop.names.iter_mut().for_each(|n| n.comments.clear());
        }
        Statement::DropSchema(drop) => {
            drop.comments.clear();
            drop.names.iter_mut().for_each(|n| n.comments.clear());
        }
        Statement::Explain(explain) => {
            explain.comments.clear();
            strip_statement(&mut explain.statement);
        }
        Statement::Analyze(analyze) => {
            analyze.comments.clear();
            if let Some(target) = &mut analyze.target {
                target.comments.clear();
            }
            analyze.columns.iter_mut().for_each(|c| c.comments.clear());
        }
    }
}

pub fn strip_query(query: &mut Query) {
    match query {
        Query::Select(select) => strip_select(select),
        Query::Binary(binary) => {
            binary.comments.clear();
            strip_query(&mut binary.left);
            strip_query(&mut binary.right);
        }
        Query::Values(values) => {
            values.comments.clear();
            for row in &mut values.rows {
                row.comments.clear();
                row.items.iter_mut().for_each(strip_expr);
            }
        }
    }
}

pub fn strip_select(select: &mut SimpleSelect) {
    select.comments.clear();
    select.header_comments.clear();
    if let Some(with) = &mut select.with {
        strip_with(with);
    }
    select.select.comments.clear();
    if let Some(Distinct::DistinctOn(exprs)) = &mut select.select.distinct {
        exprs.iter_mut().for_each(strip_expr);
    }
    select.select.hints.iter_mut().for_each(|h| h.comments.clear());
    for item in &mut select.select.items {
        strip_select_item(item);
    }
    if let Some(from) = &mut select.from {
        strip_from(from);
    }
    if let Some(where_clause) = &mut select.where_clause {
        strip_where(where_clause);
    }
    if let Some(group_by) = &mut select.group_by {
        group_by.comments.clear();
        group_by.items.iter_mut().for_each(strip_expr);
    }
    if let Some(having) = &mut select.having {
        having.comments.clear();
        strip_expr(&mut having.condition);
    }
    if let Some(window) = &mut select.window {
        window.comments.clear();
        for def in &mut window.windows {
            def.comments.clear();
            def.name.comments.clear();
            strip_window_spec(&mut def.spec);
        }
    }
    if let Some(order_by) = &mut select.order_by {
        strip_order_by(order_by);
    }
    if let Some(limit) = &mut select.limit {
        limit.comments.clear();
        strip_expr(&mut limit.value);
    }
    if let Some(offset) = &mut select.offset {
        offset.comments.clear();
        strip_expr(&mut offset.value);
    }
    if let Some(fetch) = &mut select.fetch {
        fetch.comments.clear();
        if let Some(count) = &mut fetch.count {
            strip_expr(count);
        }
    }
    if let Some(locking) = &mut select.locking {
        locking.comments.clear();
    }
}

fn strip_with(with: &mut WithClause) {
    with.comments.clear();
    for table in &mut with.tables {
        table.comments.clear();
        table.as_comments.clear();
        table.name.comments.clear();
        if let Some(columns) = &mut table.columns {
            columns.iter_mut().for_each(|c| c.comments.clear());
        }
        strip_query(&mut table.query);
    }
}

fn strip_select_item(item: &mut SelectItem) {
    item.comments.clear();
    item.as_comments.clear();
    if let Some(alias) = &mut item.alias {
        alias.comments.clear();
    }
    strip_expr(&mut item.expr);
}

fn strip_from(from: &mut FromClause) {
    from.comments.clear();
    strip_source(&mut from.source);
    for join in &mut from.joins {
        join.comments.clear();
        join.join_comments.clear();
        strip_source(&mut join.source);
        match &mut join.condition {
            Some(JoinCondition::On(expr)) => strip_expr(expr),
            Some(JoinCondition::Using(columns)) => {
                columns.iter_mut().for_each(|c| c.comments.clear())
            }
            None => {}
        }
    }
}

fn strip_source(source: &mut SourceExpr) {
    source.comments.clear();
    if let Some(alias) = &mut source.alias {
        alias.comments.clear();
        alias.as_comments.clear();
        alias.name.comments.clear();
        if let Some(columns) = &mut alias.columns {
            columns.iter_mut().for_each(|c| c.comments.clear());
        }
    }
    match &mut source.kind {
        SourceKind::Table(name) => name.comments.clear(),
        SourceKind::SubQuery(query) => strip_query(query),
        SourceKind::Function(call) => strip_function(call),
    }
}

fn strip_where(where_clause: &mut WhereClause) {
    where_clause.comments.clear();
    strip_expr(&mut where_clause.condition);
}

fn strip_order_by(order_by: &mut OrderByClause) {
    order_by.comments.clear();
    for item in &mut order_by.items {
        item.comments.clear();
        strip_expr(&mut item.value);
    }
}

fn strip_set(set: &mut SetClause) {
    set.comments.clear();
    for item in &mut set.items {
        item.comments.clear();
        item.column.comments.clear();
        strip_expr(&mut item.value);
    }
}

fn strip_returning(returning: &mut ReturningClause) {
    returning.comments.clear();
    returning.items.iter_mut().for_each(strip_select_item);
}

fn strip_column_def(def: &mut ColumnDef) {
    def.comments.clear();
    def.name.comments.clear();
    def.ty.comments.clear();
    if let Some(args) = &mut def.ty.args {
        args.iter_mut().for_each(strip_expr);
    }
    for constraint in &mut def.constraints {
        constraint.comments.clear();
        if let Some(name) = &mut constraint.name {
            name.comments.clear();
        }
        match &mut constraint.kind {
            ColumnConstraintKind::Default(expr) | ColumnConstraintKind::Check(expr) => {
                strip_expr(expr)
            }
            ColumnConstraintKind::References(reference) => strip_reference(reference),
            _ => {}
        }
    }
}

fn strip_table_constraint(constraint: &mut TableConstraint) {
    constraint.comments.clear();
    if let Some(name) = &mut constraint.name {
        name.comments.clear();
    }
    match &mut constraint.kind {
        TableConstraintKind::PrimaryKey(columns) | TableConstraintKind::Unique(columns) => {
            columns.iter_mut().for_each(|c| c.comments.clear())
        }
        TableConstraintKind::ForeignKey { columns, reference } => {
            columns.iter_mut().for_each(|c| c.comments.clear());
            strip_reference(reference);
        }
        TableConstraintKind::Check(expr) => strip_expr(expr),
    }
}

fn strip_reference(reference: &mut ReferenceDef) {
    reference.comments.clear();
    reference.table.comments.clear();
    if let Some(columns) = &mut reference.columns {
        columns.iter_mut().for_each(|c| c.comments.clear());
    }
}

fn strip_sequence_option(option: &mut SequenceOption) {
    match option {
        SequenceOption::IncrementBy(expr)
        | SequenceOption::StartWith(expr)
        | SequenceOption::MinValue(expr)
        | SequenceOption::MaxValue(expr)
        | SequenceOption::Cache(expr) => strip_expr(expr),
        SequenceOption::Restart(Some(expr)) => strip_expr(expr),
        SequenceOption::OwnedBy(Some(column)) => column.comments.clear(),
        _ => {}
    }
}

fn strip_window_spec(spec: &mut WindowSpec) {
    spec.comments.clear();
    spec.partition_by.iter_mut().for_each(strip_expr);
    if let Some(order_by) = &mut spec.order_by {
        strip_order_by(order_by);
    }
    if let Some(frame) = &mut spec.frame {
        frame.comments.clear();
        strip_frame_bound(&mut frame.start);
        if let Some(end) = &mut frame.end {
            strip_frame_bound(end);
        }
    }
}

fn strip_frame_bound(bound: &mut FrameBound) {
    match bound {
        FrameBound::Preceding(expr) | FrameBound::Following(expr) => strip_expr(expr),
        _ => {}
    }
}

fn strip_function(call: &mut FunctionCall) {
    call.comments.clear();
    call.name.comments.clear();
    if let Some(args) = &mut call.args {
        args.iter_mut().for_each(strip_expr);
    }
    if let Some(order_by) = &mut call.internal_order_by {
        strip_order_by(order_by);
    }
    if let Some(over) = &mut call.over {
        over.comments.clear();
        if let OverWindow::Spec(spec) = &mut over.window {
            strip_window_spec(spec);
        }
    }
}

pub fn strip_expr(expr: &mut ValueExpr) {
    expr.comments_mut().clear();
    match expr {
        ValueExpr::Function(call) => strip_function(call),
        ValueExpr::Unary(unary) => strip_expr(&mut unary.operand),
        ValueExpr::Binary(binary) => {
            strip_expr(&mut binary.left);
            strip_expr(&mut binary.right);
        }
        ValueExpr::Paren(paren) => strip_expr(&mut paren.inner),
        ValueExpr::Cast(cast) => {
            strip_expr(&mut cast.input);
            cast.ty.comments.clear();
            if let Some(args) = &mut cast.ty.args {
                args.iter_mut().for_each(strip_expr);
            }
        }
        ValueExpr::Case(case) => {
            case.end_comments.clear();
            if let Some(condition) = &mut case.condition {
                strip_expr(condition);
            }
            case.switch.comments.clear();
            for pair in &mut case.switch.cases {
                pair.comments.clear();
                pair.then_comments.clear();
                strip_expr(&mut pair.key);
                strip_expr(&mut pair.value);
            }
            if let Some(else_value) = &mut case.switch.else_value {
                strip_expr(else_value);
            }
        }
        ValueExpr::Between(between) => {
            strip_expr(&mut between.operand);
            strip_expr(&mut between.lower);
            strip_expr(&mut between.upper);
        }
        ValueExpr::Tuple(tuple) => tuple.items.iter_mut().for_each(strip_expr),
        ValueExpr::ValueList(list) => list.items.iter_mut().for_each(strip_expr),
        ValueExpr::InlineQuery(inline) => strip_query(&mut inline.query),
        ValueExpr::Array(array) => array.items.iter_mut().for_each(strip_expr),
        ValueExpr::ArrayQuery(array) => strip_query(&mut array.query),
        ValueExpr::ArrayIndex(index) => {
            strip_expr(&mut index.base);
            strip_expr(&mut index.index);
        }
        ValueExpr::ArraySlice(slice) => {
            strip_expr(&mut slice.base);
            if let Some(lower) = &mut slice.lower {
                strip_expr(lower);
            }
            if let Some(upper) = &mut slice.upper {
                strip_expr(upper);
            }
        }
        ValueExpr::TypeName(ty) => {
            if let Some(args) = &mut ty.args {
                args.iter_mut().for_each(strip_expr);
            }
        }
        ValueExpr::Literal(_)
        | ValueExpr::Identifier(_)
        | ValueExpr::Column(_)
        | ValueExpr::Parameter(_)
        | ValueExpr::Hint(_) => {}
    }
}
