//! Parameter collection and rebinding. The walker visits parameters
//! in the same outer-then-inner, left-to-right order the emitter uses
//! to assign indices, so collected indices and emitted placeholders
//! agree by construction.

use smol_str::SmolStr;
use sqlforge_lib_core::ast::Statement;
use sqlforge_lib_core::ast::dml::{InsertSource, MergeAction};
use sqlforge_lib_core::ast::expr::{
    FrameBound, OverWindow, ParamValue, ParameterExpr, ValueExpr, WindowSpec,
};
use sqlforge_lib_core::ast::query::{
    Distinct, JoinCondition, Query, SimpleSelect, SourceKind,
};
use sqlforge_lib_core::errors::TransformError;
use sqlforge_lib_core::helpers::IndexMap;

use crate::config::ParameterStyle;

/// One parameter occurrence with its final 1-based emit index.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedParameter {
    pub name: SmolStr,
    pub index: usize,
    pub value: Option<ParamValue>,
}

/// The shape handed to a driver, depending on the parameter style.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterCollection {
    /// Named style: unique names mapped to their values.
    Named(IndexMap<SmolStr, Option<ParamValue>>),
    /// Indexed and anonymous styles: values by emit order.
    Positional(Vec<Option<ParamValue>>),
}

/// Every parameter occurrence in the statement, in emit order.
pub fn collect_parameters(statement: &Statement) -> Vec<CollectedParameter> {
    let mut clone = statement.clone();
    let mut collected = Vec::new();
    let mut index = 0;
    walk_statement(&mut clone, &mut |param| {
        index += 1;
        collected.push(CollectedParameter {
            name: param.name.clone(),
            index,
            value: param.value.clone(),
        });
    });
    collected
}

/// Group occurrences for a driver. Named collections reject the same
/// name bound to two different values.
pub fn collect_bound_parameters(
    statement: &Statement,
    style: ParameterStyle,
) -> Result<ParameterCollection, TransformError> {
    let occurrences = collect_parameters(statement);
    match style {
        ParameterStyle::Named => {
            let mut named: IndexMap<SmolStr, Option<ParamValue>> = IndexMap::default();
            for occurrence in occurrences {
                match named.get(&occurrence.name) {
                    None => {
                        named.insert(occurrence.name, occurrence.value);
                    }
                    Some(existing) => {
                        if *existing != occurrence.value {
                            return Err(TransformError::DuplicateParameter(occurrence.name));
                        }
                    }
                }
            }
            Ok(ParameterCollection::Named(named))
        }
        ParameterStyle::Indexed | ParameterStyle::Anonymous => Ok(
            ParameterCollection::Positional(occurrences.into_iter().map(|o| o.value).collect()),
        ),
    }
}

/// Assign `value` to every occurrence of the named parameter. Fails
/// without touching the tree when the name is absent.
pub fn set_parameter(
    statement: &mut Statement,
    name: &str,
    value: ParamValue,
) -> Result<usize, TransformError> {
    let mut hits = 0;
    walk_statement(statement, &mut |param| {
        if param.name == name {
            hits += 1;
        }
    });
    if hits == 0 {
        return Err(TransformError::ParameterNotFound(SmolStr::new(name)));
    }

    walk_statement(statement, &mut |param| {
        if param.name == name {
            param.value = Some(value.clone());
        }
    });
    Ok(hits)
}

pub(crate) fn walk_statement(
    statement: &mut Statement,
    f: &mut impl FnMut(&mut ParameterExpr),
) {
    match statement {
        Statement::Query(query) => walk_query(query, f),
        Statement::Insert(insert) => {
            if let Some(with) = &mut insert.with {
                for table in &mut with.tables {
                    walk_query(&mut table.query, f);
                }
            }
            match &mut insert.source {
                InsertSource::Query(query) => walk_query(query, f),
                InsertSource::DefaultValues => {}
            }
            if let Some(returning) = &mut insert.returning {
                for item in &mut returning.items {
                    walk_expr(&mut item.expr, f);
                }
            }
        }
        Statement::Update(update) => {
            if let Some(with) = &mut update.with {
                for table in &mut with.tables {
                    walk_query(&mut table.query, f);
                }
            }
            walk_source_kind(&mut update.target.kind, f);
            for item in &mut update.set.items {
                walk_expr(&mut item.value, f);
            }
            if let Some(from) = &mut update.from {
                walk_source_kind(&mut from.source.kind, f);
                for join in &mut from.joins {
                    walk_source_kind(&mut join.source.kind, f);
                    if let Some(JoinCondition::On(expr)) = &mut join.condition {
                        walk_expr(expr, f);
                    }
                }
            }
            if let Some(where_clause) = &mut update.where_clause {
                walk_expr(&mut where_clause.condition, f);
            }
            if let Some(returning) = &mut update.returning {
                for item in &mut returning.items {
                    walk_expr(&mut item.expr, f);
                }
            }
        }
        Statement::Delete(delete) => {
            if let Some(with) = &mut delete.with {
                for table in &mut with.tables {
                    walk_query(&mut table.query, f);
                }
            }
            walk_source_kind(&mut delete.target.kind, f);
            if let Some(using) = &mut delete.using {
                for source in &mut using.sources {
                    walk_source_kind(&mut source.kind, f);
                }
            }
            if let Some(where_clause) = &mut delete.where_clause {
                walk_expr(&mut where_clause.condition, f);
            }
            if let Some(returning) = &mut delete.returning {
                for item in &mut returning.items {
                    walk_expr(&mut item.expr, f);
                }
            }
        }
        Statement::Merge(merge) => {
            if let Some(with) = &mut merge.with {
                for table in &mut with.tables {
                    walk_query(&mut table.query, f);
                }
            }
            walk_source_kind(&mut merge.target.kind, f);
            walk_source_kind(&mut merge.source.kind, f);
            walk_expr(&mut merge.on, f);
            for when in &mut merge.when_clauses {
                if let Some(condition) = &mut when.condition {
                    walk_expr(condition, f);
                }
                match &mut when.action {
                    MergeAction::UpdateSet(set) => {
                        for item in &mut set.items {
                            walk_expr(&mut item.value, f);
                        }
                    }
                    MergeAction::Insert { values, .. } => {
                        if let Some(row) = values {
                            for item in &mut row.items {
                                walk_expr(item, f);
                            }
                        }
                    }
                    MergeAction::Delete | MergeAction::DoNothing => {}
                }
            }
        }
        // Parameters do not occur in the DDL surface.
        _ => {}
    }
}

pub(crate) fn walk_query(query: &mut Query, f: &mut impl FnMut(&mut ParameterExpr)) {
    match query {
        Query::Select(select) => walk_select(select, f),
        Query::Binary(binary) => {
            walk_query(&mut binary.left, f);
            walk_query(&mut binary.right, f);
        }
        Query::Values(values) => {
            for row in &mut values.rows {
                for item in &mut row.items {
                    walk_expr(item, f);
                }
            }
        }
    }
}

pub(crate) fn walk_select(select: &mut SimpleSelect, f: &mut impl FnMut(&mut ParameterExpr)) {
    if let Some(with) = &mut select.with {
        for table in &mut with.tables {
            walk_query(&mut table.query, f);
        }
    }
    if let Some(Distinct::DistinctOn(exprs)) = &mut select.select.distinct {
        for expr in exprs {
            walk_expr(expr, f);
        }
    }
    for item in &mut select.select.items {
        walk_expr(&mut item.expr, f);
    }
    if let Some(from) = &mut select.from {
        walk_source_kind(&mut from.source.kind, f);
        for join in &mut from.joins {
            walk_source_kind(&mut join.source.kind, f);
            if let Some(JoinCondition::On(expr)) = &mut join.condition {
                walk_expr(expr, f);
            }
        }
    }
    if let Some(where_clause) = &mut select.where_clause {
        walk_expr(&mut where_clause.condition, f);
    }
    if let Some(group_by) = &mut select.group_by {
        for item in &mut group_by.items {
            walk_expr(item, f);
        }
    }
    if let Some(having) = &mut select.having {
        walk_expr(&mut having.condition, f);
    }
    if let Some(window) = &mut select.window {
        for def in &mut window.windows {
            walk_window_spec(&mut def.spec, f);
        }
    }
    if let Some(order_by) = &mut select.order_by {
        for item in &mut order_by.items {
            walk_expr(&mut item.value, f);
        }
    }
    if let Some(limit) = &mut select.limit {
        walk_expr(&mut limit.value, f);
    }
    if let Some(offset) = &mut select.offset {
        walk_expr(&mut offset.value, f);
    }
    if let Some(fetch) = &mut select.fetch
        && let Some(count) = &mut fetch.count
    {
        walk_expr(count, f);
    }
}

fn walk_source_kind(kind: &mut SourceKind, f: &mut impl FnMut(&mut ParameterExpr)) {
    match kind {
        SourceKind::SubQuery(query) => walk_query(query, f),
        SourceKind::Function(call) => {
            if let Some(args) = &mut call.args {
                for arg in args {
                    walk_expr(arg, f);
                }
            }
        }
        SourceKind::Table(_) => {}
    }
}

fn walk_window_spec(spec: &mut WindowSpec, f: &mut impl FnMut(&mut ParameterExpr)) {
    for expr in &mut spec.partition_by {
        walk_expr(expr, f);
    }
    if let Some(order_by) = &mut spec.order_by {
        for item in &mut order_by.items {
            walk_expr(&mut item.value, f);
        }
    }
    if let Some(frame) = &mut spec.frame {
        walk_frame_bound(&mut frame.start, f);
        if let Some(end) = &mut frame.end {
            walk_frame_bound(end, f);
        }
    }
}

fn walk_frame_bound(bound: &mut FrameBound, f: &mut impl FnMut(&mut ParameterExpr)) {
    match bound {
        FrameBound::Preceding(expr) | FrameBound::Following(expr) => walk_expr(expr, f),
        _ => {}
    }
}

pub(crate) fn walk_expr(expr: &mut ValueExpr, f: &mut impl FnMut(&mut ParameterExpr)) {
    match expr {
        ValueExpr::Parameter(param) => f(param),
        ValueExpr::Function(call) => {
            if let Some(args) = &mut call.args {
                for arg in args {
                    walk_expr(arg, f);
                }
            }
            if let Some(order_by) = &mut call.internal_order_by {
                for item in &mut order_by.items {
                    walk_expr(&mut item.value, f);
                }
            }
            if let Some(over) = &mut call.over
                && let OverWindow::Spec(spec) = &mut over.window
            {
                walk_window_spec(spec, f);
            }
        }
        ValueExpr::Unary(unary) => walk_expr(&mut unary.operand, f),
        ValueExpr::Binary(binary) => {
            walk_expr(&mut binary.left, f);
            walk_expr(&mut binary.right, f);
        }
        ValueExpr::Paren(paren) => walk_expr(&mut paren.inner, f),
        ValueExpr::Cast(cast) => walk_expr(&mut cast.input, f),
        ValueExpr::Case(case) => {
            if let Some(condition) = &mut case.condition {
                walk_expr(condition, f);
            }
            for pair in &mut case.switch.cases {
                walk_expr(&mut pair.key, f);
                walk_expr(&mut pair.value, f);
            }
            if let Some(else_value) = &mut case.switch.else_value {
                walk_expr(else_value, f);
            }
        }
        ValueExpr::Between(between) => {
            walk_expr(&mut between.operand, f);
            walk_expr(&mut between.lower, f);
            walk_expr(&mut between.upper, f);
        }
        ValueExpr::Tuple(tuple) => {
            for item in &mut tuple.items {
                walk_expr(item, f);
            }
        }
        ValueExpr::ValueList(list) => {
            for item in &mut list.items {
                walk_expr(item, f);
            }
        }
        ValueExpr::InlineQuery(inline) => walk_query(&mut inline.query, f),
        ValueExpr::Array(array) => {
            for item in &mut array.items {
                walk_expr(item, f);
            }
        }
        ValueExpr::ArrayQuery(array) => walk_query(&mut array.query, f),
        ValueExpr::ArrayIndex(index) => {
            walk_expr(&mut index.base, f);
            walk_expr(&mut index.index, f);
        }
        ValueExpr::ArraySlice(slice) => {
            walk_expr(&mut slice.base, f);
            if let Some(lower) = &mut slice.lower {
                walk_expr(lower, f);
            }
            if let Some(upper) = &mut slice.upper {
                walk_expr(upper, f);
            }
        }
        ValueExpr::Literal(_)
        | ValueExpr::Identifier(_)
        | ValueExpr::Column(_)
        | ValueExpr::TypeName(_)
        | ValueExpr::Hint(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sqlforge_lib_core::parser::parse_statement;

    use super::*;

    #[test]
    fn collection_follows_emit_order() {
        let statement =
            parse_statement("select :a from t where x = :b and y in (:c, :a)").unwrap();
        let collected = collect_parameters(&statement);
        let names: Vec<_> = collected.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "a"]);
        let indices: Vec<_> = collected.iter().map(|p| p.index).collect();
        assert_eq!(indices, [1, 2, 3, 4]);
    }

    #[test]
    fn set_parameter_reaches_every_occurrence() {
        let mut statement = parse_statement("select :a + :a from t").unwrap();
        let hits = set_parameter(&mut statement, "a", ParamValue::Int(7)).unwrap();
        assert_eq!(hits, 2);

        let collected = collect_parameters(&statement);
        assert!(collected
            .iter()
            .all(|p| p.value == Some(ParamValue::Int(7))));
    }

    #[test]
    fn missing_parameter_fails_without_mutation() {
        let mut statement = parse_statement("select :a from t").unwrap();
        let snapshot = statement.clone();
        let err = set_parameter(&mut statement, "nope", ParamValue::Null).unwrap_err();
        assert_eq!(
            err,
            TransformError::ParameterNotFound(SmolStr::new("nope"))
        );
        assert_eq!(statement, snapshot);
    }

    #[test]
    fn named_collection_rejects_conflicting_values() {
        let mut statement = parse_statement("select :a + :a from t").unwrap();
        set_parameter(&mut statement, "a", ParamValue::Int(1)).unwrap();

        // Force one occurrence to a different value through the walker.
        let mut first = true;
        walk_statement(&mut statement, &mut |param| {
            if first {
                param.value = Some(ParamValue::Int(2));
                first = false;
            }
        });

        let err = collect_bound_parameters(&statement, ParameterStyle::Named).unwrap_err();
        assert_eq!(err, TransformError::DuplicateParameter(SmolStr::new("a")));
    }

    #[test]
    fn positional_collection_keeps_order() {
        let mut statement = parse_statement("select :a, :b from t").unwrap();
        set_parameter(&mut statement, "a", ParamValue::Str(SmolStr::new("x"))).unwrap();
        set_parameter(&mut statement, "b", ParamValue::Bool(true)).unwrap();

        let ParameterCollection::Positional(values) =
            collect_bound_parameters(&statement, ParameterStyle::Indexed).unwrap()
        else {
            panic!("expected positional");
        };
        assert_eq!(
            values,
            vec![
                Some(ParamValue::Str(SmolStr::new("x"))),
                Some(ParamValue::Bool(true))
            ]
        );
    }
}
