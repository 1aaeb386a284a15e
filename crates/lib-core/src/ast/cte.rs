//! WITH-clause normalization: gather every common table in a tree,
//! strip the nested WITH clauses they came from, and reassemble a
//! single WITH on the root with conflicts resolved and references
//! ordered.

use itertools::Itertools;
use smol_str::SmolStr;

use crate::ast::expr::{FunctionCall, ValueExpr};
use crate::ast::query::{
    CommonTable, FromClause, JoinCondition, Query, SimpleSelect, SourceExpr, SourceKind,
    WithClause,
};
use crate::ast::structurally_equal;
use crate::errors::TransformError;
use crate::helpers::IndexMap;

/// A common table found somewhere in a tree, tagged with how deeply it
/// was nested.
#[derive(Debug, Clone)]
pub struct CollectedCte {
    pub table: CommonTable,
    pub depth: usize,
}

/// Gather every `CommonTable` reachable from `select`, outermost
/// first. Bodies are cloned; the tree is untouched.
pub fn collect(select: &SimpleSelect) -> Vec<CollectedCte> {
    let mut out = Vec::new();
    collect_select(select, 0, &mut out);
    out
}

fn collect_select(select: &SimpleSelect, depth: usize, out: &mut Vec<CollectedCte>) {
    if let Some(with) = &select.with {
        for table in &with.tables {
            out.push(CollectedCte {
                table: table.clone(),
                depth,
            });
            collect_query(&table.query, depth + 1, out);
        }
    }
    if let Some(from) = &select.from {
        collect_from(from, depth, out);
    }
    for item in &select.select.items {
        collect_expr(&item.expr, depth, out);
    }
    if let Some(where_clause) = &select.where_clause {
        collect_expr(&where_clause.condition, depth, out);
    }
    if let Some(having) = &select.having {
        collect_expr(&having.condition, depth, out);
    }
}

fn collect_query(query: &Query, depth: usize, out: &mut Vec<CollectedCte>) {
    match query {
        Query::Select(select) => collect_select(select, depth, out),
        Query::Binary(binary) => {
            collect_query(&binary.left, depth, out);
            collect_query(&binary.right, depth, out);
        }
        Query::Values(_) => {}
    }
}

fn collect_from(from: &FromClause, depth: usize, out: &mut Vec<CollectedCte>) {
    collect_source(&from.source, depth, out);
    for join in &from.joins {
        collect_source(&join.source, depth, out);
        if let Some(JoinCondition::On(expr)) = &join.condition {
            collect_expr(expr, depth, out);
        }
    }
}

fn collect_source(source: &SourceExpr, depth: usize, out: &mut Vec<CollectedCte>) {
    match &source.kind {
        SourceKind::SubQuery(query) => collect_query(query, depth + 1, out),
        SourceKind::Table(_) | SourceKind::Function(_) => {}
    }
}

fn collect_expr(expr: &ValueExpr, depth: usize, out: &mut Vec<CollectedCte>) {
    visit_expr_queries(expr, &mut |query| collect_query(query, depth + 1, out));
}

/// Strip every WITH clause from a query tree, rebuilding the name
/// caches it invalidates.
pub fn disable_with_clauses(query: &mut Query) {
    match query {
        Query::Select(select) => disable_with_clauses_select(select),
        Query::Binary(binary) => {
            disable_with_clauses(&mut binary.left);
            disable_with_clauses(&mut binary.right);
        }
        Query::Values(_) => {}
    }
}

fn disable_with_clauses_select(select: &mut SimpleSelect) {
    select.with = None;
    select.rebuild_cte_cache();
    if let Some(from) = &mut select.from {
        disable_from(from);
    }
    for item in &mut select.select.items {
        disable_expr(&mut item.expr);
    }
    if let Some(where_clause) = &mut select.where_clause {
        disable_expr(&mut where_clause.condition);
    }
    if let Some(having) = &mut select.having {
        disable_expr(&mut having.condition);
    }
}

fn disable_from(from: &mut FromClause) {
    disable_source(&mut from.source);
    for join in &mut from.joins {
        disable_source(&mut join.source);
        if let Some(JoinCondition::On(expr)) = &mut join.condition {
            disable_expr(expr);
        }
    }
}

fn disable_source(source: &mut SourceExpr) {
    if let SourceKind::SubQuery(query) = &mut source.kind {
        disable_with_clauses(query);
    }
}

fn disable_expr(expr: &mut ValueExpr) {
    visit_expr_queries_mut(expr, &mut disable_with_clauses);
}

/// Normalize the WITH layout of `select`: hoist nested CTEs to the
/// root, merge structural duplicates, fail on conflicting bodies,
/// order by reference, and infer the RECURSIVE flag.
pub fn normalize(select: &mut SimpleSelect) -> Result<(), TransformError> {
    let collected = collect(select);
    if collected.is_empty() {
        select.rebuild_cte_cache();
        return Ok(());
    }

    // Dedup by name; merging is only legal when bodies agree.
    let mut merged: IndexMap<SmolStr, CommonTable> = IndexMap::default();
    for entry in collected {
        let name = entry.table.name.name.clone();
        match merged.get(&name) {
            None => {
                merged.insert(name, entry.table);
            }
            Some(existing) => {
                if structurally_equal(&existing.query, &entry.table.query) {
                    log::debug!("merging duplicate CTE {name:?} with an identical body");
                } else {
                    return Err(TransformError::DuplicateCte(name));
                }
            }
        }
    }

    // Hoisted bodies may still carry their own WITH clauses; those
    // tables are in `merged` already.
    let mut tables = merged.into_values().collect_vec();
    for table in &mut tables {
        disable_with_clauses(&mut table.query);
    }

    let mut root_query = Query::Select(Box::new(std::mem::take(select)));
    disable_with_clauses(&mut root_query);
    let Query::Select(root) = root_query else {
        unreachable!("select root cannot change shape");
    };
    *select = *root;

    let recursive = tables
        .iter()
        .any(|t| references_table(&t.query, &t.name.name));
    let tables = order_by_reference(tables);

    select.with = Some(WithClause {
        recursive,
        tables,
        comments: Default::default(),
    });
    select.rebuild_cte_cache();
    Ok(())
}

/// Stable topological order: a CTE that references another appears
/// after it; unrelated CTEs keep their original order.
fn order_by_reference(tables: Vec<CommonTable>) -> Vec<CommonTable> {
    let names = tables.iter().map(|t| t.name.name.clone()).collect_vec();
    let deps: Vec<Vec<usize>> = tables
        .iter()
        .map(|table| {
            names
                .iter()
                .enumerate()
                .filter(|(_, name)| {
                    **name != table.name.name && references_table(&table.query, name)
                })
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let mut emitted = vec![false; tables.len()];
    let mut order: Vec<usize> = Vec::with_capacity(tables.len());
    while order.len() < tables.len() {
        let next = (0..tables.len())
            .find(|&i| !emitted[i] && deps[i].iter().all(|&d| emitted[d]));
        match next {
            Some(i) => {
                emitted[i] = true;
                order.push(i);
            }
            None => {
                // Mutually recursive group: keep original order.
                for i in 0..tables.len() {
                    if !emitted[i] {
                        emitted[i] = true;
                        order.push(i);
                    }
                }
            }
        }
    }

    let mut slots: Vec<Option<CommonTable>> = tables.into_iter().map(Some).collect();
    order
        .into_iter()
        .map(|i| slots[i].take().expect("each index emitted once"))
        .collect()
}

/// Does the query use `name` as a bare table source anywhere?
pub fn references_table(query: &Query, name: &str) -> bool {
    match query {
        Query::Select(select) => {
            if let Some(with) = &select.with
                && with.tables.iter().any(|t| references_table(&t.query, name))
            {
                return true;
            }
            if let Some(from) = &select.from {
                if source_references(&from.source, name) {
                    return true;
                }
                for join in &from.joins {
                    if source_references(&join.source, name) {
                        return true;
                    }
                    if let Some(JoinCondition::On(expr)) = &join.condition
                        && expr_references(expr, name)
                    {
                        return true;
                    }
                }
            }
            select
                .select
                .items
                .iter()
                .any(|item| expr_references(&item.expr, name))
                || select
                    .where_clause
                    .as_ref()
                    .is_some_and(|w| expr_references(&w.condition, name))
                || select
                    .having
                    .as_ref()
                    .is_some_and(|h| expr_references(&h.condition, name))
        }
        Query::Binary(binary) => {
            references_table(&binary.left, name) || references_table(&binary.right, name)
        }
        Query::Values(_) => false,
    }
}

fn source_references(source: &SourceExpr, name: &str) -> bool {
    match &source.kind {
        SourceKind::Table(table) => table.namespaces.is_empty() && table.name == name,
        SourceKind::SubQuery(query) => references_table(query, name),
        SourceKind::Function(_) => false,
    }
}

fn expr_references(expr: &ValueExpr, name: &str) -> bool {
    let mut found = false;
    visit_expr_queries(expr, &mut |query| {
        if references_table(query, name) {
            found = true;
        }
    });
    found
}

/// Apply `f` to every query embedded in an expression tree.
fn visit_expr_queries(expr: &ValueExpr, f: &mut impl FnMut(&Query)) {
    match expr {
        ValueExpr::InlineQuery(inline) => f(&inline.query),
        ValueExpr::ArrayQuery(array) => f(&array.query),
        ValueExpr::Function(call) => visit_function_queries(call, f),
        ValueExpr::Unary(unary) => visit_expr_queries(&unary.operand, f),
        ValueExpr::Binary(binary) => {
            visit_expr_queries(&binary.left, f);
            visit_expr_queries(&binary.right, f);
        }
        ValueExpr::Paren(paren) => visit_expr_queries(&paren.inner, f),
        ValueExpr::Cast(cast) => visit_expr_queries(&cast.input, f),
        ValueExpr::Case(case) => {
            if let Some(condition) = &case.condition {
                visit_expr_queries(condition, f);
            }
            for pair in &case.switch.cases {
                visit_expr_queries(&pair.key, f);
                visit_expr_queries(&pair.value, f);
            }
            if let Some(else_value) = &case.switch.else_value {
                visit_expr_queries(else_value, f);
            }
        }
        ValueExpr::Between(between) => {
            visit_expr_queries(&between.operand, f);
            visit_expr_queries(&between.lower, f);
            visit_expr_queries(&between.upper, f);
        }
        ValueExpr::Tuple(tuple) => tuple.items.iter().for_each(|e| visit_expr_queries(e, f)),
        ValueExpr::ValueList(list) => list.items.iter().for_each(|e| visit_expr_queries(e, f)),
        ValueExpr::Array(array) => array.items.iter().for_each(|e| visit_expr_queries(e, f)),
        ValueExpr::ArrayIndex(index) => {
            visit_expr_queries(&index.base, f);
            visit_expr_queries(&index.index, f);
        }
        ValueExpr::ArraySlice(slice) => {
            visit_expr_queries(&slice.base, f);
            if let Some(lower) = &slice.lower {
                visit_expr_queries(lower, f);
            }
            if let Some(upper) = &slice.upper {
                visit_expr_queries(upper, f);
            }
        }
        ValueExpr::Literal(_)
        | ValueExpr::Identifier(_)
        | ValueExpr::Column(_)
        | ValueExpr::Parameter(_)
        | ValueExpr::TypeName(_)
        | ValueExpr::Hint(_) => {}
    }
}

fn visit_function_queries(call: &FunctionCall, f: &mut impl FnMut(&Query)) {
    if let Some(args) = &call.args {
        args.iter().for_each(|e| visit_expr_queries(e, f));
    }
}

fn visit_expr_queries_mut(expr: &mut ValueExpr, f: &mut impl FnMut(&mut Query)) {
    match expr {
        ValueExpr::InlineQuery(inline) => f(&mut inline.query),
        ValueExpr::ArrayQuery(array) => f(&mut array.query),
        ValueExpr::Function(call) => {
            if let Some(args) = &mut call.args {
                args.iter_mut().for_each(|e| visit_expr_queries_mut(e, f));
            }
        }
        ValueExpr::Unary(unary) => visit_expr_queries_mut(&mut unary.operand, f),
        ValueExpr::Binary(binary) => {
            visit_expr_queries_mut(&mut binary.left, f);
            visit_expr_queries_mut(&mut binary.right, f);
        }
        ValueExpr::Paren(paren) => visit_expr_queries_mut(&mut paren.inner, f),
        ValueExpr::Cast(cast) => visit_expr_queries_mut(&mut cast.input, f),
        ValueExpr::Case(case) => {
            if let Some(condition) = &mut case.condition {
                visit_expr_queries_mut(condition, f);
            }
            for pair in &mut case.switch.cases {
                visit_expr_queries_mut(&mut pair.key, f);
                visit_expr_queries_mut(&mut pair.value, f);
            }
            if let Some(else_value) = &mut case.switch.else_value {
                visit_expr_queries_mut(else_value, f);
            }
        }
        ValueExpr::Between(between) => {
            visit_expr_queries_mut(&mut between.operand, f);
            visit_expr_queries_mut(&mut between.lower, f);
            visit_expr_queries_mut(&mut between.upper, f);
        }
        ValueExpr::Tuple(tuple) => tuple
            .items
            .iter_mut()
            .for_each(|e| visit_expr_queries_mut(e, f)),
        ValueExpr::ValueList(list) => list
            .items
            .iter_mut()
            .for_each(|e| visit_expr_queries_mut(e, f)),
        ValueExpr::Array(array) => array
            .items
            .iter_mut()
            .for_each(|e| visit_expr_queries_mut(e, f)),
        ValueExpr::ArrayIndex(index) => {
            visit_expr_queries_mut(&mut index.base, f);
            visit_expr_queries_mut(&mut index.index, f);
        }
        ValueExpr::ArraySlice(slice) => {
            visit_expr_queries_mut(&mut slice.base, f);
            if let Some(lower) = &mut slice.lower {
                visit_expr_queries_mut(lower, f);
            }
            if let Some(upper) = &mut slice.upper {
                visit_expr_queries_mut(upper, f);
            }
        }
        ValueExpr::Literal(_)
        | ValueExpr::Identifier(_)
        | ValueExpr::Column(_)
        | ValueExpr::Parameter(_)
        | ValueExpr::TypeName(_)
        | ValueExpr::Hint(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::expr::QualifiedName;
    use crate::ast::query::{CteOptions, SelectItem, SourceExpr};

    fn select_from(table: &str) -> SimpleSelect {
        let mut select = SimpleSelect::default();
        select
            .select
            .items
            .push(SelectItem::new(ValueExpr::column("id")));
        select.from = Some(FromClause {
            source: SourceExpr::table(QualifiedName::bare(table)),
            joins: Vec::new(),
            comments: Default::default(),
        });
        select
    }

    #[test]
    fn nested_with_is_hoisted_to_root() {
        let mut inner = select_from("raw");
        inner
            .add_cte("stage", select_from("events").into(), CteOptions::default())
            .unwrap();

        let mut outer = select_from("stage");
        outer
            .add_cte("inner_q", inner.into(), CteOptions::default())
            .unwrap();

        let names = outer.get_cte_names();
        assert_eq!(names, vec![SmolStr::new("stage"), SmolStr::new("inner_q")]);

        // The hoisted body no longer carries its own WITH.
        let with = outer.with.as_ref().unwrap();
        let inner_table = with
            .tables
            .iter()
            .find(|t| t.name.name == "inner_q")
            .unwrap();
        assert!(inner_table.query.as_select().unwrap().with.is_none());
    }

    #[test]
    fn identical_duplicate_bodies_merge() {
        let mut q = select_from("a_t");
        q.add_cte("dup", select_from("users").into(), CteOptions::default())
            .unwrap();

        let mut inner = select_from("dup");
        inner
            .add_cte("dup", select_from("users").into(), CteOptions::default())
            .unwrap();
        q.replace_cte("wrapper", inner.into(), CteOptions::default())
            .unwrap();

        let names = q.get_cte_names();
        assert_eq!(names.iter().filter(|n| n.as_str() == "dup").count(), 1);
    }

    #[test]
    fn conflicting_duplicate_bodies_fail() {
        let mut q = select_from("t");
        q.add_cte("dup", select_from("users").into(), CteOptions::default())
            .unwrap();

        let mut inner = select_from("dup");
        inner
            .add_cte("dup", select_from("orders").into(), CteOptions::default())
            .unwrap();
        let err = q
            .replace_cte("wrapper", inner.into(), CteOptions::default())
            .unwrap_err();
        assert_eq!(err, TransformError::DuplicateCte(SmolStr::new("dup")));
    }

    #[test]
    fn referencing_cte_is_ordered_after_its_dependency() {
        let mut q = select_from("late");
        // `late` references `early`, but is registered first.
        q.add_cte("late", select_from("early").into(), CteOptions::default())
            .unwrap();
        q.add_cte("early", select_from("users").into(), CteOptions::default())
            .unwrap();

        assert_eq!(
            q.get_cte_names(),
            vec![SmolStr::new("early"), SmolStr::new("late")]
        );
    }

    #[test]
    fn self_reference_sets_recursive() {
        let body = select_from("seed").to_union_all(select_from("walk"));
        let mut q = select_from("walk");
        q.add_cte("walk", body, CteOptions::default()).unwrap();
        assert!(q.with.as_ref().unwrap().recursive);

        let mut plain = select_from("t2");
        plain
            .add_cte("flat", select_from("users").into(), CteOptions::default())
            .unwrap();
        assert!(!plain.with.as_ref().unwrap().recursive);
    }
}
