//! The fluent transformation surface on `SimpleSelect`: raw predicate
//! appends, resolver-backed join helpers, expression rewrites that
//! round through SQL text, and parameter binding.

use smol_str::SmolStr;
use sqlforge_lib_core::ast::comments::Comments;
use sqlforge_lib_core::ast::dml::{DeleteQuery, InsertQuery, MergeQuery, UpdateQuery};
use sqlforge_lib_core::ast::expr::{ParamValue, QualifiedName, ValueExpr};
use sqlforge_lib_core::ast::query::{
    JoinClause, JoinCondition, JoinKind, Query, SimpleSelect, SourceAlias, SourceExpr,
};
use sqlforge_lib_core::errors::TransformError;
use sqlforge_lib_core::parser::parse_expr;

use crate::SqlFormatter;
use crate::analysis::columns::{TableColumnResolver, collect_selectable_columns};
use crate::analysis::params;
use crate::analysis::upstream::UpstreamSelectQueryFinder;
use crate::builder::{MergeOptions, QueryBuilder};

pub trait SelectQueryExt: Sized {
    /// Parse a raw predicate and fold it into WHERE with AND.
    fn append_where_raw(&mut self, predicate: &str) -> Result<&mut Self, TransformError>;

    /// Parse a raw predicate and fold it into HAVING with AND.
    fn append_having_raw(&mut self, predicate: &str) -> Result<&mut Self, TransformError>;

    fn inner_join(
        &mut self,
        table: &str,
        alias: &str,
        columns: &[&str],
        resolver: Option<&dyn TableColumnResolver>,
    ) -> Result<&mut Self, TransformError>;

    fn left_join(
        &mut self,
        table: &str,
        alias: &str,
        columns: &[&str],
        resolver: Option<&dyn TableColumnResolver>,
    ) -> Result<&mut Self, TransformError>;

    fn right_join(
        &mut self,
        table: &str,
        alias: &str,
        columns: &[&str],
        resolver: Option<&dyn TableColumnResolver>,
    ) -> Result<&mut Self, TransformError>;

    /// Replace the single select item named `column` with the parse of
    /// `f(current_expression_sql)`.
    fn override_select_item_expr(
        &mut self,
        column: &str,
        f: impl FnOnce(&str) -> String,
    ) -> Result<&mut Self, TransformError>;

    /// Append `builder(expression_sql)` as a WHERE predicate wherever
    /// `column` is produced: in this query alone, or in every upstream
    /// SELECT when `upstream` is set.
    fn append_where_expr(
        &mut self,
        column: &str,
        builder: impl Fn(&str) -> String,
        upstream: bool,
    ) -> Result<&mut Self, TransformError>;

    /// Bind a value to every occurrence of a named parameter.
    fn set_parameter(&mut self, name: &str, value: ParamValue)
    -> Result<&mut Self, TransformError>;

    fn to_insert(self, target: &str, columns: Option<Vec<SmolStr>>) -> InsertQuery;

    fn to_update(self, target: &str, columns: &[&str]) -> Result<UpdateQuery, TransformError>;

    fn to_delete(self, target: &str) -> DeleteQuery;

    fn to_merge(self, target: &str, options: MergeOptions) -> Result<MergeQuery, TransformError>;
}

impl SelectQueryExt for SimpleSelect {
    fn append_where_raw(&mut self, predicate: &str) -> Result<&mut Self, TransformError> {
        let condition = parse_expr(predicate)?;
        self.append_where(condition);
        Ok(self)
    }

    fn append_having_raw(&mut self, predicate: &str) -> Result<&mut Self, TransformError> {
        let condition = parse_expr(predicate)?;
        self.append_having(condition);
        Ok(self)
    }

    fn inner_join(
        &mut self,
        table: &str,
        alias: &str,
        columns: &[&str],
        resolver: Option<&dyn TableColumnResolver>,
    ) -> Result<&mut Self, TransformError> {
        join_impl(self, JoinKind::Inner, table, alias, columns, resolver)
    }

    fn left_join(
        &mut self,
        table: &str,
        alias: &str,
        columns: &[&str],
        resolver: Option<&dyn TableColumnResolver>,
    ) -> Result<&mut Self, TransformError> {
        join_impl(self, JoinKind::Left, table, alias, columns, resolver)
    }

    fn right_join(
        &mut self,
        table: &str,
        alias: &str,
        columns: &[&str],
        resolver: Option<&dyn TableColumnResolver>,
    ) -> Result<&mut Self, TransformError> {
        join_impl(self, JoinKind::Right, table, alias, columns, resolver)
    }

    fn override_select_item_expr(
        &mut self,
        column: &str,
        f: impl FnOnce(&str) -> String,
    ) -> Result<&mut Self, TransformError> {
        let matches: Vec<usize> = self
            .select
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.output_name().is_some_and(|name| name == column))
            .map(|(i, _)| i)
            .collect();
        let [index] = matches[..] else {
            return Err(TransformError::AmbiguousColumn(SmolStr::new(column)));
        };

        let current = SqlFormatter::default().format_expr(&self.select.items[index].expr);
        let replacement = parse_expr(&f(&current))?;
        self.select.items[index].expr = replacement;
        Ok(self)
    }

    fn append_where_expr(
        &mut self,
        column: &str,
        builder: impl Fn(&str) -> String,
        upstream: bool,
    ) -> Result<&mut Self, TransformError> {
        if !upstream {
            rewrite_where(self, column, &builder)?;
            return Ok(self);
        }

        // Work on a detached copy so a failure deep in the tree leaves
        // the query untouched.
        let mut trial = Query::Select(Box::new(self.clone()));
        let finder = UpstreamSelectQueryFinder::new([column]);
        let mut failure: Option<TransformError> = None;
        let found = finder.find_mut(&mut trial, &mut |select| {
            if failure.is_some() {
                return;
            }
            if let Err(err) = rewrite_where(select, column, &builder) {
                failure = Some(err);
            }
        });

        if let Some(err) = failure {
            return Err(err);
        }
        if found == 0 {
            return Err(TransformError::AmbiguousColumn(SmolStr::new(column)));
        }

        let Query::Select(updated) = trial else {
            unreachable!("trial shape is fixed");
        };
        *self = *updated;
        Ok(self)
    }

    fn set_parameter(
        &mut self,
        name: &str,
        value: ParamValue,
    ) -> Result<&mut Self, TransformError> {
        let mut hits = 0;
        params::walk_select(self, &mut |param| {
            if param.name == name {
                hits += 1;
            }
        });
        if hits == 0 {
            return Err(TransformError::ParameterNotFound(SmolStr::new(name)));
        }
        params::walk_select(self, &mut |param| {
            if param.name == name {
                param.value = Some(value.clone());
            }
        });
        Ok(self)
    }

    fn to_insert(self, target: &str, columns: Option<Vec<SmolStr>>) -> InsertQuery {
        QueryBuilder::to_insert(self, target, columns)
    }

    fn to_update(self, target: &str, columns: &[&str]) -> Result<UpdateQuery, TransformError> {
        QueryBuilder::to_update(self, target, columns)
    }

    fn to_delete(self, target: &str) -> DeleteQuery {
        QueryBuilder::to_delete(self, target)
    }

    fn to_merge(self, target: &str, options: MergeOptions) -> Result<MergeQuery, TransformError> {
        QueryBuilder::to_merge(self, target, options)
    }
}

/// Append `builder(expr_sql)` for the single item named `column`.
fn rewrite_where(
    select: &mut SimpleSelect,
    column: &str,
    builder: &impl Fn(&str) -> String,
) -> Result<(), TransformError> {
    let matches: Vec<&ValueExpr> = select
        .select
        .items
        .iter()
        .filter(|item| item.output_name().is_some_and(|name| name == column))
        .map(|item| &item.expr)
        .collect();
    let [expr] = matches[..] else {
        return Err(TransformError::AmbiguousColumn(SmolStr::new(column)));
    };

    let expr_sql = SqlFormatter::default().format_expr(expr);
    let predicate = parse_expr(&builder(&expr_sql))?;
    select.append_where(predicate);
    Ok(())
}

fn join_impl<'a>(
    select: &'a mut SimpleSelect,
    kind: JoinKind,
    table: &str,
    alias: &str,
    columns: &[&str],
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<&'a mut SimpleSelect, TransformError> {
    if select.from.is_none() {
        return Err(TransformError::MissingFromClause);
    }
    if alias.trim().is_empty() {
        return Err(TransformError::MissingAlias);
    }

    let selectable = collect_selectable_columns(select, resolver);
    let mut missing: Vec<SmolStr> = Vec::new();
    let mut condition: Option<ValueExpr> = None;

    for column in columns {
        let Some(existing) = selectable.iter().find(|c| c.name == *column) else {
            missing.push(SmolStr::new(*column));
            continue;
        };
        let equality = existing.expr.clone().equals(ValueExpr::qualified_column(
            std::iter::once(SmolStr::new(alias)),
            *column,
        ));
        condition = Some(match condition {
            Some(acc) => acc.and(equality),
            None => equality,
        });
    }

    if !missing.is_empty() {
        return Err(TransformError::UnresolvedJoinColumns { columns: missing });
    }
    let Some(condition) = condition else {
        return Err(TransformError::UnresolvedJoinColumns {
            columns: Vec::new(),
        });
    };

    let mut source = SourceExpr::table(QualifiedName::bare(table));
    source.alias = Some(SourceAlias::new(alias));

    select
        .from
        .as_mut()
        .expect("checked above")
        .joins
        .push(JoinClause {
            kind,
            lateral: false,
            source,
            condition: Some(JoinCondition::On(condition)),
            join_comments: Vec::new(),
            comments: Comments::new(),
        });

    Ok(select)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sqlforge_lib_core::parser::parse_select;

    use super::*;
    use crate::analysis::columns::MapResolver;

    #[test]
    fn append_where_raw_seeds_where() {
        let mut select = parse_select("select id from users").unwrap();
        select.append_where_raw("active = true").unwrap();
        assert!(select.where_clause.is_some());
    }

    #[test]
    fn inner_join_infers_on_condition() {
        let mut select = parse_select("select u.id, u.email from users u").unwrap();
        let err = select
            .inner_join("orders", "o", &["order_ref"], None)
            .unwrap_err();
        assert_eq!(
            err,
            TransformError::UnresolvedJoinColumns {
                columns: vec![SmolStr::new("order_ref")]
            }
        );

        // `id` is selectable as `u.id`, so the join condition equates
        // it with the new alias.
        let mut select = parse_select("select id from users u").unwrap();
        select.inner_join("orders", "o", &["id"], None).unwrap();
        let join = &select.from.as_ref().unwrap().joins[0];
        assert_eq!(join.kind, JoinKind::Inner);
        let Some(JoinCondition::On(ValueExpr::Binary(on))) = &join.condition else {
            panic!("expected ON equality");
        };
        assert_eq!(on.op, "=");
    }

    #[test]
    fn join_without_from_fails() {
        let mut select = parse_select("select 1").unwrap();
        let err = select.inner_join("orders", "o", &["id"], None).unwrap_err();
        assert_eq!(err, TransformError::MissingFromClause);
    }

    #[test]
    fn join_with_wildcard_needs_resolver() {
        let mut select = parse_select("select * from users u").unwrap();
        let err = select.left_join("orders", "o", &["id"], None).unwrap_err();
        assert!(matches!(err, TransformError::UnresolvedJoinColumns { .. }));

        let resolver = MapResolver::new().with_table("users", ["id", "email"]);
        let mut select = parse_select("select * from users u").unwrap();
        select
            .left_join("orders", "o", &["id"], Some(&resolver))
            .unwrap();
        assert_eq!(select.from.as_ref().unwrap().joins.len(), 1);
    }

    #[test]
    fn override_select_item_expr_replaces_single_match() {
        let mut select = parse_select("select id, email from users").unwrap();
        select
            .override_select_item_expr("email", |current| format!("lower({current})"))
            .unwrap();
        let item = &select.select.items[1];
        assert!(matches!(item.expr, ValueExpr::Function(_)));

        let err = select
            .override_select_item_expr("missing", |c| c.to_string())
            .unwrap_err();
        assert_eq!(err, TransformError::AmbiguousColumn(SmolStr::new("missing")));
    }

    #[test]
    fn append_where_expr_current_scope() {
        let mut select = parse_select("select id, email from users").unwrap();
        select
            .append_where_expr("email", |expr| format!("{expr} like '%@corp.test'"), false)
            .unwrap();
        assert!(select.where_clause.is_some());
    }

    #[test]
    fn append_where_expr_upstream_touches_cte_bodies() {
        let mut select = parse_select(
            "with active as (select id, email from users) select id, email from active",
        )
        .unwrap();
        select
            .append_where_expr("email", |expr| format!("{expr} is not null"), true)
            .unwrap();

        // Both the outer query and the CTE body produce `email`.
        assert!(select.where_clause.is_some());
        let body = &select.with.as_ref().unwrap().tables[0].query;
        assert!(body.as_select().unwrap().where_clause.is_some());
    }

    #[test]
    fn set_parameter_requires_existing_name() {
        let mut select = parse_select("select id from users where org = :org").unwrap();
        select
            .set_parameter("org", ParamValue::Str(SmolStr::new("acme")))
            .unwrap();

        let err = select
            .set_parameter("nope", ParamValue::Null)
            .unwrap_err();
        assert_eq!(err, TransformError::ParameterNotFound(SmolStr::new("nope")));
    }
}
