//! Selectable-column resolution: what `(name, expression)` pairs are
//! visible in a query's SELECT scope, wildcards included when a
//! resolver can supply the underlying table shapes.

use itertools::Itertools;
use smol_str::SmolStr;
use sqlforge_lib_core::ast::expr::{ColumnRef, ValueExpr};
use sqlforge_lib_core::ast::query::{Query, SimpleSelect, SourceExpr, SourceKind};
use sqlforge_lib_core::helpers::IndexMap;

/// Supplies the column list of a physical table so `*` and `t.*` can
/// be expanded.
pub trait TableColumnResolver {
    fn columns_of(&self, table: &str) -> Option<Vec<SmolStr>>;
}

/// A resolver backed by a fixed table → columns map.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    tables: IndexMap<SmolStr, Vec<SmolStr>>,
}

impl MapResolver {
    pub fn new() -> Self {
        MapResolver::default()
    }

    pub fn with_table(
        mut self,
        table: &str,
        columns: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        self.tables.insert(
            SmolStr::new(table),
            columns.into_iter().map(SmolStr::new).collect(),
        );
        self
    }
}

impl TableColumnResolver for MapResolver {
    fn columns_of(&self, table: &str) -> Option<Vec<SmolStr>> {
        self.tables.get(table).cloned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectableColumn {
    pub name: SmolStr,
    pub expr: ValueExpr,
}

/// Collect the columns selectable from `select`, in select-list order.
/// Wildcards expand through the resolver (and through subquery
/// sources); duplicate names keep their first occurrence.
pub fn collect_selectable_columns(
    select: &SimpleSelect,
    resolver: Option<&dyn TableColumnResolver>,
) -> Vec<SelectableColumn> {
    let mut seen: IndexMap<SmolStr, SelectableColumn> = IndexMap::default();

    for item in &select.select.items {
        match &item.expr {
            ValueExpr::Column(column) if column.is_wildcard() => {
                expand_wildcard(select, column, resolver, &mut seen);
            }
            expr => {
                if let Some(name) = item.output_name() {
                    seen.entry(name.clone()).or_insert_with(|| SelectableColumn {
                        name: name.clone(),
                        expr: expr.clone(),
                    });
                }
            }
        }
    }

    seen.into_values().collect()
}

fn expand_wildcard(
    select: &SimpleSelect,
    wildcard: &ColumnRef,
    resolver: Option<&dyn TableColumnResolver>,
    seen: &mut IndexMap<SmolStr, SelectableColumn>,
) {
    let Some(from) = &select.from else {
        return;
    };

    let qualifier = wildcard.qualifier();
    let sources = std::iter::once(&from.source)
        .chain(from.joins.iter().map(|j| &j.source))
        .collect_vec();

    for source in sources {
        if let Some(qualifier) = qualifier {
            let matches = source
                .binding_names()
                .iter()
                .any(|name| name == qualifier.as_str());
            if !matches {
                continue;
            }
        }
        expand_source(source, resolver, seen);
    }
}

fn expand_source(
    source: &SourceExpr,
    resolver: Option<&dyn TableColumnResolver>,
    seen: &mut IndexMap<SmolStr, SelectableColumn>,
) {
    let binding = source.binding_name().cloned();
    match &source.kind {
        SourceKind::Table(table) => {
            let Some(resolver) = resolver else {
                return;
            };
            let Some(columns) = resolver.columns_of(&table.name) else {
                return;
            };
            for column in columns {
                let namespaces = binding.iter().cloned().collect();
                let expr = ValueExpr::Column(ColumnRef::new(namespaces, column.clone()));
                seen.entry(column.clone())
                    .or_insert_with(|| SelectableColumn { name: column, expr });
            }
        }
        SourceKind::SubQuery(query) => {
            if let Query::Select(inner) = query.as_ref() {
                for column in collect_selectable_columns(inner, resolver) {
                    let namespaces: Vec<SmolStr> = binding.iter().cloned().collect();
                    let expr =
                        ValueExpr::Column(ColumnRef::new(namespaces, column.name.clone()));
                    seen.entry(column.name.clone())
                        .or_insert_with(|| SelectableColumn {
                            name: column.name,
                            expr,
                        });
                }
            }
        }
        SourceKind::Function(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sqlforge_lib_core::parser::parse_select;

    use super::*;

    #[test]
    fn named_items_resolve_in_order() {
        let select = parse_select("select id, email as contact, count(*) as n from users").unwrap();
        let columns = collect_selectable_columns(&select, None);
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "contact", "n"]);
    }

    #[test]
    fn unnamed_expressions_are_skipped() {
        let select = parse_select("select id, price * 2 from items").unwrap();
        let columns = collect_selectable_columns(&select, None);
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id"]);
    }

    #[test]
    fn wildcard_expands_through_resolver() {
        let select = parse_select("select * from users u").unwrap();
        let resolver = MapResolver::new().with_table("users", ["id", "email"]);
        let columns = collect_selectable_columns(&select, Some(&resolver));
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "email"]);

        // Expanded references are qualified by the source binding.
        let ValueExpr::Column(column) = &columns[0].expr else {
            panic!("expected column");
        };
        assert_eq!(column.qualifier().map(|s| s.as_str()), Some("u"));
    }

    #[test]
    fn qualified_wildcard_expands_one_source() {
        let select =
            parse_select("select u.* from users u inner join orders o on o.user_id = u.id")
                .unwrap();
        let resolver = MapResolver::new()
            .with_table("users", ["id", "email"])
            .with_table("orders", ["id", "user_id", "total"]);
        let columns = collect_selectable_columns(&select, Some(&resolver));
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "email"]);
    }

    #[test]
    fn wildcard_expands_subquery_output() {
        let select =
            parse_select("select * from (select id, kind from events) e").unwrap();
        let columns = collect_selectable_columns(&select, None);
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "kind"]);
    }
}
