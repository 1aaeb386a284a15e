//! DML conversions: reshape a SELECT into INSERT, UPDATE, DELETE or
//! MERGE while carrying its WITH clause and filters along.

use smol_str::SmolStr;
use sqlforge_lib_core::ast::comments::Comments;
use sqlforge_lib_core::ast::dml::*;
use sqlforge_lib_core::ast::expr::{ColumnRef, IdentifierExpr, QualifiedName, ValueExpr};
use sqlforge_lib_core::ast::query::{Query, SimpleSelect, SourceAlias, SourceExpr};
use sqlforge_lib_core::errors::TransformError;

pub struct QueryBuilder;

#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Alias for the merge target; defaults to the bare table name.
    pub target_alias: Option<SmolStr>,
    /// Alias for the SELECT wrapped as the merge source.
    pub source_alias: SmolStr,
    /// Columns the ON condition equates between target and source.
    pub key_columns: Vec<SmolStr>,
}

impl QueryBuilder {
    /// `insert into target [(columns)] <select>`. The SELECT's WITH
    /// clause moves onto the INSERT.
    pub fn to_insert(
        mut select: SimpleSelect,
        target: &str,
        columns: Option<Vec<SmolStr>>,
    ) -> InsertQuery {
        let with = select.with.take();
        select.rebuild_cte_cache();
        InsertQuery {
            with,
            target: QualifiedName::bare(target),
            columns: columns.map(|columns| {
                columns.into_iter().map(IdentifierExpr::new).collect()
            }),
            source: InsertSource::Query(Query::Select(Box::new(select))),
            returning: None,
            header_comments: Vec::new(),
            comments: Comments::new(),
        }
    }

    /// `update target set c = <expr>, ...` with SET built from the
    /// SELECT items whose output names match `columns`. FROM and WHERE
    /// carry over unchanged.
    pub fn to_update(
        mut select: SimpleSelect,
        target: &str,
        columns: &[&str],
    ) -> Result<UpdateQuery, TransformError> {
        let mut items = Vec::new();
        let mut missing = Vec::new();
        for column in columns {
            let matched = select
                .select
                .items
                .iter()
                .find(|item| item.output_name().is_some_and(|name| name == column));
            match matched {
                Some(item) => items.push(SetItem {
                    column: ColumnRef::new(Vec::new(), *column),
                    value: item.expr.clone(),
                    comments: Comments::new(),
                }),
                None => missing.push(SmolStr::new(*column)),
            }
        }
        if !missing.is_empty() {
            return Err(TransformError::UnresolvedJoinColumns { columns: missing });
        }

        let with = select.with.take();
        Ok(UpdateQuery {
            with,
            target: SourceExpr::table(QualifiedName::bare(target)),
            set: SetClause {
                items,
                comments: Comments::new(),
            },
            from: select.from.take(),
            where_clause: select.where_clause.take(),
            returning: None,
            header_comments: Vec::new(),
            comments: Comments::new(),
        })
    }

    /// `delete from target [using <from sources>] [where ...]`. The
    /// SELECT's FROM sources become the USING list.
    pub fn to_delete(mut select: SimpleSelect, target: &str) -> DeleteQuery {
        let using = select.from.take().map(|from| {
            let mut sources = vec![from.source];
            sources.extend(from.joins.into_iter().map(|join| join.source));
            UsingClause {
                sources,
                comments: Comments::new(),
            }
        });

        let with = select.with.take();
        DeleteQuery {
            with,
            target: SourceExpr::table(QualifiedName::bare(target)),
            using,
            where_clause: select.where_clause.take(),
            returning: None,
            header_comments: Vec::new(),
            comments: Comments::new(),
        }
    }

    /// The canonical upsert: merge the SELECT into the target keyed on
    /// `key_columns`, updating matched rows and inserting the rest.
    pub fn to_merge(
        mut select: SimpleSelect,
        target: &str,
        options: MergeOptions,
    ) -> Result<MergeQuery, TransformError> {
        if options.source_alias.trim().is_empty() {
            return Err(TransformError::MissingAlias);
        }
        if options.key_columns.is_empty() {
            return Err(TransformError::UnresolvedJoinColumns {
                columns: Vec::new(),
            });
        }

        let output_names: Vec<SmolStr> = select
            .select
            .items
            .iter()
            .filter_map(|item| item.output_name().cloned())
            .collect();
        let missing: Vec<SmolStr> = options
            .key_columns
            .iter()
            .filter(|key| !output_names.contains(key))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TransformError::UnresolvedJoinColumns { columns: missing });
        }

        let with = select.with.take();
        select.rebuild_cte_cache();

        let target_name = options
            .target_alias
            .clone()
            .unwrap_or_else(|| SmolStr::new(target));
        let source_alias = options.source_alias.clone();

        let mut target_source = SourceExpr::table(QualifiedName::bare(target));
        if let Some(alias) = &options.target_alias {
            target_source.alias = Some(SourceAlias::new(alias));
        }

        let source = select
            .to_source(&source_alias)
            .expect("alias checked non-empty");

        let on = options
            .key_columns
            .iter()
            .map(|key| {
                ValueExpr::qualified_column(
                    std::iter::once(target_name.clone()),
                    key.clone(),
                )
                .equals(ValueExpr::qualified_column(
                    std::iter::once(source_alias.clone()),
                    key.clone(),
                ))
            })
            .reduce(ValueExpr::and)
            .expect("key columns checked non-empty");

        let update_items: Vec<SetItem> = output_names
            .iter()
            .filter(|name| !options.key_columns.contains(name))
            .map(|name| SetItem {
                column: ColumnRef::new(Vec::new(), name.clone()),
                value: ValueExpr::qualified_column(
                    std::iter::once(source_alias.clone()),
                    name.clone(),
                ),
                comments: Comments::new(),
            })
            .collect();

        let mut when_clauses = Vec::new();
        if !update_items.is_empty() {
            when_clauses.push(MergeWhenClause {
                kind: MergeMatchKind::Matched,
                condition: None,
                action: MergeAction::UpdateSet(SetClause {
                    items: update_items,
                    comments: Comments::new(),
                }),
                then_comments: Vec::new(),
                comments: Comments::new(),
            });
        }
        when_clauses.push(MergeWhenClause {
            kind: MergeMatchKind::NotMatched,
            condition: None,
            action: MergeAction::Insert {
                columns: Some(
                    output_names
                        .iter()
                        .map(|name| IdentifierExpr::new(name.clone()))
                        .collect(),
                ),
                values: Some(sqlforge_lib_core::ast::expr::TupleExpr::new(
                    output_names
                        .iter()
                        .map(|name| {
                            ValueExpr::qualified_column(
                                std::iter::once(source_alias.clone()),
                                name.clone(),
                            )
                        })
                        .collect(),
                )),
                values_comments: Vec::new(),
            },
            then_comments: Vec::new(),
            comments: Comments::new(),
        });

        Ok(MergeQuery {
            with,
            target: target_source,
            source,
            on,
            when_clauses,
            header_comments: Vec::new(),
            comments: Comments::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sqlforge_lib_core::parser::parse_select;

    use super::*;

    #[test]
    fn insert_preserves_with_clause() {
        let select = parse_select(
            "with staged as (select id, email from intake) select id, email from staged",
        )
        .unwrap();
        let insert = QueryBuilder::to_insert(
            select,
            "users",
            Some(vec![SmolStr::new("id"), SmolStr::new("email")]),
        );
        assert!(insert.with.is_some());
        assert_eq!(insert.target.name, "users");
        let InsertSource::Query(Query::Select(body)) = &insert.source else {
            panic!("expected select body");
        };
        assert!(body.with.is_none());
    }

    #[test]
    fn update_builds_set_from_matching_items() {
        let select = parse_select(
            "select id, lower(email) as email, now() as updated_at from staged where id > 0",
        )
        .unwrap();
        let update = QueryBuilder::to_update(select, "users", &["email", "updated_at"]).unwrap();
        assert_eq!(update.set.items.len(), 2);
        assert_eq!(update.set.items[0].column.name, "email");
        assert!(update.where_clause.is_some());
        assert!(update.from.is_some());
    }

    #[test]
    fn update_with_unknown_column_fails() {
        let select = parse_select("select id from staged").unwrap();
        let err = QueryBuilder::to_update(select, "users", &["email"]).unwrap_err();
        assert_eq!(
            err,
            TransformError::UnresolvedJoinColumns {
                columns: vec![SmolStr::new("email")]
            }
        );
    }

    #[test]
    fn delete_moves_from_into_using() {
        let select = parse_select(
            "select s.id from sessions s inner join users u on u.id = s.user_id \
             where u.banned = true",
        )
        .unwrap();
        let delete = QueryBuilder::to_delete(select, "sessions");
        assert_eq!(delete.using.as_ref().unwrap().sources.len(), 2);
        assert!(delete.where_clause.is_some());
    }

    #[test]
    fn merge_upsert_shape() {
        let select = parse_select("select id, qty from staged").unwrap();
        let merge = QueryBuilder::to_merge(
            select,
            "items",
            MergeOptions {
                target_alias: Some(SmolStr::new("t")),
                source_alias: SmolStr::new("s"),
                key_columns: vec![SmolStr::new("id")],
            },
        )
        .unwrap();

        assert_eq!(merge.when_clauses.len(), 2);
        assert_eq!(merge.when_clauses[0].kind, MergeMatchKind::Matched);
        assert_eq!(merge.when_clauses[1].kind, MergeMatchKind::NotMatched);
    }

    #[test]
    fn merge_requires_key_columns_in_output() {
        let select = parse_select("select qty from staged").unwrap();
        let err = QueryBuilder::to_merge(
            select,
            "items",
            MergeOptions {
                target_alias: None,
                source_alias: SmolStr::new("s"),
                key_columns: vec![SmolStr::new("id")],
            },
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::UnresolvedJoinColumns { .. }));
    }
}
