//! DML emission: INSERT, UPDATE, DELETE and MERGE shapes.

use smol_str::SmolStr;
use sqlforge_lib_core::ast::dml::*;
use sqlforge_lib_core::ast::expr::IdentifierExpr;

use super::TokenEmitter;
use crate::tokens::{ContainerType, SqlToken};

impl TokenEmitter {
    pub(crate) fn insert_query(&mut self, insert: &mut InsertQuery, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = insert.comments.take();
        self.comments_before(&mut children, &mut comments);

        if let Some(with) = &mut insert.with {
            self.with_clause(with, &mut children);
            children.push(SqlToken::Space);
        }

        self.push_kw(&mut children, "insert into");
        children.push(SqlToken::Space);
        self.qualified_name(&mut insert.target, &mut children);
        self.identifier_list_parens(&insert.columns, &mut children);

        children.push(SqlToken::Space);
        match &mut insert.source {
            InsertSource::Query(query) => self.query(query, &mut children),
            InsertSource::DefaultValues => self.push_kw(&mut children, "default values"),
        }

        if let Some(returning) = &mut insert.returning {
            children.push(SqlToken::Space);
            self.returning_clause(returning, &mut children);
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::InsertQuery, children));
    }

    pub(crate) fn update_query(&mut self, update: &mut UpdateQuery, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = update.comments.take();
        self.comments_before(&mut children, &mut comments);

        if let Some(with) = &mut update.with {
            self.with_clause(with, &mut children);
            children.push(SqlToken::Space);
        }

        self.push_kw(&mut children, "update");
        children.push(SqlToken::Space);
        self.source_expr(&mut update.target, &mut children);

        children.push(SqlToken::Space);
        self.set_clause(&mut update.set, &mut children);

        if let Some(from) = &mut update.from {
            children.push(SqlToken::Space);
            self.from_clause(from, &mut children);
        }

        if let Some(where_clause) = &mut update.where_clause {
            children.push(SqlToken::Space);
            self.where_clause(where_clause, &mut children);
        }
        if let Some(returning) = &mut update.returning {
            children.push(SqlToken::Space);
            self.returning_clause(returning, &mut children);
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::UpdateQuery, children));
    }

    pub(crate) fn delete_query(&mut self, delete: &mut DeleteQuery, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = delete.comments.take();
        self.comments_before(&mut children, &mut comments);

        if let Some(with) = &mut delete.with {
            self.with_clause(with, &mut children);
            children.push(SqlToken::Space);
        }

        self.push_kw(&mut children, "delete from");
        children.push(SqlToken::Space);
        self.source_expr(&mut delete.target, &mut children);

        if let Some(using) = &mut delete.using {
            children.push(SqlToken::Space);
            let mut clause = Vec::new();
            let mut using_comments = using.comments.take();
            self.comments_before(&mut clause, &mut using_comments);
            self.push_kw(&mut clause, "using");
            for (i, source) in using.sources.iter_mut().enumerate() {
                if i > 0 {
                    clause.push(SqlToken::Comma);
                }
                clause.push(SqlToken::Space);
                self.source_expr(source, &mut clause);
            }
            self.comments_after(&mut clause, &mut using_comments);
            children.push(self.container(ContainerType::UsingClause, clause));
        }

        if let Some(where_clause) = &mut delete.where_clause {
            children.push(SqlToken::Space);
            self.where_clause(where_clause, &mut children);
        }
        if let Some(returning) = &mut delete.returning {
            children.push(SqlToken::Space);
            self.returning_clause(returning, &mut children);
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::DeleteQuery, children));
    }

    pub(crate) fn merge_query(&mut self, merge: &mut MergeQuery, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = merge.comments.take();
        self.comments_before(&mut children, &mut comments);

        if let Some(with) = &mut merge.with {
            self.with_clause(with, &mut children);
            children.push(SqlToken::Space);
        }

        self.push_kw(&mut children, "merge into");
        children.push(SqlToken::Space);
        self.source_expr(&mut merge.target, &mut children);
        self.push_sp_kw(&mut children, "using");
        children.push(SqlToken::Space);
        self.source_expr(&mut merge.source, &mut children);
        self.push_sp_kw(&mut children, "on");
        children.push(SqlToken::Space);
        self.value_expr(&mut merge.on, &mut children);

        for when in &mut merge.when_clauses {
            children.push(SqlToken::Space);
            self.merge_when(when, &mut children);
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::MergeQuery, children));
    }

    fn merge_when(&mut self, when: &mut MergeWhenClause, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = when.comments.take();
        self.comments_before(&mut children, &mut comments);

        self.push_kw(&mut children, when.kind.keywords());
        if let Some(condition) = &mut when.condition {
            self.push_sp_kw(&mut children, "and");
            children.push(SqlToken::Space);
            self.value_expr(condition, &mut children);
        }

        self.push_sp_kw(&mut children, "then");
        children.push(SqlToken::Space);
        self.comment_run_before(&mut children, &std::mem::take(&mut when.then_comments));

        match &mut when.action {
            MergeAction::UpdateSet(set) => {
                self.push_kw(&mut children, "update");
                children.push(SqlToken::Space);
                self.set_clause(set, &mut children);
            }
            MergeAction::Delete => self.push_kw(&mut children, "delete"),
            MergeAction::DoNothing => self.push_kw(&mut children, "do nothing"),
            MergeAction::Insert {
                columns,
                values,
                values_comments,
            } => {
                self.push_kw(&mut children, "insert");
                self.identifier_list_parens(columns, &mut children);
                match values {
                    Some(row) => {
                        children.push(SqlToken::Space);
                        self.comment_run_before(
                            &mut children,
                            &std::mem::take(values_comments),
                        );
                        self.push_kw(&mut children, "values");
                        children.push(SqlToken::Space);
                        children.push(SqlToken::Parenthesis(SmolStr::new("(")));
                        let mut items = std::mem::take(&mut row.items);
                        self.comma_separated(&mut items, &mut children);
                        row.items = items;
                        children.push(SqlToken::Parenthesis(SmolStr::new(")")));
                    }
                    None => self.push_sp_kw(&mut children, "default values"),
                }
            }
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::MergeWhenClause, children));
    }

    pub(crate) fn set_clause(&mut self, set: &mut SetClause, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = set.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.push_kw(&mut children, "set");

        for (i, item) in set.items.iter_mut().enumerate() {
            if i > 0 {
                children.push(SqlToken::Comma);
            }
            children.push(SqlToken::Space);
            let mut item_children = Vec::new();
            let mut item_comments = item.comments.take();
            self.comments_before(&mut item_children, &mut item_comments);
            for namespace in &item.column.namespaces {
                self.push_ident(&mut item_children, namespace);
                item_children.push(SqlToken::Dot);
            }
            self.push_ident(&mut item_children, &item.column.name);
            item_children.push(SqlToken::Space);
            item_children.push(SqlToken::Operator(SmolStr::new("=")));
            item_children.push(SqlToken::Space);
            self.value_expr(&mut item.value, &mut item_children);
            self.comments_after(&mut item_children, &mut item_comments);
            children.push(self.container(ContainerType::SetItem, item_children));
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::SetClause, children));
    }

    pub(crate) fn returning_clause(
        &mut self,
        returning: &mut ReturningClause,
        out: &mut Vec<SqlToken>,
    ) {
        let mut children = Vec::new();
        let mut comments = returning.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.push_kw(&mut children, "returning");
        for (i, item) in returning.items.iter_mut().enumerate() {
            if i > 0 {
                children.push(SqlToken::Comma);
            }
            children.push(SqlToken::Space);
            self.select_item(item, &mut children);
        }
        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::ReturningClause, children));
    }

    pub(crate) fn identifier_list_parens(
        &mut self,
        columns: &Option<Vec<IdentifierExpr>>,
        out: &mut Vec<SqlToken>,
    ) {
        if let Some(columns) = columns {
            out.push(SqlToken::Space);
            out.push(SqlToken::Parenthesis(SmolStr::new("(")));
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    out.push(SqlToken::Comma);
                    out.push(SqlToken::Space);
                }
                self.push_ident(out, &column.name);
            }
            out.push(SqlToken::Parenthesis(SmolStr::new(")")));
        }
    }
}
