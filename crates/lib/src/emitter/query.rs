//! Query emission: the clause ladder, WITH, sources and joins, set
//! operations and VALUES bodies.

use smol_str::SmolStr;
use sqlforge_lib_core::ast::Statement;
use sqlforge_lib_core::ast::expr::TupleExpr;
use sqlforge_lib_core::ast::query::*;

use super::TokenEmitter;
use crate::tokens::{ContainerType, SqlToken};

impl TokenEmitter {
    pub(crate) fn statement(&mut self, statement: &mut Statement, out: &mut Vec<SqlToken>) {
        self.header_comments(statement, out);
        match statement {
            Statement::Query(query) => self.query(query, out),
            Statement::Insert(insert) => self.insert_query(insert, out),
            Statement::Update(update) => self.update_query(update, out),
            Statement::Delete(delete) => self.delete_query(delete, out),
            Statement::Merge(merge) => self.merge_query(merge, out),
            Statement::CreateTable(create) => self.create_table(create, out),
            Statement::CreateIndex(create) => self.create_index(create, out),
            Statement::CreateSchema(create) => self.create_schema(create, out),
            Statement::CreateSequence(create) => self.create_sequence(create, out),
            Statement::AlterSequence(alter) => self.alter_sequence(alter, out),
            Statement::AlterTable(alter) => self.alter_table(alter, out),
            Statement::DropTable(drop) => self.drop_table(drop, out),
            Statement::DropIndex(drop) => self.drop_index(drop, out),
            Statement::DropSchema(drop) => self.drop_schema(drop, out),
            Statement::Explain(explain) => self.explain(explain, out),
            Statement::Analyze(analyze) => self.analyze(analyze, out),
        }
    }

    /// Header comments render before everything else. A run that mixes
    /// separator lines (`---`, `===`) with text merges into a single
    /// block with one item per line; otherwise each line is its own
    /// block.
    fn header_comments(&mut self, statement: &mut Statement, out: &mut Vec<SqlToken>) {
        let header: Vec<SmolStr> = match statement {
            Statement::Query(Query::Select(select)) => std::mem::take(&mut select.header_comments),
            Statement::Insert(insert) => std::mem::take(&mut insert.header_comments),
            Statement::Update(update) => std::mem::take(&mut update.header_comments),
            Statement::Delete(delete) => std::mem::take(&mut delete.header_comments),
            Statement::Merge(merge) => std::mem::take(&mut merge.header_comments),
            _ => Vec::new(),
        };
        if header.is_empty() {
            return;
        }

        let has_separator = header
            .iter()
            .any(|line| is_separator_line(line));

        if has_separator && header.len() > 1 {
            if let Some(token) = self.multiline_comment_token(&header) {
                out.push(token);
                out.push(SqlToken::CommentNewline);
            }
        } else {
            for line in &header {
                if let Some(token) = self.comment_token(line) {
                    out.push(token);
                    out.push(SqlToken::CommentNewline);
                }
            }
        }
    }

    pub(crate) fn query(&mut self, query: &mut Query, out: &mut Vec<SqlToken>) {
        match query {
            Query::Select(select) => self.simple_select(select, out),
            Query::Binary(binary) => self.binary_select(binary, out),
            Query::Values(values) => self.values_query(values, out),
        }
    }

    fn binary_select(&mut self, binary: &mut BinarySelect, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = binary.comments.take();
        self.comments_before(&mut children, &mut comments);

        self.query(&mut binary.left, &mut children);
        let op = self
            .container(
                ContainerType::SetOperator,
                vec![self.kw(binary.op.keywords())],
            );
        children.push(SqlToken::Space);
        children.push(op);
        children.push(SqlToken::Space);
        self.query(&mut binary.right, &mut children);

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::BinarySelectQuery, children));
    }

    /// VALUES bodies stay inline unless a row element carries leading
    /// comments, in which case every row breaks onto its own line.
    fn values_query(&mut self, values: &mut ValuesQuery, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = values.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.push_kw(&mut children, "values");

        let multiline = values.rows.iter().any(|row| {
            row.items
                .iter()
                .any(|item| item.comments().before().next().is_some())
        });

        for (i, row) in values.rows.iter_mut().enumerate() {
            if i > 0 {
                children.push(SqlToken::Comma);
                if !multiline {
                    children.push(SqlToken::Space);
                }
            } else if !multiline {
                children.push(SqlToken::Space);
            }

            let mut row_tokens = Vec::new();
            self.values_row(row, &mut row_tokens);
            if multiline {
                children.push(self.container(ContainerType::ValuesRow, row_tokens));
            } else {
                children.extend(row_tokens);
            }
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::ValuesQuery, children));
    }

    fn values_row(&mut self, row: &mut TupleExpr, out: &mut Vec<SqlToken>) {
        let mut comments = row.comments.take();
        self.comments_before(out, &mut comments);
        out.push(SqlToken::Parenthesis(SmolStr::new("(")));
        let mut items = std::mem::take(&mut row.items);
        self.comma_separated(&mut items, out);
        row.items = items;
        out.push(SqlToken::Parenthesis(SmolStr::new(")")));
        self.comments_after(out, &mut comments);
    }

    pub(crate) fn simple_select(&mut self, select: &mut SimpleSelect, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();

        // Headers survive on selects nested under a set operation; the
        // statement root drained its own before getting here.
        for line in std::mem::take(&mut select.header_comments) {
            if let Some(token) = self.comment_token(&line) {
                children.push(token);
                children.push(SqlToken::CommentNewline);
            }
        }

        // SimpleSelectQuery consumes its own comment list on emission.
        let mut comments = select.comments.take();
        self.comments_before(&mut children, &mut comments);

        if let Some(with) = &mut select.with {
            self.with_clause(with, &mut children);
            children.push(SqlToken::Space);
        }

        self.select_clause(&mut select.select, &mut children);

        if let Some(from) = &mut select.from {
            children.push(SqlToken::Space);
            self.from_clause(from, &mut children);
        }
        if let Some(where_clause) = &mut select.where_clause {
            children.push(SqlToken::Space);
            self.where_clause(where_clause, &mut children);
        }
        if let Some(group_by) = &mut select.group_by {
            children.push(SqlToken::Space);
            let mut clause = Vec::new();
            let mut comments = group_by.comments.take();
            self.comments_before(&mut clause, &mut comments);
            self.push_kw(&mut clause, "group by");
            clause.push(SqlToken::Space);
            let mut items = std::mem::take(&mut group_by.items);
            self.comma_separated(&mut items, &mut clause);
            group_by.items = items;
            self.comments_after(&mut clause, &mut comments);
            children.push(self.container(ContainerType::GroupByClause, clause));
        }
        if let Some(having) = &mut select.having {
            children.push(SqlToken::Space);
            let mut clause = Vec::new();
            let mut comments = having.comments.take();
            self.comments_before(&mut clause, &mut comments);
            self.push_kw(&mut clause, "having");
            clause.push(SqlToken::Space);
            self.value_expr(&mut having.condition, &mut clause);
            self.comments_after(&mut clause, &mut comments);
            children.push(self.container(ContainerType::HavingClause, clause));
        }
        if let Some(window) = &mut select.window {
            children.push(SqlToken::Space);
            let mut clause = Vec::new();
            self.push_kw(&mut clause, "window");
            for (i, def) in window.windows.iter_mut().enumerate() {
                if i > 0 {
                    clause.push(SqlToken::Comma);
                }
                clause.push(SqlToken::Space);
                self.push_ident(&mut clause, &def.name.name);
                self.push_sp_kw(&mut clause, "as");
                clause.push(SqlToken::Space);
                clause.push(SqlToken::Parenthesis(SmolStr::new("(")));
                self.window_spec(&mut def.spec, &mut clause);
                clause.push(SqlToken::Parenthesis(SmolStr::new(")")));
            }
            children.push(self.container(ContainerType::WindowClause, clause));
        }
        if let Some(order_by) = &mut select.order_by {
            children.push(SqlToken::Space);
            self.order_by_clause(order_by, &mut children);
        }
        if let Some(limit) = &mut select.limit {
            children.push(SqlToken::Space);
            let mut clause = Vec::new();
            let mut comments = limit.comments.take();
            self.comments_before(&mut clause, &mut comments);
            self.push_kw(&mut clause, "limit");
            clause.push(SqlToken::Space);
            self.value_expr(&mut limit.value, &mut clause);
            self.comments_after(&mut clause, &mut comments);
            children.push(self.container(ContainerType::LimitClause, clause));
        }
        if let Some(offset) = &mut select.offset {
            children.push(SqlToken::Space);
            let mut clause = Vec::new();
            let mut comments = offset.comments.take();
            self.comments_before(&mut clause, &mut comments);
            self.push_kw(&mut clause, "offset");
            clause.push(SqlToken::Space);
            self.value_expr(&mut offset.value, &mut clause);
            self.comments_after(&mut clause, &mut comments);
            children.push(self.container(ContainerType::OffsetClause, clause));
        }
        if let Some(fetch) = &mut select.fetch {
            children.push(SqlToken::Space);
            self.fetch_clause(fetch, &mut children);
        }
        if let Some(locking) = &mut select.locking {
            children.push(SqlToken::Space);
            let mut clause = Vec::new();
            self.push_kw(&mut clause, "for");
            self.push_sp_kw(&mut clause, locking.lock.keywords());
            children.push(self.container(ContainerType::ForClause, clause));
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::SimpleSelectQuery, children));
    }

    pub(crate) fn with_clause(&mut self, with: &mut WithClause, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = with.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.push_kw(&mut children, "with");
        if with.recursive {
            self.push_sp_kw(&mut children, "recursive");
        }
        children.push(SqlToken::Space);

        for (i, table) in with.tables.iter_mut().enumerate() {
            if i > 0 {
                children.push(SqlToken::Comma);
                children.push(SqlToken::Space);
            }
            self.common_table(table, &mut children);
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::WithClause, children));
    }

    fn common_table(&mut self, table: &mut CommonTable, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = table.comments.take();
        self.comments_before(&mut children, &mut comments);

        self.push_ident(&mut children, &table.name.name);
        if let Some(columns) = &table.columns {
            children.push(SqlToken::Parenthesis(SmolStr::new("(")));
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    children.push(SqlToken::Comma);
                    children.push(SqlToken::Space);
                }
                self.push_ident(&mut children, &column.name);
            }
            children.push(SqlToken::Parenthesis(SmolStr::new(")")));
        }

        children.push(SqlToken::Space);
        self.comment_run_before(&mut children, &std::mem::take(&mut table.as_comments));
        self.push_kw(&mut children, "as");
        match table.materialized {
            Some(Materialized::Materialized) => self.push_sp_kw(&mut children, "materialized"),
            Some(Materialized::NotMaterialized) => {
                self.push_sp_kw(&mut children, "not materialized")
            }
            None => {}
        }
        children.push(SqlToken::Space);

        let mut body = vec![SqlToken::Parenthesis(SmolStr::new("("))];
        self.query(&mut table.query, &mut body);
        body.push(SqlToken::Parenthesis(SmolStr::new(")")));
        children.push(self.container(ContainerType::InlineQuery, body));

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::CommonTable, children));
    }

    fn select_clause(&mut self, clause: &mut SelectClause, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        // SelectClause consumes its comment list on emission. Clause
        // commentary sits after the keyword, which is also where a
        // reparse of the output re-attaches it.
        let mut comments = clause.comments.take();

        self.push_kw(&mut children, "select");
        for text in comments.before().cloned().collect::<Vec<_>>() {
            if let Some(token) = self.comment_token(&text) {
                children.push(SqlToken::Space);
                children.push(token);
            }
        }

        for hint in &clause.hints {
            if self.config().export_comment {
                children.push(SqlToken::Space);
                children.push(SqlToken::Comment(SmolStr::new(format!(
                    "/*+ {} */",
                    super::sanitize_comment(&hint.text)
                ))));
            }
        }

        match &mut clause.distinct {
            Some(Distinct::Distinct) => self.push_sp_kw(&mut children, "distinct"),
            Some(Distinct::DistinctOn(exprs)) => {
                self.push_sp_kw(&mut children, "distinct on");
                children.push(SqlToken::Space);
                let mut on = vec![SqlToken::Parenthesis(SmolStr::new("("))];
                self.comma_separated(exprs, &mut on);
                on.push(SqlToken::Parenthesis(SmolStr::new(")")));
                children.push(self.container(ContainerType::DistinctOn, on));
            }
            None => {}
        }

        for (i, item) in clause.items.iter_mut().enumerate() {
            if i > 0 {
                children.push(SqlToken::Comma);
            }
            children.push(SqlToken::Space);
            self.select_item(item, &mut children);
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::SelectClause, children));
    }

    pub(crate) fn select_item(&mut self, item: &mut SelectItem, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = item.comments.take();
        self.comments_before(&mut children, &mut comments);

        self.value_expr(&mut item.expr, &mut children);

        if let Some(alias) = &item.alias {
            children.push(SqlToken::Space);
            self.comment_run_before(&mut children, &std::mem::take(&mut item.as_comments));
            self.push_kw(&mut children, "as");
            children.push(SqlToken::Space);
            self.push_ident(&mut children, &alias.name);
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::SelectItem, children));
    }

    pub(crate) fn from_clause(&mut self, from: &mut FromClause, out: &mut Vec<SqlToken>) {
        let normalize = self.config().join_condition_order_by_declaration;
        if normalize {
            self.push_join_context(from);
        }

        let mut children = Vec::new();
        let mut comments = from.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.push_kw(&mut children, "from");
        children.push(SqlToken::Space);
        self.source_expr(&mut from.source, &mut children);

        for join in &mut from.joins {
            children.push(SqlToken::Space);
            self.join_clause(join, &mut children);
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::FromClause, children));

        // The context is strictly nested; pop on the way out.
        if normalize {
            self.pop_join_context();
        }
    }

    fn join_clause(&mut self, join: &mut JoinClause, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = join.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.comment_run_before(&mut children, &std::mem::take(&mut join.join_comments));

        self.push_kw(&mut children, join.kind.keywords());
        if join.lateral {
            self.push_sp_kw(&mut children, "lateral");
        }
        children.push(SqlToken::Space);
        self.source_expr(&mut join.source, &mut children);

        match &mut join.condition {
            Some(JoinCondition::On(condition)) => {
                self.push_sp_kw(&mut children, "on");
                children.push(SqlToken::Space);
                let mut condition = condition.clone();
                self.normalize_join_condition(&mut condition);
                self.value_expr(&mut condition, &mut children);
            }
            Some(JoinCondition::Using(columns)) => {
                self.push_sp_kw(&mut children, "using");
                children.push(SqlToken::Space);
                children.push(SqlToken::Parenthesis(SmolStr::new("(")));
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        children.push(SqlToken::Comma);
                        children.push(SqlToken::Space);
                    }
                    self.push_ident(&mut children, &column.name);
                }
                children.push(SqlToken::Parenthesis(SmolStr::new(")")));
            }
            None => {}
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::JoinClause, children));
    }

    pub(crate) fn source_expr(&mut self, source: &mut SourceExpr, out: &mut Vec<SqlToken>) {
        let mut comments = source.comments.take();
        self.comments_before(out, &mut comments);

        match &mut source.kind {
            SourceKind::Table(name) => self.qualified_name(name, out),
            SourceKind::SubQuery(query) => {
                let mut children = vec![SqlToken::Parenthesis(SmolStr::new("("))];
                self.query(query, &mut children);
                children.push(SqlToken::Parenthesis(SmolStr::new(")")));
                out.push(self.container(ContainerType::SubQuerySource, children));
            }
            SourceKind::Function(call) => self.function_call(call, out),
        }

        if let Some(alias) = &mut source.alias {
            out.push(SqlToken::Space);
            self.source_alias(alias, out);
        }

        self.comments_after(out, &mut comments);
    }

    fn source_alias(&mut self, alias: &mut SourceAlias, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        // SourceAliasExpression consumes its comment list on emission.
        let mut comments = alias.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.comment_run_before(&mut children, &std::mem::take(&mut alias.as_comments));

        self.push_kw(&mut children, "as");
        children.push(SqlToken::Space);
        self.push_ident(&mut children, &alias.name.name);

        if let Some(columns) = &alias.columns {
            children.push(SqlToken::Parenthesis(SmolStr::new("(")));
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    children.push(SqlToken::Comma);
                    children.push(SqlToken::Space);
                }
                self.push_ident(&mut children, &column.name);
            }
            children.push(SqlToken::Parenthesis(SmolStr::new(")")));
        }

        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::SourceAliasExpression, children));
    }

    pub(crate) fn where_clause(&mut self, clause: &mut WhereClause, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        // WhereClause consumes its comment list on emission.
        let mut comments = clause.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.push_kw(&mut children, "where");
        children.push(SqlToken::Space);
        self.value_expr(&mut clause.condition, &mut children);
        self.comments_after(&mut children, &mut comments);
        out.push(self.container(ContainerType::WhereClause, children));
    }

    fn order_by_clause(&mut self, order_by: &mut OrderByClause, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        let mut comments = order_by.comments.take();
        self.comments_before(&mut children, &mut comments);
        self.order_by_inline(order_by, &mut children);
        self.comments_after(&mut children, &mut comments);
        // order_by_inline emitted its own clause container content.
        out.extend(children);
    }

    /// ORDER BY without clause-container framing, reused by window
    /// specifications and aggregate internals.
    pub(crate) fn order_by_inline(&mut self, order_by: &mut OrderByClause, out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        self.push_kw(&mut children, "order by");
        for (i, item) in order_by.items.iter_mut().enumerate() {
            if i > 0 {
                children.push(SqlToken::Comma);
            }
            children.push(SqlToken::Space);
            let mut item_children = Vec::new();
            let mut comments = item.comments.take();
            self.comments_before(&mut item_children, &mut comments);
            self.value_expr(&mut item.value, &mut item_children);
            match item.direction {
                Some(SortDirection::Asc) => self.push_sp_kw(&mut item_children, "asc"),
                Some(SortDirection::Desc) => self.push_sp_kw(&mut item_children, "desc"),
                None => {}
            }
            match item.nulls {
                Some(NullsPosition::First) => self.push_sp_kw(&mut item_children, "nulls first"),
                Some(NullsPosition::Last) => self.push_sp_kw(&mut item_children, "nulls last"),
                None => {}
            }
            self.comments_after(&mut item_children, &mut comments);
            children.push(self.container(ContainerType::OrderByItem, item_children));
        }
        out.push(self.container(ContainerType::OrderByClause, children));
    }

    fn fetch_clause(&mut self, fetch: &mut FetchClause, out: &mut Vec<SqlToken>) {
        let mut clause = Vec::new();
        self.push_kw(&mut clause, "fetch");
        match fetch.first {
            FetchFirst::First => self.push_sp_kw(&mut clause, "first"),
            FetchFirst::Next => self.push_sp_kw(&mut clause, "next"),
        }
        if let Some(count) = &mut fetch.count {
            clause.push(SqlToken::Space);
            self.value_expr(count, &mut clause);
        }
        match fetch.unit {
            FetchUnit::Rows => self.push_sp_kw(&mut clause, "rows"),
            FetchUnit::Row => self.push_sp_kw(&mut clause, "row"),
        }
        match fetch.ties {
            FetchTies::Only => self.push_sp_kw(&mut clause, "only"),
            FetchTies::WithTies => self.push_sp_kw(&mut clause, "with ties"),
        }
        out.push(self.container(ContainerType::FetchClause, clause));
    }
}

fn is_separator_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3
        && trimmed
            .chars()
            .all(|c| matches!(c, '-' | '=' | '*' | '#'))
}
