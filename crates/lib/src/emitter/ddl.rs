//! DDL emission. Constraint naming follows the configured style:
//! postgres puts `constraint name` ahead of the kind, mysql inlines
//! the name after `primary key` / `unique key` / `foreign key`.

use smol_str::SmolStr;
use sqlforge_lib_core::ast::ddl::*;
use sqlforge_lib_core::ast::expr::IdentifierExpr;
use sqlforge_lib_core::ast::query::{NullsPosition, SortDirection};

use super::TokenEmitter;
use crate::config::ConstraintStyle;
use crate::tokens::{ContainerType, SqlToken};

impl TokenEmitter {
    pub(crate) fn create_table(
        &mut self,
        create: &mut CreateTableStatement,
        out: &mut Vec<SqlToken>,
    ) {
        let mut comments = create.comments.take();
        self.comments_before(out, &mut comments);

        self.push_kw(out, "create");
        if create.temporary {
            self.push_sp_kw(out, "temporary");
        }
        self.push_sp_kw(out, "table");
        if create.if_not_exists {
            self.push_sp_kw(out, "if not exists");
        }
        out.push(SqlToken::Space);
        self.qualified_name(&mut create.name, out);
        out.push(SqlToken::Space);
        out.push(SqlToken::Parenthesis(SmolStr::new("(")));

        let mut first = true;
        for column in &mut create.columns {
            if !first {
                out.push(SqlToken::Comma);
                out.push(SqlToken::Space);
            }
            first = false;
            let mut children = Vec::new();
            self.column_def(column, &mut children);
            out.push(self.container(ContainerType::ColumnDefinition, children));
        }
        for constraint in &mut create.constraints {
            if !first {
                out.push(SqlToken::Comma);
                out.push(SqlToken::Space);
            }
            first = false;
            let mut children = Vec::new();
            self.table_constraint(constraint, &mut children);
            out.push(self.container(ContainerType::TableConstraint, children));
        }

        out.push(SqlToken::Parenthesis(SmolStr::new(")")));
        self.comments_after(out, &mut comments);
    }

    fn column_def(&mut self, column: &mut ColumnDef, out: &mut Vec<SqlToken>) {
        let mut comments = column.comments.take();
        self.comments_before(out, &mut comments);
        self.push_ident(out, &column.name.name);
        out.push(SqlToken::Space);
        self.type_expr(&mut column.ty, out);

        for constraint in &mut column.constraints {
            out.push(SqlToken::Space);
            self.column_constraint(constraint, out);
        }
        self.comments_after(out, &mut comments);
    }

    fn column_constraint(&mut self, constraint: &mut ColumnConstraint, out: &mut Vec<SqlToken>) {
        if let Some(name) = &constraint.name {
            self.push_kw(out, "constraint");
            out.push(SqlToken::Space);
            self.push_ident(out, &name.name);
            out.push(SqlToken::Space);
        }
        match &mut constraint.kind {
            ColumnConstraintKind::NotNull => self.push_kw(out, "not null"),
            ColumnConstraintKind::Null => self.push_kw(out, "null"),
            ColumnConstraintKind::Default(expr) => {
                self.push_kw(out, "default");
                out.push(SqlToken::Space);
                self.value_expr(expr, out);
            }
            ColumnConstraintKind::PrimaryKey => self.push_kw(out, "primary key"),
            ColumnConstraintKind::Unique => self.push_kw(out, "unique"),
            ColumnConstraintKind::References(reference) => {
                self.push_kw(out, "references");
                out.push(SqlToken::Space);
                self.reference_def(reference, out);
            }
            ColumnConstraintKind::Check(expr) => {
                self.push_kw(out, "check");
                out.push(SqlToken::Space);
                out.push(SqlToken::Parenthesis(SmolStr::new("(")));
                self.value_expr(expr, out);
                out.push(SqlToken::Parenthesis(SmolStr::new(")")));
            }
        }
    }

    pub(crate) fn table_constraint(
        &mut self,
        constraint: &mut TableConstraint,
        out: &mut Vec<SqlToken>,
    ) {
        let style = self.config().constraint_style;
        let named_inline = matches!(style, ConstraintStyle::Mysql)
            && matches!(
                constraint.kind,
                TableConstraintKind::PrimaryKey(_)
                    | TableConstraintKind::Unique(_)
                    | TableConstraintKind::ForeignKey { .. }
            );

        if !named_inline && constraint.name.is_some() {
            let name = constraint.name.as_ref().expect("checked above").name.clone();
            self.push_kw(out, "constraint");
            out.push(SqlToken::Space);
            self.push_ident(out, &name);
            out.push(SqlToken::Space);
        }

        let inline_name = |emitter: &TokenEmitter,
                           out: &mut Vec<SqlToken>,
                           name: &Option<IdentifierExpr>| {
            if named_inline && let Some(name) = name {
                out.push(SqlToken::Space);
                out.push(emitter.ident_token(&name.name));
            }
        };

        match &mut constraint.kind {
            TableConstraintKind::PrimaryKey(columns) => {
                self.push_kw(out, "primary key");
                inline_name(self, out, &constraint.name);
                out.push(SqlToken::Space);
                self.paren_identifiers(columns, out);
            }
            TableConstraintKind::Unique(columns) => {
                if named_inline {
                    self.push_kw(out, "unique key");
                } else {
                    self.push_kw(out, "unique");
                }
                inline_name(self, out, &constraint.name);
                out.push(SqlToken::Space);
                self.paren_identifiers(columns, out);
            }
            TableConstraintKind::ForeignKey { columns, reference } => {
                self.push_kw(out, "foreign key");
                inline_name(self, out, &constraint.name);
                out.push(SqlToken::Space);
                self.paren_identifiers(columns, out);
                self.push_sp_kw(out, "references");
                out.push(SqlToken::Space);
                self.reference_def(reference, out);
            }
            TableConstraintKind::Check(expr) => {
                self.push_kw(out, "check");
                out.push(SqlToken::Space);
                out.push(SqlToken::Parenthesis(SmolStr::new("(")));
                self.value_expr(expr, out);
                out.push(SqlToken::Parenthesis(SmolStr::new(")")));
            }
        }
    }

    fn reference_def(&mut self, reference: &mut ReferenceDef, out: &mut Vec<SqlToken>) {
        self.qualified_name(&mut reference.table, out);
        if let Some(columns) = &mut reference.columns {
            out.push(SqlToken::Space);
            self.paren_identifiers(columns, out);
        }
        if let Some(action) = reference.on_delete {
            self.push_sp_kw(out, "on delete");
            self.push_sp_kw(out, action.keywords());
        }
        if let Some(action) = reference.on_update {
            self.push_sp_kw(out, "on update");
            self.push_sp_kw(out, action.keywords());
        }
    }

    fn paren_identifiers(&mut self, columns: &[IdentifierExpr], out: &mut Vec<SqlToken>) {
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

    pub(crate) fn create_index(
        &mut self,
        create: &mut CreateIndexStatement,
        out: &mut Vec<SqlToken>,
    ) {
        let mut comments = create.comments.take();
        self.comments_before(out, &mut comments);

        self.push_kw(out, "create");
        if create.unique {
            self.push_sp_kw(out, "unique");
        }
        self.push_sp_kw(out, "index");
        if create.concurrently {
            self.push_sp_kw(out, "concurrently");
        }
        if create.if_not_exists {
            self.push_sp_kw(out, "if not exists");
        }
        if let Some(name) = &mut create.name {
            out.push(SqlToken::Space);
            self.qualified_name(name, out);
        }
        self.push_sp_kw(out, "on");
        out.push(SqlToken::Space);
        self.qualified_name(&mut create.table, out);

        if let Some(method) = &create.using {
            self.push_sp_kw(out, "using");
            out.push(SqlToken::Space);
            out.push(SqlToken::Value(method.clone()));
        }

        out.push(SqlToken::Space);
        out.push(SqlToken::Parenthesis(SmolStr::new("(")));
        for (i, column) in create.columns.iter_mut().enumerate() {
            if i > 0 {
                out.push(SqlToken::Comma);
                out.push(SqlToken::Space);
            }
            self.value_expr(&mut column.expr, out);
            match column.direction {
                Some(SortDirection::Asc) => self.push_sp_kw(out, "asc"),
                Some(SortDirection::Desc) => self.push_sp_kw(out, "desc"),
                None => {}
            }
            match column.nulls {
                Some(NullsPosition::First) => self.push_sp_kw(out, "nulls first"),
                Some(NullsPosition::Last) => self.push_sp_kw(out, "nulls last"),
                None => {}
            }
        }
        out.push(SqlToken::Parenthesis(SmolStr::new(")")));

        if !create.include.is_empty() {
            self.push_sp_kw(out, "include");
            out.push(SqlToken::Space);
            let include = create.include.clone();
            self.paren_identifiers(&include, out);
        }
        if !create.with_options.is_empty() {
            self.push_sp_kw(out, "with");
            out.push(SqlToken::Space);
            out.push(SqlToken::Parenthesis(SmolStr::new("(")));
            let mut options = std::mem::take(&mut create.with_options);
            self.comma_separated(&mut options, out);
            create.with_options = options;
            out.push(SqlToken::Parenthesis(SmolStr::new(")")));
        }
        if let Some(tablespace) = &create.tablespace {
            self.push_sp_kw(out, "tablespace");
            out.push(SqlToken::Space);
            out.push(self.ident_token(&tablespace.name));
        }
        if let Some(where_clause) = &mut create.where_clause {
            out.push(SqlToken::Space);
            self.where_clause(where_clause, out);
        }

        self.comments_after(out, &mut comments);
    }

    pub(crate) fn create_schema(
        &mut self,
        create: &mut CreateSchemaStatement,
        out: &mut Vec<SqlToken>,
    ) {
        let mut comments = create.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "create schema");
        if create.if_not_exists {
            self.push_sp_kw(out, "if not exists");
        }
        out.push(SqlToken::Space);
        self.qualified_name(&mut create.name, out);
        self.comments_after(out, &mut comments);
    }

    pub(crate) fn create_sequence(
        &mut self,
        create: &mut CreateSequenceStatement,
        out: &mut Vec<SqlToken>,
    ) {
        let mut comments = create.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "create sequence");
        if create.if_not_exists {
            self.push_sp_kw(out, "if not exists");
        }
        out.push(SqlToken::Space);
        self.qualified_name(&mut create.name, out);
        self.sequence_options(&mut create.options, out);
        self.comments_after(out, &mut comments);
    }

    pub(crate) fn alter_sequence(
        &mut self,
        alter: &mut AlterSequenceStatement,
        out: &mut Vec<SqlToken>,
    ) {
        let mut comments = alter.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "alter sequence");
        if alter.if_exists {
            self.push_sp_kw(out, "if exists");
        }
        out.push(SqlToken::Space);
        self.qualified_name(&mut alter.name, out);
        self.sequence_options(&mut alter.options, out);
        self.comments_after(out, &mut comments);
    }

    fn sequence_options(&mut self, options: &mut [SequenceOption], out: &mut Vec<SqlToken>) {
        let mut children = Vec::new();
        for option in options {
            children.push(SqlToken::Space);
            match option {
                SequenceOption::IncrementBy(value) => {
                    self.push_kw(&mut children, "increment by");
                    children.push(SqlToken::Space);
                    self.value_expr(value, &mut children);
                }
                SequenceOption::StartWith(value) => {
                    self.push_kw(&mut children, "start with");
                    children.push(SqlToken::Space);
                    self.value_expr(value, &mut children);
                }
                SequenceOption::MinValue(value) => {
                    self.push_kw(&mut children, "minvalue");
                    children.push(SqlToken::Space);
                    self.value_expr(value, &mut children);
                }
                SequenceOption::NoMinValue => self.push_kw(&mut children, "no minvalue"),
                SequenceOption::MaxValue(value) => {
                    self.push_kw(&mut children, "maxvalue");
                    children.push(SqlToken::Space);
                    self.value_expr(value, &mut children);
                }
                SequenceOption::NoMaxValue => self.push_kw(&mut children, "no maxvalue"),
                SequenceOption::Cache(value) => {
                    self.push_kw(&mut children, "cache");
                    children.push(SqlToken::Space);
                    self.value_expr(value, &mut children);
                }
                SequenceOption::Cycle => self.push_kw(&mut children, "cycle"),
                SequenceOption::NoCycle => self.push_kw(&mut children, "no cycle"),
                SequenceOption::Restart(value) => {
                    self.push_kw(&mut children, "restart");
                    if let Some(value) = value {
                        self.push_sp_kw(&mut children, "with");
                        children.push(SqlToken::Space);
                        self.value_expr(value, &mut children);
                    }
                }
                SequenceOption::OwnedBy(column) => {
                    self.push_kw(&mut children, "owned by");
                    children.push(SqlToken::Space);
                    match column {
                        Some(column) => {
                            for namespace in &column.namespaces {
                                children.push(self.ident_token(namespace));
                                children.push(SqlToken::Dot);
                            }
                            children.push(self.ident_token(&column.name));
                        }
                        None => self.push_kw(&mut children, "none"),
                    }
                }
            }
        }
        out.push(self.container(ContainerType::SequenceOptionList, children));
    }

    pub(crate) fn alter_table(&mut self, alter: &mut AlterTableStatement, out: &mut Vec<SqlToken>) {
        let mut comments = alter.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "alter table");
        if alter.if_exists {
            self.push_sp_kw(out, "if exists");
        }
        if alter.only {
            self.push_sp_kw(out, "only");
        }
        out.push(SqlToken::Space);
        self.qualified_name(&mut alter.name, out);

        for (i, action) in alter.actions.iter_mut().enumerate() {
            if i > 0 {
                out.push(SqlToken::Comma);
            }
            out.push(SqlToken::Space);
            self.alter_table_action(action, out);
        }
        self.comments_after(out, &mut comments);
    }

    fn alter_table_action(&mut self, action: &mut AlterTableAction, out: &mut Vec<SqlToken>) {
        match action {
            AlterTableAction::AddConstraint(constraint) => {
                self.push_kw(out, "add");
                out.push(SqlToken::Space);
                self.table_constraint(constraint, out);
            }
            AlterTableAction::DropConstraint {
                if_exists,
                name,
                behavior,
            } => {
                self.push_kw(out, "drop constraint");
                if *if_exists {
                    self.push_sp_kw(out, "if exists");
                }
                out.push(SqlToken::Space);
                out.push(self.ident_token(&name.name));
                self.drop_behavior(*behavior, out);
            }
            AlterTableAction::DropColumn {
                if_exists,
                name,
                behavior,
            } => {
                self.push_kw(out, "drop column");
                if *if_exists {
                    self.push_sp_kw(out, "if exists");
                }
                out.push(SqlToken::Space);
                out.push(self.ident_token(&name.name));
                self.drop_behavior(*behavior, out);
            }
            AlterTableAction::AddColumn { if_not_exists, def } => {
                self.push_kw(out, "add column");
                if *if_not_exists {
                    self.push_sp_kw(out, "if not exists");
                }
                out.push(SqlToken::Space);
                self.column_def(def, out);
            }
            AlterTableAction::AlterColumnDefault { column, default } => {
                self.push_kw(out, "alter column");
                out.push(SqlToken::Space);
                out.push(self.ident_token(&column.name));
                match default {
                    Some(default) => {
                        self.push_sp_kw(out, "set default");
                        out.push(SqlToken::Space);
                        self.value_expr(default, out);
                    }
                    None => self.push_sp_kw(out, "drop default"),
                }
            }
        }
    }

    pub(crate) fn drop_table(&mut self, drop: &mut DropTableStatement, out: &mut Vec<SqlToken>) {
        let mut comments = drop.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "drop table");
        if drop.if_exists {
            self.push_sp_kw(out, "if exists");
        }
        self.name_list(&mut drop.names, out);
        self.drop_behavior(drop.behavior, out);
        self.comments_after(out, &mut comments);
    }

    pub(crate) fn drop_index(&mut self, drop: &mut DropIndexStatement, out: &mut Vec<SqlToken>) {
        let mut comments = drop.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "drop index");
        if drop.concurrently {
            self.push_sp_kw(out, "concurrently");
        }
        if drop.if_exists {
            self.push_sp_kw(out, "if exists");
        }
        self.name_list(&mut drop.names, out);
        self.drop_behavior(drop.behavior, out);
        self.comments_after(out, &mut comments);
    }

    pub(crate) fn drop_schema(&mut self, drop: &mut DropSchemaStatement, out: &mut Vec<SqlToken>) {
        let mut comments = drop.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "drop schema");
        if drop.if_exists {
            self.push_sp_kw(out, "if exists");
        }
        self.name_list(&mut drop.names, out);
        self.drop_behavior(drop.behavior, out);
        self.comments_after(out, &mut comments);
    }

    fn name_list(
        &mut self,
        names: &mut [sqlforge_lib_core::ast::expr::QualifiedName],
        out: &mut Vec<SqlToken>,
    ) {
        for (i, name) in names.iter_mut().enumerate() {
            if i > 0 {
                out.push(SqlToken::Comma);
            }
            out.push(SqlToken::Space);
            self.qualified_name(name, out);
        }
    }

    fn drop_behavior(&mut self, behavior: Option<DropBehavior>, out: &mut Vec<SqlToken>) {
        match behavior {
            Some(DropBehavior::Cascade) => self.push_sp_kw(out, "cascade"),
            Some(DropBehavior::Restrict) => self.push_sp_kw(out, "restrict"),
            None => {}
        }
    }

    pub(crate) fn explain(&mut self, explain: &mut ExplainStatement, out: &mut Vec<SqlToken>) {
        let mut comments = explain.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "explain");

        if !explain.options.is_empty() {
            out.push(SqlToken::Space);
            out.push(SqlToken::Parenthesis(SmolStr::new("(")));
            for (i, (name, value)) in explain.options.iter().enumerate() {
                if i > 0 {
                    out.push(SqlToken::Comma);
                    out.push(SqlToken::Space);
                }
                out.push(SqlToken::Value(name.clone()));
                if let Some(value) = value {
                    out.push(SqlToken::Space);
                    out.push(SqlToken::Value(value.clone()));
                }
            }
            out.push(SqlToken::Parenthesis(SmolStr::new(")")));
        }

        out.push(SqlToken::Space);
        self.statement(&mut explain.statement, out);
        self.comments_after(out, &mut comments);
    }

    pub(crate) fn analyze(&mut self, analyze: &mut AnalyzeStatement, out: &mut Vec<SqlToken>) {
        let mut comments = analyze.comments.take();
        self.comments_before(out, &mut comments);
        self.push_kw(out, "analyze");
        if analyze.verbose {
            self.push_sp_kw(out, "verbose");
        }
        if let Some(target) = &mut analyze.target {
            out.push(SqlToken::Space);
            self.qualified_name(target, out);
        }
        if !analyze.columns.is_empty() {
            out.push(SqlToken::Space);
            let columns = analyze.columns.clone();
            self.paren_identifiers(&columns, out);
        }
        self.comments_after(out, &mut comments);
    }
}
