use smol_str::SmolStr;

use crate::ast::comments::Comments;
use crate::ast::expr::{ColumnRef, IdentifierExpr, QualifiedName, TypeExpr, ValueExpr};
use crate::ast::query::{NullsPosition, SortDirection, WhereClause};
use crate::ast::Statement;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub temporary: bool,
    pub if_not_exists: bool,
    pub name: QualifiedName,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: IdentifierExpr,
    pub ty: TypeExpr,
    pub constraints: Vec<ColumnConstraint>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConstraint {
    pub name: Option<IdentifierExpr>,
    pub kind: ColumnConstraintKind,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraintKind {
    NotNull,
    Null,
    Default(ValueExpr),
    PrimaryKey,
    Unique,
    References(ReferenceDef),
    Check(ValueExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableConstraint {
    pub name: Option<IdentifierExpr>,
    pub kind: TableConstraintKind,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraintKind {
    PrimaryKey(Vec<IdentifierExpr>),
    Unique(Vec<IdentifierExpr>),
    ForeignKey {
        columns: Vec<IdentifierExpr>,
        reference: ReferenceDef,
    },
    Check(ValueExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDef {
    pub table: QualifiedName,
    pub columns: Option<Vec<IdentifierExpr>>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn keywords(self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "no action",
            ReferentialAction::Restrict => "restrict",
            ReferentialAction::Cascade => "cascade",
            ReferentialAction::SetNull => "set null",
            ReferentialAction::SetDefault => "set default",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    pub unique: bool,
    pub concurrently: bool,
    pub if_not_exists: bool,
    pub name: Option<QualifiedName>,
    pub table: QualifiedName,
    /// Access method after USING (btree, gin, ...).
    pub using: Option<SmolStr>,
    pub columns: Vec<IndexColumn>,
    pub include: Vec<IdentifierExpr>,
    pub with_options: Vec<ValueExpr>,
    pub tablespace: Option<IdentifierExpr>,
    pub where_clause: Option<WhereClause>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexColumn {
    pub expr: ValueExpr,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsPosition>,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropBehavior {
    Cascade,
    Restrict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    pub if_exists: bool,
    pub names: Vec<QualifiedName>,
    pub behavior: Option<DropBehavior>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropIndexStatement {
    pub concurrently: bool,
    pub if_exists: bool,
    pub names: Vec<QualifiedName>,
    pub behavior: Option<DropBehavior>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropSchemaStatement {
    pub if_exists: bool,
    pub names: Vec<QualifiedName>,
    pub behavior: Option<DropBehavior>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSchemaStatement {
    pub if_not_exists: bool,
    pub name: QualifiedName,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    pub if_exists: bool,
    pub only: bool,
    pub name: QualifiedName,
    pub actions: Vec<AlterTableAction>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    AddConstraint(TableConstraint),
    DropConstraint {
        if_exists: bool,
        name: IdentifierExpr,
        behavior: Option<DropBehavior>,
    },
    DropColumn {
        if_exists: bool,
        name: IdentifierExpr,
        behavior: Option<DropBehavior>,
    },
    AddColumn {
        if_not_exists: bool,
        def: ColumnDef,
    },
    /// `alter column c set default e` / `alter column c drop default`.
    AlterColumnDefault {
        column: IdentifierExpr,
        default: Option<ValueExpr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplainStatement {
    /// `(analyze, verbose, format json)`-style options, each a name
    /// with an optional bare value.
    pub options: Vec<(SmolStr, Option<SmolStr>)>,
    pub statement: Box<Statement>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeStatement {
    pub verbose: bool,
    pub target: Option<QualifiedName>,
    pub columns: Vec<IdentifierExpr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSequenceStatement {
    pub if_not_exists: bool,
    pub name: QualifiedName,
    pub options: Vec<SequenceOption>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterSequenceStatement {
    pub if_exists: bool,
    pub name: QualifiedName,
    pub options: Vec<SequenceOption>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOption {
    IncrementBy(ValueExpr),
    StartWith(ValueExpr),
    MinValue(ValueExpr),
    NoMinValue,
    MaxValue(ValueExpr),
    NoMaxValue,
    Cache(ValueExpr),
    Cycle,
    NoCycle,
    Restart(Option<ValueExpr>),
    /// `owned by t.c`; `None` is `owned by none`.
    OwnedBy(Option<ColumnRef>),
}
