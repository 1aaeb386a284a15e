use smol_str::SmolStr;

use crate::ast::comments::Comments;
use crate::ast::expr::{ColumnRef, IdentifierExpr, QualifiedName, TupleExpr, ValueExpr};
use crate::ast::query::{FromClause, Query, SelectItem, SourceExpr, WhereClause, WithClause};

#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    pub with: Option<WithClause>,
    pub target: QualifiedName,
    pub columns: Option<Vec<IdentifierExpr>>,
    pub source: InsertSource,
    pub returning: Option<ReturningClause>,
    pub header_comments: Vec<SmolStr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// `insert into t select ...` or `insert into t values ...`.
    Query(Query),
    DefaultValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub with: Option<WithClause>,
    pub target: SourceExpr,
    pub set: SetClause,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub returning: Option<ReturningClause>,
    pub header_comments: Vec<SmolStr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetClause {
    pub items: Vec<SetItem>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetItem {
    pub column: ColumnRef,
    pub value: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub with: Option<WithClause>,
    pub target: SourceExpr,
    pub using: Option<UsingClause>,
    pub where_clause: Option<WhereClause>,
    pub returning: Option<ReturningClause>,
    pub header_comments: Vec<SmolStr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsingClause {
    pub sources: Vec<SourceExpr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeQuery {
    pub with: Option<WithClause>,
    pub target: SourceExpr,
    pub source: SourceExpr,
    pub on: ValueExpr,
    pub when_clauses: Vec<MergeWhenClause>,
    pub header_comments: Vec<SmolStr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMatchKind {
    Matched,
    NotMatched,
    NotMatchedBySource,
    NotMatchedByTarget,
}

impl MergeMatchKind {
    pub fn keywords(self) -> &'static str {
        match self {
            MergeMatchKind::Matched => "when matched",
            MergeMatchKind::NotMatched => "when not matched",
            MergeMatchKind::NotMatchedBySource => "when not matched by source",
            MergeMatchKind::NotMatchedByTarget => "when not matched by target",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeWhenClause {
    pub kind: MergeMatchKind,
    /// The optional `and <cond>` refinement.
    pub condition: Option<ValueExpr>,
    pub action: MergeAction,
    /// Comments sitting on the THEN keyword.
    pub then_comments: Vec<SmolStr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    UpdateSet(SetClause),
    Delete,
    Insert {
        columns: Option<Vec<IdentifierExpr>>,
        /// `None` renders as `insert default values`.
        values: Option<TupleExpr>,
        /// Comments sitting on the VALUES keyword.
        values_comments: Vec<SmolStr>,
    },
    DoNothing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturningClause {
    pub items: Vec<SelectItem>,
    pub comments: Comments,
}
