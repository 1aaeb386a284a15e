pub mod comments;
pub mod cte;
pub mod ddl;
pub mod dml;
pub mod expr;
pub mod query;
pub mod strip;

use smol_str::SmolStr;

use crate::ast::comments::Comments;
use crate::ast::ddl::{
    AlterSequenceStatement, AlterTableStatement, AnalyzeStatement, CreateIndexStatement,
    CreateSchemaStatement, CreateSequenceStatement, CreateTableStatement, DropIndexStatement,
    DropSchemaStatement, DropTableStatement, ExplainStatement,
};
use crate::ast::dml::{DeleteQuery, InsertQuery, MergeQuery, UpdateQuery};
use crate::ast::query::Query;

/// Any parsable statement: query roots, DML shapes and the DDL
/// surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(Query),
    Insert(Box<InsertQuery>),
    Update(Box<UpdateQuery>),
    Delete(Box<DeleteQuery>),
    Merge(Box<MergeQuery>),
    CreateTable(Box<CreateTableStatement>),
    CreateIndex(Box<CreateIndexStatement>),
    CreateSchema(CreateSchemaStatement),
    CreateSequence(Box<CreateSequenceStatement>),
    AlterSequence(Box<AlterSequenceStatement>),
    AlterTable(Box<AlterTableStatement>),
    DropTable(DropTableStatement),
    DropIndex(DropIndexStatement),
    DropSchema(DropSchemaStatement),
    Explain(Box<ExplainStatement>),
    Analyze(Box<AnalyzeStatement>),
}

impl Statement {
    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Statement::Query(query) => Some(query),
            _ => None,
        }
    }

    pub fn as_query_mut(&mut self) -> Option<&mut Query> {
        match self {
            Statement::Query(query) => Some(query),
            _ => None,
        }
    }

    /// Header comments at the top of the statement, when the root kind
    /// carries them.
    pub fn header_comments(&self) -> &[SmolStr] {
        match self {
            Statement::Query(Query::Select(select)) => &select.header_comments,
            Statement::Insert(insert) => &insert.header_comments,
            Statement::Update(update) => &update.header_comments,
            Statement::Delete(delete) => &delete.header_comments,
            Statement::Merge(merge) => &merge.header_comments,
            _ => &[],
        }
    }

    pub fn comments_mut(&mut self) -> &mut Comments {
        match self {
            Statement::Query(query) => query.comments_mut(),
            Statement::Insert(n) => &mut n.comments,
            Statement::Update(n) => &mut n.comments,
            Statement::Delete(n) => &mut n.comments,
            Statement::Merge(n) => &mut n.comments,
            Statement::CreateTable(n) => &mut n.comments,
            Statement::CreateIndex(n) => &mut n.comments,
            Statement::CreateSchema(n) => &mut n.comments,
            Statement::CreateSequence(n) => &mut n.comments,
            Statement::AlterSequence(n) => &mut n.comments,
            Statement::AlterTable(n) => &mut n.comments,
            Statement::DropTable(n) => &mut n.comments,
            Statement::DropIndex(n) => &mut n.comments,
            Statement::DropSchema(n) => &mut n.comments,
            Statement::Explain(n) => &mut n.comments,
            Statement::Analyze(n) => &mut n.comments,
        }
    }
}

impl From<Query> for Statement {
    fn from(value: Query) -> Self {
        Statement::Query(value)
    }
}

/// Structural equality modulo comments: both sides are compared with
/// their positioned-comment overlays (and header comments) stripped.
/// Whitespace never reaches this comparison because it never reaches
/// the tree.
pub fn structurally_equal(a: &Query, b: &Query) -> bool {
    strip::stripped_query(a) == strip::stripped_query(b)
}
