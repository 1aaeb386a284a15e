use ahash::AHashSet;
use smol_str::SmolStr;

use crate::ast::comments::Comments;
use crate::ast::cte;
use crate::ast::expr::{HintExpr, IdentifierExpr, QualifiedName, ValueExpr};
use crate::errors::TransformError;

/// A query in source position: plain SELECT, a set operation, or a
/// VALUES body.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Box<SimpleSelect>),
    Binary(Box<BinarySelect>),
    Values(Box<ValuesQuery>),
}

impl Query {
    pub fn as_select(&self) -> Option<&SimpleSelect> {
        match self {
            Query::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn as_select_mut(&mut self) -> Option<&mut SimpleSelect> {
        match self {
            Query::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn comments(&self) -> &Comments {
        match self {
            Query::Select(q) => &q.comments,
            Query::Binary(q) => &q.comments,
            Query::Values(q) => &q.comments,
        }
    }

    pub fn comments_mut(&mut self) -> &mut Comments {
        match self {
            Query::Select(q) => &mut q.comments,
            Query::Binary(q) => &mut q.comments,
            Query::Values(q) => &mut q.comments,
        }
    }
}

impl From<SimpleSelect> for Query {
    fn from(value: SimpleSelect) -> Self {
        Query::Select(Box::new(value))
    }
}

impl From<BinarySelect> for Query {
    fn from(value: BinarySelect) -> Self {
        Query::Binary(Box::new(value))
    }
}

impl From<ValuesQuery> for Query {
    fn from(value: ValuesQuery) -> Self {
        Query::Values(Box::new(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

impl SetOperator {
    pub fn keywords(self) -> &'static str {
        match self {
            SetOperator::Union => "union",
            SetOperator::UnionAll => "union all",
            SetOperator::Intersect => "intersect",
            SetOperator::IntersectAll => "intersect all",
            SetOperator::Except => "except",
            SetOperator::ExceptAll => "except all",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinarySelect {
    pub left: Query,
    pub op: SetOperator,
    pub right: Query,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuesQuery {
    pub rows: Vec<crate::ast::expr::TupleExpr>,
    pub comments: Comments,
}

/// The workhorse query root. All clause fields are public; the CTE
/// name cache is not, and is kept in sync by the CTE methods below.
/// After editing the WITH clause through the public field, call
/// [`SimpleSelect::rebuild_cte_cache`].
#[derive(Debug, Clone, Default)]
pub struct SimpleSelect {
    pub with: Option<WithClause>,
    pub select: SelectClause,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub group_by: Option<GroupByClause>,
    pub having: Option<HavingClause>,
    pub window: Option<WindowClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
    pub fetch: Option<FetchClause>,
    pub locking: Option<ForClause>,
    /// Comments above the whole statement, rendered before anything
    /// else and merged per the header rules.
    pub header_comments: Vec<SmolStr>,
    pub comments: Comments,
    cte_names: AHashSet<SmolStr>,
}

impl PartialEq for SimpleSelect {
    fn eq(&self, other: &Self) -> bool {
        // The cache mirrors `with`; comparing it again would only let
        // a desynchronized cache break equality.
        self.with == other.with
            && self.select == other.select
            && self.from == other.from
            && self.where_clause == other.where_clause
            && self.group_by == other.group_by
            && self.having == other.having
            && self.window == other.window
            && self.order_by == other.order_by
            && self.limit == other.limit
            && self.offset == other.offset
            && self.fetch == other.fetch
            && self.locking == other.locking
            && self.header_comments == other.header_comments
            && self.comments == other.comments
    }
}

impl SimpleSelect {
    /// Fold a predicate into the WHERE clause with AND, seeding the
    /// clause when absent.
    pub fn append_where(&mut self, condition: ValueExpr) -> &mut Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(clause) => WhereClause {
                condition: clause.condition.and(condition),
                comments: clause.comments,
            },
            None => WhereClause {
                condition,
                comments: Comments::new(),
            },
        });
        self
    }

    /// Fold a predicate into HAVING with AND, seeding when absent.
    pub fn append_having(&mut self, condition: ValueExpr) -> &mut Self {
        self.having = Some(match self.having.take() {
            Some(clause) => HavingClause {
                condition: clause.condition.and(condition),
                comments: clause.comments,
            },
            None => HavingClause {
                condition,
                comments: Comments::new(),
            },
        });
        self
    }

    pub fn to_union(self, rhs: impl Into<Query>) -> Query {
        self.binary(SetOperator::Union, rhs)
    }

    pub fn to_union_all(self, rhs: impl Into<Query>) -> Query {
        self.binary(SetOperator::UnionAll, rhs)
    }

    pub fn to_intersect(self, rhs: impl Into<Query>) -> Query {
        self.binary(SetOperator::Intersect, rhs)
    }

    pub fn to_intersect_all(self, rhs: impl Into<Query>) -> Query {
        self.binary(SetOperator::IntersectAll, rhs)
    }

    pub fn to_except(self, rhs: impl Into<Query>) -> Query {
        self.binary(SetOperator::Except, rhs)
    }

    pub fn to_except_all(self, rhs: impl Into<Query>) -> Query {
        self.binary(SetOperator::ExceptAll, rhs)
    }

    fn binary(self, op: SetOperator, rhs: impl Into<Query>) -> Query {
        Query::Binary(Box::new(BinarySelect {
            left: self.into(),
            op,
            right: rhs.into(),
            comments: Comments::new(),
        }))
    }

    /// Wrap this query as an aliased subquery source.
    pub fn to_source(self, alias: &str) -> Result<SourceExpr, TransformError> {
        if alias.trim().is_empty() {
            return Err(TransformError::MissingAlias);
        }
        Ok(SourceExpr {
            kind: SourceKind::SubQuery(Box::new(self.into())),
            alias: Some(SourceAlias::new(alias)),
            comments: Comments::new(),
        })
    }

    // ---- CTE management -------------------------------------------------

    pub fn has_cte(&self, name: &str) -> bool {
        self.cte_names.contains(name)
    }

    /// CTE names in insertion order.
    pub fn get_cte_names(&self) -> Vec<SmolStr> {
        self.with
            .as_ref()
            .map(|with| with.tables.iter().map(|t| t.name.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Register a CTE. Fails on an empty name or a name collision, and
    /// leaves the tree untouched on failure. The mutation runs WITH
    /// normalization, so nested WITH clauses inside `query` are
    /// hoisted to this query's root.
    pub fn add_cte(
        &mut self,
        name: &str,
        query: Query,
        options: CteOptions,
    ) -> Result<&mut Self, TransformError> {
        validate_cte_name(name)?;
        if self.has_cte(name) {
            return Err(TransformError::DuplicateCte(SmolStr::new(name)));
        }
        let mut trial = self.clone();
        trial
            .with
            .get_or_insert_with(WithClause::default)
            .tables
            .push(CommonTable::new(name, query, options));
        cte::normalize(&mut trial)?;
        trial.rebuild_cte_cache();
        *self = trial;
        Ok(self)
    }

    /// Drop a CTE by name.
    pub fn remove_cte(&mut self, name: &str) -> Result<&mut Self, TransformError> {
        if !self.has_cte(name) {
            return Err(TransformError::CteNotFound(SmolStr::new(name)));
        }
        let mut trial = self.clone();
        if let Some(with) = &mut trial.with {
            with.tables.retain(|t| t.name.name != name);
            if with.tables.is_empty() {
                trial.with = None;
            }
        }
        cte::normalize(&mut trial)?;
        trial.rebuild_cte_cache();
        *self = trial;
        Ok(self)
    }

    /// Upsert a CTE: replaces the body in place when the name exists,
    /// appends otherwise.
    pub fn replace_cte(
        &mut self,
        name: &str,
        query: Query,
        options: CteOptions,
    ) -> Result<&mut Self, TransformError> {
        validate_cte_name(name)?;
        let mut trial = self.clone();
        let with = trial.with.get_or_insert_with(WithClause::default);
        match with.tables.iter_mut().find(|t| t.name.name == name) {
            Some(table) => {
                table.query = query;
                table.materialized = options.materialized;
                if options.columns.is_some() {
                    table.columns = options.columns;
                }
            }
            None => with.tables.push(CommonTable::new(name, query, options)),
        }
        cte::normalize(&mut trial)?;
        trial.rebuild_cte_cache();
        *self = trial;
        Ok(self)
    }

    /// Re-derive the name cache from the WITH clause. Required after
    /// mutating `with` directly.
    pub fn rebuild_cte_cache(&mut self) {
        self.cte_names = self
            .with
            .as_ref()
            .map(|with| with.tables.iter().map(|t| t.name.name.clone()).collect())
            .unwrap_or_default();
    }
}

fn validate_cte_name(name: &str) -> Result<(), TransformError> {
    if name.trim().is_empty() {
        return Err(TransformError::InvalidCteName {
            name: SmolStr::new(name),
            detail: "CTE names must not be empty or whitespace-only",
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CteOptions {
    pub materialized: Option<Materialized>,
    pub columns: Option<Vec<IdentifierExpr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Materialized,
    NotMaterialized,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithClause {
    pub recursive: bool,
    pub tables: Vec<CommonTable>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommonTable {
    pub name: IdentifierExpr,
    pub columns: Option<Vec<IdentifierExpr>>,
    /// Tri-state: absent, MATERIALIZED or NOT MATERIALIZED. Affects
    /// emission only and is preserved verbatim.
    pub materialized: Option<Materialized>,
    pub query: Query,
    /// Comments between the alias and AS.
    pub as_comments: Vec<SmolStr>,
    pub comments: Comments,
}

impl CommonTable {
    pub fn new(name: &str, query: Query, options: CteOptions) -> Self {
        CommonTable {
            name: IdentifierExpr::new(name),
            columns: options.columns,
            materialized: options.materialized,
            query,
            as_comments: Vec::new(),
            comments: Comments::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectClause {
    pub distinct: Option<Distinct>,
    pub hints: Vec<HintExpr>,
    pub items: Vec<SelectItem>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Distinct {
    Distinct,
    DistinctOn(Vec<ValueExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: ValueExpr,
    pub alias: Option<IdentifierExpr>,
    /// Comments between the expression and AS (or the bare alias).
    pub as_comments: Vec<SmolStr>,
    pub comments: Comments,
}

impl SelectItem {
    pub fn new(expr: ValueExpr) -> Self {
        SelectItem {
            expr,
            alias: None,
            as_comments: Vec::new(),
            comments: Comments::new(),
        }
    }

    /// The name this item contributes to the output schema.
    pub fn output_name(&self) -> Option<&SmolStr> {
        self.alias
            .as_ref()
            .map(|a| &a.name)
            .or_else(|| self.expr.output_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub source: SourceExpr,
    pub joins: Vec<JoinClause>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceExpr {
    pub kind: SourceKind,
    pub alias: Option<SourceAlias>,
    pub comments: Comments,
}

impl SourceExpr {
    pub fn table(name: QualifiedName) -> Self {
        SourceExpr {
            kind: SourceKind::Table(name),
            alias: None,
            comments: Comments::new(),
        }
    }

    /// The name this source answers to in column qualifiers: its alias
    /// when present, the bare table name otherwise.
    pub fn binding_name(&self) -> Option<&SmolStr> {
        if let Some(alias) = &self.alias {
            return Some(&alias.name.name);
        }
        match &self.kind {
            SourceKind::Table(name) => Some(&name.name),
            _ => None,
        }
    }

    /// All qualifier spellings this source answers to: the alias, the
    /// bare table name and the dotted path.
    pub fn binding_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(alias) = &self.alias {
            names.push(alias.name.name.to_string());
        }
        if let SourceKind::Table(table) = &self.kind {
            if self.alias.is_none() {
                names.push(table.name.to_string());
                if !table.namespaces.is_empty() {
                    names.push(table.path());
                }
            }
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Table(QualifiedName),
    SubQuery(Box<Query>),
    Function(Box<crate::ast::expr::FunctionCall>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceAlias {
    pub name: IdentifierExpr,
    pub columns: Option<Vec<IdentifierExpr>>,
    /// Comments between the source and AS / the alias identifier.
    pub as_comments: Vec<SmolStr>,
    pub comments: Comments,
}

impl SourceAlias {
    pub fn new(name: &str) -> Self {
        SourceAlias {
            name: IdentifierExpr::new(name),
            columns: None,
            as_comments: Vec::new(),
            comments: Comments::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn keywords(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner join",
            JoinKind::Left => "left join",
            JoinKind::Right => "right join",
            JoinKind::Full => "full join",
            JoinKind::Cross => "cross join",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub lateral: bool,
    pub source: SourceExpr,
    pub condition: Option<JoinCondition>,
    /// Comments sitting on the JOIN keyword itself.
    pub join_comments: Vec<SmolStr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    On(ValueExpr),
    Using(Vec<IdentifierExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub condition: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupByClause {
    pub items: Vec<ValueExpr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HavingClause {
    pub condition: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowClause {
    pub windows: Vec<WindowDef>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowDef {
    pub name: IdentifierExpr,
    pub spec: crate::ast::expr::WindowSpec,
    pub comments: Comments,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderByClause {
    pub items: Vec<OrderByItem>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub value: ValueExpr,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsPosition>,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsPosition {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitClause {
    pub value: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffsetClause {
    pub value: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFirst {
    First,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchUnit {
    Rows,
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTies {
    Only,
    WithTies,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchClause {
    pub first: FetchFirst,
    pub count: Option<ValueExpr>,
    pub unit: FetchUnit,
    pub ties: FetchTies,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Update,
    NoKeyUpdate,
    Share,
    KeyShare,
}

impl LockMode {
    pub fn keywords(self) -> &'static str {
        match self {
            LockMode::Update => "update",
            LockMode::NoKeyUpdate => "no key update",
            LockMode::Share => "share",
            LockMode::KeyShare => "key share",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForClause {
    pub lock: LockMode,
    pub comments: Comments,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::expr::LiteralKind;
    use crate::ast::expr::LiteralValue;

    fn select_one() -> SimpleSelect {
        let mut select = SimpleSelect::default();
        select.select.items.push(SelectItem::new(ValueExpr::Literal(
            LiteralValue::new("1", LiteralKind::Number),
        )));
        select
    }

    #[test]
    fn append_where_seeds_then_folds() {
        let mut q = select_one();
        q.append_where(ValueExpr::column("a").equals(ValueExpr::column("b")));
        assert!(q.where_clause.is_some());

        q.append_where(ValueExpr::column("c").equals(ValueExpr::column("d")));
        let ValueExpr::Binary(folded) = &q.where_clause.as_ref().unwrap().condition else {
            panic!("expected folded AND");
        };
        assert_eq!(folded.op, "and");
    }

    #[test]
    fn add_cte_then_lookup() {
        let mut q = select_one();
        q.add_cte("base", select_one().into(), CteOptions::default())
            .unwrap();
        assert!(q.has_cte("base"));
        assert_eq!(q.get_cte_names(), vec![SmolStr::new("base")]);
    }

    #[test]
    fn duplicate_cte_is_rejected_without_mutation() {
        let mut q = select_one();
        q.add_cte("base", select_one().into(), CteOptions::default())
            .unwrap();
        let snapshot = q.clone();
        let err = q
            .add_cte("base", select_one().into(), CteOptions::default())
            .unwrap_err();
        assert_eq!(err, TransformError::DuplicateCte(SmolStr::new("base")));
        assert_eq!(q, snapshot);
    }

    #[test]
    fn empty_cte_name_is_invalid() {
        let mut q = select_one();
        let err = q
            .add_cte("   ", select_one().into(), CteOptions::default())
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidCteName { .. }));
    }

    #[test]
    fn remove_cte_clears_cache_and_clause() {
        let mut q = select_one();
        q.add_cte("base", select_one().into(), CteOptions::default())
            .unwrap();
        q.remove_cte("base").unwrap();
        assert!(!q.has_cte("base"));
        assert!(q.with.is_none());

        let err = q.remove_cte("base").unwrap_err();
        assert_eq!(err, TransformError::CteNotFound(SmolStr::new("base")));
    }

    #[test]
    fn replace_cte_upserts() {
        let mut q = select_one();
        q.replace_cte("base", select_one().into(), CteOptions::default())
            .unwrap();
        assert!(q.has_cte("base"));

        let mut replacement = select_one();
        replacement.append_where(ValueExpr::column("x").equals(ValueExpr::column("y")));
        q.replace_cte("base", replacement.into(), CteOptions::default())
            .unwrap();
        assert_eq!(q.get_cte_names().len(), 1);
    }

    #[test]
    fn to_source_requires_alias() {
        let err = select_one().to_source("  ").unwrap_err();
        assert_eq!(err, TransformError::MissingAlias);

        let source = select_one().to_source("sub").unwrap();
        assert_eq!(source.binding_name().map(|s| s.as_str()), Some("sub"));
    }
}
