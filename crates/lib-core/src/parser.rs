pub(crate) mod ddl;
pub(crate) mod dml;
pub(crate) mod select;
pub(crate) mod source;
pub(crate) mod stream;
pub(crate) mod value;

use smol_str::SmolStr;

use crate::ast::Statement;
use crate::ast::comments::CommentSlot;
use crate::ast::expr::ValueExpr;
use crate::ast::query::{Query, SimpleSelect, WithClause};
use crate::errors::SQLParseError;
use crate::lexer::{Lexer, LexerOptions};
use crate::parser::stream::TokenCursor;

/// Recursive-descent SQL parser over the lexeme stream. The lexer
/// configuration travels with it so dialect quoting carries through.
#[derive(Default)]
pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(options: LexerOptions) -> Self {
        Parser {
            lexer: Lexer::new(options),
        }
    }

    pub fn parse_statement(&self, sql: &str) -> Result<Statement, SQLParseError> {
        let sequence = self.lexer.tokenize(sql)?;
        let mut cur = TokenCursor::new(sequence.lexemes);

        let header = cur.take_leading_here();
        let mut statement = statement_inner(&mut cur)?;
        attach_header(&mut statement, header);

        cur.take_kind(crate::lexer::LexemeKind::Terminator);
        if !cur.is_eof() {
            return Err(cur.error("unexpected trailing input"));
        }
        Ok(statement)
    }

    pub fn parse_query(&self, sql: &str) -> Result<Query, SQLParseError> {
        match self.parse_statement(sql)? {
            Statement::Query(query) => Ok(query),
            _ => Err(SQLParseError::new("expected a query", 0)),
        }
    }

    pub fn parse_select(&self, sql: &str) -> Result<SimpleSelect, SQLParseError> {
        match self.parse_query(sql)? {
            Query::Select(select) => Ok(*select),
            _ => Err(SQLParseError::new("expected a plain SELECT", 0)),
        }
    }

    pub fn parse_expr(&self, sql: &str) -> Result<ValueExpr, SQLParseError> {
        let sequence = self.lexer.tokenize(sql)?;
        let mut cur = TokenCursor::new(sequence.lexemes);
        let expr = value::parse_value(&mut cur)?;
        if !cur.is_eof() {
            return Err(cur.error("unexpected trailing input"));
        }
        Ok(expr)
    }
}

/// Parse one statement with the default lexer configuration.
pub fn parse_statement(sql: &str) -> Result<Statement, SQLParseError> {
    Parser::default().parse_statement(sql)
}

pub fn parse_query(sql: &str) -> Result<Query, SQLParseError> {
    Parser::default().parse_query(sql)
}

pub fn parse_select(sql: &str) -> Result<SimpleSelect, SQLParseError> {
    Parser::default().parse_select(sql)
}

pub fn parse_expr(sql: &str) -> Result<ValueExpr, SQLParseError> {
    Parser::default().parse_expr(sql)
}

/// Statement dispatch on the leading keyword. EXPLAIN re-enters here
/// for its inner statement.
pub(crate) fn statement_inner(cur: &mut TokenCursor) -> Result<Statement, SQLParseError> {
    if cur.is_word("with") {
        let with = select::parse_with_clause(cur)?;
        if cur.is_word("insert") {
            return Ok(Statement::Insert(Box::new(dml::parse_insert(
                cur,
                Some(with),
            )?)));
        }
        if cur.is_word("update") {
            return Ok(Statement::Update(Box::new(dml::parse_update(
                cur,
                Some(with),
            )?)));
        }
        if cur.is_word("delete") {
            return Ok(Statement::Delete(Box::new(dml::parse_delete(
                cur,
                Some(with),
            )?)));
        }
        if cur.is_word("merge") {
            return Ok(Statement::Merge(Box::new(dml::parse_merge(
                cur,
                Some(with),
            )?)));
        }
        let mut query = select::parse_query(cur)?;
        attach_with(&mut query, with, cur)?;
        return Ok(Statement::Query(query));
    }

    if cur.is_word("select") || cur.is_word("values") || cur.is_kind(crate::lexer::LexemeKind::OpenParen)
    {
        return Ok(Statement::Query(select::parse_query(cur)?));
    }
    if cur.is_word("insert") {
        return Ok(Statement::Insert(Box::new(dml::parse_insert(cur, None)?)));
    }
    if cur.is_word("update") {
        return Ok(Statement::Update(Box::new(dml::parse_update(cur, None)?)));
    }
    if cur.is_word("delete") {
        return Ok(Statement::Delete(Box::new(dml::parse_delete(cur, None)?)));
    }
    if cur.is_word("merge") {
        return Ok(Statement::Merge(Box::new(dml::parse_merge(cur, None)?)));
    }
    if cur.is_word("create") {
        return ddl::parse_create(cur);
    }
    if cur.is_word("drop") {
        return ddl::parse_drop(cur);
    }
    if cur.is_word("alter") {
        return ddl::parse_alter(cur);
    }
    if cur.is_word("explain") {
        return Ok(Statement::Explain(Box::new(ddl::parse_explain(cur)?)));
    }
    if cur.is_word("analyze") {
        return Ok(Statement::Analyze(Box::new(ddl::parse_analyze(cur)?)));
    }

    Err(cur.error("expected a statement"))
}

/// A WITH parsed ahead of a set expression belongs to the leftmost
/// SELECT under it.
fn attach_with(
    query: &mut Query,
    with: WithClause,
    cur: &TokenCursor,
) -> Result<(), SQLParseError> {
    match query {
        Query::Select(select) => {
            select.with = Some(with);
            select.rebuild_cte_cache();
            Ok(())
        }
        Query::Binary(binary) => attach_with(&mut binary.left, with, cur),
        Query::Values(_) => Err(cur.error("WITH must precede a SELECT")),
    }
}

fn attach_header(statement: &mut Statement, header: Vec<SmolStr>) {
    if header.is_empty() {
        return;
    }
    match statement {
        Statement::Query(Query::Select(select)) => select.header_comments = header,
        Statement::Insert(insert) => insert.header_comments = header,
        Statement::Update(update) => update.header_comments = header,
        Statement::Delete(delete) => delete.header_comments = header,
        Statement::Merge(merge) => merge.header_comments = header,
        other => other.comments_mut().push(CommentSlot::Before, header),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use smol_str::SmolStr;

    use super::*;
    use crate::ast::dml::{InsertSource, MergeAction, MergeMatchKind};
    use crate::ast::expr::{LiteralKind, LiteralValue};
    use crate::ast::query::{Distinct, JoinCondition, JoinKind, SetOperator, SourceKind};

    #[test]
    fn select_clause_ladder() {
        let select = parse_select(
            "select distinct id, count(*) as n from events e \
             where kind = 'click' group by id having count(*) > 1 \
             order by n desc nulls last limit 10 offset 5",
        )
        .unwrap();

        assert_eq!(select.select.distinct, Some(Distinct::Distinct));
        assert_eq!(select.select.items.len(), 2);
        assert_eq!(
            select.select.items[1].output_name().map(|s| s.as_str()),
            Some("n")
        );
        assert!(select.from.is_some());
        assert!(select.where_clause.is_some());
        assert!(select.group_by.is_some());
        assert!(select.having.is_some());
        assert!(select.order_by.is_some());
        assert!(select.limit.is_some());
        assert!(select.offset.is_some());
    }

    #[test]
    fn with_clause_populates_cte_cache() {
        let select = parse_select(
            "with active as (select id from users where active = true) \
             select id from active",
        )
        .unwrap();
        assert!(select.has_cte("active"));
        assert_eq!(select.get_cte_names(), vec![SmolStr::new("active")]);
    }

    #[test]
    fn recursive_with_and_materialized() {
        let select = parse_select(
            "with recursive walk as not materialized (select 1) select * from walk",
        )
        .unwrap();
        let with = select.with.as_ref().unwrap();
        assert!(with.recursive);
        assert_eq!(
            with.tables[0].materialized,
            Some(crate::ast::query::Materialized::NotMaterialized)
        );
    }

    #[test]
    fn union_all_of_three_is_left_deep() {
        let query = parse_query("select 1 union all select 2 union select 3").unwrap();
        let Query::Binary(top) = query else {
            panic!("expected binary");
        };
        assert_eq!(top.op, SetOperator::Union);
        let Query::Binary(left) = &top.left else {
            panic!("expected left-deep nesting");
        };
        assert_eq!(left.op, SetOperator::UnionAll);
    }

    #[test]
    fn join_variants() {
        let select = parse_select(
            "select * from a inner join b on a.id = b.id \
             left outer join c using (id) cross join d",
        )
        .unwrap();
        let from = select.from.as_ref().unwrap();
        assert_eq!(from.joins.len(), 3);
        assert_eq!(from.joins[0].kind, JoinKind::Inner);
        assert!(matches!(
            from.joins[0].condition,
            Some(JoinCondition::On(_))
        ));
        assert_eq!(from.joins[1].kind, JoinKind::Left);
        assert!(matches!(
            from.joins[1].condition,
            Some(JoinCondition::Using(_))
        ));
        assert_eq!(from.joins[2].kind, JoinKind::Cross);
    }

    #[test]
    fn lateral_subquery_source() {
        let select = parse_select(
            "select * from users u \
             left join lateral (select id from orders o where o.user_id = u.id) recent on true",
        )
        .unwrap();
        let join = &select.from.as_ref().unwrap().joins[0];
        assert!(join.lateral);
        assert!(matches!(join.source.kind, SourceKind::SubQuery(_)));
        assert_eq!(
            join.source.binding_name().map(|s| s.as_str()),
            Some("recent")
        );
    }

    #[test]
    fn insert_with_columns_and_returning() {
        let Statement::Insert(insert) =
            parse_statement("insert into logs (id, msg) select id, msg from staged returning id")
                .unwrap()
        else {
            panic!("expected insert");
        };
        assert_eq!(insert.target.name, "logs");
        assert_eq!(insert.columns.as_ref().unwrap().len(), 2);
        assert!(matches!(insert.source, InsertSource::Query(_)));
        assert!(insert.returning.is_some());
    }

    #[test]
    fn insert_values_and_default_values() {
        let Statement::Insert(insert) =
            parse_statement("insert into t values (1, 'a'), (2, 'b')").unwrap()
        else {
            panic!("expected insert");
        };
        let InsertSource::Query(Query::Values(values)) = &insert.source else {
            panic!("expected values body");
        };
        assert_eq!(values.rows.len(), 2);

        let Statement::Insert(defaults) =
            parse_statement("insert into t default values").unwrap()
        else {
            panic!("expected insert");
        };
        assert!(matches!(defaults.source, InsertSource::DefaultValues));
    }

    #[test]
    fn update_with_from_and_where() {
        let Statement::Update(update) = parse_statement(
            "update accounts a set balance = b.balance, synced = true \
             from balances b where a.id = b.id returning a.id",
        )
        .unwrap() else {
            panic!("expected update");
        };
        assert_eq!(update.set.items.len(), 2);
        assert!(update.from.is_some());
        assert!(update.where_clause.is_some());
        assert!(update.returning.is_some());
    }

    #[test]
    fn delete_using() {
        let Statement::Delete(delete) = parse_statement(
            "delete from sessions s using users u where s.user_id = u.id and u.banned = true",
        )
        .unwrap() else {
            panic!("expected delete");
        };
        assert!(delete.using.is_some());
        assert!(delete.where_clause.is_some());
    }

    #[test]
    fn merge_when_clauses() {
        let Statement::Merge(merge) = parse_statement(
            "merge into items t using staged s on t.id = s.id \
             when matched and s.qty = 0 then delete \
             when matched then update set qty = s.qty \
             when not matched then insert (id, qty) values (s.id, s.qty) \
             when not matched by source then do nothing",
        )
        .unwrap() else {
            panic!("expected merge");
        };
        assert_eq!(merge.when_clauses.len(), 4);
        assert_eq!(merge.when_clauses[0].kind, MergeMatchKind::Matched);
        assert!(merge.when_clauses[0].condition.is_some());
        assert!(matches!(merge.when_clauses[0].action, MergeAction::Delete));
        assert!(matches!(
            merge.when_clauses[1].action,
            MergeAction::UpdateSet(_)
        ));
        assert!(matches!(
            merge.when_clauses[2].action,
            MergeAction::Insert { .. }
        ));
        assert_eq!(
            merge.when_clauses[3].kind,
            MergeMatchKind::NotMatchedBySource
        );
        assert!(matches!(
            merge.when_clauses[3].action,
            MergeAction::DoNothing
        ));
    }

    #[test]
    fn with_ahead_of_dml() {
        let Statement::Delete(delete) = parse_statement(
            "with dead as (select id from users where deleted) \
             delete from sessions where user_id in (select id from dead)",
        )
        .unwrap() else {
            panic!("expected delete");
        };
        assert!(delete.with.is_some());
    }

    #[test]
    fn create_table_with_constraints() {
        let Statement::CreateTable(create) = parse_statement(
            "create table if not exists app.users (\
             id bigint primary key, \
             email varchar(255) not null unique, \
             org_id bigint references orgs (id) on delete cascade, \
             constraint users_email_org unique (email, org_id), \
             check (id > 0))",
        )
        .unwrap() else {
            panic!("expected create table");
        };
        assert!(create.if_not_exists);
        assert_eq!(create.name.path(), "app.users");
        assert_eq!(create.columns.len(), 3);
        assert_eq!(create.constraints.len(), 2);
    }

    #[test]
    fn create_index_full_form() {
        let Statement::CreateIndex(create) = parse_statement(
            "create unique index concurrently if not exists idx_users_email \
             on users using btree (lower(email) desc nulls last) \
             include (id) tablespace fast where deleted_at is null",
        )
        .unwrap() else {
            panic!("expected create index");
        };
        assert!(create.unique);
        assert!(create.concurrently);
        assert!(create.if_not_exists);
        assert_eq!(create.using.as_deref(), Some("btree"));
        assert_eq!(create.include.len(), 1);
        assert!(create.tablespace.is_some());
        assert!(create.where_clause.is_some());
    }

    #[test]
    fn alter_table_actions() {
        let Statement::AlterTable(alter) = parse_statement(
            "alter table if exists only t \
             add column if not exists note text, \
             drop column if exists old_note cascade, \
             drop constraint t_fk, \
             alter column kind set default 'x'",
        )
        .unwrap() else {
            panic!("expected alter table");
        };
        assert!(alter.if_exists);
        assert!(alter.only);
        assert_eq!(alter.actions.len(), 4);
    }

    #[test]
    fn sequences() {
        let Statement::CreateSequence(create) = parse_statement(
            "create sequence if not exists user_id_seq \
             increment by 2 start with 100 minvalue 1 maxvalue 10000 cache 10 cycle",
        )
        .unwrap() else {
            panic!("expected create sequence");
        };
        assert_eq!(create.options.len(), 6);

        let Statement::AlterSequence(alter) =
            parse_statement("alter sequence user_id_seq restart with 1 owned by users.id")
                .unwrap()
        else {
            panic!("expected alter sequence");
        };
        assert_eq!(alter.options.len(), 2);
    }

    #[test]
    fn explain_and_analyze() {
        let Statement::Explain(explain) =
            parse_statement("explain (analyze, verbose) select 1").unwrap()
        else {
            panic!("expected explain");
        };
        assert_eq!(explain.options.len(), 2);
        assert!(matches!(*explain.statement, Statement::Query(_)));

        let Statement::Analyze(analyze) =
            parse_statement("analyze verbose users (id, email)").unwrap()
        else {
            panic!("expected analyze");
        };
        assert!(analyze.verbose);
        assert_eq!(analyze.columns.len(), 2);
    }

    #[test]
    fn header_comments_attach_to_root() {
        let select = parse_select("-- report\n-- daily\nselect 1").unwrap();
        assert_eq!(
            select.header_comments,
            vec![SmolStr::new("report"), SmolStr::new("daily")]
        );
    }

    #[test]
    fn parse_errors_carry_positions() {
        let err = parse_statement("select from").unwrap_err();
        assert!(err.description.contains("expected expression"));
        assert_eq!(err.position, 7);

        let err = parse_statement("grant all on t").unwrap_err();
        assert!(err.description.contains("expected a statement"));
    }

    #[test]
    fn boolean_and_null_literals() {
        let select = parse_select("select true, false, null").unwrap();
        let kinds: Vec<_> = select
            .select
            .items
            .iter()
            .map(|i| match &i.expr {
                ValueExpr::Literal(LiteralValue { kind, .. }) => *kind,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            [LiteralKind::Boolean, LiteralKind::Boolean, LiteralKind::Null]
        );
    }

    #[test]
    fn fetch_and_locking() {
        let select = parse_select(
            "select id from q order by id fetch first 5 rows with ties for update",
        )
        .unwrap();
        assert!(select.fetch.is_some());
        assert_eq!(
            select.locking.as_ref().map(|l| l.lock),
            Some(crate::ast::query::LockMode::Update)
        );
    }
}
