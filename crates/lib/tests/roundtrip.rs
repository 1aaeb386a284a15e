//! Round-trip properties: emitted SQL parses back to a structurally
//! equal tree, and comment text survives the trip.

use sqlforge_lib::SqlFormatter;
use sqlforge_lib::config::FormatConfig;
use sqlforge_lib_core::ast::strip::stripped_statement;
use sqlforge_lib_core::parser::parse_statement;

const CORPUS: &[&str] = &[
    "select 1",
    "select id, name as label from users",
    "select distinct kind from events",
    "select distinct on (kind) kind, id from events order by kind, id desc",
    "select * from t",
    "select u.*, o.total from users u inner join orders o on o.user_id = u.id",
    "select id from users where age between 18 and 65 and email like '%@corp.test'",
    "select id from users where org_id in (1, 2, 3)",
    "select id from users where org_id in (select id from orgs where active = true)",
    "select id from users where deleted_at is not null",
    "select -x, not done, it is null from t",
    "select count(*) as n, max(price) from items group by kind having count(*) > 1",
    "select cast(x as numeric(10, 2)) from t",
    "select x::int from t",
    "select case when x > 0 then 'pos' when x < 0 then 'neg' else 'zero' end from t",
    "select case kind when 'a' then 1 else 0 end from t",
    "select row_number() over (partition by dept order by salary desc) from employees",
    "select sum(v) over (order by ts rows between 2 preceding and current row) from m",
    "select array[1, 2, 3], xs[1], xs[1:3], xs[:2] from t",
    "select 'it''s', $tag$ raw 'text' $tag$ from t",
    "select a from t limit 10 offset 5",
    "select a from t order by a fetch next 3 rows only",
    "select a from t order by a nulls first for update",
    "select a from t window w as (partition by b order by c)",
    "with active as (select id from users where active = true) select id from active",
    "with recursive walk as (select 1 union all select 2) select * from walk",
    "with t1 as not materialized (select 1) select * from t1",
    "select 1 union all select 2 union select 3",
    "select a from x intersect select a from y except all select a from z",
    "select id from (select id from inner_t) sub",
    "select * from generate_series(1, 10) with ordinality as g(n, i)",
    "select * from users u left join lateral (select 1) l on true",
    "values (1, 'a'), (2, 'b')",
    "insert into logs (id, msg) select id, msg from staged returning id",
    "insert into t values (1, 2)",
    "insert into t default values",
    "update accounts a set balance = b.balance, note = 'synced' from balances b \
     where a.id = b.id returning a.id",
    "delete from sessions s using users u where s.user_id = u.id returning s.id",
    "merge into items t using staged s on t.id = s.id \
     when matched and s.qty = 0 then delete \
     when matched then update set qty = s.qty \
     when not matched then insert (id, qty) values (s.id, s.qty) \
     when not matched by target then insert default values \
     when not matched by source then do nothing",
    "with dead as (select id from users) delete from sessions \
     where user_id in (select id from dead)",
    "create table if not exists app.users (id bigint primary key, \
     email varchar(255) not null unique, org_id bigint references orgs (id) on delete cascade, \
     constraint users_email_org unique (email, org_id), check (id > 0))",
    "create temporary table scratch (x int default 0)",
    "create unique index concurrently if not exists idx on users using btree \
     (lower(email) desc nulls last) include (id) where deleted_at is null",
    "create schema if not exists analytics",
    "create sequence if not exists s increment by 2 start with 100 minvalue 1 \
     maxvalue 1000 cache 10 cycle",
    "alter sequence s restart with 1 owned by users.id",
    "alter table if exists only t add column if not exists note text, \
     drop column if exists old cascade, drop constraint t_fk, \
     alter column kind set default 'x', alter column kind drop default",
    "drop table if exists a, b cascade",
    "drop index concurrently if exists idx restrict",
    "drop schema if exists s1, s2",
    "explain (analyze, verbose) select id from users",
    "analyze verbose users (id, email)",
    "select a /* one */, b from t -- two\n",
    "-- header\nselect case /*c*/ when x then 1 end from t",
];

/// `emit(parse(S))` parses back to the same tree, modulo comment
/// re-bucketing, in both print modes.
#[test]
fn emitted_sql_reparses_to_an_equal_tree() {
    let formatter = SqlFormatter::default();
    for source in CORPUS {
        let parsed = parse_statement(source)
            .unwrap_or_else(|err| panic!("parse failed for {source:?}: {err}"));

        let oneline = formatter.format_statement_oneline(&parsed);
        let reparsed = parse_statement(&oneline)
            .unwrap_or_else(|err| panic!("reparse failed for {oneline:?}: {err}"));
        assert_eq!(
            stripped_statement(&parsed),
            stripped_statement(&reparsed),
            "oneline round-trip changed the tree for {source:?}\nemitted: {oneline}"
        );

        let multiline = formatter.format_statement(&parsed);
        let reparsed = parse_statement(&multiline)
            .unwrap_or_else(|err| panic!("reparse failed for {multiline:?}: {err}"));
        assert_eq!(
            stripped_statement(&parsed),
            stripped_statement(&reparsed),
            "multiline round-trip changed the tree for {source:?}\nemitted: {multiline}"
        );
    }
}

/// A second emit of the reparsed tree is byte-stable.
#[test]
fn emission_is_idempotent() {
    let formatter = SqlFormatter::default();
    for source in CORPUS {
        let parsed = parse_statement(source).unwrap();
        let first = formatter.format_statement_oneline(&parsed);
        let second = formatter.format_statement_oneline(&parse_statement(&first).unwrap());
        assert_eq!(first, second, "unstable emission for {source:?}");
    }
}

/// Comment text survives the trip (modulo delimiter sanitization).
#[test]
fn comment_texts_are_preserved() {
    let source = "-- top\nselect a /* one */, b /* two */ from t where x = 1 -- tail\n";
    let printed = SqlFormatter::default()
        .format_statement_oneline(&parse_statement(source).unwrap());
    for text in ["top", "one", "two", "tail"] {
        assert!(
            printed.contains(&format!("/* {text} */")),
            "lost comment {text:?} in {printed}"
        );
    }
}

/// Normalized join output is stable under its own reparse.
#[test]
fn normalized_join_output_round_trips() {
    let formatter = SqlFormatter::new(FormatConfig {
        join_condition_order_by_declaration: true,
        ..FormatConfig::default()
    });
    let parsed = parse_statement("select * from a inner join b on b.id = a.id").unwrap();
    let printed = formatter.format_statement_oneline(&parsed);
    let reprinted = formatter.format_statement_oneline(&parse_statement(&printed).unwrap());
    assert_eq!(printed, reprinted);
}
