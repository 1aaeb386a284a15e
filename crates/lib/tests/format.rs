//! Formatting snapshots: dialect decoration, cast and constraint
//! styles, comment placement and the multiline layout.

use expect_test::expect;
use sqlforge_lib::SqlFormatter;
use sqlforge_lib::config::{CastStyle, FormatConfig, KeywordCase};
use sqlforge_lib::presets::FormatPreset;
use sqlforge_lib_core::helpers::Config;
use sqlforge_lib_core::parser::parse_statement;

fn oneline(sql: &str) -> String {
    SqlFormatter::default().format_statement_oneline(&parse_statement(sql).unwrap())
}

fn oneline_with(formatter: &SqlFormatter, sql: &str) -> String {
    formatter.format_statement_oneline(&parse_statement(sql).unwrap())
}

#[test]
fn select_with_default_config() {
    assert_eq!(
        oneline("SELECT id, name FROM users WHERE active = TRUE"),
        r#"select "id", "name" from "users" where "active" = TRUE"#
    );
}

#[test]
fn keyword_case_upper() {
    let formatter = SqlFormatter::new(
        FormatConfig::default().config(|c| c.keyword_case = KeywordCase::Upper),
    );
    assert_eq!(
        oneline_with(&formatter, "select id from users"),
        r#"SELECT "id" FROM "users""#
    );
}

#[test]
fn cast_styles() {
    assert_eq!(
        oneline("SELECT CAST(x AS int) FROM t"),
        r#"select cast("x" as int) from "t""#
    );

    let postgres = SqlFormatter::new(
        FormatConfig::default().config(|c| c.cast_style = CastStyle::Postgres),
    );
    assert_eq!(
        oneline_with(&postgres, "SELECT CAST(x AS int) FROM t"),
        r#"select "x"::int from "t""#
    );

    // Both spellings parse to the same node, so both follow the style.
    assert_eq!(
        oneline_with(&postgres, "SELECT x::int FROM t"),
        r#"select "x"::int from "t""#
    );
}

#[test]
fn mysql_preset_identifiers_and_parameters() {
    let formatter = SqlFormatter::preset(FormatPreset::Mysql);
    assert_eq!(
        oneline_with(&formatter, "select id from users where id = :id"),
        "select `id` from `users` where `id` = ?"
    );
}

#[test]
fn sqlserver_preset_brackets() {
    let formatter = SqlFormatter::preset(FormatPreset::Sqlserver);
    assert_eq!(
        oneline_with(&formatter, "select id from users where id = :id"),
        "select [id] from [users] where [id] = @id"
    );
}

#[test]
fn postgres_preset_indexed_parameters() {
    let formatter = SqlFormatter::preset(FormatPreset::Postgres);
    assert_eq!(
        oneline_with(&formatter, "SELECT :a + :a"),
        "select $1 + $2"
    );
}

#[test]
fn case_comment_promotes_before_keyword() {
    let printed = oneline("select case /*c*/ when x then 1 end");
    assert_eq!(printed, r#"select /* c */ case when "x" then 1 end"#);
}

#[test]
fn case_with_condition_promotes_condition_comment() {
    let printed = oneline("select case /*pick*/ kind when 'a' then 1 else 0 end");
    assert_eq!(
        printed,
        r#"select /* pick */ case "kind" when 'a' then 1 else 0 end"#
    );
}

#[test]
fn paren_comments_sit_adjacent() {
    let printed = oneline("select (/* in */ x /* out */) from t");
    assert_eq!(printed, r#"select (/* in */ "x" /* out */) from "t""#);
}

#[test]
fn inline_comment_follows_select_item() {
    let printed = oneline("select a /* note */, b from t");
    assert_eq!(printed, r#"select "a" /* note */, "b" from "t""#);
}

#[test]
fn comment_sanitization_defangs_delimiters() {
    let printed = oneline("select a /* evil */ from t where b = 1 -- tail */ tricks\n");
    assert!(printed.contains("/* evil */"));
    assert!(printed.contains("/* tail * / tricks */"));
}

#[test]
fn comment_export_can_be_disabled() {
    let formatter = SqlFormatter::new(FormatConfig {
        export_comment: false,
        ..FormatConfig::default()
    });
    let printed = oneline_with(&formatter, "select a /* gone */ from t -- also gone\n");
    assert_eq!(printed, r#"select "a" from "t""#);
}

#[test]
fn join_normalization_orders_by_declaration() {
    let formatter = SqlFormatter::new(FormatConfig {
        join_condition_order_by_declaration: true,
        ..FormatConfig::default()
    });
    let printed = oneline_with(
        &formatter,
        "select * from a inner join b on b.id = a.id and b.x > 1",
    );
    assert_eq!(
        printed,
        r#"select * from "a" inner join "b" on "a"."id" = "b"."id" and "b"."x" > 1"#
    );
}

#[test]
fn join_normalization_respects_aliases_and_parens() {
    let formatter = SqlFormatter::new(FormatConfig {
        join_condition_order_by_declaration: true,
        ..FormatConfig::default()
    });
    let printed = oneline_with(
        &formatter,
        "select * from users u inner join orders o on (o.user_id = u.id)",
    );
    assert!(printed.contains(r#"("u"."id" = "o"."user_id")"#));
}

#[test]
fn join_normalization_off_by_default() {
    let printed = oneline("select * from a inner join b on b.id = a.id");
    assert!(printed.contains(r#"on "b"."id" = "a"."id""#));
}

#[test]
fn merge_statement_renders_all_when_shapes() {
    let printed = oneline(
        "merge into items t using staged s on t.id = s.id \
         when matched and s.qty = 0 then delete \
         when matched then update set qty = s.qty \
         when not matched then insert (id, qty) values (s.id, s.qty) \
         when not matched by source then do nothing",
    );
    let expected = expect![[r#"merge into "items" as "t" using "staged" as "s" on "t"."id" = "s"."id" when matched and "s"."qty" = 0 then delete when matched then update set "qty" = "s"."qty" when not matched then insert ("id", "qty") values ("s"."id", "s"."qty") when not matched by source then do nothing"#]];
    expected.assert_eq(&printed);
}

#[test]
fn constraint_styles_differ_between_postgres_and_mysql() {
    let sql = "create table t (id bigint, constraint t_uniq unique (id))";

    let postgres = oneline(sql);
    assert!(postgres.contains(r#"constraint "t_uniq" unique ("id")"#));

    let mysql = SqlFormatter::preset(FormatPreset::Mysql);
    let printed = oneline_with(&mysql, sql);
    assert!(printed.contains("unique key `t_uniq` (`id`)"));
}

#[test]
fn multiline_layout() {
    let statement = parse_statement(
        "select id, email from users u inner join orders o on o.user_id = u.id \
         where active = true order by id desc limit 10",
    )
    .unwrap();
    let printed = SqlFormatter::default().format_statement(&statement);
    let expected = expect![[r#"
        select
            "id",
            "email"
        from "users" as "u"
        inner join "orders" as "o" on "o"."user_id" = "u"."id"
        where "active" = true
        order by
            "id" desc
        limit 10"#]];
    expected.assert_eq(&printed);
}

#[test]
fn multiline_with_clause_indents_body() {
    let statement = parse_statement(
        "with active as (select id from users where active = true) select id from active",
    )
    .unwrap();
    let printed = SqlFormatter::default().format_statement(&statement);
    let expected = expect![[r#"
        with
            "active" as (
                select
                    "id"
                from "users"
                where "active" = true
            )
        select
            "id"
        from "active""#]];
    expected.assert_eq(&printed);
}

#[test]
fn values_rows_break_when_elements_carry_comments() {
    let inline = oneline("insert into t values (1, 'a'), (2, 'b')");
    assert!(inline.contains("values (1, 'a'), (2, 'b')"));

    let statement =
        parse_statement("insert into t values (/* first */ 1, 'a'), (2, 'b')").unwrap();
    let printed = SqlFormatter::default().format_statement(&statement);
    let expected = expect![[r#"
        insert into "t" values
            (/* first */ 1, 'a'),
            (2, 'b')"#]];
    expected.assert_eq(&printed);
}

#[test]
fn header_comments_render_first() {
    let printed = SqlFormatter::default()
        .format_statement(&parse_statement("-- daily report\nselect 1").unwrap());
    let expected = expect![[r#"
        /* daily report */
        select
            1"#]];
    expected.assert_eq(&printed);
}

#[test]
fn header_separator_lines_merge_into_one_block() {
    let printed = SqlFormatter::default().format_statement(
        &parse_statement("-- ====\n-- daily report\n-- ====\nselect 1").unwrap(),
    );
    let expected = expect![[r#"
        /*
          ====
          daily report
          ====
        */
        select
            1"#]];
    expected.assert_eq(&printed);
}

#[test]
fn explain_and_ddl_render() {
    assert_eq!(
        oneline("explain (analyze, verbose) select 1"),
        "explain (analyze, verbose) select 1"
    );
    assert_eq!(
        oneline("drop table if exists a, b cascade"),
        r#"drop table if exists "a", "b" cascade"#
    );
    assert_eq!(
        oneline("create sequence if not exists s increment by 2 start with 10 cycle"),
        r#"create sequence if not exists "s" increment by 2 start with 10 cycle"#
    );
    assert_eq!(
        oneline("alter table only t drop column if exists old cascade"),
        r#"alter table only "t" drop column if exists "old" cascade"#
    );
}
