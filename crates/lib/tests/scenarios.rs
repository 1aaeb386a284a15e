//! End-to-end transformation scenarios: parse, mutate through the
//! fluent surface, emit, and check the printed SQL.

use smol_str::SmolStr;
use sqlforge_lib::SqlFormatter;
use sqlforge_lib::analysis::params::{
    ParameterCollection, collect_bound_parameters, collect_parameters,
};
use sqlforge_lib::builder::MergeOptions;
use sqlforge_lib::config::ParameterStyle;
use sqlforge_lib::fluent::SelectQueryExt;
use sqlforge_lib::presets::FormatPreset;
use sqlforge_lib_core::ast::Statement;
use sqlforge_lib_core::ast::expr::ParamValue;
use sqlforge_lib_core::ast::query::{CteOptions, Query};
use sqlforge_lib_core::parser::{parse_query, parse_select, parse_statement};

#[test]
fn append_where_then_emit_with_postgres_preset() {
    let mut select = parse_select("SELECT id FROM users").unwrap();
    select.append_where_raw("active = true").unwrap();

    let printed = SqlFormatter::preset(FormatPreset::Postgres)
        .format_select_oneline(&select);
    assert_eq!(printed, r#"select "id" from "users" where "active" = true"#);
}

#[test]
fn add_cte_then_union_all() {
    let mut select = parse_select("SELECT id, email FROM users").unwrap();
    select
        .add_cte(
            "active_users",
            parse_query("SELECT id FROM users WHERE active = true").unwrap(),
            CteOptions::default(),
        )
        .unwrap();

    let combined =
        select.to_union_all(parse_query("SELECT id, email FROM legacy_users").unwrap());

    let Query::Binary(binary) = &combined else {
        panic!("expected a set operation");
    };
    let left = binary.left.as_select().unwrap();
    assert!(left.has_cte("active_users"));
    assert_eq!(left.get_cte_names(), vec![SmolStr::new("active_users")]);

    let printed = SqlFormatter::default().format_query_oneline(&combined);
    assert!(printed.starts_with(r#"with "active_users" as (select "id" from "users" where "active" = true)"#));
    assert!(printed.contains("union all"));
}

#[test]
fn parameter_styles_and_binding() {
    let statement = parse_statement("SELECT :a + :a").unwrap();

    // Named collection groups by name.
    let Statement::Query(Query::Select(mut select)) = statement else {
        panic!("expected select");
    };
    select.set_parameter("a", ParamValue::Int(5)).unwrap();
    let statement = Statement::Query(Query::Select(select));

    let collected = collect_parameters(&statement);
    assert_eq!(collected.len(), 2);
    assert!(collected.iter().all(|p| p.value == Some(ParamValue::Int(5))));

    let ParameterCollection::Named(named) =
        collect_bound_parameters(&statement, ParameterStyle::Named).unwrap()
    else {
        panic!("expected named collection");
    };
    assert_eq!(named.len(), 1);
    assert_eq!(named[&SmolStr::new("a")], Some(ParamValue::Int(5)));

    // Indexed emission numbers each occurrence.
    let printed = SqlFormatter::preset(FormatPreset::Postgres)
        .format_statement_oneline(&statement);
    assert_eq!(printed, "select $1 + $2");
}

#[test]
fn override_then_filter_upstream() {
    let mut select = parse_select(
        "with active as (select id, email from users where active = true) \
         select id, email from active",
    )
    .unwrap();

    select
        .override_select_item_expr("email", |expr| format!("lower({expr})"))
        .unwrap();
    select
        .append_where_expr("id", |expr| format!("{expr} > 100"), true)
        .unwrap();

    let printed = SqlFormatter::default().format_select_oneline(&select);
    assert!(printed.contains(r#"lower("email")"#));
    // Both the outer query and the CTE body got the predicate.
    assert_eq!(printed.matches(r#""id" > 100"#).count(), 2);
}

#[test]
fn select_to_insert_to_text() {
    let select = parse_select("select id, email from staged where ok = true").unwrap();
    let insert = select.to_insert("users", Some(vec![SmolStr::new("id"), SmolStr::new("email")]));
    let printed =
        SqlFormatter::default().format_statement_oneline(&Statement::Insert(Box::new(insert)));
    assert_eq!(
        printed,
        r#"insert into "users" ("id", "email") select "id", "email" from "staged" where "ok" = true"#
    );
}

#[test]
fn select_to_merge_to_text() {
    let select = parse_select("select id, qty from staged").unwrap();
    let merge = select
        .to_merge(
            "items",
            MergeOptions {
                target_alias: Some(SmolStr::new("t")),
                source_alias: SmolStr::new("s"),
                key_columns: vec![SmolStr::new("id")],
            },
        )
        .unwrap();

    let printed =
        SqlFormatter::default().format_statement_oneline(&Statement::Merge(Box::new(merge)));
    assert_eq!(
        printed,
        r#"merge into "items" as "t" using (select "id", "qty" from "staged") as "s" on "t"."id" = "s"."id" when matched then update set "qty" = "s"."qty" when not matched then insert ("id", "qty") values ("s"."id", "s"."qty")"#
    );
}

#[test]
fn join_helper_then_normalized_emission() {
    let mut select = parse_select("select id from users u").unwrap();
    select.inner_join("orders", "o", &["id"], None).unwrap();

    let formatter = SqlFormatter::new(sqlforge_lib::config::FormatConfig {
        join_condition_order_by_declaration: true,
        ..Default::default()
    });
    let printed = formatter.format_select_oneline(&select);
    assert!(printed.contains(r#"inner join "orders" as "o" on "id" = "o"."id""#));
}

#[test]
fn cte_name_stability_across_unrelated_edits() {
    let mut select = parse_select(
        "with a as (select 1), b as (select 2) select * from a, b",
    )
    .unwrap();
    let before = select.get_cte_names();
    select.append_where_raw("1 = 1").unwrap();
    assert_eq!(select.get_cte_names(), before);
}
