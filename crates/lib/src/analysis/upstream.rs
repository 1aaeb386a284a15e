//! Upstream SELECT discovery: every SELECT reachable from a root
//! query whose output schema covers a set of column names, through
//! subquery sources, CTE bodies and both branches of set operations.

use smol_str::SmolStr;
use sqlforge_lib_core::ast::query::{Query, SimpleSelect, SourceKind};

pub struct UpstreamSelectQueryFinder {
    columns: Vec<SmolStr>,
}

impl UpstreamSelectQueryFinder {
    pub fn new(columns: impl IntoIterator<Item = impl Into<SmolStr>>) -> Self {
        UpstreamSelectQueryFinder {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Visit every matching SELECT mutably, returning how many were
    /// visited. Traversal is outer-then-inner, left to right.
    pub fn find_mut(&self, query: &mut Query, f: &mut dyn FnMut(&mut SimpleSelect)) -> usize {
        let mut count = 0;
        self.walk_query(query, f, &mut count);
        count
    }

    /// Count matching SELECTs without touching the tree.
    pub fn count(&self, query: &Query) -> usize {
        let mut clone = query.clone();
        self.find_mut(&mut clone, &mut |_| {})
    }

    fn walk_query(
        &self,
        query: &mut Query,
        f: &mut dyn FnMut(&mut SimpleSelect),
        count: &mut usize,
    ) {
        match query {
            Query::Select(select) => self.walk_select(select, f, count),
            Query::Binary(binary) => {
                self.walk_query(&mut binary.left, f, count);
                self.walk_query(&mut binary.right, f, count);
            }
            Query::Values(_) => {}
        }
    }

    fn walk_select(
        &self,
        select: &mut SimpleSelect,
        f: &mut dyn FnMut(&mut SimpleSelect),
        count: &mut usize,
    ) {
        if self.output_covers(select) {
            f(select);
            *count += 1;
        }

        if let Some(with) = &mut select.with {
            for table in &mut with.tables {
                self.walk_query(&mut table.query, f, count);
            }
        }
        if let Some(from) = &mut select.from {
            if let SourceKind::SubQuery(query) = &mut from.source.kind {
                self.walk_query(query, f, count);
            }
            for join in &mut from.joins {
                if let SourceKind::SubQuery(query) = &mut join.source.kind {
                    self.walk_query(query, f, count);
                }
            }
        }
    }

    /// Does the select list surface every target column? A bare `*`
    /// makes the schema open, which counts as covering everything.
    fn output_covers(&self, select: &SimpleSelect) -> bool {
        let mut names: Vec<&SmolStr> = Vec::new();
        let mut open = false;
        for item in &select.select.items {
            match item.output_name() {
                Some(name) if name == "*" => open = true,
                Some(name) => names.push(name),
                None => {}
            }
        }
        if open {
            return true;
        }
        self.columns
            .iter()
            .all(|column| names.iter().any(|name| *name == column))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sqlforge_lib_core::parser::parse_query;

    use super::*;

    #[test]
    fn finds_selects_across_cte_and_subquery() {
        let query = parse_query(
            "with staged as (select id, qty from intake) \
             select id, qty from (select id, qty from staged) s",
        )
        .unwrap();
        let finder = UpstreamSelectQueryFinder::new(["id", "qty"]);
        assert_eq!(finder.count(&query), 3);
    }

    #[test]
    fn missing_column_excludes_a_select() {
        let query = parse_query(
            "select id from (select id, qty from intake) s \
             union all select id from legacy",
        )
        .unwrap();
        let finder = UpstreamSelectQueryFinder::new(["qty"]);
        assert_eq!(finder.count(&query), 1);
    }

    #[test]
    fn wildcard_output_counts_as_covering() {
        let query = parse_query("select * from anything").unwrap();
        let finder = UpstreamSelectQueryFinder::new(["whatever"]);
        assert_eq!(finder.count(&query), 1);
    }
}
