//! JOIN-ON operand normalization. With
//! `join_condition_order_by_declaration` set, every `=` whose operands
//! are both column references qualified by FROM-declared names is
//! rewritten so the earlier-declared qualifier sits on the left.

use ahash::AHashMap;
use sqlforge_lib_core::ast::expr::ValueExpr;
use sqlforge_lib_core::ast::query::FromClause;

use super::TokenEmitter;

impl TokenEmitter {
    /// Record the declaration order of every source in this FROM
    /// subtree: alias, bare table name and dotted path all map to the
    /// same index, earliest declaration winning on duplicates.
    pub(crate) fn push_join_context(&mut self, from: &FromClause) {
        let mut order: AHashMap<String, usize> = AHashMap::new();
        let mut declare = |names: Vec<String>, index: usize| {
            for name in names {
                order.entry(name).or_insert(index);
            }
        };

        declare(from.source.binding_names(), 0);
        for (i, join) in from.joins.iter().enumerate() {
            declare(join.source.binding_names(), i + 1);
        }

        log::trace!("join-order context: {order:?}");
        self.join_contexts.push(order);
    }

    pub(crate) fn pop_join_context(&mut self) {
        let popped = self.join_contexts.pop();
        debug_assert!(popped.is_some(), "join context stack underflow");
    }

    /// Rewrite qualifying equalities in place. Recurses through AND/OR
    /// trees and parenthesized expressions; everything else is left
    /// untouched.
    pub(crate) fn normalize_join_condition(&self, expr: &mut ValueExpr) {
        let Some(order) = self.join_contexts.last() else {
            return;
        };
        normalize(expr, order);
    }
}

fn normalize(expr: &mut ValueExpr, order: &AHashMap<String, usize>) {
    match expr {
        ValueExpr::Binary(binary) => match binary.op.as_str() {
            "and" | "or" => {
                normalize(&mut binary.left, order);
                normalize(&mut binary.right, order);
            }
            "=" => {
                let left_rank = qualifier_rank(&binary.left, order);
                let right_rank = qualifier_rank(&binary.right, order);
                if let (Some(left), Some(right)) = (left_rank, right_rank)
                    && right < left
                {
                    log::debug!("reordering join equality operands by declaration order");
                    std::mem::swap(&mut binary.left, &mut binary.right);
                }
            }
            _ => {}
        },
        ValueExpr::Paren(paren) => normalize(&mut paren.inner, order),
        _ => {}
    }
}

/// The declaration index of a column operand's qualifier, when the
/// operand is a qualified column reference declared in this FROM.
fn qualifier_rank(expr: &ValueExpr, order: &AHashMap<String, usize>) -> Option<usize> {
    let ValueExpr::Column(column) = expr else {
        return None;
    };
    if column.namespaces.is_empty() {
        return None;
    }
    if let Some(path) = column.qualifier_path()
        && let Some(rank) = order.get(&path)
    {
        return Some(*rank);
    }
    column
        .qualifier()
        .and_then(|q| order.get(q.as_str()))
        .copied()
}
