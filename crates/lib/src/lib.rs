pub mod analysis;
pub mod builder;
pub mod config;
pub mod emitter;
pub mod fluent;
pub mod presets;
pub mod printer;
pub mod restorer;
pub mod tokens;

use sqlforge_lib_core::ast::Statement;
use sqlforge_lib_core::ast::expr::ValueExpr;
use sqlforge_lib_core::ast::query::{Query, SimpleSelect};

use crate::config::FormatConfig;
use crate::emitter::TokenEmitter;
use crate::presets::FormatPreset;
use crate::printer::{LinePrinter, PrintMode};

/// The front door: configuration in, SQL text out. A formatter is
/// cheap to build and holds no mutable state between calls.
#[derive(Debug, Clone)]
pub struct SqlFormatter {
    cfg: FormatConfig,
}

impl Default for SqlFormatter {
    fn default() -> Self {
        SqlFormatter::new(FormatConfig::default())
    }
}

impl SqlFormatter {
    pub fn new(cfg: FormatConfig) -> Self {
        SqlFormatter { cfg }
    }

    pub fn preset(preset: FormatPreset) -> Self {
        SqlFormatter::new(preset.config())
    }

    pub fn config(&self) -> &FormatConfig {
        &self.cfg
    }

    pub fn format_statement(&self, statement: &Statement) -> String {
        self.print_statement(statement, PrintMode::Multiline)
    }

    pub fn format_statement_oneline(&self, statement: &Statement) -> String {
        self.print_statement(statement, PrintMode::Oneliner)
    }

    pub fn format_query(&self, query: &Query) -> String {
        let tokens = TokenEmitter::new(self.cfg.clone()).emit_query(query);
        LinePrinter::default().print(&tokens, PrintMode::Multiline)
    }

    pub fn format_query_oneline(&self, query: &Query) -> String {
        let tokens = TokenEmitter::new(self.cfg.clone()).emit_query(query);
        LinePrinter::default().print(&tokens, PrintMode::Oneliner)
    }

    pub fn format_select_oneline(&self, select: &SimpleSelect) -> String {
        self.format_query_oneline(&Query::Select(Box::new(select.clone())))
    }

    /// Render a single value expression, oneline. Used by the
    /// expression-rewrite helpers to round expressions through text.
    pub fn format_expr(&self, expr: &ValueExpr) -> String {
        let mut emitter = TokenEmitter::new(self.cfg.clone());
        let mut expr = expr.clone();
        let mut tokens = Vec::new();
        emitter.value_expr(&mut expr, &mut tokens);
        LinePrinter::default().print(&tokens, PrintMode::Oneliner)
    }

    fn print_statement(&self, statement: &Statement, mode: PrintMode) -> String {
        let tokens = TokenEmitter::new(self.cfg.clone()).emit_statement(statement);
        LinePrinter::default().print(&tokens, mode)
    }
}
