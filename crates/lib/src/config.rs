use smol_str::SmolStr;
pub use sqlforge_lib_core::lexer::EscapePair;

/// How parameters are spelled in emitted SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterStyle {
    /// `?` — the prefix alone; the index advances silently.
    Anonymous,
    /// `$1`, `$2`, ... — prefix plus the 1-based emit index.
    Indexed,
    /// `:name`, `@name`, `${name}` — prefix, name, optional suffix.
    #[default]
    Named,
}

/// The parameter prefix, with an optional closing suffix for
/// `${name}`-style delimited spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSymbol {
    pub prefix: SmolStr,
    pub suffix: Option<SmolStr>,
}

impl ParameterSymbol {
    pub fn prefix_only(prefix: &str) -> Self {
        ParameterSymbol {
            prefix: SmolStr::new(prefix),
            suffix: None,
        }
    }

    pub fn delimited(prefix: &str, suffix: &str) -> Self {
        ParameterSymbol {
            prefix: SmolStr::new(prefix),
            suffix: Some(SmolStr::new(suffix)),
        }
    }
}

impl Default for ParameterSymbol {
    fn default() -> Self {
        ParameterSymbol::prefix_only(":")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CastStyle {
    /// `cast(expr as type)`.
    #[default]
    Standard,
    /// `expr::type`.
    Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintStyle {
    /// `constraint name unique (...)`.
    #[default]
    Postgres,
    /// `unique key name (...)` with the name inlined after the kind.
    Mysql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordCase {
    #[default]
    Lower,
    Upper,
}

/// Everything the emitter and printer need to target one dialect.
/// Always passed explicitly; the only module-level state is the
/// read-only preset table.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatConfig {
    pub identifier_escape: EscapePair,
    pub parameter_symbol: ParameterSymbol,
    pub parameter_style: ParameterStyle,
    pub cast_style: CastStyle,
    pub constraint_style: ConstraintStyle,
    pub keyword_case: KeywordCase,
    /// Reorder `a.x = b.x` JOIN-ON operands so the earlier-declared
    /// FROM source is on the left.
    pub join_condition_order_by_declaration: bool,
    /// When off, comment tokens are suppressed entirely.
    pub export_comment: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            identifier_escape: EscapePair::DOUBLE_QUOTE,
            parameter_symbol: ParameterSymbol::default(),
            parameter_style: ParameterStyle::default(),
            cast_style: CastStyle::default(),
            constraint_style: ConstraintStyle::default(),
            keyword_case: KeywordCase::default(),
            join_condition_order_by_declaration: false,
            export_comment: true,
        }
    }
}
