use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::config::{
    CastStyle, ConstraintStyle, EscapePair, FormatConfig, ParameterStyle, ParameterSymbol,
};

/// Named dialect bundles. The table is fixed at compile time and
/// read-only; `config()` hands out a fresh value every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FormatPreset {
    Athena,
    Bigquery,
    Clickhouse,
    Cloudspanner,
    Cockroachdb,
    Db2,
    Duckdb,
    Firebird,
    Flinksql,
    Hive,
    Mariadb,
    Mongodb,
    Mysql,
    Oracle,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
    Sqlserver,
}

impl FormatPreset {
    pub fn config(self) -> FormatConfig {
        let base = FormatConfig::default();
        match self {
            FormatPreset::Mysql => FormatConfig {
                identifier_escape: EscapePair::BACKTICK,
                parameter_symbol: ParameterSymbol::prefix_only("?"),
                parameter_style: ParameterStyle::Anonymous,
                constraint_style: ConstraintStyle::Mysql,
                ..base
            },
            FormatPreset::Mariadb => FormatConfig {
                identifier_escape: EscapePair::BACKTICK,
                parameter_symbol: ParameterSymbol::prefix_only("?"),
                parameter_style: ParameterStyle::Anonymous,
                constraint_style: ConstraintStyle::Mysql,
                ..base
            },
            FormatPreset::Postgres => FormatConfig {
                parameter_symbol: ParameterSymbol::prefix_only("$"),
                parameter_style: ParameterStyle::Indexed,
                cast_style: CastStyle::Postgres,
                ..base
            },
            FormatPreset::Cockroachdb | FormatPreset::Redshift => FormatConfig {
                parameter_symbol: ParameterSymbol::prefix_only("$"),
                parameter_style: ParameterStyle::Indexed,
                cast_style: CastStyle::Postgres,
                ..base
            },
            FormatPreset::Duckdb => FormatConfig {
                parameter_symbol: ParameterSymbol::prefix_only("$"),
                parameter_style: ParameterStyle::Indexed,
                cast_style: CastStyle::Postgres,
                ..base
            },
            FormatPreset::Sqlserver => FormatConfig {
                identifier_escape: EscapePair::BRACKET,
                parameter_symbol: ParameterSymbol::prefix_only("@"),
                ..base
            },
            FormatPreset::Sqlite => FormatConfig {
                parameter_symbol: ParameterSymbol::prefix_only(":"),
                ..base
            },
            FormatPreset::Oracle => FormatConfig {
                parameter_symbol: ParameterSymbol::prefix_only(":"),
                ..base
            },
            FormatPreset::Snowflake => FormatConfig {
                parameter_symbol: ParameterSymbol::prefix_only(":"),
                ..base
            },
            FormatPreset::Clickhouse => FormatConfig {
                identifier_escape: EscapePair::BACKTICK,
                parameter_symbol: ParameterSymbol::delimited("{", "}"),
                ..base
            },
            FormatPreset::Bigquery | FormatPreset::Cloudspanner => FormatConfig {
                identifier_escape: EscapePair::BACKTICK,
                parameter_symbol: ParameterSymbol::prefix_only("@"),
                ..base
            },
            FormatPreset::Hive => FormatConfig {
                identifier_escape: EscapePair::BACKTICK,
                parameter_symbol: ParameterSymbol::delimited("${", "}"),
                ..base
            },
            FormatPreset::Flinksql => FormatConfig {
                identifier_escape: EscapePair::BACKTICK,
                parameter_symbol: ParameterSymbol::prefix_only("?"),
                parameter_style: ParameterStyle::Anonymous,
                ..base
            },
            FormatPreset::Athena | FormatPreset::Db2 | FormatPreset::Firebird => FormatConfig {
                parameter_symbol: ParameterSymbol::prefix_only("?"),
                parameter_style: ParameterStyle::Anonymous,
                ..base
            },
            FormatPreset::Mongodb => FormatConfig {
                parameter_symbol: ParameterSymbol::prefix_only(":"),
                ..base
            },
        }
    }
}

/// Generate a readout of available presets.
pub fn preset_readout() -> Vec<String> {
    FormatPreset::iter()
        .map(|p| p.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn preset_readout_is_alphabetically_sorted() {
        let readout = preset_readout();

        let mut sorted = readout.clone();
        sorted.sort();

        assert_eq!(readout, sorted);
    }

    #[test]
    fn every_preset_produces_a_config() {
        for preset in FormatPreset::iter() {
            let config = preset.config();
            assert!(!config.parameter_symbol.prefix.is_empty());
        }
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for preset in FormatPreset::iter() {
            let name = preset.as_ref();
            assert_eq!(FormatPreset::from_str(name).unwrap(), preset);
        }
    }

    #[test]
    fn postgres_bundle_matches_the_documented_combination() {
        let config = FormatPreset::Postgres.config();
        assert_eq!(config.identifier_escape, EscapePair::DOUBLE_QUOTE);
        assert_eq!(config.parameter_style, ParameterStyle::Indexed);
        assert_eq!(config.parameter_symbol.prefix, "$");
        assert_eq!(config.cast_style, CastStyle::Postgres);
        assert_eq!(config.constraint_style, ConstraintStyle::Postgres);
    }
}
