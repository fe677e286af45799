//! Column extraction from constraint and index definitions.
//!
//! Definitions come from `pg_get_constraintdef` and `pg_indexes.indexdef`.
//! They are read with fixed text patterns, not a SQL parser: only the first
//! parenthesis group is looked at, so expression indexes with nested
//! parentheses yield the expression text rather than column names. A
//! definition that matches nothing yields no columns and is displayed as-is.

use crate::{ColumnKind, KeyColumnSet};
use regex::Regex;
use std::sync::LazyLock;

static PRIMARY_KEY_COLUMNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)PRIMARY KEY \((.+?)\)").expect("valid regex"));

static FOREIGN_KEY_COLUMNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)FOREIGN KEY \((.+?)\) REFERENCES").expect("valid regex"));

static FOREIGN_KEY_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)REFERENCES (.+)").expect("valid regex"));

static INDEX_COLUMNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\((.+?)\)").expect("valid regex"));

const UNIQUE_INDEX_PREFIX: &str = "CREATE UNIQUE INDEX";

/// What was extracted from one definition string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDefinition {
    /// Participating columns in definition order, de-quoted
    pub columns: Vec<String>,
    /// Text shown next to the constraint or index name
    pub display: String,
}

impl ParsedDefinition {
    pub fn key_columns(&self) -> KeyColumnSet {
        self.columns.iter().cloned().collect()
    }
}

/// An index definition plus its uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIndex {
    pub unique: bool,
    pub definition: ParsedDefinition,
}

impl ParsedIndex {
    pub fn kind(&self) -> ColumnKind {
        if self.unique {
            ColumnKind::UniqueIndex
        } else {
            ColumnKind::Index
        }
    }
}

/// Parse `PRIMARY KEY (...)`. The display text is the definition verbatim.
pub fn parse_primary_key(definition: &str) -> ParsedDefinition {
    let columns = PRIMARY_KEY_COLUMNS
        .captures(definition)
        .and_then(|caps| caps.get(1))
        .map(|list| split_column_list(list.as_str()))
        .unwrap_or_default();

    ParsedDefinition {
        columns,
        display: definition.to_string(),
    }
}

/// Parse `FOREIGN KEY (...) REFERENCES ...` into its local columns and a
/// `(cols) -> target` summary.
pub fn parse_foreign_key(definition: &str) -> ParsedDefinition {
    let Some(list) = FOREIGN_KEY_COLUMNS
        .captures(definition)
        .and_then(|caps| caps.get(1))
    else {
        return ParsedDefinition {
            columns: Vec::new(),
            display: definition.to_string(),
        };
    };

    let list = list.as_str().trim();
    let display = match FOREIGN_KEY_TARGET
        .captures(definition)
        .and_then(|caps| caps.get(1))
    {
        Some(target) => format!("({}) -> {}", list, target.as_str().trim()),
        None => definition.to_string(),
    };

    ParsedDefinition {
        columns: split_column_list(list),
        display,
    }
}

/// Parse a `CREATE [UNIQUE] INDEX ... (...)` definition. The display text is
/// the column group in parentheses.
pub fn parse_index(definition: &str) -> ParsedIndex {
    let unique = definition
        .get(..UNIQUE_INDEX_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(UNIQUE_INDEX_PREFIX));

    let definition = match INDEX_COLUMNS.captures(definition).and_then(|caps| caps.get(1)) {
        Some(list) => ParsedDefinition {
            columns: split_column_list(list.as_str()),
            display: format!("({})", list.as_str()),
        },
        None => ParsedDefinition {
            columns: Vec::new(),
            display: definition.to_string(),
        },
    };

    ParsedIndex { unique, definition }
}

/// Split `"a", b ,c` into `[a, b, c]`.
fn split_column_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|entry| entry.trim().trim_matches('"'))
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
