//! Domain types shared by the collector, formatter and generators

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Facts about a real column, derived from the key and index sets
    /// collected in the same pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ColumnFlags: u8 {
        const NOT_NULL = 1;
        const INDEXED = 1 << 1;
        const PRIMARY_KEY_MEMBER = 1 << 2;
        const FOREIGN_KEY_MEMBER = 1 << 3;
    }
}

/// What a [`ColumnFact`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Column,
    PrimaryKey,
    ForeignKey,
    Index,
    UniqueIndex,
}

/// One real column, or one synthetic row summarizing a constraint or index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFact {
    pub name: String,
    /// Upper-cased formatted type for columns; the display summary of the
    /// definition for constraints and indexes.
    pub declared_type: String,
    pub kind: ColumnKind,
    pub flags: ColumnFlags,
    pub default_expression: Option<String>,
    /// Raw catalog definition, present when `kind != Column`
    pub definition_text: Option<String>,
}

impl ColumnFact {
    pub fn column(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            kind: ColumnKind::Column,
            flags: ColumnFlags::empty(),
            default_expression: None,
            definition_text: None,
        }
    }

    pub fn constraint(
        kind: ColumnKind,
        name: impl Into<String>,
        summary: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: summary.into(),
            kind,
            flags: ColumnFlags::empty(),
            default_expression: None,
            definition_text: Some(definition.into()),
        }
    }

    pub fn with_flags(mut self, flags: ColumnFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_default(mut self, default_expression: Option<String>) -> Self {
        self.default_expression = default_expression;
        self
    }

    pub fn is_column(&self) -> bool {
        self.kind == ColumnKind::Column
    }

    pub fn is_nullable(&self) -> bool {
        !self.flags.contains(ColumnFlags::NOT_NULL)
    }
}

/// Column names taken from one or more definitions. Membership only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyColumnSet(BTreeSet<String>);

impl KeyColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    pub fn extend<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(columns.into_iter().map(Into::into));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for KeyColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Kind of catalog object being introspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Table,
    View,
    MaterializedView,
    ForeignTable,
    Function,
}

impl ObjectKind {
    /// Keyword used in `DROP <keyword>` and similar statements
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::MaterializedView => "MATERIALIZED VIEW",
            ObjectKind::ForeignTable => "FOREIGN TABLE",
            ObjectKind::Function => "FUNCTION",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::MaterializedView => "materialized-view",
            ObjectKind::ForeignTable => "foreign-table",
            ObjectKind::Function => "function",
        };
        f.write_str(name)
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "table" => Ok(ObjectKind::Table),
            "view" => Ok(ObjectKind::View),
            "materialized-view" | "matview" => Ok(ObjectKind::MaterializedView),
            "foreign-table" => Ok(ObjectKind::ForeignTable),
            "function" => Ok(ObjectKind::Function),
            other => Err(format!("unknown object kind '{}'", other)),
        }
    }
}

/// Identity of the object an operation works on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
    /// Disambiguates overloaded functions
    pub function_oid: Option<u32>,
}

impl ObjectRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind,
            function_oid: None,
        }
    }

    pub fn table(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(schema, name, ObjectKind::Table)
    }

    pub fn function(schema: impl Into<String>, name: impl Into<String>, oid: Option<u32>) -> Self {
        Self {
            function_oid: oid,
            ..Self::new(schema, name, ObjectKind::Function)
        }
    }

    /// `"schema"."name"`, with embedded quotes doubled.
    pub fn qualified_name(&self) -> String {
        crate::statements::qualified_name(&self.schema, &self.name)
    }

    /// Objects in `pg_catalog` and `information_schema` are offered read-only
    /// actions only.
    pub fn is_system(&self) -> bool {
        matches!(self.schema.as_str(), "pg_catalog" | "information_schema")
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_kind_round_trips_through_display() {
        for kind in [
            ObjectKind::Table,
            ObjectKind::View,
            ObjectKind::MaterializedView,
            ObjectKind::ForeignTable,
            ObjectKind::Function,
        ] {
            assert_eq!(kind.to_string().parse::<ObjectKind>(), Ok(kind));
        }
        assert!("sequence".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn qualified_name_escapes_quotes() {
        let object = ObjectRef::table("public", "odd\"name");
        assert_eq!(object.qualified_name(), "\"public\".\"odd\"\"name\"");
    }

    #[test]
    fn nullable_follows_not_null_flag() {
        let fact = ColumnFact::column("id", "INTEGER").with_flags(ColumnFlags::NOT_NULL);
        assert!(!fact.is_nullable());
        assert!(ColumnFact::column("total", "NUMERIC").is_nullable());
    }
}
