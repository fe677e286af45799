//! Column fact collection.
//!
//! One [`ColumnFactCollector::collect`] call issues its catalog queries one
//! after another on the caller's connection: primary keys, foreign keys,
//! indexes, then the base columns, which are tagged from the three key sets
//! gathered just before. Any failing query aborts the whole pass.

use crate::definition::{parse_foreign_key, parse_index, parse_primary_key};
use crate::queries;
use crate::{ColumnFact, ColumnFlags, ColumnKind, KeyColumnSet, ObjectKind, ObjectRef};
use pgscope_core::{Connection, Result, Value};
use std::collections::HashSet;

/// Column sets gathered from one object's constraints and indexes.
#[derive(Debug, Clone, Default)]
pub struct KeySets {
    pub primary: KeyColumnSet,
    pub foreign: KeyColumnSet,
    pub indexed: KeyColumnSet,
}

impl KeySets {
    /// Flags implied for `column` by set membership, without `NOT_NULL`.
    pub fn flags_for(&self, column: &str) -> ColumnFlags {
        let mut flags = ColumnFlags::empty();
        if self.indexed.contains(column) {
            flags |= ColumnFlags::INDEXED;
        }
        if self.primary.contains(column) {
            flags |= ColumnFlags::PRIMARY_KEY_MEMBER;
        }
        if self.foreign.contains(column) {
            flags |= ColumnFlags::FOREIGN_KEY_MEMBER;
        }
        flags
    }
}

/// Builds the ordered [`ColumnFact`] list for a table, view, foreign table or
/// function.
pub struct ColumnFactCollector<'a> {
    conn: &'a dyn Connection,
}

impl<'a> ColumnFactCollector<'a> {
    pub fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    /// Collect the facts for `object`.
    ///
    /// Real columns come first in attribute order, followed by one synthetic
    /// fact per primary key, foreign key and index. An object without columns
    /// yields an empty list.
    #[tracing::instrument(skip(self, object), fields(object = %object, kind = %object.kind))]
    pub async fn collect(&self, object: &ObjectRef) -> Result<Vec<ColumnFact>> {
        let facts = match object.kind {
            ObjectKind::Function => self.collect_function_arguments(object).await?,
            ObjectKind::ForeignTable => self.collect_columns(object, &KeySets::default()).await?,
            ObjectKind::Table | ObjectKind::View | ObjectKind::MaterializedView => {
                let mut synthetic = Vec::new();
                let keys = KeySets {
                    primary: self.collect_primary_keys(object, &mut synthetic).await?,
                    foreign: self.collect_foreign_keys(object, &mut synthetic).await?,
                    indexed: self.collect_indexes(object, &mut synthetic).await?,
                };

                let mut facts = self.collect_columns(object, &keys).await?;
                // Keys and indexes are only shown alongside the columns they cover
                if !facts.is_empty() {
                    facts.extend(synthetic);
                }
                facts
            }
        };

        tracing::debug!(fact_count = facts.len(), "column facts collected");
        Ok(facts)
    }

    async fn collect_primary_keys(
        &self,
        object: &ObjectRef,
        facts: &mut Vec<ColumnFact>,
    ) -> Result<KeyColumnSet> {
        let result = self
            .conn
            .query(queries::PRIMARY_KEYS, &identity_params(object))
            .await?;

        let mut columns = KeyColumnSet::new();
        for row in &result.rows {
            let name = row.text("constraint_name").unwrap_or_default();
            let definition = row.text("constraint_definition").unwrap_or_default();

            let parsed = parse_primary_key(definition);
            columns.extend(parsed.columns);
            facts.push(ColumnFact::constraint(
                ColumnKind::PrimaryKey,
                name,
                parsed.display,
                definition,
            ));
        }
        Ok(columns)
    }

    async fn collect_foreign_keys(
        &self,
        object: &ObjectRef,
        facts: &mut Vec<ColumnFact>,
    ) -> Result<KeyColumnSet> {
        let result = self
            .conn
            .query(queries::FOREIGN_KEYS, &identity_params(object))
            .await?;

        let mut columns = KeyColumnSet::new();
        for row in &result.rows {
            let name = row.text("constraint_name").unwrap_or_default();
            let definition = row.text("constraint_definition").unwrap_or_default();

            let parsed = parse_foreign_key(definition);
            columns.extend(parsed.columns);
            facts.push(ColumnFact::constraint(
                ColumnKind::ForeignKey,
                name,
                parsed.display,
                definition,
            ));
        }
        Ok(columns)
    }

    async fn collect_indexes(
        &self,
        object: &ObjectRef,
        facts: &mut Vec<ColumnFact>,
    ) -> Result<KeyColumnSet> {
        let result = self
            .conn
            .query(queries::INDEXES, &identity_params(object))
            .await?;

        let mut columns = KeyColumnSet::new();
        let mut seen = HashSet::new();
        for row in &result.rows {
            let name = row.text("indexname").unwrap_or_default();
            if !seen.insert(name.to_string()) {
                continue;
            }
            let definition = row.text("indexdef").unwrap_or_default();

            let parsed = parse_index(definition);
            let kind = parsed.kind();
            columns.extend(parsed.definition.columns);
            facts.push(ColumnFact::constraint(
                kind,
                name,
                parsed.definition.display,
                definition,
            ));
        }
        Ok(columns)
    }

    async fn collect_columns(&self, object: &ObjectRef, keys: &KeySets) -> Result<Vec<ColumnFact>> {
        let result = self
            .conn
            .query(queries::COLUMNS, &identity_params(object))
            .await?;

        let facts = result
            .rows
            .iter()
            .map(|row| {
                let name = row.text("column_name").unwrap_or_default();
                let data_type = row.text("data_type").unwrap_or_default().to_uppercase();
                let nullable = row.flag("is_nullable").unwrap_or(true);

                let mut flags = keys.flags_for(name);
                if !nullable {
                    flags |= ColumnFlags::NOT_NULL;
                }

                ColumnFact::column(name, data_type)
                    .with_flags(flags)
                    .with_default(row.text("column_default").map(str::to_string))
            })
            .collect();
        Ok(facts)
    }

    async fn collect_function_arguments(&self, object: &ObjectRef) -> Result<Vec<ColumnFact>> {
        let params = [
            Value::from(object.schema.as_str()),
            Value::from(object.name.as_str()),
            Value::from(object.function_oid),
        ];
        let result = self
            .conn
            .query(queries::FUNCTION_ARGUMENTS, &params)
            .await?;

        // Without an oid every overload matches; the lowest oid wins
        Ok(result
            .rows
            .first()
            .and_then(|row| row.text("function_arguments"))
            .map(parse_function_arguments)
            .unwrap_or_default())
    }
}

fn identity_params(object: &ObjectRef) -> [Value; 2] {
    [
        Value::from(object.schema.as_str()),
        Value::from(object.name.as_str()),
    ]
}

/// Split a `pg_get_function_arguments` string into one fact per argument.
///
/// A trailing `DEFAULT <expr>` is dropped, then each argument is split on its
/// last whitespace into name and upper-cased type. An argument with no whitespace becomes a name-only fact, its name
/// upper-cased. Commas inside type modifiers such as `numeric(10,2)` are not
/// recognized.
pub fn parse_function_arguments(arguments: &str) -> Vec<ColumnFact> {
    arguments
        .split(',')
        .map(str::trim)
        .map(|argument| {
            argument
                .split_once(" DEFAULT ")
                .map_or(argument, |(declaration, _)| declaration.trim_end())
        })
        .filter(|argument| !argument.is_empty())
        .map(|argument| match argument.rsplit_once(char::is_whitespace) {
            Some((name, data_type)) => ColumnFact::column(name.trim_end(), data_type.to_uppercase()),
            None => ColumnFact::column(argument.to_uppercase(), ""),
        })
        .collect()
}

/// Parenthesized argument-type list for `DROP FUNCTION`, e.g. `(INTEGER, TEXT)`.
///
/// Returns `()` when the function has no arguments or the lookup fails.
#[tracing::instrument(skip(conn, object), fields(object = %object))]
pub async fn function_signature(conn: &dyn Connection, object: &ObjectRef) -> String {
    let facts = match ColumnFactCollector::new(conn).collect(object).await {
        Ok(facts) => facts,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read function arguments");
            return "()".to_string();
        }
    };

    let types: Vec<&str> = facts
        .iter()
        .map(|fact| {
            if fact.declared_type.is_empty() {
                fact.name.as_str()
            } else {
                fact.declared_type.as_str()
            }
        })
        .collect();
    format!("({})", types.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_arguments_on_last_whitespace() {
        let facts = parse_function_arguments("customer_id integer, OUT total numeric, label text");
        let pairs: Vec<(&str, &str)> = facts
            .iter()
            .map(|f| (f.name.as_str(), f.declared_type.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("customer_id", "INTEGER"),
                ("OUT total", "NUMERIC"),
                ("label", "TEXT"),
            ]
        );
    }

    #[test]
    fn default_values_are_not_part_of_the_type() {
        let facts = parse_function_arguments("a integer DEFAULT 5, b text DEFAULT 'x y'::text");
        let pairs: Vec<(&str, &str)> = facts
            .iter()
            .map(|f| (f.name.as_str(), f.declared_type.as_str()))
            .collect();

        assert_eq!(pairs, vec![("a", "INTEGER"), ("b", "TEXT")]);
    }

    #[test]
    fn unnamed_argument_is_name_only() {
        let facts = parse_function_arguments("integer");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].name, "INTEGER");
        assert_eq!(facts[0].declared_type, "");
    }

    #[test]
    fn empty_argument_list_has_no_facts() {
        assert!(parse_function_arguments("").is_empty());
        assert!(parse_function_arguments(" , ").is_empty());
    }

    #[test]
    fn key_sets_map_to_flags() {
        let keys = KeySets {
            primary: ["id"].into_iter().collect(),
            foreign: ["customer_id"].into_iter().collect(),
            indexed: ["id", "customer_id"].into_iter().collect(),
        };

        assert_eq!(
            keys.flags_for("id"),
            ColumnFlags::PRIMARY_KEY_MEMBER | ColumnFlags::INDEXED
        );
        assert_eq!(
            keys.flags_for("customer_id"),
            ColumnFlags::FOREIGN_KEY_MEMBER | ColumnFlags::INDEXED
        );
        assert_eq!(keys.flags_for("total"), ColumnFlags::empty());
    }
}
