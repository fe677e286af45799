//! Catalog SQL. Object identity is always bound as `$1` (schema) and `$2`
//! (object name).

pub(crate) const COLUMNS: &str = r#"
SELECT attr.attname AS column_name,
       format_type(attr.atttypid, attr.atttypmod) AS data_type,
       pg_get_expr(def.adbin, def.adrelid) AS column_default,
       NOT attr.attnotnull AS is_nullable
FROM pg_catalog.pg_attribute attr
JOIN pg_catalog.pg_class cls ON cls.oid = attr.attrelid
JOIN pg_catalog.pg_namespace ns ON ns.oid = cls.relnamespace
LEFT JOIN pg_catalog.pg_attrdef def ON def.adrelid = attr.attrelid AND def.adnum = attr.attnum
WHERE ns.nspname = $1
  AND cls.relname = $2
  AND attr.attnum >= 1
  AND NOT attr.attisdropped
ORDER BY attr.attnum
"#;

pub(crate) const PRIMARY_KEYS: &str = r#"
SELECT con.conname AS constraint_name,
       pg_get_constraintdef(con.oid) AS constraint_definition
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class cls ON cls.oid = con.conrelid
JOIN pg_catalog.pg_namespace ns ON ns.oid = con.connamespace
WHERE con.contype = 'p'
  AND ns.nspname = $1
  AND cls.relname = $2
ORDER BY con.conname
"#;

pub(crate) const FOREIGN_KEYS: &str = r#"
SELECT con.conname AS constraint_name,
       pg_get_constraintdef(con.oid) AS constraint_definition
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class cls ON cls.oid = con.conrelid
JOIN pg_catalog.pg_namespace ns ON ns.oid = con.connamespace
WHERE con.contype = 'f'
  AND ns.nspname = $1
  AND cls.relname = $2
ORDER BY con.conname
"#;

pub(crate) const INDEXES: &str = r#"
SELECT indexname, indexdef
FROM pg_catalog.pg_indexes
WHERE schemaname = $1
  AND tablename = $2
ORDER BY indexname
"#;

/// `$3` is the function oid, or NULL for the overload with the lowest oid.
pub(crate) const FUNCTION_ARGUMENTS: &str = r#"
SELECT pg_get_function_arguments(p.oid) AS function_arguments
FROM pg_catalog.pg_proc p
JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
WHERE n.nspname = $1
  AND p.proname = $2
  AND ($3::oid IS NULL OR p.oid = $3::oid)
ORDER BY p.oid
LIMIT 1
"#;

/// One row per ordinary table, carrying the three `CREATE TABLE` fragments
/// already aggregated in catalog order. No row when the relation is missing
/// or is not an ordinary table.
pub(crate) const CREATE_TABLE_FRAGMENTS: &str = r#"
WITH tbl AS (
    SELECT c.oid, n.nspname, c.relname
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1
      AND c.relname = $2
      AND c.relkind = 'r'
),
cols AS (
    SELECT string_agg(
               '    ' || quote_ident(a.attname) || ' ' || format_type(a.atttypid, a.atttypmod)
               || CASE
                      WHEN a.attidentity = 'a' THEN ' GENERATED ALWAYS AS IDENTITY'
                      WHEN a.attidentity = 'd' THEN ' GENERATED BY DEFAULT AS IDENTITY'
                      WHEN a.attgenerated = 's' THEN ' GENERATED ALWAYS AS (' || pg_get_expr(d.adbin, d.adrelid) || ') STORED'
                      WHEN d.adbin IS NOT NULL THEN ' DEFAULT ' || pg_get_expr(d.adbin, d.adrelid)
                      ELSE ''
                  END
               || CASE WHEN a.attnotnull THEN ' NOT NULL' ELSE '' END,
               E',\n' ORDER BY a.attnum
           ) AS column_definitions
    FROM tbl
    JOIN pg_catalog.pg_attribute a ON a.attrelid = tbl.oid
    LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
    WHERE a.attnum > 0
      AND NOT a.attisdropped
),
cons AS (
    SELECT string_agg(
               '    CONSTRAINT ' || quote_ident(con.conname) || ' ' || pg_get_constraintdef(con.oid, true),
               E',\n' ORDER BY con.conname
           ) AS table_constraints
    FROM tbl
    JOIN pg_catalog.pg_constraint con ON con.conrelid = tbl.oid
    WHERE con.contype IN ('p', 'u', 'c', 'f')
),
idx AS (
    SELECT string_agg(pg_get_indexdef(i.indexrelid) || ';', E'\n' ORDER BY i.indexrelid) AS index_statements
    FROM tbl
    JOIN pg_catalog.pg_index i ON i.indrelid = tbl.oid
    WHERE NOT EXISTS (
        SELECT 1
        FROM pg_catalog.pg_constraint c
        WHERE c.conindid = i.indexrelid
          AND c.contype IN ('p', 'u')
    )
)
SELECT '"' || replace(tbl.nspname, '"', '""') || '"."' || replace(tbl.relname, '"', '""') || '"' AS table_name,
       cols.column_definitions,
       cons.table_constraints,
       idx.index_statements
FROM tbl, cols, cons, idx
"#;

/// Whole-table JSON export. `{table}` is an already-quoted qualified name.
pub(crate) fn select_all_as_json(table: &str) -> String {
    format!(
        "SELECT COALESCE(jsonb_pretty(jsonb_agg(to_jsonb(t))), '[]') AS json\nFROM (SELECT * FROM {}) t",
        table
    )
}

/// Whole-table CSV export through `COPY ... TO STDOUT`.
pub(crate) fn copy_all_as_csv(table: &str) -> String {
    format!(
        "COPY (SELECT * FROM {}) TO STDOUT WITH (FORMAT CSV, HEADER TRUE)",
        table
    )
}
