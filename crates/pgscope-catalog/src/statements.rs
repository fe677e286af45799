//! SQL statement templates offered for an object or one of its columns.

use crate::{ObjectKind, ObjectRef};

/// Row limit used by [`select_sample`].
pub const SAMPLE_ROWS: usize = 100;

/// Placeholder the user replaces in [`alter_column_type`].
pub const DATA_TYPE_PLACEHOLDER: &str = "<DATA_TYPE>";

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `"schema"."name"`
pub fn qualified_name(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Drop behavior for dependent objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropBehavior {
    /// No clause; the server default applies
    Default,
    Restrict,
    Cascade,
}

/// Statements that can be generated for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAction {
    SelectAll,
    SelectSample,
    ExportJson,
    ExportCsv,
    CreateTable,
    RefreshMaterializedView,
    Drop(DropBehavior),
}

/// Statements that can be generated for one column of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAction {
    SelectDistinct,
    AlterType,
    DropColumn,
}

/// The object-level actions that apply to `object`.
pub fn available_actions(object: &ObjectRef) -> Vec<ObjectAction> {
    let mut actions = Vec::new();

    if object.kind != ObjectKind::Function {
        actions.extend([
            ObjectAction::SelectAll,
            ObjectAction::SelectSample,
            ObjectAction::ExportJson,
            ObjectAction::ExportCsv,
        ]);
    }

    if object.kind == ObjectKind::Table && !object.is_system() {
        actions.push(ObjectAction::CreateTable);
    }

    match object.kind {
        ObjectKind::MaterializedView => actions.extend([
            ObjectAction::RefreshMaterializedView,
            ObjectAction::Drop(DropBehavior::Default),
        ]),
        ObjectKind::ForeignTable => {}
        _ if !object.is_system() => actions.extend([
            ObjectAction::Drop(DropBehavior::Restrict),
            ObjectAction::Drop(DropBehavior::Cascade),
        ]),
        _ => {}
    }

    actions
}

/// The column-level actions that apply to columns of `object`. Functions
/// have no column actions.
pub fn available_column_actions(object: &ObjectRef) -> Vec<ColumnAction> {
    match object.kind {
        ObjectKind::Function => Vec::new(),
        ObjectKind::Table | ObjectKind::ForeignTable => vec![
            ColumnAction::SelectDistinct,
            ColumnAction::AlterType,
            ColumnAction::DropColumn,
        ],
        ObjectKind::View | ObjectKind::MaterializedView => vec![ColumnAction::SelectDistinct],
    }
}

pub fn select_all(object: &ObjectRef) -> String {
    format!("SELECT * FROM {};", object.qualified_name())
}

pub fn select_sample(object: &ObjectRef) -> String {
    format!(
        "SELECT * FROM {} FETCH FIRST {} ROWS ONLY;",
        object.qualified_name(),
        SAMPLE_ROWS
    )
}

pub fn select_distinct(object: &ObjectRef, column: &str) -> String {
    let column = quote_ident(column);
    format!(
        "SELECT DISTINCT {} FROM {} ORDER BY {};",
        column,
        object.qualified_name(),
        column
    )
}

pub fn alter_column_type(object: &ObjectRef, column: &str) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
        object.qualified_name(),
        quote_ident(column),
        DATA_TYPE_PLACEHOLDER
    )
}

pub fn drop_column(object: &ObjectRef, column: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {};",
        object.qualified_name(),
        quote_ident(column)
    )
}

/// `DROP <KIND> "schema"."name"[signature] [RESTRICT|CASCADE];`
///
/// `signature` is the parenthesized argument-type list required to drop a
/// function (see [`crate::function_signature`]); it is ignored for other
/// kinds.
pub fn drop_object(object: &ObjectRef, behavior: DropBehavior, signature: Option<&str>) -> String {
    let signature = match object.kind {
        ObjectKind::Function => signature.unwrap_or("()"),
        _ => "",
    };
    let behavior = match behavior {
        DropBehavior::Default => "",
        DropBehavior::Restrict => " RESTRICT",
        DropBehavior::Cascade => " CASCADE",
    };
    format!(
        "DROP {} {}{}{};",
        object.kind.sql_keyword(),
        object.qualified_name(),
        signature,
        behavior
    )
}

pub fn refresh_materialized_view(object: &ObjectRef) -> String {
    format!("REFRESH MATERIALIZED VIEW {};", object.qualified_name())
}
