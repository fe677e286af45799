//! Display text for column facts.

use crate::{ColumnFact, ColumnFlags, ColumnKind};

/// `name` padded to `padding_width` chars, then two spaces and the type.
/// The type part is omitted when the type is empty.
pub fn format_label(fact: &ColumnFact, padding_width: usize) -> String {
    if fact.declared_type.is_empty() {
        format!("{:<width$}", fact.name, width = padding_width)
    } else {
        format!(
            "{:<width$}  {}",
            fact.name,
            fact.declared_type,
            width = padding_width
        )
    }
}

/// Longest name in `facts`, in chars.
pub fn padding_width(facts: &[ColumnFact]) -> usize {
    facts
        .iter()
        .map(|fact| fact.name.chars().count())
        .max()
        .unwrap_or(0)
}

/// Multi-line hover text for a fact.
pub fn tooltip(fact: &ColumnFact) -> String {
    let definition = fact.definition_text.as_deref().unwrap_or_default();

    let lines: Vec<String> = match fact.kind {
        ColumnKind::Column => {
            let mut lines = vec![
                format!("Column: {}", fact.name),
                format!("Type: {}", fact.declared_type),
                format!("Nullable: {}", if fact.is_nullable() { "Yes" } else { "No" }),
            ];
            if let Some(default) = &fact.default_expression {
                lines.push(format!("Default: {}", default));
            }
            if fact.flags.contains(ColumnFlags::PRIMARY_KEY_MEMBER) {
                lines.push("Primary Key Member".to_string());
            }
            if fact.flags.contains(ColumnFlags::FOREIGN_KEY_MEMBER) {
                lines.push("Foreign Key Member".to_string());
            }
            lines
        }
        ColumnKind::PrimaryKey => vec![
            format!("Primary Key Constraint: {}", fact.name),
            format!("Definition: {}", definition),
        ],
        ColumnKind::ForeignKey => vec![
            format!("Foreign Key Constraint: {}", fact.name),
            format!("Definition: {}", definition),
        ],
        ColumnKind::Index | ColumnKind::UniqueIndex => vec![
            format!("Index: {}", fact.name),
            format!(
                "Type: {}",
                if fact.kind == ColumnKind::UniqueIndex {
                    "Unique"
                } else {
                    "Non-Unique"
                }
            ),
            format!("Definition: {}", definition),
        ],
    };

    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_align_on_the_widest_name() {
        let facts = vec![
            ColumnFact::column("id", "INTEGER"),
            ColumnFact::column("customer_id", "BIGINT"),
        ];
        let width = padding_width(&facts);

        assert_eq!(width, 11);
        assert_eq!(format_label(&facts[0], width), "id           INTEGER");
        assert_eq!(format_label(&facts[1], width), "customer_id  BIGINT");
    }

    #[test]
    fn empty_type_drops_separator() {
        let fact = ColumnFact::column("INTEGER", "");
        assert_eq!(format_label(&fact, 3), "INTEGER");
        assert_eq!(format_label(&fact, 9), "INTEGER  ");
    }

    #[test]
    fn width_counts_chars_not_bytes() {
        let facts = vec![ColumnFact::column("größe", "TEXT")];
        assert_eq!(padding_width(&facts), 5);
    }

    #[test]
    fn padding_width_of_nothing_is_zero() {
        assert_eq!(padding_width(&[]), 0);
    }

    #[test]
    fn column_tooltip() {
        let fact = ColumnFact::column("id", "INTEGER")
            .with_flags(ColumnFlags::NOT_NULL | ColumnFlags::PRIMARY_KEY_MEMBER)
            .with_default(Some("nextval('orders_id_seq'::regclass)".into()));

        assert_eq!(
            tooltip(&fact),
            "Column: id\n\
             Type: INTEGER\n\
             Nullable: No\n\
             Default: nextval('orders_id_seq'::regclass)\n\
             Primary Key Member"
        );
    }

    #[test]
    fn index_tooltip() {
        let fact = ColumnFact::constraint(
            ColumnKind::UniqueIndex,
            "orders_pkey",
            "(id)",
            "CREATE UNIQUE INDEX orders_pkey ON public.orders USING btree (id)",
        );

        assert_eq!(
            tooltip(&fact),
            "Index: orders_pkey\n\
             Type: Unique\n\
             Definition: CREATE UNIQUE INDEX orders_pkey ON public.orders USING btree (id)"
        );
    }

    #[test]
    fn foreign_key_tooltip_shows_raw_definition() {
        let fact = ColumnFact::constraint(
            ColumnKind::ForeignKey,
            "orders_customer_fk",
            "(customer_id) -> crm.customers(id)",
            "FOREIGN KEY (customer_id) REFERENCES crm.customers(id)",
        );

        assert_eq!(
            tooltip(&fact),
            "Foreign Key Constraint: orders_customer_fk\n\
             Definition: FOREIGN KEY (customer_id) REFERENCES crm.customers(id)"
        );
    }
}
