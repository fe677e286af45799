//! Projection of column facts into display nodes for a tree view.

use crate::descriptor::{format_label, padding_width, tooltip};
use crate::{ColumnFact, ColumnFlags, ColumnKind};
use serde::Serialize;

/// One child node under a table, view or function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub label: String,
    pub tooltip: String,
    pub icon: String,
}

/// Icon key for a fact.
///
/// Real columns get `Column_FPIN`, four 0/1 digits for foreign key member,
/// primary key member, indexed and not null.
pub fn icon_key(fact: &ColumnFact) -> String {
    match fact.kind {
        ColumnKind::PrimaryKey => "Primary_Key".to_string(),
        ColumnKind::ForeignKey => "Foreign_Key".to_string(),
        ColumnKind::Index => "Index".to_string(),
        ColumnKind::UniqueIndex => "Unique_Index".to_string(),
        ColumnKind::Column => {
            let digit = |flag: ColumnFlags| if fact.flags.contains(flag) { '1' } else { '0' };
            format!(
                "Column_{}{}{}{}",
                digit(ColumnFlags::FOREIGN_KEY_MEMBER),
                digit(ColumnFlags::PRIMARY_KEY_MEMBER),
                digit(ColumnFlags::INDEXED),
                digit(ColumnFlags::NOT_NULL),
            )
        }
    }
}

/// Project `facts` into nodes, aligning labels on the widest name.
pub fn project(facts: &[ColumnFact]) -> Vec<TreeNode> {
    let width = padding_width(facts);
    facts
        .iter()
        .map(|fact| TreeNode {
            label: format_label(fact, width),
            tooltip: tooltip(fact),
            icon: icon_key(fact),
        })
        .collect()
}
