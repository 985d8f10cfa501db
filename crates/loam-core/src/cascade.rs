//! Table-specific dependency rules applied when a parent record is deleted.
//!
//! Referential integrity is not enforced by the store itself; these rules
//! are what keeps dependent records consistent. A rule either soft-deletes
//! the children alongside the parent or blocks the deletion entirely while
//! live children remain.

use crate::models::Table;

/// What to do with dependent records when their parent is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeAction {
    /// Soft-delete children in the same transaction as the parent
    SoftDelete,
    /// Refuse the deletion while live children reference the parent
    Block,
}

/// One parent-to-child dependency edge
#[derive(Debug, Clone, Copy)]
pub struct CascadeRule {
    /// The dependent table
    pub child: Table,
    /// Column in the child table referencing the parent id
    pub fk_column: &'static str,
    pub action: CascadeAction,
}

/// Dependency rules for a parent table. Tables without dependents return an
/// empty slice and delete without ceremony.
#[must_use]
pub const fn rules(table: Table) -> &'static [CascadeRule] {
    match table {
        Table::Flocks => &[
            CascadeRule {
                child: Table::HealthRecords,
                fk_column: "flock_id",
                action: CascadeAction::SoftDelete,
            },
            CascadeRule {
                child: Table::FeedLogs,
                fk_column: "flock_id",
                action: CascadeAction::SoftDelete,
            },
        ],
        // Seed already consumed by plantings cannot silently vanish; the
        // caller must resolve or reassign those logs first.
        Table::SeedBatches => &[CascadeRule {
            child: Table::PlantingLogs,
            fk_column: "seed_batch_id",
            action: CascadeAction::Block,
        }],
        Table::HealthRecords | Table::FeedLogs | Table::PlantingLogs => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flock_children_cascade() {
        let rules = rules(Table::Flocks);
        assert_eq!(rules.len(), 2);
        assert!(rules
            .iter()
            .all(|rule| rule.action == CascadeAction::SoftDelete));
    }

    #[test]
    fn test_seed_batch_deletion_blocks() {
        let rules = rules(Table::SeedBatches);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].action, CascadeAction::Block);
        assert_eq!(rules[0].child, Table::PlantingLogs);
    }

    #[test]
    fn test_leaf_tables_have_no_rules() {
        assert!(rules(Table::FeedLogs).is_empty());
        assert!(rules(Table::HealthRecords).is_empty());
        assert!(rules(Table::PlantingLogs).is_empty());
    }
}
