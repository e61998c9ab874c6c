//! MySQL statement generation.
//!
//! Builds the DDL, INSERT and session statements the loader and orchestrator
//! send to the destination. Column order always follows the plan, so the
//! CREATE TABLE and INSERT statements of one run line up.

use crate::core::schema::TableMigrationPlan;
use crate::typemap::mysql_type;

/// MySQL/MariaDB statement builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// Quote an identifier with backticks, doubling embedded backticks.
    pub fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// Idempotent CREATE TABLE for a plan. The `id` column becomes the
    /// primary key when present.
    pub fn create_table_if_not_exists(&self, plan: &TableMigrationPlan) -> String {
        let mut defs: Vec<String> = plan
            .columns
            .iter()
            .map(|c| {
                let null_clause = if c.is_primary_key { " NOT NULL" } else { "" };
                format!("{} {}{}", self.quote_ident(&c.name), mysql_type(c), null_clause)
            })
            .collect();

        if let Some(pk) = plan.primary_key() {
            defs.push(format!("PRIMARY KEY ({})", self.quote_ident(&pk.name)));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci",
            self.quote_ident(&plan.table_name),
            defs.join(",\n    ")
        )
    }

    /// Single-row parameterized INSERT over every plan column.
    pub fn insert_row(&self, plan: &TableMigrationPlan) -> String {
        let cols: Vec<String> = plan
            .columns
            .iter()
            .map(|c| self.quote_ident(&c.name))
            .collect();
        let placeholders = vec!["?"; plan.columns.len()].join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_ident(&plan.table_name),
            cols.join(", "),
            placeholders
        )
    }

    /// Session statement toggling foreign key enforcement.
    pub fn foreign_key_checks(&self, enabled: bool) -> &'static str {
        if enabled {
            "SET FOREIGN_KEY_CHECKS = 1"
        } else {
            "SET FOREIGN_KEY_CHECKS = 0"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnDescriptor, ColumnType};

    fn client_plan() -> TableMigrationPlan {
        TableMigrationPlan {
            table_name: "clients".to_string(),
            columns: vec![
                ColumnDescriptor::primary_key("id"),
                ColumnDescriptor::new("name", ColumnType::Text),
                ColumnDescriptor::new("active", ColumnType::Boolean),
                ColumnDescriptor::new("balance", ColumnType::Decimal),
            ],
            total_rows: 0,
        }
    }

    #[test]
    fn test_quote_ident() {
        let d = MysqlDialect::new();
        assert_eq!(d.quote_ident("name"), "`name`");
        assert_eq!(d.quote_ident("table`name"), "`table``name`");
    }

    #[test]
    fn test_create_table_with_primary_key() {
        let sql = MysqlDialect::new().create_table_if_not_exists(&client_plan());
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `clients` ("));
        assert!(sql.contains("`id` VARCHAR(36) NOT NULL"));
        assert!(sql.contains("`name` TEXT,"));
        assert!(sql.contains("`active` BOOLEAN"));
        assert!(sql.contains("`balance` DECIMAL(15,2)"));
        assert!(sql.contains("PRIMARY KEY (`id`)"));
        assert!(sql.contains("ENGINE=InnoDB"));
    }

    #[test]
    fn test_create_table_without_primary_key() {
        let mut plan = client_plan();
        plan.columns.remove(0);
        let sql = MysqlDialect::new().create_table_if_not_exists(&plan);
        assert!(!sql.contains("PRIMARY KEY"));
    }

    #[test]
    fn test_insert_row() {
        let sql = MysqlDialect::new().insert_row(&client_plan());
        assert_eq!(
            sql,
            "INSERT INTO `clients` (`id`, `name`, `active`, `balance`) VALUES (?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_foreign_key_checks() {
        let d = MysqlDialect::new();
        assert_eq!(d.foreign_key_checks(false), "SET FOREIGN_KEY_CHECKS = 0");
        assert_eq!(d.foreign_key_checks(true), "SET FOREIGN_KEY_CHECKS = 1");
    }
}
