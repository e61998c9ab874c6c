//! Schema inference from sampled rows.
//!
//! The default strategy looks at a single representative row: every key
//! becomes one column, typed by [`classify`]. Columns that only appear in
//! later rows are not part of the plan and are dropped on load.
//!
//! [`infer_from_sample`] widens the sample to the first `n` rows. Column sets
//! are unioned in first-seen order and each column takes the type of its
//! first non-null observation. With `n == 1` it is identical to [`infer`].

use tracing::debug;

use crate::core::schema::{ColumnDescriptor, ColumnType, TableMigrationPlan, PRIMARY_KEY_COLUMN};
use crate::core::value::Record;
use crate::typemap::classify;

/// Infer a plan from one sample row. `total_rows` is left at zero.
pub fn infer(table_name: &str, sample_row: &Record) -> TableMigrationPlan {
    let columns = sample_row
        .iter()
        .map(|(name, value)| descriptor_for(name, || classify(Some(value))))
        .collect();

    TableMigrationPlan {
        table_name: table_name.to_string(),
        columns,
        total_rows: 0,
    }
}

/// Infer a plan from the first `sample_rows` rows of `rows`.
pub fn infer_from_sample(table_name: &str, rows: &[Record], sample_rows: usize) -> TableMigrationPlan {
    let sample = &rows[..rows.len().min(sample_rows.max(1))];
    if let [only] = sample {
        return infer(table_name, only);
    }

    let mut names: Vec<&str> = Vec::new();
    for row in sample {
        for (name, _) in row.iter() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let columns: Vec<ColumnDescriptor> = names
        .into_iter()
        .map(|name| {
            descriptor_for(name, || {
                let observed = sample
                    .iter()
                    .filter_map(|row| row.get(name))
                    .find(|v| !v.is_null());
                classify(observed)
            })
        })
        .collect();

    debug!(
        "{}: inferred {} columns from {} sample rows",
        table_name,
        columns.len(),
        sample.len()
    );

    TableMigrationPlan {
        table_name: table_name.to_string(),
        columns,
        total_rows: 0,
    }
}

fn descriptor_for(name: &str, classify_column: impl FnOnce() -> ColumnType) -> ColumnDescriptor {
    if name == PRIMARY_KEY_COLUMN {
        ColumnDescriptor::primary_key(name)
    } else {
        ColumnDescriptor::new(name, classify_column())
    }
}
