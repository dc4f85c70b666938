//! Persistent accumulation of the three invoice tables.

mod workbook;

pub use workbook::WorkbookStore;

use crate::error::StoreError;
use crate::extract::TableKind;
use crate::models::table::Table;

/// One table per [`TableKind`], addressed by kind rather than position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSet {
    tables: [Table; 3],
}

impl TableSet {
    /// Create a set with three empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: TableKind) -> &Table {
        &self.tables[kind.index()]
    }

    /// Replace the table for `kind`.
    pub fn set(&mut self, kind: TableKind, table: Table) {
        self.tables[kind.index()] = table;
    }

    /// Tables with their kinds, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (TableKind, &Table)> {
        TableKind::ALL.into_iter().zip(self.tables.iter())
    }

    /// Row count per kind, in catalog order.
    pub fn row_counts(&self) -> [usize; 3] {
        [
            self.tables[0].row_count(),
            self.tables[1].row_count(),
            self.tables[2].row_count(),
        ]
    }

    /// Append every table of `other` below the matching table of `self`.
    pub fn append(&mut self, other: TableSet) {
        for (mine, theirs) in self.tables.iter_mut().zip(other.tables) {
            mine.append(theirs);
        }
    }
}

/// An appendable store of the three tables.
///
/// Implementations must replace their contents atomically in [`save`]:
/// after a failed save the previous contents are still readable.
///
/// [`save`]: TableStore::save
pub trait TableStore {
    /// Read the stored tables. A store that does not exist yet reads as empty.
    fn load(&self) -> Result<TableSet, StoreError>;

    /// Replace the stored tables.
    fn save(&self, tables: &TableSet) -> Result<(), StoreError>;

    /// Append a batch to the stored tables and return the combined contents.
    fn append(&self, batch: TableSet) -> Result<TableSet, StoreError> {
        let mut combined = self.load()?;
        combined.append(batch);
        self.save(&combined)?;
        Ok(combined)
    }
}
