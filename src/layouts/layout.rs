//! # Layout
//!
//! A [`Layout`] is the immutable physical schema of one row or UDT scope:
//!
//! ```text
//! +-----------------+------------------+-------------------+-----------------+
//! | bitmask         | fixed columns    | variable columns  | sparse segment  |
//! | num_bitmask_bytes | byte-addressed | index order,      | type-tagged     |
//! |                 |                  | present ones only | values          |
//! +-----------------+------------------+-------------------+-----------------+
//! |<-------------- size ------------->|
//! ```
//!
//! Layouts are produced by [`LayoutBuilder`](super::LayoutBuilder) or the
//! [`LayoutCompiler`](super::LayoutCompiler) and shared through `Arc`.

use std::fmt;
use std::sync::Arc;

use eyre::{ensure, Result};
use hashbrown::HashMap;

use super::column::{LayoutColumn, StorageKind};
use super::tokenizer::StringTokenizer;
use super::type_argument::SchemaId;

#[derive(Debug)]
pub struct Layout {
    name: String,
    schema_id: SchemaId,
    num_bitmask_bytes: usize,
    size: usize,
    columns: Vec<LayoutColumn>,
    num_fixed: usize,
    num_variable: usize,
    top_columns: Vec<usize>,
    tokenizer: StringTokenizer,
    path_map: HashMap<Arc<str>, usize>,
}

impl Layout {
    pub(crate) fn new(
        name: String,
        schema_id: SchemaId,
        num_bitmask_bytes: usize,
        size: usize,
        columns: Vec<LayoutColumn>,
    ) -> Result<Self> {
        let mut tokenizer = StringTokenizer::new();
        let mut path_map = HashMap::with_capacity(columns.len());
        let mut top_columns = Vec::new();
        let mut num_fixed = 0;
        let mut num_variable = 0;

        for (i, column) in columns.iter().enumerate() {
            tokenizer.add(column.path());
            let previous = path_map.insert(column.full_path.clone(), i);
            ensure!(
                previous.is_none(),
                "duplicate column path '{}' in layout '{}'",
                column.full_path(),
                name
            );

            match column.storage() {
                StorageKind::Fixed => num_fixed += 1,
                StorageKind::Variable => num_variable += 1,
                StorageKind::Sparse => {}
            }
            if column.parent().is_none() {
                top_columns.push(i);
            }
        }

        Ok(Self {
            name,
            schema_id,
            num_bitmask_bytes,
            size,
            columns,
            num_fixed,
            num_variable,
            top_columns,
            tokenizer,
            path_map,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    pub fn num_bitmask_bytes(&self) -> usize {
        self.num_bitmask_bytes
    }

    /// Size of the bitmask plus the fixed columns.
    pub fn size(&self) -> usize {
        self.size
    }

    /// All columns: fixed, then variable, then sparse.
    pub fn columns(&self) -> &[LayoutColumn] {
        &self.columns
    }

    pub fn num_fixed(&self) -> usize {
        self.num_fixed
    }

    pub fn num_variable(&self) -> usize {
        self.num_variable
    }

    pub fn top_columns(&self) -> impl Iterator<Item = &LayoutColumn> + '_ {
        self.top_columns.iter().map(move |&i| &self.columns[i])
    }

    pub fn tokenizer(&self) -> &StringTokenizer {
        &self.tokenizer
    }

    /// Finds a column by its full path.
    pub fn try_find(&self, path: &str) -> Option<&LayoutColumn> {
        self.path_map.get(path).map(|&i| &self.columns[i])
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Layout:")?;
        writeln!(f, "\tName: {}", self.name)?;
        writeln!(f, "\tId: {}", self.schema_id)?;
        writeln!(f, "\tBitmask Bytes: {}", self.num_bitmask_bytes)?;
        writeln!(f, "\tFixed Size: {}", self.size)?;
        writeln!(f, "\tColumns:")?;
        for column in &self.columns {
            let type_name = format!("{}{}", column.layout_type().name(), column.type_args());
            write!(
                f,
                "\t\t{:<30} {:<16} {:<8}",
                column.full_path(),
                type_name,
                column.storage().name()
            )?;
            match column.storage() {
                StorageKind::Fixed => write!(f, " @{} size {}", column.offset(), column.size())?,
                StorageKind::Variable => write!(f, " #{}", column.offset())?,
                StorageKind::Sparse => {}
            }
            if !column.null_bit().is_invalid() {
                write!(f, " null:{}", column.null_bit().index())?;
            }
            if !column.bool_bit().is_invalid() {
                write!(f, " bool:{}", column.bool_bit().index())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
