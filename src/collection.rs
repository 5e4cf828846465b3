//! Row-major iteration over a group of equally-sized vectors.
//!
//! A spreadsheet range is a set of columns read side by side: row 0 of
//! every column, then row 1, and so on.  [`Collection`] groups
//! [`MultiTypeVector`]s of one common length and iterates their cells in
//! that order.  Each grouped vector keeps a cursor into its own block
//! sequence, so advancing a row costs amortized O(1) per vector instead of
//! a fresh positional lookup.

use crate::element_block::Value;
use crate::error::{Error, Result};
use crate::multi_type_vector::MultiTypeVector;

/// One cell produced by the side iterator.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Index of the vector within the collection.
    pub index: usize,
    /// Row of the cell within its vector.
    pub position: usize,
    /// The cell's value; `None` for an empty cell.
    pub value: Option<Value>,
}

/// A group of equally-sized vectors iterated row-major.
#[derive(Debug, Clone)]
pub struct Collection {
    vectors: Vec<MultiTypeVector>,
    rows: usize,
}

impl Collection {
    /// Group `vectors` for side-by-side iteration.
    ///
    /// Fails with `InvalidArgument` if the group is empty, the vectors
    /// differ in length, or the common length is zero.
    pub fn new(vectors: Vec<MultiTypeVector>) -> Result<Self> {
        let rows = match vectors.first() {
            None => {
                return Err(Error::InvalidArgument(
                    "cannot group zero vectors".to_string(),
                ))
            }
            Some(v) => v.len(),
        };
        if vectors.iter().any(|v| v.len() != rows) {
            return Err(Error::InvalidArgument(
                "grouped vectors must all have the same length".to_string(),
            ));
        }
        if rows == 0 {
            return Err(Error::InvalidArgument(
                "cannot group vectors of zero length".to_string(),
            ));
        }
        Ok(Collection { vectors, rows })
    }

    /// Number of grouped vectors.
    #[must_use]
    pub fn size(&self) -> usize {
        self.vectors.len()
    }

    /// Number of rows common to every grouped vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// True if the collection holds no cells.  Construction guarantees at
    /// least one vector of at least one row, so this is always false.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty() || self.rows == 0
    }

    /// Access one grouped vector.
    #[must_use]
    pub fn vector(&self, index: usize) -> Option<&MultiTypeVector> {
        self.vectors.get(index)
    }

    /// Iterate every cell row-major: all vectors at row 0, then row 1, …
    #[must_use]
    pub fn iter(&self) -> SideIter<'_> {
        let cursors = vec![(0, 0); self.vectors.len()];
        SideIter {
            collection: self,
            row: 0,
            vector: 0,
            cursors,
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = Cell;
    type IntoIter = SideIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major cell iterator over a [`Collection`].
///
/// Per-vector `(block index, block start row)` cursors resume each lookup
/// from the block that produced the previous row.
#[derive(Debug, Clone)]
pub struct SideIter<'a> {
    collection: &'a Collection,
    row: usize,
    vector: usize,
    cursors: Vec<(usize, usize)>,
}

impl Iterator for SideIter<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.collection.rows {
            return None;
        }
        let index = self.vector;
        let position = self.row;

        let v = &self.collection.vectors[index];
        let (hint_block, hint_row) = self.cursors[index];
        let (block, block_start) = v.block_position_from(position, hint_block, hint_row);
        self.cursors[index] = (block, block_start);
        let value = v.value_at(block, block_start, position);

        self.vector += 1;
        if self.vector == self.collection.vectors.len() {
            self.vector = 0;
            self.row += 1;
        }
        Some(Cell {
            index,
            position,
            value,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.collection.rows * self.collection.vectors.len();
        let done = self.row * self.collection.vectors.len() + self.vector;
        (total - done, Some(total - done))
    }
}

impl ExactSizeIterator for SideIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element_block::CellType;

    #[test]
    fn test_two_empty_vectors_of_size_one() {
        let vectors = vec![MultiTypeVector::with_size(1), MultiTypeVector::with_size(1)];
        let collection = Collection::new(vectors).unwrap();

        let cells: Vec<_> = collection.iter().collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].index, 0);
        assert!(cells[0].value.is_none());
        assert_eq!(cells[1].index, 1);
        assert!(cells[1].value.is_none());
    }

    #[test]
    fn test_mixed_empty_and_numeric() {
        let mut second = MultiTypeVector::with_size(1);
        second.set(0, 1.1).unwrap();
        let collection =
            Collection::new(vec![MultiTypeVector::with_size(1), second]).unwrap();

        let cells: Vec<_> = collection.iter().collect();
        assert!(cells[0].value.is_none());
        assert_eq!(cells[1].value, Some(Value::Numeric(1.1)));
        assert_eq!(cells[1].index, 1);
    }

    #[test]
    fn test_row_major_order_over_two_rows() {
        let collection = Collection::new(vec![
            MultiTypeVector::with_value(2, 2.3),
            MultiTypeVector::with_value(2, "test"),
        ])
        .unwrap();
        assert_eq!(collection.size(), 2);
        assert_eq!(collection.len(), 2);

        let cells: Vec<_> = collection.iter().collect();
        assert_eq!(cells.len(), 4);

        assert_eq!((cells[0].index, cells[0].position), (0, 0));
        assert_eq!(cells[0].value, Some(Value::Numeric(2.3)));
        assert_eq!((cells[1].index, cells[1].position), (1, 0));
        assert_eq!(cells[1].value, Some(Value::String("test".to_string())));
        assert_eq!((cells[2].index, cells[2].position), (0, 1));
        assert_eq!((cells[3].index, cells[3].position), (1, 1));

        // The grouped vectors stay reachable by index.
        assert_eq!(collection.vector(0).unwrap().get_numeric(0).unwrap(), 2.3);
        assert_eq!(collection.vector(1).unwrap().get_string(1).unwrap(), "test");
        assert!(collection.vector(2).is_none());
    }

    #[test]
    fn test_cursor_tracks_block_transitions() {
        // A vector whose block sequence changes mid-iteration exercises the
        // per-vector cursor.
        let mut v = MultiTypeVector::with_size(4);
        v.set(1, 5.0).unwrap();
        v.set(2, "s").unwrap();
        let collection = Collection::new(vec![v]).unwrap();

        let types: Vec<CellType> = collection
            .iter()
            .map(|c| c.value.map_or(CellType::Empty, |v| v.cell_type()))
            .collect();
        assert_eq!(
            types,
            vec![
                CellType::Empty,
                CellType::Numeric,
                CellType::String,
                CellType::Empty
            ]
        );
    }

    #[test]
    fn test_invalid_groups() {
        // Different lengths.
        let result = Collection::new(vec![
            MultiTypeVector::with_size(1),
            MultiTypeVector::with_size(2),
        ]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        // All-empty group.
        let result = Collection::new(vec![MultiTypeVector::new(), MultiTypeVector::new()]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        // Zero vectors.
        assert!(Collection::new(Vec::new()).is_err());
    }
}
