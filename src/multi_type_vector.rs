//! Typed block vector: a random-access sequence of mixed-type cells
//! compacted into runs of same-typed storage.
//!
//! # Layout
//!
//! The vector is a list of blocks.  Each block covers `size` consecutive
//! rows and is either *empty* (no storage at all) or owns one
//! [`ElementBlock`] of exactly `size` values.  Two invariants hold at every
//! public-API boundary:
//!
//! - block sizes sum to the vector's length, and no block has size zero;
//! - no two adjacent blocks share a category, and no two adjacent blocks
//!   are both empty.
//!
//! A spreadsheet column of 100,000 numeric cells is a single block backed
//! by one `Vec<f64>`; the per-cell overhead of a naive
//! `Vec<Option<Value>>` disappears, and bulk reads become slice scans.
//!
//! # Mutation
//!
//! Every mutation rewrites the smallest run of blocks that keeps the two
//! invariants: writing a cell of a new category into the middle of a block
//! splits it in three, writing at a block edge migrates one cell to a
//! matching neighbor, and erasing a whole block fuses the neighbors it
//! exposes.  Cost is linear in the number of *blocks* touched, not rows.
//!
//! Multi-step mutations offer basic safety only: if an internal step fails
//! the vector must be discarded (no rollback is attempted).

use crate::element_block::{CellType, ElementBlock, Value};
use crate::error::{Error, Result};

/// One run of rows: either `size` absent cells, or a data block holding
/// exactly `size` values of one category.
#[derive(Debug, Clone, PartialEq)]
struct Block {
    size: usize,
    data: Option<ElementBlock>,
}

impl Block {
    fn new_empty(size: usize) -> Self {
        Block { size, data: None }
    }

    fn new_data(data: ElementBlock) -> Self {
        Block {
            size: data.len(),
            data: Some(data),
        }
    }

    /// The block's category; `CellType::Empty` for an empty block.
    fn cell_type(&self) -> CellType {
        match &self.data {
            Some(d) => d.cell_type(),
            None => CellType::Empty,
        }
    }

    /// True if this is a data block of category `cat`.
    fn data_type_matches(&self, cat: CellType) -> bool {
        self.data.as_ref().is_some_and(|d| d.cell_type() == cat)
    }

    /// The element block, or `TypeMismatch` if the block is empty.
    fn data_mut(&mut self) -> Result<&mut ElementBlock> {
        self.data.as_mut().ok_or(Error::TypeMismatch)
    }
}

/// A read-only view of one block, yielded by [`MultiTypeVector::iter_blocks`].
#[derive(Debug, Clone, Copy)]
pub struct BlockView<'a> {
    /// Category of the block; `CellType::Empty` for an empty block.
    pub cell_type: CellType,
    /// Number of rows the block covers.
    pub size: usize,
    /// Row index of the block's first cell.
    pub position: usize,
    /// Index of the block within the block sequence.
    pub index: usize,
    /// The backing storage; `None` for an empty block.  Use the typed
    /// slice views (`as_numeric` etc.) to iterate elements forward or in
    /// reverse.
    pub data: Option<&'a ElementBlock>,
}

/// Double-ended iterator over a vector's blocks in row order.
#[derive(Debug, Clone)]
pub struct BlockIter<'a> {
    blocks: &'a [Block],
    front: usize,
    back: usize,
    front_position: usize,
    back_position: usize,
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = BlockView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let blk = &self.blocks[self.front];
        let view = BlockView {
            cell_type: blk.cell_type(),
            size: blk.size,
            position: self.front_position,
            index: self.front,
            data: blk.data.as_ref(),
        };
        self.front_position += blk.size;
        self.front += 1;
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for BlockIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        let blk = &self.blocks[self.back];
        self.back_position -= blk.size;
        Some(BlockView {
            cell_type: blk.cell_type(),
            size: blk.size,
            position: self.back_position,
            index: self.back,
            data: blk.data.as_ref(),
        })
    }
}

impl ExactSizeIterator for BlockIter<'_> {}

/// A sequence of typed cells addressed by a contiguous row index, stored
/// as runs of same-typed blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiTypeVector {
    len: usize,
    blocks: Vec<Block>,
}

impl MultiTypeVector {
    /// Create an empty vector of zero rows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vector of `n` rows, all empty.
    #[must_use]
    pub fn with_size(n: usize) -> Self {
        if n == 0 {
            return Self::new();
        }
        MultiTypeVector {
            len: n,
            blocks: vec![Block::new_empty(n)],
        }
    }

    /// Create a vector of `n` rows all holding `value`.
    #[must_use]
    pub fn with_value(n: usize, value: impl Into<Value>) -> Self {
        if n == 0 {
            return Self::new();
        }
        MultiTypeVector {
            len: n,
            blocks: vec![Block::new_data(ElementBlock::with_value(value.into(), n))],
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the vector has zero rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of blocks in the block sequence.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterate the blocks in row order.  The iterator borrows the vector,
    /// so any mutation first requires dropping it.
    #[must_use]
    pub fn iter_blocks(&self) -> BlockIter<'_> {
        BlockIter {
            blocks: &self.blocks,
            front: 0,
            back: self.blocks.len(),
            front_position: 0,
            back_position: self.len,
        }
    }

    /// Return the cell at `row`, or `None` if the cell is empty.
    pub fn get(&self, row: usize) -> Result<Option<Value>> {
        self.check_row(row)?;
        let (index, start_row) = self.block_position(row);
        Ok(self.blocks[index].data.as_ref().map(|d| d.get(row - start_row)))
    }

    /// Return the category of the cell at `row`; `CellType::Empty` for an
    /// empty cell.
    pub fn cell_type(&self, row: usize) -> Result<CellType> {
        self.check_row(row)?;
        let (index, _) = self.block_position(row);
        Ok(self.blocks[index].cell_type())
    }

    /// True if the cell at `row` is empty.
    pub fn is_empty_cell(&self, row: usize) -> Result<bool> {
        self.check_row(row)?;
        let (index, _) = self.block_position(row);
        Ok(self.blocks[index].data.is_none())
    }

    /// Read the numeric cell at `row`; an empty cell reads as 0.0.  A cell
    /// of any other category fails with `TypeMismatch`.
    pub fn get_numeric(&self, row: usize) -> Result<f64> {
        self.check_row(row)?;
        let (index, start_row) = self.block_position(row);
        match &self.blocks[index].data {
            None => Ok(0.0),
            Some(d) => Ok(d.as_numeric()?[row - start_row]),
        }
    }

    /// Read the boolean cell at `row`; an empty cell reads as false.
    pub fn get_boolean(&self, row: usize) -> Result<bool> {
        self.check_row(row)?;
        let (index, start_row) = self.block_position(row);
        match &self.blocks[index].data {
            None => Ok(false),
            Some(d) => Ok(d.as_boolean()?[row - start_row]),
        }
    }

    /// Read the string cell at `row`; an empty cell reads as "".
    pub fn get_string(&self, row: usize) -> Result<String> {
        self.check_row(row)?;
        let (index, start_row) = self.block_position(row);
        match &self.blocks[index].data {
            None => Ok(String::new()),
            Some(d) => Ok(d.as_string()?[row - start_row].clone()),
        }
    }

    /// Read the signed integer cell at `row`; an empty cell reads as 0.
    pub fn get_int(&self, row: usize) -> Result<i64> {
        self.check_row(row)?;
        let (index, start_row) = self.block_position(row);
        match &self.blocks[index].data {
            None => Ok(0),
            Some(d) => Ok(d.as_int()?[row - start_row]),
        }
    }

    /// Read the unsigned integer cell at `row`; an empty cell reads as 0.
    pub fn get_uint(&self, row: usize) -> Result<u64> {
        self.check_row(row)?;
        let (index, start_row) = self.block_position(row);
        match &self.blocks[index].data {
            None => Ok(0),
            Some(d) => Ok(d.as_uint()?[row - start_row]),
        }
    }

    /// Write `value` at `row`, restructuring blocks as needed to keep
    /// adjacent blocks of distinct categories.
    pub fn set(&mut self, row: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.check_row(row)?;
        let (index, start_row) = self.block_position(row);
        let offset = row - start_row;
        let cat = value.cell_type();

        if self.blocks[index].data_type_matches(cat) {
            // Same category: overwrite in place.
            return self.blocks[index].data_mut()?.set(offset, value);
        }

        let size = self.blocks[index].size;
        if size == 1 {
            return self.replace_single_cell_block(index, value);
        }
        if offset == 0 {
            return self.set_cell_at_block_top(index, value);
        }
        if offset == size - 1 {
            return self.set_cell_at_block_bottom(index, value);
        }
        self.set_cell_interior(index, offset, value)
    }

    /// Write a homogeneous run of values starting at `row`.  The value
    /// type fixes the category; a `&[Value]` input must be single-category
    /// or the call fails with `InvalidArgument` before any mutation.
    pub fn set_range<T>(&mut self, row: usize, values: &[T]) -> Result<()>
    where
        T: Into<Value> + Clone,
    {
        let incoming = match Self::build_block_from(values)? {
            None => return Ok(()),
            Some(b) => b,
        };
        let length = incoming.len();
        if row >= self.len || self.len - row < length {
            return Err(Error::OutOfRange(row));
        }
        let end_row = row + length - 1;

        let (index1, start1) = self.block_position(row);
        let (index2, start2) = self.block_position_from(end_row, index1, start1);
        if index1 == index2 {
            self.set_range_in_block(row, end_row, index1, start1, incoming)
        } else {
            self.set_range_across_blocks(row, end_row, index1, start1, index2, start2, incoming)
        }
    }

    /// Set every cell in `[start, end]` (inclusive) to empty.
    pub fn set_empty(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_span(start, end)?;
        let (index1, start1) = self.block_position(start);
        let (index2, start2) = self.block_position_from(end, index1, start1);
        if index1 == index2 {
            return self.set_empty_in_block(start, end, index1, start1);
        }

        // The erased span widens over boundary blocks that are already
        // empty, so the replacement empty block swallows them whole.
        let mut start = start;
        let mut end = end;

        let remove_start = if self.blocks[index1].data.is_none() {
            start = start1;
            index1
        } else if start == start1 {
            index1
        } else {
            let keep = start - start1;
            let blk = &mut self.blocks[index1];
            blk.data_mut()?.resize(keep);
            blk.size = keep;
            index1 + 1
        };

        let block2_end = start2 + self.blocks[index2].size - 1;
        let remove_end = if self.blocks[index2].data.is_none() {
            end = block2_end;
            index2 + 1
        } else if end == block2_end {
            index2 + 1
        } else {
            let covered = end - start2 + 1;
            let blk = &mut self.blocks[index2];
            blk.data_mut()?.erase(0, covered);
            blk.size -= covered;
            index2
        };

        self.blocks.drain(remove_start..remove_end);
        self.blocks.insert(remove_start, Block::new_empty(end - start + 1));
        self.merge_with_neighbors(remove_start)?;
        Ok(())
    }

    /// Insert `length` empty rows before `row`, growing the vector.
    pub fn insert_empty(&mut self, row: usize, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        self.check_row(row)?;
        let (index, start_row) = self.block_position(row);

        if self.blocks[index].data.is_none() {
            // Insertion point is already empty; widen the run.
            self.blocks[index].size += length;
            self.len += length;
            return Ok(());
        }

        if row == start_row {
            if index > 0 && self.blocks[index - 1].data.is_none() {
                self.blocks[index - 1].size += length;
            } else {
                self.blocks.insert(index, Block::new_empty(length));
            }
            self.len += length;
            return Ok(());
        }

        // Split the data block and lodge the empty run between the halves.
        let offset = row - start_row;
        let blk = &mut self.blocks[index];
        let tail_size = blk.size - offset;
        let tail_data = blk.data_mut()?.split_off(offset);
        blk.size = offset;
        self.blocks.splice(
            index + 1..index + 1,
            [
                Block::new_empty(length),
                Block {
                    size: tail_size,
                    data: Some(tail_data),
                },
            ],
        );
        self.len += length;
        Ok(())
    }

    /// Insert a homogeneous run of values before `row`, growing the
    /// vector.  `row == len()` appends at the end.
    pub fn insert_range<T>(&mut self, row: usize, values: &[T]) -> Result<()>
    where
        T: Into<Value> + Clone,
    {
        let incoming = match Self::build_block_from(values)? {
            None => return Ok(()),
            Some(b) => b,
        };
        if row > self.len {
            return Err(Error::OutOfRange(row));
        }
        let length = incoming.len();
        let cat = incoming.cell_type();

        if row == self.len {
            match self.blocks.last_mut() {
                Some(last) if last.data_type_matches(cat) => {
                    last.size += length;
                    let mut incoming = incoming;
                    last.data_mut()?.append_from(&mut incoming)?;
                }
                _ => self.blocks.push(Block::new_data(incoming)),
            }
            self.len += length;
            return Ok(());
        }

        let (index, start_row) = self.block_position(row);
        let offset = row - start_row;

        if offset == 0 {
            if index > 0 && self.blocks[index - 1].data_type_matches(cat) {
                let prev = &mut self.blocks[index - 1];
                prev.size += length;
                let mut incoming = incoming;
                prev.data_mut()?.append_from(&mut incoming)?;
            } else if self.blocks[index].data_type_matches(cat) {
                let blk = &mut self.blocks[index];
                blk.size += length;
                blk.data_mut()?.insert_from(0, &incoming, 0, length)?;
            } else {
                self.blocks.insert(index, Block::new_data(incoming));
            }
        } else if self.blocks[index].data_type_matches(cat) {
            let blk = &mut self.blocks[index];
            blk.size += length;
            blk.data_mut()?.insert_from(offset, &incoming, 0, length)?;
        } else {
            // Split the block and lodge the new run between the halves.
            let blk = &mut self.blocks[index];
            let tail_size = blk.size - offset;
            let tail_data = blk.data.as_mut().map(|d| d.split_off(offset));
            blk.size = offset;
            self.blocks.splice(
                index + 1..index + 1,
                [
                    Block::new_data(incoming),
                    Block {
                        size: tail_size,
                        data: tail_data,
                    },
                ],
            );
        }
        self.len += length;
        Ok(())
    }

    /// Remove rows `[start, end]` (inclusive), shrinking the vector and
    /// fusing the blocks the removal makes adjacent.
    pub fn erase(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_span(start, end)?;
        let span = end - start + 1;
        let (index1, start1) = self.block_position(start);
        let (index2, start2) = self.block_position_from(end, index1, start1);

        if index1 == index2 {
            let offset = start - start1;
            let blk = &mut self.blocks[index1];
            if let Some(d) = blk.data.as_mut() {
                d.erase(offset, span);
            }
            blk.size -= span;
            self.len -= span;
            if blk.size == 0 {
                self.blocks.remove(index1);
                if index1 > 0 && index1 < self.blocks.len() {
                    self.merge_if_same_type(index1 - 1)?;
                }
            }
            return Ok(());
        }

        let remove_start = if start == start1 {
            index1
        } else {
            let keep = start - start1;
            let blk = &mut self.blocks[index1];
            if let Some(d) = blk.data.as_mut() {
                d.resize(keep);
            }
            blk.size = keep;
            index1 + 1
        };

        let block2_end = start2 + self.blocks[index2].size - 1;
        let remove_end = if end == block2_end {
            index2 + 1
        } else {
            let covered = end - start2 + 1;
            let blk = &mut self.blocks[index2];
            if let Some(d) = blk.data.as_mut() {
                d.erase(0, covered);
            }
            blk.size -= covered;
            index2
        };

        self.blocks.drain(remove_start..remove_end);
        self.len -= span;
        if remove_start > 0 && remove_start < self.blocks.len() {
            self.merge_if_same_type(remove_start - 1)?;
        }
        Ok(())
    }

    /// Change the row count.  Growth appends empty rows; shrinking cuts
    /// the tail off, dropping any blocks past the new end.
    pub fn resize(&mut self, new_len: usize) {
        if new_len == self.len {
            return;
        }
        if new_len == 0 {
            self.clear();
            return;
        }
        if new_len > self.len {
            let delta = new_len - self.len;
            match self.blocks.last_mut() {
                None => self.blocks.push(Block::new_empty(new_len)),
                Some(last) if last.data.is_none() => last.size += delta,
                Some(_) => self.blocks.push(Block::new_empty(delta)),
            }
            self.len = new_len;
            return;
        }

        let (index, start_row) = self.block_position(new_len - 1);
        let keep = new_len - start_row;
        let blk = &mut self.blocks[index];
        if keep < blk.size {
            if let Some(d) = blk.data.as_mut() {
                d.resize(keep);
            }
            blk.size = keep;
        }
        self.blocks.truncate(index + 1);
        self.len = new_len;
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.len = 0;
    }

    /// Exchange the contents of two vectors.
    pub fn swap(&mut self, other: &mut MultiTypeVector) {
        std::mem::swap(self, other);
    }

    // ---- positional lookup ------------------------------------------------

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.len {
            return Err(Error::OutOfRange(row));
        }
        Ok(())
    }

    fn check_span(&self, start: usize, end: usize) -> Result<()> {
        if start > end {
            return Err(Error::OutOfRange(start));
        }
        self.check_row(end)
    }

    /// Locate the block containing `row`: `(block index, starting row)`.
    /// Caller guarantees `row < len`.
    fn block_position(&self, row: usize) -> (usize, usize) {
        self.block_position_from(row, 0, 0)
    }

    /// Resume-from-hint lookup: scan forward from `start_block`, whose
    /// first row is `start_block_row`.  Used by the range operations to
    /// avoid rescanning the prefix for the second endpoint.
    pub(crate) fn block_position_from(
        &self,
        row: usize,
        start_block: usize,
        start_block_row: usize,
    ) -> (usize, usize) {
        let mut position = start_block_row;
        for (i, blk) in self.blocks.iter().enumerate().skip(start_block) {
            if row < position + blk.size {
                return (i, position);
            }
            position += blk.size;
        }
        unreachable!("row {row} not covered by the block sequence");
    }

    /// Cell read through an already-resolved block position.
    pub(crate) fn value_at(&self, index: usize, start_row: usize, row: usize) -> Option<Value> {
        self.blocks[index].data.as_ref().map(|d| d.get(row - start_row))
    }

    // ---- point set helpers ------------------------------------------------

    /// Replace the only cell of a size-1 block, fusing with any
    /// matching-category neighbors.
    fn replace_single_cell_block(&mut self, index: usize, value: Value) -> Result<()> {
        let cat = value.cell_type();
        let prev_matches = index > 0 && self.blocks[index - 1].data_type_matches(cat);
        let next_matches =
            index + 1 < self.blocks.len() && self.blocks[index + 1].data_type_matches(cat);

        if prev_matches && next_matches {
            // Three blocks collapse into one.
            let next = self.blocks.remove(index + 1);
            self.blocks.remove(index);
            let prev = &mut self.blocks[index - 1];
            prev.size += 1 + next.size;
            let dst = prev.data_mut()?;
            dst.push(value)?;
            if let Some(mut src) = next.data {
                dst.append_from(&mut src)?;
            }
        } else if prev_matches {
            self.blocks.remove(index);
            let prev = &mut self.blocks[index - 1];
            prev.size += 1;
            prev.data_mut()?.push(value)?;
        } else if next_matches {
            self.blocks.remove(index);
            let next = &mut self.blocks[index];
            next.size += 1;
            next.data_mut()?.prepend(value)?;
        } else {
            self.blocks[index] = Block::new_data(ElementBlock::with_value(value, 1));
        }
        Ok(())
    }

    /// Write into the first cell of a multi-cell block of another
    /// category: shift the cell out of the block and into the predecessor
    /// if it matches, else into a new singleton block.
    fn set_cell_at_block_top(&mut self, index: usize, value: Value) -> Result<()> {
        let cat = value.cell_type();
        let blk = &mut self.blocks[index];
        if let Some(d) = blk.data.as_mut() {
            d.erase(0, 1);
        }
        blk.size -= 1;

        if index > 0 && self.blocks[index - 1].data_type_matches(cat) {
            let prev = &mut self.blocks[index - 1];
            prev.size += 1;
            prev.data_mut()?.push(value)?;
        } else {
            self.blocks
                .insert(index, Block::new_data(ElementBlock::with_value(value, 1)));
        }
        Ok(())
    }

    /// Write into the last cell of a multi-cell block of another category.
    fn set_cell_at_block_bottom(&mut self, index: usize, value: Value) -> Result<()> {
        let cat = value.cell_type();
        let blk = &mut self.blocks[index];
        let keep = blk.size - 1;
        if let Some(d) = blk.data.as_mut() {
            d.resize(keep);
        }
        blk.size = keep;

        if index + 1 < self.blocks.len() && self.blocks[index + 1].data_type_matches(cat) {
            let next = &mut self.blocks[index + 1];
            next.size += 1;
            next.data_mut()?.prepend(value)?;
        } else {
            self.blocks
                .insert(index + 1, Block::new_data(ElementBlock::with_value(value, 1)));
        }
        Ok(())
    }

    /// Write into the interior of a block of another category: split into
    /// head / singleton / tail.
    fn set_cell_interior(&mut self, index: usize, offset: usize, value: Value) -> Result<()> {
        let blk = &mut self.blocks[index];
        let tail_size = blk.size - offset - 1;
        let tail_data = blk.data.as_mut().map(|d| {
            let mut tail = d.split_off(offset);
            tail.erase(0, 1);
            tail
        });
        blk.size = offset;
        self.blocks.splice(
            index + 1..index + 1,
            [
                Block::new_data(ElementBlock::with_value(value, 1)),
                Block {
                    size: tail_size,
                    data: tail_data,
                },
            ],
        );
        Ok(())
    }

    // ---- range set helpers ------------------------------------------------

    /// Collect a `&[T]` into one element block, or `None` for empty input.
    /// Mixed-category input (possible only with `T = Value`) is rejected.
    fn build_block_from<T>(values: &[T]) -> Result<Option<ElementBlock>>
    where
        T: Into<Value> + Clone,
    {
        let mut iter = values.iter().cloned().map(Into::into);
        let first: Value = match iter.next() {
            None => return Ok(None),
            Some(v) => v,
        };
        let cat = first.cell_type();
        let mut block = ElementBlock::with_value(first, 1);
        for value in iter {
            if value.cell_type() != cat {
                return Err(Error::InvalidArgument(
                    "range values must share one category".to_string(),
                ));
            }
            block.push(value)?;
        }
        Ok(Some(block))
    }

    fn set_range_in_block(
        &mut self,
        row: usize,
        end_row: usize,
        index: usize,
        start_row: usize,
        incoming: ElementBlock,
    ) -> Result<()> {
        let cat = incoming.cell_type();
        let length = incoming.len();
        let offset = row - start_row;

        if self.blocks[index].data_type_matches(cat) {
            // Same category: overwrite in place.
            return self.blocks[index].data_mut()?.write_range(offset, &incoming);
        }

        let block_end = start_row + self.blocks[index].size - 1;

        if row == start_row && end_row == block_end {
            // Whole block replaced.
            self.blocks[index].data = Some(incoming);
            self.merge_with_neighbors(index)?;
            return Ok(());
        }

        if row == start_row {
            // Upper part of the block.
            let blk = &mut self.blocks[index];
            if let Some(d) = blk.data.as_mut() {
                d.erase(0, length);
            }
            blk.size -= length;
            if index > 0 && self.blocks[index - 1].data_type_matches(cat) {
                let prev = &mut self.blocks[index - 1];
                prev.size += length;
                let mut incoming = incoming;
                prev.data_mut()?.append_from(&mut incoming)?;
            } else {
                self.blocks.insert(index, Block::new_data(incoming));
            }
            return Ok(());
        }

        if end_row == block_end {
            // Lower part of the block.
            let blk = &mut self.blocks[index];
            let keep = blk.size - length;
            if let Some(d) = blk.data.as_mut() {
                d.resize(keep);
            }
            blk.size = keep;
            if index + 1 < self.blocks.len() && self.blocks[index + 1].data_type_matches(cat) {
                let next = &mut self.blocks[index + 1];
                next.size += length;
                next.data_mut()?.insert_from(0, &incoming, 0, length)?;
            } else {
                self.blocks.insert(index + 1, Block::new_data(incoming));
            }
            return Ok(());
        }

        // Interior: head / new run / tail.
        let blk = &mut self.blocks[index];
        let tail_size = block_end - end_row;
        let tail_data = blk.data.as_mut().map(|d| {
            let mut tail = d.split_off(offset);
            tail.erase(0, length);
            tail
        });
        blk.size = offset;
        self.blocks.splice(
            index + 1..index + 1,
            [
                Block::new_data(incoming),
                Block {
                    size: tail_size,
                    data: tail_data,
                },
            ],
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn set_range_across_blocks(
        &mut self,
        row: usize,
        end_row: usize,
        index1: usize,
        start1: usize,
        index2: usize,
        start2: usize,
        incoming: ElementBlock,
    ) -> Result<()> {
        // Trim the first block back to the uncovered head, or mark it for
        // removal when fully covered.  The head keeps its category.
        let remove_start = if row > start1 {
            let keep = row - start1;
            let blk = &mut self.blocks[index1];
            if let Some(d) = blk.data.as_mut() {
                d.resize(keep);
            }
            blk.size = keep;
            index1 + 1
        } else {
            index1
        };

        // Same for the last block's uncovered tail.
        let block2_end = start2 + self.blocks[index2].size - 1;
        let remove_end = if end_row < block2_end {
            let covered = end_row - start2 + 1;
            let blk = &mut self.blocks[index2];
            if let Some(d) = blk.data.as_mut() {
                d.erase(0, covered);
            }
            blk.size -= covered;
            index2
        } else {
            index2 + 1
        };

        self.blocks.drain(remove_start..remove_end);
        self.blocks.insert(remove_start, Block::new_data(incoming));
        self.merge_with_neighbors(remove_start)?;
        Ok(())
    }

    // ---- range empty helper -----------------------------------------------

    fn set_empty_in_block(
        &mut self,
        start: usize,
        end: usize,
        index: usize,
        start_row: usize,
    ) -> Result<()> {
        if self.blocks[index].data.is_none() {
            // Already empty.
            return Ok(());
        }
        let block_end = start_row + self.blocks[index].size - 1;
        let length = end - start + 1;

        if start == start_row && end == block_end {
            // Whole block becomes empty.
            self.blocks[index].data = None;
            self.merge_with_neighbors(index)?;
            return Ok(());
        }

        if start == start_row {
            // Upper part becomes empty.
            let blk = &mut self.blocks[index];
            blk.data_mut()?.erase(0, length);
            blk.size -= length;
            if index > 0 && self.blocks[index - 1].data.is_none() {
                self.blocks[index - 1].size += length;
            } else {
                self.blocks.insert(index, Block::new_empty(length));
            }
            return Ok(());
        }

        if end == block_end {
            // Lower part becomes empty.
            let blk = &mut self.blocks[index];
            let keep = blk.size - length;
            blk.data_mut()?.resize(keep);
            blk.size = keep;
            if index + 1 < self.blocks.len() && self.blocks[index + 1].data.is_none() {
                self.blocks[index + 1].size += length;
            } else {
                self.blocks.insert(index + 1, Block::new_empty(length));
            }
            return Ok(());
        }

        // Interior becomes empty: data / empty / data.
        let offset = start - start_row;
        let tail_size = block_end - end;
        let blk = &mut self.blocks[index];
        let tail_data = {
            let d = blk.data_mut()?;
            let mut tail = d.split_off(offset);
            tail.erase(0, length);
            tail
        };
        blk.size = offset;
        self.blocks.splice(
            index + 1..index + 1,
            [
                Block::new_empty(length),
                Block {
                    size: tail_size,
                    data: Some(tail_data),
                },
            ],
        );
        Ok(())
    }

    // ---- block fusion -----------------------------------------------------

    fn mergeable(left: &Block, right: &Block) -> bool {
        match (&left.data, &right.data) {
            (None, None) => true,
            (Some(a), Some(b)) => a.cell_type() == b.cell_type(),
            _ => false,
        }
    }

    /// Fuse blocks `index` and `index + 1` if they share a category or are
    /// both empty.
    fn merge_if_same_type(&mut self, index: usize) -> Result<()> {
        if Self::mergeable(&self.blocks[index], &self.blocks[index + 1]) {
            let next = self.blocks.remove(index + 1);
            let blk = &mut self.blocks[index];
            blk.size += next.size;
            if let Some(mut src) = next.data {
                blk.data_mut()?.append_from(&mut src)?;
            }
        }
        Ok(())
    }

    /// Fuse block `index` with either neighbor where the categories allow
    /// it, restoring the non-coalesced invariant around a fresh block.
    fn merge_with_neighbors(&mut self, mut index: usize) -> Result<()> {
        if index > 0 && Self::mergeable(&self.blocks[index - 1], &self.blocks[index]) {
            self.merge_if_same_type(index - 1)?;
            index -= 1;
        }
        if index + 1 < self.blocks.len() {
            self.merge_if_same_type(index)?;
        }
        Ok(())
    }
}
