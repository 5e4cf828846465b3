//! Homogeneous element storage for the typed block vector.
//!
//! A [`MultiTypeVector`](crate::multi_type_vector::MultiTypeVector) never
//! stores values directly; each of its data blocks owns exactly one
//! [`ElementBlock`], a growable sequence of values of a single category.
//! The block is a tagged variant with one `Vec<T>` per category, so
//! category dispatch is a plain `match` with no indirect calls, and the
//! common numeric case monomorphizes to straight `Vec<f64>` operations.
//!
//! Cell categories form a closed set.  [`CellType::Empty`] is a
//! pseudo-category used by block views and collection cells to label runs
//! of absent values; an element block itself always has a data category.

use crate::error::{Error, Result};

/// Category tag for a cell or a run of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    /// A run of absent values.  Never the category of an element block.
    Empty,
    /// Double-precision floating point.
    Numeric,
    /// Boolean.
    Boolean,
    /// Owned string.
    String,
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    UInt,
}

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Double-precision floating point value.
    Numeric(f64),
    /// Boolean value.
    Boolean(bool),
    /// Owned string value.
    String(String),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
}

impl Value {
    /// Return the category this value belongs to.
    #[must_use]
    pub fn cell_type(&self) -> CellType {
        match self {
            Value::Numeric(_) => CellType::Numeric,
            Value::Boolean(_) => CellType::Boolean,
            Value::String(_) => CellType::String,
            Value::Int(_) => CellType::Int,
            Value::UInt(_) => CellType::UInt,
        }
    }

    /// Return the default value of a data category: 0.0, false, "", 0, 0.
    ///
    /// Returns `None` for [`CellType::Empty`], which has no value.
    #[must_use]
    pub fn default_of(cell_type: CellType) -> Option<Value> {
        match cell_type {
            CellType::Empty => None,
            CellType::Numeric => Some(Value::Numeric(0.0)),
            CellType::Boolean => Some(Value::Boolean(false)),
            CellType::String => Some(Value::String(String::new())),
            CellType::Int => Some(Value::Int(0)),
            CellType::UInt => Some(Value::UInt(0)),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numeric(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

/// Apply an expression to the inner `Vec` of whichever variant is active.
macro_rules! each_store {
    ($block:expr, $v:ident => $body:expr) => {
        match $block {
            ElementBlock::Numeric($v) => $body,
            ElementBlock::Boolean($v) => $body,
            ElementBlock::String($v) => $body,
            ElementBlock::Int($v) => $body,
            ElementBlock::UInt($v) => $body,
        }
    };
}

/// Apply an expression to the inner `Vec`s of two blocks of the same
/// category, or fail with `TypeMismatch`.
macro_rules! paired_stores {
    ($a:expr, $b:expr, $x:ident, $y:ident => $body:expr) => {
        match ($a, $b) {
            (ElementBlock::Numeric($x), ElementBlock::Numeric($y)) => $body,
            (ElementBlock::Boolean($x), ElementBlock::Boolean($y)) => $body,
            (ElementBlock::String($x), ElementBlock::String($y)) => $body,
            (ElementBlock::Int($x), ElementBlock::Int($y)) => $body,
            (ElementBlock::UInt($x), ElementBlock::UInt($y)) => $body,
            _ => return Err(Error::TypeMismatch),
        }
    };
}

/// A homogeneous, growable sequence of values of one category.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementBlock {
    /// Numeric storage.
    Numeric(Vec<f64>),
    /// Boolean storage.
    Boolean(Vec<bool>),
    /// String storage.
    String(Vec<String>),
    /// Signed integer storage.
    Int(Vec<i64>),
    /// Unsigned integer storage.
    UInt(Vec<u64>),
}

impl ElementBlock {
    /// Create a block of `cell_type` holding `size` default-initialized
    /// values.  `CellType::Empty` is not a data category and fails with
    /// `TypeMismatch`.
    pub fn new(cell_type: CellType, size: usize) -> Result<Self> {
        let block = match cell_type {
            CellType::Empty => return Err(Error::TypeMismatch),
            CellType::Numeric => ElementBlock::Numeric(vec![0.0; size]),
            CellType::Boolean => ElementBlock::Boolean(vec![false; size]),
            CellType::String => ElementBlock::String(vec![String::new(); size]),
            CellType::Int => ElementBlock::Int(vec![0; size]),
            CellType::UInt => ElementBlock::UInt(vec![0; size]),
        };
        Ok(block)
    }

    /// Create a block holding `n` copies of `value`.
    #[must_use]
    pub fn with_value(value: Value, n: usize) -> Self {
        match value {
            Value::Numeric(v) => ElementBlock::Numeric(vec![v; n]),
            Value::Boolean(v) => ElementBlock::Boolean(vec![v; n]),
            Value::String(v) => ElementBlock::String(vec![v; n]),
            Value::Int(v) => ElementBlock::Int(vec![v; n]),
            Value::UInt(v) => ElementBlock::UInt(vec![v; n]),
        }
    }

    /// Return the category of this block.
    #[must_use]
    pub fn cell_type(&self) -> CellType {
        match self {
            ElementBlock::Numeric(_) => CellType::Numeric,
            ElementBlock::Boolean(_) => CellType::Boolean,
            ElementBlock::String(_) => CellType::String,
            ElementBlock::Int(_) => CellType::Int,
            ElementBlock::UInt(_) => CellType::UInt,
        }
    }

    /// Return the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        each_store!(self, v => v.len())
    }

    /// Return true if the block holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow (appending category defaults) or shrink to `new_len` values.
    pub fn resize(&mut self, new_len: usize) {
        match self {
            ElementBlock::Numeric(v) => v.resize(new_len, 0.0),
            ElementBlock::Boolean(v) => v.resize(new_len, false),
            ElementBlock::String(v) => v.resize(new_len, String::new()),
            ElementBlock::Int(v) => v.resize(new_len, 0),
            ElementBlock::UInt(v) => v.resize(new_len, 0),
        }
    }

    /// Append one value.  The value's category must match the block's.
    pub fn push(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (ElementBlock::Numeric(v), Value::Numeric(x)) => v.push(x),
            (ElementBlock::Boolean(v), Value::Boolean(x)) => v.push(x),
            (ElementBlock::String(v), Value::String(x)) => v.push(x),
            (ElementBlock::Int(v), Value::Int(x)) => v.push(x),
            (ElementBlock::UInt(v), Value::UInt(x)) => v.push(x),
            _ => return Err(Error::TypeMismatch),
        }
        Ok(())
    }

    /// Insert one value at the front.  The value's category must match.
    pub fn prepend(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (ElementBlock::Numeric(v), Value::Numeric(x)) => v.insert(0, x),
            (ElementBlock::Boolean(v), Value::Boolean(x)) => v.insert(0, x),
            (ElementBlock::String(v), Value::String(x)) => v.insert(0, x),
            (ElementBlock::Int(v), Value::Int(x)) => v.insert(0, x),
            (ElementBlock::UInt(v), Value::UInt(x)) => v.insert(0, x),
            _ => return Err(Error::TypeMismatch),
        }
        Ok(())
    }

    /// Move every value of `other` onto the end of this block, leaving
    /// `other` empty.  Both blocks must share one category.
    pub fn append_from(&mut self, other: &mut ElementBlock) -> Result<()> {
        paired_stores!(self, other, a, b => a.append(b));
        Ok(())
    }

    /// Replace this block's entire content with `len` values of `src`
    /// starting at `start`.  Both blocks must share one category.
    pub fn assign_from_range(&mut self, src: &ElementBlock, start: usize, len: usize) -> Result<()> {
        paired_stores!(self, src, a, b => {
            a.clear();
            a.extend_from_slice(&b[start..start + len]);
        });
        Ok(())
    }

    /// Splice `len` values of `src` starting at `start` into this block at
    /// position `pos`.  Both blocks must share one category.
    pub fn insert_from(&mut self, pos: usize, src: &ElementBlock, start: usize, len: usize) -> Result<()> {
        paired_stores!(self, src, a, b => {
            a.splice(pos..pos, b[start..start + len].iter().cloned());
        });
        Ok(())
    }

    /// Overwrite values starting at `pos` with the full content of `src`.
    /// Both blocks must share one category.
    pub fn write_range(&mut self, pos: usize, src: &ElementBlock) -> Result<()> {
        paired_stores!(self, src, a, b => {
            a[pos..pos + b.len()].clone_from_slice(b);
        });
        Ok(())
    }

    /// Remove `count` values starting at position `pos`.
    pub fn erase(&mut self, pos: usize, count: usize) {
        each_store!(self, v => {
            v.drain(pos..pos + count);
        });
    }

    /// Split the block in two at `at`; self keeps `[0, at)`, the returned
    /// block holds `[at, len)`.
    #[must_use]
    pub fn split_off(&mut self, at: usize) -> ElementBlock {
        match self {
            ElementBlock::Numeric(v) => ElementBlock::Numeric(v.split_off(at)),
            ElementBlock::Boolean(v) => ElementBlock::Boolean(v.split_off(at)),
            ElementBlock::String(v) => ElementBlock::String(v.split_off(at)),
            ElementBlock::Int(v) => ElementBlock::Int(v.split_off(at)),
            ElementBlock::UInt(v) => ElementBlock::UInt(v.split_off(at)),
        }
    }

    /// Return the value at `pos`.
    #[must_use]
    pub fn get(&self, pos: usize) -> Value {
        match self {
            ElementBlock::Numeric(v) => Value::Numeric(v[pos]),
            ElementBlock::Boolean(v) => Value::Boolean(v[pos]),
            ElementBlock::String(v) => Value::String(v[pos].clone()),
            ElementBlock::Int(v) => Value::Int(v[pos]),
            ElementBlock::UInt(v) => Value::UInt(v[pos]),
        }
    }

    /// Overwrite the value at `pos`.  The value's category must match.
    pub fn set(&mut self, pos: usize, value: Value) -> Result<()> {
        match (self, value) {
            (ElementBlock::Numeric(v), Value::Numeric(x)) => v[pos] = x,
            (ElementBlock::Boolean(v), Value::Boolean(x)) => v[pos] = x,
            (ElementBlock::String(v), Value::String(x)) => v[pos] = x,
            (ElementBlock::Int(v), Value::Int(x)) => v[pos] = x,
            (ElementBlock::UInt(v), Value::UInt(x)) => v[pos] = x,
            _ => return Err(Error::TypeMismatch),
        }
        Ok(())
    }

    /// View the numeric storage, or fail with `TypeMismatch`.
    pub fn as_numeric(&self) -> Result<&[f64]> {
        match self {
            ElementBlock::Numeric(v) => Ok(v),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// View the boolean storage, or fail with `TypeMismatch`.
    pub fn as_boolean(&self) -> Result<&[bool]> {
        match self {
            ElementBlock::Boolean(v) => Ok(v),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// View the string storage, or fail with `TypeMismatch`.
    pub fn as_string(&self) -> Result<&[String]> {
        match self {
            ElementBlock::String(v) => Ok(v),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// View the signed integer storage, or fail with `TypeMismatch`.
    pub fn as_int(&self) -> Result<&[i64]> {
        match self {
            ElementBlock::Int(v) => Ok(v),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// View the unsigned integer storage, or fail with `TypeMismatch`.
    pub fn as_uint(&self) -> Result<&[u64]> {
        match self {
            ElementBlock::UInt(v) => Ok(v),
            _ => Err(Error::TypeMismatch),
        }
    }
}

/// Compare two optional blocks: two absent blocks are equal, an absent and
/// a present block are not, two present blocks compare by category and
/// element-wise content.
#[must_use]
pub fn blocks_equal(left: Option<&ElementBlock>, right: Option<&ElementBlock>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
