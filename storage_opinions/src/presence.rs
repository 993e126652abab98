//! Row-major, MSB-first presence bitmap of (judging, judged) opinion cells.

use crate::error::{OpinionError, Result};

const SECTION: &str = "presence matrix";

/// Packed `rows × cols` bitmap. Cell `(i, j)` lives at bit `i * cols + j`,
/// stored MSB-first within each byte. Padding bits past the last cell are
/// written as zero and ignored on read.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PresenceMatrix {
    rows: usize,
    cols: usize,
    bytes: Vec<u8>,
}

impl PresenceMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            bytes: vec![0u8; Self::byte_len(rows, cols)],
        }
    }

    /// Number of bytes needed for a `rows × cols` grid.
    pub fn byte_len(rows: usize, cols: usize) -> usize {
        (rows * cols + 7) / 8
    }

    /// Packs `cells` into a fresh bitmap. Cells outside the grid are rejected.
    pub fn encode<I>(rows: usize, cols: usize, cells: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut matrix = Self::new(rows, cols);
        for (row, col) in cells {
            matrix.set(row, col)?;
        }
        Ok(matrix.bytes)
    }

    /// Wraps an encoded bitmap. The byte length must match the grid exactly;
    /// padding bits are cleared.
    pub fn from_bytes(bytes: &[u8], rows: usize, cols: usize) -> Result<Self> {
        let expected = Self::byte_len(rows, cols);
        if bytes.len() != expected {
            return Err(OpinionError::malformed(
                SECTION,
                format!(
                    "{rows}x{cols} grid needs {expected} bytes, found {}",
                    bytes.len()
                ),
            ));
        }
        let mut bytes = bytes.to_vec();
        let tail = (rows * cols) % 8;
        if tail != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= !(0xFFu8 >> tail);
            }
        }
        Ok(Self { rows, cols, bytes })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn locate(&self, row: usize, col: usize) -> Result<(usize, u8)> {
        if row >= self.rows || col >= self.cols {
            return Err(OpinionError::malformed(
                SECTION,
                format!(
                    "cell ({row}, {col}) outside {}x{} grid",
                    self.rows, self.cols
                ),
            ));
        }
        let bit = row * self.cols + col;
        Ok((bit / 8, 0x80 >> (bit % 8)))
    }

    pub fn set(&mut self, row: usize, col: usize) -> Result<()> {
        let (byte, mask) = self.locate(row, col)?;
        self.bytes[byte] |= mask;
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        match self.locate(row, col) {
            Ok((byte, mask)) => self.bytes[byte] & mask != 0,
            Err(_) => false,
        }
    }

    /// Number of set cells, not counting padding bits.
    pub fn count_ones(&self) -> usize {
        let cells = self.cell_count();
        let full = cells / 8;
        let mut total: usize = self.bytes[..full]
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum();
        let tail = cells % 8;
        if tail != 0 {
            let mask = !(0xFFu8 >> tail);
            total += (self.bytes[full] & mask).count_ones() as usize;
        }
        total
    }

    /// Number of set cells in `row`.
    pub fn row_count(&self, row: usize) -> usize {
        self.row(row).count()
    }

    /// Set columns of `row`, ascending.
    pub fn row(&self, row: usize) -> RowCells<'_> {
        RowCells {
            matrix: self,
            row,
            col: if row < self.rows { 0 } else { self.cols },
        }
    }

    /// Whether `col` has at least one set cell.
    pub fn column_present(&self, col: usize) -> bool {
        (0..self.rows).any(|row| self.get(row, col))
    }

    /// Every set cell in row-major order.
    pub fn iter(&self) -> PresentCells<'_> {
        PresentCells {
            matrix: self,
            bit: 0,
        }
    }
}

/// Set cells of a [`PresenceMatrix`] in row-major order.
#[derive(Clone, Debug)]
pub struct PresentCells<'a> {
    matrix: &'a PresenceMatrix,
    bit: usize,
}

impl Iterator for PresentCells<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let cells = self.matrix.cell_count();
        while self.bit < cells {
            let bit = self.bit;
            self.bit += 1;
            if self.matrix.bytes[bit / 8] & (0x80 >> (bit % 8)) != 0 {
                return Some((bit / self.matrix.cols, bit % self.matrix.cols));
            }
        }
        None
    }
}

/// Set columns of a single row.
#[derive(Clone, Debug)]
pub struct RowCells<'a> {
    matrix: &'a PresenceMatrix,
    row: usize,
    col: usize,
}

impl Iterator for RowCells<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.col < self.matrix.cols {
            let col = self.col;
            self.col += 1;
            if self.matrix.get(self.row, col) {
                return Some(col);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_msb_first_row_major() {
        let bytes = PresenceMatrix::encode(2, 5, [(0, 0), (0, 4), (1, 2)]).expect("encode");
        // bits: 10001 00100 + 6 zero padding bits
        assert_eq!(bytes, vec![0b1000_1001, 0b0000_0000]);
    }

    #[test]
    fn padding_is_ignored_on_read() {
        let matrix = PresenceMatrix::from_bytes(&[0b1111_1111], 1, 3).expect("decode");
        assert_eq!(matrix.count_ones(), 3);
        assert_eq!(matrix.iter().collect::<Vec<_>>(), vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(matrix.as_bytes(), &[0b1110_0000]);
    }

    #[test]
    fn short_or_long_buffers_are_malformed() {
        assert!(PresenceMatrix::from_bytes(&[0u8; 3], 5, 6).is_err());
        assert!(PresenceMatrix::from_bytes(&[0u8; 5], 5, 6).is_err());
        assert!(PresenceMatrix::from_bytes(&[0u8; 4], 5, 6).is_ok());
    }

    #[test]
    fn cells_outside_grid_are_rejected() {
        assert!(PresenceMatrix::encode(2, 2, [(2, 0)]).is_err());
        assert!(PresenceMatrix::encode(2, 2, [(0, 2)]).is_err());
    }

    #[test]
    fn empty_grid_has_no_bytes() {
        let matrix = PresenceMatrix::new(0, 7);
        assert!(matrix.as_bytes().is_empty());
        assert_eq!(matrix.count_ones(), 0);
        assert_eq!(matrix.iter().count(), 0);
    }

    #[test]
    fn rows_and_columns_follow_bits() {
        let bytes = PresenceMatrix::encode(3, 3, [(0, 1), (2, 0), (2, 2)]).expect("encode");
        let matrix = PresenceMatrix::from_bytes(&bytes, 3, 3).expect("decode");
        assert_eq!(matrix.row(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(matrix.row_count(1), 0);
        assert_eq!(matrix.row(2).collect::<Vec<_>>(), vec![0, 2]);
        assert!(matrix.column_present(0));
        assert!(matrix.column_present(1));
        assert!(matrix.column_present(2));
        assert!(!matrix.get(1, 1));
        assert_eq!(matrix.row(9).count(), 0);
    }
}
