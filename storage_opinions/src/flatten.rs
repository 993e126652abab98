use crate::error::{OpinionError, Result};
use crate::presence::PresenceMatrix;

/// Collects the value of every set cell in row-major order.
///
/// `lookup` must return a value for each set cell; a missing value means the
/// bitmap and the opinion source disagree.
pub fn flatten<S, F>(matrix: &PresenceMatrix, mut lookup: F) -> Result<Vec<S>>
where
    F: FnMut(usize, usize) -> Option<S>,
{
    let mut values = Vec::with_capacity(matrix.count_ones());
    for (row, col) in matrix.iter() {
        let value = lookup(row, col).ok_or_else(|| {
            OpinionError::malformed(
                "opinions",
                format!("no value for present cell ({row}, {col})"),
            )
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Splits a flattened array back into per-row `(column, value)` runs.
///
/// A single cursor walks `values` in step with the bitmap; the two must agree
/// on the number of set cells.
pub fn unflatten<S: Copy>(matrix: &PresenceMatrix, values: &[S]) -> Result<Vec<Vec<(usize, S)>>> {
    let present = matrix.count_ones();
    if present != values.len() {
        return Err(OpinionError::malformed(
            "opinions",
            format!(
                "presence matrix has {present} cells, opinion array has {} values",
                values.len()
            ),
        ));
    }
    let mut rows = vec![Vec::new(); matrix.rows()];
    let mut cursor = values.iter();
    for (row, col) in matrix.iter() {
        // Length equality above guarantees the cursor stays in step.
        if let Some(value) = cursor.next() {
            rows[row].push((col, *value));
        }
    }
    Ok(rows)
}
