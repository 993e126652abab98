//! Read-side views over a decoded [`OpinionPayload`].
//!
//! Nothing here materializes a judging × judged grid: every iterator walks the
//! presence bitmap and the flattened opinion array in step.

use core::slice;

use crate::keys::{ParticipantKey, Signature};
use crate::payload::{OpinionHeader, OpinionPayload};
use crate::presence::{PresentCells, RowCells};
use crate::wire::OpinionScalar;

/// `(judge, judged, value)` for every present cell, row-major.
pub struct Triples<'a, S> {
    judging: &'a [ParticipantKey],
    judged: &'a [ParticipantKey],
    cells: PresentCells<'a>,
    values: slice::Iter<'a, S>,
}

impl<'a, S: OpinionScalar> Iterator for Triples<'a, S> {
    type Item = (&'a ParticipantKey, &'a ParticipantKey, S);

    fn next(&mut self) -> Option<Self::Item> {
        let (row, col) = self.cells.next()?;
        let value = self.values.next()?;
        Some((&self.judging[row], &self.judged[col], *value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

/// One judging key's slice of the record.
#[derive(Clone, Debug)]
pub struct JudgeRow<'a, S> {
    index: usize,
    judge: &'a ParticipantKey,
    signature: &'a Signature,
    judged: &'a [ParticipantKey],
    columns: RowCells<'a>,
    values: &'a [S],
}

impl<'a, S: OpinionScalar + 'a> JudgeRow<'a, S> {
    /// Row position in canonical judging order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn judge(&self) -> &'a ParticipantKey {
        self.judge
    }

    pub fn signature(&self) -> &'a Signature {
        self.signature
    }

    /// Number of keys this judge rated.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(judged, value)` pairs in canonical judged order.
    pub fn cells(&self) -> impl Iterator<Item = (&'a ParticipantKey, S)> + 'a {
        let judged = self.judged;
        self.columns
            .clone()
            .zip(self.values.iter().copied())
            .map(move |(col, value)| (&judged[col], value))
    }
}

/// Judging rows in canonical order.
pub struct Rows<'a, H: OpinionHeader> {
    payload: &'a OpinionPayload<H>,
    row: usize,
    cursor: usize,
}

impl<'a, H: OpinionHeader> Iterator for Rows<'a, H> {
    type Item = JudgeRow<'a, H::Scalar>;

    fn next(&mut self) -> Option<Self::Item> {
        let payload = self.payload;
        let partition = payload.partition();
        if self.row >= partition.total_judging() {
            return None;
        }
        let index = self.row;
        let count = payload.presence().row_count(index);
        let values = payload.opinions().get(self.cursor..self.cursor + count)?;
        self.row += 1;
        self.cursor += count;
        Some(JudgeRow {
            index,
            judge: &partition.judging_keys()[index],
            signature: &payload.signatures()[index],
            judged: partition.judged_keys(),
            columns: payload.presence().row(index),
            values,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.payload.partition().total_judging() - self.row;
        (left, Some(left))
    }
}

/// Receiver for decoded opinions, driven one judging row at a time.
pub trait OpinionObserver<S> {
    type Error;

    fn begin_judge(&mut self, _judge: &ParticipantKey) -> Result<(), Self::Error> {
        Ok(())
    }

    fn observe(
        &mut self,
        judge: &ParticipantKey,
        judged: &ParticipantKey,
        value: S,
    ) -> Result<(), Self::Error>;

    fn end_judge(&mut self, _judge: &ParticipantKey) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<H: OpinionHeader> OpinionPayload<H> {
    pub fn triples(&self) -> Triples<'_, H::Scalar> {
        Triples {
            judging: self.partition().judging_keys(),
            judged: self.partition().judged_keys(),
            cells: self.presence().iter(),
            values: self.opinions().iter(),
        }
    }

    pub fn rows(&self) -> Rows<'_, H> {
        Rows {
            payload: self,
            row: 0,
            cursor: 0,
        }
    }

    /// Feeds every row to `observer`, stopping at its first error.
    pub fn dispatch<O>(&self, observer: &mut O) -> Result<(), O::Error>
    where
        O: OpinionObserver<H::Scalar> + ?Sized,
    {
        for row in self.rows() {
            let judge = row.judge();
            observer.begin_judge(judge)?;
            for (judged, value) in row.cells() {
                observer.observe(judge, judged, value)?;
            }
            observer.end_judge(judge)?;
        }
        Ok(())
    }
}
