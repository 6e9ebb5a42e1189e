/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::mem;

/// A flat table whose writes can be undone.
///
/// Between [`begin`](CacheTable::begin) and [`commit`](CacheTable::commit) or
/// [`rollback`](CacheTable::rollback), every write records the overwritten value.
/// Rolling back replays the record in reverse, so the cost is proportional to the
/// number of writes made during the trial and the restored contents are bit-for-bit
/// the old ones.
#[derive(Debug, Clone)]
pub struct CacheTable<T> {
    values: Vec<T>,
    journal: Option<Vec<(usize, T)>>,
}

impl<T: Clone> CacheTable<T> {
    pub fn new(len: usize, fill: T) -> Self {
        CacheTable { values: vec![fill; len], journal: None }
    }

    pub fn len(&self) -> usize { self.values.len() }

    #[inline(always)]
    pub fn get(&self, index: usize) -> &T { &self.values[index] }

    pub fn as_slice(&self) -> &[T] { &self.values }

    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        let old = mem::replace(&mut self.values[index], value);
        if let Some(journal) = self.journal.as_mut() {
            journal.push((index, old));
        }
    }

    pub fn is_journaling(&self) -> bool { self.journal.is_some() }

    /// Start recording writes.
    pub fn begin(&mut self) {
        self.journal = Some(vec![]);
    }

    /// Keep every write since `begin`.
    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every write since `begin`.
    pub fn rollback(&mut self) {
        if let Some(journal) = self.journal.take() {
            trace!("rolling back {} table writes", journal.len());
            for (index, old) in journal.into_iter().rev() {
                self.values[index] = old;
            }
        }
    }
}
