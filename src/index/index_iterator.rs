use std::sync::Arc;

use crate::buffer::{BufferPoolManager, ReadPageGuard};
use crate::common::{PageId, RecordId, Result, TarnError, INVALID_PAGE_ID};

use super::bplus_tree_page::LeafPageRef;

/// Forward cursor over the leaf chain. The current leaf stays pinned (and
/// share-latched) for as long as the cursor points into it; advancing past
/// it releases the leaf before the next one is fetched, and dropping the
/// cursor releases whatever it holds.
pub struct IndexIterator {
    bpm: Option<Arc<BufferPoolManager>>,
    page_id: PageId,
    index: usize,
    leaf: Option<ReadPageGuard>,
}

impl IndexIterator {
    pub(crate) fn new(
        bpm: Arc<BufferPoolManager>,
        leaf: ReadPageGuard,
        index: usize,
    ) -> Result<Self> {
        let mut iterator = Self {
            bpm: Some(bpm),
            page_id: leaf.page_id(),
            index,
            leaf: Some(leaf),
        };
        iterator.skip_exhausted_leaf()?;
        Ok(iterator)
    }

    /// Detached end cursor, used for an empty tree.
    pub(crate) fn sentinel() -> Self {
        Self {
            bpm: None,
            page_id: INVALID_PAGE_ID,
            index: 0,
            leaf: None,
        }
    }

    /// True once no entry remains at or after the cursor position.
    pub fn is_end(&self) -> bool {
        match &self.leaf {
            None => true,
            Some(guard) => {
                let leaf = LeafPageRef::new(guard.data());
                self.index >= leaf.size() as usize && leaf.next_page_id() == INVALID_PAGE_ID
            }
        }
    }

    /// The entry under the cursor. Dereferencing past the end is an error.
    pub fn get(&self) -> Result<(u64, RecordId)> {
        let Some(guard) = &self.leaf else {
            return Err(TarnError::IteratorOutOfRange);
        };
        let leaf = LeafPageRef::new(guard.data());
        if self.index >= leaf.size() as usize {
            return Err(TarnError::IteratorOutOfRange);
        }
        Ok(leaf.item(self.index))
    }

    /// Steps one entry forward, hopping to the next leaf when the current
    /// one is exhausted.
    pub fn advance(&mut self) -> Result<()> {
        if self.leaf.is_none() {
            return Ok(());
        }
        self.index += 1;
        self.skip_exhausted_leaf()
    }

    /// Moves off leaves the cursor has stepped past. The true end position
    /// (past the last entry of the rightmost leaf) is kept as-is so that
    /// every exhausted cursor lands on the same spot.
    fn skip_exhausted_leaf(&mut self) -> Result<()> {
        loop {
            let next = match &self.leaf {
                None => return Ok(()),
                Some(guard) => {
                    let leaf = LeafPageRef::new(guard.data());
                    if self.index < leaf.size() as usize {
                        return Ok(());
                    }
                    leaf.next_page_id()
                }
            };
            if next == INVALID_PAGE_ID {
                return Ok(());
            }

            // Release the old leaf before pinning the next one.
            self.leaf = None;
            let bpm = self.bpm.as_ref().expect("cursor with a leaf has a pool");
            let guard = bpm.fetch_page_read(next)?;
            self.page_id = next;
            self.index = 0;
            self.leaf = Some(guard);
        }
    }
}

impl PartialEq for IndexIterator {
    fn eq(&self, other: &Self) -> bool {
        self.page_id == other.page_id && self.index == other.index
    }
}

impl Eq for IndexIterator {}

impl Iterator for IndexIterator {
    type Item = Result<(u64, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_end() {
            return None;
        }
        match self.get() {
            Ok(item) => match self.advance() {
                Ok(()) => Some(Ok(item)),
                Err(e) => Some(Err(e)),
            },
            Err(e) => Some(Err(e)),
        }
    }
}
