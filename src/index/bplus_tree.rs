use std::path::Path;
use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, MutexGuard};

use crate::buffer::{BufferPoolManager, ReadPageGuard, WritePageGuard};
use crate::common::{
    PageId, RecordId, Result, SlotId, TarnError, HEADER_PAGE_ID, INVALID_PAGE_ID,
};
use crate::storage::page::{HeaderPage, HeaderPageRef};

use super::bplus_tree_page::{
    set_node_parent_id, BTreePageRef, InternalPage, InternalPageRef, LeafPage, LeafPageRef,
    INTERNAL_CAPACITY, LEAF_CAPACITY,
};
use super::index_iterator::IndexIterator;
use super::KeyComparator;

#[derive(Clone, Copy, PartialEq, Eq)]
enum TreeOp {
    Insert,
    Remove,
}

#[derive(Clone, Copy)]
enum DescendTarget {
    Leftmost,
    Rightmost,
    Key(u64),
}

/// State carried through one mutating operation: the root latch (released
/// once a safe node is reached), the chain of write guards from the deepest
/// retained ancestor down to the current node, and pages queued for deletion
/// once every latch is dropped.
struct WriteContext<'a> {
    root_guard: Option<MutexGuard<'a, PageId>>,
    guards: Vec<WritePageGuard>,
    deleted: Vec<PageId>,
}

/// A concurrent B+Tree index over buffer-pool pages. Readers descend with
/// shared latches under lock coupling; writers crab down with exclusive
/// latches, releasing ancestors as soon as a child is safe for the
/// operation. The root page id is persisted in the header page under the
/// index name.
pub struct BPlusTree {
    index_name: String,
    /// Root latch: guards the root page id during structural changes.
    root_page_id: Mutex<PageId>,
    bpm: Arc<BufferPoolManager>,
    comparator: Arc<dyn KeyComparator>,
    leaf_max_size: u16,
    internal_max_size: u16,
}

impl BPlusTree {
    /// Opens the index named `index_name`, adopting its persisted root from
    /// the header page if one exists.
    pub fn new(
        index_name: &str,
        bpm: Arc<BufferPoolManager>,
        comparator: Arc<dyn KeyComparator>,
        leaf_max_size: u16,
        internal_max_size: u16,
    ) -> Result<Self> {
        assert!(leaf_max_size >= 2 && (leaf_max_size as usize) < LEAF_CAPACITY);
        assert!(internal_max_size >= 3 && (internal_max_size as usize) < INTERNAL_CAPACITY);

        let root_page_id = {
            let guard = bpm.fetch_page_read(HEADER_PAGE_ID)?;
            let header = HeaderPageRef::new(guard.data());
            header.get_root_id(index_name)?.unwrap_or(INVALID_PAGE_ID)
        };

        Ok(Self {
            index_name: index_name.to_string(),
            root_page_id: Mutex::new(root_page_id),
            bpm,
            comparator,
            leaf_max_size,
            internal_max_size,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn root_page_id(&self) -> PageId {
        *self.root_page_id.lock()
    }

    pub fn is_empty(&self) -> bool {
        *self.root_page_id.lock() == INVALID_PAGE_ID
    }

    /// Point lookup. Returns None when the key is absent or the tree is empty.
    pub fn get_value(&self, key: u64) -> Result<Option<RecordId>> {
        let Some(guard) = self.find_leaf_read(DescendTarget::Key(key))? else {
            return Ok(None);
        };
        let leaf = LeafPageRef::new(guard.data());
        Ok(leaf.lookup(key, self.comparator.as_ref()))
    }

    /// Inserts a key/value pair. Returns false if the key already exists.
    pub fn insert(&self, key: u64, value: RecordId) -> Result<bool> {
        let root_guard = self.root_page_id.lock();
        if *root_guard == INVALID_PAGE_ID {
            self.start_new_tree(root_guard, key, value)?;
            return Ok(true);
        }

        let mut ctx = self.descend_for_write(root_guard, key, TreeOp::Insert)?;
        let leaf_index = ctx.guards.len() - 1;

        {
            let leaf = LeafPageRef::new(ctx.guards[leaf_index].data());
            if leaf.lookup(key, self.comparator.as_ref()).is_some() {
                return Ok(false);
            }
        }

        let new_size = {
            let mut leaf = LeafPage::new(ctx.guards[leaf_index].data_mut());
            leaf.insert(key, value, self.comparator.as_ref())
        };

        if new_size <= self.leaf_max_size {
            return Ok(true);
        }

        self.split_leaf(&mut ctx)?;
        Ok(true)
    }

    /// Removes a key. Removing from an empty tree is an error; an absent key
    /// is a silent no-op after descent.
    pub fn remove(&self, key: u64) -> Result<()> {
        let root_guard = self.root_page_id.lock();
        if *root_guard == INVALID_PAGE_ID {
            return Err(TarnError::TreeEmpty);
        }

        let mut ctx = self.descend_for_write(root_guard, key, TreeOp::Remove)?;
        let leaf_index = ctx.guards.len() - 1;

        {
            let leaf = LeafPageRef::new(ctx.guards[leaf_index].data());
            if leaf.lookup(key, self.comparator.as_ref()).is_none() {
                return Ok(());
            }
        }

        {
            let mut leaf = LeafPage::new(ctx.guards[leaf_index].data_mut());
            leaf.remove_and_delete_record(key, self.comparator.as_ref());
        }

        let underflow = {
            let page = BTreePageRef::new(ctx.guards[leaf_index].data());
            if page.is_root() {
                page.size() == 0
            } else {
                page.size() < page.min_size()
            }
        };

        if underflow {
            self.coalesce_or_redistribute(&mut ctx)?;
        }

        // Deleted pages are handed back only after every latch is released.
        let deleted = std::mem::take(&mut ctx.deleted);
        drop(ctx);
        for page_id in deleted {
            self.bpm.delete_page(page_id)?;
        }
        Ok(())
    }

    /// Cursor at the first entry of the tree.
    pub fn begin(&self) -> Result<IndexIterator> {
        match self.find_leaf_read(DescendTarget::Leftmost)? {
            Some(guard) => IndexIterator::new(Arc::clone(&self.bpm), guard, 0),
            None => Ok(IndexIterator::sentinel()),
        }
    }

    /// Cursor at the first entry with a key >= `key`.
    pub fn begin_at(&self, key: u64) -> Result<IndexIterator> {
        match self.find_leaf_read(DescendTarget::Key(key))? {
            Some(guard) => {
                let index = LeafPageRef::new(guard.data()).key_index(key, self.comparator.as_ref());
                IndexIterator::new(Arc::clone(&self.bpm), guard, index)
            }
            None => Ok(IndexIterator::sentinel()),
        }
    }

    /// Cursor one past the last entry; equal to any exhausted forward cursor.
    pub fn end(&self) -> Result<IndexIterator> {
        match self.find_leaf_read(DescendTarget::Rightmost)? {
            Some(guard) => {
                let index = LeafPageRef::new(guard.data()).size() as usize;
                IndexIterator::new(Arc::clone(&self.bpm), guard, index)
            }
            None => Ok(IndexIterator::sentinel()),
        }
    }

    /// Reads whitespace-separated integer keys from a file and inserts them
    /// one by one, deriving each record id from its key.
    pub fn insert_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = std::fs::read_to_string(path)?;
        for token in contents.split_whitespace() {
            if let Ok(key) = token.parse::<u64>() {
                self.insert(key, RecordId::new(PageId::new(key as u32), SlotId::new(0)))?;
            }
        }
        Ok(())
    }

    /// Reads whitespace-separated integer keys from a file and removes them
    /// one by one.
    pub fn remove_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = std::fs::read_to_string(path)?;
        for token in contents.split_whitespace() {
            if let Ok(key) = token.parse::<u64>() {
                self.remove(key)?;
            }
        }
        Ok(())
    }

    /// Descends with shared latches, coupling child before parent release.
    fn find_leaf_read(&self, target: DescendTarget) -> Result<Option<ReadPageGuard>> {
        let root = self.root_page_id.lock();
        if *root == INVALID_PAGE_ID {
            return Ok(None);
        }
        // The root latch is held until the root page is latched so the page
        // cannot be deleted out from under us by a root adjustment.
        let mut guard = self.bpm.fetch_page_read(*root)?;
        drop(root);

        loop {
            if BTreePageRef::new(guard.data()).is_leaf() {
                return Ok(Some(guard));
            }
            let child_id = {
                let node = InternalPageRef::new(guard.data());
                match target {
                    DescendTarget::Leftmost => node.value_at(0),
                    DescendTarget::Rightmost => node.value_at(node.size() as usize - 1),
                    DescendTarget::Key(key) => node.lookup(key, self.comparator.as_ref()),
                }
            };
            let child_guard = self.bpm.fetch_page_read(child_id)?;
            guard = child_guard;
        }
    }

    /// Descends with exclusive latches. Reaching a child that is safe for
    /// `op` releases every ancestor latch and the root latch; the returned
    /// context holds the chain from the deepest retained ancestor to the
    /// leaf.
    fn descend_for_write<'a>(
        &'a self,
        root_guard: MutexGuard<'a, PageId>,
        key: u64,
        op: TreeOp,
    ) -> Result<WriteContext<'a>> {
        let root_id = *root_guard;
        let mut ctx = WriteContext {
            root_guard: Some(root_guard),
            guards: Vec::new(),
            deleted: Vec::new(),
        };
        ctx.guards.push(self.bpm.fetch_page_write(root_id)?);

        loop {
            let current = ctx.guards.last().unwrap();
            if BTreePageRef::new(current.data()).is_leaf() {
                return Ok(ctx);
            }

            let child_id = InternalPageRef::new(current.data()).lookup(key, self.comparator.as_ref());
            let child_guard = self.bpm.fetch_page_write(child_id)?;

            let child_safe = {
                let child = BTreePageRef::new(child_guard.data());
                match op {
                    TreeOp::Insert => child.size() < child.max_size(),
                    TreeOp::Remove => child.size() > child.min_size(),
                }
            };
            if child_safe {
                ctx.guards.clear();
                ctx.root_guard = None;
            }
            ctx.guards.push(child_guard);
        }
    }

    /// Creates the root leaf for the first insertion, holding the root latch
    /// throughout, and records the root id in the header page.
    fn start_new_tree(
        &self,
        mut root_guard: MutexGuard<'_, PageId>,
        key: u64,
        value: RecordId,
    ) -> Result<()> {
        let mut guard = self.bpm.new_page()?;
        let page_id = guard.page_id();
        {
            let mut leaf = LeafPage::new(guard.data_mut());
            leaf.init(page_id, INVALID_PAGE_ID, self.leaf_max_size);
            leaf.insert(key, value, self.comparator.as_ref());
        }

        *root_guard = page_id;
        if let Err(e) = self.sync_root_record(page_id) {
            *root_guard = INVALID_PAGE_ID;
            drop(guard);
            let _ = self.bpm.delete_page(page_id);
            return Err(e);
        }
        debug!("index {}: created root leaf {}", self.index_name, page_id);
        Ok(())
    }

    /// Writes the current root page id into the header page, creating the
    /// record on first use.
    fn sync_root_record(&self, root_page_id: PageId) -> Result<()> {
        let mut guard = self.bpm.fetch_page_write(HEADER_PAGE_ID)?;
        let mut header = HeaderPage::new(guard.data_mut());
        if !header.update_record(&self.index_name, root_page_id)? {
            header.insert_record(&self.index_name, root_page_id)?;
        }
        Ok(())
    }

    /// Splits the overfull leaf at the end of the guard chain: upper half to
    /// a fresh sibling, leaf chain relinked, first key of the sibling
    /// promoted into the parent. On failure the split is unwound and the
    /// sibling deallocated.
    fn split_leaf(&self, ctx: &mut WriteContext<'_>) -> Result<()> {
        let leaf_index = ctx.guards.len() - 1;

        let mut sibling_guard = self.bpm.new_page()?;
        let sibling_id = sibling_guard.page_id();

        let promoted = {
            let mut sibling = LeafPage::new(sibling_guard.data_mut());
            let mut leaf = LeafPage::new(ctx.guards[leaf_index].data_mut());
            sibling.init(sibling_id, leaf.parent_page_id(), self.leaf_max_size);
            leaf.move_half_to(&mut sibling);
            sibling.set_next_page_id(leaf.next_page_id());
            leaf.set_next_page_id(sibling_id);
            sibling.key_at(0)
        };
        debug!(
            "index {}: split leaf {} -> {} at key {}",
            self.index_name,
            ctx.guards[leaf_index].page_id(),
            sibling_id,
            promoted
        );

        if let Err(e) = self.insert_into_parent(ctx, leaf_index, promoted, &mut sibling_guard) {
            {
                let mut sibling = LeafPage::new(sibling_guard.data_mut());
                let mut leaf = LeafPage::new(ctx.guards[leaf_index].data_mut());
                sibling.move_all_to(&mut leaf);
            }
            drop(sibling_guard);
            let _ = self.bpm.delete_page(sibling_id);
            return Err(e);
        }
        Ok(())
    }

    /// Links a freshly split-off node into the tree above `child_index`.
    /// The parent (when one exists) is still write-latched in the guard
    /// chain; a full parent splits in turn, and a split of the root installs
    /// a new root under the root latch.
    fn insert_into_parent(
        &self,
        ctx: &mut WriteContext<'_>,
        child_index: usize,
        key: u64,
        new_node: &mut WritePageGuard,
    ) -> Result<()> {
        let child_id = ctx.guards[child_index].page_id();
        let new_id = new_node.page_id();

        if child_index == 0 {
            // The topmost retained node split, which on a fully retained
            // path means the root did.
            debug_assert!(BTreePageRef::new(ctx.guards[0].data()).is_root());

            let mut root_guard = self.bpm.new_page()?;
            let root_id = root_guard.page_id();
            {
                let mut root = InternalPage::new(root_guard.data_mut());
                root.init(root_id, INVALID_PAGE_ID, self.internal_max_size);
                root.populate_new_root(child_id, key, new_id);
            }
            set_node_parent_id(ctx.guards[child_index].data_mut(), root_id);
            set_node_parent_id(new_node.data_mut(), root_id);

            let root_latch = ctx
                .root_guard
                .as_mut()
                .expect("root latch is held while the root splits");
            **root_latch = root_id;

            if let Err(e) = self.sync_root_record(root_id) {
                **root_latch = child_id;
                set_node_parent_id(ctx.guards[child_index].data_mut(), INVALID_PAGE_ID);
                set_node_parent_id(new_node.data_mut(), INVALID_PAGE_ID);
                drop(root_guard);
                let _ = self.bpm.delete_page(root_id);
                return Err(e);
            }
            debug!("index {}: new root {}", self.index_name, root_id);
            return Ok(());
        }

        let parent_index = child_index - 1;
        let parent_id = ctx.guards[parent_index].page_id();

        let new_size = {
            let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
            parent.insert_node_after(child_id, key, new_id)
        };
        set_node_parent_id(new_node.data_mut(), parent_id);

        if new_size <= self.internal_max_size {
            return Ok(());
        }

        // The parent overflowed: split it too.
        let mut new_parent_guard = match self.bpm.new_page() {
            Ok(guard) => guard,
            Err(e) => {
                let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
                let index = parent.value_index(new_id).expect("entry was just inserted");
                parent.remove(index);
                return Err(e);
            }
        };
        let new_parent_id = new_parent_guard.page_id();

        let (promoted, moved_children) = {
            let mut new_parent = InternalPage::new(new_parent_guard.data_mut());
            let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
            new_parent.init(new_parent_id, parent.parent_page_id(), self.internal_max_size);
            parent.move_half_to(&mut new_parent)
        };
        debug!(
            "index {}: split internal {} -> {} at key {}",
            self.index_name, parent_id, new_parent_id, promoted
        );

        // Reparent the moved children. The split child and the new sibling
        // may be among them; both are already write-latched by us, and no
        // other moved child is below a latch we hold.
        let mut flipped = Vec::new();
        let mut failure = None;
        for &moved in &moved_children {
            if moved == child_id {
                set_node_parent_id(ctx.guards[child_index].data_mut(), new_parent_id);
            } else if moved == new_id {
                set_node_parent_id(new_node.data_mut(), new_parent_id);
            } else {
                match self.bpm.fetch_page_write(moved) {
                    Ok(mut guard) => {
                        set_node_parent_id(guard.data_mut(), new_parent_id);
                        flipped.push(moved);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        if failure.is_none() {
            match self.insert_into_parent(ctx, parent_index, promoted, &mut new_parent_guard) {
                Ok(()) => return Ok(()),
                Err(e) => failure = Some(e),
            }
        }

        // Unwind this level: merge the halves back, pull the pending entry
        // out again, restore parent pointers, drop the new page.
        let error = failure.unwrap();
        {
            let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
            let mut new_parent = InternalPage::new(new_parent_guard.data_mut());
            new_parent.move_all_to(&mut parent, promoted);
            let index = parent.value_index(new_id).expect("pending entry is present");
            parent.remove(index);
        }
        for &moved in &flipped {
            if let Ok(mut guard) = self.bpm.fetch_page_write(moved) {
                set_node_parent_id(guard.data_mut(), parent_id);
            }
        }
        set_node_parent_id(ctx.guards[child_index].data_mut(), parent_id);
        set_node_parent_id(new_node.data_mut(), parent_id);
        drop(new_parent_guard);
        let _ = self.bpm.delete_page(new_parent_id);
        Err(error)
    }

    /// Handles underflow at the end of the guard chain, walking upward as
    /// merges drain the parent. The sibling is always the left one when it
    /// exists, otherwise the right one.
    fn coalesce_or_redistribute(&self, ctx: &mut WriteContext<'_>) -> Result<()> {
        loop {
            let level = ctx.guards.len() - 1;
            let (node_id, node_is_root, node_is_leaf, node_size, node_max) = {
                let page = BTreePageRef::new(ctx.guards[level].data());
                (
                    page.page_id(),
                    page.is_root(),
                    page.is_leaf(),
                    page.size(),
                    page.max_size(),
                )
            };

            if node_is_root {
                return self.adjust_root(ctx);
            }

            let parent_index = level - 1;
            let parent_id = ctx.guards[parent_index].page_id();
            let index_in_parent = {
                let parent = InternalPageRef::new(ctx.guards[parent_index].data());
                parent.value_index(node_id).ok_or_else(|| {
                    TarnError::Corrupted(format!(
                        "node {} missing from its parent {}",
                        node_id, parent_id
                    ))
                })?
            };

            let (sibling_index, sibling_is_right) = if index_in_parent == 0 {
                (1, true)
            } else {
                (index_in_parent - 1, false)
            };
            let sibling_id = {
                let parent = InternalPageRef::new(ctx.guards[parent_index].data());
                parent.value_at(sibling_index)
            };
            let mut sibling_guard = self.bpm.fetch_page_write(sibling_id)?;
            let sibling_size = BTreePageRef::new(sibling_guard.data()).size();

            if node_size + sibling_size <= node_max {
                // Coalesce: the right participant empties into the left one
                // and its separator slot leaves the parent.
                debug!(
                    "index {}: coalescing {} and {}",
                    self.index_name, node_id, sibling_id
                );
                if sibling_is_right {
                    let middle_key = {
                        let parent = InternalPageRef::new(ctx.guards[parent_index].data());
                        parent.key_at(1)
                    };
                    if node_is_leaf {
                        let mut sibling = LeafPage::new(sibling_guard.data_mut());
                        let mut node = LeafPage::new(ctx.guards[level].data_mut());
                        sibling.move_all_to(&mut node);
                    } else {
                        let moved = {
                            let mut sibling = InternalPage::new(sibling_guard.data_mut());
                            let mut node = InternalPage::new(ctx.guards[level].data_mut());
                            sibling.move_all_to(&mut node, middle_key)
                        };
                        self.reparent(&moved, node_id)?;
                    }
                    {
                        let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
                        parent.remove(1);
                    }
                    ctx.deleted.push(sibling_id);
                } else {
                    let middle_key = {
                        let parent = InternalPageRef::new(ctx.guards[parent_index].data());
                        parent.key_at(index_in_parent)
                    };
                    if node_is_leaf {
                        let mut node = LeafPage::new(ctx.guards[level].data_mut());
                        let mut sibling = LeafPage::new(sibling_guard.data_mut());
                        node.move_all_to(&mut sibling);
                    } else {
                        let moved = {
                            let mut node = InternalPage::new(ctx.guards[level].data_mut());
                            let mut sibling = InternalPage::new(sibling_guard.data_mut());
                            node.move_all_to(&mut sibling, middle_key)
                        };
                        self.reparent(&moved, sibling_id)?;
                    }
                    {
                        let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
                        parent.remove(index_in_parent);
                    }
                    ctx.deleted.push(node_id);
                }

                let parent_underflow = {
                    let page = BTreePageRef::new(ctx.guards[parent_index].data());
                    if page.is_root() {
                        page.size() == 1
                    } else {
                        page.size() < page.min_size()
                    }
                };
                if !parent_underflow {
                    return Ok(());
                }
                // Release everything below the parent before walking up, so
                // no later page fetch can land under a latch we still hold.
                drop(sibling_guard);
                ctx.guards.truncate(level);
                continue;
            }

            // Redistribute a single entry and refresh the parent separator.
            debug!(
                "index {}: redistributing between {} and {}",
                self.index_name, node_id, sibling_id
            );
            if sibling_is_right {
                if node_is_leaf {
                    let separator = {
                        let mut sibling = LeafPage::new(sibling_guard.data_mut());
                        let mut node = LeafPage::new(ctx.guards[level].data_mut());
                        sibling.move_first_to_end_of(&mut node);
                        sibling.key_at(0)
                    };
                    let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
                    parent.set_key_at(1, separator);
                } else {
                    let middle_key = {
                        let parent = InternalPageRef::new(ctx.guards[parent_index].data());
                        parent.key_at(1)
                    };
                    let (promoted, moved_child) = {
                        let mut sibling = InternalPage::new(sibling_guard.data_mut());
                        let mut node = InternalPage::new(ctx.guards[level].data_mut());
                        sibling.move_first_to_end_of(&mut node, middle_key)
                    };
                    {
                        let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
                        parent.set_key_at(1, promoted);
                    }
                    self.reparent(&[moved_child], node_id)?;
                }
            } else if node_is_leaf {
                let separator = {
                    let mut sibling = LeafPage::new(sibling_guard.data_mut());
                    let mut node = LeafPage::new(ctx.guards[level].data_mut());
                    sibling.move_last_to_front_of(&mut node);
                    node.key_at(0)
                };
                let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
                parent.set_key_at(index_in_parent, separator);
            } else {
                let middle_key = {
                    let parent = InternalPageRef::new(ctx.guards[parent_index].data());
                    parent.key_at(index_in_parent)
                };
                let (promoted, moved_child) = {
                    let mut sibling = InternalPage::new(sibling_guard.data_mut());
                    let mut node = InternalPage::new(ctx.guards[level].data_mut());
                    sibling.move_last_to_front_of(&mut node, middle_key)
                };
                {
                    let mut parent = InternalPage::new(ctx.guards[parent_index].data_mut());
                    parent.set_key_at(index_in_parent, promoted);
                }
                self.reparent(&[moved_child], node_id)?;
            }
            return Ok(());
        }
    }

    /// Shrinks or empties the root. An internal root left with a single
    /// child promotes that child; an empty leaf root empties the tree. Both
    /// queue the old root for deletion and persist the new root id.
    fn adjust_root(&self, ctx: &mut WriteContext<'_>) -> Result<()> {
        let root_index = ctx.guards.len() - 1;
        let (root_id, is_leaf, size) = {
            let page = BTreePageRef::new(ctx.guards[root_index].data());
            (page.page_id(), page.is_leaf(), page.size())
        };

        if !is_leaf && size == 1 {
            let child_id = {
                let root = InternalPageRef::new(ctx.guards[root_index].data());
                root.value_at(0)
            };
            let root_latch = ctx
                .root_guard
                .as_mut()
                .expect("root latch is held while the root is replaced");
            **root_latch = child_id;
            self.sync_root_record(child_id)?;

            // Guards below the root were released while walking up, so the
            // surviving child is never latched by us here.
            let mut child_guard = self.bpm.fetch_page_write(child_id)?;
            set_node_parent_id(child_guard.data_mut(), INVALID_PAGE_ID);

            ctx.deleted.push(root_id);
            debug!("index {}: root collapsed into {}", self.index_name, child_id);
        } else if is_leaf && size == 0 {
            let root_latch = ctx
                .root_guard
                .as_mut()
                .expect("root latch is held while the root is replaced");
            **root_latch = INVALID_PAGE_ID;
            self.sync_root_record(INVALID_PAGE_ID)?;
            ctx.deleted.push(root_id);
            debug!("index {}: now empty", self.index_name);
        }
        Ok(())
    }

    /// Points each page at its new parent. None of the pages is below a
    /// latch held in the current operation.
    fn reparent(&self, children: &[PageId], parent_id: PageId) -> Result<()> {
        for &child_id in children {
            let mut guard = self.bpm.fetch_page_write(child_id)?;
            set_node_parent_id(guard.data_mut(), parent_id);
        }
        Ok(())
    }
}
