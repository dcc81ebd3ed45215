pub mod bplus_tree;
pub mod bplus_tree_page;
pub mod index_iterator;
pub mod key_comparator;

pub use bplus_tree::BPlusTree;
pub use bplus_tree_page::{
    BTreePageRef, InternalPage, InternalPageRef, LeafPage, LeafPageRef, INTERNAL_CAPACITY,
    LEAF_CAPACITY,
};
pub use index_iterator::IndexIterator;
pub use key_comparator::{KeyComparator, NumericComparator};
