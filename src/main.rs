use std::sync::Arc;

use tarn::buffer::{BufferPoolManager, ReplacerPolicy};
use tarn::index::{BPlusTree, NumericComparator};
use tarn::storage::disk::DiskManager;
use tarn::{PageId, RecordId, SlotId};

fn main() {
    println!("Tarn - a disk-oriented storage core in Rust");
    println!("===========================================\n");

    let db_path = "demo.db";

    let disk_manager = Arc::new(DiskManager::new(db_path).expect("failed to create disk manager"));
    println!("Opened database file: {}", db_path);

    let bpm = Arc::new(BufferPoolManager::new(
        16,
        ReplacerPolicy::Lru,
        disk_manager,
    ));
    println!("Created buffer pool with 16 frames\n");

    let tree = BPlusTree::new("demo_index", bpm.clone(), Arc::new(NumericComparator), 4, 4)
        .expect("failed to open index");

    for key in [42u64, 7, 19, 3, 99, 64, 25, 11] {
        let value = RecordId::new(PageId::new(key as u32), SlotId::new(0));
        tree.insert(key, value).expect("insert failed");
        println!("Inserted key {}", key);
    }

    println!("\nPoint lookups:");
    for key in [7u64, 64, 100] {
        match tree.get_value(key).expect("lookup failed") {
            Some(value) => println!("  {} -> {}", key, value),
            None => println!("  {} -> not found", key),
        }
    }

    println!("\nFull scan in key order:");
    for item in tree.begin().expect("failed to build cursor") {
        let (key, value) = item.expect("scan failed");
        println!("  {} -> {}", key, value);
    }

    tree.remove(19).expect("remove failed");
    tree.remove(3).expect("remove failed");
    println!("\nRemoved keys 19 and 3; scan from key 10:");
    for item in tree.begin_at(10).expect("failed to build cursor") {
        let (key, value) = item.expect("scan failed");
        println!("  {} -> {}", key, value);
    }

    bpm.flush_all_pages().expect("flush failed");
    println!("\nFlushed all pages; root page is {}", tree.root_page_id());

    std::fs::remove_file(db_path).ok();
    println!("Demo completed successfully!");
}
