use std::sync::Arc;

use tarn::common::PAGE_SIZE;
use tarn::storage::disk::{DiskManager, DiskScheduler};

#[test]
fn test_disk_manager_allocate_and_rw() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dm = DiskManager::new(temp_dir.path().join("test.db")).unwrap();

    let page_id = dm.allocate_page().unwrap();

    let mut data = [0u8; PAGE_SIZE];
    data[0] = 1;
    data[PAGE_SIZE / 2] = 2;
    data[PAGE_SIZE - 1] = 3;
    dm.write_page(page_id, &data).unwrap();

    let mut read_back = [0u8; PAGE_SIZE];
    dm.read_page(page_id, &mut read_back).unwrap();
    assert_eq!(read_back[0], 1);
    assert_eq!(read_back[PAGE_SIZE / 2], 2);
    assert_eq!(read_back[PAGE_SIZE - 1], 3);

    assert!(dm.num_reads() >= 1);
    assert!(dm.num_writes() >= 1);
}

#[test]
fn test_disk_manager_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("reopen.db");

    let page_id = {
        let dm = DiskManager::new(&path).unwrap();
        let page_id = dm.allocate_page().unwrap();
        let mut data = [0u8; PAGE_SIZE];
        data[10] = 99;
        dm.write_page(page_id, &data).unwrap();
        dm.sync().unwrap();
        page_id
    };

    let dm = DiskManager::new(&path).unwrap();
    let mut data = [0u8; PAGE_SIZE];
    dm.read_page(page_id, &mut data).unwrap();
    assert_eq!(data[10], 99);

    // Allocation resumes past the existing pages.
    let next = dm.allocate_page().unwrap();
    assert!(next > page_id);
}

#[test]
fn test_disk_scheduler_round_trip() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dm = Arc::new(DiskManager::new(temp_dir.path().join("sched.db")).unwrap());
    let scheduler = DiskScheduler::new(dm);

    let page_id = scheduler.disk_manager().allocate_page().unwrap();

    let mut data = Box::new([0u8; PAGE_SIZE]);
    data[7] = 77;
    scheduler.write_page_sync(page_id, data).unwrap();

    let read_back = scheduler.read_page_sync(page_id).unwrap();
    assert_eq!(read_back[7], 77);
}
