use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::common::{PageId, Result, TarnError, PAGE_SIZE};

use super::DiskManager;

/// A disk I/O request handed to the worker thread. Requests own their
/// buffers; completion is signalled through a per-request reply channel.
enum DiskRequest {
    Read {
        page_id: PageId,
        reply: Sender<Result<Box<[u8; PAGE_SIZE]>>>,
    },
    Write {
        page_id: PageId,
        data: Box<[u8; PAGE_SIZE]>,
        reply: Sender<Result<()>>,
    },
}

/// DiskScheduler funnels page I/O through a background worker thread.
/// Callers queue requests and block on the reply channel for completion.
pub struct DiskScheduler {
    disk_manager: Arc<DiskManager>,
    /// Dropped on shutdown so the worker's recv loop terminates.
    request_sender: Option<Sender<DiskRequest>>,
    worker_handle: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    /// Creates a new DiskScheduler and spawns its worker thread.
    pub fn new(disk_manager: Arc<DiskManager>) -> Self {
        let (sender, receiver) = bounded::<DiskRequest>(128);

        let dm = Arc::clone(&disk_manager);
        let worker_handle = thread::spawn(move || Self::run_worker(dm, receiver));

        Self {
            disk_manager,
            request_sender: Some(sender),
            worker_handle: Some(worker_handle),
        }
    }

    /// Reads a page and blocks until the worker completes it.
    pub fn read_page_sync(&self, page_id: PageId) -> Result<Box<[u8; PAGE_SIZE]>> {
        let (reply, done) = bounded(1);
        self.schedule(DiskRequest::Read { page_id, reply })?;
        done.recv()
            .map_err(|e| TarnError::Channel(format!("read reply lost: {}", e)))?
    }

    /// Writes a page and blocks until the worker completes it.
    pub fn write_page_sync(&self, page_id: PageId, data: Box<[u8; PAGE_SIZE]>) -> Result<()> {
        let (reply, done) = bounded(1);
        self.schedule(DiskRequest::Write {
            page_id,
            data,
            reply,
        })?;
        done.recv()
            .map_err(|e| TarnError::Channel(format!("write reply lost: {}", e)))?
    }

    /// Returns a reference to the underlying DiskManager.
    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        &self.disk_manager
    }

    fn schedule(&self, request: DiskRequest) -> Result<()> {
        self.request_sender
            .as_ref()
            .expect("scheduler already shut down")
            .send(request)
            .map_err(|e| TarnError::Channel(format!("failed to schedule request: {}", e)))
    }

    /// Worker loop: runs until the request channel disconnects.
    fn run_worker(disk_manager: Arc<DiskManager>, receiver: Receiver<DiskRequest>) {
        while let Ok(request) = receiver.recv() {
            match request {
                DiskRequest::Read { page_id, reply } => {
                    let mut buf = Box::new([0u8; PAGE_SIZE]);
                    let result = disk_manager.read_page(page_id, &mut buf[..]).map(|_| buf);
                    let _ = reply.send(result);
                }
                DiskRequest::Write {
                    page_id,
                    data,
                    reply,
                } => {
                    let _ = reply.send(disk_manager.write_page(page_id, &data[..]));
                }
            }
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        // Disconnect the channel, then wait for the worker to drain and exit.
        self.request_sender.take();
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_disk_scheduler_read_write() {
        let temp_file = NamedTempFile::new().unwrap();
        let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());
        let scheduler = DiskScheduler::new(dm);

        let page_id = scheduler.disk_manager().allocate_page().unwrap();

        let mut data = Box::new([0u8; PAGE_SIZE]);
        data[0] = 42;
        data[100] = 255;
        scheduler.write_page_sync(page_id, data).unwrap();

        let read_back = scheduler.read_page_sync(page_id).unwrap();
        assert_eq!(read_back[0], 42);
        assert_eq!(read_back[100], 255);
    }

    #[test]
    fn test_disk_scheduler_multiple_requests() {
        let temp_file = NamedTempFile::new().unwrap();
        let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());
        let scheduler = DiskScheduler::new(dm);

        let page_id1 = scheduler.disk_manager().allocate_page().unwrap();
        let page_id2 = scheduler.disk_manager().allocate_page().unwrap();

        scheduler
            .write_page_sync(page_id1, Box::new([1u8; PAGE_SIZE]))
            .unwrap();
        scheduler
            .write_page_sync(page_id2, Box::new([2u8; PAGE_SIZE]))
            .unwrap();

        assert_eq!(scheduler.read_page_sync(page_id1).unwrap()[0], 1);
        assert_eq!(scheduler.read_page_sync(page_id2).unwrap()[0], 2);
    }

    #[test]
    fn test_disk_scheduler_shutdown_joins_worker() {
        let temp_file = NamedTempFile::new().unwrap();
        let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());
        let scheduler = DiskScheduler::new(dm);

        let page_id = scheduler.disk_manager().allocate_page().unwrap();
        scheduler
            .write_page_sync(page_id, Box::new([7u8; PAGE_SIZE]))
            .unwrap();

        drop(scheduler);
    }
}
