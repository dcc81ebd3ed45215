use crate::common::{PageId, Result, TarnError, PAGE_SIZE};

// Layout: | record_count (4) | record 0 | record 1 | ...
// Record: | name (32, zero padded) | root_page_id (4) |
// An all-zero page is a valid empty header, so a freshly created database
// file needs no explicit initialization.

const RECORD_COUNT_OFFSET: usize = 0;
const RECORDS_OFFSET: usize = 4;

const NAME_SIZE: usize = 32;
const RECORD_SIZE: usize = NAME_SIZE + 4;

/// Maximum number of index records the header page can hold
pub const MAX_HEADER_RECORDS: usize = (PAGE_SIZE - RECORDS_OFFSET) / RECORD_SIZE;

fn read_record_count(data: &[u8]) -> usize {
    let bytes: [u8; 4] = data[RECORD_COUNT_OFFSET..RECORD_COUNT_OFFSET + 4]
        .try_into()
        .unwrap();
    u32::from_le_bytes(bytes) as usize
}

fn record_name(data: &[u8], index: usize) -> &[u8] {
    let offset = RECORDS_OFFSET + index * RECORD_SIZE;
    &data[offset..offset + NAME_SIZE]
}

fn record_root_id(data: &[u8], index: usize) -> PageId {
    let offset = RECORDS_OFFSET + index * RECORD_SIZE + NAME_SIZE;
    let bytes: [u8; 4] = data[offset..offset + 4].try_into().unwrap();
    PageId::new(u32::from_le_bytes(bytes))
}

fn find_record(data: &[u8], name: &[u8; NAME_SIZE]) -> Option<usize> {
    (0..read_record_count(data)).find(|&i| record_name(data, i) == name)
}

fn encode_name(name: &str) -> Result<[u8; NAME_SIZE]> {
    if name.len() > NAME_SIZE {
        return Err(TarnError::IndexNameTooLong(name.to_string()));
    }
    let mut encoded = [0u8; NAME_SIZE];
    encoded[..name.len()].copy_from_slice(name.as_bytes());
    Ok(encoded)
}

/// Mutable view over the header page (page 0): a record store mapping index
/// names to their current root page ids.
pub struct HeaderPage<'a> {
    data: &'a mut [u8],
}

impl<'a> HeaderPage<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    pub fn record_count(&self) -> usize {
        read_record_count(self.data)
    }

    /// Creates a record for `name`. Returns false if one already exists.
    pub fn insert_record(&mut self, name: &str, root_page_id: PageId) -> Result<bool> {
        let encoded = encode_name(name)?;
        if find_record(self.data, &encoded).is_some() {
            return Ok(false);
        }

        let count = self.record_count();
        if count >= MAX_HEADER_RECORDS {
            return Err(TarnError::HeaderPageFull);
        }

        let offset = RECORDS_OFFSET + count * RECORD_SIZE;
        self.data[offset..offset + NAME_SIZE].copy_from_slice(&encoded);
        self.data[offset + NAME_SIZE..offset + RECORD_SIZE]
            .copy_from_slice(&root_page_id.as_u32().to_le_bytes());

        let new_count = (count + 1) as u32;
        self.data[RECORD_COUNT_OFFSET..RECORD_COUNT_OFFSET + 4]
            .copy_from_slice(&new_count.to_le_bytes());
        Ok(true)
    }

    /// Updates the record for `name`. Returns false if no record exists.
    pub fn update_record(&mut self, name: &str, root_page_id: PageId) -> Result<bool> {
        let encoded = encode_name(name)?;
        match find_record(self.data, &encoded) {
            Some(index) => {
                let offset = RECORDS_OFFSET + index * RECORD_SIZE + NAME_SIZE;
                self.data[offset..offset + 4]
                    .copy_from_slice(&root_page_id.as_u32().to_le_bytes());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn get_root_id(&self, name: &str) -> Result<Option<PageId>> {
        let encoded = encode_name(name)?;
        Ok(find_record(self.data, &encoded).map(|i| record_root_id(self.data, i)))
    }
}

/// Read-only view over the header page.
pub struct HeaderPageRef<'a> {
    data: &'a [u8],
}

impl<'a> HeaderPageRef<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    pub fn record_count(&self) -> usize {
        read_record_count(self.data)
    }

    pub fn get_root_id(&self, name: &str) -> Result<Option<PageId>> {
        let encoded = encode_name(name)?;
        Ok(find_record(self.data, &encoded).map(|i| record_root_id(self.data, i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::INVALID_PAGE_ID;

    #[test]
    fn test_header_page_empty() {
        let data = [0u8; PAGE_SIZE];
        let header = HeaderPageRef::new(&data);
        assert_eq!(header.record_count(), 0);
        assert_eq!(header.get_root_id("missing").unwrap(), None);
    }

    #[test]
    fn test_header_page_insert_and_get() {
        let mut data = [0u8; PAGE_SIZE];
        let mut header = HeaderPage::new(&mut data);

        assert!(header.insert_record("orders_pk", PageId::new(7)).unwrap());
        assert_eq!(header.record_count(), 1);
        assert_eq!(
            header.get_root_id("orders_pk").unwrap(),
            Some(PageId::new(7))
        );
        assert_eq!(header.get_root_id("other").unwrap(), None);
    }

    #[test]
    fn test_header_page_duplicate_insert() {
        let mut data = [0u8; PAGE_SIZE];
        let mut header = HeaderPage::new(&mut data);

        assert!(header.insert_record("idx", PageId::new(1)).unwrap());
        assert!(!header.insert_record("idx", PageId::new(2)).unwrap());
        assert_eq!(header.get_root_id("idx").unwrap(), Some(PageId::new(1)));
    }

    #[test]
    fn test_header_page_update() {
        let mut data = [0u8; PAGE_SIZE];
        let mut header = HeaderPage::new(&mut data);

        assert!(!header.update_record("idx", PageId::new(5)).unwrap());
        header.insert_record("idx", PageId::new(5)).unwrap();
        assert!(header.update_record("idx", INVALID_PAGE_ID).unwrap());
        assert_eq!(header.get_root_id("idx").unwrap(), Some(INVALID_PAGE_ID));
    }

    #[test]
    fn test_header_page_name_too_long() {
        let mut data = [0u8; PAGE_SIZE];
        let mut header = HeaderPage::new(&mut data);

        let long_name = "x".repeat(NAME_SIZE + 1);
        assert!(matches!(
            header.insert_record(&long_name, PageId::new(1)),
            Err(TarnError::IndexNameTooLong(_))
        ));
    }

    #[test]
    fn test_header_page_multiple_records() {
        let mut data = [0u8; PAGE_SIZE];
        let mut header = HeaderPage::new(&mut data);

        for i in 0..10 {
            let name = format!("index_{}", i);
            assert!(header.insert_record(&name, PageId::new(i + 100)).unwrap());
        }
        for i in 0..10 {
            let name = format!("index_{}", i);
            assert_eq!(
                header.get_root_id(&name).unwrap(),
                Some(PageId::new(i + 100))
            );
        }
    }
}
