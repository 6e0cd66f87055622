//! Narrow on-disk stand-in for evicted records.
//!
//! Spec §1 explicitly scopes out a production async I/O engine; this module
//! gives the `HeadAddress`-eviction path somewhere real to put a record and
//! somewhere real to fetch it back from, without pretending to be one.
//! Grounded on the teacher's `device::file_system_disk::FileSystemDisk` (the
//! `Disk` trait shape, the root-path-plus-named-file layout) and
//! `environment::file::File` (the seek-then-read/write wrapper around
//! `std::fs::File`), narrowed to a single append-only log file plus an
//! in-memory offset directory rather than the teacher's richer
//! checkpoint-directory management.

use std::collections::HashMap;
use std::io;
use std::sync::RwLock;

use crate::core::address::Address;
use crate::environment::file::{File, FileCreateDisposition, FileOptions};

/// What the hybrid log (and read cache) need from a backing device: append
/// an evicted record's bytes, and fetch them back by logical address.
pub trait Disk: Send + Sync {
    fn write_record(&self, address: Address, bytes: &[u8]) -> io::Result<()>;
    fn read_record(&self, address: Address) -> io::Result<Vec<u8>>;
}

/// A `Disk` that never accepts writes. Useful for configurations that keep
/// the whole log resident (no `HeadAddress` advance ever evicts to disk).
#[derive(Default)]
pub struct NullDisk;

impl Disk for NullDisk {
    fn write_record(&self, _address: Address, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "NullDisk accepts no writes",
        ))
    }

    fn read_record(&self, _address: Address) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::NotFound, "NullDisk is empty"))
    }
}

/// Synchronous, file-backed `Disk`. Appends evicted-record bytes to a single
/// log file and keeps an in-memory `{Address -> (offset, len)}` directory so
/// reads are a single seek, not a linear scan.
pub struct FileSystemDisk {
    file: RwLock<File>,
    directory: RwLock<HashMap<Address, (u64, u32)>>,
}

impl FileSystemDisk {
    pub fn new(root_path: &str) -> io::Result<Self> {
        let path = std::path::Path::new(root_path);
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        let log_path = path.join("evicted.log");
        let mut file = File::new(log_path.to_str().expect("valid utf-8 path"));
        file.open(FileCreateDisposition::OpenOrCreate, FileOptions::default())?;
        Ok(Self {
            file: RwLock::new(file),
            directory: RwLock::new(HashMap::new()),
        })
    }
}

impl Disk for FileSystemDisk {
    fn write_record(&self, address: Address, bytes: &[u8]) -> io::Result<()> {
        let offset = {
            let mut file = self.file.write().unwrap();
            file.append(bytes)?
        };
        self.directory
            .write()
            .unwrap()
            .insert(address, (offset, bytes.len() as u32));
        Ok(())
    }

    fn read_record(&self, address: Address) -> io::Result<Vec<u8>> {
        let (offset, len) = *self
            .directory
            .read()
            .unwrap()
            .get(&address)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "record not on disk"))?;
        let mut buf = vec![0u8; len as usize];
        self.file.write().unwrap().read(offset, &mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let disk = FileSystemDisk::new(dir.path().to_str().unwrap()).unwrap();
        let addr = Address::new(0, 5);
        disk.write_record(addr, b"hello world").unwrap();
        let bytes = disk.read_record(addr).unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn unknown_address_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let disk = FileSystemDisk::new(dir.path().to_str().unwrap()).unwrap();
        assert!(disk.read_record(Address::new(9, 9)).is_err());
    }
}
