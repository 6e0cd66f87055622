use std::fs::{File as StdFile, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};

#[derive(Debug, Clone, Copy)]
pub enum FileCreateDisposition {
    CreateOrTruncate,
    OpenOrCreate,
    OpenExisting,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileOptions {
    pub delete_on_close: bool,
}

pub struct File {
    file: Option<StdFile>,
    path: String,
    delete_on_close: bool,
}

impl File {
    pub fn new(path: &str) -> Self {
        Self {
            file: None,
            path: path.to_string(),
            delete_on_close: false,
        }
    }

    pub fn open(&mut self, disposition: FileCreateDisposition, options: FileOptions) -> io::Result<()> {
        let mut open_options = OpenOptions::new();
        open_options.read(true).write(true);

        match disposition {
            FileCreateDisposition::CreateOrTruncate => {
                open_options.create(true).truncate(true);
            }
            FileCreateDisposition::OpenOrCreate => {
                open_options.create(true);
            }
            FileCreateDisposition::OpenExisting => {}
        }

        let f = open_options.open(&self.path)?;
        self.file = Some(f);
        self.delete_on_close = options.delete_on_close;
        Ok(())
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not open"))?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)
    }

    pub fn read(&mut self, offset: u64, data: &mut [u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not open"))?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(data)
    }

    pub fn append(&mut self, data: &[u8]) -> io::Result<u64> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not open"))?;
        let offset = file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        Ok(offset)
    }

    pub fn close(&mut self) -> io::Result<()> {
        if self.file.take().is_some() && self.delete_on_close {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Clone for File {
    fn clone(&self) -> Self {
        Self {
            file: None, // cannot clone a raw file handle; caller must reopen.
            path: self.path.clone(),
            delete_on_close: self.delete_on_close,
        }
    }
}

impl Drop for File {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
