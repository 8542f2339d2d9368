use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

// Where the content of a file (or the archive prefix) comes from. Every call
// to `open` starts a fresh read from the beginning.
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

impl FileSource {
    pub fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        match self {
            FileSource::Path(path) => Ok(Box::new(File::open(path)?)),
            FileSource::Memory(data) => Ok(Box::new(&data[..])),
        }
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(data: Vec<u8>) -> Self {
        FileSource::Memory(data)
    }
}

impl From<&Path> for FileSource {
    fn from(path: &Path) -> Self {
        FileSource::Path(path.to_path_buf())
    }
}
