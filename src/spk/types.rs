use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

use crate::hash::{Digester, Digests};
use crate::source::FileSource;
use crate::spk::{SpkError, MAX32, NAME_LEN, SHORTNAME_LEN};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageType {
    #[serde(rename = "SPIKE_1")]
    Spike1,
    #[serde(rename = "GAME")]
    Game,
    #[serde(rename = "SPIKE_2")]
    Spike2,
    #[serde(rename = "SPIKE_3")]
    Spike3,
}

impl PackageType {
    pub fn as_u8(self) -> u8 {
        match self {
            PackageType::Spike1 => 1,
            PackageType::Game => 2,
            PackageType::Spike2 => 3,
            PackageType::Spike3 => 4,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(from = "[u8; 3]")]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Version { major, minor, patch }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.major, self.minor, self.patch]
    }
}

impl From<[u8; 3]> for Version {
    fn from(v: [u8; 3]) -> Self {
        Version::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// One file of a package, digests are taken once at creation.
#[derive(Debug)]
pub struct FileEntry {
    path: String,
    length: u64,
    mode: u16,
    digests: Digests,
    source: FileSource,
}

impl FileEntry {
    pub fn new(
        path: impl Into<String>,
        mode: u16,
        length: u64,
        source: FileSource,
        digester: &Digester,
    ) -> Result<Self, SpkError> {
        let path = path.into();
        check_text("path", &path)?;

        let digests = digester.digest_source(&path, &source, length)?;

        Ok(FileEntry {
            path,
            length,
            mode,
            digests,
            source,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn mode(&self) -> u16 {
        self.mode
    }

    pub fn digests(&self) -> &Digests {
        &self.digests
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }
}

#[derive(Debug)]
pub struct Package {
    package_type: PackageType,
    name: String,
    shortname: String,
    version: Version,
    files: Vec<FileEntry>,
}

impl Package {
    pub fn new(
        package_type: PackageType,
        name: impl Into<String>,
        shortname: impl Into<String>,
        version: Version,
        files: Vec<FileEntry>,
    ) -> Result<Self, SpkError> {
        let name = name.into();
        let shortname = shortname.into();

        check_text("name", &name)?;
        if name.len() > NAME_LEN {
            return Err(SpkError::NameTooLong {
                len: name.len(),
                name,
            });
        }

        check_text("shortname", &shortname)?;
        if shortname.len() > SHORTNAME_LEN {
            return Err(SpkError::ShortnameTooLong {
                len: shortname.len(),
                name: shortname,
            });
        }

        let mut seen = HashSet::new();
        for file in files.iter() {
            if !seen.insert(file.path()) {
                return Err(SpkError::DuplicatePath(file.path().to_string()));
            }
        }

        Ok(Package {
            package_type,
            name,
            shortname,
            version,
            files,
        })
    }

    pub fn package_type(&self) -> PackageType {
        self.package_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shortname(&self) -> &str {
        &self.shortname
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn total_data_size(&self) -> u64 {
        self.files.iter().map(FileEntry::length).sum()
    }

    // Promotion of the package itself only depends on its file data
    pub fn needs_wide(&self) -> bool {
        self.total_data_size() > MAX32
    }
}

#[derive(Debug, Default)]
pub struct Archive {
    prefix: Option<FileSource>,
    packages: Vec<Package>,
}

impl Archive {
    pub fn new(packages: Vec<Package>) -> Self {
        Archive {
            prefix: None,
            packages,
        }
    }

    pub fn with_prefix(mut self, prefix: FileSource) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn prefix(&self) -> Option<&FileSource> {
        self.prefix.as_ref()
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }
}

// Everything ends up as single byte characters with NUL as the terminator
fn check_text(what: &'static str, text: &str) -> Result<(), SpkError> {
    if !text.is_ascii() || text.contains('\0') {
        return Err(SpkError::InvalidText {
            what,
            text: text.to_string(),
        });
    }
    Ok(())
}
