// Minimal chunk walker used by the tests to check produced archives. It
// asserts the structural invariants as it goes.
use std::ops::Range;

use crate::hash::Digester;
use crate::source::FileSource;
use crate::spk::{tag, FileEntry, Package, PackageType, Version, NAME_LEN, WIDE_MARKER};

#[derive(Debug)]
pub(crate) struct Header {
    pub tag: [u8; 4],
    pub value: u64,
    pub len: usize,
}

#[derive(Debug)]
pub(crate) struct Record {
    pub strs_offset: u64,
    pub length: u64,
    pub sdat_offset: u64,
    pub length2: u64,
    pub mode: u16,
    pub signature: [u8; 20],
    pub checksum: [u8; 16],
}

#[derive(Debug)]
pub(crate) struct Parsed {
    pub name: String,
    pub shortname: String,
    pub version: [u8; 3],
    pub typ: u8,
    pub wide: bool,
    pub total: u64,
    pub paths: Vec<String>,
    pub records: Vec<Record>,
    pub data: Range<usize>,
}

pub(crate) fn u32_at(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap())
}

pub(crate) fn u64_at(buf: &[u8], pos: usize) -> u64 {
    u64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap())
}

pub(crate) fn header_at(buf: &[u8], pos: usize) -> Header {
    let tag: [u8; 4] = buf[pos..pos + 4].try_into().unwrap();
    match u32_at(buf, pos + 4) {
        WIDE_MARKER => Header {
            tag,
            value: u64_at(buf, pos + 8),
            len: 16,
        },
        v => Header {
            tag,
            value: v as u64,
            len: 8,
        },
    }
}

fn expect(buf: &[u8], pos: usize, want: &[u8; 4]) -> Header {
    let header = header_at(buf, pos);
    assert_eq!(&header.tag, want, "at offset {}", pos);
    header
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.iter().copied().take_while(|b| *b != 0).collect()).unwrap()
}

// Returns the packages and the offset right after the SPKS chunk
pub(crate) fn parse_spks(buf: &[u8], at: usize) -> (Vec<Parsed>, usize) {
    let spks = expect(buf, at, tag::SPKS);
    let start = at + spks.len;
    let end = start + spks.value as usize;

    let count = u32_at(buf, start);
    let mut pos = start + 4;
    let mut packages = Vec::new();

    for _ in 0..count {
        let spk0 = expect(buf, pos, tag::SPK0);
        let body = pos + spk0.len;
        let body_end = body + spk0.value as usize;

        packages.push(parse_spk0(buf, body, body_end));
        pos = body_end;
    }

    assert_eq!(pos, end, "SPKS size does not match its content");
    (packages, end)
}

fn parse_spk0(buf: &[u8], start: usize, end: usize) -> Parsed {
    let sidx = expect(buf, start, tag::SIDX);
    let ip = start + sidx.len;
    let iend = ip + sidx.value as usize;

    let name = text(&buf[ip..ip + NAME_LEN]);
    let shortname = text(&buf[ip + 29..ip + 32]);
    let version: [u8; 3] = buf[ip + 32..ip + 35].try_into().unwrap();
    let typ = buf[ip + 35];
    assert_eq!(&buf[ip + 36..ip + 40], &[0; 4]);
    let count = u32_at(buf, ip + 40) as usize;

    let mut q = ip + 48;
    let (wide, total) = match u32_at(buf, ip + 44) {
        WIDE_MARKER => {
            let sz64 = expect(buf, q, tag::SZ64);
            assert_eq!(sz64.value, 8);
            let total = u64_at(buf, q + sz64.len);
            q += sz64.len + 8;
            (true, total)
        }
        v => (false, v as u64),
    };

    let strs = expect(buf, q, tag::STRS);
    assert_eq!(strs.value % 4, 0, "STRS is not aligned");
    let table = &buf[q + strs.len..q + strs.len + strs.value as usize];
    let paths: Vec<String> = table
        .split(|b| *b == 0)
        .take(count)
        .map(|p| String::from_utf8(p.to_vec()).unwrap())
        .collect();
    q += strs.len + strs.value as usize;

    let mut records = Vec::new();
    for _ in 0..count {
        let r = if wide {
            let h = expect(buf, q, tag::FI64);
            assert_eq!(h.value, 80);
            let p = q + h.len;
            assert_eq!(&buf[p + 34..p + 37], &[0; 3]);
            assert_eq!(&buf[p + 73..p + 80], &[0; 7]);
            q = p + 80;
            Record {
                strs_offset: u64_at(buf, p),
                length: u64_at(buf, p + 8),
                sdat_offset: u64_at(buf, p + 16),
                length2: u64_at(buf, p + 24),
                mode: u16::from_le_bytes(buf[p + 32..p + 34].try_into().unwrap()),
                signature: buf[p + 37..p + 57].try_into().unwrap(),
                checksum: buf[p + 57..p + 73].try_into().unwrap(),
            }
        } else {
            let h = expect(buf, q, tag::FINF);
            assert_eq!(h.value, 60);
            let p = q + h.len;
            assert_eq!(&buf[p + 18..p + 21], &[0; 3]);
            assert_eq!(&buf[p + 57..p + 60], &[0; 3]);
            q = p + 60;
            Record {
                strs_offset: u32_at(buf, p) as u64,
                length: u32_at(buf, p + 4) as u64,
                sdat_offset: u32_at(buf, p + 8) as u64,
                length2: u32_at(buf, p + 12) as u64,
                mode: u16::from_le_bytes(buf[p + 16..p + 18].try_into().unwrap()),
                signature: buf[p + 21..p + 41].try_into().unwrap(),
                checksum: buf[p + 41..p + 57].try_into().unwrap(),
            }
        };
        records.push(r);
    }

    let fend = expect(buf, q, tag::FEND);
    assert_eq!(fend.value, 0);
    q += fend.len;
    assert_eq!(q, iend, "SIDX size does not match its content");

    let sdat = expect(buf, iend, tag::SDAT);
    assert_eq!(sdat.value, if wide { 0 } else { total });
    let dp = iend + sdat.len;
    assert_eq!(dp + total as usize, end, "SPK0 size does not match its content");

    Parsed {
        name,
        shortname,
        version,
        typ,
        wide,
        total,
        paths,
        records,
        data: dp..end,
    }
}

// Tag and target of the trailing SEND/SE64
pub(crate) fn footer(buf: &[u8]) -> ([u8; 4], u64) {
    let n = buf.len();
    if n >= 12 && &buf[n - 12..n - 8] == tag::SEND {
        assert_eq!(u32_at(buf, n - 8), 4);
        return (*tag::SEND, u32_at(buf, n - 4) as u64);
    }
    let h = expect(buf, n - 16, tag::SE64);
    assert_eq!(h.value, 8);
    (*tag::SE64, u64_at(buf, n - 8))
}

pub(crate) fn file(path: &str, data: &[u8]) -> FileEntry {
    FileEntry::new(
        path,
        0o100644,
        data.len() as u64,
        FileSource::from(data.to_vec()),
        &Digester::default(),
    )
    .unwrap()
}

// A file that claims `length` bytes without holding any
pub(crate) fn phantom(path: &str, length: u64) -> FileEntry {
    FileEntry::new(
        path,
        0o100644,
        length,
        FileSource::from(vec![]),
        &Digester::default().skip_data(true),
    )
    .unwrap()
}

pub(crate) fn package(name: &str, files: Vec<FileEntry>) -> Package {
    Package::new(PackageType::Game, name, "", Version::new(1, 0, 0), files).unwrap()
}
