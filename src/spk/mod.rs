//! SPK package archive format (writer side)
//!
//! An SPK file ships one or more versioned packages of game assets. It is a
//! tree of chunks, each chunk being a 4 byte ASCII tag followed by a size
//! (or back-reference) value. Unless otherwise noted everything is stored in
//! Little Endian format.
//!
//! The output is strictly append-only: a chunk header announces the size of
//! a payload that has not been written yet. Those sizes are found by running
//! the same writer in a counting mode first (see [`sink::SpkSink`]).
//!
//! # Chunk Header
//!
//! | Type    | Name   | Description |
//! | ------: | ------ | ----------- |
//! | [u8; 4] | tag    | The type of the chunk such as `SPKS` |
//! | u32     | value  | Size of the payload or back-reference, `0xFFFFFFFF` marks a wide value |
//! | u64     | value  | Only present after the `0xFFFFFFFF` marker |
//!
//! The 32 bit value `0xFFFFFFFF` is never a legal size, the largest narrow
//! value is `0xFFFFFFFE`.
//!
//! # Chunk Types
//!
//! | Chunk Type | Name            | Description |
//! | :--------: | --------------- | ----------- |
//! | SPKS       | Package Set     | Top level chunk, u32 package count then one `SPK0` per package |
//! | SPK0       | Package         | One package, holds a `SIDX` followed by a `SDAT` |
//! | SIDX       | Package Index   | Package header, `SZ64`, `STRS`, `FINF`/`FI64` records and `FEND` |
//! | SZ64       | Wide Data Size  | u64 total file data size of a wide package |
//! | STRS       | String Table    | NUL terminated file paths, padded to 4 bytes |
//! | FINF       | File Info       | 60 byte narrow file record |
//! | FI64       | File Info (64)  | 80 byte wide file record |
//! | FEND       | File End        | Empty, terminates the `SIDX` |
//! | SDAT       | Data            | Concatenated file content |
//! | SEND       | Set End         | u32 offset of the `SPKS` chunk |
//! | SE64       | Set End (64)    | u64 offset of the `SPKS` chunk |
//!
//! ## SIDX
//!
//! | Type     | Name       | Description |
//! | -------: | ---------- | ----------- |
//! | [u8; 29] | name       | Package name, NUL padded |
//! | [u8; 3]  | shortname  | Package shortname, NUL padded |
//! | [u8; 3]  | version    | major, minor, patch |
//! | u8       | type       | See [`types::PackageType`] |
//! | [u8; 4]  | reserved   | Zero |
//! | u32      | file count | Number of `FINF`/`FI64` records |
//! | u32      | data size  | Total file data size, `0xFFFFFFFF` when a `SZ64` follows |
//!
//! ## FINF / FI64
//!
//! | FINF     | FI64     | Name        | Description |
//! | -------: | -------: | ----------- | ----------- |
//! | u32      | u64      | strs offset | Offset of the path in the `STRS` payload |
//! | u32      | u64      | length      | File size |
//! | u32      | u64      | sdat offset | Offset of the content in the `SDAT` payload |
//! | u32      | u64      | length      | File size, again |
//! | u16      | u16      | mode        | Unix mode bits |
//! | [u8; 3]  | [u8; 3]  | reserved    | Zero |
//! | [u8; 20] | [u8; 20] | signature   | HMAC-SHA1 of the content or `0xAA` filled |
//! | [u8; 16] | [u8; 16] | checksum    | MD5 of the content |
//! | [u8; 3]  | [u8; 7]  | reserved    | Zero |
//!
//! ## SEND / SE64
//!
//! Always the last chunk. A reader fetches the last 16 (or 12) bytes of the
//! file and seeks back to the `SPKS` chunk from there.
pub mod archive;
pub mod builder;
pub mod error;
pub mod package;
pub mod sink;
pub mod strs;
pub mod types;

#[cfg(test)]
pub(crate) mod walk;

pub use archive::SpkEncoder;
pub use error::SpkError;
pub use types::{Archive, FileEntry, Package, PackageType, Version};

// Largest value a narrow (32 bit) chunk field may hold
pub const MAX32: u64 = 0xFFFF_FFFE;

// Narrow field value announcing that a 64 bit value follows
pub const WIDE_MARKER: u32 = 0xFFFF_FFFF;

pub const NAME_LEN: usize = 29;
pub const SHORTNAME_LEN: usize = 3;

// Alignment of the STRS payload
pub const STRS_ALIGN: u64 = 4;

// Fixed payload of the file records
pub const FINF_LEN: u64 = 0x3C;
pub const FI64_LEN: u64 = 0x50;

pub mod tag {
    pub type Tag = [u8; 4];

    pub const SPKS: &Tag = b"SPKS";
    pub const SPK0: &Tag = b"SPK0";
    pub const SIDX: &Tag = b"SIDX";
    pub const SZ64: &Tag = b"SZ64";
    pub const STRS: &Tag = b"STRS";
    pub const FINF: &Tag = b"FINF";
    pub const FI64: &Tag = b"FI64";
    pub const FEND: &Tag = b"FEND";
    pub const SDAT: &Tag = b"SDAT";
    pub const SEND: &Tag = b"SEND";
    pub const SE64: &Tag = b"SE64";
}
