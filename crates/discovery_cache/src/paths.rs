//! Lossless path encoding for the snapshot record and the mtime fingerprint.
//!
//! Watched trees may contain names that are not valid UTF-8. Such paths are
//! stored as their raw OS bytes instead of a string, so they round-trip
//! exactly and never make a scan unserializable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use discovery_common::Timestamp;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scanner::MtimeMap;

/// Returns the platform byte encoding of `path`.
pub(crate) fn path_bytes(path: &Path) -> &[u8] {
    path.as_os_str().as_encoded_bytes()
}

#[derive(Serialize)]
#[serde(untagged)]
enum EncodedPath<'a> {
    Utf8(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a Path> for EncodedPath<'a> {
    fn from(path: &'a Path) -> Self {
        match path.to_str() {
            Some(s) => EncodedPath::Utf8(s),
            None => EncodedPath::Bytes(path_bytes(path)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecodedPath {
    Utf8(String),
    Bytes(Vec<u8>),
}

impl DecodedPath {
    fn into_path_buf(self) -> Result<PathBuf, String> {
        match self {
            DecodedPath::Utf8(s) => Ok(PathBuf::from(s)),
            DecodedPath::Bytes(bytes) => path_from_bytes(bytes),
        }
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> Result<PathBuf, String> {
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> Result<PathBuf, String> {
    String::from_utf8(bytes)
        .map(|s| PathBuf::from(OsString::from(s)))
        .map_err(|_| "byte-encoded path is not supported on this platform".to_string())
}

/// Serde adapter for a list of paths.
pub(crate) mod path_list {
    use super::*;

    pub fn serialize<S: Serializer>(paths: &[PathBuf], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(paths.iter().map(|p| EncodedPath::from(p.as_path())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<PathBuf>, D::Error> {
        Vec::<DecodedPath>::deserialize(d)?
            .into_iter()
            .map(|p| p.into_path_buf().map_err(<D::Error as serde::de::Error>::custom))
            .collect()
    }
}

/// Serde adapter for an [`MtimeMap`], stored as `[path, mtime]` pairs.
pub(crate) mod mtime_entries {
    use super::*;

    pub fn serialize<S: Serializer>(mtimes: &MtimeMap, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(
            mtimes
                .iter()
                .map(|(path, mtime)| (EncodedPath::from(path.as_path()), mtime)),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<MtimeMap, D::Error> {
        Vec::<(DecodedPath, Option<Timestamp>)>::deserialize(d)?
            .into_iter()
            .map(|(p, mtime)| {
                p.into_path_buf()
                    .map(|path| (path, mtime))
                    .map_err(<D::Error as serde::de::Error>::custom)
            })
            .collect()
    }
}
