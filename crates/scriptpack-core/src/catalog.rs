//! Embedded resource catalog.
//!
//! Payloads are compiled into the executable (`include_bytes!`) and handed to the
//! launcher as an explicit [`Catalog`] value. Nothing looks resources up ambiently,
//! so tests construct a catalog with whatever entries they need.
//!
//! Names are `/`-separated logical paths, e.g. `runtime/modules/text.rhai`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use thiserror::Error;

/// Logical name of the embedded script payload.
pub const SCRIPT_RESOURCE: &str = "script/main.rhai";

/// Prefix of every runtime-distribution resource.
pub const RUNTIME_PREFIX: &str = "runtime/";

/// Errors returned by catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Embedded resource not found: {name}")]
    NotFound { name: String },

    #[error("Embedded resource '{name}' is not valid UTF-8")]
    NotUtf8 { name: String },

    #[error("Invalid resource name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
}

/// One named, read-only payload.
#[derive(Debug, Clone)]
pub struct EmbeddedResource {
    pub name: Cow<'static, str>,
    pub bytes: Cow<'static, [u8]>,
}

/// Immutable set of embedded resources keyed by logical name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<Cow<'static, str>, EmbeddedResource>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a compiled-in table of `(name, bytes)` pairs. Later duplicates win.
    pub fn from_static(table: &'static [(&'static str, &'static [u8])]) -> Self {
        let mut catalog = Self::new();
        for (name, bytes) in table {
            catalog.insert(EmbeddedResource {
                name: Cow::Borrowed(name),
                bytes: Cow::Borrowed(bytes),
            });
        }
        catalog
    }

    /// Builder-style insert of an owned payload.
    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(EmbeddedResource {
            name: Cow::Owned(name.into()),
            bytes: Cow::Owned(bytes.into()),
        });
        self
    }

    fn insert(&mut self, resource: EmbeddedResource) {
        self.entries.insert(resource.name.clone(), resource);
    }

    /// Resource names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.entries.keys().map(|k| k.as_ref()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&EmbeddedResource, CatalogError> {
        self.entries.get(name).ok_or_else(|| CatalogError::NotFound {
            name: name.to_string(),
        })
    }

    /// Open a fresh reader over the named payload.
    pub fn open(&self, name: &str) -> Result<impl Read + '_, CatalogError> {
        let resource = self.get(name)?;
        Ok(Cursor::new(resource.bytes.as_ref()))
    }

    pub fn read_to_string(&self, name: &str) -> Result<String, CatalogError> {
        let resource = self.get(name)?;
        String::from_utf8(resource.bytes.to_vec()).map_err(|_| CatalogError::NotUtf8 {
            name: name.to_string(),
        })
    }

    /// Iterate over all resources in name order.
    pub fn iter(&self) -> impl Iterator<Item = &EmbeddedResource> {
        self.entries.values()
    }
}

/// Map a `/`-separated logical name to a relative filesystem path.
///
/// Rejects anything that could escape the extraction root: empty components,
/// `.`/`..`, backslashes, drive prefixes and leading separators.
pub fn logical_to_relative_path(name: &str) -> Result<PathBuf, CatalogError> {
    let invalid = |reason| CatalogError::InvalidName {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    if name.starts_with('/') {
        return Err(invalid("absolute name"));
    }
    let mut path = PathBuf::new();
    for component in name.split('/') {
        match component {
            "" => return Err(invalid("empty path component")),
            "." | ".." => return Err(invalid("relative path component")),
            c if c.contains('\\') || c.contains(':') => {
                return Err(invalid("platform separator or drive prefix"))
            }
            c => path.push(c),
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: &[(&str, &[u8])] = &[
        ("runtime/modules/a.rhai", b"fn a() { 1 }"),
        ("script/main.rhai", b"print(\"hi\");"),
    ];

    #[test]
    fn test_list_is_sorted_and_complete() {
        let catalog = Catalog::from_static(TABLE).with("runtime/VERSION", "1");
        assert_eq!(
            catalog.list(),
            vec!["runtime/VERSION", "runtime/modules/a.rhai", "script/main.rhai"]
        );
    }

    #[test]
    fn test_open_reads_full_payload_each_time() {
        let catalog = Catalog::from_static(TABLE);
        for _ in 0..2 {
            let mut s = String::new();
            catalog.open(SCRIPT_RESOURCE).unwrap().read_to_string(&mut s).unwrap();
            assert_eq!(s, "print(\"hi\");");
        }
    }

    #[test]
    fn test_open_missing_is_not_found() {
        let catalog = Catalog::new();
        match catalog.open("script/main.rhai") {
            Err(CatalogError::NotFound { name }) => assert_eq!(name, "script/main.rhai"),
            _ => panic!("expected NotFound"),
        };
    }

    #[test]
    fn test_read_to_string_rejects_binary() {
        let catalog = Catalog::new().with("blob", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            catalog.read_to_string("blob"),
            Err(CatalogError::NotUtf8 { .. })
        ));
    }

    #[test]
    fn test_logical_to_relative_path() {
        let p = logical_to_relative_path("modules/sub dir/x.rhai").unwrap();
        assert_eq!(p, PathBuf::from("modules").join("sub dir").join("x.rhai"));

        for bad in ["", "/etc/passwd", "a//b", "../x", "a/./b", "a\\b", "C:/x"] {
            assert!(
                logical_to_relative_path(bad).is_err(),
                "expected rejection for {:?}",
                bad
            );
        }
    }
}
