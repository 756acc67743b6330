//! Content-unit inspection
//!
//! A content unit is an item inside a directory that has an identity
//! independent of its file name, such as a packaged library whose name
//! carries a version.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::Result;
use crate::tree::is_tracked;

/// `<identity>-<version>` or `<identity>_<version>`, version starting with a digit
static NAME_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<identity>.+?)[-_]v?(?P<version>\d[0-9A-Za-z.+\-]*)$").unwrap()
});

/// One recognized unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnit {
    pub identity: String,
    pub version: Option<String>,
    pub path: PathBuf,
}

/// A directory item that could not be inspected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {}", path.display(), reason)]
pub struct UnitError {
    pub path: PathBuf,
    pub reason: String,
}

/// Extracts content units from a directory
pub trait UnitInspector {
    /// Inspect every item of `dir`, in file-name order.
    ///
    /// Items that fail individually are returned as errors; only a failure
    /// to list the directory fails the call.
    fn inspect(&self, dir: &Path) -> Result<Vec<std::result::Result<ContentUnit, UnitError>>>;
}

/// Derives identity and version from the file name alone
#[derive(Debug, Default, Clone, Copy)]
pub struct NameVersionInspector;

impl NameVersionInspector {
    /// Split a file name into identity and version.
    pub fn parse_name(name: &str) -> Option<(String, Option<String>)> {
        let stem = match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        };
        if stem.is_empty() || stem.starts_with('.') {
            return None;
        }
        match NAME_VERSION.captures(stem) {
            Some(caps) => Some((
                caps["identity"].to_string(),
                Some(caps["version"].to_string()),
            )),
            None => Some((stem.to_string(), None)),
        }
    }
}

impl UnitInspector for NameVersionInspector {
    fn inspect(&self, dir: &Path) -> Result<Vec<std::result::Result<ContentUnit, UnitError>>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let units = paths
            .into_iter()
            .filter_map(|path| {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    return Some(Err(UnitError {
                        reason: "file name is not valid UTF-8".to_string(),
                        path,
                    }));
                };
                if !is_tracked(name) {
                    return None;
                }
                Some(match Self::parse_name(name) {
                    Some((identity, version)) => Ok(ContentUnit {
                        identity,
                        version,
                        path,
                    }),
                    None => Err(UnitError {
                        reason: "no identity in file name".to_string(),
                        path,
                    }),
                })
            })
            .collect();
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.jar", "a", None)]
    #[case("a-1.0.jar", "a", Some("1.0"))]
    #[case("mod-name-1.2.3.jar", "mod-name", Some("1.2.3"))]
    #[case("mod_name_v2.1+mc1.20.jar", "mod_name", Some("2.1+mc1.20"))]
    #[case("noext", "noext", None)]
    fn parses_identity_and_version(
        #[case] name: &str,
        #[case] identity: &str,
        #[case] version: Option<&str>,
    ) {
        let (id, ver) = NameVersionInspector::parse_name(name).unwrap();
        assert_eq!(id, identity);
        assert_eq!(ver.as_deref(), version);
    }

    #[test]
    fn nameless_items_are_errors() {
        assert!(NameVersionInspector::parse_name(".jar").is_none());

        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(".jar"), "x").unwrap();
        fs::write(temp.path().join("b-2.jar"), "x").unwrap();
        fs::write(temp.path().join("add.json"), "{}").unwrap();

        let items = NameVersionInspector.inspect(temp.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_err());
        assert_eq!(items[1].as_ref().unwrap().identity, "b");
    }
}
