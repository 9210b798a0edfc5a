//! Coin `.conf` files
//!
//! Daemon config files are plain `key=value` lines. The files written here
//! start with a generated comment header. Settings that are written but must
//! stay disabled (for example `#masternode=1` until the operator enables the
//! node) are stored with a leading `#` and read back as literal `#key`
//! entries, so a write followed by a load returns the same mapping.

use crate::errors::MnError;
use std::fs;
use std::path::Path;

/// Ordered key/value mapping of a coin config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfMap {
    entries: Vec<(String, String)>,
}

impl ConfMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value; replacing keeps the original position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or an empty string when absent
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ConfMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Parse config file contents
pub fn parse_conf(contents: &str) -> ConfMap {
    let mut map = ConfMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if line.starts_with('#') && (key.len() < 2 || key.contains(char::is_whitespace)) {
            // header or free-form comment
            continue;
        }
        map.insert(key.trim(), value.trim());
    }
    map
}

/// Render a config file, generated header first
pub fn render_conf(map: &ConfMap) -> String {
    let mut data = format!(
        "# Warning: This is an auto-generated file! Do not hand-edit!\n\
         #   Generated using mnkeeper version {} on {}\n\
         # Warning: This is an auto-generated file! Do not hand-edit!\n\n",
        env!("CARGO_PKG_VERSION"),
        chrono::Utc::now().to_rfc3339(),
    );
    for (key, value) in map.iter() {
        data.push_str(key);
        data.push('=');
        data.push_str(value);
        data.push('\n');
    }
    data.push('\n');
    data
}

/// Load a config file; a missing file yields an empty mapping
pub fn load_conf_file(path: &Path) -> Result<ConfMap, MnError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_conf(&contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfMap::new()),
        Err(e) => Err(MnError::Io(e)),
    }
}

/// Write a config file, replacing any existing one
pub fn write_conf_file(path: &Path, map: &ConfMap) -> Result<(), MnError> {
    fs::write(path, render_conf(map))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let map = parse_conf(
            "# Warning: generated file\n\n#   Generated on 2024-01-01\nrpcuser=alice\n  server = 1 \nnot a setting\n",
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("rpcuser"), Some("alice"));
        assert_eq!(map.get("server"), Some("1"));
    }

    #[test]
    fn test_disabled_settings_are_literal_keys() {
        let map = parse_conf("#masternode=1\n#masternodeprivkey=abc=\n");
        assert_eq!(map.get("#masternode"), Some("1"));
        assert_eq!(map.get("#masternodeprivkey"), Some("abc="));
        assert_eq!(map.get("masternode"), None);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map: ConfMap = [("a", "1"), ("b", "2")].into_iter().collect();
        map.insert("a", "3");
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.value("a"), "3");
        assert_eq!(map.value("missing"), "");
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coin.conf");
        let map: ConfMap = [
            ("rpcuser", "u"),
            ("rpcpassword", "p"),
            ("#masternode", "1"),
            ("masternodeaddr", "10.0.0.1:51472"),
        ]
        .into_iter()
        .collect();

        write_conf_file(&path, &map).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# Warning: This is an auto-generated file!"));

        assert_eq!(load_conf_file(&path).unwrap(), map);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_conf_file(&dir.path().join("absent.conf")).unwrap();
        assert!(map.is_empty());
    }
}
