use std::collections::HashMap;

/// A parsed configuration file: named sections of `key = value` entries.
///
/// Section names are case-sensitive. Keys are stored lowercased, so lookups
/// are case-insensitive on the key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniDocument {
    pub sections: HashMap<String, IniSection>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniSection {
    pub name: String,
    pub entries: HashMap<String, String>,
}

impl IniDocument {
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.get(name)
    }

    /// Raw value lookup. Returns the value as written (trimmed), which may be empty.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    /// Like [`get`](Self::get) but treats blank values as absent.
    pub fn get_non_blank(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|v| !v.is_empty())
    }
}

impl IniSection {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }
}
