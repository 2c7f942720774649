//! Ordered EXIF tag map.

use serde::{Deserialize, Serialize};

/// Values this long or longer are left out of reports.
pub const MAX_REPORTED_VALUE_LEN: usize = 70;

/// Tag name to stringified value, in extraction order.
///
/// Inserting an existing tag replaces its value and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExifMap {
    entries: Vec<(String, String)>,
}

impl ExifMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        let tag = tag.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((tag, value)),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Entries worth showing: non-blank and shorter than the length cap.
    pub fn reportable(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(_, value)| {
            value.chars().count() < MAX_REPORTED_VALUE_LEN && !value.trim().is_empty()
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExifMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ExifMap::new();
        for (tag, value) in iter {
            map.insert(tag, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let map: ExifMap = [("Make", "Canon"), ("Model", "EOS"), ("Make", "Nikon")]
            .into_iter()
            .collect();
        let tags: Vec<_> = map.iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec!["Make", "Model"]);
        assert_eq!(map.get("Make"), Some("Nikon"));
    }

    #[test]
    fn test_reportable_filters_length_and_blank() {
        let mut map = ExifMap::new();
        map.insert("Short", "a".repeat(69));
        map.insert("Long", "b".repeat(70));
        map.insert("Blank", "   ");
        map.insert("Empty", "");
        map.insert("Make", "Canon");

        let tags: Vec<_> = map.reportable().map(|(t, _)| t).collect();
        assert_eq!(tags, vec!["Short", "Make"]);
    }
}
