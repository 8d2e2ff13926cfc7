//! Module for relative folder paths.

use std::{fmt, iter::FusedIterator};

/// Iterator over the segments of a [`RemotePath`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::str::Split<'a, char>,
    done: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.inner.next()
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.inner.next_back()
    }
}

impl<'a> FusedIterator for Iter<'a> {}

/// A normalized folder path relative to some base folder.
///
/// Segments are separated by `/`. Empty segments as well as `.` and `..` are
/// dropped when parsing, so a path never escapes its base folder.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemotePath {
    inner: String,
}

impl RemotePath {
    /// Parses a raw path, dropping empty, `.` and `..` segments.
    pub fn parse<S: AsRef<str>>(raw: S) -> Self {
        let mut path = Self::default();
        for segment in raw.as_ref().split('/') {
            path.push(segment);
        }
        path
    }

    /// Appends a segment. Segments that would not name a folder are ignored.
    pub fn push<S: AsRef<str>>(&mut self, segment: S) {
        let segment = segment.as_ref();
        if segment.is_empty() || segment == "." || segment == ".." {
            return;
        }
        if !self.inner.is_empty() {
            self.inner.push('/');
        }
        self.inner.push_str(segment);
    }

    /// Removes the last segment and returns it.
    pub fn pop(&mut self) -> Option<String> {
        if self.inner.is_empty() {
            return None;
        }
        match self.inner.rfind('/') {
            Some(idx) => {
                let mut name = self.inner.split_off(idx);
                name.remove(0);
                Some(name)
            }
            None => Some(std::mem::take(&mut self.inner)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns the last segment.
    pub fn name(&self) -> Option<&str> {
        self.iter().next_back()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.inner.split('/'),
            done: self.inner.is_empty(),
        }
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl From<RemotePath> for String {
    fn from(value: RemotePath) -> Self {
        value.inner
    }
}

impl<'a> IntoIterator for &'a RemotePath {
    type Item = &'a str;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Splits the path of an upload entry into its folder path and file name.
///
/// Only paths that contain a `/` (and are not `.` or `./`) are treated as coming
/// from a folder upload. For all other entries, or when no segment remains, the
/// folder is `None` and `fallback_name` is used as the file name.
pub fn split_entry_path(raw: Option<&str>, fallback_name: &str) -> (Option<RemotePath>, String) {
    let raw = match raw {
        Some(v) if v.contains('/') && v != "." && v != "./" => v,
        _ => return (None, fallback_name.to_owned()),
    };
    let mut path = RemotePath::parse(raw);
    let name = path.pop().unwrap_or_else(|| fallback_name.to_owned());
    let folder = if path.is_empty() { None } else { Some(path) };
    (folder, name)
}
