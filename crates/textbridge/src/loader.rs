//! Template file loading.
//!
//! Files are read synchronously. Each file defines the template named after
//! its base name, so `views/page.html` defines `page.html`.
//!
//! # Glob Patterns
//!
//! [`glob`] expands a shell pattern one path component at a time:
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `*` | any run of characters except `/` |
//! | `?` | any single character except `/` |
//! | `[abc]`, `[a-z]` | one character from the class |
//! | `[^a-z]`, `[!a-z]` | one character not in the class |
//! | `\c` | the character `c` literally |
//!
//! Matches are returned sorted within each directory. Unreadable directories
//! contribute no matches.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LoadError, Result};

/// The template name for a file: its base name.
pub fn template_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Reads each file, returning `(template name, source)` pairs in order.
pub fn read_templates<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(String, String)>> {
    if paths.is_empty() {
        return Err(LoadError::NoFiles.into());
    }
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let text = fs::read_to_string(path)
                .map_err(|err| LoadError::read(path.display().to_string(), err))?;
            Ok((template_name(path), text))
        })
        .collect()
}

/// Expands `pattern` into the matching paths. No match is an error.
pub fn glob(pattern: &str) -> Result<Vec<PathBuf>> {
    match_pattern(pattern, "").map_err(|_| LoadError::BadPattern(pattern.to_string()))?;
    let matches = expand(pattern);
    if matches.is_empty() {
        return Err(LoadError::NoMatches(pattern.to_string()).into());
    }
    Ok(matches)
}

fn has_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '\\'])
}

fn expand(pattern: &str) -> Vec<PathBuf> {
    if !has_meta(pattern) {
        let path = PathBuf::from(pattern);
        return if path.exists() { vec![path] } else { Vec::new() };
    }
    let (dir, file) = match pattern.rfind('/') {
        Some(0) => ("/", &pattern[1..]),
        Some(pos) => (&pattern[..pos], &pattern[pos + 1..]),
        None => ("", pattern),
    };
    let dirs = if has_meta(dir) {
        expand(dir)
    } else {
        vec![PathBuf::from(dir)]
    };
    dirs.iter()
        .flat_map(|dir| matches_in(dir, file))
        .collect()
}

fn matches_in(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let listing = if dir.as_os_str().is_empty() {
        fs::read_dir(".")
    } else {
        fs::read_dir(dir)
    };
    let Ok(entries) = listing else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| match_pattern(pattern, name).unwrap_or(false))
        .collect();
    names.sort();
    names.into_iter().map(|name| dir.join(name)).collect()
}

/// Malformed pattern.
#[derive(Debug)]
pub(crate) struct BadPattern;

/// Matches one path component against a pattern.
pub(crate) fn match_pattern(pattern: &str, name: &str) -> std::result::Result<bool, BadPattern> {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    check(&pattern)?;
    Ok(matches(&pattern, &name))
}

fn check(mut p: &[char]) -> std::result::Result<(), BadPattern> {
    while let Some(&c) = p.first() {
        p = match c {
            '[' => &p[1 + class(&p[1..])?.consumed..],
            '\\' if p.len() < 2 => return Err(BadPattern),
            '\\' => &p[2..],
            _ => &p[1..],
        };
    }
    Ok(())
}

fn matches(p: &[char], s: &[char]) -> bool {
    match p.first() {
        None => s.is_empty(),
        Some('*') => {
            for i in 0..=s.len() {
                if i > 0 && s[i - 1] == '/' {
                    break;
                }
                if matches(&p[1..], &s[i..]) {
                    return true;
                }
            }
            false
        }
        Some('?') => matches!(s.first(), Some(c) if *c != '/') && matches(&p[1..], &s[1..]),
        Some('[') => {
            let Ok(class) = class(&p[1..]) else {
                return false;
            };
            match s.first() {
                Some(&c) if c != '/' && class.contains(c) => {
                    matches(&p[1 + class.consumed..], &s[1..])
                }
                _ => false,
            }
        }
        Some('\\') => {
            p.len() >= 2 && s.first() == Some(&p[1]) && matches(&p[2..], &s[1..])
        }
        Some(c) => s.first() == Some(c) && matches(&p[1..], &s[1..]),
    }
}

struct Class {
    negated: bool,
    ranges: Vec<(char, char)>,
    /// Pattern characters after the opening `[`, closing `]` included.
    consumed: usize,
}

impl Class {
    fn contains(&self, c: char) -> bool {
        let hit = self.ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
        hit != self.negated
    }
}

fn class(p: &[char]) -> std::result::Result<Class, BadPattern> {
    let mut i = 0;
    let negated = matches!(p.first(), Some('^') | Some('!'));
    if negated {
        i += 1;
    }
    let mut ranges = Vec::new();
    loop {
        match p.get(i) {
            None => return Err(BadPattern),
            Some(']') if !ranges.is_empty() => {
                return Ok(Class {
                    negated,
                    ranges,
                    consumed: i + 1,
                })
            }
            Some(_) => {
                let (lo, next) = class_char(p, i)?;
                i = next;
                let mut hi = lo;
                if p.get(i) == Some(&'-') && p.get(i + 1).is_some_and(|c| *c != ']') {
                    let (end, next) = class_char(p, i + 1)?;
                    hi = end;
                    i = next;
                }
                if lo > hi {
                    return Err(BadPattern);
                }
                ranges.push((lo, hi));
            }
        }
    }
}

fn class_char(p: &[char], i: usize) -> std::result::Result<(char, usize), BadPattern> {
    match p.get(i) {
        Some('\\') => p.get(i + 1).map(|c| (*c, i + 2)).ok_or(BadPattern),
        Some(']') | None => Err(BadPattern),
        Some(c) => Ok((*c, i + 1)),
    }
}
