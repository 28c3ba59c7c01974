//! Three-part object names (`database.owner.object`)

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Default owner (schema) for names that do not specify one
pub const DEFAULT_OWNER: &str = "dbo";

/// A qualified object name.
///
/// Comparison, ordering, and hashing are case-insensitive part by part. A missing
/// part only equals another missing part.
#[derive(Debug, Clone)]
pub struct Name {
    database: Option<String>,
    owner: Option<String>,
    object: Option<String>,
}

impl Name {
    /// Create `[owner].[object]`.
    pub fn new(owner: &str, object: &str) -> Self {
        Self {
            database: None,
            owner: Some(owner.to_string()),
            object: Some(object.to_string()),
        }
    }

    /// Create an object name in the default owner.
    pub fn object(object: &str) -> Self {
        Self::new(DEFAULT_OWNER, object)
    }

    /// Create a name from raw parts, none of which are defaulted.
    pub fn from_parts(database: Option<&str>, owner: Option<&str>, object: Option<&str>) -> Self {
        Self {
            database: database.map(str::to_string),
            owner: owner.map(str::to_string),
            object: object.map(str::to_string),
        }
    }

    /// Parse a possibly bracket-quoted, dot-separated identifier.
    ///
    /// `foo` and `dbo.foo` resolve to the same name. Four-part names drop the
    /// server part. Returns `None` for empty input.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = split_identifier_parts(text);
        if parts.is_empty() || parts.iter().all(|p| p.is_empty()) {
            return None;
        }
        if parts.len() > 3 {
            parts.drain(..parts.len() - 3);
        }
        let object = parts.pop().filter(|p| !p.is_empty())?;
        let owner = parts
            .pop()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_OWNER.to_string());
        let database = parts.pop().filter(|p| !p.is_empty());
        Some(Self {
            database,
            owner: Some(owner),
            object: Some(object),
        })
    }

    pub fn database_part(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn owner_part(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn object_part(&self) -> Option<&str> {
        self.object.as_deref()
    }

    /// Object part, or an empty string when absent.
    pub fn object_name(&self) -> &str {
        self.object.as_deref().unwrap_or("")
    }

    /// Same database and owner, different object.
    pub fn with_object(&self, object: &str) -> Self {
        Self {
            database: self.database.clone(),
            owner: self.owner.clone(),
            object: Some(object.to_string()),
        }
    }

    /// `owner.object` without brackets, as accepted by `sp_rename`.
    pub fn unquoted(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}.{}", owner, self.object_name()),
            None => self.object_name().to_string(),
        }
    }

    fn parts_lowercase(&self) -> [Option<String>; 3] {
        [
            self.database.as_ref().map(|s| s.to_ascii_lowercase()),
            self.owner.as_ref().map(|s| s.to_ascii_lowercase()),
            self.object.as_ref().map(|s| s.to_ascii_lowercase()),
        ]
    }
}

fn part_eq(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        part_eq(&self.database, &other.database)
            && part_eq(&self.owner, &other.owner)
            && part_eq(&self.object, &other.object)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts_lowercase().hash(state);
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts_lowercase().cmp(&other.parts_lowercase())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(database) = &self.database {
            write!(f, "[{}].", database)?;
        }
        if let Some(owner) = &self.owner {
            write!(f, "[{}].", owner)?;
        }
        write!(f, "[{}]", self.object_name())
    }
}

/// Split `[a].b."c"` into its unquoted parts. `]]` inside brackets is an escaped `]`.
pub fn split_identifier_parts(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                while let Some(inner) = chars.next() {
                    if inner == ']' {
                        if chars.peek() == Some(&']') {
                            chars.next();
                            current.push(']');
                        } else {
                            break;
                        }
                    } else {
                        current.push(inner);
                    }
                }
            }
            '"' => {
                for inner in chars.by_ref() {
                    if inner == '"' {
                        break;
                    }
                    current.push(inner);
                }
            }
            '.' => parts.push(std::mem::take(&mut current).trim().to_string()),
            c => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_part_equality() {
        assert_eq!(Name::parse("dbo.a.b"), Name::parse("dbo.a.b"));
        assert_ne!(Name::parse("dbo.a.b"), Name::parse("dbo.a.c"));
        assert_ne!(Name::parse("dbo.a.b"), Name::parse("x.a.b"));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(Name::parse("DBO.Foo"), Name::parse("dbo.foo"));
        assert_eq!(
            Name::parse("[dbo].[FOO]").unwrap().cmp(&Name::parse("dbo.foo").unwrap()),
            Ordering::Equal
        );
    }

    #[test]
    fn test_default_owner() {
        assert_eq!(Name::parse("foo"), Name::parse("dbo.foo"));
        assert_eq!(Name::parse("foo").unwrap().to_string(), "[dbo].[foo]");
    }

    #[test]
    fn test_missing_parts() {
        let a = Name::from_parts(None, None, Some("x"));
        let b = Name::from_parts(None, None, Some("x"));
        let c = Name::from_parts(None, Some("dbo"), Some("x"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        let none: Option<Name> = None;
        assert_eq!(none, None);
        assert_ne!(none, Some(a));
    }

    #[test]
    fn test_bracketed_parts_with_dots() {
        let name = Name::parse("[my.schema].[odd]]name]").unwrap();
        assert_eq!(name.owner_part(), Some("my.schema"));
        assert_eq!(name.object_part(), Some("odd]name"));
    }

    #[test]
    fn test_database_part_rendering() {
        let name = Name::parse("db.dbo.foo").unwrap();
        assert_eq!(name.to_string(), "[db].[dbo].[foo]");
        assert_eq!(Name::parse("db..foo").unwrap().owner_part(), Some("dbo"));
    }

    #[test]
    fn test_empty_is_none() {
        assert!(Name::parse("").is_none());
        assert!(Name::parse("  ").is_none());
    }
}
