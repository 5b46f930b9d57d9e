use std::collections::BTreeMap;

/// Path key under which shape errors with no owning field are collected.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

///
/// PathSegment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        Self::Field(s.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        Self::Field(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

///
/// Report
///
/// Collects validation issues by dotted attribute path while a decode pass
/// walks the value tree. Field segments join with `.`, index segments render
/// as `[i]` with no separator.
///

#[derive(Debug, Default)]
pub struct Report {
    path: Vec<PathSegment>,
    issues: BTreeMap<String, Vec<String>>,
}

impl Report {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            path: Vec::new(),
            issues: BTreeMap::new(),
        }
    }

    /// Record an issue at the current path.
    pub fn issue(&mut self, message: impl Into<String>) {
        let key = self.path_key();
        self.issues.entry(key).or_default().push(message.into());
    }

    /// Run `f` with `segment` pushed onto the path.
    pub fn scoped<T>(
        &mut self,
        segment: impl Into<PathSegment>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.path.push(segment.into());
        let out = f(self);
        self.path.pop();
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn into_issues(self) -> BTreeMap<String, Vec<String>> {
        self.issues
    }

    fn path_key(&self) -> String {
        if self.path.is_empty() {
            return NON_FIELD_ERRORS.to_string();
        }

        let mut key = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Field(name) => {
                    if !key.is_empty() {
                        key.push('.');
                    }
                    key.push_str(name);
                }
                PathSegment::Index(i) => {
                    key.push('[');
                    key.push_str(&i.to_string());
                    key.push(']');
                }
            }
        }
        key
    }
}
