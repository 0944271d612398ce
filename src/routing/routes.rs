//! Combined route table, kept for inspection.
//!
//! The request path never consults this table; it mirrors what was
//! mounted into the axum router so `routes` listings and the welcome-page
//! decision see the same view.

use std::fmt;

use serde::Serialize;

/// One line of the combined route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    /// HTTP method, or `*` for mounted endpoints.
    pub method: String,
    /// Full path including the mount prefix.
    pub path: String,
    /// What handles the route, e.g. `web: books.index`.
    pub to: String,
    /// Optional route name.
    pub name: Option<String>,
}

/// All routes of an application, in mount order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RouteEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = RouteEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Route registered under `name`.
    pub fn named(&self, name: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.name.as_deref() == Some(name))
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method_width = self.entries.iter().map(|e| e.method.len()).max().unwrap_or(0);
        let path_width = self.entries.iter().map(|e| e.path.len()).max().unwrap_or(0);
        for entry in &self.entries {
            write!(
                f,
                "{:<mw$}  {:<pw$}  {}",
                entry.method,
                entry.path,
                entry.to,
                mw = method_width,
                pw = path_width
            )?;
            if let Some(name) = &entry.name {
                write!(f, "  as :{name}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(method: &str, path: &str, to: &str, name: Option<&str>) -> RouteEntry {
        RouteEntry {
            method: method.into(),
            path: path.into(),
            to: to.into(),
            name: name.map(String::from),
        }
    }

    #[test]
    fn test_display_aligns_columns() {
        let mut table = RouteTable::new();
        table.push(entry("GET", "/books", "web: books.index", Some("books")));
        table.push(entry("DELETE", "/books/:id", "web: books.destroy", None));

        let text = table.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "GET     /books      web: books.index  as :books");
        assert_eq!(lines[1], "DELETE  /books/:id  web: books.destroy");
    }

    #[test]
    fn test_named_lookup() {
        let mut table = RouteTable::new();
        assert!(table.is_empty());
        table.push(entry("GET", "/", "web: home.show", Some("root")));
        assert_eq!(table.named("root").unwrap().path, "/");
        assert!(table.named("missing").is_none());
    }
}
