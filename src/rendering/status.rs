//! Default status pages.
//!
//! Built-in pages are plain HTML naming the code and reason. A directory
//! of `<code>.html` files replaces them per status; it is read once at boot.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use axum::http::StatusCode;

/// Component name the application registers status pages under.
pub const STATUS_PAGES: &str = "status_pages";

/// Status page lookup keyed by HTTP status code.
#[derive(Debug, Clone, Default)]
pub struct StatusPages {
    custom: HashMap<u16, String>,
}

impl StatusPages {
    /// Built-in pages only.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load every `<code>.html` file in `dir`.
    pub fn load(dir: &Path) -> std::io::Result<Self> {
        let mut custom = HashMap::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let code = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u16>().ok())
                .filter(|c| StatusCode::from_u16(*c).is_ok());
            if let Some(code) = code {
                custom.insert(code, fs::read_to_string(&path)?);
            }
        }
        tracing::info!(dir = %dir.display(), pages = custom.len(), "Status pages loaded");
        Ok(Self { custom })
    }

    pub fn with_page(mut self, status: StatusCode, html: impl Into<String>) -> Self {
        self.custom.insert(status.as_u16(), html.into());
        self
    }

    pub fn has_custom(&self, status: StatusCode) -> bool {
        self.custom.contains_key(&status.as_u16())
    }

    pub fn render(&self, status: StatusCode) -> String {
        if let Some(page) = self.custom.get(&status.as_u16()) {
            return page.clone();
        }
        let title = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        format!(
            "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\">\n    <title>{title}</title>\n  </head>\n  <body>\n    <h1>{title}</h1>\n  </body>\n</html>\n"
        )
    }
}
