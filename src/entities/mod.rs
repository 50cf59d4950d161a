use sqlx::FromRow;

/// --- Tables ---

/// A stored article. Only the columns the acquisition path touches are mapped.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Entry {
    pub id: i64,
    pub url: Option<String>,
    pub readable_content: Option<String>,
}

impl Entry {
    /// Cached readable content, if a previous fetch already stored some.
    pub fn cached_content(&self) -> Option<&str> {
        self.readable_content
            .as_deref()
            .filter(|content| !content.is_empty())
    }

    /// Source URL, if present and not blank.
    pub fn source_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
