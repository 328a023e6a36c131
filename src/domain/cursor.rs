use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque position token in a server-ordered sequence
///
/// Either issued by the server (`next_cursor` / `prev_cursor`) or synthesized on the
/// client from an item (`"{sort_key},{id}"`) or from an absolute offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Keyset cursor built from an item's sort key and id
    pub fn synthesized(sort_key: &str, id: &str) -> Self {
        Self(format!("{sort_key},{id}"))
    }

    /// Offset cursor (decimal absolute index)
    pub fn from_offset(offset: usize) -> Self {
        Self(offset.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse this cursor as an absolute offset, if it is one
    pub fn as_offset(&self) -> Option<usize> {
        self.0.parse().ok()
    }

    /// Split a keyset cursor into `(sort_key, id)` at the first comma
    pub fn as_keyset(&self) -> Option<(&str, &str)> {
        self.0.split_once(',')
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Paging direction as sent on the wire (`dir=next|prev`)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

/// How a feed derives cursors it has not been handed by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// `"{sort_key},{id}"` of the boundary item
    #[default]
    Keyset,
    /// Decimal absolute offset of the boundary
    Offset,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_synthesized_cursor_format() {
        let cursor = Cursor::synthesized("2024-05-01T10:00:00Z", "job-42");
        assert_eq!(cursor.as_str(), "2024-05-01T10:00:00Z,job-42");
        assert_eq!(
            cursor.as_keyset(),
            Some(("2024-05-01T10:00:00Z", "job-42"))
        );
    }

    #[test]
    fn test_offset_cursor() {
        let cursor = Cursor::from_offset(150);
        assert_eq!(cursor.as_str(), "150");
        assert_eq!(cursor.as_offset(), Some(150));
        assert_eq!(Cursor::new("abc").as_offset(), None);
    }

    #[test]
    fn test_direction_wire_format() -> color_eyre::eyre::Result<()> {
        assert_eq!(Direction::Next.to_string(), "next");
        assert_eq!(Direction::Prev.as_ref(), "prev");
        assert_eq!(Direction::from_str("prev")?, Direction::Prev);
        assert_eq!(serde_json::to_string(&Direction::Next)?, "\"next\"");
        Ok(())
    }

    #[test]
    fn test_cursor_serializes_transparently() -> color_eyre::eyre::Result<()> {
        let cursor = Cursor::new("opaque-token");
        assert_eq!(serde_json::to_string(&cursor)?, "\"opaque-token\"");
        let parsed: Option<Cursor> = serde_json::from_str("null")?;
        assert_eq!(parsed, None);
        Ok(())
    }
}
