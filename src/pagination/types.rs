//! Pagination types
//!
//! Cursor state, parameter naming and item key extraction.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which pagination position is primary for this pager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    /// Page number pagination (`?page=3`)
    Page,
    /// Offset pagination (`?_skip=50&_limit=25`)
    Offset,
    /// Keyset pagination from the last loaded item (`?until=obj_123`)
    Key,
}

/// Position of the next page to request
///
/// `page` counts pages already loaded. It starts at `initial_page` and
/// grows by exactly one per successful fetch; only [`Cursor::reset`] moves
/// it back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cursor {
    kind: CursorKind,
    page: u32,
    initial_page: u32,
    key: Option<JsonValue>,
}

impl Cursor {
    /// Create a cursor positioned after `initial_page` loaded pages
    pub fn new(kind: CursorKind, initial_page: u32) -> Self {
        Self {
            kind,
            page: initial_page,
            initial_page,
            key: None,
        }
    }

    /// Cursor kind
    pub fn kind(&self) -> CursorKind {
        self.kind
    }

    /// Pages loaded so far
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Item offset of the next page
    pub fn offset(&self, page_size: u32) -> u64 {
        u64::from(self.page) * u64::from(page_size)
    }

    /// One-based number of the next page
    pub fn page_number(&self) -> u32 {
        self.page.saturating_add(1)
    }

    /// Key of the last item seen after the most recent fetch
    pub fn key(&self) -> Option<&JsonValue> {
        self.key.as_ref()
    }

    /// Move past one successfully fetched page
    pub fn advance(&mut self, last_key: Option<JsonValue>) {
        self.page = self.page.saturating_add(1);
        if self.kind == CursorKind::Key {
            self.key = last_key;
        }
    }

    /// Back to the start of a fresh pagination sequence
    pub fn reset(&mut self) {
        self.page = self.initial_page;
        self.key = None;
    }
}

/// Mutable pagination state owned by the controller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationState {
    /// Next page position
    pub cursor: Cursor,
    /// Last observed `scroll_offset + viewport_size`
    pub last_known_scroll_extent: f64,
    /// Items per page, fixed at construction
    pub page_size: u32,
}

impl PaginationState {
    /// Create a fresh state
    pub fn new(kind: CursorKind, initial_page: u32, page_size: u32) -> Self {
        Self {
            cursor: Cursor::new(kind, initial_page),
            last_known_scroll_extent: 0.0,
            page_size,
        }
    }

    /// Start over; cursor and scroll baseline are reset together
    pub fn reset(&mut self) {
        self.cursor.reset();
        self.last_known_scroll_extent = 0.0;
    }

    /// Items expected in the collection if every loaded page was full
    pub fn expected_len(&self) -> u64 {
        self.cursor.offset(self.page_size)
    }
}

// ============================================================================
// Parameter Names
// ============================================================================

/// Names of the pagination parameters; `None` disables a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamNames {
    /// Page size parameter
    pub page_size: Option<String>,
    /// Offset parameter
    pub offset: Option<String>,
    /// One-based page number parameter
    pub page: Option<String>,
    /// Last-item key parameter (key mode only)
    pub until: Option<String>,
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            page_size: Some("_limit".to_string()),
            offset: Some("_skip".to_string()),
            page: None,
            until: Some("until".to_string()),
        }
    }
}

impl ParamNames {
    /// All slots disabled
    pub fn none() -> Self {
        Self {
            page_size: None,
            offset: None,
            page: None,
            until: None,
        }
    }

    /// Set the page size parameter name
    #[must_use]
    pub fn with_page_size(mut self, name: impl Into<String>) -> Self {
        self.page_size = Some(name.into());
        self
    }

    /// Set the offset parameter name
    #[must_use]
    pub fn with_offset(mut self, name: impl Into<String>) -> Self {
        self.offset = Some(name.into());
        self
    }

    /// Set the page number parameter name
    #[must_use]
    pub fn with_page(mut self, name: impl Into<String>) -> Self {
        self.page = Some(name.into());
        self
    }

    /// Set the last-item key parameter name
    #[must_use]
    pub fn with_until(mut self, name: impl Into<String>) -> Self {
        self.until = Some(name.into());
        self
    }

    /// Enabled slot names, in slot order
    pub fn enabled(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("page_size", self.page_size.as_deref()),
            ("offset", self.offset.as_deref()),
            ("page", self.page.as_deref()),
            ("until", self.until.as_deref()),
        ]
        .into_iter()
        .filter_map(|(slot, name)| name.map(|n| (slot, n)))
    }
}

// ============================================================================
// Key Accessor
// ============================================================================

/// Computed key function
pub type KeyFn = Arc<dyn Fn(&JsonValue) -> Option<JsonValue> + Send + Sync>;

/// Extracts a cursor key from an item
#[derive(Clone)]
pub enum KeyAccessor {
    /// Dotted field path (`id`, `meta.created_at`, `$.id`)
    Field(String),
    /// Named function computing the key
    Computed {
        /// Name used in logs
        name: String,
        /// The accessor
        accessor: KeyFn,
    },
}

impl KeyAccessor {
    /// Create a field accessor
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    /// Create a computed accessor
    pub fn computed(
        name: impl Into<String>,
        accessor: impl Fn(&JsonValue) -> Option<JsonValue> + Send + Sync + 'static,
    ) -> Self {
        Self::Computed {
            name: name.into(),
            accessor: Arc::new(accessor),
        }
    }

    /// Read the key of an item; `null` counts as missing
    pub fn key_of(&self, item: &JsonValue) -> Option<JsonValue> {
        let key = match self {
            Self::Field(path) => extract_path_value(item, path),
            Self::Computed { accessor, .. } => accessor(item),
        };
        key.filter(|k| !k.is_null())
    }
}

impl fmt::Debug for KeyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(path) => f.debug_tuple("Field").field(path).finish(),
            Self::Computed { name, .. } => f.debug_tuple("Computed").field(name).finish(),
        }
    }
}

/// Extract a JSON value from a dotted path
pub fn extract_path_value(value: &JsonValue, path: &str) -> Option<JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.').filter(|p| !p.is_empty()) {
        match current {
            JsonValue::Object(map) => {
                current = map.get(part)?;
            }
            _ => return None,
        }
    }

    Some(current.clone())
}
