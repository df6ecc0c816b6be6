//! Request parameter construction
//!
//! Turns the cursor into the parameter map attached to the next fetch.

use super::types::{Cursor, CursorKind, KeyAccessor, ParamNames};
use crate::ports::Collection;
use crate::types::{JsonValue, ParameterMap};
use std::fmt;
use std::sync::Arc;

/// Produces parameters computed at request time
pub type DynamicParamsFn = Arc<dyn Fn() -> ParameterMap + Send + Sync>;

/// Builds the parameter map for the next fetch
///
/// Merge order: static extras, then dynamic extras, then the derived
/// pagination parameters, which overwrite any colliding key.
#[derive(Clone)]
pub struct ParamBuilder {
    names: ParamNames,
    page_size: u32,
    key_accessor: Option<KeyAccessor>,
    extra_params: ParameterMap,
    dynamic_params: Option<DynamicParamsFn>,
}

impl ParamBuilder {
    /// Create a builder for offset/page pagination
    pub fn new(names: ParamNames, page_size: u32) -> Self {
        Self {
            names,
            page_size,
            key_accessor: None,
            extra_params: ParameterMap::new(),
            dynamic_params: None,
        }
    }

    /// Switch to key mode with the given accessor
    #[must_use]
    pub fn with_key_accessor(mut self, accessor: KeyAccessor) -> Self {
        self.key_accessor = Some(accessor);
        self
    }

    /// Static parameters sent with every request
    #[must_use]
    pub fn with_extra_params(mut self, params: ParameterMap) -> Self {
        self.extra_params = params;
        self
    }

    /// Parameters recomputed for every request
    #[must_use]
    pub fn with_dynamic_params(mut self, params: DynamicParamsFn) -> Self {
        self.dynamic_params = Some(params);
        self
    }

    /// Cursor kind implied by the configured slots
    pub fn cursor_kind(&self) -> CursorKind {
        if self.key_accessor.is_some() {
            CursorKind::Key
        } else if self.names.offset.is_some() {
            CursorKind::Offset
        } else {
            CursorKind::Page
        }
    }

    /// Page size used for the page size and offset slots
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Key accessor, when in key mode
    pub fn key_accessor(&self) -> Option<&KeyAccessor> {
        self.key_accessor.as_ref()
    }

    /// Build the full parameter map
    ///
    /// Returns `None` when key mode is active and no key can be derived
    /// from the collection.
    pub fn build(&self, cursor: &Cursor, collection: &dyn Collection) -> Option<ParameterMap> {
        let last_item = if self.key_accessor.is_some() {
            collection.last_item()
        } else {
            None
        };
        let derived = self.derived(cursor, last_item.as_ref())?;

        let mut params = self.extra_params.clone();
        if let Some(dynamic) = &self.dynamic_params {
            params.extend(dynamic());
        }
        params.extend(derived);
        Some(params)
    }

    /// Build only the pagination parameters
    pub fn derived(&self, cursor: &Cursor, last_item: Option<&JsonValue>) -> Option<ParameterMap> {
        let mut params = ParameterMap::new();

        if let Some(name) = &self.names.page_size {
            params.insert(name.clone(), JsonValue::from(self.page_size));
        }

        if let Some(name) = &self.names.offset {
            params.insert(name.clone(), JsonValue::from(cursor.offset(self.page_size)));
        }

        if let Some(name) = &self.names.page {
            params.insert(name.clone(), JsonValue::from(cursor.page_number()));
        }

        if let Some(accessor) = &self.key_accessor {
            let key = last_item.and_then(|item| accessor.key_of(item))?;
            if let Some(name) = &self.names.until {
                params.insert(name.clone(), key);
            }
        }

        Some(params)
    }
}

impl fmt::Debug for ParamBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamBuilder")
            .field("names", &self.names)
            .field("page_size", &self.page_size)
            .field("key_accessor", &self.key_accessor)
            .field("extra_params", &self.extra_params)
            .field("dynamic_params", &self.dynamic_params.is_some())
            .finish()
    }
}
