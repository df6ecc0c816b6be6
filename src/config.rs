//! Pager configuration
//!
//! [`PagerConfig`] holds everything that can be written down in a YAML or
//! JSON file. [`PagerOptions`] wraps it and adds the pieces that are code:
//! predicates, computed key accessors, dynamic parameters and explicit
//! exhaustion strategies.
//!
//! Each pager owns its own options value; nothing is shared or mutated
//! after construction.

use crate::error::{Error, Result};
use crate::pagination::{
    DynamicParamsFn, ExhaustionPolicy, HasMore, HasMoreFn, KeyAccessor, LenientPolicy,
    ParamBuilder, ParamNames, StrictPolicy,
};
use crate::types::ParameterMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Page size used when neither the config nor the collection provides one
pub const FALLBACK_PAGE_SIZE: u32 = 10;

/// Default scroll buffer in pixels
pub const DEFAULT_BUFFER_PIXELS: f64 = 400.0;

/// Default resize coalescing window
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 300;

// ============================================================================
// Serializable Config
// ============================================================================

/// Declarative pager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerConfig {
    /// Fetch when the content's trailing edge is within this many pixels
    pub buffer_pixels: f64,

    /// Items per page (`None` = current collection size, or 10)
    pub page_size: Option<u32>,

    /// Pages already loaded when pagination starts or resets
    pub initial_pages: u32,

    /// Detect exhaustion from the collection size instead of the response
    pub strict: bool,

    /// Boolean response field telling whether more pages exist (lenient mode)
    pub has_more_field: Option<String>,

    /// Parameter names
    pub params: ParamNames,

    /// Item field used as the cursor key; enables key mode
    pub key_field: Option<String>,

    /// Static parameters merged into every request
    pub extra_params: ParameterMap,

    /// Replace instead of append on fetch (forwarded to the data source)
    pub remove: bool,

    /// Resize coalescing window in milliseconds
    pub resize_debounce_ms: u64,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            buffer_pixels: DEFAULT_BUFFER_PIXELS,
            page_size: None,
            initial_pages: 1,
            strict: false,
            has_more_field: None,
            params: ParamNames::default(),
            key_field: None,
            extra_params: ParameterMap::new(),
            remove: false,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
        }
    }
}

impl PagerConfig {
    /// Load from a YAML or JSON file (chosen by extension, YAML otherwise)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Resize coalescing window
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Check the configuration for values that cannot work
    pub fn validate(&self) -> Result<()> {
        self.validate_with_key_mode(self.key_field.is_some())
    }

    fn validate_with_key_mode(&self, key_mode: bool) -> Result<()> {
        if !self.buffer_pixels.is_finite() || self.buffer_pixels < 0.0 {
            return Err(Error::invalid_value(
                "buffer_pixels",
                format!("must be a non-negative number, got {}", self.buffer_pixels),
            ));
        }

        if self.page_size == Some(0) {
            return Err(Error::invalid_value(
                "page_size",
                "must be greater than zero",
            ));
        }

        if let Some(field) = &self.key_field {
            if field.trim().is_empty() {
                return Err(Error::invalid_value("key_field", "cannot be empty"));
            }
        }

        if key_mode && self.params.until.is_none() {
            return Err(Error::missing_field("params.until"));
        }

        let mut seen = HashSet::new();
        for (slot, name) in self.params.enabled() {
            if slot == "until" && !key_mode {
                continue;
            }
            if name.is_empty() {
                return Err(Error::invalid_value(
                    format!("params.{slot}"),
                    "parameter name cannot be empty",
                ));
            }
            if !seen.insert(name) {
                return Err(Error::invalid_value(
                    format!("params.{slot}"),
                    format!("parameter name '{name}' is used by more than one slot"),
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Options
// ============================================================================

/// Configuration plus code-level hooks
#[derive(Clone, Default)]
pub struct PagerOptions {
    /// Declarative part
    pub config: PagerConfig,
    has_more: Option<HasMoreFn>,
    key_accessor: Option<KeyAccessor>,
    dynamic_params: Option<DynamicParamsFn>,
    policy: Option<Arc<dyn ExhaustionPolicy>>,
}

impl PagerOptions {
    /// Wrap a config
    pub fn new(config: PagerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Lenient-mode predicate (overrides `has_more_field`)
    #[must_use]
    pub fn with_has_more(mut self, predicate: HasMoreFn) -> Self {
        self.has_more = Some(predicate);
        self
    }

    /// Key accessor (overrides `key_field`)
    #[must_use]
    pub fn with_key_accessor(mut self, accessor: KeyAccessor) -> Self {
        self.key_accessor = Some(accessor);
        self
    }

    /// Parameters recomputed for every request
    #[must_use]
    pub fn with_dynamic_params(
        mut self,
        params: impl Fn() -> ParameterMap + Send + Sync + 'static,
    ) -> Self {
        self.dynamic_params = Some(Arc::new(params));
        self
    }

    /// Explicit exhaustion strategy (overrides `strict` and predicates)
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn ExhaustionPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Validate the config together with the hooks
    pub fn validate(&self) -> Result<()> {
        self.config.validate_with_key_mode(self.key_accessor().is_some())
    }

    /// Page size: explicit, else the collection's current size, else the fallback
    pub fn resolve_page_size(&self, collection_len: usize) -> u32 {
        self.config
            .page_size
            .or_else(|| u32::try_from(collection_len).ok().filter(|len| *len > 0))
            .unwrap_or(FALLBACK_PAGE_SIZE)
    }

    /// Key accessor in effect, if key mode is on
    pub fn key_accessor(&self) -> Option<KeyAccessor> {
        self.key_accessor
            .clone()
            .or_else(|| self.config.key_field.as_deref().map(KeyAccessor::field))
    }

    /// Exhaustion strategy in effect
    pub fn policy(&self) -> Arc<dyn ExhaustionPolicy> {
        if let Some(policy) = &self.policy {
            return Arc::clone(policy);
        }
        if self.config.strict {
            if self.has_more.is_some() || self.config.has_more_field.is_some() {
                tracing::warn!("has_more predicate is ignored in strict mode");
            }
            return Arc::new(StrictPolicy);
        }

        let predicate = self.has_more.clone().or_else(|| {
            self.config
                .has_more_field
                .as_deref()
                .map(HasMore::field)
        });
        match predicate {
            Some(predicate) => Arc::new(LenientPolicy::with_predicate(predicate)),
            None => Arc::new(LenientPolicy::new()),
        }
    }

    /// Parameter builder for the resolved page size
    pub fn param_builder(&self, page_size: u32) -> ParamBuilder {
        let mut builder = ParamBuilder::new(self.config.params.clone(), page_size)
            .with_extra_params(self.config.extra_params.clone());
        if let Some(accessor) = self.key_accessor() {
            builder = builder.with_key_accessor(accessor);
        }
        if let Some(dynamic) = &self.dynamic_params {
            builder = builder.with_dynamic_params(Arc::clone(dynamic));
        }
        builder
    }
}

impl From<PagerConfig> for PagerOptions {
    fn from(config: PagerConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for PagerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagerOptions")
            .field("config", &self.config)
            .field("has_more", &self.has_more.is_some())
            .field("key_accessor", &self.key_accessor)
            .field("dynamic_params", &self.dynamic_params.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::CursorKind;
    use serde_json::json;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = PagerConfig::default();
        assert!((config.buffer_pixels - 400.0).abs() < f64::EPSILON);
        assert_eq!(config.page_size, None);
        assert_eq!(config.initial_pages, 1);
        assert!(!config.strict);
        assert_eq!(config.resize_debounce(), Duration::from_millis(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
buffer_pixels: 150
page_size: 25
strict: true
params:
  page_size: limit
  offset: null
  page: page
extra_params:
  sort: created_at
"#;
        let config = PagerConfig::from_yaml_str(yaml).unwrap();
        assert!((config.buffer_pixels - 150.0).abs() < f64::EPSILON);
        assert_eq!(config.page_size, Some(25));
        assert!(config.strict);
        assert_eq!(config.params.page_size.as_deref(), Some("limit"));
        assert_eq!(config.params.offset, None);
        assert_eq!(config.params.page.as_deref(), Some("page"));
        // Unlisted slots keep their defaults
        assert_eq!(config.params.until.as_deref(), Some("until"));
        assert_eq!(config.extra_params.get("sort"), Some(&json!("created_at")));
    }

    #[test]
    fn test_from_json() {
        let config = PagerConfig::from_json_str(r#"{"key_field": "id", "page_size": 5}"#).unwrap();
        assert_eq!(config.key_field.as_deref(), Some("id"));
        assert_eq!(config.page_size, Some(5));
    }

    #[test]
    fn test_from_file() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "page_size: 40\nremove: true").unwrap();

        let config = PagerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.page_size, Some(40));
        assert!(config.remove);

        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"buffer_pixels": 10}}"#).unwrap();
        let config = PagerConfig::from_file(file.path()).unwrap();
        assert!((config.buffer_pixels - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_missing_file() {
        let err = PagerConfig::from_file("/nonexistent/pager.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_invalid_values() {
        let err = PagerConfig::from_yaml_str("page_size: 0").unwrap_err();
        assert!(err.to_string().contains("page_size"));

        let err = PagerConfig::from_yaml_str("buffer_pixels: -5").unwrap_err();
        assert!(err.to_string().contains("buffer_pixels"));

        let err = PagerConfig::from_yaml_str("params:\n  page: _skip").unwrap_err();
        assert!(err.to_string().contains("more than one slot"));

        let err = PagerConfig::from_yaml_str("key_field: id\nparams:\n  until: null").unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));

        assert!(PagerConfig::from_yaml_str("page_size: [1, 2]").is_err());
    }

    #[test]
    fn test_until_name_ignored_outside_key_mode() {
        // `until` colliding with another slot is fine when key mode is off
        let config = PagerConfig::from_yaml_str("params:\n  until: _skip").unwrap();
        assert!(config.validate().is_ok());

        let options = PagerOptions::new(config).with_key_accessor(KeyAccessor::field("id"));
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_resolve_page_size() {
        let options = PagerOptions::default();
        assert_eq!(options.resolve_page_size(0), FALLBACK_PAGE_SIZE);
        assert_eq!(options.resolve_page_size(30), 30);

        let options = PagerOptions::new(PagerConfig {
            page_size: Some(12),
            ..Default::default()
        });
        assert_eq!(options.resolve_page_size(30), 12);
    }

    #[test]
    fn test_policy_selection() {
        assert_eq!(PagerOptions::default().policy().name(), "lenient");

        let strict = PagerOptions::new(PagerConfig {
            strict: true,
            ..Default::default()
        });
        assert_eq!(strict.policy().name(), "strict");

        let explicit = PagerOptions::default().with_policy(Arc::new(StrictPolicy));
        assert_eq!(explicit.policy().name(), "strict");
    }

    #[test]
    fn test_param_builder_from_options() {
        let options = PagerOptions::new(PagerConfig {
            key_field: Some("id".to_string()),
            ..Default::default()
        });
        let builder = options.param_builder(20);
        assert_eq!(builder.cursor_kind(), CursorKind::Key);
        assert_eq!(builder.page_size(), 20);

        let builder = PagerOptions::default().param_builder(20);
        assert_eq!(builder.cursor_kind(), CursorKind::Offset);
    }

    #[test]
    fn test_options_are_independent() {
        let base = PagerOptions::default();
        let mut other = base.clone();
        other.config.buffer_pixels = 10.0;
        assert!((base.config.buffer_pixels - DEFAULT_BUFFER_PIXELS).abs() < f64::EPSILON);
    }
}
