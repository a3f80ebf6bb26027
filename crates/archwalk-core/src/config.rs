//! Traversal configuration.

use std::cmp::Ordering;
use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::Candidate;
use crate::Result;
use crate::WalkError;
use crate::error::ErrorAction;
use crate::walker::Flavor;

/// Predicate over an entry, used for both file and descend filters.
pub type Filter = Arc<dyn Fn(&Candidate<'_>) -> bool + Send + Sync>;

/// Callback that sees every error a traversal runs into.
pub type ErrorHandler = Arc<dyn Fn(&WalkError) -> ErrorAction + Send + Sync>;

/// Three-way comparator over sibling entries.
pub type Comparator = Arc<dyn Fn(&Candidate<'_>, &Candidate<'_>) -> Ordering + Send + Sync>;

/// How siblings are ordered before they are queued.
#[derive(Clone, Default)]
pub enum SortOrder {
    /// Directory-read order.
    #[default]
    None,
    /// Ascending by full path.
    Standard,
    /// Descending by full path.
    Reverse,
    /// Caller-supplied comparator.
    Custom(Comparator),
}

impl fmt::Debug for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Standard => f.write_str("Standard"),
            Self::Reverse => f.write_str("Reverse"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Configuration shared by all three walker flavors.
///
/// # Examples
///
/// ```
/// use archwalk_core::SortOrder;
/// use archwalk_core::TraversalOptions;
///
/// let options = TraversalOptions::default()
///     .with_descend_filter(|c| c.file_name().is_none_or(|name| name != ".git"))
///     .with_file_filter(|c| c.path.extension().is_some_and(|ext| ext == "rs"))
///     .with_sort_files(SortOrder::Standard);
/// ```
#[derive(Clone)]
pub struct TraversalOptions {
    /// Decides whether an entry is yielded. Applies to files in `files()`
    /// and to every entry in `everything()`; starting points included.
    ///
    /// Default: `None` (accept all).
    pub file_filter: Option<Filter>,

    /// Decides whether a directory found while listing is descended into.
    /// Never consulted for starting points.
    ///
    /// Default: `None` (descend everywhere).
    pub descend_filter: Option<Filter>,

    /// Sees every error. Returning [`ErrorAction::Abort`] ends the walk.
    ///
    /// Default: `None` (abort on the first error).
    pub error_handler: Option<ErrorHandler>,

    /// Sibling ordering.
    ///
    /// Default: [`SortOrder::None`].
    pub sort_files: SortOrder,

    /// Follow symlinks found while listing. When `false` they are skipped
    /// outright. Starting points are always followed.
    ///
    /// Default: `true`.
    pub follow_symlinks: bool,

    /// Probe regular files for archive formats and walk into archives as if
    /// they were directories.
    ///
    /// Default: `false`.
    pub expand_archives: bool,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            file_filter: None,
            descend_filter: None,
            error_handler: None,
            sort_files: SortOrder::None,
            follow_symlinks: true,
            expand_archives: false,
        }
    }
}

impl fmt::Debug for TraversalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalOptions")
            .field("file_filter", &self.file_filter.is_some())
            .field("descend_filter", &self.descend_filter.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .field("sort_files", &self.sort_files)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("expand_archives", &self.expand_archives)
            .finish()
    }
}

impl TraversalOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file filter.
    #[must_use]
    pub fn with_file_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Candidate<'_>) -> bool + Send + Sync + 'static,
    {
        self.file_filter = Some(filter_fn(filter));
        self
    }

    /// Sets the descend filter.
    #[must_use]
    pub fn with_descend_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Candidate<'_>) -> bool + Send + Sync + 'static,
    {
        self.descend_filter = Some(filter_fn(filter));
        self
    }

    /// Sets the error handler.
    #[must_use]
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&WalkError) -> ErrorAction + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Sets the sibling ordering.
    #[must_use]
    pub fn with_sort_files(mut self, order: SortOrder) -> Self {
        self.sort_files = order;
        self
    }

    /// Orders siblings with a custom comparator.
    #[must_use]
    pub fn with_sort_by<F>(mut self, compare: F) -> Self
    where
        F: Fn(&Candidate<'_>, &Candidate<'_>) -> Ordering + Send + Sync + 'static,
    {
        self.sort_files = SortOrder::Custom(Arc::new(compare));
        self
    }

    /// Sets whether symlinks found while listing are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Sets whether archives are expanded.
    #[must_use]
    pub fn with_expand_archives(mut self, expand: bool) -> Self {
        self.expand_archives = expand;
        self
    }

    /// Applies untyped settings, such as ones read from a config file.
    ///
    /// Recognized keys:
    /// - `follow_symlinks`: bool
    /// - `expand_archives`: bool
    /// - `sort_files`: `true`/`false`, `"standard"`, `"reverse"` or `null`
    /// - `skip_dirs`: array of directory names never descended into; combined
    ///   with any descend filter already set
    ///
    /// Any other key, or a known key with a value of the wrong shape, is
    /// reported to the error handler as [`WalkError::InvalidOption`] naming
    /// the key and `flavor`'s factory.
    ///
    /// # Errors
    ///
    /// Returns the [`WalkError::InvalidOption`] the error handler chose to
    /// abort on. With the default handler that is the first bad key.
    ///
    /// # Examples
    ///
    /// ```
    /// use archwalk_core::Flavor;
    /// use archwalk_core::TraversalOptions;
    /// use serde_json::json;
    ///
    /// let settings = json!({ "sort_files": true, "skip_dirs": [".git", "target"] });
    /// let mut options = TraversalOptions::default();
    /// options
    ///     .apply_settings(Flavor::Files, settings.as_object().unwrap())
    ///     .unwrap();
    ///
    /// let bad = json!({ "sort_fils": true });
    /// let err = options
    ///     .apply_settings(Flavor::Files, bad.as_object().unwrap())
    ///     .unwrap_err();
    /// assert_eq!(err.to_string(), "invalid option 'sort_fils' for files()");
    /// ```
    pub fn apply_settings(&mut self, flavor: Flavor, settings: &Map<String, Value>) -> Result<()> {
        for (key, value) in settings {
            let applied = match key.as_str() {
                "follow_symlinks" => value.as_bool().map(|b| self.follow_symlinks = b),
                "expand_archives" => value.as_bool().map(|b| self.expand_archives = b),
                "sort_files" => sort_order_setting(value).map(|order| self.sort_files = order),
                "skip_dirs" => skip_dirs_setting(value).map(|names| self.skip_dirs(names)),
                _ => None,
            };
            if applied.is_none() {
                self.handle_error(WalkError::InvalidOption {
                    option: key.clone(),
                    operation: flavor.name(),
                })?;
            }
        }
        Ok(())
    }

    fn skip_dirs(&mut self, names: Vec<OsString>) {
        let previous = self.descend_filter.take();
        self.descend_filter = Some(filter_fn(move |candidate| {
            let skipped = candidate
                .file_name()
                .is_some_and(|name| names.iter().any(|skip| skip.as_os_str() == name));
            !skipped && previous.as_ref().is_none_or(|filter| filter(candidate))
        }));
    }

    /// Routes `err` through the error handler.
    ///
    /// # Errors
    ///
    /// Returns `err` back when the handler (or the default) aborts.
    pub(crate) fn handle_error(&self, err: WalkError) -> Result<()> {
        let action = self
            .error_handler
            .as_ref()
            .map_or(ErrorAction::Abort, |handler| handler(&err));
        debug!(error = %err, ?action, "traversal error");
        match action {
            ErrorAction::Continue => Ok(()),
            ErrorAction::Abort => Err(err),
        }
    }

    pub(crate) fn accepts_file(&self, candidate: &Candidate<'_>) -> bool {
        self.file_filter
            .as_ref()
            .is_none_or(|filter| filter(candidate))
    }

    pub(crate) fn descends_into(&self, candidate: &Candidate<'_>) -> bool {
        self.descend_filter
            .as_ref()
            .is_none_or(|filter| filter(candidate))
    }
}

fn filter_fn<F>(filter: F) -> Filter
where
    F: Fn(&Candidate<'_>) -> bool + Send + Sync + 'static,
{
    Arc::new(filter)
}

fn sort_order_setting(value: &Value) -> Option<SortOrder> {
    match value {
        Value::Null | Value::Bool(false) => Some(SortOrder::None),
        Value::Bool(true) => Some(SortOrder::Standard),
        Value::String(s) if s == "standard" => Some(SortOrder::Standard),
        Value::String(s) if s == "reverse" => Some(SortOrder::Reverse),
        _ => None,
    }
}

fn skip_dirs_setting(value: &Value) -> Option<Vec<OsString>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(OsString::from))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::ffi::OsStr;
    use std::path::Path;
    use std::sync::Mutex;

    fn dir_candidate<'a>(dir: &'a Path, name: &'a str, path: &'a Path) -> Candidate<'a> {
        Candidate {
            dir: Some(dir),
            name: Some(OsStr::new(name)),
            path,
        }
    }

    #[test]
    fn test_defaults() {
        let options = TraversalOptions::default();
        assert!(options.follow_symlinks);
        assert!(!options.expand_archives);
        assert!(options.file_filter.is_none());
        assert!(options.descend_filter.is_none());
        assert!(matches!(options.sort_files, SortOrder::None));
    }

    #[test]
    fn test_builder() {
        let options = TraversalOptions::new()
            .with_follow_symlinks(false)
            .with_expand_archives(true)
            .with_sort_files(SortOrder::Reverse)
            .with_file_filter(|_| false);

        assert!(!options.follow_symlinks);
        assert!(options.expand_archives);
        assert!(matches!(options.sort_files, SortOrder::Reverse));
        let path = Path::new("a/b");
        assert!(!options.accepts_file(&dir_candidate(Path::new("a"), "b", path)));
    }

    #[test]
    fn test_default_error_handler_aborts() {
        let options = TraversalOptions::default();
        let result = options.handle_error(WalkError::NotFound {
            path: "x".into(),
        });
        assert!(matches!(result, Err(WalkError::NotFound { .. })));
    }

    #[test]
    fn test_continuing_error_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = TraversalOptions::default().with_error_handler(move |err| {
            sink.lock().unwrap().push(err.to_string());
            ErrorAction::Continue
        });

        options
            .handle_error(WalkError::NotFound { path: "x".into() })
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_apply_settings_known_keys() {
        let settings = json!({
            "follow_symlinks": false,
            "expand_archives": true,
            "sort_files": "reverse",
        });
        let mut options = TraversalOptions::default();
        options
            .apply_settings(Flavor::Everything, settings.as_object().unwrap())
            .unwrap();

        assert!(!options.follow_symlinks);
        assert!(options.expand_archives);
        assert!(matches!(options.sort_files, SortOrder::Reverse));
    }

    #[test]
    fn test_apply_settings_skip_dirs_composes() {
        let settings = json!({ "skip_dirs": [".svn", "CVS"] });
        let mut options = TraversalOptions::default()
            .with_descend_filter(|c| c.file_name().is_none_or(|n| n != "node_modules"));
        options
            .apply_settings(Flavor::Dirs, settings.as_object().unwrap())
            .unwrap();

        let root = Path::new("root");
        let svn = root.join(".svn");
        let modules = root.join("node_modules");
        let src = root.join("src");
        assert!(!options.descends_into(&dir_candidate(root, ".svn", &svn)));
        assert!(!options.descends_into(&dir_candidate(root, "node_modules", &modules)));
        assert!(options.descends_into(&dir_candidate(root, "src", &src)));
    }

    #[test]
    fn test_apply_settings_unknown_key_aborts_by_default() {
        let settings = json!({ "colour": "blue" });
        let mut options = TraversalOptions::default();
        let err = options
            .apply_settings(Flavor::Dirs, settings.as_object().unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            WalkError::InvalidOption { ref option, operation: "dirs" } if option == "colour"
        ));
    }

    #[test]
    fn test_apply_settings_reports_each_bad_key() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut options = TraversalOptions::default().with_error_handler(move |err| {
            sink.lock().unwrap().push(err.to_string());
            ErrorAction::Continue
        });

        let settings = json!({
            "bogus": 1,
            "follow_symlinks": "yes",
            "sort_files": true,
        });
        options
            .apply_settings(Flavor::Files, settings.as_object().unwrap())
            .unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                "invalid option 'bogus' for files()".to_string(),
                "invalid option 'follow_symlinks' for files()".to_string(),
            ]
        );
        assert!(matches!(options.sort_files, SortOrder::Standard));
        assert!(options.follow_symlinks);
    }

    #[test]
    fn test_sort_order_debug() {
        let options = TraversalOptions::default().with_sort_by(|a, b| a.path.cmp(b.path));
        assert_eq!(format!("{:?}", options.sort_files), "Custom(..)");
        assert_eq!(format!("{:?}", SortOrder::Standard), "Standard");
    }
}
