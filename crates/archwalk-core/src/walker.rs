//! The traversal iterator.
//!
//! A [`Walker`] owns a double-ended work queue. Each call to `next()` pops
//! the head, classifies it, pushes the children of directories and expanded
//! archives back onto the front in sibling order, and yields the entry if the
//! walker's [`Flavor`] and the file filter agree. Pushing to the front makes
//! the walk depth-first.
//!
//! Starting points are only looked at once everything queued before them is
//! done, so building a walker does no I/O.

use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::trace;

use crate::Entry;
use crate::EntryType;
use crate::Result;
use crate::TraversalOptions;
use crate::WalkError;
use crate::classify::Kind;
use crate::classify::classify;
use crate::entry::QueueEntry;
use crate::expand::expand;
use crate::formats::ArchiveHandle;
use crate::origin::OriginArena;
use crate::origin::OriginId;
use crate::path::normalize;

/// Which entries a walker yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Regular files only.
    Files,
    /// Directories and expanded archives only.
    Dirs,
    /// Everything that exists.
    Everything,
}

impl Flavor {
    /// Name of the factory that builds this flavor.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Dirs => "dirs",
            Self::Everything => "everything",
        }
    }

    const fn yields(self, entry_type: EntryType) -> bool {
        match self {
            Self::Files => matches!(entry_type, EntryType::File),
            Self::Dirs => matches!(entry_type, EntryType::Directory | EntryType::Archive(_)),
            Self::Everything => true,
        }
    }

    const fn filters(self) -> bool {
        !matches!(self, Self::Dirs)
    }
}

/// Lazy depth-first traversal over one or more starting points.
///
/// Built by [`files`], [`dirs`] or [`everything`]. Yields `Ok(entry)` for
/// each accepted entry and `Err(e)` once if the error handler aborts, after
/// which it returns `None` forever.
///
/// Archives are unpacked into temporary directories that are removed once
/// their contents have been walked, and in any case when the walker is
/// closed or dropped.
#[derive(Debug)]
pub struct Walker {
    flavor: Flavor,
    options: TraversalOptions,
    queue: VecDeque<QueueEntry>,
    starts: VecDeque<PathBuf>,
    origins: OriginArena,
    held: Option<OriginId>,
    done: bool,
}

impl Walker {
    /// Creates a walker of the given flavor.
    #[must_use]
    pub fn new<I, P>(flavor: Flavor, options: TraversalOptions, starts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let starts: VecDeque<PathBuf> = starts
            .into_iter()
            .map(|start| starting_path(start.as_ref()))
            .collect();
        debug!(
            flavor = flavor.name(),
            starts = starts.len(),
            ?options,
            "starting traversal"
        );
        Self {
            flavor,
            options,
            queue: VecDeque::new(),
            starts,
            origins: OriginArena::new(),
            held: None,
            done: false,
        }
    }

    /// Returns the flavor of this walker.
    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Returns the options this walker runs with.
    #[must_use]
    pub const fn options(&self) -> &TraversalOptions {
        &self.options
    }

    /// Adapts the walker to yield logical paths only.
    pub fn paths(self) -> impl FusedIterator<Item = Result<PathBuf>> {
        self.map(|entry| entry.map(Entry::into_logical_path))
    }

    /// Stops the traversal and removes every temporary directory still on
    /// disk. The walker is exhausted afterwards.
    pub fn close(&mut self) {
        if !self.done {
            debug!(
                flavor = self.flavor.name(),
                pending = self.queue.len() + self.starts.len(),
                "closing traversal"
            );
        }
        self.queue.clear();
        self.starts.clear();
        self.held = None;
        self.origins.close();
        self.done = true;
    }

    fn pop(&mut self) -> Option<QueueEntry> {
        self.queue
            .pop_front()
            .or_else(|| self.starts.pop_front().map(QueueEntry::starting_point))
    }

    fn logical_path(&self, queued: &QueueEntry) -> PathBuf {
        self.origins
            .logical_path(queued.dir.as_deref(), queued.name.as_deref(), queued.origin)
    }

    /// Processes one queue entry, returning it if it is to be yielded.
    fn visit(&mut self, queued: &QueueEntry) -> Result<Option<Entry>> {
        let entry_type = match classify(&queued.path, self.options.expand_archives) {
            Kind::Missing => {
                self.options.handle_error(WalkError::NotFound {
                    path: self.logical_path(queued),
                })?;
                return Ok(None);
            }
            Kind::Directory => {
                self.descend(&queued.path, queued.origin)?;
                EntryType::Directory
            }
            Kind::Archive(handle) => {
                self.descend_archive(&handle, queued.origin)?;
                EntryType::Archive(handle.format())
            }
            Kind::File => EntryType::File,
            Kind::Symlink => EntryType::Symlink,
            Kind::Other => EntryType::Other,
        };

        if !self.flavor.yields(entry_type) {
            return Ok(None);
        }
        if self.flavor.filters() && !self.options.accepts_file(&queued.candidate()) {
            trace!(path = %queued.path.display(), "file filter rejected entry");
            return Ok(None);
        }
        Ok(Some(Entry::new(queued, self.logical_path(queued), entry_type)))
    }

    fn descend(&mut self, dir: &Path, origin: Option<OriginId>) -> Result<()> {
        let children = expand(dir, origin, &self.options, &self.origins)?;
        if let Some(id) = origin {
            for _ in &children {
                self.origins.retain(id);
            }
        }
        for child in children.into_iter().rev() {
            self.queue.push_front(child);
        }
        Ok(())
    }

    fn descend_archive(&mut self, handle: &ArchiveHandle, origin: Option<OriginId>) -> Result<()> {
        match self.origins.extract(handle, origin) {
            Ok((root, id)) => {
                let result = self.descend(&root, Some(id));
                self.origins.release(id);
                result
            }
            Err(err) => self.options.handle_error(err),
        }
    }
}

impl Iterator for Walker {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(id) = self.held.take() {
            self.origins.release(id);
        }
        if self.done {
            return None;
        }

        while let Some(queued) = self.pop() {
            match self.visit(&queued) {
                Ok(Some(entry)) => {
                    self.held = queued.origin;
                    return Some(Ok(entry));
                }
                Ok(None) => {
                    if let Some(id) = queued.origin {
                        self.origins.release(id);
                    }
                }
                Err(err) => {
                    debug!(error = %err, "traversal aborted");
                    self.close();
                    return Some(Err(err));
                }
            }
        }

        self.close();
        None
    }
}

impl FusedIterator for Walker {}

fn starting_path(start: &Path) -> PathBuf {
    start
        .to_str()
        .map_or_else(|| start.to_path_buf(), normalize)
}

/// Walks `starts`, yielding regular files accepted by the file filter.
///
/// # Examples
///
/// ```no_run
/// use archwalk_core::TraversalOptions;
///
/// let options = TraversalOptions::default()
///     .with_descend_filter(|c| c.file_name().is_none_or(|name| name != ".svn"));
/// for path in archwalk_core::files(options, ["src"]).paths() {
///     println!("{}", path?.display());
/// }
/// # Ok::<(), archwalk_core::WalkError>(())
/// ```
#[must_use]
pub fn files<I, P>(options: TraversalOptions, starts: I) -> Walker
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    Walker::new(Flavor::Files, options, starts)
}

/// Walks `starts`, yielding directories and expanded archives.
///
/// The file filter is not consulted.
#[must_use]
pub fn dirs<I, P>(options: TraversalOptions, starts: I) -> Walker
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    Walker::new(Flavor::Dirs, options, starts)
}

/// Walks `starts`, yielding every entry accepted by the file filter.
#[must_use]
pub fn everything<I, P>(options: TraversalOptions, starts: I) -> Walker
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    Walker::new(Flavor::Everything, options, starts)
}

/// Like [`files`], after applying untyped `settings` to `options`.
///
/// # Errors
///
/// Returns the [`WalkError::InvalidOption`] the error handler aborted on.
pub fn files_with_settings<I, P>(
    options: TraversalOptions,
    settings: &Map<String, Value>,
    starts: I,
) -> Result<Walker>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    with_settings(Flavor::Files, options, settings, starts)
}

/// Like [`dirs`], after applying untyped `settings` to `options`.
///
/// # Errors
///
/// Returns the [`WalkError::InvalidOption`] the error handler aborted on.
pub fn dirs_with_settings<I, P>(
    options: TraversalOptions,
    settings: &Map<String, Value>,
    starts: I,
) -> Result<Walker>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    with_settings(Flavor::Dirs, options, settings, starts)
}

/// Like [`everything`], after applying untyped `settings` to `options`.
///
/// # Errors
///
/// Returns the [`WalkError::InvalidOption`] the error handler aborted on.
pub fn everything_with_settings<I, P>(
    options: TraversalOptions,
    settings: &Map<String, Value>,
    starts: I,
) -> Result<Walker>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    with_settings(Flavor::Everything, options, settings, starts)
}

fn with_settings<I, P>(
    flavor: Flavor,
    mut options: TraversalOptions,
    settings: &Map<String, Value>,
    starts: I,
) -> Result<Walker>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    options.apply_settings(flavor, settings)?;
    Ok(Walker::new(flavor, options, starts))
}
