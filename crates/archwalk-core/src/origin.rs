//! Archive expansion bookkeeping.
//!
//! Every archive the walker descends into is unpacked into its own temporary
//! directory. The walker keeps one [`OriginArena`] that records, per
//! extraction, which temporary directory stands in for which archive, so that
//! paths found inside can be reported as if the archive were a directory:
//!
//! ```text
//! /tmp/archwalk-Ab12/ccc/bbb.tar.gz  ->  data/ddd.tar.gz/ccc/bbb.tar.gz
//! ```
//!
//! Nested archives form a chain: an extraction's logical parent may itself
//! live inside an earlier extraction. The chain is walked iteratively.
//!
//! Temporary directories are reference counted by the queue entries that
//! point into them and removed as soon as the count drops to zero. Whatever
//! is left when the arena is closed or dropped is removed then.
//!
//! Archives may carry symlinks pointing anywhere on the host. Entries whose
//! resolved location leaves their extraction directory are not archive
//! contents; [`OriginArena::contains`] tells them apart.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;
use tracing::debug;
use tracing::warn;

use crate::Result;
use crate::WalkError;
use crate::formats::ArchiveHandle;
use crate::formats::extract_to;
use crate::path::join;

/// Prefix of every temporary extraction directory.
const TEMP_PREFIX: &str = "archwalk-";

/// Index of an extraction in an [`OriginArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginId(usize);

/// The archive file an extraction stands in for.
#[derive(Debug)]
struct LogicalParent {
    path: PathBuf,
    origin: Option<OriginId>,
}

#[derive(Debug)]
struct OriginContext {
    temp_root: PathBuf,
    canonical_root: PathBuf,
    parent: LogicalParent,
    dir: Option<TempDir>,
    live: usize,
}

/// Owner of all extractions made by one walker.
///
/// One small record (paths only, once its directory is gone) is kept per
/// extracted archive until [`close`](Self::close), so that logical paths of
/// nested archives can still be rebuilt after an outer extraction directory
/// has been removed. Memory therefore grows with the number of archives
/// expanded, not with their contents.
#[derive(Debug, Default)]
pub struct OriginArena {
    contexts: Vec<OriginContext>,
}

impl OriginArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpacks `handle` into a fresh temporary directory.
    ///
    /// `origin` is the extraction the archive file itself was found in, if
    /// any. Returns the temporary root to list and the id every entry listed
    /// from it must carry. The new extraction starts with one live reference
    /// owned by the caller, which must eventually [`release`](Self::release)
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::TempDir`] if no temporary directory can be made
    /// and [`WalkError::Extraction`] if unpacking fails. Either way nothing is
    /// left on disk.
    pub fn extract(
        &mut self,
        handle: &ArchiveHandle,
        origin: Option<OriginId>,
    ) -> Result<(PathBuf, OriginId)> {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(WalkError::TempDir)?;

        debug!(
            archive = %handle.path().display(),
            temp = %dir.path().display(),
            format = ?handle.format(),
            "extracting archive"
        );

        if let Err(e) = extract_to(handle, dir.path()) {
            let path = self.logical_path(Some(handle.path()), None, origin);
            warn!(archive = %path.display(), error = %e, "archive extraction failed");
            return Err(WalkError::Extraction {
                path,
                reason: e.to_string(),
            });
        }

        let temp_root = dir.path().to_path_buf();
        let canonical_root = fs::canonicalize(&temp_root).unwrap_or_else(|_| temp_root.clone());
        let id = OriginId(self.contexts.len());
        self.contexts.push(OriginContext {
            temp_root,
            canonical_root,
            parent: LogicalParent {
                path: handle.path().to_path_buf(),
                origin,
            },
            dir: Some(dir),
            live: 1,
        });
        Ok((self.contexts[id.0].temp_root.clone(), id))
    }

    /// Records one more queue entry pointing into `id`.
    pub fn retain(&mut self, id: OriginId) {
        if let Some(ctx) = self.contexts.get_mut(id.0) {
            ctx.live += 1;
        }
    }

    /// Drops one reference to `id`, removing its temporary directory when
    /// nothing refers to it any more.
    pub fn release(&mut self, id: OriginId) {
        let Some(ctx) = self.contexts.get_mut(id.0) else {
            return;
        };
        ctx.live = ctx.live.saturating_sub(1);
        if ctx.live == 0
            && let Some(dir) = ctx.dir.take()
        {
            remove(dir);
        }
    }

    /// Reconstructs the caller-visible path of `dir`/`name`.
    ///
    /// Without an origin this is plain [`join`]. Otherwise the temporary root
    /// of each extraction in the chain is replaced by the path of the archive
    /// it was unpacked from, innermost first.
    #[must_use]
    pub fn logical_path(
        &self,
        dir: Option<&Path>,
        name: Option<&OsStr>,
        origin: Option<OriginId>,
    ) -> PathBuf {
        let mut path = join(dir, name);
        let mut current = origin;

        while let Some(id) = current {
            let Some(ctx) = self.contexts.get(id.0) else {
                warn!(path = %path.display(), "unknown archive origin");
                break;
            };
            match path.strip_prefix(&ctx.temp_root) {
                Ok(rest) if rest.as_os_str().is_empty() => path = ctx.parent.path.clone(),
                Ok(rest) => path = ctx.parent.path.join(rest),
                Err(_) => warn!(
                    path = %path.display(),
                    temp_root = %ctx.temp_root.display(),
                    "path is not inside its archive's extraction directory"
                ),
            }
            current = ctx.parent.origin;
        }

        path
    }

    /// Returns `true` unless `path` resolves to somewhere outside the
    /// extraction directory of `id`.
    ///
    /// Paths that cannot be resolved, such as dangling symlinks, count as
    /// contained: there is nothing behind them to walk.
    #[must_use]
    pub fn contains(&self, id: OriginId, path: &Path) -> bool {
        let Some(ctx) = self.contexts.get(id.0) else {
            return true;
        };
        fs::canonicalize(path)
            .ok()
            .is_none_or(|resolved| resolved.starts_with(&ctx.canonical_root))
    }

    /// Number of temporary directories still on disk.
    #[must_use]
    pub fn live_dirs(&self) -> usize {
        self.contexts.iter().filter(|ctx| ctx.dir.is_some()).count()
    }

    /// Removes every temporary directory still on disk and forgets every
    /// extraction. Ids handed out before are invalid afterwards.
    pub fn close(&mut self) {
        for ctx in self.contexts.drain(..) {
            if let Some(dir) = ctx.dir {
                remove(dir);
            }
        }
    }
}

fn remove(dir: TempDir) {
    let path = dir.path().to_path_buf();
    match dir.close() {
        Ok(()) => debug!(temp = %path.display(), "removed extraction directory"),
        Err(e) => warn!(temp = %path.display(), error = %e, "cannot remove extraction directory"),
    }
}
