//! Listing one directory into queue entries.

use std::fs;
use std::path::Path;

use tracing::trace;

use crate::Result;
use crate::WalkError;
use crate::classify::is_symlink;
use crate::config::SortOrder;
use crate::config::TraversalOptions;
use crate::entry::Candidate;
use crate::entry::QueueEntry;
use crate::origin::OriginArena;
use crate::origin::OriginId;
use crate::path::join;

/// Lists the immediate children of `dir` as queue entries.
///
/// Children inherit `origin`. Symlinks are dropped when
/// `options.follow_symlinks` is off, and directories rejected by the descend
/// filter are dropped. Inside an extraction, a symlink resolving outside the
/// extraction directory is reported as [`WalkError::SymlinkEscape`] and
/// dropped. The survivors are sorted according to
/// `options.sort_files`.
///
/// A directory that cannot be opened, or an entry that cannot be read, is
/// reported through the error handler (by logical path) and contributes
/// nothing.
///
/// # Errors
///
/// Returns the error the error handler chose to abort on.
pub(crate) fn expand(
    dir: &Path,
    origin: Option<OriginId>,
    options: &TraversalOptions,
    origins: &OriginArena,
) -> Result<Vec<QueueEntry>> {
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(source) => {
            options.handle_error(WalkError::ReadDir {
                path: origins.logical_path(Some(dir), None, origin),
                source,
            })?;
            return Ok(Vec::new());
        }
    };

    let mut children = Vec::new();
    for dirent in listing {
        let dirent = match dirent {
            Ok(dirent) => dirent,
            Err(source) => {
                options.handle_error(WalkError::ReadEntry {
                    path: origins.logical_path(Some(dir), None, origin),
                    source,
                })?;
                continue;
            }
        };

        let name = dirent.file_name();
        let path = join(Some(dir), Some(&name));

        let symlink = dirent
            .file_type()
            .map_or_else(|_| is_symlink(&path), |file_type| file_type.is_symlink());
        if symlink && !options.follow_symlinks {
            continue;
        }
        if symlink
            && let Some(id) = origin
            && !origins.contains(id, &path)
        {
            options.handle_error(WalkError::SymlinkEscape {
                path: origins.logical_path(Some(dir), Some(&name), origin),
            })?;
            continue;
        }

        if options.descend_filter.is_some() && path.is_dir() {
            let candidate = Candidate {
                dir: Some(dir),
                name: Some(&name),
                path: &path,
            };
            if !options.descends_into(&candidate) {
                trace!(path = %path.display(), "descend filter rejected directory");
                continue;
            }
        }

        children.push(QueueEntry::child(dir, name, path, origin));
    }

    sort_children(&mut children, &options.sort_files);
    trace!(dir = %dir.display(), children = children.len(), "expanded directory");
    Ok(children)
}

fn sort_children(children: &mut [QueueEntry], order: &SortOrder) {
    match order {
        SortOrder::None => {}
        SortOrder::Standard => children.sort_by(|a, b| a.path.cmp(&b.path)),
        SortOrder::Reverse => children.sort_by(|a, b| b.path.cmp(&a.path)),
        SortOrder::Custom(compare) => {
            children.sort_by(|a, b| compare(&a.candidate(), &b.candidate()));
        }
    }
}
