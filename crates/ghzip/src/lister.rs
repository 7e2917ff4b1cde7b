use crate::descriptor::{DirListing, EntryKind, FileDescriptor, RemoteEntry};
use crate::source::{ContentSource, SourceError};

/// Walk the remote tree under `path` and collect every regular file.
///
/// Costs one request per directory. Files come out in depth-first
/// pre-order: a subdirectory's files precede the entries that follow it
/// in its parent. Entries that are neither files nor directories are
/// skipped. Any failure aborts the walk and nothing is returned.
pub async fn list_files(
    source: &dyn ContentSource,
    owner: &str,
    repo: &str,
    path: &str,
) -> Result<Vec<FileDescriptor>, SourceError> {
    let mut files = Vec::new();

    // Stack of directory listings still being consumed. Each frame holds
    // the remaining entries of one directory, reversed so `pop` yields
    // them in API order.
    let mut stack: Vec<Vec<RemoteEntry>> = Vec::new();

    match source.list_dir(owner, repo, path).await? {
        DirListing::File(entry) => {
            files.extend(entry.to_descriptor());
            return Ok(files);
        }
        DirListing::Directory(mut entries) => {
            entries.reverse();
            stack.push(entries);
        }
    }

    while let Some(frame) = stack.last_mut() {
        let Some(entry) = frame.pop() else {
            stack.pop();
            continue;
        };

        match &entry.kind {
            EntryKind::File => files.extend(entry.to_descriptor()),
            EntryKind::Dir => {
                tracing::trace!(path = %entry.path, "descending into directory");
                match source.list_dir(owner, repo, &entry.path).await? {
                    DirListing::Directory(mut entries) => {
                        entries.reverse();
                        stack.push(entries);
                    }
                    DirListing::File(file) => files.extend(file.to_descriptor()),
                }
            }
            EntryKind::Other(kind) => {
                tracing::debug!(path = %entry.path, %kind, "skipping unsupported entry");
            }
        }
    }

    Ok(files)
}
