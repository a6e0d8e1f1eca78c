//! Tar stream extraction.
//!
//! Extraction takes two passes over the archive: the first finds the
//! top-level directory, the second rewrites every name from that directory to
//! the chosen destination root and materializes the entries.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use log::{debug, warn};
use tar::{Archive, EntryType};

use super::{ExtractSummary, HeaderKind};
use crate::config::{ARCHIVE_PROGRESS_INTERVAL, CAPABILITY_XATTR, PAX_XATTR_PREFIX};
use crate::error::{Error, Result};
use crate::naming::unused_path;
use crate::platform::{Native, Platform};
use crate::progress::{Progress, ProgressSink, Throttle};

/// Finds the top-level directory of a tar stream.
///
/// The shortest directory name wins, the first one on ties. Archives without
/// directories fall back to the first entry's name.
///
/// # Returns
///
/// The name without its trailing `/`.
///
/// # Errors
///
/// Returns [`Error::CorruptArchive`] if the stream holds no entries, or an
/// I/O error if the headers cannot be read.
pub fn find_top_dir<R: Read>(reader: R) -> Result<String> {
    let mut archive = Archive::new(reader);
    let mut first: Option<String> = None;
    let mut shortest: Option<String> = None;

    for entry in archive.entries()? {
        let entry = entry?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let is_dir = entry.header().entry_type() == EntryType::Directory;

        if is_dir && shortest.as_ref().is_none_or(|s| name.len() < s.len()) {
            shortest = Some(name.clone());
        }
        if first.is_none() {
            first = Some(name);
        }
    }

    let top = shortest.or(first).ok_or_else(|| Error::CorruptArchive {
        reason: "archive contains no entries".to_owned(),
    })?;
    Ok(match top.strip_suffix('/') {
        Some(stripped) => stripped.to_owned(),
        None => top,
    })
}

/// Extracts a tar stream below `dest_root`.
///
/// Names starting with `top` are moved under `dest_root`; everything else is
/// placed next to it. Non-directory destinations that already exist are
/// renamed rather than overwritten.
///
/// # Parameters
///
/// * `reader` - The tar stream, read from the start
/// * `top` - Top-level directory as returned by [`find_top_dir`]
/// * `dest_root` - Where `top` itself ends up
/// * `expected` - Size of the archive, used as progress total
/// * `progress` - Receives byte progress lines
///
/// # Errors
///
/// Aborts on the first filesystem error. Entries extracted before the failure
/// stay on disk.
pub fn extract<R: Read>(
    reader: R,
    top: &str,
    dest_root: &Path,
    expected: u64,
    progress: &mut dyn ProgressSink,
) -> Result<ExtractSummary> {
    let mut extractor = Extractor::new(top, dest_root);
    let mut state = Progress::new(expected, Throttle::Interval(ARCHIVE_PROGRESS_INTERVAL));
    let mut archive = Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let size = entry.header().size()?;
        extractor.extract_entry(&mut entry)?;

        if size > 0 && state.advance(size) {
            progress.update(&state.bytes_line());
        }
    }
    extractor.apply_directory_modes()?;

    state.complete();
    progress.update(&state.bytes_line());
    progress.finish();

    Ok(extractor.summary)
}

/// Where an archive is going to be extracted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackPlan {
    /// Top-level directory inside the archive
    pub top: String,
    /// Free destination the top-level directory is extracted to
    pub root: PathBuf,
}

/// Extracts the archive at `archive` into a fresh directory below `out_dir`.
///
/// The directory is named after the archive's top-level directory, with a
/// counter appended if that name is taken.
///
/// # Errors
///
/// Every failure is reported as [`Error::Extract`] naming `archive`.
pub fn unpack(
    archive: &Path,
    out_dir: &Path,
    progress: &mut dyn ProgressSink,
) -> Result<ExtractSummary> {
    let plan = plan_unpack(archive, out_dir)?;
    unpack_planned(archive, &plan, progress)
}

/// First half of [`unpack`]: finds the top-level directory and picks a free root.
///
/// # Errors
///
/// Every failure is reported as [`Error::Extract`] naming `archive`.
pub fn plan_unpack(archive: &Path, out_dir: &Path) -> Result<UnpackPlan> {
    plan_unpack_as(archive, out_dir, &archive_stem(archive))
}

/// Like [`plan_unpack`], naming the root `fallback` when the archive's top
/// level is `.` itself.
///
/// Used when `archive` is an intermediate file whose own name means nothing.
///
/// # Errors
///
/// Every failure is reported as [`Error::Extract`] naming `archive`.
pub fn plan_unpack_as(archive: &Path, out_dir: &Path, fallback: &str) -> Result<UnpackPlan> {
    let wrap = |source: Error| extract_error(archive, source);

    let file = File::open(archive).map_err(|source| wrap(Error::fs(archive, source)))?;
    let top = find_top_dir(BufReader::new(file)).map_err(wrap)?;
    let root = unused_path(&out_dir.join(root_name(&top, fallback)));
    Ok(UnpackPlan { top, root })
}

/// Second half of [`unpack`]: extracts `archive` as laid out by `plan`.
///
/// # Errors
///
/// Every failure is reported as [`Error::Extract`] naming `archive`.
pub fn unpack_planned(
    archive: &Path,
    plan: &UnpackPlan,
    progress: &mut dyn ProgressSink,
) -> Result<ExtractSummary> {
    let wrap = |source: Error| extract_error(archive, source);

    let file = File::open(archive)
        .map_err(|source| wrap(Error::fs(archive, source)))?;
    let expected = file
        .metadata()
        .map_err(|source| wrap(Error::fs(archive, source)))?
        .len();

    debug!("extracting {} to {}", archive.display(), plan.root.display());
    extract(BufReader::new(file), &plan.top, &plan.root, expected, progress).map_err(wrap)
}

fn extract_error(archive: &Path, source: Error) -> Error {
    Error::Extract {
        archive: archive.to_path_buf(),
        source: Box::new(source),
    }
}

fn root_name(top: &str, fallback: &str) -> String {
    match Path::new(top).file_name() {
        Some(name) if name != "." => name.to_string_lossy().into_owned(),
        _ => fallback.to_owned(),
    }
}

fn archive_stem(archive: &Path) -> String {
    let name = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(".tar").unwrap_or(&name).to_owned()
}

struct Extractor<'a> {
    top: &'a str,
    dest_root: &'a Path,
    beside: PathBuf,
    written: HashMap<String, PathBuf>,
    created: HashSet<PathBuf>,
    directories: Vec<(PathBuf, u32)>,
    summary: ExtractSummary,
}

impl<'a> Extractor<'a> {
    fn new(top: &'a str, dest_root: &'a Path) -> Self {
        Self {
            top: top.trim_end_matches('/'),
            dest_root,
            beside: dest_root.parent().map(Path::to_path_buf).unwrap_or_default(),
            written: HashMap::new(),
            created: HashSet::new(),
            directories: Vec::new(),
            summary: ExtractSummary {
                root: dest_root.to_path_buf(),
                ..ExtractSummary::default()
            },
        }
    }

    /// Maps an archive name onto the destination tree.
    fn rewrite(&self, name: &str) -> Option<PathBuf> {
        if name.starts_with('/') || name.split('/').any(|part| part == "..") {
            return None;
        }
        let name = name.trim_end_matches('/');
        if name == self.top {
            return Some(self.dest_root.to_path_buf());
        }
        match name
            .strip_prefix(self.top)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(rest) => Some(self.dest_root.join(rest)),
            None => Some(self.beside.join(name)),
        }
    }

    fn skip(&mut self, name: &str, why: &str) {
        warn!("{name}: {why}, skipping");
        self.summary.skipped += 1;
    }

    fn extract_entry<R: Read>(&mut self, entry: &mut tar::Entry<'_, R>) -> Result<()> {
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let kind = HeaderKind::from(entry.header().entry_type());

        let Some(desired) = self.rewrite(&name) else {
            self.skip(&name, "unsafe path in archive");
            return Ok(());
        };
        if self.through_symlink(&desired) {
            self.skip(&name, "path leads through a symlink");
            return Ok(());
        }

        let header = entry.header();
        let mode = header.mode()?;
        let mtime = header.mtime()?;
        let capability = capability(entry)?;

        let dest = match kind {
            HeaderKind::Directory => {
                if is_symlink(&desired) {
                    self.skip(&name, "directory is a symlink");
                    return Ok(());
                }
                self.create_dirs(&desired)?;
                // Directories that were there before keep their mode
                if self.created.contains(&desired) {
                    self.directories.push((desired.clone(), mode));
                }
                desired
            }
            HeaderKind::Regular => {
                let dest = self.prepare(&desired)?;
                let written = write_file(entry, &dest, mode, mtime)?;
                self.summary.bytes += written;
                dest
            }
            HeaderKind::Hardlink => {
                let target = match self.link_target(entry) {
                    Some(target) if !self.through_symlink(&target) => target,
                    _ => {
                        self.skip(&name, "hardlink target outside the archive");
                        return Ok(());
                    }
                };
                let dest = self.prepare(&desired)?;
                fs::hard_link(&target, &dest).map_err(|source| Error::fs(&dest, source))?;
                dest
            }
            HeaderKind::Symlink => {
                let Some(target) = entry.link_name_bytes().map(|raw| bytes_to_path(&raw)) else {
                    self.skip(&name, "symlink without target");
                    return Ok(());
                };
                let dest = self.prepare(&desired)?;
                Native::symlink(&target, &dest).map_err(|source| Error::fs(&dest, source))?;
                dest
            }
            HeaderKind::Device | HeaderKind::Other => {
                debug!("{name}: skipping {kind:?} entry");
                self.summary.skipped += 1;
                return Ok(());
            }
        };

        if let Some(value) = capability {
            if let Err(err) = Native::write_xattr(&dest, CAPABILITY_XATTR, &value) {
                warn!("{}: cannot restore {CAPABILITY_XATTR}: {err}", dest.display());
            }
        }

        debug!("extracted {name} to {}", dest.display());
        self.written
            .insert(name.trim_end_matches('/').to_owned(), dest);
        self.summary.entries += 1;
        Ok(())
    }

    /// Picks a free destination and creates its parent directories.
    fn prepare(&mut self, desired: &Path) -> Result<PathBuf> {
        if let Some(parent) = desired.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.create_dirs(parent)?;
        }
        Ok(unused_path(desired))
    }

    /// Creates `dir` and its missing parents, remembering which ones are new.
    fn create_dirs(&mut self, dir: &Path) -> Result<()> {
        let missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|a| !a.as_os_str().is_empty() && fs::symlink_metadata(a).is_err())
            .map(Path::to_path_buf)
            .collect();
        fs::create_dir_all(dir).map_err(|source| Error::fs(dir, source))?;
        self.created.extend(missing);
        Ok(())
    }

    /// Returns `true` if a parent of `path` below the extraction base is a
    /// symlink, so writing to `path` could end up anywhere.
    fn through_symlink(&self, path: &Path) -> bool {
        path.ancestors()
            .skip(1)
            .take_while(|a| *a != self.beside && !a.as_os_str().is_empty())
            .any(is_symlink)
    }

    fn link_target<R: Read>(&self, entry: &tar::Entry<'_, R>) -> Option<PathBuf> {
        let raw = entry.link_name_bytes()?;
        let target = String::from_utf8_lossy(&raw);
        let target = target.trim_end_matches('/');
        match self.written.get(target) {
            Some(path) => Some(path.clone()),
            None => self.rewrite(target),
        }
    }

    /// Applies directory permissions deepest first, once nothing needs to be
    /// created inside them anymore.
    fn apply_directory_modes(&mut self) -> Result<()> {
        for (path, mode) in self.directories.drain(..).rev() {
            Native::set_mode(&path, mode).map_err(|source| Error::fs(&path, source))?;
        }
        Ok(())
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
}

fn write_file<R: Read>(
    entry: &mut tar::Entry<'_, R>,
    dest: &Path,
    mode: u32,
    mtime: u64,
) -> Result<u64> {
    let fs_err = |source: io::Error| Error::fs(dest, source);

    let mut file = Native::create_new(dest, mode).map_err(fs_err)?;
    let written = io::copy(entry, &mut file).map_err(fs_err)?;
    file.set_modified(UNIX_EPOCH + Duration::from_secs(mtime))
        .map_err(fs_err)?;
    drop(file);

    Native::set_mode(dest, mode).map_err(fs_err)?;
    Ok(written)
}

fn capability<R: Read>(entry: &mut tar::Entry<'_, R>) -> Result<Option<Vec<u8>>> {
    let key = format!("{PAX_XATTR_PREFIX}{CAPABILITY_XATTR}");
    let Some(extensions) = entry.pax_extensions()? else {
        return Ok(None);
    };
    for extension in extensions {
        let extension = extension?;
        if extension.key() == Ok(key.as_str()) {
            return Ok(Some(extension.value_bytes().to_vec()));
        }
    }
    Ok(None)
}

#[cfg(unix)]
fn bytes_to_path(raw: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(raw))
}

#[cfg(not(unix))]
fn bytes_to_path(raw: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(raw).into_owned())
}
