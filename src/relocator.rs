/// Moving files into date-bucketed folders.
///
/// This module computes a file's destination from its resolved date, creates
/// the bucket directory as needed, moves the file without ever overwriting an
/// existing one, and optionally rewrites the file's timestamps to match the
/// resolved date.
use crate::config::RunSettings;
use crate::resolution::DateResolution;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info};

/// What to do when the destination file name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Leave the file where it is and report the collision.
    #[default]
    Reject,
    /// Append ` (1)`, ` (2)`, ... to the file stem until the name is free.
    Suffix,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(CollisionPolicy::Reject),
            "suffix" => Ok(CollisionPolicy::Suffix),
            other => Err(format!(
                "unknown collision policy '{}' (expected reject or suffix)",
                other
            )),
        }
    }
}

/// Errors and warnings raised while relocating a single file.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// Failed to create the date bucket directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A different file already occupies the destination.
    #[error("Destination {} already exists; {} left in place", .destination.display(), .path.display())]
    DestinationCollision { path: PathBuf, destination: PathBuf },
    /// Failed to move the file.
    #[error("Failed to move {} to {}: {error}", .path.display(), .destination.display())]
    MoveFailed {
        path: PathBuf,
        destination: PathBuf,
        error: io::Error,
    },
    /// The path has no file name component.
    #[error("{} has no file name", .path.display())]
    InvalidFileName { path: PathBuf },
    /// The platform cannot set creation times. Other timestamps were written.
    #[error("Creation time of {} not rewritten: {reason}", .path.display())]
    TimestampRewriteUnsupported { path: PathBuf, reason: String },
    /// Rewriting timestamps failed outright.
    #[error("Failed to rewrite timestamps of {}: {source}", .path.display())]
    TimestampRewriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for relocation operations.
pub type RelocateResult<T> = Result<T, RelocateError>;

/// Record of a single relocation.
#[derive(Debug)]
pub struct Relocation {
    /// Where the file was before.
    pub original_path: PathBuf,
    /// Where the file is now (or would be, in a dry run).
    pub new_path: PathBuf,
    /// False when nothing was moved: dry runs and files already in place.
    pub moved: bool,
    /// Non-fatal problems, e.g. timestamps that could not be rewritten.
    pub warnings: Vec<RelocateError>,
}

/// Moves files into `<output_root>/<bucket>/` folders.
#[derive(Debug, Clone)]
pub struct Relocator {
    output_root: PathBuf,
    folder_format: String,
    collision: CollisionPolicy,
    alter_creation_time: bool,
    dry_run: bool,
    /// Destinations already handed out by this dry run.
    planned: RefCell<HashSet<PathBuf>>,
}

impl Relocator {
    pub fn new(settings: &RunSettings) -> Self {
        Self {
            output_root: settings.output_root.clone(),
            folder_format: settings.folder_format.clone(),
            collision: settings.collision,
            alter_creation_time: settings.alter_creation_time,
            dry_run: settings.dry_run,
            planned: RefCell::new(HashSet::new()),
        }
    }

    /// The bucket directory for a resolved date, e.g. `<output_root>/2021.03`.
    pub fn destination_dir(&self, resolution: &DateResolution) -> PathBuf {
        self.output_root
            .join(resolution.timestamp.format(&self.folder_format).to_string())
    }

    /// Moves `file_path` into its date bucket.
    ///
    /// The bucket directory is created if needed. Calling this for a file that
    /// already sits at its destination is a no-op. An existing file at the
    /// destination is never overwritten: under [`CollisionPolicy::Reject`] the
    /// call fails with [`RelocateError::DestinationCollision`] and the file
    /// stays put; under [`CollisionPolicy::Suffix`] the first free
    /// `name (n).ext` is used.
    ///
    /// Timestamp problems do not fail the call; they are returned in
    /// [`Relocation::warnings`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use datetidy::config::RunSettings;
    /// use datetidy::relocator::Relocator;
    /// use datetidy::resolution::{DateResolution, DateSource};
    /// use chrono::DateTime;
    /// use std::path::Path;
    ///
    /// let settings = RunSettings::new("/photos/sorted");
    /// let when = DateTime::parse_from_rfc3339("2021-03-05T14:10:55+00:00").unwrap();
    /// let resolution = DateResolution::new(DateSource::Filename, when);
    ///
    /// match Relocator::new(&settings).relocate(Path::new("/photos/IMG_1.jpg"), &resolution) {
    ///     Ok(r) => println!("Moved to {}", r.new_path.display()),
    ///     Err(e) => eprintln!("Relocation failed: {}", e),
    /// }
    /// ```
    pub fn relocate(
        &self,
        file_path: &Path,
        resolution: &DateResolution,
    ) -> RelocateResult<Relocation> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| RelocateError::InvalidFileName {
                path: file_path.to_path_buf(),
            })?;

        let destination_dir = self.destination_dir(resolution);
        let destination = destination_dir.join(file_name);

        if is_same_file(file_path, &destination) {
            debug!(path = %file_path.display(), "already in place");
            return Ok(Relocation {
                original_path: file_path.to_path_buf(),
                new_path: destination,
                moved: false,
                warnings: Vec::new(),
            });
        }

        if self.dry_run {
            let new_path = self.plan_destination(file_path, &destination)?;
            return Ok(Relocation {
                original_path: file_path.to_path_buf(),
                new_path,
                moved: false,
                warnings: Vec::new(),
            });
        }

        fs::create_dir_all(&destination_dir).map_err(|e| {
            RelocateError::DirectoryCreationFailed {
                path: destination_dir.clone(),
                source: e,
            }
        })?;

        let new_path = self.move_into_place(file_path, &destination)?;
        info!(from = %file_path.display(), to = %new_path.display(), "relocated");

        let mut warnings = Vec::new();
        if self.alter_creation_time
            && let Err(warning) = rewrite_timestamps(&new_path, &resolution.timestamp)
        {
            warnings.push(warning);
        }

        Ok(Relocation {
            original_path: file_path.to_path_buf(),
            new_path,
            moved: true,
            warnings,
        })
    }

    /// Destination a dry run would report, without touching the filesystem.
    ///
    /// Paths planned for earlier files count as occupied, so the plan matches
    /// what a real run would do.
    fn plan_destination(&self, source: &Path, destination: &Path) -> RelocateResult<PathBuf> {
        let mut planned = self.planned.borrow_mut();
        let is_free = |path: &Path| !path.exists() && !planned.contains(path);

        let chosen = match self.collision {
            _ if is_free(destination) => destination.to_path_buf(),
            CollisionPolicy::Reject => return Err(collision(source, destination)),
            CollisionPolicy::Suffix => suffixed_candidates(destination)
                .find(|candidate| is_free(candidate))
                .ok_or_else(|| collision(source, destination))?,
        };
        planned.insert(chosen.clone());
        Ok(chosen)
    }

    fn move_into_place(&self, source: &Path, destination: &Path) -> RelocateResult<PathBuf> {
        let move_to = |target: &Path| {
            move_no_clobber(source, target).map_err(|e| RelocateError::MoveFailed {
                path: source.to_path_buf(),
                destination: target.to_path_buf(),
                error: e,
            })
        };

        match move_to(destination) {
            Ok(()) => return Ok(destination.to_path_buf()),
            Err(RelocateError::MoveFailed { error, .. })
                if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }

        if self.collision == CollisionPolicy::Reject {
            return Err(collision(source, destination));
        }

        for candidate in suffixed_candidates(destination) {
            match move_to(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(RelocateError::MoveFailed { error, .. })
                    if error.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }

        Err(collision(source, destination))
    }
}

fn collision(source: &Path, destination: &Path) -> RelocateError {
    RelocateError::DestinationCollision {
        path: source.to_path_buf(),
        destination: destination.to_path_buf(),
    }
}

/// Upper bound on `name (n).ext` attempts.
const MAX_SUFFIX: usize = 9999;

/// `dir/name (1).ext`, `dir/name (2).ext`, ...
fn suffixed_candidates(destination: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = destination
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..=MAX_SUFFIX)
        .map(move |n| destination.with_file_name(format!("{} ({}){}", stem, n, extension)))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Moves `source` to `destination`, failing with `AlreadyExists` rather than
/// replacing an existing file.
///
/// A hard link claims the destination name atomically. Filesystems without
/// hard links fall back to a checked rename, and moves across devices to a
/// `create_new` copy.
fn move_no_clobber(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::hard_link(source, destination) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(source) {
                let _ = fs::remove_file(destination);
                return Err(e);
            }
            return Ok(());
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(e),
        Err(e) => debug!(error = %e, "hard link unavailable, falling back to rename"),
    }

    rename_no_clobber(source, destination)
}

/// Renames after checking the destination is free; copies across devices.
fn rename_no_clobber(source: &Path, destination: &Path) -> io::Result<()> {
    if destination.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination already exists",
        ));
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(source, destination, |path| fs::remove_file(path))
        }
        Err(e) => Err(e),
    }
}

/// Copies `source` to a new `destination`, then deletes `source` with
/// `remove_source`. If the delete fails the copy is removed again, so the
/// file never ends up at both paths.
fn copy_then_remove(
    source: &Path,
    destination: &Path,
    remove_source: impl FnOnce(&Path) -> io::Result<()>,
) -> io::Result<()> {
    copy_no_clobber(source, destination)?;
    if let Err(e) = remove_source(source) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}

fn copy_no_clobber(source: &Path, destination: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)?;

    let copied = io::copy(&mut reader, &mut writer)
        .and_then(|_| writer.sync_all())
        .and_then(|_| fs::set_permissions(destination, fs::metadata(source)?.permissions()));
    if copied.is_err() {
        let _ = fs::remove_file(destination);
    }
    copied
}

/// Sets access, modification and (where supported) creation time to `when`.
fn rewrite_timestamps(path: &Path, when: &DateTime<FixedOffset>) -> RelocateResult<()> {
    let time: SystemTime = (*when).into();
    let failed = |e: io::Error| RelocateError::TimestampRewriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .or_else(|_| File::open(path))
        .map_err(failed)?;

    let times = FileTimes::new().set_accessed(time).set_modified(time);

    #[cfg(windows)]
    let times = {
        use std::os::windows::fs::FileTimesExt;
        times.set_created(time)
    };
    #[cfg(target_os = "macos")]
    let times = {
        use std::os::macos::fs::FileTimesExt;
        times.set_created(time)
    };

    file.set_times(times).map_err(failed)?;

    if cfg!(any(windows, target_os = "macos")) {
        Ok(())
    } else {
        Err(RelocateError::TimestampRewriteUnsupported {
            path: path.to_path_buf(),
            reason: "this platform cannot set creation time; modification time was updated"
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::DateSource;
    use std::fs;
    use tempfile::TempDir;

    fn resolution(rfc3339: &str) -> DateResolution {
        DateResolution::new(
            DateSource::Filename,
            DateTime::parse_from_rfc3339(rfc3339).expect("valid test date"),
        )
    }

    fn relocator(root: &Path, configure: impl FnOnce(&mut RunSettings)) -> Relocator {
        let mut settings = RunSettings::new(root);
        settings.alter_creation_time = false;
        configure(&mut settings);
        Relocator::new(&settings)
    }

    #[test]
    fn test_destination_dir_is_year_dot_month() {
        let relocator = relocator(Path::new("/out"), |_| {});
        assert_eq!(
            relocator.destination_dir(&resolution("2021-03-05T14:10:55+00:00")),
            PathBuf::from("/out/2021.03")
        );
    }

    #[test]
    fn test_relocate_creates_bucket() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("a.jpg");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let relocation = relocator(&base_path.join("out"), |_| {})
            .relocate(&file_path, &resolution("2019-12-31T23:59:00+00:00"))
            .expect("Failed to relocate");

        let expected = base_path.join("out").join("2019.12").join("a.jpg");
        assert!(relocation.moved);
        assert_eq!(relocation.new_path, expected);
        assert!(expected.exists());
        assert!(!file_path.exists());
    }

    #[test]
    fn test_relocate_uses_existing_bucket() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::create_dir_all(base_path.join("2020.01")).expect("Failed to create bucket");
        let file_path = base_path.join("b.jpg");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        relocator(base_path, |_| {})
            .relocate(&file_path, &resolution("2020-01-15T08:00:00+00:00"))
            .expect("Failed to relocate");

        assert!(base_path.join("2020.01").join("b.jpg").exists());
    }

    #[test]
    fn test_relocate_in_place_is_noop() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let bucket = temp_dir.path().join("2020.01");
        fs::create_dir_all(&bucket).expect("Failed to create bucket");
        let file_path = bucket.join("c.jpg");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let relocation = relocator(temp_dir.path(), |_| {})
            .relocate(&file_path, &resolution("2020-01-15T08:00:00+00:00"))
            .expect("In-place relocation should succeed");

        assert!(!relocation.moved);
        assert!(file_path.exists());
        assert_eq!(fs::read_dir(&bucket).unwrap().count(), 1);
    }

    #[test]
    fn test_collision_rejected_without_data_loss() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let bucket = base_path.join("out").join("2020.01");
        fs::create_dir_all(&bucket).expect("Failed to create bucket");
        fs::write(bucket.join("d.jpg"), "existing").expect("Failed to write existing file");
        let file_path = base_path.join("d.jpg");
        fs::write(&file_path, "incoming").expect("Failed to write test file");

        let result = relocator(&base_path.join("out"), |_| {})
            .relocate(&file_path, &resolution("2020-01-15T08:00:00+00:00"));

        assert!(matches!(
            result,
            Err(RelocateError::DestinationCollision { .. })
        ));
        assert_eq!(fs::read_to_string(bucket.join("d.jpg")).unwrap(), "existing");
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "incoming");
    }

    #[test]
    fn test_collision_suffix_picks_first_free_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let bucket = base_path.join("out").join("2020.01");
        fs::create_dir_all(&bucket).expect("Failed to create bucket");
        fs::write(bucket.join("e.jpg"), "one").expect("Failed to write file");
        fs::write(bucket.join("e (1).jpg"), "two").expect("Failed to write file");
        let file_path = base_path.join("e.jpg");
        fs::write(&file_path, "three").expect("Failed to write test file");

        let relocation = relocator(&base_path.join("out"), |s| {
            s.collision = CollisionPolicy::Suffix
        })
        .relocate(&file_path, &resolution("2020-01-15T08:00:00+00:00"))
        .expect("Suffix policy should relocate");

        assert_eq!(relocation.new_path, bucket.join("e (2).jpg"));
        assert_eq!(fs::read_to_string(bucket.join("e.jpg")).unwrap(), "one");
        assert_eq!(fs::read_to_string(bucket.join("e (2).jpg")).unwrap(), "three");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("f.jpg");
        fs::write(&file_path, "content").expect("Failed to write test file");

        let relocation = relocator(&base_path.join("out"), |s| s.dry_run = true)
            .relocate(&file_path, &resolution("2020-01-15T08:00:00+00:00"))
            .expect("Dry run should plan");

        assert!(!relocation.moved);
        assert_eq!(
            relocation.new_path,
            base_path.join("out").join("2020.01").join("f.jpg")
        );
        assert!(file_path.exists());
        assert!(!base_path.join("out").exists());
    }

    /// Two same-named files from different folders bound for one bucket.
    fn same_named_pair(base_path: &Path) -> (PathBuf, PathBuf) {
        let first = base_path.join("a").join("IMG_1.jpg");
        let second = base_path.join("b").join("IMG_1.jpg");
        for path in [&first, &second] {
            fs::create_dir_all(path.parent().unwrap()).expect("Failed to create folder");
            fs::write(path, "content").expect("Failed to write test file");
        }
        (first, second)
    }

    #[test]
    fn test_dry_run_rejects_name_planned_earlier() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let (first, second) = same_named_pair(base_path);
        let when = resolution("2021-03-05T14:10:55+00:00");

        let dry = relocator(&base_path.join("out"), |s| s.dry_run = true);
        assert!(dry.relocate(&first, &when).is_ok());
        assert!(matches!(
            dry.relocate(&second, &when),
            Err(RelocateError::DestinationCollision { .. })
        ));
        assert!(!base_path.join("out").exists());

        let real = relocator(&base_path.join("out"), |_| {});
        assert!(real.relocate(&first, &when).is_ok());
        assert!(matches!(
            real.relocate(&second, &when),
            Err(RelocateError::DestinationCollision { .. })
        ));
    }

    #[test]
    fn test_dry_run_suffix_plan_matches_real_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let (first, second) = same_named_pair(base_path);
        let when = resolution("2021-03-05T14:10:55+00:00");
        let suffix = |s: &mut RunSettings| s.collision = CollisionPolicy::Suffix;

        let dry = relocator(&base_path.join("out"), |s| {
            suffix(s);
            s.dry_run = true;
        });
        let planned: Vec<_> = [&first, &second]
            .iter()
            .map(|path| dry.relocate(path, &when).expect("Dry run should plan").new_path)
            .collect();

        let real = relocator(&base_path.join("out"), suffix);
        let moved: Vec<_> = [&first, &second]
            .iter()
            .map(|path| real.relocate(path, &when).expect("Failed to relocate").new_path)
            .collect();

        let bucket = base_path.join("out").join("2021.03");
        assert_eq!(
            planned,
            vec![bucket.join("IMG_1.jpg"), bucket.join("IMG_1 (1).jpg")]
        );
        assert_eq!(planned, moved);
    }

    #[test]
    fn test_rename_fallback_refuses_occupied_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("h.jpg");
        let destination = temp_dir.path().join("taken.jpg");
        fs::write(&source, "incoming").expect("Failed to write test file");
        fs::write(&destination, "existing").expect("Failed to write test file");

        let err = rename_no_clobber(&source, &destination).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "existing");
        assert_eq!(fs::read_to_string(&source).unwrap(), "incoming");
    }

    #[test]
    fn test_rename_fallback_moves_to_free_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("i.jpg");
        let destination = temp_dir.path().join("free.jpg");
        fs::write(&source, "incoming").expect("Failed to write test file");

        rename_no_clobber(&source, &destination).expect("Rename should succeed");

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "incoming");
    }

    #[test]
    fn test_copy_refuses_existing_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("j.jpg");
        let destination = temp_dir.path().join("taken.jpg");
        fs::write(&source, "incoming").expect("Failed to write test file");
        fs::write(&destination, "existing").expect("Failed to write test file");

        let err = copy_no_clobber(&source, &destination).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "existing");
    }

    #[test]
    fn test_copy_carries_content_and_permissions() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("k.jpg");
        let destination = temp_dir.path().join("copy.jpg");
        fs::write(&source, "payload").expect("Failed to write test file");
        let mut readonly = fs::metadata(&source).unwrap().permissions();
        readonly.set_readonly(true);
        fs::set_permissions(&source, readonly).expect("Failed to set permissions");

        copy_no_clobber(&source, &destination).expect("Copy should succeed");

        assert_eq!(fs::read_to_string(&destination).unwrap(), "payload");
        assert!(fs::metadata(&destination).unwrap().permissions().readonly());

        for path in [&source, &destination] {
            let mut writable = fs::metadata(path).unwrap().permissions();
            writable.set_readonly(false);
            let _ = fs::set_permissions(path, writable);
        }
    }

    #[test]
    fn test_failed_copy_leaves_no_partial_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let unreadable = temp_dir.path().join("folder.jpg");
        fs::create_dir(&unreadable).expect("Failed to create folder");
        let destination = temp_dir.path().join("partial.jpg");

        assert!(copy_no_clobber(&unreadable, &destination).is_err());
        assert!(!destination.exists());
    }

    #[test]
    fn test_copy_is_undone_when_source_cannot_be_removed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("l.jpg");
        let destination = temp_dir.path().join("moved.jpg");
        fs::write(&source, "payload").expect("Failed to write test file");

        let err = copy_then_remove(&source, &destination, |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only source"))
        })
        .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(!destination.exists());
        assert_eq!(fs::read_to_string(&source).unwrap(), "payload");
    }

    #[test]
    fn test_copy_then_remove_moves_the_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("m.jpg");
        let destination = temp_dir.path().join("moved.jpg");
        fs::write(&source, "payload").expect("Failed to write test file");

        copy_then_remove(&source, &destination, |path| fs::remove_file(path))
            .expect("Move by copy should succeed");

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "payload");
    }

    #[test]
    fn test_timestamps_rewritten_when_enabled() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("g.jpg");
        fs::write(&file_path, "content").expect("Failed to write test file");
        let when = resolution("2015-06-01T12:00:00+00:00");

        let relocation = relocator(base_path, |s| s.alter_creation_time = true)
            .relocate(&file_path, &when)
            .expect("Failed to relocate");

        let modified = fs::metadata(&relocation.new_path)
            .and_then(|m| m.modified())
            .expect("Failed to read mtime");
        assert_eq!(modified, SystemTime::from(when.timestamp));

        for warning in &relocation.warnings {
            assert!(matches!(
                warning,
                RelocateError::TimestampRewriteUnsupported { .. }
            ));
        }
    }
}
