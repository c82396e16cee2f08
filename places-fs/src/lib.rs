//! Shared filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Write};
use std::path::Component;

/// Suffix appended to staging files written by [`replace_file`].
pub const STAGING_SUFFIX: &str = ".tmp";

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Open an existing directory using ambient authority.
pub fn open_dir(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    fs_utf8::Dir::open_ambient_dir(path, ambient_authority())
}

/// Create `path` and any missing ancestors, then open it.
///
/// Absolute paths are resolved against their root so `cap-std` never has to
/// traverse upwards from the working directory.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    if !path.as_os_str().is_empty() && path != Utf8Path::new("/") {
        let (base_dir, relative) = base_dir_and_relative(path)?;
        if !relative.as_os_str().is_empty() {
            base_dir.create_dir_all(&relative)?;
        }
    }
    open_dir(path)
}

/// Atomically replace `name` inside `dir` with `contents`.
///
/// The bytes land in a sibling staging file which is flushed to disk and then
/// renamed over the target, so readers observe either the previous contents
/// or the new ones, never a torn write.
pub fn replace_file(dir: &fs_utf8::Dir, name: &str, contents: &[u8]) -> io::Result<()> {
    let staging = format!("{name}{STAGING_SUFFIX}");
    let mut file = dir.create(&staging)?;
    if let Err(err) = file.write_all(contents).and_then(|()| file.sync_all()) {
        drop(file);
        if let Err(cleanup) = dir.remove_file(&staging) {
            return Err(io::Error::new(
                err.kind(),
                format!("{err} (staging file {staging:?} left behind: {cleanup})"),
            ));
        }
        return Err(err);
    }
    drop(file);
    dir.rename(&staging, dir, name)
}

/// Read `name` inside `dir`, mapping a missing file to `None`.
pub fn read_if_exists(dir: &fs_utf8::Dir, name: &str) -> io::Result<Option<Vec<u8>>> {
    match dir.read(name) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Remove `name` inside `dir`, returning whether a file was removed.
pub fn remove_file_if_exists(dir: &fs_utf8::Dir, name: &str) -> io::Result<bool> {
    match dir.remove_file(name) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// List the names of regular files in `dir` whose names end with `suffix`.
pub fn file_names_with_suffix(dir: &fs_utf8::Dir, suffix: &str) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for listed in dir.entries()? {
        let entry = listed?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name()?;
        if name.ends_with(suffix) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Split an absolute or relative path into an ambient base directory and a relative suffix.
pub fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();

    let (base, relative) = match std_path.components().next() {
        // Windows absolute path with a drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;

            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_path.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from path"))?
                .to_path_buf();
            (base, relative)
        }
        // Unix-style absolute path.
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        // Relative path: resolve from the current directory.
        _ => (Utf8PathBuf::from("."), std_path.to_path_buf()),
    };

    let dir = open_dir(&base)?;
    let relative_utf8 =
        Utf8PathBuf::from_path_buf(relative).map_err(|_| io::Error::other("non-UTF-8 path"))?;

    Ok((dir, relative_utf8))
}
