//! Serial I/O context for the file cache.
//!
//! One named thread drains a FIFO of jobs, so operations land on disk in
//! submission order. The thread exits once every sender is gone and the
//! queue is empty, which lets writes submitted just before the cache is
//! dropped still complete.

use std::io;
use std::sync::mpsc::{self, Sender};
use std::thread;

use camino::{Utf8Path, Utf8PathBuf};

const WORKER_NAME: &str = "places-cache-io";

/// Unit of work run on the cache thread.
pub(crate) type Job = Box<dyn FnOnce(&EntryStore) + Send + 'static>;

/// Handle for submitting jobs to the cache thread.
#[derive(Debug)]
pub(crate) struct Worker {
    jobs: Sender<Job>,
}

impl Worker {
    /// Spawn the thread that owns all I/O under `root`.
    pub(crate) fn spawn(root: Utf8PathBuf) -> io::Result<Self> {
        let (jobs, queue) = mpsc::channel::<Job>();
        let store = EntryStore { root };
        thread::Builder::new()
            .name(WORKER_NAME.to_owned())
            .spawn(move || {
                for job in queue {
                    job(&store);
                }
            })?;
        Ok(Self { jobs })
    }

    /// Queue `job`. Returns `false` when the thread is no longer running.
    pub(crate) fn submit(&self, job: Job) -> bool {
        self.jobs.send(job).is_ok()
    }
}

/// Filesystem operations for one namespace directory.
#[derive(Debug)]
pub(crate) struct EntryStore {
    root: Utf8PathBuf,
}

impl EntryStore {
    pub(crate) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Atomically replace `name`, creating the directory when needed.
    pub(crate) fn write(&self, name: &str, contents: &[u8]) -> io::Result<()> {
        let dir = places_fs::ensure_dir(&self.root)?;
        places_fs::replace_file(&dir, name, contents)
    }

    /// Read `name`; a missing directory or file is `None`.
    pub(crate) fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match places_fs::open_dir(&self.root) {
            Ok(dir) => places_fs::read_if_exists(&dir, name),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Delete `name` if present.
    pub(crate) fn remove(&self, name: &str) -> io::Result<bool> {
        match places_fs::open_dir(&self.root) {
            Ok(dir) => places_fs::remove_file_if_exists(&dir, name),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Delete every file whose name ends with one of `suffixes`.
    ///
    /// Keeps going after a failed removal and reports the first error.
    pub(crate) fn remove_matching(&self, suffixes: &[&str]) -> io::Result<usize> {
        let dir = match places_fs::open_dir(&self.root) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err),
        };
        let mut removed = 0;
        let mut first_error = None;
        for suffix in suffixes {
            for name in places_fs::file_names_with_suffix(&dir, suffix)? {
                match places_fs::remove_file_if_exists(&dir, &name) {
                    Ok(true) => removed += 1,
                    Ok(false) => {}
                    Err(err) => {
                        log::warn!("failed to remove cache entry {name:?}: {err}");
                        first_error.get_or_insert(err);
                    }
                }
            }
        }
        first_error.map_or(Ok(removed), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::sync::mpsc::channel;
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn store_in(dir: &TempDir) -> EntryStore {
        let root = Utf8PathBuf::from_path_buf(dir.path().join("entries")).expect("utf-8 path");
        EntryStore { root }
    }

    #[rstest]
    fn missing_directory_reads_as_absent(temp_dir: TempDir) {
        let store = store_in(&temp_dir);
        assert_eq!(store.read("a.json").expect("read"), None);
        assert!(!store.remove("a.json").expect("remove"));
        assert_eq!(store.remove_matching(&[".json"]).expect("clear"), 0);
    }

    #[rstest]
    fn write_creates_directory_and_replaces(temp_dir: TempDir) {
        let store = store_in(&temp_dir);
        store.write("a.json", b"1").expect("first write");
        store.write("a.json", b"2").expect("second write");
        assert_eq!(store.read("a.json").expect("read"), Some(b"2".to_vec()));
        assert!(store.root().join("a.json").is_file());
        assert!(!store.root().join("a.json.tmp").exists());
    }

    #[rstest]
    fn remove_matching_only_touches_suffixes(temp_dir: TempDir) {
        let store = store_in(&temp_dir);
        store.write("a.json", b"1").expect("write a");
        store.write("b.json", b"2").expect("write b");
        store.write("notes.txt", b"keep").expect("write notes");
        assert_eq!(store.remove_matching(&[".json"]).expect("clear"), 2);
        assert_eq!(store.read("notes.txt").expect("read"), Some(b"keep".to_vec()));
    }

    #[rstest]
    fn jobs_run_in_submission_order(temp_dir: TempDir) {
        let worker = Worker::spawn(store_in(&temp_dir).root).expect("spawn worker");
        let (done, finished) = channel();
        for value in 0..20_u8 {
            let done = done.clone();
            assert!(worker.submit(Box::new(move |store: &EntryStore| {
                store.write("n.json", &[value]).expect("write");
                done.send(value).expect("report");
            })));
        }
        drop(done);
        let order: Vec<u8> = finished.iter().collect();
        assert_eq!(order, (0..20).collect::<Vec<_>>());
    }
}
