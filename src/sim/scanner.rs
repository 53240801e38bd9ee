/// Scan capability for the second phase.
///
/// The session only cares that *a* scan succeeded; the payload is ignored.
/// `InboxScanner` treats any file that appears in a watched directory after
/// `start()` as a completed scan, so a phone scanner app, a sync folder or a
/// plain `touch` can complete the phase.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("could not prepare scan inbox {}: {source}", path.display())]
    Inbox {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait ScanCapability {
    /// Begin watching. Calling it again while active restarts the watch.
    fn start(&mut self) -> Result<(), ScanError>;

    /// `true` once, when a scan completes. Always `false` while inactive.
    fn poll(&mut self) -> bool;

    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

pub struct InboxScanner {
    dir: PathBuf,
    seen: HashSet<PathBuf>,
    active: bool,
}

impl InboxScanner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        InboxScanner {
            dir: dir.into(),
            seen: HashSet::new(),
            active: false,
        }
    }

    fn list(&self) -> io::Result<HashSet<PathBuf>> {
        let mut files = HashSet::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.insert(entry.path());
            }
        }
        Ok(files)
    }
}

impl ScanCapability for InboxScanner {
    fn start(&mut self) -> Result<(), ScanError> {
        let prepared = std::fs::create_dir_all(&self.dir).and_then(|_| self.list());
        self.seen = prepared.map_err(|source| ScanError::Inbox {
            path: self.dir.clone(),
            source,
        })?;
        self.active = true;
        log::info!("scan inbox armed at {}", self.dir.display());
        Ok(())
    }

    fn poll(&mut self) -> bool {
        if !self.active {
            return false;
        }
        match self.list() {
            Ok(files) => {
                let fresh = files.iter().any(|f| !self.seen.contains(f));
                self.seen = files;
                fresh
            }
            Err(e) => {
                // A vanished inbox is not fatal; keep watching.
                log::warn!("scan inbox {} unreadable: {e}", self.dir.display());
                false
            }
        }
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "recovery-room-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn inactive_scanner_never_fires() {
        let dir = scratch_dir("inactive");
        let mut s = InboxScanner::new(&dir);
        assert!(!s.poll());
        assert!(!s.is_active());
    }

    #[test]
    fn new_file_completes_scan() {
        let dir = scratch_dir("newfile");
        let mut s = InboxScanner::new(&dir);
        s.start().unwrap();
        assert!(s.is_active());
        assert!(!s.poll());
        std::fs::write(dir.join("qr.txt"), "anything").unwrap();
        assert!(s.poll());
        assert!(!s.poll(), "the same file only counts once");
        s.stop();
        assert!(!s.poll());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn files_present_before_start_are_ignored() {
        let dir = scratch_dir("preexisting");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("old.txt"), "stale").unwrap();
        let mut s = InboxScanner::new(&dir);
        s.start().unwrap();
        assert!(!s.poll());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unusable_inbox_reports_path() {
        let dir = scratch_dir("blocked");
        std::fs::create_dir_all(dir.parent().unwrap()).unwrap();
        std::fs::write(&dir, "not a directory").unwrap();
        let mut s = InboxScanner::new(&dir);
        let err = s.start().unwrap_err();
        assert!(err.to_string().contains("recovery-room-blocked"));
        assert!(!s.is_active());
        let _ = std::fs::remove_file(&dir);
    }
}
