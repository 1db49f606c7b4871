use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub(crate) struct Summary {
    directories_scanned: AtomicUsize,
    subtrees_skipped: AtomicUsize,
    files_seen: AtomicUsize,
    skipped_extension: AtomicUsize,
    skipped_date: AtomicUsize,
    annotated: AtomicUsize,
    failed: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub directories_scanned: usize,
    pub subtrees_skipped: usize,
    pub files_seen: usize,
    pub skipped_extension: usize,
    pub skipped_date: usize,
    pub annotated: usize,
    pub failed: usize,
}

impl Summary {
    pub(crate) fn directory_scanned(&self) {
        self.directories_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn subtree_skipped(&self) {
        self.subtrees_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn file_seen(&self) {
        self.files_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn extension_skipped(&self) {
        self.skipped_extension.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn date_skipped(&self) {
        self.skipped_date.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn annotated(&self) {
        self.annotated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RunSummary {
        RunSummary {
            directories_scanned: self.directories_scanned.load(Ordering::Relaxed),
            subtrees_skipped: self.subtrees_skipped.load(Ordering::Relaxed),
            files_seen: self.files_seen.load(Ordering::Relaxed),
            skipped_extension: self.skipped_extension.load(Ordering::Relaxed),
            skipped_date: self.skipped_date.load(Ordering::Relaxed),
            annotated: self.annotated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
