use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

const WINDOW: usize = 10;
const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug)]
struct Inner {
    total_bytes: u64,
    recent: VecDeque<(u64, Instant)>,
}

/// Byte counter shared by every worker and the progress reporter of one run.
///
/// Throughput is taken over the last ten reports only, so a quiet period reads as
/// zero once fewer than two samples span a non-zero interval.
#[derive(Debug)]
pub struct DownloadStats {
    inner: Mutex<Inner>,
    start_time: Instant,
}

impl Default for DownloadStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadStats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                total_bytes: 0,
                recent: VecDeque::with_capacity(WINDOW),
            }),
            start_time: Instant::now(),
        }
    }

    pub fn add_bytes(&self, bytes: u64) {
        self.add_bytes_at(bytes, Instant::now());
    }

    fn add_bytes_at(&self, bytes: u64, at: Instant) {
        let mut inner = self.lock();
        inner.total_bytes += bytes;
        if inner.recent.len() == WINDOW {
            inner.recent.pop_front();
        }
        inner.recent.push_back((bytes, at));
    }

    /// Recent throughput in MiB/s.
    pub fn speed(&self) -> f64 {
        let inner = self.lock();
        if inner.recent.len() < 2 {
            return 0.0;
        }
        let (Some((_, first)), Some((_, last))) = (inner.recent.front(), inner.recent.back())
        else {
            return 0.0;
        };
        let span = last.duration_since(*first).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }
        let bytes: u64 = inner.recent.iter().map(|(n, _)| n).sum();
        bytes as f64 / span / MIB
    }

    /// Cumulative total in MiB.
    pub fn total_mib(&self) -> f64 {
        self.total_bytes() as f64 / MIB
    }

    pub fn total_bytes(&self) -> u64 {
        self.lock().total_bytes
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Every update is complete before the guard drops; poisoning carries no torn state.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
