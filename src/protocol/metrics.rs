//! Process-wide codec counters
//!
//! Relaxed atomics only; a snapshot is a best-effort view, not a consistent cut.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Track codec activity without external dependencies.
pub(crate) struct Metrics;

static FRAMES_ENCODED: AtomicU64 = AtomicU64::new(0);
static FRAMES_DECODED: AtomicU64 = AtomicU64::new(0);
static BYTES_ENCODED: AtomicU64 = AtomicU64::new(0);
static BYTES_DECODED: AtomicU64 = AtomicU64::new(0);
static COMPRESSED_FRAMES: AtomicU64 = AtomicU64::new(0);
static ENCODE_ERRORS: AtomicU64 = AtomicU64::new(0);
static DECODE_ERRORS: AtomicU64 = AtomicU64::new(0);
static ENCODE_TIME_TOTAL_NS: AtomicU64 = AtomicU64::new(0);
static ENCODE_TIME_MAX_NS: AtomicU64 = AtomicU64::new(0);
static DECODE_TIME_TOTAL_NS: AtomicU64 = AtomicU64::new(0);
static DECODE_TIME_MAX_NS: AtomicU64 = AtomicU64::new(0);

const NANOSECONDS_PER_MICROSECOND: u128 = 1_000;

/// Codec direction of a recorded event.
#[derive(Clone, Copy)]
pub(crate) enum Direction {
    Encode,
    Decode,
}

impl Metrics {
    #[inline]
    pub(crate) fn record_frame(direction: Direction, len: usize, elapsed: Duration) {
        let len = u64::try_from(len).unwrap_or(u64::MAX);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        match direction {
            Direction::Encode => {
                FRAMES_ENCODED.fetch_add(1, Ordering::Relaxed);
                BYTES_ENCODED.fetch_add(len, Ordering::Relaxed);
                ENCODE_TIME_TOTAL_NS.fetch_add(nanos, Ordering::Relaxed);
                update_max(&ENCODE_TIME_MAX_NS, nanos);
            }
            Direction::Decode => {
                FRAMES_DECODED.fetch_add(1, Ordering::Relaxed);
                BYTES_DECODED.fetch_add(len, Ordering::Relaxed);
                DECODE_TIME_TOTAL_NS.fetch_add(nanos, Ordering::Relaxed);
                update_max(&DECODE_TIME_MAX_NS, nanos);
            }
        }
    }

    #[inline]
    pub(crate) fn record_compressed_frame() {
        COMPRESSED_FRAMES.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_error(direction: Direction) {
        match direction {
            Direction::Encode => ENCODE_ERRORS.fetch_add(1, Ordering::Relaxed),
            Direction::Decode => DECODE_ERRORS.fetch_add(1, Ordering::Relaxed),
        };
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            frames_encoded: FRAMES_ENCODED.load(Ordering::Relaxed),
            frames_decoded: FRAMES_DECODED.load(Ordering::Relaxed),
            bytes_encoded: BYTES_ENCODED.load(Ordering::Relaxed),
            bytes_decoded: BYTES_DECODED.load(Ordering::Relaxed),
            compressed_frames: COMPRESSED_FRAMES.load(Ordering::Relaxed),
            encode_errors: ENCODE_ERRORS.load(Ordering::Relaxed),
            decode_errors: DECODE_ERRORS.load(Ordering::Relaxed),
            encode_time_total_ns: ENCODE_TIME_TOTAL_NS.load(Ordering::Relaxed),
            encode_time_max_ns: ENCODE_TIME_MAX_NS.load(Ordering::Relaxed),
            decode_time_total_ns: DECODE_TIME_TOTAL_NS.load(Ordering::Relaxed),
            decode_time_max_ns: DECODE_TIME_MAX_NS.load(Ordering::Relaxed),
        }
    }
}

fn update_max(target: &AtomicU64, candidate: u64) {
    let mut current = target.load(Ordering::Relaxed);
    while candidate > current {
        match target.compare_exchange_weak(current, candidate, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return,
            Err(old) => current = old,
        }
    }
}

/// Current codec counters.
#[must_use]
pub fn snapshot() -> MetricsSnapshot {
    Metrics::totals()
}

/// Lightweight snapshot of codec counters.
#[allow(missing_docs)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_encoded: u64,
    pub frames_decoded: u64,
    pub bytes_encoded: u64,
    pub bytes_decoded: u64,
    pub compressed_frames: u64,
    pub encode_errors: u64,
    pub decode_errors: u64,
    pub encode_time_total_ns: u64,
    pub encode_time_max_ns: u64,
    pub decode_time_total_ns: u64,
    pub decode_time_max_ns: u64,
}

impl MetricsSnapshot {
    /// Average encode time in microseconds.
    #[must_use]
    pub fn avg_encode_time_us(&self) -> Option<u64> {
        average_microseconds(self.encode_time_total_ns, self.frames_encoded)
    }

    /// Average decode time in microseconds.
    #[must_use]
    pub fn avg_decode_time_us(&self) -> Option<u64> {
        average_microseconds(self.decode_time_total_ns, self.frames_decoded)
    }
}

fn average_microseconds(total_ns: u64, count: u64) -> Option<u64> {
    if count == 0 {
        return None;
    }

    let average = u128::from(total_ns) / (u128::from(count) * NANOSECONDS_PER_MICROSECOND);
    Some(u64::try_from(average).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_only_grow() {
        let before = snapshot();
        Metrics::record_frame(Direction::Encode, 10, Duration::from_micros(3));
        Metrics::record_frame(Direction::Decode, 12, Duration::from_micros(5));
        Metrics::record_compressed_frame();
        Metrics::record_error(Direction::Decode);
        let after = snapshot();

        assert!(after.frames_encoded > before.frames_encoded);
        assert!(after.bytes_decoded >= before.bytes_decoded + 12);
        assert!(after.compressed_frames > before.compressed_frames);
        assert!(after.decode_errors > before.decode_errors);
        assert!(after.decode_time_max_ns >= 5_000);
    }

    #[test]
    fn test_average_microseconds() {
        assert_eq!(average_microseconds(0, 0), None);
        assert_eq!(average_microseconds(9_000, 3), Some(3));
        let snapshot = MetricsSnapshot {
            frames_encoded: 2,
            encode_time_total_ns: 4_000,
            ..MetricsSnapshot::default()
        };
        assert_eq!(snapshot.avg_encode_time_us(), Some(2));
        assert_eq!(snapshot.avg_decode_time_us(), None);
    }
}
