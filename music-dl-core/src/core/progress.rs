use std::sync::{LazyLock, Mutex};

use regex::Regex;

pub type ProgressFn<'a> = dyn Fn(f64) + Send + Sync + 'a;

/// Thresholds used to coarsen the raw percentage stream for display.
pub const CHECKPOINTS: [u8; 7] = [10, 30, 50, 60, 75, 95, 100];

static DOWNLOAD_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[download\]\s+([0-9.]+)%").unwrap());

/// Turns a chunk of subprocess output into a percentage, if it carries one.
pub trait ProgressExtractor: Send + Sync {
    fn extract(&self, chunk: &str) -> Option<f64>;
}

/// yt-dlp style `[download]  42.0%` lines. First match in the chunk wins.
pub struct DownloadTag;

impl ProgressExtractor for DownloadTag {
    fn extract(&self, chunk: &str) -> Option<f64> {
        let caps = DOWNLOAD_TAG_RE.captures(chunk)?;
        caps.get(1)?.as_str().parse::<f64>().ok()
    }
}

/// Reports a fixed value for any output at all. ffmpeg gives no usable
/// percentage here, so activity is all we can show.
pub struct Activity(pub f64);

impl ProgressExtractor for Activity {
    fn extract(&self, chunk: &str) -> Option<f64> {
        if chunk.is_empty() {
            None
        } else {
            Some(self.0)
        }
    }
}

pub struct Silent;

impl ProgressExtractor for Silent {
    fn extract(&self, _chunk: &str) -> Option<f64> {
        None
    }
}

/// Forward-only checkpoint tracker.
#[derive(Debug, Default, Clone)]
pub struct Checkpoints {
    last: u8,
}

impl Checkpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> u8 {
        self.last
    }

    pub fn is_complete(&self) -> bool {
        self.last >= 100
    }

    /// Moves to the highest checkpoint `percent` has reached, returning it if
    /// that is past the last one reported.
    pub fn advance(&mut self, percent: f64) -> Option<u8> {
        let reached = CHECKPOINTS
            .iter()
            .copied()
            .filter(|c| *c > self.last && percent >= f64::from(*c))
            .max()?;
        self.last = reached;
        Some(reached)
    }

    pub fn complete(&mut self) -> Option<u8> {
        self.advance(100.0)
    }
}

/// Wraps an optional callback so it only ever sees a non-decreasing
/// sequence inside [0, 100].
pub struct MonotonicProgress<'a> {
    sink: Option<&'a ProgressFn<'a>>,
    last: Mutex<Option<f64>>,
}

impl<'a> MonotonicProgress<'a> {
    pub fn new(sink: Option<&'a ProgressFn<'a>>) -> Self {
        Self {
            sink,
            last: Mutex::new(None),
        }
    }

    pub fn report(&self, value: f64) {
        let Some(sink) = self.sink else {
            return;
        };
        if value.is_nan() {
            return;
        }
        let value = value.clamp(0.0, 100.0);

        let emit = match self.last.lock() {
            Ok(mut last) => match *last {
                Some(prev) if value <= prev => false,
                _ => {
                    *last = Some(value);
                    true
                }
            },
            Err(_) => false,
        };

        if emit {
            sink(value);
        }
    }
}

/// Maps the download phase of an audio job onto the first half of the bar.
pub fn download_phase(percent: f64) -> f64 {
    (percent / 2.0).clamp(0.0, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn download_tag_parses_percentage() {
        let chunk = "[download]  42.7% of 3.50MiB at 1.2MiB/s ETA 00:02";
        assert_eq!(DownloadTag.extract(chunk), Some(42.7));
    }

    #[test]
    fn download_tag_takes_first_match_in_chunk() {
        let chunk = "\r[download]  10.0% of 3MiB\r[download]  20.0% of 3MiB";
        assert_eq!(DownloadTag.extract(chunk), Some(10.0));
    }

    #[test]
    fn download_tag_ignores_other_output() {
        assert_eq!(DownloadTag.extract("[youtube] abc: Downloading webpage"), None);
        assert_eq!(DownloadTag.extract("[download] Destination: temp_abc.webm"), None);
    }

    #[test]
    fn download_tag_unparsable_number_is_no_update() {
        assert_eq!(DownloadTag.extract("[download]  1.2.3%"), None);
    }

    #[test]
    fn activity_reports_fixed_value() {
        assert_eq!(Activity(99.0).extract("size=  1024kB time=00:01:02"), Some(99.0));
        assert_eq!(Activity(99.0).extract(""), None);
        assert_eq!(Silent.extract("[download] 50.0%"), None);
    }

    #[test]
    fn checkpoints_advance_forward_only() {
        let mut cp = Checkpoints::new();
        assert_eq!(cp.advance(5.0), None);
        assert_eq!(cp.advance(12.0), Some(10));
        assert_eq!(cp.advance(12.0), None);
        assert_eq!(cp.advance(8.0), None);
        assert_eq!(cp.advance(55.0), Some(50));
        assert_eq!(cp.advance(30.0), None);
        assert_eq!(cp.advance(100.0), Some(100));
        assert!(cp.is_complete());
        assert_eq!(cp.advance(100.0), None);
    }

    #[test]
    fn checkpoints_complete_once() {
        let mut cp = Checkpoints::new();
        assert_eq!(cp.complete(), Some(100));
        assert_eq!(cp.complete(), None);
    }

    #[test]
    fn monotonic_progress_drops_regressions() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let sink: &ProgressFn<'_> = &move |p: f64| recorder.lock().unwrap().push(p);
        let gate = MonotonicProgress::new(Some(sink));

        for v in [0.0, 20.0, 10.0, 20.0, 150.0, 99.0, -5.0, f64::NAN] {
            gate.report(v);
        }

        assert_eq!(*seen.lock().unwrap(), vec![0.0, 20.0, 100.0]);
    }

    #[test]
    fn monotonic_progress_accepts_borrowing_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: f64| seen.lock().unwrap().push(p);
        {
            let gate = MonotonicProgress::new(Some(&sink));
            let relay = |p: f64| gate.report(download_phase(p));
            let forward: &ProgressFn<'_> = &relay;
            forward(40.0);
            forward(100.0);
        }
        assert_eq!(seen.into_inner().unwrap(), vec![20.0, 50.0]);
    }

    #[test]
    fn monotonic_progress_without_sink_is_noop() {
        let gate = MonotonicProgress::new(None);
        gate.report(50.0);
    }

    #[test]
    fn download_phase_occupies_first_half() {
        assert_eq!(download_phase(0.0), 0.0);
        assert_eq!(download_phase(50.0), 25.0);
        assert_eq!(download_phase(100.0), 50.0);
        assert_eq!(download_phase(180.0), 50.0);
    }
}
