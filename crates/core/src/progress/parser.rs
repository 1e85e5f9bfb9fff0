//! Translation of raw downloader output into progress events.
//!
//! The external tool only exposes progress as unstructured text, so this
//! module is the single place that knows its line format. Everything else
//! consumes [`ProgressEvent`]s and never sees raw output. If the tool ever
//! grows a structured progress channel, only this file changes.

use regex_lite::Regex;

use super::types::{ProgressEvent, Stage};

/// Fixed percent reported when the title line is seen.
const TITLE_PERCENT: u8 = 10;
/// Fixed percent reported when audio extraction starts.
const EXTRACT_PERCENT: u8 = 75;
/// Lower bound of the reported download window.
const DOWNLOAD_WINDOW_BASE: f64 = 10.0;
/// Width of the reported download window (raw 0-100 maps onto [10, 70]).
const DOWNLOAD_WINDOW_SPAN: f64 = 0.6;

/// Marker the tool prints when the audio extraction post-processor starts.
const EXTRACT_AUDIO_MARKER: &str = "[ExtractAudio]";

/// Accumulates arbitrary-sized output chunks and yields complete lines.
///
/// Subprocess output arrives in whatever chunk sizes the pipe delivers; a
/// partial trailing line is carried over to the next chunk. Both `\n` and
/// `\r` terminate a line: when the tool is not line-buffered it rewrites
/// its progress line in place with bare carriage returns.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of raw bytes, returning every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        loop {
            let Some(pos) = self.pending.find(['\n', '\r']) else {
                break;
            };
            // A trailing '\r' may be the first half of a "\r\n" split
            // across chunks; hold it until more input arrives.
            if self.pending.as_bytes()[pos] == b'\r' && pos + 1 == self.pending.len() {
                break;
            }
            let rest = if self.pending[pos..].starts_with("\r\n") {
                pos + 2
            } else {
                pos + 1
            };
            let line = self.pending[..pos].to_string();
            self.pending.drain(..rest);
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Returns the final partial line, if any. Call after the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        let tail = self.pending.trim_end_matches(['\n', '\r']).trim();
        let line = if tail.is_empty() {
            None
        } else {
            Some(tail.to_string())
        };
        self.pending.clear();
        line
    }
}

/// Stateless-per-job classifier turning completed output lines into stage
/// transitions.
///
/// Reported percent is clamped monotonically non-decreasing within the
/// job; the only reset to 0 is the terminal error event, which the runner
/// emits, not this classifier.
pub struct OutputClassifier {
    title_re: Regex,
    percent_re: Regex,
    title_seen: bool,
    last_percent: u8,
}

impl OutputClassifier {
    pub fn new() -> Self {
        Self {
            title_re: Regex::new(r"Found:\s*(.+)").expect("valid title regex"),
            percent_re: Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid percent regex"),
            title_seen: false,
            last_percent: 0,
        }
    }

    /// Classifies one completed line of subprocess output.
    ///
    /// Returns `None` for lines that carry no progress information.
    pub fn classify(&mut self, line: &str) -> Option<ProgressEvent> {
        if let Some(caps) = self.title_re.captures(line) {
            // Only the first title line is honored.
            if self.title_seen {
                return None;
            }
            self.title_seen = true;
            let title = caps.get(1).map(|m| m.as_str().trim().to_string())?;
            let percent = self.clamp(TITLE_PERCENT);
            return Some(
                ProgressEvent::stage(Stage::Fetching, format!("Found: {title}"), percent)
                    .with_title(title),
            );
        }

        if line.contains(EXTRACT_AUDIO_MARKER) {
            let percent = self.clamp(EXTRACT_PERCENT);
            return Some(ProgressEvent::stage(
                Stage::Processing,
                "Extracting audio...",
                percent,
            ));
        }

        if let Some(caps) = self.percent_re.captures(line) {
            let raw: f64 = caps.get(1)?.as_str().parse().ok()?;
            let mapped = DOWNLOAD_WINDOW_BASE + raw.clamp(0.0, 100.0) * DOWNLOAD_WINDOW_SPAN;
            let percent = self.clamp(mapped.round() as u8);
            return Some(ProgressEvent::stage(
                Stage::Downloading,
                format!("Downloading: {raw:.1}%"),
                percent,
            ));
        }

        None
    }

    /// Whether any line has announced a title yet.
    pub fn title_seen(&self) -> bool {
        self.title_seen
    }

    fn clamp(&mut self, percent: u8) -> u8 {
        let clamped = percent.max(self.last_percent);
        self.last_percent = clamped;
        clamped
    }
}

impl Default for OutputClassifier {
    fn default() -> Self {
        Self::new()
    }
}
