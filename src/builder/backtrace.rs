// Call-stack capture for the "Trace:" section of full messages
use regex::Regex;
use std::backtrace::Backtrace;
use std::path::Path;
use std::sync::OnceLock;

/// Symbol prefixes of frames that belong to the logging machinery itself.
const MACHINERY_PREFIXES: &[&str] = &[
    "std::backtrace",
    "<std::backtrace",
    "graylog_logger::",
    "<graylog_logger::",
    "tracing::",
    "<tracing::",
    "tracing_core::",
    "<tracing_core::",
    "tracing_subscriber::",
    "<tracing_subscriber::",
    "<dyn tracing_core::",
];

/// Standard library frames that appear between machinery frames, e.g. the
/// thread-local access in `tracing`'s dispatch.
const GLUE_PREFIXES: &[&str] = &[
    "std::thread::local::",
    "<std::thread::local::",
    "core::",
    "<core::",
    "alloc::",
    "<alloc::",
];

struct FramePatterns {
    symbol: Regex,
    location: Regex,
}

static FRAME_PATTERNS: OnceLock<Option<FramePatterns>> = OnceLock::new();

fn frame_patterns() -> Option<&'static FramePatterns> {
    FRAME_PATTERNS
        .get_or_init(|| {
            let symbol = Regex::new(r"^\s*\d+: (.+)$").ok()?;
            let location = Regex::new(r"^\s*at (.+?):(\d+)(?::\d+)?$").ok()?;
            Some(FramePatterns { symbol, location })
        })
        .as_ref()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub symbol: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Captured call stack, innermost frame first, starting at the caller of
/// the logger.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    /// Captures the current stack, skipping the logger's own frames and then
    /// `start_depth` further frames.
    pub fn capture(start_depth: usize) -> Self {
        let rendered = Backtrace::force_capture().to_string();
        Self::from_rendered(&rendered, start_depth)
    }

    /// Builds a call stack from the textual form printed by
    /// [`std::backtrace::Backtrace`].
    pub fn from_rendered(rendered: &str, start_depth: usize) -> Self {
        let Some(patterns) = frame_patterns() else {
            return Self::default();
        };

        let mut frames: Vec<Frame> = Vec::new();
        for line in rendered.lines() {
            if let Some(caps) = patterns.location.captures(line) {
                if let Some(frame) = frames.last_mut() {
                    frame.file = Some(caps[1].to_string());
                    frame.line = caps[2].parse().ok();
                }
            } else if let Some(caps) = patterns.symbol.captures(line) {
                frames.push(Frame {
                    symbol: caps[1].trim().to_string(),
                    file: None,
                    line: None,
                });
            }
        }

        let start = machinery_prefix_len(&frames);
        let frames = frames.into_iter().skip(start).skip(start_depth).collect();

        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// First frame with a resolvable source location.
    pub fn first_located(&self) -> Option<&Frame> {
        self.frames.iter().find(|frame| frame.file.is_some())
    }

    /// One `#<n> <file>(<line>): <symbol>` line per frame.
    pub fn render(&self, root: Option<&Path>) -> String {
        self.frames
            .iter()
            .enumerate()
            .map(|(index, frame)| match (&frame.file, frame.line) {
                (Some(file), Some(line)) => format!(
                    "#{index} {}({line}): {}",
                    relativize(file, root),
                    frame.symbol
                ),
                _ => format!("#{index} [internal function]: {}", frame.symbol),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn is_machinery(symbol: &str) -> bool {
    MACHINERY_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
}

fn is_glue(symbol: &str) -> bool {
    GLUE_PREFIXES.iter().any(|prefix| symbol.starts_with(prefix))
}

/// Number of leading frames owned by the logging machinery. Glue frames
/// only count when more machinery follows them.
fn machinery_prefix_len(frames: &[Frame]) -> usize {
    let mut len = 0;
    for (index, frame) in frames.iter().enumerate() {
        if is_machinery(&frame.symbol) {
            len = index + 1;
        } else if !is_glue(&frame.symbol) {
            break;
        }
    }
    len
}

/// `file` relative to `root` when it lies below it, unchanged otherwise.
pub fn relativize(file: &str, root: Option<&Path>) -> String {
    root.and_then(|root| Path::new(file).strip_prefix(root).ok())
        .map(|relative| relative.display().to_string())
        .unwrap_or_else(|| file.to_string())
}
