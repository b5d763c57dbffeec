//! Print dispatch for generated documents.
//!
//! A document is prepared for printing (paper-width print CSS, optional
//! control bar, auto-print / auto-close scripts) and handed to a
//! [`Presenter`]. The presenter first tries a dedicated window; when that is
//! blocked the document goes through the hidden fallback instead. Printing is
//! fire-and-forget: browsers give no completion signal for the print dialog,
//! so nothing here waits for one, retries, or cancels.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::PresentError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Delay between window load and `window.print()` so images/fonts settle.
pub const AUTO_PRINT_DELAY_MS: u64 = 500;
/// Delay between `afterprint` and `window.close()`.
pub const AUTO_CLOSE_DELAY_MS: u64 = 1000;
/// Lifetime of hidden-fallback artifacts before they are pruned.
pub const HIDDEN_FRAME_TTL: Duration = Duration::from_secs(10 * 60);

const WINDOW_HEIGHT_PX: u32 = 600;
const SPOOL_DIR: &str = "spool";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaperWidth {
    Mm58,
    #[default]
    Mm80,
}

impl PaperWidth {
    pub fn mm(self) -> u32 {
        match self {
            PaperWidth::Mm58 => 58,
            PaperWidth::Mm80 => 80,
        }
    }

    /// Width of the print preview window.
    pub fn window_width_px(self) -> u32 {
        match self {
            PaperWidth::Mm58 => 240,
            PaperWidth::Mm80 => 320,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrintConfig {
    #[serde(default)]
    pub paper_width: PaperWidth,
    #[serde(default = "enabled")]
    pub auto_print: bool,
    #[serde(default = "enabled")]
    pub auto_close: bool,
    #[serde(default = "enabled")]
    pub show_print_button: bool,
}

fn enabled() -> bool {
    true
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            paper_width: PaperWidth::Mm80,
            auto_print: true,
            auto_close: true,
            show_print_button: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Presenter seam
// ---------------------------------------------------------------------------

/// A fully prepared document ready for a presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintRequest {
    pub window_name: String,
    pub title: String,
    pub html: String,
    pub paper_width: PaperWidth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    pub name: String,
    pub width_px: u32,
    pub height_px: u32,
    /// Where the presented document lives, if it was written to disk.
    pub location: Option<PathBuf>,
}

pub trait Presenter: Send + Sync {
    /// Show the document in its own window.
    fn open_window(&self, request: &PrintRequest) -> Result<WindowHandle, PresentError>;

    /// Fallback when no window can be opened.
    fn print_hidden(&self, request: &PrintRequest) -> Result<(), PresentError>;
}

// ---------------------------------------------------------------------------
// Document preparation
// ---------------------------------------------------------------------------

fn print_css(paper: PaperWidth) -> String {
    let mm = paper.mm();
    format!(
        r#"<style id="print-media">
@page {{ size: {mm}mm auto; margin: 0; }}
@media print {{
  html, body {{ width: {mm}mm; margin: 0; padding: 0; }}
  .no-print {{ display: none !important; }}
}}
.print-controls {{ position: fixed; top: 8px; right: 8px; display: flex; gap: 6px; z-index: 9999; }}
.print-controls button {{ padding: 6px 12px; font-size: 12px; cursor: pointer; }}
</style>
"#
    )
}

const PRINT_CONTROLS: &str = "<div class=\"print-controls no-print\">\
<button type=\"button\" onclick=\"window.print()\">Print</button>\
<button type=\"button\" onclick=\"window.close()\">Close</button></div>";

fn auto_print_script() -> String {
    format!(
        "<script>window.addEventListener(\"load\",function(){{setTimeout(function(){{window.print();}},{AUTO_PRINT_DELAY_MS});}});</script>"
    )
}

fn auto_close_script() -> String {
    format!(
        "<script>window.addEventListener(\"afterprint\",function(){{setTimeout(function(){{window.close();}},{AUTO_CLOSE_DELAY_MS});}});</script>"
    )
}

/// Byte offset of `needle` (ASCII, lowercase) in `haystack`, ignoring case.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

fn insert_into_head(html: &str, fragment: &str) -> String {
    let mut out = String::with_capacity(html.len() + fragment.len() + 16);
    if let Some(pos) = find_ci(html, "</head>") {
        out.push_str(&html[..pos]);
        out.push_str(fragment);
        out.push_str(&html[pos..]);
    } else if let Some(pos) = find_ci(html, "<body") {
        out.push_str(&html[..pos]);
        out.push_str("<head>");
        out.push_str(fragment);
        out.push_str("</head>");
        out.push_str(&html[pos..]);
    } else {
        out.push_str("<head>");
        out.push_str(fragment);
        out.push_str("</head>");
        out.push_str(html);
    }
    out
}

fn insert_before_body_end(html: &str, fragment: &str) -> String {
    match find_ci(html, "</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + fragment.len());
            out.push_str(&html[..pos]);
            out.push_str(fragment);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{html}{fragment}"),
    }
}

/// Inject print CSS, controls and auto-print/close behaviour.
///
/// The print CSS is always injected, even if the template carries its own
/// print styles. Without auto-print the control bar is always shown so the
/// operator keeps a way to print.
pub fn prepare_print_html(html: &str, config: &PrintConfig) -> String {
    let mut prepared = insert_into_head(html, &print_css(config.paper_width));

    let mut tail = String::new();
    if config.show_print_button || !config.auto_print {
        tail.push_str(PRINT_CONTROLS);
    }
    if config.auto_print {
        tail.push_str(&auto_print_script());
    }
    if config.auto_close {
        tail.push_str(&auto_close_script());
    }
    if !tail.is_empty() {
        prepared = insert_before_body_end(&prepared, &tail);
    }
    prepared
}

/// Window name safe for `window.open` / file names.
pub fn window_name(title: &str) -> String {
    let mut slug = String::with_capacity(title.len() + 6);
    slug.push_str("print_");
    let mut last_sep = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            slug.push('_');
            last_sep = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Prepare `html` and hand it to `presenter`.
///
/// Returns the window handle, or `None` when the hidden fallback was used.
/// Failures are logged, never returned.
///
/// With [`BrowserPresenter`] the hidden fallback does not print anything by
/// itself: the prepared file is only spooled under `spool/` and has to be
/// printed by hand.
pub fn print_document(
    presenter: &dyn Presenter,
    html: &str,
    window_title: &str,
    config: &PrintConfig,
) -> Option<WindowHandle> {
    let request = PrintRequest {
        window_name: window_name(window_title),
        title: window_title.to_string(),
        html: prepare_print_html(html, config),
        paper_width: config.paper_width,
    };

    match presenter.open_window(&request) {
        Ok(handle) => {
            info!(window = %handle.name, title = %window_title, auto_print = config.auto_print, "Print window opened");
            Some(handle)
        }
        Err(blocked) => {
            warn!(title = %window_title, error = %blocked, "Print window unavailable, using hidden fallback");
            if let Err(e) = presenter.print_hidden(&request) {
                error!(title = %window_title, error = %e, "Hidden print fallback failed");
            }
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Browser presenter
// ---------------------------------------------------------------------------

/// Writes documents to disk and opens them in the system browser.
///
/// The hidden fallback spools the document under `spool/` for manual
/// printing; spooled files older than the TTL are pruned on every call.
#[derive(Debug, Clone)]
pub struct BrowserPresenter {
    output_dir: PathBuf,
    spool_ttl: Duration,
}

impl BrowserPresenter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            spool_ttl: HIDDEN_FRAME_TTL,
        }
    }

    pub fn with_spool_ttl(mut self, ttl: Duration) -> Self {
        self.spool_ttl = ttl;
        self
    }

    pub fn spool_dir(&self) -> PathBuf {
        self.output_dir.join(SPOOL_DIR)
    }
}

fn write_print_html_file(dir: &Path, name: &str, html: &str) -> Result<PathBuf, PresentError> {
    fs::create_dir_all(dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let unique = Uuid::new_v4().simple().to_string();
    let filename = format!("{name}_{timestamp}_{}.html", &unique[..8]);
    let file_path = dir.join(filename);
    fs::write(&file_path, html)?;
    Ok(file_path)
}

/// Remove `.html` files in `dir` last modified more than `ttl` ago.
fn prune_spool(dir: &Path, ttl: Duration) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .map(|age| age >= ttl)
            .unwrap_or(false);
        if expired {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to prune spooled document"),
            }
        }
    }
    removed
}

impl Presenter for BrowserPresenter {
    fn open_window(&self, request: &PrintRequest) -> Result<WindowHandle, PresentError> {
        let path = write_print_html_file(&self.output_dir, &request.window_name, &request.html)?;
        let target = path.to_string_lossy().to_string();
        webbrowser::open(&target)
            .map_err(|e| PresentError::Blocked(format!("open {target}: {e}")))?;
        Ok(WindowHandle {
            name: request.window_name.clone(),
            width_px: request.paper_width.window_width_px(),
            height_px: WINDOW_HEIGHT_PX,
            location: Some(path),
        })
    }

    fn print_hidden(&self, request: &PrintRequest) -> Result<(), PresentError> {
        let spool = self.spool_dir();
        let pruned = prune_spool(&spool, self.spool_ttl);
        let path = write_print_html_file(&spool, &request.window_name, &request.html)?;
        warn!(
            path = %path.display(),
            pruned = pruned,
            "Document spooled for manual printing"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Headless presenter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentMode {
    Window,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPrint {
    pub mode: PresentMode,
    pub request: PrintRequest,
}

/// Captures documents instead of printing them; always succeeds.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    block_windows: bool,
    captured: Mutex<Vec<CapturedPrint>>,
}

impl HeadlessPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every window so the hidden fallback is exercised.
    pub fn with_windows_blocked() -> Self {
        Self {
            block_windows: true,
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn captured(&self) -> Vec<CapturedPrint> {
        self.captured
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn capture(&self, mode: PresentMode, request: &PrintRequest) {
        self.captured
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(CapturedPrint {
                mode,
                request: request.clone(),
            });
    }
}

impl Presenter for HeadlessPresenter {
    fn open_window(&self, request: &PrintRequest) -> Result<WindowHandle, PresentError> {
        if self.block_windows {
            return Err(PresentError::Blocked("headless presenter blocks windows".into()));
        }
        self.capture(PresentMode::Window, request);
        Ok(WindowHandle {
            name: request.window_name.clone(),
            width_px: request.paper_width.window_width_px(),
            height_px: WINDOW_HEIGHT_PX,
            location: None,
        })
    }

    fn print_hidden(&self, request: &PrintRequest) -> Result<(), PresentError> {
        self.capture(PresentMode::Hidden, request);
        Ok(())
    }
}

/// Presenter that writes every document to a directory without opening it.
///
/// Used by the CLI `--headless` mode.
#[derive(Debug, Clone)]
pub struct DirectoryPresenter {
    output_dir: PathBuf,
}

impl DirectoryPresenter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl Presenter for DirectoryPresenter {
    fn open_window(&self, request: &PrintRequest) -> Result<WindowHandle, PresentError> {
        let path = write_print_html_file(&self.output_dir, &request.window_name, &request.html)?;
        info!(path = %path.display(), "Document written");
        Ok(WindowHandle {
            name: request.window_name.clone(),
            width_px: request.paper_width.window_width_px(),
            height_px: WINDOW_HEIGHT_PX,
            location: Some(path),
        })
    }

    fn print_hidden(&self, request: &PrintRequest) -> Result<(), PresentError> {
        self.open_window(request).map(|_| ())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
