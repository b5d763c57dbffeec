//! Cafe Receipts
//!
//! Printable documents for a cafe point of sale: kitchen tickets, ZATCA
//! simplified tax invoices, customer tracking receipts and cashier copies.
//! Documents are rendered to standalone HTML and dispatched to a print
//! presenter; the full invoice set is printed with staggered delays.

use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod config;
pub mod diagnostics;
pub mod documents;
pub mod error;
pub mod html;
pub mod invoice_set;
pub mod model;
pub mod print;
pub mod qr;
pub mod receipt_renderer;
pub mod vat;
pub mod zatca;

pub use config::{SellerProfile, StoreConfig};
pub use error::{ConfigError, DocumentError, PresentError, QrError, TlvError};
pub use invoice_set::{InvoiceSetPrinter, InvoiceSetReport, InvoiceSetTiming};
pub use model::{InvoiceRecord, KitchenOrder, OrderItem};
pub use print::{BrowserPresenter, HeadlessPresenter, Presenter, PrintConfig};
pub use qr::{PngQrRenderer, QrRenderer};

const DEFAULT_LOG_FILTER: &str = "info,cafe_receipts_lib=debug";

// ============================================================================
// Logging
// ============================================================================

/// Initialize structured logging (console + rolling daily file).
///
/// `RUST_LOG` overrides the default filter. The returned guard flushes the
/// file writer when dropped, so keep it alive until exit.
pub fn init_logging(log_dir: &Path) -> std::io::Result<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Prune old log files before setting up the appender
    diagnostics::prune_logs_in(log_dir, diagnostics::MAX_LOG_FILES);
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, diagnostics::LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        version = %diagnostics::version_line(),
        log_dir = %log_dir.display(),
        "Starting cafe receipts"
    );
    Ok(guard)
}
