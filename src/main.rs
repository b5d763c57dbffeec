use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use tracing::info;

use cafe_receipts_lib::{
    diagnostics, documents, init_logging, zatca, BrowserPresenter, InvoiceRecord,
    InvoiceSetPrinter, KitchenOrder, PngQrRenderer, Presenter, StoreConfig,
};
use cafe_receipts_lib::print::DirectoryPresenter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Kind {
    TaxInvoice,
    Receipt,
    Cashier,
    Kitchen,
}

#[derive(Parser, Debug)]
#[command(name = "cafe-receipts", version = version(), about = "Print cafe POS documents")]
struct Cli {
    /// Store configuration (JSON)
    #[arg(short = 'c', long = "config", global = true, default_value = "store.json")]
    config: PathBuf,

    /// Log directory (defaults to the platform data dir)
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print tax invoice, tracking receipt and cashier copy for an order
    InvoiceSet {
        #[arg(short = 'r', long = "record")]
        record: PathBuf,

        /// Write documents to DIR instead of opening a browser
        #[arg(long = "headless", value_name = "DIR")]
        headless: Option<PathBuf>,
    },
    /// Print a kitchen ticket
    Kitchen {
        #[arg(short = 't', long = "ticket")]
        ticket: PathBuf,

        #[arg(long = "headless", value_name = "DIR")]
        headless: Option<PathBuf>,
    },
    /// Render one document to an HTML file without printing
    Render {
        #[arg(long = "kind", value_enum)]
        kind: Kind,

        /// Invoice record, or kitchen order for `--kind kitchen`
        #[arg(short = 'r', long = "record")]
        record: PathBuf,

        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
    /// Decode a ZATCA QR payload (base64 TLV)
    DecodeQr { payload: String },
    /// Show build info and where logs and config are read from
    About,
}

fn version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("BUILD_GIT_SHA"),
        " ",
        env!("BUILD_TIMESTAMP"),
        ")"
    )
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn load_config(path: &Path) -> Result<StoreConfig> {
    StoreConfig::load(path).with_context(|| format!("loading store config {}", path.display()))
}

fn presenter(headless: Option<PathBuf>) -> Arc<dyn Presenter> {
    match headless {
        Some(dir) => Arc::new(DirectoryPresenter::new(dir)),
        None => Arc::new(BrowserPresenter::new(
            std::env::temp_dir().join("cafe-receipts"),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::DecodeQr { payload } = &cli.command {
        let fields = zatca::decode_tlv(payload)?;
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    let log_dir = cli.log_dir.clone().unwrap_or_else(diagnostics::get_log_dir);
    if let Command::About = &cli.command {
        let info = diagnostics::about_info(&log_dir, &cli.config);
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let _guard = init_logging(&log_dir)
        .with_context(|| format!("initializing logs in {}", log_dir.display()))?;

    let config = load_config(&cli.config)?;
    let qr = Arc::new(PngQrRenderer);

    match cli.command {
        Command::InvoiceSet { record, headless } => {
            let record: InvoiceRecord = read_json(&record)?;
            let printer = InvoiceSetPrinter::new(config, qr, presenter(headless));
            let report = printer.print_full_invoice_set(&record).await;
            for step in &report.steps {
                println!("{}: {:?}", step.kind.as_str(), step.outcome);
            }
            if report.dispatched() == 0 {
                bail!("no document of order {} was printed", record.order_number);
            }
        }
        Command::Kitchen { ticket, headless } => {
            let order: KitchenOrder = read_json(&ticket)?;
            let printer = InvoiceSetPrinter::new(config, qr, presenter(headless));
            match printer.print_kitchen_ticket(&order) {
                Some(handle) => println!("kitchen_ticket: {}", handle.name),
                None => println!("kitchen_ticket: hidden fallback"),
            }
        }
        Command::Render {
            kind,
            record,
            output,
        } => {
            let html = match kind {
                Kind::Kitchen => {
                    let order: KitchenOrder = read_json(&record)?;
                    documents::kitchen_ticket_html(&order, &config)
                }
                Kind::TaxInvoice => {
                    let record: InvoiceRecord = read_json(&record)?;
                    documents::tax_invoice_html(&record, &config, qr.as_ref())?
                }
                Kind::Receipt => {
                    let record: InvoiceRecord = read_json(&record)?;
                    documents::customer_receipt_html(&record, &config, qr.as_ref())?
                }
                Kind::Cashier => {
                    let record: InvoiceRecord = read_json(&record)?;
                    documents::cashier_copy_html(&record, &config)?
                }
            };
            std::fs::write(&output, html)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(kind = ?kind, output = %output.display(), "Document rendered");
        }
        Command::DecodeQr { .. } | Command::About => {}
    }

    Ok(())
}
