//! Multi-document printing for one order.
//!
//! A full invoice set is the tax invoice, the customer (tracking) receipt and
//! the cashier copy. Windows are opened one after another with a fixed delay
//! in between so the browser does not throttle simultaneous pop-ups. The
//! delays are plain timers, not completion signals: a step is considered done
//! once its document has been handed to the presenter.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::StoreConfig;
use crate::documents;
use crate::error::DocumentError;
use crate::model::{InvoiceRecord, KitchenOrder};
use crate::print::{print_document, Presenter, WindowHandle};
use crate::qr::QrRenderer;
use crate::receipt_renderer::{self, LayoutConfig, ReceiptDocument};

/// Delays before each step of a full invoice set, relative to the previous
/// step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvoiceSetTiming {
    #[serde(default)]
    pub tax_invoice_delay_ms: u64,
    #[serde(default = "default_receipt_delay_ms")]
    pub receipt_delay_ms: u64,
    #[serde(default = "default_cashier_copy_delay_ms")]
    pub cashier_copy_delay_ms: u64,
}

fn default_receipt_delay_ms() -> u64 {
    500
}

fn default_cashier_copy_delay_ms() -> u64 {
    1000
}

impl Default for InvoiceSetTiming {
    fn default() -> Self {
        Self {
            tax_invoice_delay_ms: 0,
            receipt_delay_ms: default_receipt_delay_ms(),
            cashier_copy_delay_ms: default_cashier_copy_delay_ms(),
        }
    }
}

impl InvoiceSetTiming {
    /// No waiting between steps.
    pub fn immediate() -> Self {
        Self {
            tax_invoice_delay_ms: 0,
            receipt_delay_ms: 0,
            cashier_copy_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    TaxInvoice,
    CustomerReceipt,
    CashierCopy,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaxInvoice => "tax_invoice",
            Self::CustomerReceipt => "customer_receipt",
            Self::CashierCopy => "cashier_copy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Handed to the presenter; `None` means the hidden fallback was used.
    Dispatched(Option<WindowHandle>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub kind: DocumentKind,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceSetReport {
    pub steps: Vec<StepReport>,
}

impl InvoiceSetReport {
    pub fn dispatched(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Dispatched(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.dispatched()
    }
}

/// Generates and dispatches documents for orders.
///
/// Stateless apart from its collaborators: printing the same record twice
/// produces two independent documents.
#[derive(Clone)]
pub struct InvoiceSetPrinter {
    config: StoreConfig,
    qr: Arc<dyn QrRenderer>,
    presenter: Arc<dyn Presenter>,
}

impl InvoiceSetPrinter {
    pub fn new(config: StoreConfig, qr: Arc<dyn QrRenderer>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            config,
            qr,
            presenter,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Render `document` and hand it to the presenter under its own title.
    fn dispatch(&self, document: ReceiptDocument) -> Option<WindowHandle> {
        let layout = LayoutConfig::from_store(&self.config);
        let html = receipt_renderer::render_html(&document, &layout);
        print_document(
            self.presenter.as_ref(),
            &html,
            &document.title(),
            &self.config.print,
        )
    }

    pub fn print_tax_invoice(
        &self,
        record: &InvoiceRecord,
    ) -> Result<Option<WindowHandle>, DocumentError> {
        let doc = documents::build_tax_invoice(record, &self.config, self.qr.as_ref())?;
        Ok(self.dispatch(ReceiptDocument::TaxInvoice(doc)))
    }

    pub fn print_customer_receipt(
        &self,
        record: &InvoiceRecord,
    ) -> Result<Option<WindowHandle>, DocumentError> {
        let doc = documents::build_customer_receipt(record, &self.config, self.qr.as_ref())?;
        Ok(self.dispatch(ReceiptDocument::CustomerReceipt(doc)))
    }

    pub fn print_cashier_copy(
        &self,
        record: &InvoiceRecord,
    ) -> Result<Option<WindowHandle>, DocumentError> {
        let doc = documents::build_cashier_copy(record, &self.config)?;
        Ok(self.dispatch(ReceiptDocument::CashierCopy(doc)))
    }

    pub fn print_kitchen_ticket(&self, order: &KitchenOrder) -> Option<WindowHandle> {
        self.dispatch(ReceiptDocument::KitchenTicket(
            documents::build_kitchen_ticket(order),
        ))
    }

    fn run_step(&self, kind: DocumentKind, record: &InvoiceRecord) -> StepReport {
        let result = match kind {
            DocumentKind::TaxInvoice => self.print_tax_invoice(record),
            DocumentKind::CustomerReceipt => self.print_customer_receipt(record),
            DocumentKind::CashierCopy => self.print_cashier_copy(record),
        };
        let outcome = match result {
            Ok(handle) => StepOutcome::Dispatched(handle),
            Err(e) => {
                error!(
                    order_number = %record.order_number,
                    document = kind.as_str(),
                    error = %e,
                    "Invoice set step failed, continuing with remaining documents"
                );
                StepOutcome::Failed(e.to_string())
            }
        };
        StepReport { kind, outcome }
    }

    /// Tax invoice, then tracking receipt, then cashier copy.
    ///
    /// Each step is isolated: a failure is logged and recorded in the report
    /// and the remaining documents are still attempted.
    pub async fn print_full_invoice_set(&self, record: &InvoiceRecord) -> InvoiceSetReport {
        let timing = self.config.timing;
        let plan = [
            (DocumentKind::TaxInvoice, timing.tax_invoice_delay_ms),
            (DocumentKind::CustomerReceipt, timing.receipt_delay_ms),
            (DocumentKind::CashierCopy, timing.cashier_copy_delay_ms),
        ];

        let mut report = InvoiceSetReport::default();
        for (kind, delay_ms) in plan {
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            report.steps.push(self.run_step(kind, record));
        }

        info!(
            order_number = %record.order_number,
            dispatched = report.dispatched(),
            failed = report.failed(),
            "Invoice set printed"
        );
        report
    }
}
