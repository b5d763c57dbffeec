//! Typed printable documents and their HTML templates.
//!
//! Each [`ReceiptDocument`] variant carries display-ready fields (strings and
//! rounded amounts). [`render_html`] turns one into a self-contained page
//! sized by [`LayoutConfig`]; builders in `documents` fill the structs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::html::HtmlBuilder;
use crate::model::{OrderType, PaymentMethod, Priority};
use crate::vat::{money, percent_badge, VatBreakdown};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ReceiptItem {
    pub name: String,
    #[serde(default)]
    pub name_alt: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InvoiceLine {
    pub name: String,
    #[serde(default)]
    pub name_alt: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub line_discount: Decimal,
    /// VAT inclusive, after the line discount.
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KitchenTicketDoc {
    pub order_number: String,
    pub created_at: String,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoLine {
    pub code: String,
    #[serde(default)]
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxInvoiceDoc {
    pub invoice_number: String,
    pub order_number: String,
    pub date: String,
    #[serde(default)]
    pub cashier: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub branch_address: Option<String>,
    pub payment_label: String,
    pub lines: Vec<InvoiceLine>,
    pub breakdown: VatBreakdown,
    #[serde(default)]
    pub promo: Option<PromoLine>,
    #[serde(default)]
    pub zatca_qr: Option<String>,
    #[serde(default)]
    pub tracking_qr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CustomerReceiptDoc {
    pub order_number: String,
    pub date: String,
    #[serde(default)]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
    pub total_paid: Decimal,
    #[serde(default)]
    pub tracking_qr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CashierCopyDoc {
    pub order_number: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub date: String,
    #[serde(default)]
    pub cashier: Option<String>,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub grand_total: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "doc", rename_all = "snake_case")]
pub enum ReceiptDocument {
    KitchenTicket(KitchenTicketDoc),
    TaxInvoice(TaxInvoiceDoc),
    CustomerReceipt(CustomerReceiptDoc),
    CashierCopy(CashierCopyDoc),
}

impl ReceiptDocument {
    pub fn title(&self) -> String {
        match self {
            Self::KitchenTicket(doc) => format!("Kitchen Ticket #{}", doc.order_number),
            Self::TaxInvoice(doc) => format!("Tax Invoice {}", doc.invoice_number),
            Self::CustomerReceipt(doc) => format!("Receipt #{}", doc.order_number),
            Self::CashierCopy(doc) => format!("Cashier Copy #{}", doc.order_number),
        }
    }
}

/// Store identity and wording shared by every document.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub organization_name: String,
    pub organization_name_alt: Option<String>,
    pub vat_number: String,
    pub vat_rate: Decimal,
    pub currency: String,
    pub footer_text: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::from_store(&StoreConfig::default())
    }
}

impl LayoutConfig {
    pub fn from_store(config: &StoreConfig) -> Self {
        Self {
            organization_name: config.seller.name.trim().to_string(),
            organization_name_alt: config
                .seller
                .name_alt
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            vat_number: config.seller.vat_number.trim().to_string(),
            vat_rate: config.vat_rate,
            currency: config.currency.clone(),
            footer_text: config.footer().to_string(),
        }
    }
}

const KITCHEN_CSS: &str = r#".kitchen-item { font-size: 14px; font-weight: bold; margin: 2px 0; }
.urgent-flag { background: #111; color: #fff; font-size: 16px; font-weight: bold; text-align: center; padding: 4px; margin: 4px 0; letter-spacing: 2px; }
.notes { border: 1px solid #111; padding: 4px; margin-top: 6px; font-size: 12px; white-space: pre-wrap; }
"#;

const INVOICE_CSS: &str = r#".qr-row { display: flex; justify-content: space-around; align-items: flex-start; }
.qr-row figure { margin: 0; text-align: center; }
.signature { margin-top: 28px; border-top: 1px solid #111; padding-top: 2px; text-align: center; font-size: 9px; }
"#;

fn push_item_names(body: &mut HtmlBuilder, item: &ReceiptItem, strong: bool) {
    let label = format!("{}x {}", item.quantity, item.name);
    if strong {
        body.raw(&format!(
            "<div class=\"kitchen-item\">{}</div>",
            crate::html::esc(&label)
        ));
    } else {
        body.line(&label, "");
    }
    if let Some(alt) = item.name_alt.as_deref() {
        body.alt(alt);
    }
}

fn push_invoice_line(body: &mut HtmlBuilder, line: &InvoiceLine, show_discount: bool) {
    body.line(
        &format!("{}x {}", line.quantity, line.name),
        &money(line.line_total),
    );
    if let Some(alt) = line.name_alt.as_deref() {
        body.alt(alt);
    }
    body.note(&format!("@ {}", money(line.unit_price)));
    if show_discount && line.line_discount > Decimal::ZERO {
        body.note(&format!("Discount -{}", money(line.line_discount)));
    }
}

fn push_qr(body: &mut HtmlBuilder, src: &str, alt: &str, caption: &str) {
    body.raw("<figure>");
    body.image("qr", src, alt);
    body.note(caption);
    body.raw("</figure>");
}

fn push_store_header(body: &mut HtmlBuilder, cfg: &LayoutConfig) {
    body.center_strong(&cfg.organization_name);
    if let Some(alt) = cfg.organization_name_alt.as_deref() {
        body.center(alt);
    }
}

fn render_kitchen_ticket(doc: &KitchenTicketDoc) -> String {
    let mut body = HtmlBuilder::new(&format!("Kitchen Ticket #{}", doc.order_number))
        .style(KITCHEN_CSS);
    body.center_strong("KITCHEN TICKET");
    if doc.priority == Priority::Urgent {
        body.raw("<div class=\"urgent-flag\">URGENT / عاجل</div>");
    }
    body.open_section("section", None)
        .strong_line("Order", &format!("#{}", doc.order_number));
    if let Some(table) = doc.table_number.as_deref() {
        body.strong_line("Table", table);
    }
    if let Some(order_type) = doc.order_type {
        body.line("Type", order_type.label());
    }
    if !doc.created_at.is_empty() {
        body.line("Time", &doc.created_at);
    }
    body.close_section();

    body.open_section("section", Some("Items"));
    if doc.items.is_empty() {
        body.note("No items");
    } else {
        for item in &doc.items {
            push_item_names(&mut body, item, true);
        }
    }
    body.close_section();

    if let Some(notes) = doc.notes.as_deref() {
        body.raw(&format!(
            "<div class=\"notes\"><strong>Notes:</strong> {}</div>",
            crate::html::esc(notes)
        ));
    }
    body.finish()
}

fn render_tax_invoice(doc: &TaxInvoiceDoc, cfg: &LayoutConfig) -> String {
    let mut body = HtmlBuilder::new(&format!("Tax Invoice {}", doc.invoice_number))
        .style(INVOICE_CSS);
    push_store_header(&mut body, cfg);
    if let Some(branch) = doc.branch_name.as_deref() {
        body.center(branch);
    }
    if let Some(address) = doc.branch_address.as_deref() {
        body.center(address);
    }
    body.center(&format!("VAT No. / الرقم الضريبي: {}", cfg.vat_number));
    body.open_section("section center", None)
        .center_strong("Simplified Tax Invoice")
        .center("فاتورة ضريبية مبسطة")
        .close_section();

    body.open_section("section", None)
        .line("Invoice No.", &doc.invoice_number)
        .line("Order", &format!("#{}", doc.order_number))
        .line("Date", &doc.date);
    if let Some(cashier) = doc.cashier.as_deref() {
        body.line("Cashier", cashier);
    }
    if let Some(customer) = doc.customer_name.as_deref() {
        body.line("Customer", customer);
    }
    if let Some(phone) = doc.customer_phone.as_deref() {
        body.line("Phone", phone);
    }
    if let Some(table) = doc.table_number.as_deref() {
        body.line("Table", table);
    }
    if let Some(order_type) = doc.order_type {
        body.line(
            "Order Type",
            &format!("{} / {}", order_type.label(), order_type.label_alt()),
        );
    }
    body.line("Payment", &doc.payment_label);
    body.close_section();

    body.open_section("section", Some("Items"));
    if doc.lines.is_empty() {
        body.note("No items");
    } else {
        for line in &doc.lines {
            push_invoice_line(&mut body, line, true);
        }
    }
    body.close_section();

    let vat = &doc.breakdown;
    body.open_section("section", Some("Totals"))
        .line("Subtotal (excl. VAT)", &money(vat.subtotal_ex_vat));
    if vat.line_discounts > Decimal::ZERO {
        body.line(
            "Item discounts (excl. VAT)",
            &format!("-{}", money(vat.line_discounts_ex_vat)),
        );
    }
    if vat.promo_discount > Decimal::ZERO {
        let label = match &doc.promo {
            Some(PromoLine {
                code,
                percentage: Some(pct),
            }) => format!("Promo {code} ({})", percent_badge(*pct)),
            Some(PromoLine { code, .. }) => format!("Promo {code}"),
            None => "Promo".to_string(),
        };
        body.line(&label, &format!("-{}", money(vat.promo_discount_ex_vat)));
    }
    if vat.invoice_discount > Decimal::ZERO {
        body.line(
            "Invoice discount (excl. VAT)",
            &format!("-{}", money(vat.invoice_discount_ex_vat)),
        );
    }
    body.line("Net before VAT", &money(vat.net_ex_vat))
        .line(
            &format!("VAT ({})", percent_badge(vat.vat_rate * Decimal::ONE_HUNDRED)),
            &money(vat.vat_amount),
        )
        .strong_line(
            "Total incl. VAT / الإجمالي",
            &format!("{} {}", money(vat.total_with_vat), cfg.currency),
        )
        .close_section();

    if doc.zatca_qr.is_some() || doc.tracking_qr.is_some() {
        body.raw("<div class=\"section qr-row\">");
        if let Some(src) = doc.zatca_qr.as_deref() {
            push_qr(&mut body, src, "ZATCA QR", "ZATCA e-invoice");
        }
        if let Some(src) = doc.tracking_qr.as_deref() {
            push_qr(&mut body, src, "Order tracking QR", "Track your order");
        }
        body.raw("</div>");
    }
    body.open_section("section center note", None)
        .note(&cfg.footer_text)
        .close_section();
    body.finish()
}

fn render_customer_receipt(doc: &CustomerReceiptDoc, cfg: &LayoutConfig) -> String {
    let mut body = HtmlBuilder::new(&format!("Receipt #{}", doc.order_number));
    push_store_header(&mut body, cfg);
    body.open_section("section center", None)
        .center_strong(&format!("Order #{}", doc.order_number));
    if let Some(order_type) = doc.order_type {
        body.badge(
            order_type.css_class(),
            &format!("{} / {}", order_type.label(), order_type.label_alt()),
        );
    }
    body.center(&doc.date);
    if let Some(customer) = doc.customer_name.as_deref() {
        body.center(customer);
    }
    body.close_section();

    body.open_section("section", Some("Items"));
    if doc.items.is_empty() {
        body.note("No items");
    } else {
        for item in &doc.items {
            push_item_names(&mut body, item, false);
        }
    }
    body.close_section();

    body.open_section("section", None)
        .strong_line(
            "Total paid",
            &format!("{} {}", money(doc.total_paid), cfg.currency),
        )
        .close_section();

    if let Some(src) = doc.tracking_qr.as_deref() {
        body.open_section("section center", None);
        body.image("qr", src, "Order tracking QR");
        body.note("Scan to track your order").close_section();
    }
    body.open_section("section center note", None)
        .note(&cfg.footer_text)
        .close_section();
    body.finish()
}

fn render_cashier_copy(doc: &CashierCopyDoc, cfg: &LayoutConfig) -> String {
    let mut body = HtmlBuilder::new(&format!("Cashier Copy #{}", doc.order_number))
        .style(INVOICE_CSS);
    body.center_strong(&cfg.organization_name)
        .center_strong("CASHIER COPY");
    body.open_section("section", None)
        .line("Order", &format!("#{}", doc.order_number));
    if let Some(invoice) = doc.invoice_number.as_deref() {
        body.line("Invoice No.", invoice);
    }
    body.line("Date", &doc.date);
    if let Some(cashier) = doc.cashier.as_deref() {
        body.line("Cashier", cashier);
    }
    body.close_section();

    body.open_section("section", Some("Items"));
    if doc.lines.is_empty() {
        body.note("No items");
    } else {
        for line in &doc.lines {
            push_invoice_line(&mut body, line, false);
        }
    }
    body.close_section();

    body.open_section("section", None)
        .line("Subtotal", &money(doc.subtotal));
    if doc.discount_total > Decimal::ZERO {
        body.line("Discount", &format!("-{}", money(doc.discount_total)));
    }
    body.strong_line(
        "TOTAL",
        &format!("{} {}", money(doc.grand_total), cfg.currency),
    )
    .line("Payment", &doc.payment_label)
    .close_section();

    if doc.payment_method.needs_signature() {
        body.raw("<div class=\"signature\">Customer signature</div>");
    }
    body.finish()
}

/// Render any document to a complete, self-contained HTML string.
pub fn render_html(document: &ReceiptDocument, cfg: &LayoutConfig) -> String {
    match document {
        ReceiptDocument::KitchenTicket(doc) => render_kitchen_ticket(doc),
        ReceiptDocument::TaxInvoice(doc) => render_tax_invoice(doc, cfg),
        ReceiptDocument::CustomerReceipt(doc) => render_customer_receipt(doc, cfg),
        ReceiptDocument::CashierCopy(doc) => render_cashier_copy(doc, cfg),
    }
}
