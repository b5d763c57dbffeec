//! Build typed printable documents from POS records.
//!
//! Everything here is a pure function of its inputs: amounts come from
//! [`VatBreakdown`], QR images from the supplied renderer. A QR that fails to
//! render is logged and left out; the document itself is still produced.

use chrono::DateTime;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::DocumentError;
use crate::model::{present, InvoiceRecord, KitchenOrder, OrderItem, ZatcaFields};
use crate::qr::{render_or_omit, QrRenderer};
use crate::receipt_renderer::{
    self, CashierCopyDoc, CustomerReceiptDoc, InvoiceLine, KitchenTicketDoc, LayoutConfig,
    PromoLine, ReceiptDocument, ReceiptItem, TaxInvoiceDoc,
};
use crate::vat::VatBreakdown;
use crate::zatca;

/// `2026-03-01T10:15:00+03:00` -> `2026-03-01 10:15`; unparseable input is
/// shown as given.
pub fn display_timestamp(value: &str) -> String {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| trimmed.to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    present(value).map(str::to_string)
}

fn receipt_item(item: &OrderItem) -> ReceiptItem {
    ReceiptItem {
        name: item.product_name_local.trim().to_string(),
        name_alt: non_empty(item.product_name_alt.as_deref()),
        quantity: item.quantity,
    }
}

fn invoice_line(item: &OrderItem) -> InvoiceLine {
    InvoiceLine {
        name: item.product_name_local.trim().to_string(),
        name_alt: non_empty(item.product_name_alt.as_deref()),
        quantity: item.quantity,
        unit_price: item.unit_price,
        line_discount: item.line_discount,
        line_total: item.net(),
    }
}

pub fn build_kitchen_ticket(order: &KitchenOrder) -> KitchenTicketDoc {
    KitchenTicketDoc {
        order_number: order.order_number.trim().to_string(),
        created_at: display_timestamp(&order.created_at),
        table_number: non_empty(order.table_number.as_deref()),
        order_type: order.order_type,
        priority: order.priority,
        items: order.items.iter().map(receipt_item).collect(),
        notes: non_empty(order.notes.as_deref()),
    }
}

/// ZATCA TLV payload (base64) for a record.
pub fn zatca_payload(record: &InvoiceRecord, config: &StoreConfig) -> Result<String, DocumentError> {
    let breakdown = VatBreakdown::compute(record, config.vat_rate);
    let fields = ZatcaFields::from_invoice(record, &config.seller, &breakdown)?;
    Ok(zatca::encode_tlv(&fields)?)
}

pub fn build_tax_invoice(
    record: &InvoiceRecord,
    config: &StoreConfig,
    qr: &dyn QrRenderer,
) -> Result<TaxInvoiceDoc, DocumentError> {
    record.validate()?;
    let breakdown = VatBreakdown::compute(record, config.vat_rate);
    let fields = ZatcaFields::from_invoice(record, &config.seller, &breakdown)?;
    let payload = zatca::encode_tlv(&fields)?;

    let zatca_qr = render_or_omit(qr, &payload, &config.zatca_qr, "zatca");
    let tracking_qr = config
        .tracking_url(&record.order_number)
        .and_then(|url| render_or_omit(qr, &url, &config.tracking_qr, "tracking"));

    let promo = record
        .discount
        .as_ref()
        .filter(|_| breakdown.promo_discount > Decimal::ZERO)
        .map(|discount| PromoLine {
            code: discount.code.trim().to_string(),
            percentage: Some(discount.percentage).filter(|pct| *pct > Decimal::ZERO),
        });

    debug!(
        order_number = %record.order_number,
        net = %breakdown.net_ex_vat,
        vat = %breakdown.vat_amount,
        zatca_qr = zatca_qr.is_some(),
        tracking_qr = tracking_qr.is_some(),
        "Tax invoice built"
    );

    Ok(TaxInvoiceDoc {
        invoice_number: non_empty(record.invoice_number.as_deref())
            .unwrap_or_else(|| record.order_number.trim().to_string()),
        order_number: record.order_number.trim().to_string(),
        date: display_timestamp(&record.date),
        cashier: non_empty(Some(record.employee_name.as_str())),
        customer_name: non_empty(Some(record.customer_name.as_str())),
        customer_phone: non_empty(record.customer_phone.as_deref()),
        table_number: non_empty(record.table_number.as_deref()),
        order_type: record.order_type,
        branch_name: non_empty(record.branch_name.as_deref())
            .or_else(|| non_empty(config.seller.branch_name.as_deref())),
        branch_address: non_empty(record.branch_address.as_deref())
            .or_else(|| non_empty(config.seller.branch_address.as_deref())),
        payment_label: record.payment_label().to_string(),
        lines: record.items.iter().map(invoice_line).collect(),
        breakdown,
        promo,
        zatca_qr,
        tracking_qr,
    })
}

pub fn build_customer_receipt(
    record: &InvoiceRecord,
    config: &StoreConfig,
    qr: &dyn QrRenderer,
) -> Result<CustomerReceiptDoc, DocumentError> {
    record.validate()?;
    let tracking_qr = config
        .tracking_url(&record.order_number)
        .and_then(|url| render_or_omit(qr, &url, &config.tracking_qr, "tracking"));
    Ok(CustomerReceiptDoc {
        order_number: record.order_number.trim().to_string(),
        date: display_timestamp(&record.date),
        order_type: record.order_type,
        customer_name: non_empty(Some(record.customer_name.as_str())),
        items: record.items.iter().map(receipt_item).collect(),
        total_paid: crate::vat::round2(record.total),
        tracking_qr,
    })
}

pub fn build_cashier_copy(
    record: &InvoiceRecord,
    config: &StoreConfig,
) -> Result<CashierCopyDoc, DocumentError> {
    record.validate()?;
    let breakdown = VatBreakdown::compute(record, config.vat_rate);
    Ok(CashierCopyDoc {
        order_number: record.order_number.trim().to_string(),
        invoice_number: non_empty(record.invoice_number.as_deref()),
        date: display_timestamp(&record.date),
        cashier: non_empty(Some(record.employee_name.as_str())),
        lines: record.items.iter().map(invoice_line).collect(),
        subtotal: breakdown.items_gross,
        discount_total: breakdown.discounts_total(),
        grand_total: breakdown.total_with_vat,
        payment_method: record.payment_method,
        payment_label: record.payment_label().to_string(),
    })
}

pub fn kitchen_ticket_html(order: &KitchenOrder, config: &StoreConfig) -> String {
    let document = ReceiptDocument::KitchenTicket(build_kitchen_ticket(order));
    receipt_renderer::render_html(&document, &LayoutConfig::from_store(config))
}

pub fn tax_invoice_html(
    record: &InvoiceRecord,
    config: &StoreConfig,
    qr: &dyn QrRenderer,
) -> Result<String, DocumentError> {
    let document = ReceiptDocument::TaxInvoice(build_tax_invoice(record, config, qr)?);
    Ok(receipt_renderer::render_html(
        &document,
        &LayoutConfig::from_store(config),
    ))
}

pub fn customer_receipt_html(
    record: &InvoiceRecord,
    config: &StoreConfig,
    qr: &dyn QrRenderer,
) -> Result<String, DocumentError> {
    let document = ReceiptDocument::CustomerReceipt(build_customer_receipt(record, config, qr)?);
    Ok(receipt_renderer::render_html(
        &document,
        &LayoutConfig::from_store(config),
    ))
}

pub fn cashier_copy_html(
    record: &InvoiceRecord,
    config: &StoreConfig,
) -> Result<String, DocumentError> {
    let document = ReceiptDocument::CashierCopy(build_cashier_copy(record, config)?);
    Ok(receipt_renderer::render_html(
        &document,
        &LayoutConfig::from_store(config),
    ))
}


#[cfg(test)]
mod tests {
    use super::test_support::StubQr;
    use super::*;
    use crate::config::test_config;
    use crate::model::{DiscountInfo, KitchenOrder, OrderType, PaymentMethod, Priority};
    use crate::qr::PngQrRenderer;

    fn record() -> InvoiceRecord {
        InvoiceRecord {
            order_number: "A-1001".to_string(),
            invoice_number: Some("INV-2026-0042".to_string()),
            total: Decimal::new(11400, 2),
            items: vec![OrderItem {
                product_name_local: "V60 Ethiopia".to_string(),
                product_name_alt: Some("في ٦٠ اثيوبيا".to_string()),
                quantity: 1,
                unit_price: Decimal::new(100, 0),
                line_discount: Decimal::ZERO,
            }],
            date: "2026-03-01T10:15:00+03:00".to_string(),
            customer_name: "Walk-in".to_string(),
            employee_name: "Sara".to_string(),
            payment_method: PaymentMethod::Cash,
            payment_method_label: "Cash".to_string(),
            ..InvoiceRecord::default()
        }
    }

    /// Pull the value cell of a `.line` row by its label.
    fn line_value(html: &str, label: &str) -> String {
        let marker = format!("<span>{label}</span><span>");
        let start = html.find(&marker).expect("label present") + marker.len();
        let end = html[start..].find("</span>").expect("closing span") + start;
        html[start..end].to_string()
    }

    #[test]
    fn tax_invoice_shows_114_scenario_breakdown() {
        let html = tax_invoice_html(&record(), &test_config(), &StubQr::default()).unwrap();
        assert_eq!(line_value(&html, "Net before VAT"), "99.13");
        assert_eq!(line_value(&html, "VAT (15%)"), "14.87");
        assert!(html.contains("114.00 SAR"));
        assert!(html.contains("Simplified Tax Invoice"));
        assert!(html.contains("310122393500003"));
    }

    #[test]
    fn displayed_net_plus_vat_matches_total_with_discounts() {
        let config = test_config();
        let mut rec = record();
        rec.items[0].line_discount = Decimal::new(7, 0);
        rec.discount = Some(DiscountInfo {
            code: "SPRING".to_string(),
            percentage: Decimal::new(10, 0),
            amount: Decimal::ZERO,
        });
        rec.invoice_discount = Some(Decimal::new(3, 0));
        rec.total = Decimal::new(8070, 2);

        let html = tax_invoice_html(&rec, &config, &StubQr::default()).unwrap();
        let net: Decimal = line_value(&html, "Net before VAT").parse().unwrap();
        let vat: Decimal = line_value(&html, "VAT (15%)").parse().unwrap();
        assert_eq!(net + vat, Decimal::new(8070, 2));
        assert!(html.contains("Promo SPRING (10%)"));
        assert!(html.contains("Item discounts (excl. VAT)"));
        assert!(html.contains("Invoice discount (excl. VAT)"));
    }

    #[test]
    fn ex_vat_rows_add_up_to_printed_net() {
        let mut rec = record();
        rec.items[0].unit_price = Decimal::new(40, 0);
        rec.items[0].quantity = 3;
        rec.items[0].line_discount = Decimal::new(350, 2);
        rec.discount = Some(DiscountInfo {
            code: "TEN".to_string(),
            percentage: Decimal::new(10, 0),
            amount: Decimal::ZERO,
        });
        rec.invoice_discount = Some(Decimal::new(275, 2));
        rec.total = Decimal::new(10210, 2);

        let html = tax_invoice_html(&rec, &test_config(), &StubQr::default()).unwrap();
        let row = |label: &str| -> Decimal {
            line_value(&html, label).trim_start_matches('-').parse().unwrap()
        };
        let rows = row("Subtotal (excl. VAT)")
            - row("Item discounts (excl. VAT)")
            - row("Promo TEN (10%)")
            - row("Invoice discount (excl. VAT)");
        assert_eq!(rows, row("Net before VAT"));
    }

    #[test]
    fn non_iso_date_fails_tax_invoice_only() {
        let mut rec = record();
        rec.date = "01/03/2026 10:15".to_string();
        assert!(matches!(
            tax_invoice_html(&rec, &test_config(), &StubQr::default()),
            Err(DocumentError::InvalidRecord(_))
        ));
        let copy = cashier_copy_html(&rec, &test_config()).unwrap();
        assert!(copy.contains("01/03/2026 10:15"));
    }

    #[test]
    fn tax_invoice_is_byte_identical_across_calls() {
        let config = test_config();
        let rec = record();
        let first = tax_invoice_html(&rec, &config, &PngQrRenderer).unwrap();
        let second = tax_invoice_html(&rec, &config, &PngQrRenderer).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("data:image/png;base64,"));
    }

    #[test]
    fn omitted_optional_fields_leave_no_markup() {
        let html = tax_invoice_html(&record(), &test_config(), &StubQr::default()).unwrap();
        for absent in ["undefined", "null", "None", "<span>Phone</span>", "<span>Table</span>", "<span>Order Type</span>", "Promo"] {
            assert!(!html.contains(absent), "unexpected {absent:?} in invoice");
        }
    }

    #[test]
    fn present_optional_fields_are_rendered() {
        let mut rec = record();
        rec.customer_phone = Some("0501234567".to_string());
        rec.table_number = Some("12".to_string());
        rec.order_type = Some(OrderType::DineIn);
        let html = tax_invoice_html(&rec, &test_config(), &StubQr::default()).unwrap();
        assert_eq!(line_value(&html, "Phone"), "0501234567");
        assert_eq!(line_value(&html, "Table"), "12");
        assert!(html.contains("Dine-in / محلي"));
    }

    #[test]
    fn blank_phone_is_treated_as_absent() {
        let mut rec = record();
        rec.customer_phone = Some("   ".to_string());
        let html = tax_invoice_html(&rec, &test_config(), &StubQr::default()).unwrap();
        assert!(!html.contains("<span>Phone</span>"));
    }

    #[test]
    fn zatca_qr_failure_still_produces_invoice() {
        let qr = StubQr::failing_on(1);
        let doc = build_tax_invoice(&record(), &test_config(), &qr).unwrap();
        assert!(doc.zatca_qr.is_none());
        assert!(doc.tracking_qr.is_some());
        let html = receipt_renderer::render_html(
            &ReceiptDocument::TaxInvoice(doc),
            &LayoutConfig::from_store(&test_config()),
        );
        assert!(html.contains("Net before VAT"));
        assert!(!html.contains("ZATCA e-invoice"));
    }

    #[test]
    fn oversized_seller_name_is_a_tlv_error() {
        let mut config = test_config();
        config.seller.name = "س".repeat(150);
        let err = build_tax_invoice(&record(), &config, &StubQr::default()).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Tlv(crate::error::TlvError::ValueTooLong { tag: 1, len: 300 })
        ));
    }

    #[test]
    fn zatca_payload_decodes_to_invoice_fields() {
        let payload = zatca_payload(&record(), &test_config()).unwrap();
        let fields = zatca::decode_tlv(&payload).unwrap();
        assert_eq!(fields.seller_name, "Morning Brew Cafe");
        assert_eq!(fields.vat_number, "310122393500003");
        assert_eq!(fields.timestamp, "2026-03-01T07:15:00Z");
        assert_eq!(fields.total_with_vat, "114.00");
        assert_eq!(fields.vat_amount, "14.87");
    }

    #[test]
    fn padded_max_length_seller_name_validates_and_encodes() {
        let mut config = test_config();
        config.seller.name = format!("  {}  ", "n".repeat(zatca::MAX_TLV_VALUE_LEN));
        config.seller.vat_number = " 310122393500003 ".to_string();
        config.validate().unwrap();

        let payload = zatca_payload(&record(), &config).unwrap();
        let fields = zatca::decode_tlv(&payload).unwrap();
        assert_eq!(fields.seller_name.len(), zatca::MAX_TLV_VALUE_LEN);
        assert_eq!(fields.vat_number, "310122393500003");
    }

    #[test]
    fn no_tracking_url_means_no_tracking_qr() {
        let mut config = test_config();
        config.tracking_base_url = None;
        let qr = StubQr::default();
        let doc = build_customer_receipt(&record(), &config, &qr).unwrap();
        assert!(doc.tracking_qr.is_none());
        assert_eq!(qr.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn customer_receipt_has_total_and_tracking_qr() {
        let mut rec = record();
        rec.order_type = Some(OrderType::Pickup);
        let html = customer_receipt_html(&rec, &test_config(), &StubQr::default()).unwrap();
        assert!(html.contains("Total paid"));
        assert!(html.contains("114.00 SAR"));
        assert!(html.contains("badge-pickup"));
        assert!(html.contains("Scan to track your order"));
    }

    #[test]
    fn cashier_copy_prices_items_and_signature_for_card() {
        let mut rec = record();
        rec.payment_method = PaymentMethod::Card;
        rec.payment_method_label = "mada".to_string();
        rec.items[0].line_discount = Decimal::new(5, 0);
        rec.total = Decimal::new(95, 0);
        let html = cashier_copy_html(&rec, &test_config()).unwrap();
        assert_eq!(line_value(&html, "Subtotal"), "100.00");
        assert_eq!(line_value(&html, "Discount"), "-5.00");
        assert_eq!(line_value(&html, "1x V60 Ethiopia"), "95.00");
        assert_eq!(line_value(&html, "Payment"), "mada");
        assert!(html.contains("Customer signature"));
    }

    #[test]
    fn urgent_kitchen_ticket_renders_flag() {
        let order = KitchenOrder {
            order_number: "K-7".to_string(),
            created_at: "2026-03-01T10:15:00Z".to_string(),
            priority: Priority::Urgent,
            notes: Some("No sugar in the second cup".to_string()),
            items: record().items,
            ..KitchenOrder::default()
        };
        let html = kitchen_ticket_html(&order, &test_config());
        assert!(html.contains("class=\"urgent-flag\""));
        assert!(html.contains("No sugar in the second cup"));
        assert!(html.contains("1x V60 Ethiopia"));
        assert!(!html.contains("100.00"));
    }

    #[test]
    fn normal_kitchen_ticket_omits_flag() {
        let order = KitchenOrder {
            order_number: "K-8".to_string(),
            priority: Priority::Normal,
            items: record().items,
            ..KitchenOrder::default()
        };
        let html = kitchen_ticket_html(&order, &test_config());
        assert!(!html.contains("class=\"urgent-flag\""));
        assert!(!html.contains("class=\"notes\""));
    }

    #[test]
    fn display_timestamp_falls_back_to_raw_text() {
        assert_eq!(display_timestamp("2026-03-01T10:15:00Z"), "2026-03-01 10:15");
        assert_eq!(display_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn invalid_record_is_rejected_before_rendering() {
        let mut rec = record();
        rec.order_number = " ".to_string();
        assert!(matches!(
            cashier_copy_html(&rec, &test_config()),
            Err(DocumentError::InvalidRecord(_))
        ));
    }
}
