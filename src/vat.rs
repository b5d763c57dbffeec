//! VAT back-calculation from VAT-inclusive amounts.
//!
//! Every amount the POS hands over already contains VAT: item prices, line
//! discounts, the promo discount and the flat invoice discount. The tax
//! component is split out of the record total only; the VAT amount is the
//! remainder `total - net`, so displayed lines always reconcile with the
//! displayed grand total. The same holds for the ex-VAT column: the subtotal
//! row is derived from the net and the rounded discount rows, so
//! `subtotal - discounts == net` to the cent.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::model::InvoiceRecord;

/// Round a money amount to 2 dp, midpoint away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Currency value with exactly two decimals.
pub fn money(value: Decimal) -> String {
    format!("{:.2}", round2(value))
}

/// Percentage badge text with no decimals, e.g. `15%`.
pub fn percent_badge(value: Decimal) -> String {
    let whole = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", whole.normalize())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatBreakdown {
    pub vat_rate: Decimal,
    /// Σ unit price × quantity, VAT inclusive.
    pub items_gross: Decimal,
    pub subtotal_ex_vat: Decimal,
    pub line_discounts: Decimal,
    pub line_discounts_ex_vat: Decimal,
    pub promo_discount: Decimal,
    pub promo_discount_ex_vat: Decimal,
    pub invoice_discount: Decimal,
    pub invoice_discount_ex_vat: Decimal,
    pub net_ex_vat: Decimal,
    pub vat_amount: Decimal,
    pub total_with_vat: Decimal,
}

impl VatBreakdown {
    pub fn compute(record: &InvoiceRecord, vat_rate: Decimal) -> Self {
        let divisor = Decimal::ONE + vat_rate;
        let ex_vat = |amount: Decimal| round2(amount / divisor);

        let items_gross = round2(record.items.iter().map(|item| item.gross()).sum());
        let line_discounts = round2(record.items.iter().map(|item| item.line_discount).sum());
        let promo_discount = promo_amount(record, items_gross - line_discounts);
        let invoice_discount = round2(record.invoice_discount.unwrap_or_default());

        let total_with_vat = round2(record.total);
        let net_ex_vat = ex_vat(total_with_vat);

        let line_discounts_ex_vat = ex_vat(line_discounts);
        let promo_discount_ex_vat = ex_vat(promo_discount);
        let invoice_discount_ex_vat = ex_vat(invoice_discount);
        // Absorbs per-row rounding drift; off by at most a few cents from
        // items_gross / (1 + rate) when the record is consistent.
        let subtotal_ex_vat =
            net_ex_vat + line_discounts_ex_vat + promo_discount_ex_vat + invoice_discount_ex_vat;

        Self {
            vat_rate,
            items_gross,
            subtotal_ex_vat,
            line_discounts,
            line_discounts_ex_vat,
            promo_discount,
            promo_discount_ex_vat,
            invoice_discount,
            invoice_discount_ex_vat,
            net_ex_vat,
            vat_amount: total_with_vat - net_ex_vat,
            total_with_vat,
        }
    }

    /// All discounts together, VAT inclusive.
    pub fn discounts_total(&self) -> Decimal {
        self.line_discounts + self.promo_discount + self.invoice_discount
    }

    /// All discounts together, as shown on the ex-VAT rows.
    pub fn discounts_ex_vat(&self) -> Decimal {
        self.line_discounts_ex_vat + self.promo_discount_ex_vat + self.invoice_discount_ex_vat
    }

    pub fn has_discounts(&self) -> bool {
        self.discounts_total() > Decimal::ZERO
    }
}

/// Promo discount amount; a percentage-only promo applies to the
/// post-line-discount gross.
fn promo_amount(record: &InvoiceRecord, base: Decimal) -> Decimal {
    match &record.discount {
        Some(discount) if discount.amount > Decimal::ZERO => round2(discount.amount),
        Some(discount) if discount.percentage > Decimal::ZERO => {
            round2(base * discount.percentage / Decimal::ONE_HUNDRED)
        }
        _ => Decimal::ZERO,
    }
}
