//! ZATCA phase-1 QR payload: five Tag-Length-Value records, base64 encoded.
//!
//! Tag numbers and their order are the wire contract checked by
//! FATOORA-compliant scanners:
//! 1 seller name, 2 VAT number, 3 timestamp, 4 total incl. VAT, 5 VAT amount.

use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::config::SellerProfile;
use crate::error::{DocumentError, TlvError};
use crate::model::{InvoiceRecord, ZatcaFields};
use crate::vat::{money, VatBreakdown};

const TAG_SELLER_NAME: u8 = 1;
const TAG_VAT_NUMBER: u8 = 2;
const TAG_TIMESTAMP: u8 = 3;
const TAG_TOTAL_WITH_VAT: u8 = 4;
const TAG_VAT_AMOUNT: u8 = 5;

/// Single-byte length field.
pub const MAX_TLV_VALUE_LEN: usize = 255;

/// Tag 3 format: RFC 3339 in UTC, second precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Normalise an ISO 8601 / RFC 3339 date to the tag 3 representation.
pub fn zatca_timestamp(date: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(date.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc).format(TIMESTAMP_FORMAT).to_string())
}

impl ZatcaFields {
    /// Seller identity is trimmed the same way the printed header is.
    pub fn from_invoice(
        record: &InvoiceRecord,
        seller: &SellerProfile,
        breakdown: &VatBreakdown,
    ) -> Result<Self, DocumentError> {
        let timestamp = zatca_timestamp(&record.date).ok_or_else(|| {
            DocumentError::InvalidRecord(format!(
                "order {} date {:?} is not an ISO 8601 timestamp",
                record.order_number, record.date
            ))
        })?;
        Ok(Self {
            seller_name: seller.name.trim().to_string(),
            vat_number: seller.vat_number.trim().to_string(),
            timestamp,
            total_with_vat: money(breakdown.total_with_vat),
            vat_amount: money(breakdown.vat_amount),
        })
    }

    fn tagged(&self) -> [(u8, &str); 5] {
        [
            (TAG_SELLER_NAME, self.seller_name.as_str()),
            (TAG_VAT_NUMBER, self.vat_number.as_str()),
            (TAG_TIMESTAMP, self.timestamp.as_str()),
            (TAG_TOTAL_WITH_VAT, self.total_with_vat.as_str()),
            (TAG_VAT_AMOUNT, self.vat_amount.as_str()),
        ]
    }
}

/// Raw TLV bytes in fixed tag order.
pub fn tlv_bytes(fields: &ZatcaFields) -> Result<Vec<u8>, TlvError> {
    let mut buffer = Vec::with_capacity(128);
    for (tag, value) in fields.tagged() {
        let bytes = value.as_bytes();
        if bytes.len() > MAX_TLV_VALUE_LEN {
            return Err(TlvError::ValueTooLong {
                tag,
                len: bytes.len(),
            });
        }
        buffer.push(tag);
        buffer.push(bytes.len() as u8);
        buffer.extend_from_slice(bytes);
    }
    Ok(buffer)
}

/// Base64 of the concatenated TLV records, as embedded in the QR code.
pub fn encode_tlv(fields: &ZatcaFields) -> Result<String, TlvError> {
    let bytes = tlv_bytes(fields)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Parse a base64 TLV payload back into its five fields.
///
/// Strict: tags must appear exactly once each and in wire order.
pub fn decode_tlv(payload: &str) -> Result<ZatcaFields, TlvError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| TlvError::Base64(e.to_string()))?;

    let mut values: Vec<String> = Vec::with_capacity(5);
    let mut pos = 0usize;
    for expected in TAG_SELLER_NAME..=TAG_VAT_AMOUNT {
        let Some(&tag) = bytes.get(pos) else {
            return Err(TlvError::MissingTag(expected));
        };
        if tag != expected {
            return Err(TlvError::UnexpectedTag {
                expected,
                found: tag,
            });
        }
        let len = *bytes.get(pos + 1).ok_or(TlvError::Truncated { tag })? as usize;
        let start = pos + 2;
        let end = start + len;
        let raw = bytes.get(start..end).ok_or(TlvError::Truncated { tag })?;
        let value = std::str::from_utf8(raw).map_err(|_| TlvError::InvalidUtf8(tag))?;
        values.push(value.to_string());
        pos = end;
    }
    if let Some(&extra) = bytes.get(pos) {
        return Err(TlvError::UnexpectedTag {
            expected: 0,
            found: extra,
        });
    }

    let mut values = values.into_iter();
    let mut next = || values.next().unwrap_or_default();
    Ok(ZatcaFields {
        seller_name: next(),
        vat_number: next(),
        timestamp: next(),
        total_with_vat: next(),
        vat_amount: next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ZatcaFields {
        ZatcaFields {
            seller_name: "مقهى الصباح".to_string(),
            vat_number: "310122393500003".to_string(),
            timestamp: "2026-03-01T10:15:00Z".to_string(),
            total_with_vat: "114.00".to_string(),
            vat_amount: "14.87".to_string(),
        }
    }

    #[test]
    fn decode_reproduces_encoded_fields() {
        let original = fields();
        let encoded = encode_tlv(&original).unwrap();
        assert_eq!(decode_tlv(&encoded).unwrap(), original);
    }

    #[test]
    fn records_are_tag_length_value_in_fixed_order() {
        let bytes = tlv_bytes(&fields()).unwrap();
        let name_len = "مقهى الصباح".len();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1] as usize, name_len);
        let vat_at = 2 + name_len;
        assert_eq!(bytes[vat_at], 2);
        assert_eq!(bytes[vat_at + 1], 15);
        assert_eq!(&bytes[vat_at + 2..vat_at + 17], b"310122393500003");
        assert_eq!(bytes[vat_at + 17], 3);
    }

    #[test]
    fn known_ascii_payload_matches_reference_encoding() {
        let fields = ZatcaFields {
            seller_name: "Bobs Records".to_string(),
            vat_number: "310122393500003".to_string(),
            timestamp: "2022-04-25T15:30:00Z".to_string(),
            total_with_vat: "1000.00".to_string(),
            vat_amount: "150.00".to_string(),
        };
        assert_eq!(
            encode_tlv(&fields).unwrap(),
            "AQxCb2JzIFJlY29yZHMCDzMxMDEyMjM5MzUwMDAwMwMUMjAyMi0wNC0yNVQxNTozMDowMFoEBzEwMDAuMDAFBjE1MC4wMA=="
        );
    }

    #[test]
    fn seller_name_over_255_bytes_fails_fast() {
        let mut long = fields();
        long.seller_name = "x".repeat(300);
        assert_eq!(
            encode_tlv(&long),
            Err(TlvError::ValueTooLong { tag: 1, len: 300 })
        );
    }

    #[test]
    fn value_of_exactly_255_bytes_is_accepted() {
        let mut edge = fields();
        edge.seller_name = "y".repeat(255);
        let decoded = decode_tlv(&encode_tlv(&edge).unwrap()).unwrap();
        assert_eq!(decoded.seller_name.len(), 255);
    }

    #[test]
    fn decode_rejects_reordered_tags() {
        let bytes = [2u8, 1, b'a', 1, 1, b'b'];
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        assert_eq!(
            decode_tlv(&payload),
            Err(TlvError::UnexpectedTag {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn decode_rejects_truncated_value() {
        let bytes = [1u8, 10, b'a', b'b'];
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        assert_eq!(decode_tlv(&payload), Err(TlvError::Truncated { tag: 1 }));
    }

    #[test]
    fn decode_reports_missing_tail_tags() {
        let bytes = [1u8, 1, b'a', 2, 1, b'b'];
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        assert_eq!(decode_tlv(&payload), Err(TlvError::MissingTag(3)));
    }

    #[test]
    fn timestamp_is_normalised_to_utc() {
        assert_eq!(
            zatca_timestamp("2026-03-01T10:15:00+03:00").as_deref(),
            Some("2026-03-01T07:15:00Z")
        );
        assert_eq!(
            zatca_timestamp(" 2022-04-25T15:30:00Z ").as_deref(),
            Some("2022-04-25T15:30:00Z")
        );
        assert_eq!(zatca_timestamp("01/03/2026 10:15"), None);
        assert_eq!(zatca_timestamp(""), None);
    }

    #[test]
    fn from_invoice_rejects_non_iso_date() {
        let record = InvoiceRecord {
            order_number: "A-9".to_string(),
            date: "01/03/2026 10:15".to_string(),
            ..InvoiceRecord::default()
        };
        let seller = SellerProfile {
            name: "Morning Brew Cafe".to_string(),
            vat_number: "310122393500003".to_string(),
            ..SellerProfile::default()
        };
        let breakdown = VatBreakdown::compute(&record, rust_decimal::Decimal::new(15, 2));
        assert!(matches!(
            ZatcaFields::from_invoice(&record, &seller, &breakdown),
            Err(DocumentError::InvalidRecord(_))
        ));
    }

    #[test]
    fn from_invoice_trims_seller_identity() {
        let record = InvoiceRecord {
            order_number: "A-10".to_string(),
            date: "2026-03-01T10:15:00Z".to_string(),
            ..InvoiceRecord::default()
        };
        let seller = SellerProfile {
            name: "  Morning Brew Cafe \n".to_string(),
            vat_number: " 310122393500003 ".to_string(),
            ..SellerProfile::default()
        };
        let breakdown = VatBreakdown::compute(&record, rust_decimal::Decimal::new(15, 2));
        let fields = ZatcaFields::from_invoice(&record, &seller, &breakdown).unwrap();
        assert_eq!(fields.seller_name, "Morning Brew Cafe");
        assert_eq!(fields.vat_number, "310122393500003");
        assert_eq!(fields.timestamp, "2026-03-01T10:15:00Z");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_tlv("%%%"), Err(TlvError::Base64(_))));
    }
}
