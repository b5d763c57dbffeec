//! Store-level configuration passed explicitly into every generator call.
//!
//! Loaded from a JSON file; every field has a default so a terminal only
//! needs to supply its seller identity.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::invoice_set::InvoiceSetTiming;
use crate::print::PrintConfig;
use crate::qr::QrOptions;
use crate::zatca::MAX_TLV_VALUE_LEN;

/// Saudi standard VAT rate.
pub const DEFAULT_VAT_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

const VAT_NUMBER_LEN: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SellerProfile {
    pub name: String,
    #[serde(default)]
    pub name_alt: Option<String>,
    pub vat_number: String,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub branch_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    pub seller: SellerProfile,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub tracking_base_url: Option<String>,
    #[serde(default)]
    pub footer_text: Option<String>,
    #[serde(default)]
    pub zatca_qr: QrOptions,
    #[serde(default)]
    pub tracking_qr: QrOptions,
    #[serde(default)]
    pub print: PrintConfig,
    #[serde(default)]
    pub timing: InvoiceSetTiming,
}

fn default_vat_rate() -> Decimal {
    DEFAULT_VAT_RATE
}

fn default_currency() -> String {
    "SAR".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seller: SellerProfile::default(),
            vat_rate: DEFAULT_VAT_RATE,
            currency: default_currency(),
            tracking_base_url: None,
            footer_text: Some("Thank you".to_string()),
            zatca_qr: QrOptions::default(),
            tracking_qr: QrOptions::default(),
            print: PrintConfig::default(),
            timing: InvoiceSetTiming::default(),
        }
    }
}

impl StoreConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: StoreConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(path = %path.display(), seller = %config.seller.name, "Store config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.seller.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("seller.name is empty".into()));
        }
        if name.len() > MAX_TLV_VALUE_LEN {
            return Err(ConfigError::Invalid(format!(
                "seller.name is {} bytes (max {MAX_TLV_VALUE_LEN})",
                name.len()
            )));
        }
        let vat = self.seller.vat_number.trim();
        if vat.len() != VAT_NUMBER_LEN || !vat.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::Invalid(format!(
                "seller.vat_number must be {VAT_NUMBER_LEN} digits, got {vat:?}"
            )));
        }
        if self.vat_rate < Decimal::ZERO || self.vat_rate >= Decimal::ONE {
            return Err(ConfigError::Invalid(format!(
                "vat_rate {} is outside [0, 1)",
                self.vat_rate
            )));
        }
        Ok(())
    }

    /// Customer-facing order tracking link, if the store has one.
    pub fn tracking_url(&self, order_number: &str) -> Option<String> {
        let base = self
            .tracking_base_url
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())?;
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            order_number.trim()
        ))
    }

    pub fn footer(&self) -> &str {
        self.footer_text
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("Thank you")
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> StoreConfig {
    StoreConfig {
        seller: SellerProfile {
            name: "Morning Brew Cafe".to_string(),
            name_alt: Some("مقهى الصباح".to_string()),
            vat_number: "310122393500003".to_string(),
            branch_name: Some("Olaya".to_string()),
            branch_address: Some("King Fahd Rd, Riyadh".to_string()),
        },
        tracking_base_url: Some("https://track.example.sa/o/".to_string()),
        ..StoreConfig::default()
    }
}
