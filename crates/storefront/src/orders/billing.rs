//! Billing snapshot construction and guest identities.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ugames_core::{Email, EmailError};

pub use crate::woocommerce::Address as BillingAddress;

/// Placeholder identity for orders placed without customer details.
pub mod guest {
    pub const FIRST_NAME: &str = "Guest";
    pub const LAST_NAME: &str = "Customer";
    pub const ADDRESS_1: &str = "Merkez Mah. Ataturk Cad. No:1";
    pub const CITY: &str = "Sisli";
    pub const STATE: &str = "Istanbul";
    pub const POSTCODE: &str = "34000";
    pub const PHONE: &str = "05555555555";
}

/// Customer details as submitted at checkout. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "address1")]
    pub address_1: Option<String>,
    #[serde(default, alias = "address2")]
    pub address_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A field counts as supplied only when it has non-blank content.
fn supplied(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl CustomerInfo {
    /// Whether no address field carries any content.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.address_1,
            &self.address_2,
            &self.city,
            &self.state,
            &self.postcode,
            &self.country,
            &self.email,
            &self.phone,
        ]
        .into_iter()
        .all(|f| supplied(f.as_ref()).is_none())
    }

    /// The supplied email, validated.
    ///
    /// # Errors
    ///
    /// Returns an error when an email is present but malformed.
    pub fn email(&self) -> Result<Option<Email>, EmailError> {
        supplied(self.email.as_ref()).map(Email::parse).transpose()
    }

    #[must_use]
    pub fn note(&self) -> Option<&str> {
        supplied(self.note.as_ref())
    }
}

/// Complete a billing snapshot, filling only the fields the customer left
/// out. Supplied fields are trimmed, like the email and note.
///
/// `state` falls back to the supplied city before the guest placeholder.
#[must_use]
pub fn complete_address(
    customer: Option<&CustomerInfo>,
    email: &Email,
    default_country: &str,
) -> BillingAddress {
    let customer = customer.filter(|c| !c.is_blank());

    let city = pick(customer, |c| &c.city);
    let state = pick(customer, |c| &c.state)
        .or_else(|| city.clone())
        .unwrap_or_else(|| guest::STATE.to_string());

    BillingAddress {
        first_name: pick(customer, |c| &c.first_name)
            .unwrap_or_else(|| guest::FIRST_NAME.to_string()),
        last_name: pick(customer, |c| &c.last_name).unwrap_or_else(|| guest::LAST_NAME.to_string()),
        address_1: pick(customer, |c| &c.address_1)
            .unwrap_or_else(|| guest::ADDRESS_1.to_string()),
        address_2: pick(customer, |c| &c.address_2).unwrap_or_default(),
        city: city.unwrap_or_else(|| guest::CITY.to_string()),
        state,
        postcode: pick(customer, |c| &c.postcode).unwrap_or_else(|| guest::POSTCODE.to_string()),
        country: pick(customer, |c| &c.country).unwrap_or_else(|| default_country.to_string()),
        email: email.as_str().to_string(),
        phone: pick(customer, |c| &c.phone).unwrap_or_else(|| guest::PHONE.to_string()),
    }
}

/// A supplied field, trimmed.
fn pick<'a>(
    customer: Option<&'a CustomerInfo>,
    field: impl FnOnce(&'a CustomerInfo) -> &'a Option<String>,
) -> Option<String> {
    customer
        .and_then(|c| supplied(field(c).as_ref()))
        .map(str::to_string)
}

/// Issues `guest_<unix-millis>@<domain>` addresses whose stamps strictly
/// increase, even for calls within the same millisecond.
#[derive(Debug)]
pub struct GuestIdentity {
    domain: String,
    last_stamp: AtomicI64,
}

impl GuestIdentity {
    #[must_use]
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.trim().to_string(),
            last_stamp: AtomicI64::new(0),
        }
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The next guest address.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured domain does not form a valid address.
    pub fn next_email(&self) -> Result<Email, EmailError> {
        Email::guest(self.next_stamp(), &self.domain)
    }

    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}
