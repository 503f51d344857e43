//! The in-flight receipt representation.
//!
//! A [`ReceiptDraft`] is created fresh per request by the extractor,
//! mutated by the normalizer (defaults, reconciliation, context merge)
//! and consumed read-only by the validation gate and the gateway
//! client. It is never mutated after submission.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::operation::OperationType;

/// Tolerance for comparing item totals against payment totals.
pub const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// VAT classification of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxClass {
    #[default]
    None,
    Vat10,
    Vat20,
}

impl TaxClass {
    /// Gateway wire code.
    pub fn code(self) -> &'static str {
        match self {
            TaxClass::None => "none",
            TaxClass::Vat10 => "vat10",
            TaxClass::Vat20 => "vat20",
        }
    }

    /// Inverse of [`TaxClass::code`], for environment configuration.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "none" => Some(TaxClass::None),
            "vat10" => Some(TaxClass::Vat10),
            "vat20" => Some(TaxClass::Vat20),
            _ => None,
        }
    }
}

/// Settlement method attribute of a line item (gateway `payment_method`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPaymentMethod {
    #[default]
    FullPayment,
    PartialPayment,
    Advance,
    Credit,
    CreditPayment,
    FullPrepayment,
    Prepayment,
}

impl ItemPaymentMethod {
    pub fn code(self) -> &'static str {
        match self {
            ItemPaymentMethod::FullPayment => "full_payment",
            ItemPaymentMethod::PartialPayment => "partial_payment",
            ItemPaymentMethod::Advance => "advance",
            ItemPaymentMethod::Credit => "credit",
            ItemPaymentMethod::CreditPayment => "credit_payment",
            ItemPaymentMethod::FullPrepayment => "full_prepayment",
            ItemPaymentMethod::Prepayment => "prepayment",
        }
    }
}

/// Subject of settlement (gateway `payment_object`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Commodity,
    Service,
    Work,
    Excise,
}

impl ItemKind {
    pub fn code(self) -> &'static str {
        match self {
            ItemKind::Commodity => "commodity",
            ItemKind::Service => "service",
            ItemKind::Work => "work",
            ItemKind::Excise => "excise",
        }
    }
}

/// How a payment split is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Cash,
    #[default]
    Card,
    Advance,
    Credit,
    Other,
}

impl PaymentKind {
    /// Gateway numeric payment type (0 cash, 1 electronic, 2 prepaid,
    /// 3 credit, 4 other).
    pub fn code(self) -> u8 {
        match self {
            PaymentKind::Cash => 0,
            PaymentKind::Card => 1,
            PaymentKind::Advance => 2,
            PaymentKind::Credit => 3,
            PaymentKind::Other => 4,
        }
    }
}

/// Merchant taxation scheme (gateway `sno`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxScheme {
    Osn,
    #[default]
    UsnIncome,
    UsnIncomeOutcome,
    Envd,
    Esn,
    Patent,
}

impl TaxScheme {
    pub fn code(self) -> &'static str {
        match self {
            TaxScheme::Osn => "osn",
            TaxScheme::UsnIncome => "usn_income",
            TaxScheme::UsnIncomeOutcome => "usn_income_outcome",
            TaxScheme::Envd => "envd",
            TaxScheme::Esn => "esn",
            TaxScheme::Patent => "patent",
        }
    }

    /// Inverse of [`TaxScheme::code`], for environment configuration.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "osn" => Some(TaxScheme::Osn),
            "usn_income" => Some(TaxScheme::UsnIncome),
            "usn_income_outcome" => Some(TaxScheme::UsnIncomeOutcome),
            "envd" => Some(TaxScheme::Envd),
            "esn" => Some(TaxScheme::Esn),
            "patent" => Some(TaxScheme::Patent),
            _ => None,
        }
    }
}

/// One priced position on the receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,

    /// Price of one unit, rubles. Must be >= 0.
    pub unit_price: Decimal,

    /// Quantity in units. Must be > 0.
    pub quantity: Decimal,

    #[serde(default)]
    pub tax_class: TaxClass,

    #[serde(default)]
    pub payment_method: ItemPaymentMethod,

    #[serde(default)]
    pub kind: ItemKind,
}

impl LineItem {
    /// New commodity line with quantity 1 and default attributes.
    pub fn new(name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            unit_price,
            quantity: Decimal::ONE,
            tax_class: TaxClass::default(),
            payment_method: ItemPaymentMethod::default(),
            kind: ItemKind::default(),
        }
    }

    /// Line total: unit price x quantity.
    pub fn amount(&self) -> Decimal {
        self.unit_price * self.quantity
    }
}

/// One payment covering part of the receipt total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSplit {
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    pub amount: Decimal,
}

/// Buyer contact details. One of email/phone is required by the
/// fiscal gateway; the validation gate enforces email for real
/// submissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Merchant fields sourced from caller-supplied settings, never from
/// model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantContext {
    #[serde(default)]
    pub inn: String,
    #[serde(default)]
    pub sno: TaxScheme,
    #[serde(default)]
    pub company_email: String,
    #[serde(default)]
    pub payment_address: String,
}

/// The canonical in-flight receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDraft {
    #[serde(default)]
    pub operation: OperationType,

    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default)]
    pub payments: Vec<PaymentSplit>,

    #[serde(default)]
    pub client: ClientInfo,

    #[serde(default)]
    pub merchant: MerchantContext,

    /// Set by the normalizer when a multi-item total mismatch was
    /// resolved by trusting the payment sum. Operator should review
    /// item-level detail before relying on it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_review: bool,
}

impl ReceiptDraft {
    /// Sum of line totals.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(LineItem::amount).sum()
    }

    /// Sum of payment splits.
    pub fn payments_total(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// True when item and payment totals agree within [`AMOUNT_TOLERANCE`].
    pub fn is_balanced(&self) -> bool {
        (self.items_total() - self.payments_total()).abs() <= AMOUNT_TOLERANCE
    }
}
