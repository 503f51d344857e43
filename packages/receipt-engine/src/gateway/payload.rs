//! Draft -> gateway payload translation.
//!
//! Fixed code tables: sno and vat wire codes live on the domain enums;
//! payment types are numeric; measurement units follow the gateway's
//! fixed enumeration.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{ItemKind, LineItem, PaymentSplit, ReceiptDraft};

/// Gateway measurement-unit label for a line item.
///
/// Goods are counted in pieces, services and works are dimensionless.
pub fn measurement_unit(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Commodity | ItemKind::Excise => "шт",
        ItemKind::Service | ItemKind::Work => "усл.",
    }
}

/// Public check link for an issued receipt.
pub fn permalink(uuid: &str) -> String {
    format!("https://lk.ecomkassa.ru/check/{uuid}")
}

#[derive(Debug, Serialize)]
pub struct ReceiptPayload {
    pub external_id: String,
    pub receipt: ReceiptBody,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ReceiptBody {
    pub client: ClientPayload,
    pub company: CompanyPayload,
    pub items: Vec<ItemPayload>,
    pub payments: Vec<PaymentPayload>,
    pub total: rust_decimal::Decimal,
}

#[derive(Debug, Serialize)]
pub struct ClientPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanyPayload {
    pub email: String,
    pub inn: String,
    pub sno: &'static str,
    pub payment_address: String,
}

#[derive(Debug, Serialize)]
pub struct ItemPayload {
    pub name: String,
    pub price: rust_decimal::Decimal,
    pub quantity: rust_decimal::Decimal,
    pub sum: rust_decimal::Decimal,
    pub measurement_unit: &'static str,
    pub payment_method: &'static str,
    pub payment_object: &'static str,
    pub vat: VatPayload,
}

#[derive(Debug, Serialize)]
pub struct VatPayload {
    #[serde(rename = "type")]
    pub vat_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PaymentPayload {
    #[serde(rename = "type")]
    pub payment_type: u8,
    pub sum: rust_decimal::Decimal,
}

fn item_payload(item: &LineItem) -> ItemPayload {
    ItemPayload {
        name: item.name.clone(),
        price: item.unit_price,
        quantity: item.quantity,
        sum: item.amount(),
        measurement_unit: measurement_unit(item.kind),
        payment_method: item.payment_method.code(),
        payment_object: item.kind.code(),
        vat: VatPayload {
            vat_type: item.tax_class.code(),
        },
    }
}

fn payment_payload(payment: &PaymentSplit) -> PaymentPayload {
    PaymentPayload {
        payment_type: payment.kind.code(),
        sum: payment.amount,
    }
}

/// Translate a normalized draft into the gateway wire format.
pub fn build_payload(
    draft: &ReceiptDraft,
    external_id: &str,
    timestamp: DateTime<Utc>,
) -> ReceiptPayload {
    ReceiptPayload {
        external_id: external_id.to_string(),
        receipt: ReceiptBody {
            client: ClientPayload {
                email: draft.client.email.clone(),
                phone: draft.client.phone.clone(),
            },
            company: CompanyPayload {
                email: draft.merchant.company_email.clone(),
                inn: draft.merchant.inn.clone(),
                sno: draft.merchant.sno.code(),
                payment_address: draft.merchant.payment_address.clone(),
            },
            items: draft.items.iter().map(item_payload).collect(),
            payments: draft.payments.iter().map(payment_payload).collect(),
            total: draft.payments_total(),
        },
        timestamp: timestamp.format("%d.%m.%Y %H:%M:%S").to_string(),
    }
}
