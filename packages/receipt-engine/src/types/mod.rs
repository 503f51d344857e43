//! Core data model: the in-flight receipt draft, merchant settings,
//! and the persisted ledger row.

mod draft;
mod operation;
mod persisted;
mod settings;

pub use draft::{
    ClientInfo, ItemKind, ItemPaymentMethod, LineItem, MerchantContext, PaymentKind, PaymentSplit,
    ReceiptDraft, TaxClass, TaxScheme, AMOUNT_TOLERANCE,
};
pub use operation::OperationType;
pub use persisted::{PersistedReceipt, ReceiptStatus};
pub use settings::{EngineSettings, ProviderCredentials};
