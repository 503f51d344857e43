//! Capability traits at the engine's seams.
//!
//! The pipeline is generic over these so tests run against mocks and
//! the server wires real implementations.

mod completion;
mod gateway;
mod ledger;

pub use completion::CompletionProvider;
pub use gateway::{FiscalGateway, SubmissionOutcome};
pub use ledger::ReceiptLedger;
