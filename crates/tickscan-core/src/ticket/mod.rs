//! Document parsing: normalization, field extraction rules, and the
//! per-document-kind parser strategies.

pub mod normalize;
mod parser;
pub mod rules;

pub use normalize::{normalize, PROTECTED_KEYWORDS};
pub use parser::{
    DocumentParser, ExtractionEngine, ParserDispatch, PayslipParser, RideReceiptParser,
    TicketParser,
};
