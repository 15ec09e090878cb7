//! Rule-based field extractors for receipt text.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{amount_token, extract_candidates, parse_amount};
pub use dates::DateExtractor;
