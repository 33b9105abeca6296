//! # Bayou Evidence
//!
//! Evidence is what a caller knows about the program it wants: API calls it
//! expects to see, types it expects to touch, and the types available in the
//! surrounding context.
//!
//! ## Architecture
//!
//! ```text
//! Request JSON ──> EvidenceRequest { evidence, payload }
//!
//! Call signatures ("java.io.File.exists()")
//!     │
//!     ├──> apicalls_from  → method names (constructors dropped)
//!     ├──> types_from     → innermost capitalized qualifiers
//!     └──> context_from   → argument types (generics and arrays stripped)
//!           │
//!           └──> EvidenceTokens ──> is_consistent(requested, calls)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bayou_evidence::{is_consistent, EvidenceRequest};
//!
//! let request = EvidenceRequest::from_json_str(
//!     r#"{"apicalls": ["readLine"], "types": ["BufferedReader"], "context": []}"#,
//! ).unwrap();
//!
//! let calls = ["java.io.BufferedReader.readLine()"];
//! assert!(is_consistent(&request.evidence, calls));
//! ```

mod call;
mod consistency;
mod encoder;
mod error;
mod kind;
mod request;
mod tokens;

pub use call::{apicalls_from, context_from, types_from};
pub use consistency::{is_consistent, missing_evidence};
pub use encoder::{EvidenceEncoder, Vocabulary};
pub use error::{EvidenceError, Result};
pub use kind::EvidenceKind;
pub use request::{Evidence, EvidenceRequest};
pub use tokens::{derive_evidence_tokens, EvidenceTokens};
