//! Entity structs for the Consilium domain objects.
//!
//! Each entity maps to a table in the libSQL database. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip and
//! schema generation.

mod aggregate;
mod assist;
mod audit;
mod review;
mod scan;

pub use aggregate::{FinalAggregate, ReviewCompletion, QUORUM};
pub use assist::AssistiveOutput;
pub use audit::AuditEntry;
pub use review::{DraftFields, ReviewRecord};
pub use scan::Scan;
