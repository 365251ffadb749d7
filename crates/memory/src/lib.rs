//! In-memory provider backends.
//!
//! Deterministic stand-ins for SES and S3: entries are kept ordered by name
//! or key, every call is counted, and any operation can be made to fail.

mod email;
mod factory;
mod faults;
mod object_store;

pub use email::MemoryEmailService;
pub use factory::MemoryClientFactory;
pub use faults::{Faults, ops};
pub use object_store::MemoryObjectStore;
