//! Session state shared with the view layer.
//!
//! DESIGN
//! ======
//! `session` holds the value types (`Session`, `AuthSnapshot`); `store` holds
//! the single process-wide `SessionStore` that the identity client writes and
//! every screen reads.

pub mod session;
pub mod store;

pub use session::{AuthSnapshot, EmptySubjectId, Session, SubjectId};
pub use store::SessionStore;
