pub mod mfa;
pub mod session;

pub use mfa::{MfaSetup, MfaStatus, Profile};
pub use session::{Identity, Session, SessionIdentity};
