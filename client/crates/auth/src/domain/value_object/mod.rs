pub mod email;
pub mod nickname;
pub mod otp_code;
pub mod role;
pub mod token;

pub use email::Email;
pub use nickname::Nickname;
pub use otp_code::{BackupCode, MfaProof, OtpCode};
pub use role::Role;
pub use token::BearerToken;
