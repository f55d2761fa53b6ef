//! Session codec, authorization policy and input validation.

pub mod session;
pub mod validation;

pub use session::{authorize, mask_password, sha256_hex, DigestFn, SessionCodec};
