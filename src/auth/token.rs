use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes in a session token (96 hex characters on the wire).
pub const TOKEN_BYTES: usize = 48;

/// Generates an opaque session token: 48 bytes from the operating system's
/// CSPRNG, hex-encoded. Tokens carry no embedded claims; validity is purely
/// a repository lookup, and a token stays valid until it is deleted.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
