use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// 48 alphanumeric characters from a CSPRNG, ~285 bits of entropy. Used for
/// single-use confirmation links, so unguessability is the whole point.
pub const CONFIRMATION_TOKEN_LENGTH: usize = 48;

pub fn generate_access_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn generate_confirmation_token() -> String {
    generate_access_token(CONFIRMATION_TOKEN_LENGTH)
}
