//! Session identifier generation.

use rand::Rng;

/// Default session id length in characters.
pub const DEFAULT_ID_LENGTH: usize = 32;

/// Produces fresh session ids.
///
/// Uniqueness is the generator's responsibility. Closures returning a
/// `String` implement this trait, which keeps tests deterministic:
///
/// ```rust
/// use telehealth_session::IdGenerator;
///
/// let fixed = || "sess-1".to_owned();
/// assert_eq!(fixed.generate(), "sess-1");
/// ```
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Random alphanumeric ids from the thread-local CSPRNG.
///
/// The default length of 32 characters gives roughly 190 bits of entropy.
#[derive(Debug, Clone, Copy)]
pub struct RandomIdGenerator {
    length: usize,
}

impl RandomIdGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        generate_token(self.length)
    }
}

/// Generates a random token of `length` characters from `[a-zA-Z0-9]`.
pub fn generate_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect()
}
