use std::hash::{BuildHasher, Hash, RandomState};

/// Converts an input into a hash value that decides which worker of a [`HashedFanOut`](crate::HashedFanOut) it is
/// routed to.
///
/// Implementations must be deterministic: the same logical input must always produce the same value, no matter which
/// thread asks. Otherwise two items of the same entity can end up on different workers.
///
/// Any `Fn(&I) -> u64` closure that is `Send + Sync` is a `HashFunc`.
pub trait HashFunc<I>: Send + Sync {
    /// Returns the hash value of `input`.
    fn hash_input(&self, input: &I) -> u64;
}

impl<I, F> HashFunc<I> for F
where
    F: Fn(&I) -> u64 + Send + Sync,
{
    fn hash_input(&self, input: &I) -> u64 {
        self(input)
    }
}

/// Extracts the routing key of an input.
///
/// Any `Fn(&I) -> K` closure that is `Send + Sync` is a `KeyFunc`.
pub trait KeyFunc<I>: Send + Sync {
    /// The key type.
    type Key;

    /// Returns the key of `input`.
    fn key(&self, input: &I) -> Self::Key;
}

impl<I, K, F> KeyFunc<I> for F
where
    F: Fn(&I) -> K + Send + Sync,
{
    type Key = K;

    fn key(&self, input: &I) -> K {
        self(input)
    }
}

/// A [`HashFunc`] that hashes the string key returned by a [`KeyFunc`].
///
/// The [`BuildHasher`] is seeded once when the `StringHasher` is created and every call hashes with a fresh hasher
/// built from it. Equal keys therefore hash to equal values for the lifetime of the instance, and concurrent callers
/// never contend on shared hashing state.
///
/// With the default [`RandomState`], values are not stable across instances or processes. Use
/// [`with_hasher`](StringHasher::with_hasher) with a fixed [`BuildHasher`] if that is needed.
///
/// ```rust
/// use tokio_fanout::{HashFunc, StringHasher};
///
/// let hasher = StringHasher::new(|n: &u32| n.to_string());
/// assert_eq!(hasher.hash_input(&42u32), hasher.hash_input(&42u32));
/// ```
#[derive(Debug, Clone)]
pub struct StringHasher<F, S = RandomState> {
    key_func: F,
    build_hasher: S,
}

impl<F> StringHasher<F> {
    /// Creates a `StringHasher` with a randomly seeded [`RandomState`].
    pub fn new(key_func: F) -> Self {
        Self::with_hasher(key_func, RandomState::new())
    }
}

impl<F, S> StringHasher<F, S> {
    /// Creates a `StringHasher` that hashes keys with `build_hasher`.
    pub fn with_hasher(key_func: F, build_hasher: S) -> Self {
        Self {
            key_func,
            build_hasher,
        }
    }
}

impl<I, F, S> HashFunc<I> for StringHasher<F, S>
where
    F: KeyFunc<I>,
    F::Key: AsRef<str>,
    S: BuildHasher + Send + Sync,
{
    fn hash_input(&self, input: &I) -> u64 {
        let key = self.key_func.key(input);
        self.build_hasher.hash_one(key.as_ref())
    }
}

/// A [`HashFunc`] that hashes any [`Hash`] key returned by a [`KeyFunc`].
///
/// This behaves like [`StringHasher`] without requiring the key to be turned into a string first.
#[derive(Debug, Clone)]
pub struct KeyHasher<F, S = RandomState> {
    key_func: F,
    build_hasher: S,
}

impl<F> KeyHasher<F> {
    /// Creates a `KeyHasher` with a randomly seeded [`RandomState`].
    pub fn new(key_func: F) -> Self {
        Self::with_hasher(key_func, RandomState::new())
    }
}

impl<F, S> KeyHasher<F, S> {
    /// Creates a `KeyHasher` that hashes keys with `build_hasher`.
    pub fn with_hasher(key_func: F, build_hasher: S) -> Self {
        Self {
            key_func,
            build_hasher,
        }
    }
}

impl<I, F, S> HashFunc<I> for KeyHasher<F, S>
where
    F: KeyFunc<I>,
    F::Key: Hash,
    S: BuildHasher + Send + Sync,
{
    fn hash_input(&self, input: &I) -> u64 {
        self.build_hasher.hash_one(self.key_func.key(input))
    }
}
