//! Serde support.
//!
//! Secrets deserialize from their inner representation and serialize back to
//! it: request bodies going to the processor have to carry the real values.
//! Masking applies to `Debug`/`Display` only, which is where values leak into
//! logs.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::{PeekInterface, Secret, Strategy, StrongSecret};

impl<'de, T, I> Deserialize<'de> for Secret<T, I>
where
    T: DeserializeOwned,
    I: Strategy<T>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self::new)
    }
}

impl<T, I> Serialize for Secret<T, I>
where
    T: Serialize,
    I: Strategy<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.peek().serialize(serializer)
    }
}

impl<'de, T, I> Deserialize<'de> for StrongSecret<T, I>
where
    T: DeserializeOwned + Zeroize,
    I: Strategy<T>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self::new)
    }
}

impl<T, I> Serialize for StrongSecret<T, I>
where
    T: Serialize + Zeroize,
    I: Strategy<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.peek().serialize(serializer)
    }
}
