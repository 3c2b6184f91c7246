use humantime::parse_duration;
use serde::de::{Error, Unexpected, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt::Formatter;
use std::time::Duration;

/// Compares two configuration keys by their ASCII alphanumeric characters only,
/// case-insensitively. Makes `"MAX_ATTEMPTS"`, `"maxAttempts"` and
/// `"max-attempts"` the same key.
pub(crate) fn keys_match(a: &str, b: &str) -> bool {
    let mut iter_a = a.chars().filter(char::is_ascii_alphanumeric);
    let mut iter_b = b.chars().filter(char::is_ascii_alphanumeric);

    loop {
        match (iter_a.next(), iter_b.next()) {
            (Some(c1), Some(c2)) if c1.eq_ignore_ascii_case(&c2) => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Generates a field identifier enum for a map visitor.
///
/// Each field may list aliases after `|`. Unknown keys map to the `__ignore`
/// variant.
macro_rules! config_field {
    ($name:ident, $($field:ident $(| $alias:literal)*),+ $(,)?) => {
        #[allow(non_camel_case_types)]
        enum $name {
            $($field,)+
            __ignore,
        }

        impl $name {
            fn from_str(value: &str) -> Self {
                $(
                    if $crate::config::field::keys_match(value, stringify!($field))
                        $(|| $crate::config::field::keys_match(value, $alias))*
                    {
                        return Self::$field;
                    }
                )+

                Self::__ignore
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$field => stringify!($field),)+
                    Self::__ignore => "__ignore",
                }
            }

            /// Takes the next value from the map into the given slot, failing
            /// on a key that was already seen.
            fn poll<'de, A, T>(
                &self,
                from: &mut A,
                into: &mut Option<T>,
            ) -> Result<::serde::de::IgnoredAny, A::Error>
            where
                A: ::serde::de::MapAccess<'de>,
                T: ::serde::de::Deserialize<'de>,
            {
                if into.is_some() {
                    return Err(::serde::de::Error::duplicate_field(self.as_str()));
                }
                *into = Some(from.next_value()?);
                Ok(::serde::de::IgnoredAny)
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::de::Deserializer<'de>,
            {
                struct KeyVisitor;

                impl ::serde::de::Visitor<'_> for KeyVisitor {
                    type Value = $name;

                    fn expecting(&self, formatter: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                        formatter.write_str("a configuration key")
                    }

                    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
                    where
                        E: ::serde::de::Error,
                    {
                        Ok($name::from_str(value))
                    }
                }

                deserializer.deserialize_identifier(KeyVisitor)
            }
        }
    };
}
pub(crate) use config_field;

/// A [`Duration`] given either as a human-readable string (`"1s 500ms"`) or
/// as a plain number of seconds (`1.5`, `"1.5"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DurationValue(pub(crate) Duration);

impl<'de> Deserialize<'de> for DurationValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DurationValueVisitor)
    }
}

struct DurationValueVisitor;

impl DurationValueVisitor {
    fn from_secs<E>(secs: f64) -> Result<DurationValue, E>
    where
        E: Error,
    {
        Duration::try_from_secs_f64(secs)
            .map(DurationValue)
            .map_err(|_| Error::invalid_value(Unexpected::Float(secs), &"a non-negative duration"))
    }
}

impl Visitor<'_> for DurationValueVisitor {
    type Value = DurationValue;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a duration such as \"1s 500ms\", or a number of seconds")
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(DurationValue(Duration::from_secs(value)))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        u64::try_from(value)
            .map(|secs| DurationValue(Duration::from_secs(secs)))
            .map_err(|_| Error::invalid_value(Unexpected::Signed(value), &"a non-negative duration"))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Self::from_secs(value)
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let value = value.trim();

        if let Ok(secs) = value.parse::<f64>() {
            return Self::from_secs(secs);
        }

        parse_duration(value).map(DurationValue).map_err(Error::custom)
    }
}
