//! Serde helpers for configuration values

/// `Duration` as whole seconds
///
/// Written as an integer. Reads either an integer number of seconds or a
/// string with an `s`, `m` or `h` suffix (`"45s"`, `"2m"`).
pub mod duration_secs {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SecondsVisitor)
    }

    struct SecondsVisitor;

    impl<'de> Visitor<'de> for SecondsVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number of seconds or a duration like \"30s\" or \"2m\"")
        }

        fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(secs))
        }

        fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Duration, E> {
            u64::try_from(secs)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("duration must not be negative: {}", secs)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
            parse(value).ok_or_else(|| E::custom(format!("invalid duration '{}'", value)))
        }
    }

    fn parse(value: &str) -> Option<Duration> {
        let value = value.trim();
        let (digits, scale) = match value.char_indices().last()? {
            (i, 's') => (&value[..i], 1),
            (i, 'm') => (&value[..i], 60),
            (i, 'h') => (&value[..i], 3600),
            _ => (value, 1),
        };
        let amount: u64 = digits.trim().parse().ok()?;
        amount.checked_mul(scale).map(Duration::from_secs)
    }
}
