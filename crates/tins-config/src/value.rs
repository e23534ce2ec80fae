//! Per-key tolerant readers.
//!
//! Each key is read on its own. A missing key silently keeps its default; a
//! key with the wrong type or an out-of-range value logs a warning naming the
//! key, the rejected value and the default it falls back to.

use std::fmt::Display;
use std::str::FromStr;

use toml::{Table, Value};
use tins_synth::db_to_linear;

/// Parse a number with an optional unit suffix.
///
/// Supports:
/// - Plain numbers: "0.5", "440"
/// - Milliseconds: "100ms" (converted to seconds)
/// - Seconds: "0.3s"
/// - Decibels: "-6dB" (converted to linear gain)
/// - Percentages: "50%" (converted to 0..1)
///
/// # Example
///
/// ```rust
/// use tins_config::parse_quantity;
///
/// assert_eq!(parse_quantity("0.5"), Some(0.5));
/// assert_eq!(parse_quantity("250ms"), Some(0.25));
/// assert_eq!(parse_quantity("50%"), Some(0.5));
/// assert!((parse_quantity("-6dB").unwrap() - 0.501).abs() < 0.001);
/// ```
pub fn parse_quantity(value: &str) -> Option<f32> {
    let value = value.trim();

    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse::<f32>().ok().map(|v| v / 100.0);
    }

    if let Some(db) = value
        .strip_suffix("dB")
        .or_else(|| value.strip_suffix("db"))
    {
        return db.trim().parse::<f32>().ok().map(db_to_linear);
    }

    if let Some(ms) = value.strip_suffix("ms") {
        return ms.trim().parse::<f32>().ok().map(|v| v / 1000.0);
    }

    if let Some(s) = value.strip_suffix('s') {
        return s.trim().parse::<f32>().ok();
    }

    value.parse::<f32>().ok()
}

/// One `[section]` of the config file.
pub(crate) struct Section<'a> {
    name: &'a str,
    table: Option<&'a Table>,
}

impl<'a> Section<'a> {
    /// Look up `name` in `root`. A non-table value is reported and ignored.
    pub(crate) fn new(root: &'a Table, name: &'a str) -> Self {
        let table = match root.get(name) {
            Some(Value::Table(table)) => Some(table),
            Some(other) => {
                tracing::warn!(
                    section = name,
                    value = %other,
                    "config section is not a table, using defaults"
                );
                None
            }
            None => None,
        };
        Self { name, table }
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.table.and_then(|t| t.get(key))
    }

    fn reject(&self, key: &str, value: &Value, default: &dyn Display) {
        tracing::warn!(
            section = self.name,
            key,
            value = %value,
            default = %default,
            "invalid config value, keeping default"
        );
    }

    /// A float, an integer, or a string with a unit suffix.
    pub(crate) fn f32(&self, key: &str, default: f32, valid: impl Fn(f32) -> bool) -> f32 {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        let parsed = match raw {
            Value::Float(f) => Some(*f as f32),
            Value::Integer(i) => Some(*i as f32),
            Value::String(s) => parse_quantity(s),
            _ => None,
        };
        match parsed {
            Some(v) if valid(v) => v,
            _ => {
                self.reject(key, raw, &default);
                default
            }
        }
    }

    /// An integer that fits `T`.
    pub(crate) fn int<T>(&self, key: &str, default: T, valid: impl Fn(T) -> bool) -> T
    where
        T: TryFrom<i64> + Display + Copy,
    {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        let parsed = match raw {
            Value::Integer(i) => T::try_from(*i).ok(),
            _ => None,
        };
        match parsed {
            Some(v) if valid(v) => v,
            _ => {
                self.reject(key, raw, &default);
                default
            }
        }
    }

    pub(crate) fn bool(&self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            None => default,
            Some(Value::Boolean(b)) => *b,
            Some(raw) => {
                self.reject(key, raw, &default);
                default
            }
        }
    }

    /// A string parsed with `FromStr`.
    pub(crate) fn parsed<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Display,
    {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        match raw.as_str().map(|s| s.trim().parse::<T>()) {
            Some(Ok(v)) => v,
            _ => {
                self.reject(key, raw, &default);
                default
            }
        }
    }

    /// Warn about keys this section does not define.
    pub(crate) fn warn_unknown(&self, known: &[&str]) {
        let Some(table) = self.table else {
            return;
        };
        for key in table.keys().filter(|k| !known.contains(&k.as_str())) {
            tracing::warn!(section = self.name, key = %key, "unknown config key ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn quantity_units() {
        assert_eq!(parse_quantity("0.25"), Some(0.25));
        assert_eq!(parse_quantity(" 10ms "), Some(0.01));
        assert_eq!(parse_quantity("2s"), Some(2.0));
        assert_eq!(parse_quantity("0 dB"), Some(1.0));
        assert_eq!(parse_quantity("75%"), Some(0.75));
        assert_eq!(parse_quantity("fast"), None);
        assert_eq!(parse_quantity("ms"), None);
    }

    #[test]
    fn f32_accepts_numbers_and_units() {
        let root = table("[s]\na = 0.5\nb = 2\nc = \"150ms\"\nd = true\ne = -1.0");
        let s = Section::new(&root, "s");
        let any = |_: f32| true;
        assert_eq!(s.f32("a", 9.0, any), 0.5);
        assert_eq!(s.f32("b", 9.0, any), 2.0);
        assert!((s.f32("c", 9.0, any) - 0.15).abs() < 1e-6);
        assert_eq!(s.f32("d", 9.0, any), 9.0, "wrong type keeps default");
        assert_eq!(s.f32("e", 9.0, |v| v >= 0.0), 9.0, "out of range keeps default");
        assert_eq!(s.f32("missing", 9.0, any), 9.0);
    }

    #[test]
    fn int_checks_width() {
        let root = table("[s]\nsmall = 12\nhuge = 99999999999\nneg = -3\nfloat = 1.5");
        let s = Section::new(&root, "s");
        assert_eq!(s.int::<u32>("small", 1, |_| true), 12);
        assert_eq!(s.int::<u32>("huge", 1, |_| true), 1);
        assert_eq!(s.int::<u32>("neg", 1, |_| true), 1);
        assert_eq!(s.int::<i32>("neg", 1, |_| true), -3);
        assert_eq!(s.int::<usize>("float", 7, |_| true), 7);
    }

    #[test]
    fn bool_and_parsed() {
        let root = table("[s]\nflag = true\nbad = 1\nshape = \"saw\"\nnope = \"kazoo\"");
        let s = Section::new(&root, "s");
        assert!(s.bool("flag", false));
        assert!(!s.bool("bad", false));
        assert_eq!(
            s.parsed("shape", tins_synth::WaveShape::Sine),
            tins_synth::WaveShape::Sawtooth
        );
        assert_eq!(
            s.parsed("nope", tins_synth::WaveShape::Sine),
            tins_synth::WaveShape::Sine
        );
    }

    #[test]
    fn non_table_section_is_empty() {
        let root = table("s = 3");
        let s = Section::new(&root, "s");
        assert_eq!(s.f32("a", 1.0, |_| true), 1.0);
        s.warn_unknown(&[]);
    }
}
