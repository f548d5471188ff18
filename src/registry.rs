use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::value::Value;

const DEFAULT_MISSING_TOKENS: [&str; 10] = [
    "", "NA", "N/A", "NaN", "null", "-", "?", "nil", "none", "missing",
];

const DEFAULT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y"];

const DEFAULT_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

/// Maps each [DataType] to its text parser, its missing-value sentinels and its default
/// substitute.
///
/// A registry is immutable once built. Create one with [TypeRegistry::builder] or use the
/// process-wide [TypeRegistry::global].
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// Lower-cased text tokens that denote a missing value.
    missing_tokens: Vec<String>,
    date_formats: Vec<String>,
    date_time_formats: Vec<String>,
    substitutes: HashMap<DataType, Value>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            missing_tokens: DEFAULT_MISSING_TOKENS
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(ToString::to_string).collect(),
            date_time_formats: DEFAULT_DATE_TIME_FORMATS
                .iter()
                .map(ToString::to_string)
                .collect(),
            substitutes: DataType::ALL
                .iter()
                .map(|kind| (*kind, default_substitute(*kind)))
                .collect(),
        }
    }
}

/// Built-in substitute for each kind: the minimum integer, NaN, or the epoch.
fn default_substitute(kind: DataType) -> Value {
    match kind {
        DataType::Bool => Value::Bool(false),
        DataType::Byte => Value::Byte(i8::MIN),
        DataType::Short => Value::Short(i16::MIN),
        DataType::Int => Value::Int(i32::MIN),
        DataType::Long => Value::Long(i64::MIN),
        DataType::Float => Value::Float(f32::NAN),
        DataType::Double => Value::Double(f64::NAN),
        DataType::Char => Value::Char('\0'),
        DataType::Text => Value::from(""),
        DataType::Date => Value::Date(NaiveDate::default()),
        DataType::DateTime => Value::DateTime(NaiveDateTime::default()),
    }
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Returns the process-wide registry, initialising it with defaults on first use.
    pub fn global() -> &'static TypeRegistry {
        GLOBAL.get_or_init(TypeRegistry::default)
    }

    /// Installs `registry` as the process-wide registry. This may happen at most once and
    /// only before the first call to [TypeRegistry::global].
    ///
    /// # Errors
    /// Returns a configuration error if a global registry is already in place.
    pub fn install_global(registry: TypeRegistry) -> Result<()> {
        GLOBAL.set(registry).map_err(|_| {
            Error::Configuration("the global type registry is already initialised".into())
        })
    }

    /// Returns `true` if `text` is one of the missing-value sentinels (case-insensitive,
    /// surrounding whitespace ignored).
    pub fn is_missing_token(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        self.missing_tokens.iter().any(|t| *t == text)
    }

    /// Returns the default substitute registered for `kind`.
    pub fn substitute(&self, kind: DataType) -> Value {
        self.substitutes
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| default_substitute(kind))
    }

    /// Parses a text cell into a value of `kind`. Missing-value sentinels become
    /// [Value::Null]; any other text that does not parse is an error, never a silent null.
    pub fn parse(&self, kind: DataType, text: &str) -> Result<Value> {
        if self.is_missing_token(text) {
            return Ok(Value::Null);
        }
        self.parse_literal(kind, text)
    }

    /// Parses `text` as `kind` without sentinel detection. Used by the query compiler,
    /// where a literal always denotes a concrete value.
    pub fn parse_literal(&self, kind: DataType, text: &str) -> Result<Value> {
        let trimmed = text.trim();
        let err = || Error::Parse {
            kind,
            text: text.to_string(),
        };
        let value = match kind {
            DataType::Bool => Value::Bool(parse_bool(trimmed).ok_or_else(err)?),
            DataType::Byte => Value::Byte(trimmed.parse().map_err(|_| err())?),
            DataType::Short => Value::Short(trimmed.parse().map_err(|_| err())?),
            DataType::Int => Value::Int(trimmed.parse().map_err(|_| err())?),
            DataType::Long => Value::Long(trimmed.parse().map_err(|_| err())?),
            DataType::Float => Value::Float(trimmed.parse().map_err(|_| err())?),
            DataType::Double => Value::Double(trimmed.parse().map_err(|_| err())?),
            DataType::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => return Err(err()),
                }
            }
            DataType::Text => Value::from(text),
            DataType::Date => Value::Date(self.parse_date(trimmed).ok_or_else(err)?),
            DataType::DateTime => {
                Value::DateTime(self.parse_date_time(trimmed).ok_or_else(err)?)
            }
        };
        Ok(value)
    }

    fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        self.date_formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    }

    /// Date-time text falls back to the date formats, yielding midnight.
    fn parse_date_time(&self, text: &str) -> Option<NaiveDateTime> {
        self.date_time_formats
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .or_else(|| self.parse_date(text)?.and_hms_opt(0, 0, 0))
    }

    /// Smallest numeric kind able to hold the literal `text`.
    ///
    /// Integral literals are tried as byte, short, int then long; other numeric literals
    /// as float (when within `f32` range) then double. Returns `None` for non-numeric
    /// text. The rule depends only on the literal's value, never on table order.
    ///
    /// ```
    /// # use colframe::{DataType, TypeRegistry};
    /// let registry = TypeRegistry::default();
    /// assert_eq!(registry.narrowest_numeric_kind("100"), Some(DataType::Byte));
    /// assert_eq!(registry.narrowest_numeric_kind("40000"), Some(DataType::Int));
    /// assert_eq!(registry.narrowest_numeric_kind("2.5"), Some(DataType::Float));
    /// assert_eq!(registry.narrowest_numeric_kind("abc"), None);
    /// ```
    pub fn narrowest_numeric_kind(&self, text: &str) -> Option<DataType> {
        let text = text.trim();
        if text.parse::<i8>().is_ok() {
            return Some(DataType::Byte);
        }
        if text.parse::<i16>().is_ok() {
            return Some(DataType::Short);
        }
        if text.parse::<i32>().is_ok() {
            return Some(DataType::Int);
        }
        if text.parse::<i64>().is_ok() {
            return Some(DataType::Long);
        }
        let value = text.parse::<f64>().ok()?;
        if !value.is_finite() || value.abs() <= f64::from(f32::MAX) {
            Some(DataType::Float)
        } else {
            Some(DataType::Double)
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Builder for a customised [TypeRegistry]. Starts from the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistryBuilder {
    registry: TypeRegistry,
}

impl TypeRegistryBuilder {
    /// Adds a missing-value sentinel.
    pub fn missing_token(mut self, token: &str) -> Self {
        self.registry.missing_tokens.push(token.trim().to_lowercase());
        self
    }

    /// Replaces the missing-value sentinels.
    pub fn missing_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.missing_tokens = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    /// Replaces the accepted date formats (chrono syntax).
    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.date_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the accepted date-time formats (chrono syntax).
    pub fn date_time_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.date_time_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn substitute(mut self, kind: DataType, value: Value) -> Self {
        self.registry.substitutes.insert(kind, value);
        self
    }

    /// Validates and returns the registry.
    ///
    /// # Errors
    /// Returns a configuration error if a substitute does not match its kind, or if no
    /// date or date-time format is configured.
    pub fn build(self) -> Result<TypeRegistry> {
        for (kind, value) in &self.registry.substitutes {
            if value.data_type() != Some(*kind) {
                return Err(Error::Configuration(format!(
                    "substitute {value:?} is not a {kind} value"
                )));
            }
        }
        if self.registry.date_formats.is_empty() {
            return Err(Error::Configuration("no date format configured".into()));
        }
        if self.registry.date_time_formats.is_empty() {
            return Err(Error::Configuration("no date-time format configured".into()));
        }
        Ok(self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : missing-value sentinels
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_missing_tokens() {
        let registry = TypeRegistry::default();
        for token in ["", "  ", "NA", "na", "N/A", "null", "NULL", "-", "?"] {
            assert!(registry.is_missing_token(token), "{token:?}");
        }
        assert!(!registry.is_missing_token("0"));
        assert_eq!(registry.parse(DataType::Int, "NA").unwrap(), Value::Null);
        assert_eq!(registry.parse(DataType::Text, "n/a").unwrap(), Value::Null);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : parsing every kind
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_parse_kinds() {
        let r = TypeRegistry::default();
        assert_eq!(r.parse(DataType::Bool, "Yes").unwrap(), Value::Bool(true));
        assert_eq!(r.parse(DataType::Byte, "-12").unwrap(), Value::Byte(-12));
        assert_eq!(r.parse(DataType::Short, "1200").unwrap(), Value::Short(1200));
        assert_eq!(r.parse(DataType::Int, " 42 ").unwrap(), Value::Int(42));
        assert_eq!(r.parse(DataType::Long, "9000000000").unwrap(), Value::Long(9_000_000_000));
        assert_eq!(r.parse(DataType::Float, "1.5").unwrap(), Value::Float(1.5));
        assert_eq!(r.parse(DataType::Double, "2.25").unwrap(), Value::Double(2.25));
        assert_eq!(r.parse(DataType::Char, "x").unwrap(), Value::Char('x'));
        assert_eq!(r.parse(DataType::Text, "hello").unwrap(), Value::from("hello"));
        assert_eq!(
            r.parse(DataType::Date, "2021-06-30").unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2021, 6, 30).unwrap())
        );
        assert_eq!(
            r.parse(DataType::DateTime, "2021-06-30T10:15:00").unwrap(),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2021, 6, 30)
                    .unwrap()
                    .and_hms_opt(10, 15, 0)
                    .unwrap()
            )
        );
        assert_eq!(
            r.parse(DataType::DateTime, "2021-06-30").unwrap(),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2021, 6, 30)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : parse failures are errors, not nulls
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_parse_failures() {
        let r = TypeRegistry::default();
        assert!(matches!(
            r.parse(DataType::Byte, "300"),
            Err(Error::Parse { kind: DataType::Byte, .. })
        ));
        assert!(r.parse(DataType::Int, "abc").is_err());
        assert!(r.parse(DataType::Char, "ab").is_err());
        assert!(r.parse(DataType::Date, "2021-13-01").is_err());
        assert!(r.parse(DataType::Bool, "maybe").is_err());
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : narrowest numeric kind
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_narrowest_numeric_kind() {
        let r = TypeRegistry::default();
        assert_eq!(r.narrowest_numeric_kind("-128"), Some(DataType::Byte));
        assert_eq!(r.narrowest_numeric_kind("128"), Some(DataType::Short));
        assert_eq!(r.narrowest_numeric_kind("70000"), Some(DataType::Int));
        assert_eq!(r.narrowest_numeric_kind("5000000000"), Some(DataType::Long));
        assert_eq!(r.narrowest_numeric_kind("0.1"), Some(DataType::Float));
        assert_eq!(r.narrowest_numeric_kind("1e300"), Some(DataType::Double));
        assert_eq!(r.narrowest_numeric_kind("2020-01-01"), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : substitutes and builder validation
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_substitutes_and_builder() {
        let r = TypeRegistry::default();
        assert_eq!(r.substitute(DataType::Int), Value::Int(i32::MIN));
        assert!(matches!(r.substitute(DataType::Double), Value::Double(v) if v.is_nan()));
        assert_eq!(
            r.substitute(DataType::Date),
            Value::Date(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
        );

        let custom = TypeRegistry::builder()
            .missing_token("n.a.")
            .substitute(DataType::Int, Value::Int(0))
            .build()
            .unwrap();
        assert!(custom.is_missing_token("N.A."));
        assert_eq!(custom.substitute(DataType::Int), Value::Int(0));

        let bad = TypeRegistry::builder()
            .substitute(DataType::Int, Value::from("zero"))
            .build();
        assert!(matches!(bad, Err(Error::Configuration(_))));

        let no_dates = TypeRegistry::builder()
            .date_formats(Vec::<String>::new())
            .build();
        assert!(matches!(no_dates, Err(Error::Configuration(_))));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 6 : custom date formats
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_custom_date_formats() {
        let r = TypeRegistry::builder()
            .date_formats(["%d.%m.%Y"])
            .build()
            .unwrap();
        assert_eq!(
            r.parse(DataType::Date, "01.02.2020").unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2020, 2, 1).unwrap())
        );
        assert!(r.parse(DataType::Date, "2020-02-01").is_err());
    }
}
