use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::data_type::DataType;

/// Represents a single cell value.
///
/// `Null` is the true-absence marker. It is distinct from the registry's default
/// substitutes (see [crate::TypeRegistry::substitute]), which are ordinary values.
#[derive(Debug, Clone)]
pub enum Value {
    /// represents an empty or missing value.
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    /// A UTF-8 string value, wrapped in an [Arc] for cheap cloning.
    Text(Arc<str>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns `true` if the value is [Value::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the logical [DataType] corresponding to this value.
    ///
    /// Returns `None` if the value is [Value::Null]: a standalone NULL is untyped until
    /// it is placed in a column.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(DataType::Bool),
            Self::Byte(_) => Some(DataType::Byte),
            Self::Short(_) => Some(DataType::Short),
            Self::Int(_) => Some(DataType::Int),
            Self::Long(_) => Some(DataType::Long),
            Self::Float(_) => Some(DataType::Float),
            Self::Double(_) => Some(DataType::Double),
            Self::Char(_) => Some(DataType::Char),
            Self::Text(_) => Some(DataType::Text),
            Self::Date(_) => Some(DataType::Date),
            Self::DateTime(_) => Some(DataType::DateTime),
        }
    }

    /// Returns the value as `i64` if it is integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `f64` if it is numeric.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a date-time, promoting dates to midnight.
    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => d.and_hms_opt(0, 0, 0),
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Converts the value to `target` when the conversion is a lossless widening
    /// (see [DataType::widens_to]). `Null` converts to `Null`.
    ///
    /// ```
    /// # use colframe::{DataType, Value};
    /// assert_eq!(Value::Byte(7).coerce_to(DataType::Long), Some(Value::Long(7)));
    /// assert_eq!(Value::Long(7).coerce_to(DataType::Byte), None);
    /// ```
    #[allow(clippy::cast_possible_truncation)]
    pub fn coerce_to(&self, target: DataType) -> Option<Value> {
        let Some(kind) = self.data_type() else {
            return Some(Value::Null);
        };
        if kind == target {
            return Some(self.clone());
        }
        if !kind.widens_to(target) {
            return None;
        }
        match target {
            DataType::Long => self.as_i64().map(Value::Long),
            DataType::Int => self.as_i64().and_then(|v| i32::try_from(v).ok()).map(Value::Int),
            DataType::Short => self.as_i64().and_then(|v| i16::try_from(v).ok()).map(Value::Short),
            DataType::Double => self.as_f64().map(Value::Double),
            DataType::Float => self.as_f64().map(|v| Value::Float(v as f32)),
            DataType::DateTime => self.as_date_time().map(Value::DateTime),
            _ => None,
        }
    }

    /// Orders two values of compatible kinds.
    ///
    /// `Null` sorts before every other value and equals itself. Numeric kinds compare
    /// across widths, dates compare against date-times at midnight. Floating values use
    /// IEEE total ordering so the result is always defined. Returns `None` when the
    /// kinds are not comparable (e.g. text against int).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Null, _) => Some(Ordering::Less),
            (_, Self::Null) => Some(Ordering::Greater),
            (Self::Bool(l), Self::Bool(r)) => Some(l.cmp(r)),
            (Self::Char(l), Self::Char(r)) => Some(l.cmp(r)),
            (Self::Text(l), Self::Text(r)) => Some(l.cmp(r)),
            (Self::Date(l), Self::Date(r)) => Some(l.cmp(r)),
            (Self::Float(l), Self::Float(r)) => Some(l.total_cmp(r)),
            (Self::Double(l), Self::Double(r)) => Some(l.total_cmp(r)),
            (l, r) if l.is_temporal() && r.is_temporal() => {
                Some(l.as_date_time()?.cmp(&r.as_date_time()?))
            }
            (l, r) => match (l.as_i64(), r.as_i64()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => Some(l.as_f64()?.total_cmp(&r.as_f64()?)),
            },
        }
    }

    fn is_temporal(&self) -> bool {
        matches!(self, Self::Date(_) | Self::DateTime(_))
    }

    /// Stable tag hashed ahead of the payload.
    fn discriminant(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Byte(_) => 2,
            Self::Short(_) => 3,
            Self::Int(_) => 4,
            Self::Long(_) => 5,
            Self::Float(_) => 6,
            Self::Double(_) => 7,
            Self::Char(_) => 8,
            Self::Text(_) => 9,
            Self::Date(_) => 10,
            Self::DateTime(_) => 11,
        }
    }
}

/// Structural equality: same kind and same content. Floats are equal when their bit
/// patterns are, which keeps `Eq` and `Hash` consistent for grouping and join keys.
/// Cross-kind numeric equality is the job of [Value::compare].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(l), Self::Bool(r)) => l == r,
            (Self::Byte(l), Self::Byte(r)) => l == r,
            (Self::Short(l), Self::Short(r)) => l == r,
            (Self::Int(l), Self::Int(r)) => l == r,
            (Self::Long(l), Self::Long(r)) => l == r,
            (Self::Float(l), Self::Float(r)) => l.to_bits() == r.to_bits(),
            (Self::Double(l), Self::Double(r)) => l.to_bits() == r.to_bits(),
            (Self::Char(l), Self::Char(r)) => l == r,
            (Self::Text(l), Self::Text(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::DateTime(l), Self::DateTime(r)) => l == r,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Byte(v) => v.hash(state),
            Self::Short(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Long(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::Char(v) => v.hash(state),
            Self::Text(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
            Self::DateTime(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(Arc::from(v))
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
