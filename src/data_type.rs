use std::fmt;

/// The closed set of scalar kinds a column may hold.
///
/// Every dispatch over column behaviour matches on this enum exhaustively, so adding a
/// kind forces every site (storage, parsing, predicates, joins, aggregation) to be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A boolean value (true or false).
    Bool,
    /// An 8-bit signed integer.
    Byte,
    /// A 16-bit signed integer.
    Short,
    /// A 32-bit signed integer.
    Int,
    /// A 64-bit signed integer.
    Long,
    /// A 32-bit floating-point number.
    Float,
    /// A 64-bit floating-point number.
    Double,
    /// A single unicode scalar value.
    Char,
    /// A variable-length UTF-8 character string.
    Text,
    /// A calendar date without time zone.
    Date,
    /// A date and time of day without time zone.
    DateTime,
}

impl DataType {
    /// Every kind, in declaration order.
    pub const ALL: [DataType; 11] = [
        DataType::Bool,
        DataType::Byte,
        DataType::Short,
        DataType::Int,
        DataType::Long,
        DataType::Float,
        DataType::Double,
        DataType::Char,
        DataType::Text,
        DataType::Date,
        DataType::DateTime,
    ];

    /// Returns `true` for the integral kinds (byte, short, int, long).
    pub fn is_integral(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    /// Returns `true` for the floating-point kinds (float, double).
    pub fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    /// Kinds with a natural total order usable by range comparisons.
    /// Booleans only support equality.
    pub fn is_orderable(self) -> bool {
        !matches!(self, Self::Bool)
    }

    /// Position of a numeric kind inside its widening chain
    /// (byte → short → int → long, float → double).
    fn widening_rank(self) -> Option<u8> {
        match self {
            Self::Byte | Self::Float => Some(0),
            Self::Short | Self::Double => Some(1),
            Self::Int => Some(2),
            Self::Long => Some(3),
            Self::Bool | Self::Char | Self::Text | Self::Date | Self::DateTime => None,
        }
    }

    /// Returns `true` if every value of `self` is representable as `target` without loss.
    ///
    /// Widening stays inside a chain, except that an integral kind may widen into a
    /// floating kind whose mantissa holds all of its values (byte and short into float,
    /// up to int into double), and a date widens to a date-time at midnight.
    ///
    /// ```
    /// # use colframe::DataType;
    /// assert!(DataType::Byte.widens_to(DataType::Long));
    /// assert!(!DataType::Long.widens_to(DataType::Int));
    /// assert!(DataType::Int.widens_to(DataType::Double));
    /// assert!(!DataType::Int.widens_to(DataType::Float));
    /// assert!(!DataType::Double.widens_to(DataType::Float));
    /// ```
    pub fn widens_to(self, target: DataType) -> bool {
        if self == target {
            return true;
        }
        if self == Self::Date && target == Self::DateTime {
            return true;
        }
        if self.is_integral() && target.is_floating() {
            return match target {
                Self::Float => matches!(self, Self::Byte | Self::Short),
                _ => matches!(self, Self::Byte | Self::Short | Self::Int),
            };
        }
        match (self.widening_rank(), target.widening_rank()) {
            (Some(from), Some(to)) => self.is_integral() == target.is_integral() && from <= to,
            _ => false,
        }
    }

    /// The lower-case name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "character",
            Self::Text => "string",
            Self::Date => "date",
            Self::DateTime => "date-time",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
