/// Comparison operators of the filter language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    /// `~=`, regular-expression match, strings only.
    Match,
}

impl ComparisonOp {
    /// The operator obtained by swapping both operands (`a < b` ≡ `b > a`).
    /// `~=` has no mirror.
    pub fn mirrored(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Eq),
            Self::NotEq => Some(Self::NotEq),
            Self::Gt => Some(Self::Lt),
            Self::GtEq => Some(Self::LtEq),
            Self::Lt => Some(Self::Gt),
            Self::LtEq => Some(Self::GtEq),
            Self::Match => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Match => "~=",
        }
    }
}

/// One side of a comparison. Whether it names a column or holds a literal is decided at
/// compile time against the table's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub text: String,
    pub quoted: bool,
    /// Character offset of the operand in the source text.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Comparison {
        left: Operand,
        op: ComparisonOp,
        right: Operand,
        /// Character offset of the operator.
        position: usize,
    },
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },
}
