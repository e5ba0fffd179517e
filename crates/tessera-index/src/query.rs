//! Query operators and arguments understood by secondary indexes.

use regex::{Regex, RegexBuilder};
use tessera_common::{Result, TesseraError, Value};

/// Comparison kinds accepted by `SecondaryIndex::query`.
///
/// Every operator can be combined with a negation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Like,
    In,
    NotIn,
    Between,
    Is,
}

impl QueryOperator {
    /// Resolves the operator aliases.
    ///
    /// `NotEqual` becomes a negated `Equal` and `NotIn` a negated `In`, so
    /// each query is answered by one of the remaining base operators.
    pub fn normalize(self, negate: bool) -> (QueryOperator, bool) {
        match self {
            QueryOperator::NotEqual => (QueryOperator::Equal, !negate),
            QueryOperator::NotIn => (QueryOperator::In, !negate),
            op => (op, negate),
        }
    }
}

impl std::fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueryOperator::Equal => "=",
            QueryOperator::NotEqual => "<>",
            QueryOperator::Greater => ">",
            QueryOperator::GreaterOrEqual => ">=",
            QueryOperator::Less => "<",
            QueryOperator::LessOrEqual => "<=",
            QueryOperator::Like => "LIKE",
            QueryOperator::In => "IN",
            QueryOperator::NotIn => "NOT IN",
            QueryOperator::Between => "BETWEEN",
            QueryOperator::Is => "IS",
        };
        write!(f, "{}", s)
    }
}

/// The right-hand side of a query.
#[derive(Debug, Clone)]
pub enum QueryArg {
    /// A single value.
    Value(Value),
    /// A set of values, for `In` / `NotIn`.
    List(Vec<Value>),
    /// Inclusive bounds, for `Between`.
    Range { min: Value, max: Value },
    /// A compiled pattern, for `Like`.
    Pattern(Regex),
}

impl QueryArg {
    pub fn value(v: impl Into<Value>) -> Self {
        QueryArg::Value(v.into())
    }

    pub fn list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        QueryArg::List(values.into_iter().map(Into::into).collect())
    }

    pub fn range(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        QueryArg::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Compiles a SQL LIKE pattern.
    pub fn like(pattern: &str) -> Result<Self> {
        like_to_regex(pattern).map(QueryArg::Pattern)
    }

    /// Returns the single value of this argument.
    pub(crate) fn single(&self, op: QueryOperator) -> Result<&Value> {
        match self {
            QueryArg::Value(v) => Ok(v),
            QueryArg::List(values) if values.len() == 1 => Ok(&values[0]),
            other => Err(TesseraError::InvalidQueryArgument(format!(
                "{} expects a single value, got {}",
                op,
                other.kind()
            ))),
        }
    }

    /// Returns the values of a set argument; a single value is a set of one.
    pub(crate) fn values(&self, op: QueryOperator) -> Result<&[Value]> {
        match self {
            QueryArg::Value(v) => Ok(std::slice::from_ref(v)),
            QueryArg::List(values) => Ok(values),
            other => Err(TesseraError::InvalidQueryArgument(format!(
                "{} expects a list of values, got {}",
                op,
                other.kind()
            ))),
        }
    }

    /// Returns the `(min, max)` bounds of a range argument.
    pub(crate) fn bounds(&self) -> Result<(&Value, &Value)> {
        match self {
            QueryArg::Range { min, max } => Ok((min, max)),
            other => Err(TesseraError::InvalidQueryArgument(format!(
                "BETWEEN expects min and max bounds, got {}",
                other.kind()
            ))),
        }
    }

    /// Returns the compiled pattern, compiling a text argument as LIKE.
    pub(crate) fn pattern(&self) -> Result<Regex> {
        match self {
            QueryArg::Pattern(re) => Ok(re.clone()),
            QueryArg::Value(Value::Null) => Err(TesseraError::InvalidQueryArgument(
                "LIKE pattern cannot be NULL".to_string(),
            )),
            QueryArg::Value(v) => like_to_regex(&v.to_string()),
            other => Err(TesseraError::InvalidQueryArgument(format!(
                "LIKE expects a pattern, got {}",
                other.kind()
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            QueryArg::Value(_) => "a value",
            QueryArg::List(_) => "a list",
            QueryArg::Range { .. } => "a range",
            QueryArg::Pattern(_) => "a pattern",
        }
    }
}

impl From<Value> for QueryArg {
    fn from(v: Value) -> Self {
        QueryArg::Value(v)
    }
}

impl From<Regex> for QueryArg {
    fn from(re: Regex) -> Self {
        QueryArg::Pattern(re)
    }
}

/// Translates a SQL LIKE pattern into an anchored, case-insensitive regex.
///
/// `%` matches any run of characters, `_` exactly one, and a backslash
/// escapes the following character.
pub fn like_to_regex(pattern: &str) -> Result<Regex> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4]))),
                None => out.push_str(r"\\"),
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    RegexBuilder::new(&out)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| TesseraError::InvalidQueryArgument(format!("invalid LIKE pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            QueryOperator::NotEqual.normalize(false),
            (QueryOperator::Equal, true)
        );
        assert_eq!(
            QueryOperator::NotEqual.normalize(true),
            (QueryOperator::Equal, false)
        );
        assert_eq!(QueryOperator::NotIn.normalize(false), (QueryOperator::In, true));
        assert_eq!(
            QueryOperator::Between.normalize(true),
            (QueryOperator::Between, true)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryOperator::GreaterOrEqual.to_string(), ">=");
        assert_eq!(QueryOperator::NotIn.to_string(), "NOT IN");
    }

    #[test]
    fn test_like_translation() {
        let re = like_to_regex("ab%").unwrap();
        assert!(re.is_match("abc"));
        assert!(re.is_match("AB"));
        assert!(!re.is_match("xab"));

        let re = like_to_regex("a_c").unwrap();
        assert!(re.is_match("abc"));
        assert!(!re.is_match("abbc"));

        let re = like_to_regex("1.5%").unwrap();
        assert!(re.is_match("1.50"));
        assert!(!re.is_match("1x50"));

        let re = like_to_regex(r"100\%").unwrap();
        assert!(re.is_match("100%"));
        assert!(!re.is_match("1000"));
    }

    #[test]
    fn test_argument_shapes() {
        let arg = QueryArg::value(3);
        assert_eq!(arg.single(QueryOperator::Equal).unwrap(), &Value::Int32(3));
        assert_eq!(arg.values(QueryOperator::In).unwrap().len(), 1);
        assert!(arg.bounds().is_err());

        let arg = QueryArg::list([1, 2]);
        assert_eq!(arg.values(QueryOperator::In).unwrap().len(), 2);
        assert!(arg.single(QueryOperator::Equal).is_err());

        let arg = QueryArg::range(1, 5);
        let (min, max) = arg.bounds().unwrap();
        assert_eq!((min, max), (&Value::Int32(1), &Value::Int32(5)));
    }

    #[test]
    fn test_between_without_bounds_is_invalid() {
        let err = QueryArg::list([1, 5]).bounds().unwrap_err();
        assert!(matches!(err, TesseraError::InvalidQueryArgument(_)));
    }

    #[test]
    fn test_pattern_from_value() {
        let re = QueryArg::value("j%").pattern().unwrap();
        assert!(re.is_match("Jane"));
        assert!(QueryArg::Value(Value::Null).pattern().is_err());
        assert!(QueryArg::like("%x").unwrap().pattern().unwrap().is_match("box"));
    }
}
