use std::cmp::Ordering;
use std::fmt;

/// Location of a delta within its sibling list.
///
/// A `Name` addresses an object member, an `Index` an array slot. Positions
/// only order against positions of the same kind; comparing a name with an
/// index yields `None`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Name(String),
    Index(usize),
}

impl Position {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Name(_) => None,
        }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Name(a), Self::Name(b)) => Some(a.cmp(b)),
            (Self::Index(a), Self::Index(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<usize> for Position {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Position {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_positions_order() {
        assert!(Position::name("a") < Position::name("b"));
        assert!(Position::Index(2) < Position::Index(10));
    }

    #[test]
    fn mixed_kinds_are_unordered() {
        assert_eq!(Position::name("a").partial_cmp(&Position::Index(0)), None);
        assert!(!(Position::name("a") < Position::Index(0)));
        assert!(!(Position::name("a") > Position::Index(0)));
    }

    #[test]
    fn display() {
        assert_eq!(Position::name("key").to_string(), "key");
        assert_eq!(Position::Index(3).to_string(), "3");
    }
}
