use core::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::PairId;

/// A unit of data flowing from a generator to its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Number(u32),
    Letter(char),
    /// Marks the end of a generator's sequence.
    End,
}

impl Item {
    /// Returns the kind and the value of this item, or `None` for the
    /// sentinel.
    #[inline]
    pub fn split(self) -> Option<(Kind, Value)> {
        match self {
            Self::Number(v) => Some((Kind::Number, Value::Integer(v))),
            Self::Letter(v) => Some((Kind::Letter, Value::Text(v.to_string()))),
            Self::End => None,
        }
    }

    #[inline]
    pub const fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

/// Kind of a non-sentinel item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Number,
    Letter,
}

impl Display for Kind {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            Self::Number => fmt.write_str("number"),
            Self::Letter => fmt.write_str("letter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(u32),
    Text(String),
}

impl Display for Value {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            Self::Integer(v) => Display::fmt(v, fmt),
            Self::Text(v) => fmt.write_str(v),
        }
    }
}

/// Update notification, one per non-sentinel item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Update {
    pub pair: PairId,
    pub kind: Kind,
    pub value: Value,
}

impl Update {
    /// Constructs a new [`Update`] from the given item, unless it is the
    /// sentinel.
    #[inline]
    pub fn new(pair: PairId, item: Item) -> Option<Self> {
        item.split().map(|(kind, value)| Self { pair, kind, value })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_split() {
        assert_eq!(Some((Kind::Number, Value::Integer(7))), Item::Number(7).split());
        assert_eq!(Some((Kind::Letter, Value::Text("Q".into()))), Item::Letter('Q').split());
        assert_eq!(None, Item::End.split());
    }

    #[test]
    fn test_update_json() {
        let update = Update::new(PairId(1), Item::Letter('A')).unwrap();
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(r#"{"pair":1,"kind":"letter","value":"A"}"#, json);

        let update = Update::new(PairId(2), Item::Number(30)).unwrap();
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(r#"{"pair":2,"kind":"number","value":30}"#, json);
    }

    #[test]
    fn test_no_update_for_end() {
        assert!(Update::new(PairId(1), Item::End).is_none());
    }
}
