use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Global log position.
///
/// Sequences are shared by every key: the n-th successful log write carries
/// sequence `n - 1`. Before anything has been written the log sits at the
/// [`Sequence::initial`] sentinel `-1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Sequence(i64);

impl Sequence {
    /// Sentinel position before the first entry.
    pub const fn initial() -> Self {
        Self(-1)
    }

    /// Validate a sequence read from a stored document.
    pub fn new(value: i64) -> Result<Self, TypeError> {
        if value < -1 {
            return Err(TypeError::InvalidSequence(value));
        }
        Ok(Self(value))
    }

    /// The position immediately after this one.
    pub fn next(self) -> Result<Self, TypeError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(TypeError::SequenceOverflow(self.0))
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Returns `true` for the pre-genesis sentinel.
    pub const fn is_initial(self) -> bool {
        self.0 == -1
    }
}

impl TryFrom<i64> for Sequence {
    type Error = TypeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sequence> for i64 {
    fn from(seq: Sequence) -> Self {
        seq.0
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({})", self.0)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_advances_to_zero() {
        let seq = Sequence::initial();
        assert!(seq.is_initial());
        assert_eq!(seq.next().unwrap().value(), 0);
        assert_eq!(seq.next().unwrap().next().unwrap().value(), 1);
    }

    #[test]
    fn last_position_does_not_wrap() {
        let last = Sequence::new(i64::MAX).unwrap();
        assert_eq!(last.next(), Err(TypeError::SequenceOverflow(i64::MAX)));
    }

    #[test]
    fn rejects_below_sentinel() {
        assert_eq!(Sequence::new(-2), Err(TypeError::InvalidSequence(-2)));
        assert!(Sequence::new(-1).is_ok());
        assert!(Sequence::new(0).is_ok());
    }

    #[test]
    fn serde_is_a_bare_integer() {
        let json = serde_json::to_string(&Sequence::new(7).unwrap()).unwrap();
        assert_eq!(json, "7");
        let back: Sequence = serde_json::from_str("7").unwrap();
        assert_eq!(back.value(), 7);
        assert!(serde_json::from_str::<Sequence>("-5").is_err());
    }

    #[test]
    fn ordering_follows_value() {
        let a = Sequence::new(3).unwrap();
        let b = Sequence::new(4).unwrap();
        assert!(a < b);
        assert_eq!(a.next(), Ok(b));
    }
}
