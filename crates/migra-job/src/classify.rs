//! Output-lane classification for person records

use crate::models::Person;

/// Named output lane a classified record is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Destined for the database sink.
    Valid,
    /// Destined for the invalid-records file sink.
    Invalid,
}

/// Pure, total, deterministic: `Valid` iff the person-validity invariant
/// holds. Bank accounts have no classifier; their pipeline routes every
/// record down a single implicit lane.
pub fn classify(person: &Person) -> Lane {
    if person.is_valid() {
        Lane::Valid
    } else {
        Lane::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FromFields;

    #[test]
    fn test_classify_matches_validity() {
        let valid =
            Person::from_fields(&["Ana", "ana@x.com", "1990-01-01 00:00:00", "33", "1"]).unwrap();
        let invalid =
            Person::from_fields(&["", "bad@x.com", "2000-01-01 00:00:00", "20", "2"]).unwrap();

        assert_eq!(classify(&valid), Lane::Valid);
        assert_eq!(classify(&invalid), Lane::Invalid);
    }
}
