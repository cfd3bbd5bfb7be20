//! Record lines: one sample point of the morphology.

use std::str::FromStr;

use smallvec::SmallVec;

use super::format::{RECORD_FIELDS, ROOT_PARENT};
use crate::util::{DVec3, Error, Result};

/// One parsed data line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    /// The format's own key for this sample.
    pub sample_id: i64,
    /// Structure type (soma, axon, dendrite, ...).
    pub type_id: i32,
    /// Sample position.
    pub position: DVec3,
    /// Sample radius.
    pub radius: f64,
    /// Sample identifier of the parent, [`ROOT_PARENT`] for roots.
    pub parent_id: i64,
}

impl Record {
    /// Create a record.
    pub fn new(sample_id: i64, type_id: i32, position: DVec3, radius: f64, parent_id: i64) -> Self {
        Self { sample_id, type_id, position, radius, parent_id }
    }

    /// Returns true if this sample has no parent.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT
    }

    /// Parse a record from a data line. `line_no` is 1-based and only used
    /// for error reporting.
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let tokens: SmallVec<[&str; RECORD_FIELDS]> = line.split_whitespace().collect();
        if tokens.len() != RECORD_FIELDS {
            return Err(Error::format(
                line_no,
                format!("expected {} fields, got {}", RECORD_FIELDS, tokens.len()),
            ));
        }

        let sample_id = parse_field(tokens[0], "sample identifier", line_no)?;
        let type_id = parse_field(tokens[1], "type identifier", line_no)?;
        let x = parse_field(tokens[2], "x", line_no)?;
        let y = parse_field(tokens[3], "y", line_no)?;
        let z = parse_field(tokens[4], "z", line_no)?;
        let radius = parse_field(tokens[5], "radius", line_no)?;
        let parent_id = parse_field(tokens[6], "parent identifier", line_no)?;

        Ok(Self::new(sample_id, type_id, DVec3::new(x, y, z), radius, parent_id))
    }
}

fn parse_field<T: FromStr>(token: &str, field: &str, line_no: usize) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::format(line_no, format!("invalid {}: '{}'", field, token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let r = Record::parse("2 3 1.0 -0.5 2e1 0.25 1", 4).unwrap();
        assert_eq!(r.sample_id, 2);
        assert_eq!(r.type_id, 3);
        assert_eq!(r.position, DVec3::new(1.0, -0.5, 20.0));
        assert_eq!(r.radius, 0.25);
        assert_eq!(r.parent_id, 1);
        assert!(!r.is_root());
    }

    #[test]
    fn test_parse_tabs_and_root() {
        let r = Record::parse("1\t1\t0\t0\t0\t1.5\t-1", 1).unwrap();
        assert!(r.is_root());
        assert_eq!(r.radius, 1.5);
    }

    #[test]
    fn test_short_line() {
        let err = Record::parse("1 1 0.0 0.0", 9).unwrap_err();
        match err {
            Error::Format { line, message } => {
                assert_eq!(line, 9);
                assert!(message.contains("got 4"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_numbers() {
        assert!(matches!(
            Record::parse("1 1 0.0 abc 0.0 1.0 -1", 2),
            Err(Error::Format { line: 2, .. })
        ));
        // identifiers must be integers
        assert!(Record::parse("1.5 1 0 0 0 1 -1", 1).is_err());
        assert!(Record::parse("1 1 0 0 0 1 -1 extra", 1).is_err());
    }
}
