//! Parser for structure strings of the form `"Li 1.0 0.0 0.0; Li -1.0 0.0 0.0"`.
use nalgebra::Vector3;

use crate::{
    error::{Error, Result},
    periodic_table::{ElementId, ElementTable},
};

/// Atomic numbers and positions (in Bohr) of a parsed structure, in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedStructure {
    pub atomic_numbers: Vec<u32>,
    pub positions: Vec<Vector3<f64>>,
}

impl ParsedStructure {
    pub fn len(&self) -> usize {
        self.atomic_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atomic_numbers.is_empty()
    }
}

/// Parse `;` separated `element x y z` entries. Elements may be symbols or atomic numbers.
pub fn parse_structure(text: &str, table: &ElementTable) -> Result<ParsedStructure> {
    let mut atomic_numbers = Vec::new();
    let mut positions = Vec::new();

    for entry in text.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let fields = entry.split_whitespace().collect::<Vec<_>>();
        let &[element, x, y, z] = fields.as_slice() else {
            return Err(Error::StructureParse {
                entry: entry.to_string(),
                reason: format!("expected 4 fields, found {}", fields.len()),
            });
        };

        let id = match element.parse::<u32>() {
            Ok(number) => ElementId::Number(number),
            Err(_) => ElementId::Symbol(element.to_string()),
        };

        let coordinate = |value: &str| {
            value.parse::<f64>().map_err(|error| Error::StructureParse {
                entry: entry.to_string(),
                reason: format!("'{value}': {error}"),
            })
        };

        atomic_numbers.push(table.resolve(&id)?.atomic_number());
        positions.push(Vector3::new(coordinate(x)?, coordinate(y)?, coordinate(z)?));
    }

    Ok(ParsedStructure {
        atomic_numbers,
        positions,
    })
}
