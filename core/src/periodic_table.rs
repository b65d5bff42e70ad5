use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const SYMBOLS: [&str; 99] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es",
];

/// A chemical element, identified by its atomic number (1 through 99).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const MAX_ATOMIC_NUMBER: u32 = SYMBOLS.len() as u32;

    pub fn from_atomic_number(number: u32) -> Result<Self> {
        if (1..=Self::MAX_ATOMIC_NUMBER).contains(&number) {
            Ok(Self(number as u8))
        } else {
            Err(Error::UnknownElement(number.to_string()))
        }
    }

    pub fn from_symbol(symbol: &str) -> Result<Self> {
        SYMBOLS
            .iter()
            .position(|&s| s == symbol)
            .map(|index| Self(index as u8 + 1))
            .ok_or_else(|| Error::UnknownElement(symbol.to_string()))
    }

    pub fn atomic_number(self) -> u32 {
        self.0 as u32
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self.0 as usize - 1]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An element the way a user writes it: either a symbol ("Li") or an atomic number (3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Number(u32),
    Symbol(String),
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Number(number) => write!(f, "{number}"),
            ElementId::Symbol(symbol) => f.write_str(symbol),
        }
    }
}

impl From<Element> for ElementId {
    fn from(value: Element) -> Self {
        ElementId::Symbol(value.symbol().to_string())
    }
}

/// Lookup table between element symbols and atomic numbers, in both directions.
#[derive(Clone, Debug)]
pub struct ElementTable {
    by_symbol: HashMap<&'static str, Element>,
    by_number: HashMap<u32, Element>,
}

impl ElementTable {
    pub fn new() -> Self {
        let mut by_symbol = HashMap::with_capacity(SYMBOLS.len());
        let mut by_number = HashMap::with_capacity(SYMBOLS.len());

        for (index, &symbol) in SYMBOLS.iter().enumerate() {
            let element = Element(index as u8 + 1);
            by_symbol.insert(symbol, element);
            by_number.insert(element.atomic_number(), element);
        }

        Self {
            by_symbol,
            by_number,
        }
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<Element> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn by_number(&self, number: u32) -> Option<Element> {
        self.by_number.get(&number).copied()
    }

    /// Resolve a user supplied element, failing for anything outside the table.
    pub fn resolve(&self, id: &ElementId) -> Result<Element> {
        match id {
            ElementId::Number(number) => self.by_number(*number),
            ElementId::Symbol(symbol) => self.by_symbol(symbol),
        }
        .ok_or_else(|| Error::UnknownElement(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}

impl Default for ElementTable {
    fn default() -> Self {
        Self::new()
    }
}
