use nalgebra::Vector3;

use crate::periodic_table::{Element, ElementId};

/// Represents an atom in a molecule.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Atom {
    pub(crate) position: Vector3<f64>,
    pub(crate) element: Element,
}

impl Atom {
    pub fn new(element: Element, position: Vector3<f64>) -> Self {
        Self { position, element }
    }

    /// Returns the charge of this nucleus
    pub fn nuclear_charge(&self) -> i32 {
        self.element.atomic_number() as i32
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }
}

/// An atom as given by the user: an element identifier and a position in Bohr.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomSpec {
    element: ElementId,
    position: [f64; 3],
}

impl AtomSpec {
    pub fn new(element: impl Into<ElementId>, position: [f64; 3]) -> Self {
        Self {
            element: element.into(),
            position,
        }
    }

    pub fn element(&self) -> &ElementId {
        &self.element
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        ElementId::Symbol(value.to_string())
    }
}

impl From<u32> for ElementId {
    fn from(value: u32) -> Self {
        ElementId::Number(value)
    }
}
