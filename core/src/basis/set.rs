use std::collections::HashMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    atom::Atom,
    error::{Error, Result},
    periodic_table::Element,
};

use super::BasisFunction;

/// A named basis set: the basis of every element it covers.
#[derive(Debug, Clone)]
pub struct BasisSet {
    name: String,
    atomic_mapping: HashMap<Element, AtomicBasis>,
}

impl BasisSet {
    /// Create a new basis set given mappings from element to the basis of that element
    pub fn new(name: impl Into<String>, atomic_mapping: HashMap<Element, AtomicBasis>) -> Self {
        Self {
            name: name.into(),
            atomic_mapping,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the basis of a given element, if it exists.
    pub fn for_element(&self, element: Element) -> Option<&AtomicBasis> {
        self.atomic_mapping.get(&element)
    }

    /// Returns the basis of a given atom, if it exists.
    pub fn for_atom(&self, atom: &Atom) -> Option<&AtomicBasis> {
        self.for_element(atom.element)
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.atomic_mapping.keys().copied()
    }
}

/// Represents the basis functions for a single atom.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomicBasis {
    pub(crate) shells: Vec<Shell>,
}

impl AtomicBasis {
    pub fn new(shells: Vec<Shell>) -> Self {
        Self { shells }
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    /// Number of (spherical) functions this atom contributes.
    pub fn n_functions(&self) -> usize {
        self.shells.iter().map(Shell::n_functions).sum()
    }

    /// Place this basis on an atom at `position`.
    pub fn basis_functions(&self, position: Vector3<f64>) -> Result<Vec<BasisFunction>> {
        let mut functions = Vec::with_capacity(self.n_functions());
        for shell in &self.shells {
            functions.extend(BasisFunction::from_shell(shell, position)?);
        }
        Ok(functions)
    }
}

/// A contracted shell: primitives sharing one angular momentum and one contraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    pub(crate) angular_momentum: u32,
    pub(crate) exponents: Vec<f64>,
    pub(crate) coefficients: Vec<f64>,
}

impl Shell {
    pub fn new(angular_momentum: u32, exponents: Vec<f64>, coefficients: Vec<f64>) -> Result<Self> {
        if exponents.is_empty() || exponents.len() != coefficients.len() {
            return Err(Error::MalformedBasis(format!(
                "shell with {} exponents and {} coefficients",
                exponents.len(),
                coefficients.len()
            )));
        }

        Ok(Self {
            angular_momentum,
            exponents,
            coefficients,
        })
    }

    pub fn angular_momentum(&self) -> u32 {
        self.angular_momentum
    }

    pub fn exponents(&self) -> &[f64] {
        &self.exponents
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn n_primitives(&self) -> usize {
        self.exponents.len()
    }

    /// 2l + 1
    pub fn n_functions(&self) -> usize {
        2 * self.angular_momentum as usize + 1
    }
}
