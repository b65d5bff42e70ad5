use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    atom::{Atom, AtomSpec},
    basis::{AtomicBasis, BasisLoader, BasisParameters},
    error::{Error, Result},
    hf::{CoefficientProvider, ScfSolution},
    periodic_table::{Element, ElementTable},
};

/// Represents a molecule
#[derive(Clone, Debug, PartialEq)]
pub struct Molecule {
    pub(crate) atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Electron count of the neutral molecule.
    pub fn n_electrons(&self) -> usize {
        self.atoms
            .iter()
            .map(|atom| atom.element.atomic_number() as usize)
            .sum()
    }
}

/// Which basis each atom carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BasisAssignment {
    /// Every atom uses the same basis.
    Shared(String),
    /// One basis name per atom, in atom order.
    PerAtom(Vec<String>),
}

impl From<&str> for BasisAssignment {
    fn from(value: &str) -> Self {
        BasisAssignment::Shared(value.to_string())
    }
}

/// A molecule together with the basis assigned to its atoms, and the views derived from both.
///
/// All derived data (resolved elements, structure string, atomic numbers) is computed once in
/// [`MolecularSystem::new`] and never changes afterwards.
#[derive(Clone, Debug)]
pub struct MolecularSystem {
    atoms: Vec<AtomSpec>,
    basis: BasisAssignment,
    element_table: ElementTable,
    elements: Vec<Element>,
    structure: String,
    atomic_numbers: Vec<u32>,
}

impl MolecularSystem {
    pub fn new(atoms: Vec<AtomSpec>, basis: impl Into<BasisAssignment>) -> Result<Self> {
        let basis = basis.into();
        if let BasisAssignment::PerAtom(names) = &basis {
            if names.len() != atoms.len() {
                return Err(Error::BasisAssignmentLength {
                    given: names.len(),
                    atoms: atoms.len(),
                });
            }
        }

        let element_table = ElementTable::new();
        let elements = atoms
            .iter()
            .map(|atom| element_table.resolve(atom.element()))
            .collect::<Result<Vec<_>>>()?;

        let structure = atoms
            .iter()
            .map(|atom| {
                let [x, y, z] = atom.position();
                format!("{} {x:?} {y:?} {z:?}", atom.element())
            })
            .collect::<Vec<_>>()
            .join("; ");

        let atomic_numbers = elements.iter().map(|element| element.atomic_number()).collect();

        log::debug!("molecular system: {structure}");

        Ok(Self {
            atoms,
            basis,
            element_table,
            elements,
            structure,
            atomic_numbers,
        })
    }

    /// The system as `"El x y z; El x y z"`, elements written as they were given.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    pub fn element_table(&self) -> &ElementTable {
        &self.element_table
    }

    pub fn atomic_numbers(&self) -> &[u32] {
        &self.atomic_numbers
    }

    pub fn atoms(&self) -> &[AtomSpec] {
        &self.atoms
    }

    pub fn basis(&self) -> &BasisAssignment {
        &self.basis
    }

    /// Name of the basis of atom `index`.
    ///
    /// # Panics
    /// If `index` is out of bounds for a per-atom assignment.
    pub fn basis_name(&self, index: usize) -> &str {
        match &self.basis {
            BasisAssignment::Shared(name) => name,
            BasisAssignment::PerAtom(names) => &names[index],
        }
    }

    /// The positioned atoms, as consumed by the SCF solver.
    pub fn molecule(&self) -> Molecule {
        let atoms = self
            .atoms
            .iter()
            .zip(&self.elements)
            .map(|(atom, &element)| Atom::new(element, Vector3::from(atom.position())))
            .collect();
        Molecule::new(atoms)
    }

    /// Load the basis of every atom, in atom order.
    pub fn bases(&self, loader: &impl BasisLoader) -> Result<Vec<AtomicBasis>> {
        let requests = self
            .elements
            .iter()
            .enumerate()
            .map(|(index, &element)| (element, self.basis_name(index)))
            .collect::<Vec<_>>();
        loader.load_many(&requests)
    }

    pub fn basis_parameters(
        &self,
        loader: &impl BasisLoader,
        trainable: bool,
    ) -> Result<BasisParameters> {
        BasisParameters::new(&self.bases(loader)?, trainable)
    }

    /// Run the coefficient provider on this system.
    pub fn solve_reference(
        &self,
        provider: &impl CoefficientProvider,
        loader: &impl BasisLoader,
    ) -> Result<ScfSolution> {
        provider.solve(&self.molecule(), &self.bases(loader)?)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::{
        atom::AtomSpec,
        basis::{AtomicBasis, BasisLibrary, BasisLoader},
        error::{Error, Result},
        periodic_table::Element,
        structure::parse_structure,
    };

    use super::{BasisAssignment, MolecularSystem};

    /// Serves every request from the bundled sets and counts how it was asked.
    #[derive(Default)]
    struct CountingLoader {
        single: Cell<usize>,
        batches: Cell<usize>,
    }

    impl BasisLoader for CountingLoader {
        fn load(&self, element: Element, basis_name: &str) -> Result<AtomicBasis> {
            self.single.set(self.single.get() + 1);
            BasisLibrary::new().load(element, basis_name)
        }

        fn load_many(&self, requests: &[(Element, &str)]) -> Result<Vec<AtomicBasis>> {
            self.batches.set(self.batches.get() + 1);
            BasisLibrary::new().load_many(requests)
        }
    }

    #[test]
    fn bases_are_loaded_in_one_batch() {
        let system = MolecularSystem::new(lithium_dimer(), "3-21G").unwrap();
        let loader = CountingLoader::default();

        let bases = system.bases(&loader).unwrap();
        assert_eq!(bases.len(), 2);
        assert_eq!(loader.batches.get(), 1);
        assert_eq!(loader.single.get(), 0);
    }

    fn lithium_dimer() -> Vec<AtomSpec> {
        vec![
            AtomSpec::new("Li", [1.0, 0.0, 0.0]),
            AtomSpec::new("Li", [-1.0, 0.0, 0.0]),
        ]
    }

    #[test]
    fn derived_views() {
        let system = MolecularSystem::new(lithium_dimer(), "3-21G").unwrap();

        assert_eq!(system.structure(), "Li 1.0 0.0 0.0; Li -1.0 0.0 0.0");
        assert_eq!(system.atomic_numbers(), [3, 3]);
        assert_eq!(system.element_table().len(), 99);
        assert_eq!(system.basis_name(1), "3-21G");
        assert_eq!(system.molecule().n_electrons(), 6);
    }

    #[test]
    fn unknown_elements_fail_at_construction() {
        let atoms = vec![AtomSpec::new("Xx", [0.0; 3])];
        assert!(matches!(
            MolecularSystem::new(atoms, "3-21G"),
            Err(Error::UnknownElement(_))
        ));

        let atoms = vec![AtomSpec::new(120u32, [0.0; 3])];
        assert!(matches!(
            MolecularSystem::new(atoms, "3-21G"),
            Err(Error::UnknownElement(_))
        ));
    }

    #[test]
    fn per_atom_basis_length_is_checked() {
        let basis = BasisAssignment::PerAtom(vec!["3-21G".into()]);
        assert!(matches!(
            MolecularSystem::new(lithium_dimer(), basis),
            Err(Error::BasisAssignmentLength { given: 1, atoms: 2 })
        ));
    }

    #[test]
    fn structure_round_trips_through_parser() {
        let atoms = vec![
            AtomSpec::new("O", [0.0, 0.0, 0.1173]),
            AtomSpec::new(1u32, [0.0, 0.7572, -0.4692]),
            AtomSpec::new("H", [1e-9, -0.7572, -0.4692]),
        ];
        let system = MolecularSystem::new(atoms.clone(), "sto-3g").unwrap();
        let parsed = parse_structure(system.structure(), system.element_table()).unwrap();

        assert_eq!(parsed.atomic_numbers, [8, 1, 1]);
        for (atom, position) in atoms.iter().zip(&parsed.positions) {
            assert_eq!(atom.position(), [position.x, position.y, position.z]);
        }
    }

    #[test]
    fn basis_parameters_follow_atom_order() {
        let atoms = vec![
            AtomSpec::new("Li", [0.0, 0.0, 0.0]),
            AtomSpec::new("H", [0.0, 0.0, 3.0]),
        ];
        let system = MolecularSystem::new(atoms, "sto-3g").unwrap();
        let library = BasisLibrary::new();

        let parameters = system.basis_parameters(&library, true).unwrap();
        let bases = parameters.bases().unwrap();

        assert!(parameters.is_trainable());
        assert_eq!(bases[0].n_functions(), 5);
        assert_eq!(bases[1].n_functions(), 1);
    }
}
