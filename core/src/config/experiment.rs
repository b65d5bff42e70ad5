use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    atom::AtomSpec,
    error::Result,
    hf::HartreeFockConfig,
    molecule::{BasisAssignment, MolecularSystem},
    optimize::OptimizerConfig,
};

use super::ConfigMolecule;

/// One basis fitting experiment: a molecule, the basis being fitted and the basis it is fitted
/// against.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub molecule: ConfigMolecule,
    pub basis: BasisAssignment,
    pub reference_basis: BasisAssignment,
    #[serde(default)]
    pub scf: HartreeFockConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl ExperimentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn atoms(&self) -> Result<Vec<AtomSpec>> {
        Vec::<AtomSpec>::try_from(self.molecule.clone())
    }

    /// The system whose basis is optimized.
    pub fn trial_system(&self) -> Result<MolecularSystem> {
        MolecularSystem::new(self.atoms()?, self.basis.clone())
    }

    /// The same atoms carrying the reference basis.
    pub fn reference_system(&self) -> Result<MolecularSystem> {
        MolecularSystem::new(self.atoms()?, self.reference_basis.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{error::Error, molecule::BasisAssignment};

    use super::ExperimentConfig;

    const LITHIUM_DIMER: &str = r#"{
        "molecule": [
            { "element": "Li", "position": [1.0, 0.0, 0.0] },
            { "element": 3,    "position": [-1.0, 0.0, 0.0] }
        ],
        "basis": "3-21G",
        "reference_basis": ["3-21G", "sto-3g"],
        "scf": { "max_iterations": 40, "output": "scf.out" },
        "optimizer": { "method": "gd", "step": 0.01, "difference_step": 1e-4 }
    }"#;

    #[test]
    fn parses_full_experiment() {
        let config = ExperimentConfig::from_json(LITHIUM_DIMER).unwrap();

        assert_eq!(config.basis, BasisAssignment::Shared("3-21G".into()));
        assert_eq!(
            config.reference_basis,
            BasisAssignment::PerAtom(vec!["3-21G".into(), "sto-3g".into()])
        );
        assert_eq!(config.scf.max_iterations, 40);
        assert_eq!(config.scf.report.as_deref(), Some(Path::new("scf.out")));
        assert_eq!(config.optimizer.method, "gd");
        assert_eq!(config.optimizer.max_iterations, 50);
        assert_eq!(config.optimizer.difference_step, 1e-4);

        let trial = config.trial_system().unwrap();
        let reference = config.reference_system().unwrap();
        assert_eq!(trial.atomic_numbers(), [3, 3]);
        assert_eq!(reference.basis_name(1), "sto-3g");
    }

    #[test]
    fn sections_are_optional() {
        let config = ExperimentConfig::from_json(
            r#"{"molecule": [{"element": "H", "position": [0, 0, 0]}, {"element": "H", "position": [0, 0, 1.4]}],
                "basis": "sto-3g", "reference_basis": "6-31g"}"#,
        )
        .unwrap();

        assert_eq!(config.optimizer.method, "adam");
        assert_eq!(config.optimizer.step, 2e-3);
        assert_eq!(config.scf.report, None);
    }

    #[test]
    fn per_atom_basis_must_match_atom_count() {
        let config = ExperimentConfig::from_json(
            &LITHIUM_DIMER.replace(r#"["3-21G", "sto-3g"]"#, r#"["3-21G"]"#),
        )
        .unwrap();

        assert!(matches!(
            config.reference_system(),
            Err(Error::BasisAssignmentLength { given: 1, atoms: 2 })
        ));
    }
}
