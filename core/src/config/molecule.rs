use serde::{Deserialize, Serialize};

use crate::{
    atom::AtomSpec,
    error::{Error, Result},
    periodic_table::ElementId,
};

/// Represents a full molecule in a config file.
/// A molecule is just a list of positioned atoms.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMolecule(Vec<ConfigAtom>);

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ConfigAtom {
    element: ElementId,
    position: Vec<f64>,
}

impl ConfigMolecule {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<ConfigMolecule> for Vec<AtomSpec> {
    type Error = Error;

    fn try_from(value: ConfigMolecule) -> Result<Self> {
        let ConfigMolecule(config_atoms) = value;

        config_atoms
            .into_iter()
            .map(|atom| {
                let &[x, y, z] = atom.position.as_slice() else {
                    return Err(Error::StructureParse {
                        entry: atom.element.to_string(),
                        reason: format!(
                            "position has {} components instead of 3",
                            atom.position.len()
                        ),
                    });
                };

                Ok(AtomSpec::new(atom.element, [x, y, z]))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{atom::AtomSpec, error::Error, periodic_table::ElementId};

    use super::ConfigMolecule;

    #[test]
    fn atoms_accept_symbols_and_numbers() {
        let config: ConfigMolecule = serde_json::from_str(
            r#"[{"element": "Li", "position": [1.0, 0.0, 0.0]},
                {"element": 3, "position": [-1.0, 0.0, 0.0]}]"#,
        )
        .unwrap();
        assert_eq!(config.len(), 2);

        let atoms = Vec::<AtomSpec>::try_from(config).unwrap();
        assert_eq!(atoms[0].element(), &ElementId::Symbol("Li".into()));
        assert_eq!(atoms[1].element(), &ElementId::Number(3));
        assert_eq!(atoms[1].position(), [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn positions_need_three_components() {
        let config: ConfigMolecule =
            serde_json::from_str(r#"[{"element": "H", "position": [0.0, 1.0]}]"#).unwrap();
        assert!(matches!(
            Vec::<AtomSpec>::try_from(config),
            Err(Error::StructureParse { .. })
        ));
    }
}
