//! Flat parameter vectors for basis sets.
//!
//! An optimizer only sees a [`DVector`]; the [`BasisPacker`] remembers how that vector maps back
//! onto shells. For every atom and every shell the vector holds the exponents followed by the
//! contraction coefficients. `unpack(pack(bases))` reproduces `bases` exactly.
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{AtomicBasis, Shell};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ShellLayout {
    angular_momentum: u32,
    n_primitives: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisPacker {
    atoms: Vec<Vec<ShellLayout>>,
    len: usize,
}

impl BasisPacker {
    /// Record the layout of `bases`.
    pub fn from_bases(bases: &[AtomicBasis]) -> Self {
        let atoms = bases
            .iter()
            .map(|basis| {
                basis
                    .shells()
                    .iter()
                    .map(|shell| ShellLayout {
                        angular_momentum: shell.angular_momentum(),
                        n_primitives: shell.n_primitives(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let len = atoms
            .iter()
            .flatten()
            .map(|layout| 2 * layout.n_primitives)
            .sum();

        Self { atoms, len }
    }

    /// Length of the parameter vectors this packer reads and writes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn pack(&self, bases: &[AtomicBasis]) -> Result<DVector<f64>> {
        if BasisPacker::from_bases(bases) != *self {
            return Err(Error::MalformedBasis(
                "basis layout does not match the packer it is packed with".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(self.len);
        for shell in bases.iter().flat_map(AtomicBasis::shells) {
            values.extend_from_slice(shell.exponents());
            values.extend_from_slice(shell.coefficients());
        }

        Ok(DVector::from_vec(values))
    }

    pub fn unpack(&self, params: &DVector<f64>) -> Result<Vec<AtomicBasis>> {
        if params.len() != self.len {
            return Err(Error::shape("basis parameter vector", self.len, params.len()));
        }

        let values = params.as_slice();
        let mut offset = 0;
        let mut bases = Vec::with_capacity(self.atoms.len());

        for layouts in &self.atoms {
            let mut shells = Vec::with_capacity(layouts.len());
            for layout in layouts {
                let n = layout.n_primitives;
                let exponents = values[offset..offset + n].to_vec();
                let coefficients = values[offset + n..offset + 2 * n].to_vec();
                offset += 2 * n;

                shells.push(Shell::new(layout.angular_momentum, exponents, coefficients)?);
            }
            bases.push(AtomicBasis::new(shells));
        }

        Ok(bases)
    }
}

/// A flat parameter vector together with the packer that gives it structure.
#[derive(Clone, Debug)]
pub struct BasisParameters {
    values: DVector<f64>,
    packer: BasisPacker,
    trainable: bool,
}

impl BasisParameters {
    pub fn new(bases: &[AtomicBasis], trainable: bool) -> Result<Self> {
        let packer = BasisPacker::from_bases(bases);
        let values = packer.pack(bases)?;
        Ok(Self {
            values,
            packer,
            trainable,
        })
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn packer(&self) -> &BasisPacker {
        &self.packer
    }

    /// Whether an optimizer is supposed to vary these parameters.
    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    pub fn bases(&self) -> Result<Vec<AtomicBasis>> {
        self.packer.unpack(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;

    use crate::{
        basis::{AtomicBasis, Shell},
        error::Error,
    };

    use super::{BasisPacker, BasisParameters};

    fn lithium_like() -> Vec<AtomicBasis> {
        let core = Shell::new(0, vec![36.8382, 5.48172, 1.11327], vec![0.07, 0.38, 0.68]).unwrap();
        let valence_s = Shell::new(0, vec![0.540205, 0.102255], vec![-0.26, 1.14]).unwrap();
        let valence_p = Shell::new(1, vec![0.540205, 0.102255], vec![0.16, 0.92]).unwrap();
        let hydrogen = Shell::new(0, vec![5.447178, 0.824547], vec![0.16, 0.9]).unwrap();

        vec![
            AtomicBasis::new(vec![core, valence_s, valence_p]),
            AtomicBasis::new(vec![hydrogen]),
        ]
    }

    #[test]
    fn unpack_inverts_pack() {
        let bases = lithium_like();
        let packer = BasisPacker::from_bases(&bases);
        let packed = packer.pack(&bases).unwrap();

        assert_eq!(packer.len(), 2 * (3 + 2 + 2 + 2));
        assert_eq!(packed.len(), packer.len());
        assert_eq!(packer.unpack(&packed).unwrap(), bases);
    }

    #[test]
    fn exponents_precede_coefficients_per_shell() {
        let bases = lithium_like();
        let packed = BasisPacker::from_bases(&bases).pack(&bases).unwrap();

        assert_eq!(&packed.as_slice()[..6], &[36.8382, 5.48172, 1.11327, 0.07, 0.38, 0.68]);
        assert_eq!(packed[packed.len() - 1], 0.9);
    }

    #[test]
    fn unpack_rejects_wrong_length() {
        let packer = BasisPacker::from_bases(&lithium_like());
        let too_short = DVector::zeros(packer.len() - 1);
        assert!(matches!(
            packer.unpack(&too_short),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn pack_rejects_foreign_layout() {
        let bases = lithium_like();
        let packer = BasisPacker::from_bases(&bases[..1]);
        assert!(matches!(packer.pack(&bases), Err(Error::MalformedBasis(_))));
    }

    #[test]
    fn parameters_remember_trainability() {
        let trial = BasisParameters::new(&lithium_like(), true).unwrap();
        let reference = BasisParameters::new(&lithium_like(), false).unwrap();

        assert!(trial.is_trainable());
        assert!(!reference.is_trainable());
        assert_eq!(trial.bases().unwrap(), lithium_like());
    }
}
