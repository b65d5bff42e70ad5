use std::ops::Index;

use crate::{basis::BasisFunction, device::EvaluationContext};

use super::Integrator;

/// Position of the unordered pair {i, j} in a packed lower triangle.
#[inline(always)]
const fn pair_index(i: usize, j: usize) -> usize {
    let (i, j) = if i >= j { (i, j) } else { (j, i) };
    i * (i + 1) / 2 + j
}

/// An integral index used in the two-electron integrals of a basis set.
///
/// Two-electron integrals (ij|kl) are unchanged under i <-> j, k <-> l and (ij) <-> (kl), so
/// every one of the eight equivalent orderings maps to the same canonical quartet.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct IntegralIndex(usize);

impl IntegralIndex {
    pub(crate) const fn new((i, j, k, l): (usize, usize, usize, usize)) -> Self {
        Self(pair_index(pair_index(i, j), pair_index(k, l)))
    }
}

/// Electron repulsion integrals (ij|kl) over a list of basis functions, stored once per canonical
/// quartet.
pub struct ElectronTensor {
    data: Vec<f64>,
    /// side length
    size: usize,
}

impl ElectronTensor {
    pub fn from_basis(
        basis: &[BasisFunction],
        integrator: &(impl Integrator<Function = BasisFunction> + Sync),
        context: &EvaluationContext,
    ) -> Self {
        let n_basis = basis.len();

        let pairs = (0..n_basis)
            .flat_map(|i| (0..=i).map(move |j| (i, j)))
            .collect::<Vec<_>>();

        // row `ij` holds every (ij|kl) with kl <= ij, which is exactly the packed order
        let rows = context.map_indexed(pairs.len(), |ij| {
            let (i, j) = pairs[ij];
            pairs[..=ij]
                .iter()
                .map(|&(k, l)| {
                    let integral = integrator
                        .electron_repulsion((&basis[i], &basis[j], &basis[k], &basis[l]));
                    log::trace!("ERI ({i} {j}|{k} {l}) = {integral:<1.8}");
                    integral
                })
                .collect::<Vec<_>>()
        });

        let data = rows.into_iter().flatten().collect::<Vec<_>>();
        log::debug!("computed {} unique electron repulsion integrals", data.len());

        Self {
            data,
            size: n_basis,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of stored (unique) integrals.
    pub fn n_unique(&self) -> usize {
        self.data.len()
    }
}

impl Index<(usize, usize, usize, usize)> for ElectronTensor {
    type Output = f64;

    fn index(&self, index: (usize, usize, usize, usize)) -> &Self::Output {
        &self[IntegralIndex::new(index)]
    }
}

impl Index<IntegralIndex> for ElectronTensor {
    type Output = f64;

    fn index(&self, IntegralIndex(linear): IntegralIndex) -> &Self::Output {
        &self.data[linear]
    }
}
