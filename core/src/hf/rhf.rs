use itertools::Itertools;
use nalgebra::{DMatrix, DVector};

use crate::{
    atom::Atom,
    basis::BasisFunction,
    device::EvaluationContext,
    diis::Diis,
    error::{Error, Result},
    integrals::{self, ElectronTensor, Integrator},
    molecule::Molecule,
    utils,
};

use super::{HartreeFockConfig, ScfIteration, ScfSolution};

/// Closed-shell restricted hartree fock, starting from an extended hückel guess and accelerated
/// with DIIS.
///
/// Running out of iterations is not an error: the last iterate is returned with
/// `converged == false`.
pub fn restricted_hartree_fock(
    molecule: &Molecule,
    basis: &[BasisFunction],
    integrator: &(impl Integrator<Function = BasisFunction> + Sync),
    config: &HartreeFockConfig,
    context: &EvaluationContext,
) -> Result<ScfSolution> {
    let n_electrons = molecule.n_electrons();
    if n_electrons % 2 != 0 {
        return Err(Error::OpenShell(n_electrons));
    }
    let n_occupied = n_electrons / 2;

    let n_basis = basis.len();
    if n_occupied > n_basis {
        return Err(Error::shape(
            "occupied orbitals",
            format!("at most {n_basis}"),
            n_occupied,
        ));
    }

    let nuclear_repulsion = nuclear_repulsion(&molecule.atoms);
    log::debug!("nuclear repulsion energy: {nuclear_repulsion}");

    let overlap = integrals::overlap_matrix(basis, integrator, context);
    log::debug!("overlap matrix: {overlap:0.4}");
    let core_hamiltonian = integrals::kinetic_matrix(basis, integrator, context)
        + integrals::nuclear_matrix(basis, &molecule.atoms, integrator, context);
    log::debug!("core hamiltonian: {core_hamiltonian:0.4}");
    let electron = ElectronTensor::from_basis(basis, integrator, context);

    let orthogonalizer = symmetric_orthogonalizer(&overlap)?;
    let solve = |fock: &DMatrix<f64>| {
        let (coefficients, energies) =
            utils::sorted_eigs(orthogonalizer.transpose() * fock * &orthogonalizer);
        (&orthogonalizer * coefficients, energies)
    };

    let (guess, _) = solve(&extended_hückel(&core_hamiltonian, &overlap));
    let mut density = closed_shell_density(&guess, n_occupied);

    let mut diis = Diis::new(config.diis_subspace);
    let mut history = Vec::with_capacity(config.max_iterations);

    let mut iteration = 0;
    let (coefficients, orbital_energies, electronic_energy, converged) = loop {
        iteration += 1;

        let two_electron = two_electron_operator(&density, &electron);
        let fock = &core_hamiltonian + &two_electron;
        let electronic_energy = 0.5 * density.dot(&(2.0 * &core_hamiltonian + &two_electron));

        // FDS - SDF vanishes at self consistency
        let error = &fock * &density * &overlap - &overlap * &density * &fock;
        let (coefficients, orbital_energies) = solve(&diis.extrapolate(error, fock));

        let next_density = closed_shell_density(&coefficients, n_occupied);
        let density_rms = (&next_density - &density).norm() / n_basis as f64;
        density = next_density;

        log::info!(
            "scf iteration {iteration:<4} - electronic energy {electronic_energy:1.8}. density rms {density_rms:1.4e}",
        );
        history.push(ScfIteration {
            electronic_energy,
            density_rms,
        });

        let converged = density_rms < config.epsilon;
        if converged || iteration >= config.max_iterations {
            break (coefficients, orbital_energies, electronic_energy, converged);
        }
    };

    if !converged {
        log::warn!(
            "SCF did not converge within {} iterations, using the last iterate",
            config.max_iterations
        );
    }

    let occupations = DVector::from_fn(n_basis, |k, _| if k < n_occupied { 2.0 } else { 0.0 });

    Ok(ScfSolution {
        coefficients,
        occupations,
        orbital_energies,
        electronic_energy,
        nuclear_repulsion,
        iterations: iteration,
        converged,
        history,
    })
}

fn nuclear_repulsion(atoms: &[Atom]) -> f64 {
    atoms
        .iter()
        .tuple_combinations()
        .map(|(a, b)| {
            (a.nuclear_charge() * b.nuclear_charge()) as f64 / (a.position - b.position).norm()
        })
        .sum()
}

/// S^(-1/2), which turns the generalized eigenproblem FC = SCe into an ordinary one.
fn symmetric_orthogonalizer(overlap: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (vectors, values) = utils::eigs(overlap.clone());

    let smallest = values.min();
    if smallest <= 1e-10 * values.max().max(1.0) {
        log::debug!("smallest overlap eigenvalue {smallest:e}");
        return Err(Error::SingularMatrix("overlap matrix"));
    }

    let inverse_sqrt = DMatrix::from_diagonal(&values.map(|value| value.sqrt().recip()));
    Ok(&vectors * inverse_sqrt * vectors.transpose())
}

/// Extended hückel hamiltonian H_ij = K S_ij (H_ii + H_jj) / 2 used for the initial guess.
fn extended_hückel(core_hamiltonian: &DMatrix<f64>, overlap: &DMatrix<f64>) -> DMatrix<f64> {
    const WOLFSBERG_HELMHOLZ: f64 = 1.75;

    utils::symmetric_matrix(overlap.nrows(), |i, j| {
        let (h_ii, h_jj) = (core_hamiltonian[(i, i)], core_hamiltonian[(j, j)]);
        if i == j {
            h_ii
        } else {
            WOLFSBERG_HELMHOLZ * overlap[(i, j)] * 0.5 * (h_ii + h_jj)
        }
    })
}

/// G_ij = sum_xy D_xy [(ij|xy) - (ix|jy) / 2]
fn two_electron_operator(density: &DMatrix<f64>, electron: &ElectronTensor) -> DMatrix<f64> {
    let n_basis = density.nrows();

    utils::symmetric_matrix(n_basis, |i, j| {
        itertools::iproduct!(0..n_basis, 0..n_basis)
            .map(|(x, y)| {
                density[(x, y)] * (electron[(i, j, x, y)] - 0.5 * electron[(i, x, j, y)])
            })
            .sum()
    })
}

/// D = 2 C_occ C_occ^T
fn closed_shell_density(coefficients: &DMatrix<f64>, n_occupied: usize) -> DMatrix<f64> {
    let occupied = coefficients.columns(0, n_occupied);
    &occupied * occupied.transpose() * 2.0
}
