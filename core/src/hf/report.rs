use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{error::Result, molecule::Molecule};

use super::ScfSolution;

/// Write a human readable log of an SCF calculation. The file is informational only and never
/// read back.
pub(super) fn write_report(path: &Path, molecule: &Molecule, solution: &ScfSolution) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    writeln!(out, "restricted hartree fock")?;
    writeln!(out)?;
    writeln!(out, "geometry (bohr)")?;
    for atom in molecule.atoms() {
        let position = atom.position();
        writeln!(
            out,
            "  {:<3} {:>14.8} {:>14.8} {:>14.8}",
            atom.element(),
            position.x,
            position.y,
            position.z
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{:>5} {:>20} {:>14}", "iter", "electronic energy", "density rms")?;
    for (index, iteration) in solution.history.iter().enumerate() {
        writeln!(
            out,
            "{:>5} {:>20.10} {:>14.4e}",
            index + 1,
            iteration.electronic_energy,
            iteration.density_rms
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} after {} iterations",
        if solution.converged {
            "converged"
        } else {
            "NOT converged"
        },
        solution.iterations
    )?;
    writeln!(out, "electronic energy  {:>20.10}", solution.electronic_energy)?;
    writeln!(out, "nuclear repulsion  {:>20.10}", solution.nuclear_repulsion)?;
    writeln!(out, "total energy       {:>20.10}", solution.total_energy())?;

    writeln!(out)?;
    writeln!(out, "{:>5} {:>16} {:>10}", "mo", "energy", "occupation")?;
    for (k, (energy, occupation)) in solution
        .orbital_energies
        .iter()
        .zip(solution.occupations.iter())
        .enumerate()
    {
        writeln!(out, "{k:>5} {energy:>16.8} {occupation:>10.4}")?;
    }

    out.flush()?;
    Ok(())
}
