//! Where named basis sets come from.
use std::{
    collections::{hash_map::Entry, HashMap},
    path::{Path, PathBuf},
};

use crate::{
    config::ConfigBasisSet,
    error::{Error, Result},
    periodic_table::Element,
};

use super::{AtomicBasis, BasisSet};

/// Produces the basis of one element in a named basis set.
pub trait BasisLoader {
    fn load(&self, element: Element, basis_name: &str) -> Result<AtomicBasis>;

    /// One basis per `(element, basis name)` request, in request order.
    fn load_many(&self, requests: &[(Element, &str)]) -> Result<Vec<AtomicBasis>> {
        requests
            .iter()
            .map(|&(element, basis_name)| self.load(element, basis_name))
            .collect()
    }
}

const BUNDLED: [(&str, &str); 3] = [
    ("3-21g", include_str!("../../data/basis/3-21g.json")),
    ("sto-3g", include_str!("../../data/basis/sto-3g.json")),
    ("6-31g", include_str!("../../data/basis/6-31g.json")),
];

/// Basis sets in Basis Set Exchange JSON format, looked up in user directories first
/// (`<dir>/<name>.json`) and in the bundled sets after that. Names are case insensitive.
#[derive(Clone, Debug, Default)]
pub struct BasisLibrary {
    search_dirs: Vec<PathBuf>,
}

impl BasisLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Names of the basis sets that ship with the library.
    pub fn bundled() -> impl Iterator<Item = &'static str> {
        BUNDLED.iter().map(|(name, _)| *name)
    }

    pub fn basis_set(&self, basis_name: &str) -> Result<Option<BasisSet>> {
        let key = basis_name.to_lowercase();

        for dir in &self.search_dirs {
            for file_name in [format!("{basis_name}.json"), format!("{key}.json")] {
                let path = dir.join(file_name);
                if path.is_file() {
                    log::debug!("loading basis set '{basis_name}' from {}", path.display());
                    return read_basis_set(&path).map(Some);
                }
            }
        }

        match BUNDLED.iter().find(|(name, _)| *name == key) {
            Some((_, json)) => {
                log::debug!("using bundled basis set '{key}'");
                BasisSet::try_from(ConfigBasisSet::from_json(json)?).map(Some)
            }
            None => Ok(None),
        }
    }
}

fn read_basis_set(path: &Path) -> Result<BasisSet> {
    let json = std::fs::read_to_string(path)?;
    BasisSet::try_from(ConfigBasisSet::from_json(&json)?)
}

fn element_basis(
    set: Option<&BasisSet>,
    element: Element,
    basis_name: &str,
) -> Result<AtomicBasis> {
    set.and_then(|set| set.for_element(element).cloned())
        .ok_or_else(|| Error::BasisNotFound {
            element: element.to_string(),
            basis: basis_name.to_string(),
        })
}

impl BasisLoader for BasisLibrary {
    fn load(&self, element: Element, basis_name: &str) -> Result<AtomicBasis> {
        element_basis(self.basis_set(basis_name)?.as_ref(), element, basis_name)
    }

    /// Reads and parses every distinct basis set once.
    fn load_many(&self, requests: &[(Element, &str)]) -> Result<Vec<AtomicBasis>> {
        let mut sets = HashMap::new();

        requests
            .iter()
            .map(|&(element, basis_name)| {
                let set = match sets.entry(basis_name) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(self.basis_set(basis_name)?),
                };
                element_basis(set.as_ref(), element, basis_name)
            })
            .collect()
    }
}
