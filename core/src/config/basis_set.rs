use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    basis::{AtomicBasis, BasisSet, Shell},
    error::{Error, Result},
    periodic_table::Element,
};

/// A basis set in the Basis Set Exchange JSON schema.
#[derive(Deserialize)]
pub struct ConfigBasisSet {
    #[serde(default)]
    name: String,
    elements: HashMap<String, ConfigElectronicConfiguration>,
}

#[derive(Deserialize)]
struct ConfigElectronicConfiguration {
    electron_shells: Vec<ConfigElectronShell>,
}

#[derive(Deserialize)]
struct ConfigElectronShell {
    function_type: String,
    angular_momentum: Vec<u32>,
    exponents: Vec<String>,
    coefficients: Vec<Vec<String>>,
}

impl ConfigBasisSet {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TryFrom<ConfigBasisSet> for BasisSet {
    type Error = Error;

    fn try_from(value: ConfigBasisSet) -> Result<Self> {
        let mut atomic_mapping = HashMap::with_capacity(value.elements.len());

        for (key, configuration) in value.elements {
            let element = key
                .parse::<u32>()
                .map_err(|_| Error::MalformedBasis(format!("'{key}' is not an atomic number")))
                .and_then(Element::from_atomic_number)?;

            let mut shells = Vec::new();
            for electron_shell in &configuration.electron_shells {
                shells.extend(electron_shell.to_shells()?);
            }

            atomic_mapping.insert(element, AtomicBasis::new(shells));
        }

        Ok(Self::new(value.name, atomic_mapping))
    }
}

impl ConfigElectronShell {
    /// A general contraction (e.g. an "SP" shell with angular momentum [0, 1]) becomes one shell
    /// per angular momentum, all sharing the same exponents.
    fn to_shells(&self) -> Result<Vec<Shell>> {
        if !self.function_type.starts_with("gto") {
            return Err(Error::MalformedBasis(format!(
                "function type '{}' is not a gaussian type orbital",
                self.function_type
            )));
        }

        let exponents = parse_numbers(&self.exponents)?;

        // a shell may list one angular momentum for several contractions
        let angular_momenta = if self.angular_momentum.len() == 1 {
            vec![self.angular_momentum[0]; self.coefficients.len()]
        } else if self.angular_momentum.len() == self.coefficients.len() {
            self.angular_momentum.clone()
        } else {
            return Err(Error::MalformedBasis(format!(
                "{} angular momenta for {} contractions",
                self.angular_momentum.len(),
                self.coefficients.len()
            )));
        };

        angular_momenta
            .into_iter()
            .zip(&self.coefficients)
            .map(|(angular_momentum, coefficients)| {
                Shell::new(
                    angular_momentum,
                    exponents.clone(),
                    parse_numbers(coefficients)?,
                )
            })
            .collect()
    }
}

fn parse_numbers(values: &[String]) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|value| {
            value
                .trim()
                .replace(['D', 'd'], "E")
                .parse::<f64>()
                .map_err(|_| Error::MalformedBasis(format!("'{value}' is not a number")))
        })
        .collect()
}
