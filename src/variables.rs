use crate::errors::{FileFormat, ParseError};
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum VariablesError {
    #[error("Variables unavailable: unable to read '{path}'")]
    #[diagnostic(
        code(stencil::variables::unavailable),
        help("Make sure the variables file exists and is readable")
    )]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Variables unavailable: unable to parse variables file")]
    #[diagnostic(code(stencil::variables::parse))]
    Parse(#[from] ParseError),
}

/// Flat, ordered table of template variables.
///
/// Declaration order is preserved from the source file; substitution walks the keys in
/// this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct VariableMap(IndexMap<String, String>);
impl VariableMap {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Adds a variable, replacing the value of an existing key in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Reads a variables file. `.toml` files are parsed as a flat TOML table, everything
    /// else as a flat JSON object.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VariablesError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|error| VariablesError::Unavailable {
            path: path.to_path_buf(),
            source: error,
        })?;

        let file_format = FileFormat::from_path(path);

        log::debug!(
            "Parsing variables from '{}' as {}",
            path.display(),
            file_format
        );

        let variables = match file_format {
            FileFormat::Json => serde_json::from_str::<VariableMap>(&content)
                .map_err(|error| ParseError::new(FileFormat::Json, path.to_path_buf(), error))?,
            FileFormat::Toml => toml::from_str::<VariableMap>(&content)
                .map_err(|error| ParseError::new(FileFormat::Toml, path.to_path_buf(), error))?,
        };

        log::debug!("Loaded {} variable(s)", variables.len());

        Ok(variables)
    }
}
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
