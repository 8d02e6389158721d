//! Column projection over the canonical sample tuple
//!
//! Every sample is `[stp, idx, var0, var1, ...]`. A [`Projection`] picks and
//! orders fields of that tuple by case-insensitive column name.

use crate::config::ExportConfig;
use crate::types::{RawError, Result, Value, INDEX_TITLE, STEP_TITLE};
use std::collections::HashMap;

/// Canonical column titles of a file and their lookup table
#[derive(Debug, Clone)]
pub struct ColumnSet {
    titles: Vec<String>,
    lookup: HashMap<String, usize>,
    stepped: bool,
}

/// Resolved output columns
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Header line titles, as requested
    pub titles: Vec<String>,
    /// Positions in the canonical tuple
    pub indices: Vec<usize>,
}

/// Replace the output separator inside a variable name.
pub fn sanitize_title(name: &str, config: &ExportConfig) -> String {
    name.replace(config.separator, &config.placeholder.to_string())
}

impl ColumnSet {
    /// Build the canonical titles from variable names in data order.
    pub fn new<'a, I>(variable_names: I, stepped: bool, config: &ExportConfig) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut titles = vec![STEP_TITLE.to_string(), INDEX_TITLE.to_string()];
        titles.extend(
            variable_names
                .into_iter()
                .map(|name| sanitize_title(name, config)),
        );

        let mut lookup = HashMap::with_capacity(titles.len());
        for (i, title) in titles.iter().enumerate() {
            lookup.entry(title.to_lowercase()).or_insert(i);
        }

        Self {
            titles,
            lookup,
            stepped,
        }
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Position of a column in the canonical tuple
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(&name.to_lowercase()).copied()
    }

    /// Default output columns; `stp` only appears for stepped files.
    pub fn default_columns(&self) -> &[String] {
        if self.stepped {
            &self.titles
        } else {
            &self.titles[1..]
        }
    }

    /// Resolve requested columns (or the defaults) into tuple positions.
    pub fn resolve(&self, requested: Option<&[String]>) -> Result<Projection> {
        let names = requested.unwrap_or_else(|| self.default_columns());

        let indices = names
            .iter()
            .map(|name| {
                self.index_of(name)
                    .ok_or_else(|| RawError::UnknownColumn(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Projection {
            titles: names.to_vec(),
            indices,
        })
    }
}

impl Projection {
    /// Select the projected fields of one tuple.
    ///
    /// A tuple too short for the projection is a `MalformedPoint`.
    pub fn apply<'a>(
        &'a self,
        point: usize,
        tuple: &'a [Value],
    ) -> Result<impl Iterator<Item = &'a Value> + 'a> {
        if let Some(&max) = self.indices.iter().max() {
            if max >= tuple.len() {
                return Err(RawError::MalformedPoint {
                    point,
                    expected: max + 1,
                    found: tuple.len(),
                });
            }
        }
        Ok(self.indices.iter().map(move |&i| &tuple[i]))
    }
}
