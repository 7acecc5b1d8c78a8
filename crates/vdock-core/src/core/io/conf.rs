//! Search-box configuration files.
//!
//! Each prepared target ships a plain-text configuration naming the docking
//! search volume, one `key = value` pair per line:
//!
//! ```text
//! center_x = 15.19
//! center_y = 53.903
//! center_z = 16.917
//! size_x = 20.0
//! size_y = 20.0
//! size_z = 20.0
//! ```
//!
//! Only the six box fields are interpreted here; any other keys are passed
//! through to the engine untouched by leaving the file itself as-is.

use nalgebra::{Point3, Vector3};
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid float for '{field}' on line {line} (value: '{value}')")]
    InvalidFloat {
        field: String,
        line: usize,
        value: String,
    },
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },
}

/// The rectangular search volume the engine explores, in Angstroms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBox {
    pub center: Point3<f64>,
    pub size: Vector3<f64>,
}

const FIELDS: [&str; 6] = [
    "center_x", "center_y", "center_z", "size_x", "size_y", "size_z",
];

/// Parses the search box from a configuration stream. Lines are matched on
/// their first token; the value is the third whitespace-separated token, so
/// both `key = value` and `key= value` spellings are rejected consistently
/// while the canonical spacing parses.
pub fn parse_search_box(reader: &mut impl BufRead) -> Result<SearchBox, ConfError> {
    let mut values = [None::<f64>; 6];
    for (line_idx, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(position) = tokens.first().and_then(|key| FIELDS.iter().position(|f| f == key))
        else {
            continue;
        };
        let raw = tokens.get(2).copied().unwrap_or("");
        let value = raw.parse().map_err(|_| ConfError::InvalidFloat {
            field: FIELDS[position].to_string(),
            line: line_idx + 1,
            value: raw.to_string(),
        })?;
        values[position] = Some(value);
    }
    for (position, value) in values.iter().enumerate() {
        if value.is_none() {
            return Err(ConfError::MissingField {
                field: FIELDS[position],
            });
        }
    }
    let v: Vec<f64> = values.iter().map(|x| x.unwrap_or_default()).collect();
    Ok(SearchBox {
        center: Point3::new(v[0], v[1], v[2]),
        size: Vector3::new(v[3], v[4], v[5]),
    })
}
