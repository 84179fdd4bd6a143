//! JSON container backend
//!
//! A self-describing document holding named axes and row-major variables:
//!
//! ```json
//! {
//!   "dimensions": [{ "name": "height", "len": 2 }, { "name": "ncells", "len": 3 }],
//!   "variables": {
//!     "zg": { "dimensions": ["height", "ncells"], "data": [...], "attributes": { "units": "m" } }
//!   }
//! }
//! ```

use super::{time_step_range, Attributes, Dimension, FieldSink, FieldSource, IoError};
use crate::core_types::Real;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One variable of a [`JsonContainer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonVariable {
    /// Axis names, slowest-varying first
    pub dimensions: Vec<String>,
    /// Row-major values
    pub data: Vec<Real>,
    /// String attributes
    #[serde(default)]
    pub attributes: Attributes,
}

/// In-memory JSON container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonContainer {
    /// Declared axes, in declaration order
    pub dimensions: Vec<Dimension>,
    /// Variables by name
    pub variables: FxHashMap<String, JsonVariable>,
}

impl JsonContainer {
    /// Load and check a container from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IoError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let container: Self = serde_json::from_reader(BufReader::new(file))?;
        container.check()?;
        debug!(
            dimensions = container.dimensions.len(),
            variables = container.variables.len(),
            "loaded JSON container"
        );
        Ok(container)
    }

    /// Parse and check a container from a string
    pub fn from_json(text: &str) -> Result<Self, IoError> {
        let container: Self = serde_json::from_str(text)?;
        container.check()?;
        Ok(container)
    }

    /// Write the container to disk, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let path = path.as_ref();
        let to_io = |source| IoError::File {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(to_io)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(to_io)
    }

    /// Verify that every variable refers to declared axes and holds exactly
    /// the number of values its axes span
    pub fn check(&self) -> Result<(), IoError> {
        for (name, variable) in &self.variables {
            let extents = self.extents(&variable.dimensions)?;
            let expected: usize = extents.iter().product();
            if variable.data.len() != expected {
                return Err(IoError::Malformed(format!(
                    "variable '{name}' holds {} values, its axes span {expected}",
                    variable.data.len()
                )));
            }
        }
        Ok(())
    }

    /// Declared axis by name
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Variable by name
    pub fn variable(&self, name: &str) -> Result<&JsonVariable, IoError> {
        self.variables
            .get(name)
            .ok_or_else(|| IoError::MissingVariable(name.to_string()))
    }

    /// Declare an axis; redeclaring with a different length is an error
    pub fn insert_dimension(&mut self, name: &str, len: usize) -> Result<(), IoError> {
        match self.dimension(name) {
            Some(existing) if existing.len == len => Ok(()),
            Some(existing) => Err(IoError::Malformed(format!(
                "dimension '{name}' already declared with length {}, not {len}",
                existing.len
            ))),
            None => {
                self.dimensions.push(Dimension::new(name, len));
                Ok(())
            }
        }
    }

    /// Add or replace a variable over declared axes
    pub fn insert_variable(
        &mut self,
        name: &str,
        dimensions: &[&str],
        data: Vec<Real>,
        attributes: Attributes,
    ) -> Result<(), IoError> {
        let dimensions: Vec<String> = dimensions.iter().map(ToString::to_string).collect();
        let extents = self.extents(&dimensions)?;
        if data.len() != extents.iter().product::<usize>() {
            return Err(IoError::ShapeMismatch {
                variable: name.to_string(),
                expected: extents,
                actual: vec![data.len()],
            });
        }
        self.variables.insert(
            name.to_string(),
            JsonVariable {
                dimensions,
                data,
                attributes,
            },
        );
        Ok(())
    }

    fn extents(&self, names: &[String]) -> Result<Vec<usize>, IoError> {
        names
            .iter()
            .map(|name| {
                self.dimension(name)
                    .map(|d| d.len)
                    .ok_or_else(|| IoError::MissingDimension(name.clone()))
            })
            .collect()
    }
}

impl FieldSource for JsonContainer {
    fn dimensions(&self, variable: &str) -> Result<Vec<Dimension>, IoError> {
        let names = &self.variable(variable)?.dimensions;
        let extents = self.extents(names)?;
        Ok(names
            .iter()
            .zip(extents)
            .map(|(name, len)| Dimension::new(name.as_str(), len))
            .collect())
    }

    fn read(&self, variable: &str) -> Result<Vec<Real>, IoError> {
        Ok(self.variable(variable)?.data.clone())
    }

    fn read_time_step(&self, variable: &str, time_index: usize) -> Result<Vec<Real>, IoError> {
        let dimensions = self.dimensions(variable)?;
        let range = time_step_range(variable, &dimensions, time_index)?;
        Ok(self.variable(variable)?.data[range].to_vec())
    }

    fn attributes(&self, variable: &str) -> Result<Attributes, IoError> {
        Ok(self.variable(variable)?.attributes.clone())
    }
}

/// Sink that collects variables in memory and writes the document on
/// [`FieldSink::finish`]
#[derive(Debug)]
pub struct JsonSink {
    path: PathBuf,
    container: JsonContainer,
}

impl JsonSink {
    /// Sink targeting `path`; nothing is written until `finish`
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            container: JsonContainer::default(),
        }
    }

    /// Content collected so far
    pub fn container(&self) -> &JsonContainer {
        &self.container
    }
}

impl FieldSink for JsonSink {
    fn define_dimension(&mut self, name: &str, len: usize) -> Result<(), IoError> {
        self.container.insert_dimension(name, len)
    }

    fn write(
        &mut self,
        variable: &str,
        dimensions: &[&str],
        data: &[Real],
        attributes: &Attributes,
    ) -> Result<(), IoError> {
        self.container
            .insert_variable(variable, dimensions, data.to_vec(), attributes.clone())
    }

    fn finish(&mut self) -> Result<(), IoError> {
        self.container.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "dimensions": [
            { "name": "time", "len": 2 },
            { "name": "height", "len": 2 },
            { "name": "ncells", "len": 3 }
        ],
        "variables": {
            "zg": {
                "dimensions": ["height", "ncells"],
                "data": [1500.0, 1500.0, 1500.0, 500.0, 500.0, 500.0],
                "attributes": { "units": "m", "standard_name": "geometric_height_at_full_level_center" }
            },
            "ta": {
                "dimensions": ["time", "height", "ncells"],
                "data": [250.0, 251.0, 252.0, 280.0, 281.0, 282.0,
                         255.0, 256.0, 257.0, 285.0, 286.0, 287.0]
            }
        }
    }"#;

    #[test]
    fn test_parse_and_read() {
        let container = JsonContainer::from_json(DOCUMENT).unwrap();
        let dims = container.dimensions("ta").unwrap();
        assert_eq!(dims.len(), 3);
        assert_eq!(dims[0], Dimension::new("time", 2));

        assert_eq!(container.read("zg").unwrap()[3], 500.0);
        assert_eq!(
            container.read_time_step("ta", 1).unwrap(),
            vec![255.0, 256.0, 257.0, 285.0, 286.0, 287.0]
        );
        assert_eq!(container.attributes("zg").unwrap()["units"], "m");
        assert!(container.attributes("ta").unwrap().is_empty());
    }

    #[test]
    fn test_missing_variable_and_time_step() {
        let container = JsonContainer::from_json(DOCUMENT).unwrap();
        assert!(matches!(
            container.read("hus"),
            Err(IoError::MissingVariable(name)) if name == "hus"
        ));
        assert!(matches!(
            container.read_time_step("ta", 2),
            Err(IoError::TimeIndex { index: 2, steps: 2, .. })
        ));
    }

    #[test]
    fn test_check_rejects_short_data() {
        let text = r#"{
            "dimensions": [{ "name": "ncells", "len": 3 }],
            "variables": { "x": { "dimensions": ["ncells"], "data": [1.0, 2.0] } }
        }"#;
        assert!(matches!(
            JsonContainer::from_json(text),
            Err(IoError::Malformed(_))
        ));
    }

    #[test]
    fn test_check_rejects_undeclared_axis() {
        let text = r#"{
            "dimensions": [],
            "variables": { "x": { "dimensions": ["ncells"], "data": [] } }
        }"#;
        assert!(matches!(
            JsonContainer::from_json(text),
            Err(IoError::MissingDimension(name)) if name == "ncells"
        ));
    }

    #[test]
    fn test_redeclare_dimension() {
        let mut container = JsonContainer::default();
        container.insert_dimension("ncells", 4).unwrap();
        container.insert_dimension("ncells", 4).unwrap();
        assert_eq!(container.dimensions.len(), 1);
        assert!(container.insert_dimension("ncells", 5).is_err());
    }

    #[test]
    fn test_sink_writes_file() {
        let path = std::env::temp_dir().join("muphys_json_sink_test.json");

        let mut sink = JsonSink::create(&path);
        sink.define_dimension("height1", 1).unwrap();
        sink.define_dimension("ncells", 2).unwrap();
        let mut attributes = Attributes::new();
        attributes.insert("units".to_string(), "kg m-2 s-1".to_string());
        sink.write("prr_gsp", &["height1", "ncells"], &[1e-4, 0.0], &attributes)
            .unwrap();
        assert!(sink
            .write("bad", &["height1", "ncells"], &[1.0], &attributes)
            .is_err());
        sink.finish().unwrap();

        let loaded = JsonContainer::open(&path).unwrap();
        assert_eq!(loaded, *sink.container());
        assert_eq!(loaded.read("prr_gsp").unwrap(), vec![1e-4, 0.0]);

        let _ = std::fs::remove_file(&path);
    }
}
