//! Model fields exchanged with a container
//!
//! Inputs are keyed by the base variable `zg` (geometric height of full
//! levels), whose two axes define the grid: levels first, cells second. All
//! other inputs carry a leading time axis and are read at one time step.

use super::{Attributes, Dimension, FieldSink, FieldSource, IoError};
use crate::core_types::{Real, Species, SpeciesArray};
use crate::grid::{layer_thickness, AtmosphericState, Field2D, GridShape, PrecipitationOutput};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Variable whose axes define the grid
pub const BASE_VARIABLE: &str = "zg";

/// Default name of the level axis of written fields
pub const LEVEL_DIMENSION: &str = "height";

/// Default name of the cell axis of written fields
pub const CELL_DIMENSION: &str = "ncells";

/// Single-level axis of the surface rates
pub const SURFACE_DIMENSION: &str = "height1";

const TEMPERATURE: &str = "ta";
const PRESSURE: &str = "pfull";
const DENSITY: &str = "rho";
const FLUX: &str = "pflx";
const SURFACE_ENERGY: &str = "pre_gsp";

/// Coordinate variables copied verbatim when present, besides the level axis
const COORDINATE_VARIABLES: [&str; 5] = ["clon", "clon_bnds", "clat", "clat_bnds", "height_bnds"];

/// Attributes carried over from input fields to the written ones
const CARRIED_ATTRIBUTES: [&str; 5] = [
    "standard_name",
    "long_name",
    "units",
    "coordinates",
    "CDI_grid_type",
];

/// Container name of a species field
#[must_use]
pub const fn variable_name(species: Species) -> &'static str {
    match species {
        Species::Vapor => "hus",
        Species::Cloud => "clw",
        Species::Rain => "qr",
        Species::Ice => "cli",
        Species::Snow => "qs",
        Species::Graupel => "qg",
    }
}

/// Container name of the surface rate of a precipitating species
#[must_use]
pub const fn surface_variable(species: Species) -> Option<&'static str> {
    match species {
        Species::Rain => Some("prr_gsp"),
        Species::Ice => Some("pri_gsp"),
        Species::Snow => Some("prs_gsp"),
        Species::Graupel => Some("prg_gsp"),
        Species::Vapor | Species::Cloud => None,
    }
}

/// Fields read from an input container
#[derive(Debug, Clone, PartialEq)]
pub struct InputFields {
    /// Kernel state, with layer thickness derived from `heights`
    pub state: AtmosphericState,
    /// Geometric height of full levels (m)
    pub heights: Field2D,
}

/// A variable copied unchanged from input to output
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateVariable {
    pub name: String,
    pub dimensions: Vec<Dimension>,
    pub data: Vec<Real>,
    pub attributes: Attributes,
}

/// Grid metadata of an input container, replayed onto the output
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    /// Level axis of the base variable
    pub levels: Dimension,
    /// Cell axis of the base variable
    pub cells: Dimension,
    /// Coordinate variables found in the input
    pub variables: Vec<CoordinateVariable>,
    /// Carried attributes of each input field, by variable name
    pub field_attributes: FxHashMap<String, Attributes>,
}

impl Coordinates {
    fn attributes_of(&self, variable: &str) -> Attributes {
        self.field_attributes
            .get(variable)
            .cloned()
            .unwrap_or_default()
    }
}

/// Grid shape defined by the base variable
fn base_shape(source: &dyn FieldSource) -> Result<(Dimension, Dimension), IoError> {
    let mut dims = source.dimensions(BASE_VARIABLE)?;
    if dims.len() != 2 {
        return Err(IoError::Malformed(format!(
            "base variable '{BASE_VARIABLE}' has {} axes, expected 2",
            dims.len()
        )));
    }
    let cells = dims.remove(1);
    let levels = dims.remove(0);
    Ok((levels, cells))
}

/// Read one time step of a `[time, level, cell]` variable
fn read_step(
    source: &dyn FieldSource,
    variable: &str,
    shape: GridShape,
    time_index: usize,
) -> Result<Field2D, IoError> {
    let extents: Vec<usize> = source
        .dimensions(variable)?
        .iter()
        .skip(1)
        .map(|d| d.len)
        .collect();
    let expected = vec![shape.levels, shape.columns];
    if extents != expected {
        return Err(IoError::ShapeMismatch {
            variable: variable.to_string(),
            expected,
            actual: extents,
        });
    }
    let data = source.read_time_step(variable, time_index)?;
    Ok(Field2D::from_vec(shape, data)?)
}

/// Read the kernel inputs at `time_index`
///
/// Reads `zg` without a time axis and `ta`, `pfull`, `rho` and the six
/// species fields at the requested step; the layer thickness is derived
/// from `zg`.
pub fn read_fields(source: &dyn FieldSource, time_index: usize) -> Result<InputFields, IoError> {
    let (levels, cells) = base_shape(source)?;
    let shape = GridShape::new(levels.len, cells.len);
    info!(
        levels = shape.levels,
        columns = shape.columns,
        time_index,
        "Reading model fields"
    );

    let heights = Field2D::from_vec(shape, source.read(BASE_VARIABLE)?)?;
    let thickness = layer_thickness(&heights)?;

    let temperature = read_step(source, TEMPERATURE, shape, time_index)?;
    let pressure = read_step(source, PRESSURE, shape, time_index)?;
    let density = read_step(source, DENSITY, shape, time_index)?;

    let mut q = SpeciesArray::from_fn(|_| Field2D::new(shape));
    for species in Species::ALL {
        q[species] = read_step(source, variable_name(species), shape, time_index)?;
    }

    let state = AtmosphericState {
        temperature,
        density,
        pressure,
        thickness,
        q,
    };
    state.validate()?;
    Ok(InputFields { state, heights })
}

/// Collect the grid metadata of an input container
///
/// Coordinate variables that are absent from the input are skipped.
pub fn read_coordinates(source: &dyn FieldSource) -> Result<Coordinates, IoError> {
    let (levels, cells) = base_shape(source)?;

    let names = COORDINATE_VARIABLES
        .iter()
        .copied()
        .chain(std::iter::once(levels.name.as_str()));
    let mut variables = Vec::new();
    for name in names {
        let dimensions = match source.dimensions(name) {
            Ok(dimensions) => dimensions,
            Err(IoError::MissingVariable(_)) => continue,
            Err(e) => return Err(e),
        };
        variables.push(CoordinateVariable {
            name: name.to_string(),
            dimensions,
            data: source.read(name)?,
            attributes: source.attributes(name)?,
        });
    }

    let mut field_attributes = FxHashMap::default();
    let fields = [TEMPERATURE]
        .into_iter()
        .chain(Species::ALL.into_iter().map(variable_name));
    for name in fields {
        let mut attributes = source.attributes(name)?;
        attributes.retain(|key, _| CARRIED_ATTRIBUTES.contains(&key.as_str()));
        field_attributes.insert(name.to_string(), attributes);
    }

    debug!(
        coordinates = variables.len(),
        "collected coordinate metadata"
    );
    Ok(Coordinates {
        levels,
        cells,
        variables,
        field_attributes,
    })
}

/// Write the kernel outputs
///
/// Writes `ta`, the six species and `pflx` on `(level, cell)`, then the
/// surface rates `prr_gsp`, `prs_gsp`, `pri_gsp`, `prg_gsp` and `pre_gsp` on
/// `(height1, cell)`. With `coordinates`, the input's axis names, coordinate
/// variables and field attributes are reproduced. The sink is finished on
/// success.
pub fn write_fields(
    sink: &mut dyn FieldSink,
    state: &AtmosphericState,
    out: &PrecipitationOutput,
    coordinates: Option<&Coordinates>,
) -> Result<(), IoError> {
    let shape = state.shape();
    out.validate(shape)?;

    let (level_dim, cell_dim) = match coordinates {
        Some(c) => (c.levels.name.as_str(), c.cells.name.as_str()),
        None => (LEVEL_DIMENSION, CELL_DIMENSION),
    };
    sink.define_dimension(level_dim, shape.levels)?;
    sink.define_dimension(cell_dim, shape.columns)?;

    if let Some(coordinates) = coordinates {
        for variable in &coordinates.variables {
            for dim in &variable.dimensions {
                sink.define_dimension(&dim.name, dim.len)?;
            }
            let dims: Vec<&str> = variable.dimensions.iter().map(|d| d.name.as_str()).collect();
            sink.write(&variable.name, &dims, &variable.data, &variable.attributes)?;
        }
    }
    sink.define_dimension(SURFACE_DIMENSION, 1)?;

    let attributes_of = |variable: &str| {
        coordinates
            .map(|c| c.attributes_of(variable))
            .unwrap_or_default()
    };
    let grid_dims = [level_dim, cell_dim];
    let surface_dims = [SURFACE_DIMENSION, cell_dim];

    sink.write(
        TEMPERATURE,
        &grid_dims,
        state.temperature.as_slice(),
        &attributes_of(TEMPERATURE),
    )?;
    for species in [
        Species::Vapor,
        Species::Cloud,
        Species::Ice,
        Species::Rain,
        Species::Snow,
        Species::Graupel,
    ] {
        let name = variable_name(species);
        sink.write(
            name,
            &grid_dims,
            state.species(species).as_slice(),
            &attributes_of(name),
        )?;
    }
    sink.write(FLUX, &grid_dims, out.pflx.as_slice(), &Attributes::new())?;

    for species in [Species::Rain, Species::Snow, Species::Ice, Species::Graupel] {
        if let Some(name) = surface_variable(species) {
            sink.write(name, &surface_dims, &out.surface[species], &Attributes::new())?;
        }
    }
    sink.write(SURFACE_ENERGY, &surface_dims, &out.energy, &Attributes::new())?;

    sink.finish()?;
    info!(
        levels = shape.levels,
        columns = shape.columns,
        "Wrote model fields"
    );
    Ok(())
}
