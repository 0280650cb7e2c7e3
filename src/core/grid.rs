// src/core/grid.rs
//
// Padded 3D grids of elastic parameters and facies probabilities

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{check_facies_name, UNDEFINED_NAME};
use crate::core::analysis::{ElasticSlab, ElasticSource, ProbabilitySink, ProbabilitySlab};
use crate::error::{FaciesError, Result};

/// Value written for cells without a probability in raw output
pub const MISSING_VALUE: f32 = -99999.0;

/// Logical and padded grid sizes; x is the fastest index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub nxp: usize,
    pub nyp: usize,
    pub nzp: usize,
}

impl GridDims {
    pub fn new(nx: usize, ny: usize, nz: usize, nxp: usize, nyp: usize, nzp: usize) -> Result<Self> {
        let dims = Self {
            nx,
            ny,
            nz,
            nxp,
            nyp,
            nzp,
        };
        dims.validate()?;
        Ok(dims)
    }

    /// Unpadded grid
    pub fn unpadded(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            nx,
            ny,
            nz,
            nxp: nx,
            nyp: ny,
            nzp: nz,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let pairs = [("x", self.nx, self.nxp), ("y", self.ny, self.nyp), ("z", self.nz, self.nzp)];
        for (axis, n, np) in pairs {
            if n == 0 || np < n {
                return Err(FaciesError::InvalidConfig(format!(
                    "grid {} size {} with padded size {} is not valid",
                    axis, n, np
                )));
            }
        }
        Ok(())
    }

    /// Cells in one padded layer
    pub fn layer_len(&self) -> usize {
        self.nxp * self.nyp
    }

    /// Cells in the full padded grid
    pub fn padded_len(&self) -> usize {
        self.layer_len() * self.nzp
    }

    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.nxp + k * self.layer_len()
    }
}

/// In-memory padded Vp, Vs and density grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticVolume {
    pub dims: GridDims,
    pub vp: Vec<f32>,
    pub vs: Vec<f32>,
    pub rho: Vec<f32>,
}

impl ElasticVolume {
    /// Constant-valued volume
    pub fn filled(dims: GridDims, value: [f32; 3]) -> Self {
        let n = dims.padded_len();
        Self {
            dims,
            vp: vec![value[0]; n],
            vs: vec![value[1]; n],
            rho: vec![value[2]; n],
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let volume: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        volume.validate()?;
        Ok(volume)
    }

    pub fn validate(&self) -> Result<()> {
        self.dims.validate()?;
        let expected = self.dims.padded_len();
        for (what, grid) in [("vp", &self.vp), ("vs", &self.vs), ("rho", &self.rho)] {
            if grid.len() != expected {
                return Err(FaciesError::DimensionMismatch {
                    what: format!("{} grid", what),
                    expected,
                    found: grid.len(),
                });
            }
        }
        Ok(())
    }

    /// Write the volume in the layout read by [`RawElasticSource`].
    pub fn write_raw(&self, dir: &Path) -> Result<()> {
        self.validate()?;
        fs::create_dir_all(dir)?;
        fs::write(dir.join(RAW_DIMS_FILE), serde_json::to_vec_pretty(&self.dims)?)?;
        for (name, grid) in RAW_ELASTIC_FILES.iter().zip([&self.vp, &self.vs, &self.rho]) {
            let mut writer = BufWriter::new(File::create(dir.join(name))?);
            for v in grid {
                let v = if v.is_finite() { *v } else { MISSING_VALUE };
                writer.write_all(&v.to_le_bytes())?;
            }
            writer.flush()?;
        }
        Ok(())
    }

    pub fn set(&mut self, i: usize, j: usize, k: usize, value: [f32; 3]) {
        let idx = self.dims.index(i, j, k);
        self.vp[idx] = value[0];
        self.vs[idx] = value[1];
        self.rho[idx] = value[2];
    }
}

impl ElasticSource for ElasticVolume {
    fn dims(&self) -> GridDims {
        self.dims
    }

    fn read_layer(&mut self, k: usize, slab: &mut ElasticSlab) -> Result<()> {
        let len = self.dims.layer_len();
        let range = k * len..(k + 1) * len;
        slab.vp.clear();
        slab.vp.extend_from_slice(&self.vp[range.clone()]);
        slab.vs.clear();
        slab.vs.extend_from_slice(&self.vs[range.clone()]);
        slab.rho.clear();
        slab.rho.extend_from_slice(&self.rho[range]);
        Ok(())
    }
}

/// Grid sizes of a raw elastic directory
pub const RAW_DIMS_FILE: &str = "dims.json";

/// Raw cubes of a raw elastic directory, in (Vp, Vs, density) order
pub const RAW_ELASTIC_FILES: [&str; 3] = ["vp.bin", "vs.bin", "rho.bin"];

/// Streams padded Vp, Vs and density cubes from little-endian `f32` files.
///
/// The directory holds `dims.json` with the [`GridDims`] and one
/// `nxp * nyp * nzp` cube per parameter, x fastest. Only one layer per
/// parameter is held in memory. Cells equal to [`MISSING_VALUE`] read as NaN.
pub struct RawElasticSource {
    dims: GridDims,
    readers: Vec<BufReader<File>>,
    buffer: Vec<u8>,
    next_layer: usize,
}

impl RawElasticSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let dims: GridDims = serde_json::from_reader(BufReader::new(File::open(
            dir.join(RAW_DIMS_FILE),
        )?))?;
        dims.validate()?;

        let expected = dims.padded_len() as u64 * 4;
        let mut readers = Vec::with_capacity(RAW_ELASTIC_FILES.len());
        for name in RAW_ELASTIC_FILES {
            let file = File::open(dir.join(name))?;
            let found = file.metadata()?.len();
            if found != expected {
                return Err(FaciesError::DimensionMismatch {
                    what: format!("bytes in {}", name),
                    expected: expected as usize,
                    found: found as usize,
                });
            }
            readers.push(BufReader::new(file));
        }

        Ok(Self {
            dims,
            readers,
            buffer: vec![0; dims.layer_len() * 4],
            next_layer: 0,
        })
    }
}

impl ElasticSource for RawElasticSource {
    fn dims(&self) -> GridDims {
        self.dims
    }

    fn read_layer(&mut self, k: usize, slab: &mut ElasticSlab) -> Result<()> {
        if k >= self.dims.nzp {
            return Err(FaciesError::DimensionMismatch {
                what: "elastic layer index".to_string(),
                expected: self.dims.nzp,
                found: k,
            });
        }
        let offset = (k * self.buffer.len()) as u64;
        let targets = [&mut slab.vp, &mut slab.vs, &mut slab.rho];
        for (reader, target) in self.readers.iter_mut().zip(targets) {
            if k != self.next_layer {
                reader.seek(SeekFrom::Start(offset))?;
            }
            reader.read_exact(&mut self.buffer)?;
            target.clear();
            target.extend(self.buffer.chunks_exact(4).map(|b| {
                let v = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                if v == MISSING_VALUE {
                    f32::NAN
                } else {
                    v
                }
            }));
        }
        self.next_layer = k + 1;
        Ok(())
    }
}

/// Facies probability grids over the padded footprint of the logical layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityVolume {
    pub dims: GridDims,
    pub facies_names: Vec<String>,
    /// One grid per facies, `nxp * nyp * nz` cells each
    pub facies: Vec<Vec<Option<f32>>>,
    pub undefined: Vec<Option<f32>>,
}

impl ProbabilityVolume {
    pub fn new(dims: GridDims, facies_names: Vec<String>) -> Self {
        let n = dims.layer_len() * dims.nz;
        Self {
            dims,
            facies: vec![vec![None; n]; facies_names.len()],
            facies_names,
            undefined: vec![None; n],
        }
    }

    pub fn probability(&self, facies: usize, i: usize, j: usize, k: usize) -> Option<f32> {
        self.facies.get(facies)?[self.dims.index(i, j, k)]
    }

    pub fn undefined_at(&self, i: usize, j: usize, k: usize) -> Option<f32> {
        self.undefined[self.dims.index(i, j, k)]
    }
}

impl ProbabilitySink for ProbabilityVolume {
    fn write_layer(&mut self, k: usize, slab: &ProbabilitySlab) -> Result<()> {
        let offset = k * self.dims.layer_len();
        for cell in 0..slab.n_voxels() {
            for (f, grid) in self.facies.iter_mut().enumerate() {
                grid[offset + cell] = slab.facies(f, cell);
            }
            self.undefined[offset + cell] = slab.undefined(cell);
        }
        Ok(())
    }
}

/// Writes one little-endian `f32` file per facies plus `undefined.bin`
///
/// Facies names are file stems and go through [`check_facies_name`], so no
/// cube can land outside `dir` or overwrite the undefined cube.
pub struct RawFileSink {
    paths: Vec<PathBuf>,
    writers: Vec<BufWriter<File>>,
}

impl RawFileSink {
    pub fn create(dir: &Path, facies_names: &[String]) -> Result<Self> {
        for name in facies_names {
            check_facies_name(name)?;
        }
        let paths: Vec<PathBuf> = facies_names
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(UNDEFINED_NAME))
            .map(|stem| dir.join(format!("{}.bin", stem)))
            .collect();
        if let Some(i) = (1..paths.len()).find(|&i| paths[..i].contains(&paths[i])) {
            return Err(FaciesError::InvalidConfig(format!(
                "two probability cubes would share {}",
                paths[i].display()
            )));
        }
        fs::create_dir_all(dir)?;
        let writers = paths
            .iter()
            .map(|p| File::create(p).map(BufWriter::new))
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { paths, writers })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl ProbabilitySink for RawFileSink {
    fn write_layer(&mut self, _k: usize, slab: &ProbabilitySlab) -> Result<()> {
        let n_facies = slab.n_facies();
        for (f, writer) in self.writers.iter_mut().enumerate() {
            for cell in 0..slab.n_voxels() {
                let value = if f < n_facies {
                    slab.facies(f, cell)
                } else {
                    slab.undefined(cell)
                };
                writer.write_all(&value.unwrap_or(MISSING_VALUE).to_le_bytes())?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}
