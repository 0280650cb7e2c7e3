// src/core/diagnostics.rs
//
// Plain-text dumps of filtered, original and background logs

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::analysis::FilteredTrace;
use crate::core::well::ElasticTrace;
use crate::error::Result;

/// Facies value written for layers without a usable label
const MISSING_FACIES: i64 = -1;

/// Write `filteredlogs.dat`, `originallogs.dat` and `background.dat` to `dir`.
///
/// One row per layer: well index, time (ms), Vp, Vs, density, facies.
pub fn write_log_dumps(dir: &Path, traces: &[FilteredTrace]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for name in ["filteredlogs.dat", "originallogs.dat", "background.dat"] {
        let mut out = BufWriter::new(File::create(dir.join(name))?);
        for trace in traces {
            let logs = match name {
                "filteredlogs.dat" => &trace.filtered,
                "originallogs.dat" => &trace.blocked,
                _ => &trace.background,
            };
            write_trace(&mut out, trace, logs)?;
        }
        out.flush()?;
    }
    Ok(())
}

fn write_trace<W: Write>(out: &mut W, trace: &FilteredTrace, logs: &ElasticTrace) -> Result<()> {
    for layer in 0..logs.len() {
        let facies = trace.facies[layer].map_or(MISSING_FACIES, |f| f as i64);
        writeln!(
            out,
            "{} {:.6} {:.6} {:.6} {:.6} {}",
            trace.well_index,
            trace.time_ms(layer),
            logs.vp[layer],
            logs.vs[layer],
            logs.rho[layer],
            facies
        )?;
    }
    Ok(())
}
