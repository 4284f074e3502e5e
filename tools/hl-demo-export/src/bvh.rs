//! BVH motion writer (.bvh)
//!
//! The hierarchy is a single `MdtCam` root with six channels, the layout
//! camera-import scripts for 3D packages expect. Engine coordinates are
//! Z-up; rows are written Y-up with the eye height added.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::resample::CameraSample;

/// Height of the player's eye above the origin, in engine units
pub const EYE_HEIGHT: f32 = 16.0;

/// Write the hierarchy and motion block for `samples`
pub fn write_bvh<W: Write>(mut w: W, samples: &[CameraSample], frame_time: f32) -> io::Result<()> {
    writeln!(w, "HIERARCHY")?;
    writeln!(w, "ROOT MdtCam")?;
    writeln!(w, "{{")?;
    writeln!(w, "\tOFFSET 0.00 0.00 0.00")?;
    writeln!(
        w,
        "\tCHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation"
    )?;
    writeln!(w, "\tEnd Site")?;
    writeln!(w, "\t{{")?;
    writeln!(w, "\t\tOFFSET 0.00 0.00 -1.00")?;
    writeln!(w, "\t}}")?;
    writeln!(w, "}}")?;

    writeln!(w, "MOTION")?;
    writeln!(w, "Frames: {}", samples.len())?;
    writeln!(w, "Frame Time: {:.6}", frame_time)?;
    for s in samples {
        let p = s.position;
        writeln!(
            w,
            "{} {} {} 0.000000 {} {}",
            -p.y,
            p.z + EYE_HEIGHT,
            -p.x,
            360.0 - s.rotation.x,
            s.rotation.y
        )?;
    }
    w.flush()
}

/// Write `samples` to a BVH file at `path`
pub fn save_bvh(path: &Path, samples: &[CameraSample], frame_time: f32) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_bvh(BufWriter::new(file), samples, frame_time)
        .with_context(|| format!("Failed to write {:?}", path))
}
