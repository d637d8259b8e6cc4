//! PNG snapshot export with embedded view metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use fractals_core::{Complex, FractalKind, PlaneRect};

use crate::buffer::FrameBuffer;
use crate::error::RenderError;

/// What was on screen when a snapshot was taken.
#[derive(Debug, Clone)]
pub struct SnapshotMetadata {
    pub kind: FractalKind,
    pub plane: PlaneRect,
    /// Present for Julia renders only.
    pub julia_seed: Option<Complex>,
    pub max_iterations: u32,
    pub smooth: bool,
}

/// Write the frame as an RGBA PNG with the view metadata attached.
pub fn export_png(
    frame: &FrameBuffer,
    path: &Path,
    metadata: &SnapshotMetadata,
) -> crate::Result<()> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(RenderError::InvalidDimensions {
            width: frame.width(),
            height: frame.height(),
        });
    }

    let writer = BufWriter::new(std::fs::File::create(path)?);
    let mut encoder = png::Encoder::new(writer, frame.width(), frame.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "Fractals".to_string())?;
    encoder.add_text_chunk("Description".to_string(), describe(metadata))?;
    for (key, value) in metadata_pairs(metadata, frame) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(frame.pixels())?;
    png_writer.finish()?;

    debug!(
        width = frame.width(),
        height = frame.height(),
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}

fn describe(meta: &SnapshotMetadata) -> String {
    let p = &meta.plane;
    let mut desc = format!(
        "{} - Re [{}, {}], Im [{}, {}], Iterations: {}",
        meta.kind.label(),
        p.x_min,
        p.x_max,
        p.y_min,
        p.y_max,
        meta.max_iterations,
    );
    if let Some(seed) = meta.julia_seed {
        desc.push_str(&format!(", Julia C: {seed}"));
    }
    desc
}

fn metadata_pairs(meta: &SnapshotMetadata, frame: &FrameBuffer) -> Vec<(String, String)> {
    let p = &meta.plane;
    let mut pairs = vec![
        ("Fractals.Kind".into(), meta.kind.label().to_string()),
        ("Fractals.ReMin".into(), p.x_min.to_string()),
        ("Fractals.ReMax".into(), p.x_max.to_string()),
        ("Fractals.ImMin".into(), p.y_min.to_string()),
        ("Fractals.ImMax".into(), p.y_max.to_string()),
        ("Fractals.MaxIterations".into(), meta.max_iterations.to_string()),
        ("Fractals.SmoothColoring".into(), meta.smooth.to_string()),
        (
            "Fractals.Resolution".into(),
            format!("{}x{}", frame.width(), frame.height()),
        ),
    ];
    if let Some(seed) = meta.julia_seed {
        pairs.push(("Fractals.JuliaC_Re".into(), seed.re.to_string()));
        pairs.push(("Fractals.JuliaC_Im".into(), seed.im.to_string()));
    }
    pairs
}
