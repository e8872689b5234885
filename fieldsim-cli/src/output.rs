use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fieldsim_core::adapter::flatten_column_major;
use fieldsim_core::{Field, FieldStats, RenderError, Renderer};
use serde::Serialize;
use tracing::debug;

use crate::config::DisplayConfig;

#[derive(Serialize)]
struct FrameRow {
    frame: u64,
    nx: usize,
    ny: usize,
    min: f32,
    max: f32,
    mean: f32,
    total: f64,
}

#[derive(Serialize)]
struct Scene<'a> {
    nx: usize,
    ny: usize,
    scheme: &'a str,
    ic: &'a str,
    seed: u64,
    layout: &'a str,
    display: &'a DisplayConfig,
}

/// Renderer that appends every frame to `frames.bin` (little-endian `f32`,
/// column-major) with one JSON line per frame in `meta.jsonl`.
pub struct FrameWriter {
    frames: BufWriter<File>,
    meta: BufWriter<File>,
    written: u64,
}

impl FrameWriter {
    pub fn create(out: &Path) -> Result<Self> {
        fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
        let frames = BufWriter::new(
            File::create(out.join("frames.bin")).context("creating frames.bin")?,
        );
        let meta = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(out.join("meta.jsonl"))
                .context("creating meta.jsonl")?,
        );
        Ok(Self {
            frames,
            meta,
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn finish(&mut self) -> Result<()> {
        self.frames.flush()?;
        self.meta.flush()?;
        Ok(())
    }

    fn write_frame(&mut self, field: &Field) -> std::io::Result<()> {
        for x in flatten_column_major(field) {
            self.frames.write_all(&x.to_le_bytes())?;
        }

        let (nx, ny) = field.dim();
        let st = FieldStats::of(field);
        let row = FrameRow {
            frame: self.written,
            nx,
            ny,
            min: st.min,
            max: st.max,
            mean: st.mean,
            total: st.total,
        };
        serde_json::to_writer(&mut self.meta, &row)?;
        self.meta.write_all(b"\n")?;
        debug!(frame = self.written, max = st.max, "frame written");
        self.written += 1;
        Ok(())
    }
}

impl Renderer for FrameWriter {
    fn update(&mut self, field: &Field) -> Result<(), RenderError> {
        self.write_frame(field).map_err(RenderError::from)
    }
}

pub fn write_scene(
    out: &Path,
    nx: usize,
    ny: usize,
    scheme: &str,
    ic: &str,
    seed: u64,
    display: &DisplayConfig,
) -> Result<()> {
    let scene = Scene {
        nx,
        ny,
        scheme,
        ic,
        seed,
        layout: "column_major_f32_le",
        display,
    };
    let file = File::create(out.join("scene.json")).context("creating scene.json")?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, &scene)?;
    w.flush()?;
    Ok(())
}
