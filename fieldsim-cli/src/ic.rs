use clap::ValueEnum;
use fieldsim_core::{Field, SimulationParams};
use ndarray::Array2;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum IcKind {
    /// The configured rectangle at `init_hotvalue`.
    Hotspot,
    Gaussians,
    Rectangles,
    SmoothNoise,
}

impl IcKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IcKind::Hotspot => "hotspot",
            IcKind::Gaussians => "gaussians",
            IcKind::Rectangles => "rectangles",
            IcKind::SmoothNoise => "smooth_noise",
        }
    }
}

/// Builds the initial field. Random kinds are scaled to `[0, init_value]`.
///
/// Expects `params` to be validated already.
pub fn generate<R: Rng>(rng: &mut R, params: &SimulationParams, kind: IcKind) -> Field {
    let (nx, ny) = (params.nx, params.ny);
    let mut f = Array2::<f32>::zeros((nx, ny));
    let wx = nx as f32 - 1.0;
    let wy = ny as f32 - 1.0;

    match kind {
        IcKind::Hotspot => return params.initial_field(),

        IcKind::Gaussians => {
            let blobs = rng.gen_range(1..=3);
            for _ in 0..blobs {
                let cx = rng.gen_range(0.15..0.85) * wx;
                let cy = rng.gen_range(0.15..0.85) * wy;
                let sigma = rng.gen_range(1.5..6.0f32);
                let amp = rng.gen_range(0.6..1.0f32);
                add_gaussian(&mut f, cx, cy, sigma, amp);
            }
        }

        IcKind::Rectangles => {
            let rects = rng.gen_range(1..=4);
            for _ in 0..rects {
                let x0 = rng.gen_range(0..nx);
                let y0 = rng.gen_range(0..ny);
                let x1 = (x0 + rng.gen_range(1..=(nx / 2).max(1))).min(nx);
                let y1 = (y0 + rng.gen_range(1..=(ny / 2).max(1))).min(ny);
                let val = rng.gen_range(0.5..1.0f32);
                f.slice_mut(ndarray::s![x0..x1, y0..y1])
                    .mapv_inplace(|v| v.max(val));
            }
        }

        IcKind::SmoothNoise => {
            f.mapv_inplace(|_| rng.gen_range(0.0..1.0));
            f = box_blur(&f, 2);
        }
    }

    normalize_01(&mut f);
    f.mapv_inplace(|v| v * params.init_value);
    f
}

fn add_gaussian(f: &mut Field, cx: f32, cy: f32, sigma: f32, amp: f32) {
    for ((x, y), v) in f.indexed_iter_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let r2 = dx * dx + dy * dy;
        *v += amp * (-0.5 * r2 / (sigma * sigma)).exp();
    }
}

fn normalize_01(f: &mut Field) {
    let mx = f.iter().fold(0.0f32, |m, &v| m.max(v));
    if mx > 0.0 {
        f.mapv_inplace(|v| (v / mx).clamp(0.0, 1.0));
    }
}

/// 3x3 box blur with the window clipped at the edges.
fn box_blur(src: &Field, passes: usize) -> Field {
    let (nx, ny) = src.dim();
    let mut cur = src.clone();
    let mut tmp = Array2::<f32>::zeros((nx, ny));

    for _ in 0..passes {
        for x in 0..nx {
            for y in 0..ny {
                let mut sum = 0.0;
                let mut cnt = 0.0;
                for xx in x.saturating_sub(1)..=(x + 1).min(nx - 1) {
                    for yy in y.saturating_sub(1)..=(y + 1).min(ny - 1) {
                        sum += cur[[xx, yy]];
                        cnt += 1.0;
                    }
                }
                tmp[[x, y]] = sum / cnt;
            }
        }
        std::mem::swap(&mut cur, &mut tmp);
    }
    cur
}
