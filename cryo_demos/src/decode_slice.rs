//! Decode central slices with a randomly initialized decoder.
//!
//! Builds an `FtSliceDecoder`, decodes a batch of rotated slices, checks conjugate
//! symmetry of the result and times half-plane decoding against evaluating every
//! pixel.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin decode_slice
//! cargo run --release --bin decode_slice -- --large  # 128×128 images
//! RUST_LOG=debug cargo run --release --bin decode_slice
//! ```

use std::env;

use burn::backend::NdArray;
use burn::prelude::*;
use instant::Instant;

use neural_cryo::prelude::*;

type DemoBackend = NdArray;

/// Demo configuration
struct DemoConfig {
    /// Image width (and height)
    image_size: usize,
    /// Slices per batch
    batch: usize,
    /// Heterogeneity latent width
    z_dim: usize,
    /// Timing iterations
    iterations: usize,
}

impl DemoConfig {
    fn small() -> Self {
        Self {
            image_size: 64,
            batch: 4,
            z_dim: 8,
            iterations: 10,
        }
    }

    fn large() -> Self {
        Self {
            image_size: 128,
            batch: 4,
            z_dim: 8,
            iterations: 5,
        }
    }
}

fn time_it<F: FnMut()>(iterations: usize, mut f: F) -> f64 {
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    start.elapsed().as_secs_f64() / iterations as f64
}

fn main() -> neural_cryo::Result<()> {
    env_logger::init();

    let config = if env::args().any(|a| a == "--large") {
        DemoConfig::large()
    } else {
        DemoConfig::small()
    };
    let device = Default::default();
    let d = config.image_size;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("              Fourier-Slice Decoding Demo");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Image size:        {}×{}", d, d);
    println!("  Batch:             {}", config.batch);
    println!("  Latent width:      {}", config.z_dim);

    let decoder = FtSliceDecoder::<DemoBackend>::new(
        &FtSliceDecoderConfig::with_latent(config.z_dim, d),
        &device,
    )?;
    let indices = decoder.indices();
    log::info!("decoder ready for {}x{} slices", d, d);
    println!(
        "  Evaluated pixels:  {} of {} ({:.1}%)",
        indices.num_evaluated(),
        indices.num_pixels(),
        100.0 * indices.num_evaluated() as f64 / indices.num_pixels() as f64
    );
    println!();

    // Rotated lattice with a per-slice latent code appended.
    let lattice = Lattice::xy_plane(d)?;
    let w: Vec<f32> = (0..config.batch)
        .flat_map(|i| {
            let t = i as f32 / config.batch as f32;
            [t, 0.5 - t, 2.0 * t]
        })
        .collect();
    let rot = expmap(Tensor::from_data(TensorData::new(w, [config.batch, 3]), &device))?;
    let coords = rotate_coords(lattice_coords::<DemoBackend>(&lattice, &device), rot)?;
    let z = Tensor::<DemoBackend, 3>::random(
        [config.batch, d * d, config.z_dim],
        burn::tensor::Distribution::Normal(0.0, 1.0),
        &device,
    );
    let input = Tensor::cat(vec![coords, z], 2);

    let image = decoder.decode_full_image(input.clone())?;
    let values: Vec<f32> = image
        .to_data()
        .to_vec()
        .expect("decoded slices are f32");

    let mut max_asymmetry = 0.0f32;
    for b in 0..config.batch {
        let base = b * d * d * 2;
        for (&t, &m) in indices.top().iter().zip(indices.bottom_rev()) {
            let re = (values[base + 2 * m] - values[base + 2 * t]).abs();
            let im = (values[base + 2 * m + 1] + values[base + 2 * t + 1]).abs();
            max_asymmetry = max_asymmetry.max(re).max(im);
        }
    }
    println!("  Conjugate symmetry: max deviation {:e}", max_asymmetry);

    let half = time_it(config.iterations, || {
        let _ = decoder.decode_full_image(input.clone());
    });
    let full = time_it(config.iterations, || {
        let _ = decoder.decode_raw(input.clone());
    });
    println!("  Half-plane decode:  {:.2} ms", half * 1e3);
    println!("  Every-pixel decode: {:.2} ms", full * 1e3);
    println!("  Speedup:            {:.2}×", full / half);

    let wavevectors = lattice_wavevectors::<DemoBackend>(&lattice, &device);
    let shifts = Tensor::<DemoBackend, 3>::from_data(
        TensorData::new(vec![1.5f32, -0.5].repeat(config.batch), [config.batch, 1, 2]),
        &device,
    );
    let start = Instant::now();
    let shifted = decoder.translate(wavevectors, image, shifts)?;
    println!(
        "  Translate:          {:?} in {:.2} ms",
        shifted.dims(),
        start.elapsed().as_secs_f64() * 1e3
    );
    println!();

    Ok(())
}
