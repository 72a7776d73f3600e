//! Sample rotations from an SO(3) reparameterization head and run a pose VAE.
//!
//! Shows how the spread of sampled rotations around the mean grows with the predicted
//! standard deviation, then runs a full `PoseVae` forward pass in both sampling modes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin pose_sampling
//! RUST_LOG=debug cargo run --release --bin pose_sampling
//! ```

use burn::backend::NdArray;
use burn::prelude::*;
use instant::Instant;

use neural_cryo::prelude::*;

type DemoBackend = NdArray;

const SAMPLES: usize = 512;
const IMAGE_SIZE: usize = 32;

/// Mean geodesic angle (radians) between `a[i]` and `b[i]`.
fn mean_angle(a: Tensor<DemoBackend, 3>, b: Tensor<DemoBackend, 3>) -> f32 {
    let [batch, _, _] = a.dims();
    let relative = a.swap_dims(1, 2).matmul(b);
    let diagonal = relative.clone() * neural_cryo::lie::identity::<DemoBackend>(batch, &relative.device());
    let trace: Vec<f32> = diagonal
        .sum_dim(2)
        .sum_dim(1)
        .reshape([batch])
        .to_data()
        .to_vec()
        .expect("rotations are f32");

    trace
        .iter()
        .map(|t| ((t - 1.0) / 2.0).clamp(-1.0, 1.0).acos())
        .sum::<f32>()
        / batch as f32
}

fn main() -> neural_cryo::Result<()> {
    env_logger::init();
    let device = Default::default();

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("              SO(3) Pose Sampling Demo");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    let head = So3Reparameterize::<DemoBackend>::new(&So3ReparameterizeConfig::new(4), &device)?;
    let mean = Tensor::<DemoBackend, 2>::from_data([[0.9f32, 0.1, -0.3, 0.2]], &device).repeat_dim(0, SAMPLES);

    println!("  σ (rad)    mean angle to R_mean (rad)");
    for sigma in [0.01f32, 0.1, 0.3, 1.0] {
        let dist = PoseDistribution {
            mean: mean.clone(),
            std: Tensor::full([SAMPLES, 3], sigma, &device),
        };
        let mean_rot = head.mean_rotation(&dist)?;
        let sample = head.sample(&dist, SamplingMode::Stochastic)?;
        println!("  {:<9}  {:.4}", sigma, mean_angle(mean_rot, sample.rotation));
    }
    println!();

    let config = PoseVaeConfig::new(IMAGE_SIZE)
        .with_encoder(EncoderKind::Resid {
            num_layers: 4,
            hidden_dim: 128,
        })
        .with_decoder_dim(128);
    let vae = PoseVae::<DemoBackend>::new(&config, &device)?;
    log::info!("pose VAE ready for {}x{} images", IMAGE_SIZE, IMAGE_SIZE);
    let images = Tensor::<DemoBackend, 4>::random(
        [8, IMAGE_SIZE, IMAGE_SIZE, 2],
        burn::tensor::Distribution::Normal(0.0, 1.0),
        &device,
    );

    for mode in [SamplingMode::Stochastic, SamplingMode::Deterministic] {
        let start = Instant::now();
        let out = vae.forward(images.clone(), mode)?;
        println!(
            "  PoseVae {:?}: reconstruction {:?} in {:.2} ms",
            mode,
            out.reconstruction.dims(),
            start.elapsed().as_secs_f64() * 1e3
        );
    }
    println!();

    Ok(())
}
