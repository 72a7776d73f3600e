//! Symmetry, translation and sampling properties of the slice decoder.

use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;

use neural_cryo::prelude::*;

type TestBackend = NdArray;

fn decoder(input_dim: usize, size: usize) -> FtSliceDecoder<TestBackend> {
    let config = FtSliceDecoderConfig::new(input_dim, size)
        .with_num_layers(2)
        .with_hidden_dim(32);
    FtSliceDecoder::new(&config, &Default::default()).unwrap()
}

fn rotation(w: [f32; 3]) -> Tensor<TestBackend, 3> {
    let w = Tensor::<TestBackend, 2>::from_data(TensorData::new(w.to_vec(), [1, 3]), &Default::default());
    expmap(w).unwrap()
}

fn rotated_lattice(size: usize, w: [f32; 3]) -> Tensor<TestBackend, 3> {
    let lattice = Lattice::xy_plane(size).unwrap();
    let coords = lattice_coords::<TestBackend>(&lattice, &Default::default());
    rotate_coords(coords, rotation(w)).unwrap()
}

fn values<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
    t.to_data().to_vec().unwrap()
}

#[test]
fn full_image_is_conjugate_symmetric() {
    for size in [4usize, 8, 16] {
        let decoder = decoder(3, size);
        let image = values(
            decoder
                .decode_full_image(rotated_lattice(size, [0.3, -0.8, 1.1]))
                .unwrap(),
        );
        let idx = decoder.indices();

        for (&t, &b) in idx.top().iter().zip(idx.bottom_rev()) {
            assert_eq!(image[2 * b].to_bits(), image[2 * t].to_bits(), "re at {} / {}", t, b);
            assert_eq!(image[2 * b + 1].to_bits(), (-image[2 * t + 1]).to_bits(), "im at {} / {}", t, b);
        }
    }
}

#[test]
fn full_image_matches_pointwise_evaluation_on_evaluated_pixels() {
    let size = 8;
    let decoder = decoder(3, size);
    let lattice = rotated_lattice(size, [0.5, 0.2, -0.4]);

    let full = values(decoder.decode_full_image(lattice.clone()).unwrap());
    let direct = values(decoder.decode_raw(lattice).unwrap());

    for &p in decoder.indices().all_eval() {
        assert!((full[2 * p] - direct[2 * p]).abs() < 1e-5);
        assert!((full[2 * p + 1] - direct[2 * p + 1]).abs() < 1e-5);
    }
}

#[test]
fn raw_decode_negates_upper_half_space() {
    let decoder = decoder(3, 8);
    let device = Default::default();

    let upper: Vec<f32> = (0..16)
        .flat_map(|i| {
            let t = i as f32 / 16.0;
            [t - 0.5, 0.3 - t, 0.05 + t]
        })
        .collect();
    let lower: Vec<f32> = upper.iter().map(|v| -v).collect();

    let upper = Tensor::<TestBackend, 2>::from_data(TensorData::new(upper, [16, 3]), &device).unsqueeze_dim::<3>(0);
    let lower = Tensor::<TestBackend, 2>::from_data(TensorData::new(lower, [16, 3]), &device).unsqueeze_dim::<3>(0);

    let a = values(decoder.decode_raw(upper).unwrap());
    let b = values(conjugate(decoder.decode_raw(lower).unwrap()));
    assert_eq!(a, b);
}

#[test]
fn raw_decode_leaves_latent_untouched() {
    let decoder = decoder(5, 8);
    let device = Default::default();

    // Same reflected coordinates, different latent codes: outputs must differ.
    let a = Tensor::<TestBackend, 3>::from_data([[[0.1f32, 0.2, 0.3, 1.0, -1.0]]], &device);
    let b = Tensor::<TestBackend, 3>::from_data([[[0.1f32, 0.2, 0.3, -1.0, 1.0]]], &device);
    assert_ne!(
        values(decoder.decode_raw(a).unwrap()),
        values(decoder.decode_raw(b).unwrap())
    );
}

#[test]
fn translation_by_zero_is_identity() {
    let device = Default::default();
    let lattice = Lattice::xy_plane(8).unwrap();
    let coords = lattice_wavevectors::<TestBackend>(&lattice, &device);
    let image = Tensor::<TestBackend, 3>::random([2, 64, 2], burn::tensor::Distribution::Default, &device);
    let shifts = Tensor::<TestBackend, 3>::zeros([2, 1, 2], &device);

    let out = translate(coords, image.clone(), shifts).unwrap();
    assert_eq!(out.dims(), [2, 1, 64, 2]);
    let diff = (out.reshape([2, 64, 2]) - image).abs().max().into_scalar();
    assert!(diff < 1e-7);
}

#[test]
fn translation_is_additive() {
    let device = Default::default();
    let lattice = Lattice::xy_plane(8).unwrap();
    let coords = lattice_wavevectors::<TestBackend>(&lattice, &device);
    let image = Tensor::<TestBackend, 3>::random([1, 64, 2], burn::tensor::Distribution::Default, &device);

    let s1 = Tensor::<TestBackend, 3>::from_data([[[0.7f32, -1.3]]], &device);
    let s2 = Tensor::<TestBackend, 3>::from_data([[[-2.1f32, 0.4]]], &device);

    let once = translate(coords.clone(), image.clone(), s2.clone()).unwrap().reshape([1, 64, 2]);
    let twice = translate(coords.clone(), once, s1.clone()).unwrap();
    let combined = translate(coords, image, s1 + s2).unwrap();

    let diff = (twice - combined).abs().max().into_scalar();
    assert!(diff < 1e-4, "max difference {}", diff);
}

#[test]
fn translation_broadcasts_over_shifts() {
    let device = Default::default();
    let lattice = Lattice::xy_plane(4).unwrap();
    let coords = lattice_wavevectors::<TestBackend>(&lattice, &device);
    let image = Tensor::<TestBackend, 3>::ones([3, 16, 2], &device);
    let shifts = Tensor::<TestBackend, 3>::zeros([3, 5, 2], &device);

    let out = translate(coords, image, shifts).unwrap();
    assert_eq!(out.dims(), [3, 5, 16, 2]);
}

#[test]
fn deterministic_sampling_is_quaternion_mean() {
    let device = Default::default();
    let head = So3Reparameterize::<TestBackend>::new(
        &So3ReparameterizeConfig::new(12).with_num_layers(Some(2)).with_hidden_dim(24),
        &device,
    )
    .unwrap();
    let features = Tensor::<TestBackend, 2>::random([4, 12], burn::tensor::Distribution::Default, &device);
    let dist = head.forward(features).unwrap();

    let first = values(head.sample(&dist, SamplingMode::Deterministic).unwrap().rotation);
    let second = values(head.sample(&dist, SamplingMode::Deterministic).unwrap().rotation);
    let expected = values(quaternions_to_so3(dist.mean.clone()).unwrap());

    assert_eq!(first, second);
    assert_eq!(first, expected);
}

#[test]
fn end_to_end_zero_latent_is_repeatable() {
    let size = 32;
    let z_dim = 4;
    let device = Default::default();
    let decoder = decoder(3 + z_dim, size);
    let lattice = Lattice::xy_plane(size).unwrap();

    let head = So3Reparameterize::<TestBackend>::new(&So3ReparameterizeConfig::new(8), &device).unwrap();
    let features = Tensor::<TestBackend, 2>::random([2, 8], burn::tensor::Distribution::Default, &device);
    let dist = head.forward(features).unwrap();
    let rot = head.sample(&dist, SamplingMode::Deterministic).unwrap().rotation;

    let coords = rotate_coords(lattice_coords::<TestBackend>(&lattice, &device), rot).unwrap();
    let z = Tensor::<TestBackend, 3>::zeros([2, size * size, z_dim], &device);
    let input = Tensor::cat(vec![coords, z], 2);

    let first = decoder.decode_full_image(input.clone()).unwrap();
    let second = decoder.decode_full_image(input).unwrap();
    assert_eq!(values(first.clone()), values(second));

    let wavevectors = lattice_wavevectors::<TestBackend>(&lattice, &device);
    let shifted = translate(wavevectors, first.clone(), Tensor::zeros([2, 1, 2], &device)).unwrap();
    let diff = (shifted.reshape([2, size * size, 2]) - first).abs().max().into_scalar();
    assert!(diff < 1e-6);
}

#[test]
fn decoder_gradients_are_finite() {
    type AdBackend = Autodiff<NdArray>;
    let device = Default::default();
    let config = FtSliceDecoderConfig::new(3, 8).with_num_layers(1).with_hidden_dim(16);
    let decoder = FtSliceDecoder::<AdBackend>::new(&config, &device).unwrap();

    let lattice = Lattice::xy_plane(8).unwrap();
    let coords = lattice_coords::<AdBackend>(&lattice, &device);
    let w = Tensor::<AdBackend, 2>::from_data([[0.0f32, 0.0, 0.0]], &device).require_grad();
    let rot = expmap(w.clone()).unwrap();

    let image = decoder
        .decode_full_image(rotate_coords(coords, rot).unwrap())
        .unwrap();
    let grads = image.powf_scalar(2.0).sum().backward();
    let g: Vec<f32> = w.grad(&grads).unwrap().to_data().to_vec().unwrap();
    assert!(g.iter().all(|v| v.is_finite()));
}

#[test]
fn shape_errors_are_reported() {
    let decoder = decoder(3, 8);
    let device = Default::default();

    let err = decoder
        .decode_full_image(Tensor::zeros([1, 63, 3], &device))
        .unwrap_err();
    assert!(matches!(err, NeuralCryoError::ShapeMismatch { .. }));

    let err = decoder
        .decode_raw(Tensor::zeros([1, 10, 4], &device))
        .unwrap_err();
    assert!(matches!(err, NeuralCryoError::ShapeMismatch { .. }));

    assert!(expmap(Tensor::<TestBackend, 2>::zeros([2, 2], &device)).is_err());
    assert!(quaternions_to_so3(Tensor::<TestBackend, 2>::zeros([2, 3], &device)).is_err());
}
