//! Batched, differentiable SO(3) conversions.
//!
//! Same conventions as `cryo_core::lie`: axis-angle tangent vectors, scalar-first
//! quaternions `[w, x, y, z]`, active rotations on column vectors. Inputs are
//! `[batch, n]` tensors and rotations come back as `[batch, 3, 3]`.
//!
//! Every branch that guards a singularity is written with `mask_where` on clamped
//! inputs, so both the value and its gradient stay finite.

use burn::prelude::*;

use crate::error::{ensure_shape, Result};

/// Squared angle below which [`expmap`] uses its Taylor series.
pub const SMALL_ANGLE_THRESHOLD: f32 = 1e-6;

/// Squared quaternion norm below which [`quaternions_to_so3`] returns the identity.
pub const DEGENERATE_QUATERNION_NORM_SQ: f32 = 1e-12;

/// Lower bound on vector norms in [`s2s2_to_so3`].
pub const S2S2_MIN_NORM: f32 = 1e-5;

/// `[batch, 3, 3]` stack of identity matrices.
pub fn identity<B: Backend>(batch: usize, device: &B::Device) -> Tensor<B, 3> {
    let eye = vec![1.0f32, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    Tensor::<B, 3>::from_data(TensorData::new(eye, [1, 3, 3]), device).repeat_dim(0, batch)
}

/// Split `[batch, n]` into `n` column tensors of shape `[batch, 1]`.
fn columns<B: Backend>(t: Tensor<B, 2>) -> Vec<Tensor<B, 2>> {
    let [batch, n] = t.dims();
    (0..n).map(|i| t.clone().slice([0..batch, i..i + 1])).collect()
}

/// Euclidean norm along dim 1, bounded below by `min_norm`.
fn clamped_norm<B: Backend>(v: Tensor<B, 2>, min_norm: f32) -> Tensor<B, 2> {
    v.powf_scalar(2.0)
        .sum_dim(1)
        .clamp_min(min_norm * min_norm)
        .sqrt()
}

/// Row-wise cross product of two `[batch, 3]` tensors.
pub fn cross<B: Backend>(a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 2> {
    let a = columns(a);
    let b = columns(b);
    Tensor::cat(
        vec![
            a[1].clone() * b[2].clone() - a[2].clone() * b[1].clone(),
            a[2].clone() * b[0].clone() - a[0].clone() * b[2].clone(),
            a[0].clone() * b[1].clone() - a[1].clone() * b[0].clone(),
        ],
        1,
    )
}

/// Skew-symmetric matrices `[w]×` for a `[batch, 3]` tensor.
pub fn skew<B: Backend>(w: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
    let [batch, dim] = w.dims();
    ensure_shape(&[batch, 3], &[batch, dim])?;

    let c = columns(w);
    let zero = c[0].zeros_like();
    let entries = vec![
        zero.clone(),
        c[2].clone().neg(),
        c[1].clone(),
        c[2].clone(),
        zero.clone(),
        c[0].clone().neg(),
        c[1].clone().neg(),
        c[0].clone(),
        zero,
    ];
    Ok(Tensor::cat(entries, 1).reshape([batch, 3, 3]))
}

/// Exponential map so(3) → SO(3) for a `[batch, 3]` tensor of tangent vectors.
///
/// `R = I + a [w]× + b [w]×²` with `a = sin θ / θ` and `b = 2 sin²(θ/2) / θ²`;
/// for `θ² < SMALL_ANGLE_THRESHOLD` the Taylor forms `1 - θ²/6` and `1/2 - θ²/24`
/// are selected instead.
pub fn expmap<B: Backend>(w: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
    let [batch, _] = w.dims();
    let k = skew(w.clone())?;

    let theta_sq = w.powf_scalar(2.0).sum_dim(1);
    let small = theta_sq.clone().lower_elem(SMALL_ANGLE_THRESHOLD);
    let safe_sq = theta_sq.clone().clamp_min(SMALL_ANGLE_THRESHOLD);
    let theta = safe_sq.clone().sqrt();

    let half_sin = theta.clone().mul_scalar(0.5).sin();
    let a = theta.clone().sin() / theta;
    let b = half_sin.powf_scalar(2.0).mul_scalar(2.0) / safe_sq;

    let a_series = theta_sq.clone().mul_scalar(-1.0 / 6.0).add_scalar(1.0);
    let b_series = theta_sq.mul_scalar(-1.0 / 24.0).add_scalar(0.5);

    let a = a.mask_where(small.clone(), a_series).reshape([batch, 1, 1]);
    let b = b.mask_where(small, b_series).reshape([batch, 1, 1]);

    let k_sq = k.clone().matmul(k.clone());
    Ok(identity::<B>(batch, &k.device()) + k * a + k_sq * b)
}

/// Quaternions `[batch, 4]` (scalar first, any norm) to rotations `[batch, 3, 3]`.
///
/// Normalization is folded into the `2 / |q|²` factor. Quaternions with
/// `|q|² < DEGENERATE_QUATERNION_NORM_SQ` map to the identity.
pub fn quaternions_to_so3<B: Backend>(q: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
    let [batch, dim] = q.dims();
    ensure_shape(&[batch, 4], &[batch, dim])?;

    let norm_sq = q.clone().powf_scalar(2.0).sum_dim(1);
    let degenerate = norm_sq.clone().lower_elem(DEGENERATE_QUATERNION_NORM_SQ);
    let s = norm_sq
        .clamp_min(DEGENERATE_QUATERNION_NORM_SQ)
        .recip()
        .mul_scalar(2.0)
        .mask_fill(degenerate, 0.0);

    let c = columns(q);
    let (w, x, y, z) = (c[0].clone(), c[1].clone(), c[2].clone(), c[3].clone());
    let one = s.ones_like();

    let xx = x.clone() * x.clone();
    let yy = y.clone() * y.clone();
    let zz = z.clone() * z.clone();
    let xy = x.clone() * y.clone();
    let xz = x.clone() * z.clone();
    let yz = y.clone() * z.clone();
    let wx = w.clone() * x;
    let wy = w.clone() * y;
    let wz = w * z;

    let entries = vec![
        one.clone() - s.clone() * (yy.clone() + zz.clone()),
        s.clone() * (xy.clone() - wz.clone()),
        s.clone() * (xz.clone() + wy.clone()),
        s.clone() * (xy + wz),
        one.clone() - s.clone() * (xx.clone() + zz),
        s.clone() * (yz.clone() - wx.clone()),
        s.clone() * (xz - wy),
        s.clone() * (yz + wx),
        one - s * (xx + yy),
    ];
    Ok(Tensor::cat(entries, 1).reshape([batch, 3, 3]))
}

/// Gram–Schmidt rotation from two `[batch, 3]` tensors; rows are `e1, e2, e1 × e2`.
pub fn s2s2_to_so3<B: Backend>(v1: Tensor<B, 2>, v2: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
    let [batch, d1] = v1.dims();
    ensure_shape(&[batch, 3], &[batch, d1])?;
    ensure_shape(&[batch, 3], &v2.dims())?;

    let e1 = v1.clone() / clamped_norm(v1, S2S2_MIN_NORM);
    let proj = (e1.clone() * v2.clone()).sum_dim(1);
    let u2 = v2 - e1.clone() * proj;
    let e2 = u2.clone() / clamped_norm(u2, S2S2_MIN_NORM);
    let e3 = cross(e1.clone(), e2.clone());

    Ok(Tensor::stack(vec![e1, e2, e3], 1))
}

/// [`s2s2_to_so3`] on a packed `[batch, 6]` tensor `(v1 ‖ v2)`.
pub fn s2s2_packed_to_so3<B: Backend>(v: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
    let [batch, dim] = v.dims();
    ensure_shape(&[batch, 6], &[batch, dim])?;
    let v1 = v.clone().slice([0..batch, 0..3]);
    let v2 = v.slice([0..batch, 3..6]);
    s2s2_to_so3(v1, v2)
}
