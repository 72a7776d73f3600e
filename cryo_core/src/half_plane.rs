//! Index sets for decoding only the non-redundant half of a centrosymmetric Fourier slice.
//!
//! The Fourier transform of a real object satisfies `F(-k) = F(k)*`. On an even D×D
//! lattice whose origin sits at `(D/2, D/2)`, every pixel outside row 0 and column 0 has
//! a conjugate partner reflected through the center pixel. A decoder therefore only
//! evaluates the pixels in [`HalfPlaneIndices::all_eval`] and fills
//! [`HalfPlaneIndices::bottom_rev`] by conjugating the values at
//! [`HalfPlaneIndices::top`].
//!
//! ```text
//!  D = 8, center = 36              e = evaluated, m = mirrored
//!
//!  row 0   e e e e e e e e
//!  row 1   e e e e e e e e
//!  row 2   e e e e e e e e
//!  row 3   e e e e e e e e
//!  row 4   e e e e C m m m
//!  row 5   e m m m m m m m
//!  row 6   e m m m m m m m
//!  row 7   e m m m m m m m
//! ```

use alloc::vec::Vec;

use crate::error::CryoCoreError;

/// Precomputed pixel index sets for one image size.
///
/// All indices refer to the row-major flattening of a D×D image.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfPlaneIndices {
    size: usize,
    center: usize,
    extra: Vec<usize>,
    all_eval: Vec<usize>,
    top: Vec<usize>,
    bottom_rev: Vec<usize>,
    assembly: Vec<usize>,
}

impl HalfPlaneIndices {
    /// Build the index sets for a D×D image.
    ///
    /// # Errors
    /// Returns [`CryoCoreError::InvalidImageSize`] if `size` is odd or smaller than 2.
    pub fn new(size: usize) -> Result<Self, CryoCoreError> {
        if size < 2 || size % 2 != 0 {
            return Err(CryoCoreError::InvalidImageSize { size });
        }
        let d = size;
        let d2 = d / 2;
        let center = d2 * d + d2;

        // Bottom-left column below the center row; these pixels have no partner.
        let extra: Vec<usize> = ((d2 + 1) * d..d * d).step_by(d).collect();

        let mut all_eval: Vec<usize> = (0..=center).collect();
        all_eval.extend_from_slice(&extra);

        // Rows 1..=D2, columns 1..D, minus the tail of the center row.
        let mut top: Vec<usize> = (1..=d2)
            .flat_map(|row| (1..d).map(move |col| row * d + col))
            .collect();
        top.truncate(top.len() - d2);

        // Rows D2..D, columns 1..D, minus the head of the center row, reversed.
        let bottom_rev: Vec<usize> = (d2..d)
            .flat_map(|row| (1..d).map(move |col| row * d + col))
            .skip(d2)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        debug_assert_eq!(top.len(), bottom_rev.len());

        let mut assembly = alloc::vec![usize::MAX; d * d];
        for (pos, &pixel) in all_eval.iter().enumerate() {
            assembly[pixel] = pos;
        }
        for (k, &pixel) in bottom_rev.iter().enumerate() {
            assembly[pixel] = all_eval.len() + k;
        }
        debug_assert!(assembly.iter().all(|&p| p != usize::MAX));

        Ok(Self {
            size,
            center,
            extra,
            all_eval,
            top,
            bottom_rev,
            assembly,
        })
    }

    /// Shared index sets for a D×D image, built at most once per size per process.
    ///
    /// # Errors
    /// Returns [`CryoCoreError::InvalidImageSize`] if `size` is odd or smaller than 2.
    #[cfg(feature = "std")]
    pub fn cached(size: usize) -> Result<std::sync::Arc<Self>, CryoCoreError> {
        cache::get_or_build(size)
    }

    /// Image width (and height) D.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half the image width, D/2.
    #[inline]
    pub fn half_size(&self) -> usize {
        self.size / 2
    }

    /// Total number of pixels, D².
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.size * self.size
    }

    /// Flattened index of the DC term.
    #[inline]
    pub fn center(&self) -> usize {
        self.center
    }

    /// Bottom-left column pixels without a conjugate partner.
    #[inline]
    pub fn extra(&self) -> &[usize] {
        &self.extra
    }

    /// Pixels the decoder evaluates directly, in evaluation order.
    #[inline]
    pub fn all_eval(&self) -> &[usize] {
        &self.all_eval
    }

    /// Source pixels whose conjugates fill [`Self::bottom_rev`].
    ///
    /// Every entry is smaller than [`Self::center`], so it is also its own position
    /// within the evaluated values.
    #[inline]
    pub fn top(&self) -> &[usize] {
        &self.top
    }

    /// Mirrored pixels; `bottom_rev[k]` is the point reflection of `top[k]`.
    #[inline]
    pub fn bottom_rev(&self) -> &[usize] {
        &self.bottom_rev
    }

    /// For every output pixel, its row in `concat(evaluated, mirrored)`.
    ///
    /// Gathering with this permutation writes each pixel exactly once.
    #[inline]
    pub fn assembly(&self) -> &[usize] {
        &self.assembly
    }

    /// Number of direct evaluations per image.
    #[inline]
    pub fn num_evaluated(&self) -> usize {
        self.all_eval.len()
    }

    /// Number of mirrored pixels per image.
    #[inline]
    pub fn num_mirrored(&self) -> usize {
        self.bottom_rev.len()
    }

    /// Point reflection of a pixel through the center, if it stays inside the image.
    pub fn reflect(&self, pixel: usize) -> Option<usize> {
        let d = self.size as isize;
        let c = (self.size / 2) as isize;
        let row = pixel as isize / d;
        let col = pixel as isize % d;
        let (r, q) = (2 * c - row, 2 * c - col);
        if (0..d).contains(&r) && (0..d).contains(&q) {
            Some((r * d + q) as usize)
        } else {
            None
        }
    }

    /// Reassemble a full image from evaluated values using the conjugate mirror.
    ///
    /// `evaluated[i]` must hold the value at pixel `all_eval[i]`.
    pub fn assemble(&self, evaluated: &[[f32; 2]]) -> Vec<[f32; 2]> {
        debug_assert_eq!(evaluated.len(), self.all_eval.len());
        self.assembly
            .iter()
            .map(|&src| match src.checked_sub(evaluated.len()) {
                None => evaluated[src],
                Some(k) => crate::types::conj(evaluated[self.top[k]]),
            })
            .collect()
    }
}

#[cfg(feature = "std")]
mod cache {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, OnceLock};

    use super::HalfPlaneIndices;
    use crate::error::CryoCoreError;

    type IndexCache = Mutex<HashMap<usize, Arc<HalfPlaneIndices>>>;

    static CACHE: OnceLock<IndexCache> = OnceLock::new();

    pub(super) fn get_or_build(size: usize) -> Result<Arc<HalfPlaneIndices>, CryoCoreError> {
        let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        let mut map = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(indices) = map.get(&size) {
            log::debug!("half-plane indices for D={} served from cache", size);
            return Ok(Arc::clone(indices));
        }

        let indices = Arc::new(HalfPlaneIndices::new(size)?);
        log::debug!(
            "built half-plane indices for D={}: {} evaluated, {} mirrored",
            size,
            indices.num_evaluated(),
            indices.num_mirrored()
        );
        map.insert(size, Arc::clone(&indices));
        Ok(indices)
    }
}
