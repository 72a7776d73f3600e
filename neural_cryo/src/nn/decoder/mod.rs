//! Decoders from rotated frequency lattices to Fourier-space images.

mod slice;

pub use slice::{conjugate, translate, FtSliceDecoder};
