//! # deepxml-core
//!
//! Core data types shared by every deepxml crate.
//!
//! This crate provides:
//! - [`Tensor`]: dense `[batch, dim]` f32 matrix tagged with a [`Device`]
//! - [`CsrMatrix`] / [`Matrix`]: sparse and dense feature/label matrices
//! - [`Repr`]: the value flowing through a transform stack
//! - [`io`] / [`npz`]: XC text files, scipy `.npz` archives, `.npy` arrays
//! - [`Error`] / [`Result`]: the workspace-wide error type

pub mod device;
pub mod error;
pub mod io;
pub mod matrix;
pub mod npz;
pub mod repr;
pub mod sparse;
pub mod tensor;

pub use device::Device;
pub use error::{Error, Result};
pub use matrix::{Matrix, Row};
pub use repr::{Repr, SparseBatch};
pub use sparse::{CsrMatrix, Norm};
pub use tensor::Tensor;
