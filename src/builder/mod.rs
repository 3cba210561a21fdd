//! Toolchain detection and the external compilers.

pub mod cython;
pub mod native;
pub mod toolchain;

pub use cython::Cythonizer;
pub use native::NativeBuilder;
pub use toolchain::{detect_capability, Detection};
