//! Rendering resources exposed to scripts

pub mod material;

pub use material::{Material, MaterialBackend, SubMaterials};
