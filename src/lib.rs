//! Skinmesh - skeletal animation engine and M3D scene asset loader

pub mod core;
pub mod animation;
pub mod asset;
pub mod scene;
