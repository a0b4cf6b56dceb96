//! Scene asset loading

pub mod tokens;
pub mod m3d;

pub use m3d::{
    load_mesh, load_skinned_mesh, parse_mesh, parse_skinned_mesh,
    M3dMaterial, MeshAsset, SkinnedMeshAsset, SkinnedVertex, Subset, Vertex,
};
