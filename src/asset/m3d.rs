//! M3D scene asset loading
//!
//! M3D is a whitespace-tokenized text format. Sections appear in a fixed
//! order, each introduced by a single header token:
//!
//! ```text
//! header, counts (#Materials #Vertices #Triangles #Bones #AnimationClips),
//! materials, subset table, vertices, triangles,
//! bone offsets, bone hierarchy, animation clips   (skinned assets only)
//! ```
//!
//! Every field value is preceded by a label token that is read and discarded.
//! Clip and per-bone keyframe blocks are delimited by `{` and `}`.

use crate::animation::{AnimationClip, BoneAnimation, Keyframe, SkinnedSkeleton};
use crate::asset::tokens::Tokens;
use crate::core::{Error, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// File extension for M3D assets
pub const M3D_FILE_EXTENSION: &str = "m3d";

/// Upper bound on preallocation from header counts, which are untrusted
const MAX_PREALLOC: usize = 1 << 16;

/// Surface description for one mesh subset
#[derive(Clone, Debug, PartialEq)]
pub struct M3dMaterial {
    pub name: String,
    pub diffuse_albedo: Vec4,
    pub fresnel_r0: Vec3,
    pub roughness: f32,
    pub alpha_clip: bool,
    pub material_type_name: String,
    pub diffuse_map_name: String,
    pub normal_map_name: String,
}

impl Default for M3dMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse_albedo: Vec4::ONE,
            fresnel_r0: Vec3::splat(0.01),
            roughness: 0.8,
            alpha_clip: false,
            material_type_name: String::new(),
            diffuse_map_name: String::new(),
            normal_map_name: String::new(),
        }
    }
}

/// Vertex and face range drawn with one material
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Subset {
    pub id: u32,
    pub vertex_start: u32,
    pub vertex_count: u32,
    pub face_start: u32,
    pub face_count: u32,
}

/// Static mesh vertex
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub tex_c: Vec2,
    pub tangent_u: Vec4,
}

/// Skinned mesh vertex
///
/// Only three blend weights are stored; the fourth is `1 - (x + y + z)`
/// and is reconstructed by the vertex shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub tex_c: Vec2,
    pub tangent_u: Vec3,
    pub bone_weights: Vec3,
    pub bone_indices: [u8; 4],
}

/// A loaded static mesh
#[derive(Clone, Debug)]
pub struct MeshAsset {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub subsets: Vec<Subset>,
    pub materials: Vec<M3dMaterial>,
}

/// A loaded skinned mesh with its skeleton and clips
#[derive(Clone, Debug)]
pub struct SkinnedMeshAsset {
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u16>,
    pub subsets: Vec<Subset>,
    pub materials: Vec<M3dMaterial>,
    /// Shared with every instance spawned from this asset
    pub skeleton: Arc<SkinnedSkeleton>,
}

/// Element counts from the file header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Header {
    materials: usize,
    vertices: usize,
    triangles: usize,
    bones: usize,
    animation_clips: usize,
}

/// Load a static mesh from an M3D file
///
/// Skeleton sections, if present, are ignored.
pub fn load_mesh(path: &Path) -> Result<MeshAsset> {
    let text = read_asset(path)?;
    let mesh = parse_mesh(&text)?;
    log::info!(
        "Loaded mesh {}: {} vertices, {} triangles, {} materials",
        path.display(),
        mesh.vertices.len(),
        mesh.indices.len() / 3,
        mesh.materials.len()
    );
    Ok(mesh)
}

/// Load a skinned mesh, its skeleton and animation clips from an M3D file
pub fn load_skinned_mesh(path: &Path) -> Result<SkinnedMeshAsset> {
    let text = read_asset(path)?;
    let mesh = parse_skinned_mesh(&text)?;
    log::info!(
        "Loaded skinned mesh {}: {} vertices, {} triangles, {} bones, clips {:?}",
        path.display(),
        mesh.vertices.len(),
        mesh.indices.len() / 3,
        mesh.skeleton.bone_count(),
        mesh.skeleton.clip_names()
    );
    Ok(mesh)
}

fn read_asset(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::AssetOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a static mesh from M3D text
pub fn parse_mesh(text: &str) -> Result<MeshAsset> {
    let mut tokens = Tokens::new(text);
    let header = read_header(&mut tokens)?;

    let materials = read_materials(&mut tokens, header.materials)?;
    let subsets = read_subset_table(&mut tokens, header.materials)?;
    let vertices = read_vertices(&mut tokens, header.vertices)?;
    let indices = read_triangles(&mut tokens, header.triangles, vertices.len())?;

    Ok(MeshAsset {
        vertices,
        indices,
        subsets,
        materials,
    })
}

/// Parse a skinned mesh from M3D text
pub fn parse_skinned_mesh(text: &str) -> Result<SkinnedMeshAsset> {
    let mut tokens = Tokens::new(text);
    let header = read_header(&mut tokens)?;

    let materials = read_materials(&mut tokens, header.materials)?;
    let subsets = read_subset_table(&mut tokens, header.materials)?;
    let vertices = read_skinned_vertices(&mut tokens, header.vertices)?;
    let indices = read_triangles(&mut tokens, header.triangles, vertices.len())?;
    let bone_offsets = read_bone_offsets(&mut tokens, header.bones)?;
    let bone_hierarchy = read_bone_hierarchy(&mut tokens, header.bones)?;
    let animations = read_animation_clips(&mut tokens, header.bones, header.animation_clips)?;

    let skeleton = SkinnedSkeleton::new(&bone_hierarchy, bone_offsets, animations)?;

    Ok(SkinnedMeshAsset {
        vertices,
        indices,
        subsets,
        materials,
        skeleton: Arc::new(skeleton),
    })
}

fn read_header(tokens: &mut Tokens<'_>) -> Result<Header> {
    tokens.enter("header");
    tokens.skip()?; // title

    let header = Header {
        materials: tokens.labeled()?,
        vertices: tokens.labeled()?,
        triangles: tokens.labeled()?,
        bones: tokens.labeled()?,
        animation_clips: tokens.labeled()?,
    };
    log::debug!("M3D header: {:?}", header);
    Ok(header)
}

fn read_materials(tokens: &mut Tokens<'_>, count: usize) -> Result<Vec<M3dMaterial>> {
    tokens.enter("materials");
    tokens.skip()?;

    let mut materials = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let name = tokens.labeled()?;
        let albedo: [f32; 3] = tokens.labeled_floats()?;
        let fresnel: [f32; 3] = tokens.labeled_floats()?;
        let roughness = tokens.labeled()?;
        tokens.skip()?;
        let alpha_clip = tokens.flag()?;

        materials.push(M3dMaterial {
            name,
            diffuse_albedo: Vec3::from(albedo).extend(1.0),
            fresnel_r0: Vec3::from(fresnel),
            roughness,
            alpha_clip,
            material_type_name: tokens.labeled()?,
            diffuse_map_name: tokens.labeled()?,
            normal_map_name: tokens.labeled()?,
        });
    }
    log::debug!("Read {} materials", materials.len());
    Ok(materials)
}

fn read_subset_table(tokens: &mut Tokens<'_>, count: usize) -> Result<Vec<Subset>> {
    tokens.enter("subset table");
    tokens.skip()?;

    (0..count)
        .map(|_| {
            Ok(Subset {
                id: tokens.labeled()?,
                vertex_start: tokens.labeled()?,
                vertex_count: tokens.labeled()?,
                face_start: tokens.labeled()?,
                face_count: tokens.labeled()?,
            })
        })
        .collect()
}

fn read_vertices(tokens: &mut Tokens<'_>, count: usize) -> Result<Vec<Vertex>> {
    tokens.enter("vertices");
    tokens.skip()?;

    let mut vertices = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let pos: [f32; 3] = tokens.labeled_floats()?;
        let tangent: [f32; 4] = tokens.labeled_floats()?;
        let normal: [f32; 3] = tokens.labeled_floats()?;
        let tex_c: [f32; 2] = tokens.labeled_floats()?;

        vertices.push(Vertex {
            pos: pos.into(),
            normal: normal.into(),
            tex_c: tex_c.into(),
            tangent_u: tangent.into(),
        });
    }
    log::debug!("Read {} vertices", vertices.len());
    Ok(vertices)
}

fn read_skinned_vertices(tokens: &mut Tokens<'_>, count: usize) -> Result<Vec<SkinnedVertex>> {
    tokens.enter("vertices");
    tokens.skip()?;

    let mut vertices = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let pos: [f32; 3] = tokens.labeled_floats()?;
        // Tangent handedness (w) is not kept for skinned vertices
        let [tx, ty, tz, _]: [f32; 4] = tokens.labeled_floats()?;
        let normal: [f32; 3] = tokens.labeled_floats()?;
        let tex_c: [f32; 2] = tokens.labeled_floats()?;
        let [w0, w1, w2, _]: [f32; 4] = tokens.labeled_floats()?;

        tokens.skip()?;
        let mut bone_indices = [0u8; 4];
        for slot in &mut bone_indices {
            let index: i32 = tokens.parse()?;
            *slot = u8::try_from(index)
                .map_err(|_| tokens.error(format!("bone index {} does not fit in a byte", index)))?;
        }

        vertices.push(SkinnedVertex {
            pos: pos.into(),
            normal: normal.into(),
            tex_c: tex_c.into(),
            tangent_u: Vec3::new(tx, ty, tz),
            bone_weights: Vec3::new(w0, w1, w2),
            bone_indices,
        });
    }
    log::debug!("Read {} skinned vertices", vertices.len());
    Ok(vertices)
}

fn read_triangles(tokens: &mut Tokens<'_>, count: usize, vertex_count: usize) -> Result<Vec<u16>> {
    tokens.enter("triangles");
    tokens.skip()?;

    let index_count = count.saturating_mul(3);
    let mut indices = Vec::with_capacity(index_count.min(MAX_PREALLOC));
    for _ in 0..index_count {
        let index: u16 = tokens.parse()?;
        if usize::from(index) >= vertex_count {
            return Err(tokens.error(format!(
                "vertex index {} out of range for {} vertices",
                index, vertex_count
            )));
        }
        indices.push(index);
    }
    Ok(indices)
}

fn read_bone_offsets(tokens: &mut Tokens<'_>, count: usize) -> Result<Vec<Mat4>> {
    tokens.enter("bone offsets");
    tokens.skip()?;

    // Rows of a row-vector matrix are the columns of the same transform in
    // glam's column-vector convention, so the file order loads as-is.
    (0..count)
        .map(|_| -> Result<Mat4> { Ok(Mat4::from_cols_array(&tokens.labeled_floats::<16>()?)) })
        .collect()
}

fn read_bone_hierarchy(tokens: &mut Tokens<'_>, count: usize) -> Result<Vec<i32>> {
    tokens.enter("bone hierarchy");
    tokens.skip()?;

    (0..count).map(|_| tokens.labeled()).collect()
}

fn read_bone_keyframes(tokens: &mut Tokens<'_>) -> Result<BoneAnimation> {
    tokens.skip()?; // BoneN
    let count: usize = tokens.labeled()?;
    tokens.expect("{")?;

    let mut keyframes = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let time = tokens.labeled()?;
        let translation: [f32; 3] = tokens.labeled_floats()?;
        let scale: [f32; 3] = tokens.labeled_floats()?;
        let rotation: [f32; 4] = tokens.labeled_floats()?;

        keyframes.push(Keyframe::new(
            time,
            translation.into(),
            scale.into(),
            Quat::from_array(rotation),
        ));
    }
    tokens.expect("}")?;

    BoneAnimation::new(keyframes)
}

fn read_animation_clips(
    tokens: &mut Tokens<'_>,
    bone_count: usize,
    clip_count: usize,
) -> Result<HashMap<String, AnimationClip>> {
    tokens.enter("animation clips");
    tokens.skip()?;

    let mut animations = HashMap::with_capacity(clip_count.min(MAX_PREALLOC));
    for _ in 0..clip_count {
        let name: String = tokens.labeled()?;
        tokens.expect("{")?;

        let bone_animations = (0..bone_count)
            .map(|_| read_bone_keyframes(tokens))
            .collect::<Result<Vec<_>>>()?;
        tokens.expect("}")?;

        log::debug!("Read clip '{}' ({} bones)", name, bone_count);
        if animations.insert(name.clone(), AnimationClip::new(bone_animations)).is_some() {
            return Err(tokens.error(format!("duplicate animation clip '{}'", name)));
        }
    }
    Ok(animations)
}
