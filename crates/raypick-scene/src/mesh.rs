//! Triangle meshes with sub-meshes, levels of detail and texture channels.
//!
//! A [`TriangleMesh`] holds one or more [`MeshLod`]s. Picking always uses the
//! first one. Each level owns a [`VertexBuffer`] and a list of [`Geometry`]
//! sub-meshes that index into it.

use glam::{Vec2, Vec3};
use raypick_core::geometry::nearest_segment_triangle;
use raypick_core::{Aabb, Segment, TriangleCorner, TriangleHit};

use crate::error::{Result, SceneError};

/// Vertex positions plus any number of texture coordinate channels.
#[derive(Debug, Clone, Default)]
pub struct VertexBuffer {
    positions: Vec<Vec3>,
    tex_coords: Vec<Vec<Vec2>>,
}

impl VertexBuffer {
    /// Creates a buffer with positions only.
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            tex_coords: Vec::new(),
        }
    }

    /// Appends a texture coordinate channel. Channels are numbered in the
    /// order they are added.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_tex_coords(&mut self, coords: Vec<Vec2>) -> Result<u32> {
        if coords.len() != self.positions.len() {
            return Err(SceneError::SizeMismatch {
                expected: self.positions.len(),
                actual: coords.len(),
            });
        }
        self.tex_coords.push(coords);
        Ok(self.tex_coords.len() as u32 - 1)
    }

    /// Builder form of [`VertexBuffer::add_tex_coords`].
    pub fn with_tex_coords(mut self, coords: Vec<Vec2>) -> Result<Self> {
        self.add_tex_coords(coords)?;
        Ok(self)
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn num_tex_channels(&self) -> u32 {
        self.tex_coords.len() as u32
    }

    pub fn position(&self, index: u32) -> Option<Vec3> {
        self.positions.get(index as usize).copied()
    }

    pub fn tex_coord(&self, channel: u32, index: u32) -> Option<Vec2> {
        self.tex_coords
            .get(channel as usize)?
            .get(index as usize)
            .copied()
    }
}

/// A sub-mesh: a list of triangles sharing one material slot.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    triangles: Vec<[u32; 3]>,
}

impl Geometry {
    pub fn new(triangles: Vec<[u32; 3]>) -> Self {
        Self { triangles }
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }
}

/// One level of detail.
#[derive(Debug, Clone)]
pub struct MeshLod {
    vertices: VertexBuffer,
    geometries: Vec<Geometry>,
}

impl MeshLod {
    /// Creates a level of detail, checking every index against the buffer.
    pub fn new(vertices: VertexBuffer, geometries: Vec<Geometry>) -> Result<Self> {
        let count = vertices.len();
        for (g, geometry) in geometries.iter().enumerate() {
            if let Some(bad) = geometry
                .triangles
                .iter()
                .flatten()
                .find(|&&i| i as usize >= count)
            {
                return Err(SceneError::InvalidMesh(format!(
                    "geometry {g} references vertex {bad} but the buffer holds {count}"
                )));
            }
        }
        Ok(Self {
            vertices,
            geometries,
        })
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    /// Vertex indices of one triangle.
    pub fn triangle(&self, geometry_index: u32, triangle_index: u32) -> Option<[u32; 3]> {
        self.geometries
            .get(geometry_index as usize)?
            .triangles
            .get(triangle_index as usize)
            .copied()
    }

    fn triangle_positions(&self, indices: [u32; 3]) -> Option<[Vec3; 3]> {
        Some([
            self.vertices.position(indices[0])?,
            self.vertices.position(indices[1])?,
            self.vertices.position(indices[2])?,
        ])
    }
}

/// A polygonal mesh made of triangles.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    lods: Vec<MeshLod>,
}

impl TriangleMesh {
    /// Creates a mesh from its levels of detail, finest first.
    pub fn new(lods: Vec<MeshLod>) -> Self {
        Self { lods }
    }

    /// Single level of detail with a single sub-mesh.
    pub fn from_triangles(vertices: VertexBuffer, triangles: Vec<[u32; 3]>) -> Result<Self> {
        Ok(Self::new(vec![MeshLod::new(
            vertices,
            vec![Geometry::new(triangles)],
        )?]))
    }

    pub fn lods(&self) -> &[MeshLod] {
        &self.lods
    }

    /// The level of detail used for picking.
    pub fn base_lod(&self) -> Option<&MeshLod> {
        self.lods.first()
    }

    /// Local bounding box of the base level's vertex positions.
    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(self.base_lod()?.vertices.positions.iter().copied())
    }

    /// Nearest triangle of the base level crossed by `segment`.
    ///
    /// Sub-meshes are tested in order. With a filter only the listed
    /// sub-meshes are tested; unknown indices are ignored.
    pub fn nearest_triangle(
        &self,
        segment: &Segment,
        geometry_filter: Option<&[u32]>,
    ) -> Option<TriangleHit> {
        let lod = self.base_lod()?;
        let mut best: Option<(TriangleHit, f32)> = None;

        for (g, geometry) in lod.geometries.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let geometry_index = g as u32;
            if geometry_filter.is_some_and(|filter| !filter.contains(&geometry_index)) {
                continue;
            }

            let triangles = geometry.triangles.iter().enumerate().filter_map(|(t, tri)| {
                #[allow(clippy::cast_possible_truncation)]
                let index = t as u32;
                lod.triangle_positions(*tri).map(|positions| (index, positions))
            });

            if let Some((triangle_index, t, point)) = nearest_segment_triangle(segment, triangles)
            {
                if best.as_ref().map_or(true, |(_, best_t)| t < *best_t) {
                    best = Some((
                        TriangleHit {
                            geometry_index,
                            triangle_index,
                            point,
                        },
                        t,
                    ));
                }
            }
        }

        best.map(|(hit, _)| hit)
    }

    /// Corners of one base level triangle with their `channel` coordinates.
    pub fn triangle_corners(
        &self,
        geometry_index: u32,
        triangle_index: u32,
        channel: u32,
    ) -> Option<[TriangleCorner; 3]> {
        let lod = self.base_lod()?;
        let indices = lod.triangle(geometry_index, triangle_index)?;
        let corner = |i: u32| {
            Some(TriangleCorner {
                position: lod.vertices.position(i)?,
                tex_coord: lod.vertices.tex_coord(channel, i)?,
            })
        };
        Some([corner(indices[0])?, corner(indices[1])?, corner(indices[2])?])
    }
}
