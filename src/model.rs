use crate::error::SceneError;
use crate::vertex::{IndexBuffer, MeshVertex};
use cgmath::{InnerSpace, Vector2 as Vec2, Vector3 as Vec3, Zero};
use std::path::Path;

/// 索引网格：顶点、三角形索引、每个三角形的纹理/材质 id
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: IndexBuffer,
    pub tex_ids: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.triangle_count()
    }

    /// 合并另一个网格，索引整体偏移
    pub fn append(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend_rebased(&other.indices, offset);
        self.tex_ids.extend_from_slice(&other.tex_ids);
    }
}

pub fn load_obj(path: &Path, tex_id: u32) -> Result<Mesh, SceneError> {
    let (models, _materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
    let mut mesh = Mesh::default();

    for model in &models {
        let m = &model.mesh;
        let vertex_count = m.positions.len() / 3;
        let positions: Vec<Vec3<f32>> = m
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        let normals = if m.normals.len() == m.positions.len() {
            m.normals
                .chunks_exact(3)
                .map(|n| Vec3::new(n[0], n[1], n[2]))
                .collect()
        } else {
            vertex_normals(&positions, &m.indices)
        };

        let part = Mesh {
            vertices: (0..vertex_count)
                .map(|i| MeshVertex {
                    pos: positions[i],
                    normal: normals[i],
                    uv: if m.texcoords.len() >= (i + 1) * 2 {
                        Vec2::new(m.texcoords[i * 2], m.texcoords[i * 2 + 1])
                    } else {
                        Vec2::zero()
                    },
                })
                .collect(),
            indices: IndexBuffer::new(m.indices.clone()),
            tex_ids: vec![m.material_id.map_or(tex_id, |id| id as u32); m.indices.len() / 3],
        };
        mesh.append(&part);
    }

    if mesh.triangle_count() == 0 {
        return Err(SceneError::MissingModel(path.display().to_string()));
    }
    Ok(mesh)
}

// 顶点法线：相邻面法线累加后归一化
fn vertex_normals(positions: &[Vec3<f32>], indices: &[u32]) -> Vec<Vec3<f32>> {
    let mut normals = vec![Vec3::zero(); positions.len()];
    for tri in indices.chunks_exact(3) {
        let v0 = positions[tri[0] as usize];
        let v1 = positions[tri[1] as usize];
        let v2 = positions[tri[2] as usize];
        let face_normal = (v1 - v0).cross(v2 - v0);
        for &idx in tri {
            normals[idx as usize] += face_normal;
        }
    }
    for n in normals.iter_mut() {
        if n.magnitude2() > 0.0 {
            *n = n.normalize();
        }
    }
    normals
}

/// 棋盘格地面，尺寸足够大时会同时穿过近平面和四个侧面
pub fn create_floor(size: f32, cell_count: usize, height: f32) -> Mesh {
    let mut mesh = Mesh::default();
    let half_size = size / 2.0;
    let cell_size = size / cell_count as f32;
    let normal = Vec3::new(0.0, 1.0, 0.0);
    let mut triangles = Vec::with_capacity(cell_count * cell_count * 2);

    for z_idx in 0..=cell_count {
        for x_idx in 0..=cell_count {
            let x = -half_size + x_idx as f32 * cell_size;
            let z = -half_size + z_idx as f32 * cell_size;
            mesh.vertices.push(MeshVertex {
                pos: Vec3::new(x, height, z),
                normal,
                uv: Vec2::new(
                    x_idx as f32 / cell_count as f32,
                    z_idx as f32 / cell_count as f32,
                ),
            });
        }
    }

    let row = (cell_count + 1) as u32;
    for z_idx in 0..cell_count as u32 {
        for x_idx in 0..cell_count as u32 {
            let v0 = z_idx * row + x_idx;
            let v1 = v0 + 1;
            let v2 = v1 + row;
            let v3 = v0 + row;
            // 从上方看逆时针
            triangles.push([v0, v3, v2]);
            triangles.push([v2, v1, v0]);
            let tex_id = (x_idx + z_idx) % 2;
            mesh.tex_ids.push(tex_id);
            mesh.tex_ids.push(tex_id);
        }
    }
    mesh.indices = IndexBuffer::from_triangles(&triangles);
    mesh
}
