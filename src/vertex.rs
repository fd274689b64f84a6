use cgmath::{Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4, Zero};

/// 模型空间顶点（网格加载后的原始数据）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub pos: Vec3<f32>,
    pub normal: Vec3<f32>,
    pub uv: Vec2<f32>,
}

impl Default for MeshVertex {
    fn default() -> Self {
        MeshVertex {
            pos: Vec3::zero(),
            normal: Vec3::new(0.0, 1.0, 0.0),
            uv: Vec2::zero(),
        }
    }
}

/// 顶点变换之后的顶点：世界坐标、裁剪空间齐次坐标、法线、纹理坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedVertex {
    pub position: Vec3<f32>,
    pub projected_pos: Vec4<f32>,
    pub normal: Vec3<f32>,
    pub tex_coord: Vec2<f32>,
}

impl ProjectedVertex {
    pub fn zero() -> Self {
        ProjectedVertex {
            position: Vec3::zero(),
            projected_pos: Vec4::zero(),
            normal: Vec3::zero(),
            tex_coord: Vec2::zero(),
        }
    }

    /// 用重心权重合成一个新顶点，裁剪空间坐标直接取裁剪结果
    pub fn interpolate(
        src: &[ProjectedVertex; 3],
        weight: Vec3<f32>,
        projected_pos: Vec4<f32>,
    ) -> Self {
        ProjectedVertex {
            position: src[0].position * weight.x
                + src[1].position * weight.y
                + src[2].position * weight.z,
            projected_pos,
            normal: src[0].normal * weight.x + src[1].normal * weight.y + src[2].normal * weight.z,
            tex_coord: src[0].tex_coord * weight.x
                + src[1].tex_coord * weight.y
                + src[2].tex_coord * weight.z,
        }
    }

    /// 透视除法
    pub fn homogeneous_project(&self) -> Vec3<f32> {
        self.projected_pos.truncate() / self.projected_pos.w
    }
}

/// 三角形索引缓冲，每三个索引一个三角形
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexBuffer {
    indices: Vec<u32>,
}

impl IndexBuffer {
    pub fn new(indices: Vec<u32>) -> Self {
        debug_assert!(indices.len() % 3 == 0, "索引数量必须是3的倍数");
        Self { indices }
    }

    pub fn from_triangles(triangles: &[[u32; 3]]) -> Self {
        Self {
            indices: triangles.iter().flatten().copied().collect(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle(&self, i: usize) -> [u32; 3] {
        let base = i * 3;
        [
            self.indices[base],
            self.indices[base + 1],
            self.indices[base + 2],
        ]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    pub fn extend_rebased(&mut self, other: &IndexBuffer, offset: u32) {
        self.indices
            .extend(other.indices.iter().map(|&idx| idx + offset));
    }
}
