use crate::vertex::{MeshVertex, ProjectedVertex};
use cgmath::{InnerSpace, Matrix4 as Mat4, Zero};
use rayon::prelude::*;

pub struct VertexShaderUniforms<'a> {
    pub model_matrix: &'a Mat4<f32>,
    pub mvp_matrix: &'a Mat4<f32>,
    pub normal_matrix: &'a Mat4<f32>,
}

pub trait VertexShader: Sync {
    // 接收一个模型空间的顶点和 uniforms
    // 返回裁剪空间的顶点，供裁剪阶段使用
    fn shade_vertex(&self, vertex: &MeshVertex, uniforms: &VertexShaderUniforms) -> ProjectedVertex;

    fn shade_vertices(
        &self,
        vertices: &[MeshVertex],
        uniforms: &VertexShaderUniforms,
    ) -> Vec<ProjectedVertex> {
        vertices
            .par_iter()
            .map(|v| self.shade_vertex(v, uniforms))
            .collect()
    }
}

pub struct DefaultVertexShader;

impl VertexShader for DefaultVertexShader {
    fn shade_vertex(&self, v: &MeshVertex, uniforms: &VertexShaderUniforms) -> ProjectedVertex {
        let normal = (*uniforms.normal_matrix * v.normal.extend(0.0)).truncate();
        ProjectedVertex {
            position: (*uniforms.model_matrix * v.pos.extend(1.0)).truncate(),
            projected_pos: *uniforms.mvp_matrix * v.pos.extend(1.0),
            // 退化法线不归一化，避免产生 NaN
            normal: if normal.is_zero() { normal } else { normal.normalize() },
            tex_coord: v.uv,
        }
    }
}
