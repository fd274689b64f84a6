pub mod clip;
pub mod dispatch;
pub mod triangulate;
pub mod vertex_shader;

use crate::camera::Camera;
use crate::error::ClipError;
use crate::model::Mesh;
use crate::rasterizer::{CullMode, RasterTriangle, Viewport, ViewportSetup};
use crate::vertex::ProjectedVertex;
use cgmath::{Matrix, Matrix4 as Mat4, SquareMatrix};

use self::clip::ClipMode;
use self::dispatch::{ClipInput, Clipper, WorkerStats};
use self::vertex_shader::{DefaultVertexShader, VertexShader, VertexShaderUniforms};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub num_cores: usize,
    pub clip_mode: ClipMode,
    pub cull_mode: CullMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            num_cores: rayon::current_num_threads(),
            clip_mode: ClipMode::default(),
            cull_mode: CullMode::default(),
        }
    }
}

/// 一帧内所有 render_mesh 调用的累计统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub meshes: usize,
    pub output_vertices: usize,
    pub total: WorkerStats,
    pub per_worker: Vec<WorkerStats>,
}

impl FrameStats {
    fn record(&mut self, workers: &[WorkerStats]) {
        self.meshes += 1;
        if self.per_worker.len() < workers.len() {
            self.per_worker.resize(workers.len(), WorkerStats::default());
        }
        for (acc, w) in self.per_worker.iter_mut().zip(workers) {
            *acc += *w;
            self.total += *w;
        }
    }
}

pub struct Renderer {
    pub(crate) camera: Camera,
    pub(crate) viewport: Viewport,
    settings: RenderSettings,
    model_matrix: Mat4<f32>,
    vertex_bufs: Vec<Vec<ProjectedVertex>>,
    triangle_bufs: Vec<Vec<RasterTriangle>>,
    stats: FrameStats,
}

impl Renderer {
    pub fn new(camera: Camera, w: usize, h: usize, settings: RenderSettings) -> Self {
        let num_cores = settings.num_cores.max(1);
        Self {
            camera,
            viewport: Viewport::new(w, h),
            settings: RenderSettings {
                num_cores,
                ..settings
            },
            model_matrix: Mat4::identity(),
            vertex_bufs: vec![Vec::new(); num_cores],
            triangle_bufs: vec![Vec::new(); num_cores],
            stats: FrameStats::default(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn set_render_state(&mut self, model: &Mat4<f32>) {
        self.model_matrix = *model;
    }

    /// 开始新的一帧：清空各工作线程的输出缓冲并按线程数重新分配
    pub fn begin_frame(&mut self) {
        let n = self.settings.num_cores;
        self.vertex_bufs.resize_with(n, Vec::new);
        self.triangle_bufs.resize_with(n, Vec::new);
        self.vertex_bufs.iter_mut().for_each(Vec::clear);
        self.triangle_bufs.iter_mut().for_each(Vec::clear);
        self.stats = FrameStats::default();
    }

    /// 顶点变换 -> 并行裁剪/剖分/三角形建立，结果追加到本帧的工作线程缓冲
    pub fn render_mesh(&mut self, mesh: &Mesh) -> Result<&FrameStats, ClipError> {
        // 奇异矩阵没有逆，退回用模型矩阵本身变换法线
        let normal_matrix = self
            .model_matrix
            .invert()
            .map(|m| m.transpose())
            .unwrap_or(self.model_matrix);
        let mvp_matrix = self.camera.get_view_proj_mat() * self.model_matrix;
        let uniforms = VertexShaderUniforms {
            model_matrix: &self.model_matrix,
            mvp_matrix: &mvp_matrix,
            normal_matrix: &normal_matrix,
        };
        let projected = DefaultVertexShader.shade_vertices(&mesh.vertices, &uniforms);

        let input = ClipInput {
            vertices: &projected,
            indices: &mesh.indices,
            tex_ids: &mesh.tex_ids,
        };
        let setup = ViewportSetup::new(self.viewport, self.settings.cull_mode);
        let workers = Clipper::new(self.settings.clip_mode).clip(
            input,
            &setup,
            &mut self.vertex_bufs,
            &mut self.triangle_bufs,
            self.settings.num_cores,
        )?;

        self.stats.record(&workers);
        self.stats.output_vertices = self.vertex_bufs.iter().map(Vec::len).sum();
        log::debug!(
            "mesh {}: {} triangles in, {} emitted, {} rejected, {} clipped",
            self.stats.meshes,
            mesh.triangle_count(),
            workers.iter().map(|w| w.emitted).sum::<usize>(),
            workers.iter().map(|w| w.trivially_rejected).sum::<usize>(),
            workers.iter().map(|w| w.clipped).sum::<usize>(),
        );
        Ok(&self.stats)
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn worker_vertices(&self) -> &[Vec<ProjectedVertex>] {
        &self.vertex_bufs
    }

    pub fn worker_triangles(&self) -> &[Vec<RasterTriangle>] {
        &self.triangle_bufs
    }
}
