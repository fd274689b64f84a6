use std::ops::Range;

use cgmath::Vector4 as Vec4;
use rayon::prelude::*;

use super::clip::{ClipCode, ClipMode, PolygonClipper};
use super::triangulate;
use crate::error::ClipError;
use crate::rasterizer::TriangleSetup;
use crate::vertex::{IndexBuffer, ProjectedVertex};

/// 裁剪阶段的只读输入，本次调用期间不会被修改
#[derive(Debug, Clone, Copy)]
pub struct ClipInput<'a> {
    pub vertices: &'a [ProjectedVertex],
    pub indices: &'a IndexBuffer,
    pub tex_ids: &'a [u32],
}

impl ClipInput<'_> {
    fn validate(&self) -> Result<(), ClipError> {
        let triangles = self.indices.triangle_count();
        if self.tex_ids.len() < triangles {
            return Err(ClipError::TextureIdsTooShort {
                triangles,
                tex_ids: self.tex_ids.len(),
            });
        }
        let vertex_count = self.vertices.len();
        if let Some(&index) = self
            .indices
            .as_slice()
            .iter()
            .find(|&&idx| idx as usize >= vertex_count)
        {
            return Err(ClipError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(())
    }
}

/// 第 core_id 个工作线程负责的三角形区间：区间长度向上取整，超出总数的部分截掉
pub fn worker_range(core_id: usize, triangle_count: usize, num_cores: usize) -> Range<usize> {
    let interval = triangle_count.div_ceil(num_cores);
    let start = (core_id * interval).min(triangle_count);
    let end = ((core_id + 1) * interval).min(triangle_count);
    start..end
}

/// 单个工作线程的处理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub triangles_in: usize,
    pub trivially_accepted: usize,
    pub trivially_rejected: usize,
    pub clipped: usize,
    pub emitted: usize,
}

impl std::ops::AddAssign for WorkerStats {
    fn add_assign(&mut self, rhs: Self) {
        self.triangles_in += rhs.triangles_in;
        self.trivially_accepted += rhs.trivially_accepted;
        self.trivially_rejected += rhs.trivially_rejected;
        self.clipped += rhs.clipped;
        self.emitted += rhs.emitted;
    }
}

/// 并行裁剪分发器
///
/// 三角形按连续区间切给 `num_cores` 个任务，每个任务只写自己编号对应的
/// 顶点缓冲和三角形缓冲，共享输入只读，无锁。调用阻塞到所有任务结束。
#[derive(Debug, Clone, Copy, Default)]
pub struct Clipper {
    pub mode: ClipMode,
}

impl Clipper {
    pub fn new(mode: ClipMode) -> Self {
        Self { mode }
    }

    pub fn clip<S: TriangleSetup>(
        &self,
        input: ClipInput<'_>,
        setup: &S,
        vertex_bufs: &mut [Vec<ProjectedVertex>],
        triangle_bufs: &mut [Vec<S::Triangle>],
        num_cores: usize,
    ) -> Result<Vec<WorkerStats>, ClipError> {
        if num_cores == 0 {
            return Err(ClipError::InvalidWorkerCount);
        }
        if vertex_bufs.len() < num_cores || triangle_bufs.len() < num_cores {
            return Err(ClipError::OutputBuffersTooSmall {
                required: num_cores,
                vertex_buffers: vertex_bufs.len(),
                triangle_buffers: triangle_bufs.len(),
            });
        }
        input.validate()?;

        let triangle_count = input.indices.triangle_count();
        let stats = vertex_bufs[..num_cores]
            .par_iter_mut()
            .zip(triangle_bufs[..num_cores].par_iter_mut())
            .enumerate()
            .map(|(core_id, (vertices, triangles))| {
                let range = worker_range(core_id, triangle_count, num_cores);
                let stats = self.clip_range(&input, range, core_id, setup, vertices, triangles);
                log::trace!("worker {core_id}: {stats:?}");
                stats
            })
            .collect();
        Ok(stats)
    }

    fn clip_range<S: TriangleSetup>(
        &self,
        input: &ClipInput<'_>,
        range: Range<usize>,
        core_id: usize,
        setup: &S,
        vertices: &mut Vec<ProjectedVertex>,
        triangles: &mut Vec<S::Triangle>,
    ) -> WorkerStats {
        let mut stats = WorkerStats::default();
        let mut clipper = PolygonClipper::new();

        for i in range {
            stats.triangles_in += 1;
            let src = input.indices.triangle(i);
            let tex_id = input.tex_ids[i];

            // 三个原顶点无条件先拷进本线程缓冲，得到本地索引
            let base = vertices.len() as u32;
            vertices.extend(src.iter().map(|&idx| input.vertices[idx as usize]));
            let ids = [base, base + 1, base + 2];

            let pos: [Vec4<f32>; 3] = src.map(|idx| input.vertices[idx as usize].projected_pos);
            let codes = pos.map(|p| ClipCode::compute(&p, self.mode));

            if (codes[0] | codes[1] | codes[2]).is_empty() {
                stats.trivially_accepted += 1;
                if triangulate::emit_triangle(setup, vertices, ids, core_id, tex_id, triangles) {
                    stats.emitted += 1;
                }
                continue;
            }

            if !(codes[0] & codes[1] & codes[2]).is_empty() {
                stats.trivially_rejected += 1;
                continue;
            }

            stats.clipped += 1;
            let polygon = clipper.clip_triangle(pos, ClipCode::disagreement(codes));
            stats.emitted +=
                triangulate::triangulate(polygon, ids, core_id, tex_id, setup, vertices, triangles);
        }

        stats
    }
}
