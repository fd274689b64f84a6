//! 软光栅的裁剪空间几何阶段：视锥外码分类、齐次空间逐平面多边形裁剪、
//! 扇形重新剖分，以及按工作线程切分的并行分发。

pub mod camera;
pub mod config;
pub mod error;
pub mod model;
pub mod rasterizer;
pub mod renderer;
pub mod vertex;

pub use camera::Camera;
pub use error::{ClipError, SceneError};
pub use model::Mesh;
pub use rasterizer::{CullMode, RasterTriangle, TriangleSetup, Viewport, ViewportSetup};
pub use renderer::clip::{ClipCode, ClipMode, ClipPlane, Polygon, PolygonClipper, PolygonVertex};
pub use renderer::dispatch::{ClipInput, Clipper, WorkerStats, worker_range};
pub use renderer::{FrameStats, RenderSettings, Renderer};
pub use vertex::{IndexBuffer, MeshVertex, ProjectedVertex};
