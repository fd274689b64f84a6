use serde::Deserialize;
use serde_json::from_reader;
use std::{fs::File, io::Read, path::Path};

use crate::error::SceneError;
use crate::rasterizer::CullMode;
use crate::renderer::clip::ClipMode;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub frames: usize,
    /// 工作线程数，缺省取 rayon 线程池大小
    pub num_cores: Option<usize>,
    pub clip_mode: ClipMode,
    pub cull_mode: CullMode,
    pub camera: CameraConfig,
    pub models: Vec<ModelConfig>,
    pub floor: Option<FloorConfig>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frames: 60,
            num_cores: None,
            clip_mode: ClipMode::default(),
            cull_mode: CullMode::default(),
            camera: CameraConfig::default(),
            models: Vec::new(),
            floor: Some(FloorConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// 偏航、俯仰（角度）
    pub angle: [f32; 2],
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.0, 5.0],
            target: [0.0, 0.0, 0.0],
            angle: [0.0, 0.0],
            fovy: 65.0,
            near: 0.5,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub path: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub angle: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub tex_id: u32,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub size: f32,
    pub cells: usize,
    pub height: f32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            cells: 40,
            height: -1.0,
        }
    }
}

impl RenderConfig {
    pub fn from_path(path: &Path) -> Result<Self, SceneError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, SceneError> {
        Ok(from_reader(reader)?)
    }
}
