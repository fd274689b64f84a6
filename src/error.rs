/// 裁剪阶段的调用约定错误。
///
/// 三角形被剔除（视锥外、退化、背面）属于正常结果，不会走这里；
/// 只有调用方传入的参数本身不合法时才返回错误。
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ClipError {
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error(
        "output buffers too small for {required} workers: {vertex_buffers} vertex buffers, {triangle_buffers} triangle buffers"
    )]
    OutputBuffersTooSmall {
        required: usize,
        vertex_buffers: usize,
        triangle_buffers: usize,
    },

    #[error("{tex_ids} texture ids given for {triangles} triangles")]
    TextureIdsTooShort { triangles: usize, tex_ids: usize },

    #[error("vertex index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// 场景加载（配置、模型）错误
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load obj: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("obj file {0} contains no triangles")]
    MissingModel(String),
}
