use bitflags::bitflags;
use cgmath::{Vector3 as Vec3, Vector4 as Vec4};
use serde::Deserialize;
use smallvec::SmallVec;

/// 三角形被六个平面依次裁剪后最多 3 + 6 个顶点
pub const MAX_POLYGON_VERTICES: usize = 9;

bitflags! {
    /// 顶点相对视锥六个平面的外码，某位为 1 表示在该平面外侧
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ClipCode: u8 {
        const LEFT   = 1 << 0;
        const RIGHT  = 1 << 1;
        const BOTTOM = 1 << 2;
        const TOP    = 1 << 3;
        const NEAR   = 1 << 4;
        const FAR    = 1 << 5;
    }
}

/// 裁剪模式
///
/// `NearOnly` 只测试近平面：侧面和远平面外的几何体不在这里裁掉，
/// 由三角形建立阶段的屏幕包围盒检测丢弃。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMode {
    #[default]
    AllPlanes,
    NearOnly,
}

impl ClipMode {
    pub fn tested_planes(self) -> &'static [ClipPlane] {
        match self {
            ClipMode::AllPlanes => &ClipPlane::ORDER,
            ClipMode::NearOnly => &[ClipPlane::Near],
        }
    }
}

impl ClipCode {
    /// 齐次空间下的外码计算，纯函数
    pub fn compute(v: &Vec4<f32>, mode: ClipMode) -> Self {
        mode.tested_planes()
            .iter()
            .filter(|plane| !plane.is_inside(v))
            .fold(ClipCode::empty(), |code, plane| code | plane.code())
    }

    /// 三个顶点意见不一致的平面，只有这些平面需要真正去裁
    pub fn disagreement(codes: [ClipCode; 3]) -> Self {
        (codes[0] ^ codes[1]) | (codes[1] ^ codes[2]) | (codes[2] ^ codes[0])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipPlane {
    Left,
    Right,
    Bottom,
    Top,
    Far,
    Near,
}

impl ClipPlane {
    /// 裁剪顺序，近平面放在最后
    pub const ORDER: [ClipPlane; 6] = [
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Far,
        ClipPlane::Near,
    ];

    pub fn code(self) -> ClipCode {
        match self {
            ClipPlane::Left => ClipCode::LEFT,
            ClipPlane::Right => ClipCode::RIGHT,
            ClipPlane::Bottom => ClipCode::BOTTOM,
            ClipPlane::Top => ClipCode::TOP,
            ClipPlane::Far => ClipCode::FAR,
            ClipPlane::Near => ClipCode::NEAR,
        }
    }

    /// 有符号距离，>= 0 为内侧
    pub fn distance(self, v: &Vec4<f32>) -> f32 {
        match self {
            ClipPlane::Left => v.x + v.w,
            ClipPlane::Right => v.w - v.x,
            ClipPlane::Bottom => v.y + v.w,
            ClipPlane::Top => v.w - v.y,
            ClipPlane::Far => v.w - v.z,
            ClipPlane::Near => v.z,
        }
    }

    pub fn is_inside(self, v: &Vec4<f32>) -> bool {
        self.distance(v) >= 0.0
    }

    /// 边 v0 -> v1 与平面交点的参数 t，调用方保证两端点一内一外
    pub fn intersect(self, v0: &Vec4<f32>, v1: &Vec4<f32>) -> f32 {
        let d0 = self.distance(v0);
        let d1 = self.distance(v1);
        d0 / (d0 - d1)
    }

    /// 把该平面管辖的分量强制压到边界上，避免浮点误差导致二次穿越
    pub fn clamp(self, v: &mut Vec4<f32>) {
        match self {
            ClipPlane::Left => v.x = -v.w,
            ClipPlane::Right => v.x = v.w,
            ClipPlane::Bottom => v.y = -v.w,
            ClipPlane::Top => v.y = v.w,
            ClipPlane::Far => v.z = v.w,
            ClipPlane::Near => v.z = 0.0,
        }
    }

    fn split(self, a: &PolygonVertex, b: &PolygonVertex) -> PolygonVertex {
        let t = self.intersect(&a.pos, &b.pos);
        let mut v = PolygonVertex::lerp(a, b, t);
        self.clamp(&mut v.pos);
        v
    }
}

/// 多边形顶点：裁剪空间位置 + 相对原三角形三个顶点的重心权重
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonVertex {
    pub pos: Vec4<f32>,
    pub weight: Vec3<f32>,
}

impl PolygonVertex {
    pub fn new(pos: Vec4<f32>, weight: Vec3<f32>) -> Self {
        Self { pos, weight }
    }

    fn lerp(a: &PolygonVertex, b: &PolygonVertex, t: f32) -> Self {
        Self {
            pos: a.pos * (1.0 - t) + b.pos * t,
            weight: a.weight * (1.0 - t) + b.weight * t,
        }
    }

    /// 权重某一分量恰好为 1 时，该顶点就是原三角形的第几个顶点
    pub fn source_vertex(&self) -> Option<usize> {
        if self.weight.x == 1.0 {
            Some(0)
        } else if self.weight.y == 1.0 {
            Some(1)
        } else if self.weight.z == 1.0 {
            Some(2)
        } else {
            None
        }
    }
}

/// 凸多边形，顶点首尾相接
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    vertices: SmallVec<[PolygonVertex; MAX_POLYGON_VERTICES]>,
}

impl Polygon {
    pub fn from_triangle(v0: Vec4<f32>, v1: Vec4<f32>, v2: Vec4<f32>) -> Self {
        let mut polygon = Self::default();
        polygon.reset_triangle([v0, v1, v2]);
        polygon
    }

    pub fn from_vertices(vertices: impl IntoIterator<Item = PolygonVertex>) -> Self {
        Self {
            vertices: vertices.into_iter().collect(),
        }
    }

    fn reset_triangle(&mut self, v: [Vec4<f32>; 3]) {
        self.vertices.clear();
        self.vertices
            .push(PolygonVertex::new(v[0], Vec3::new(1.0, 0.0, 0.0)));
        self.vertices
            .push(PolygonVertex::new(v[1], Vec3::new(0.0, 1.0, 0.0)));
        self.vertices
            .push(PolygonVertex::new(v[2], Vec3::new(0.0, 0.0, 1.0)));
    }

    pub fn vertices(&self) -> &[PolygonVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// 单个平面的边界裁剪，结果写入 output
    pub fn clip_by_plane(&self, plane: ClipPlane, output: &mut Polygon) {
        output.vertices.clear();
        let count = self.vertices.len();
        for i in 0..count {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % count];
            match (plane.is_inside(&a.pos), plane.is_inside(&b.pos)) {
                (true, true) => output.vertices.push(*b),
                (true, false) => output.vertices.push(plane.split(a, b)),
                (false, true) => {
                    output.vertices.push(plane.split(a, b));
                    output.vertices.push(*b);
                }
                (false, false) => {}
            }
        }
    }
}

/// 逐平面裁剪器，两块多边形缓冲交替读写（乒乓）
///
/// 每个工作线程持有一个，处理三角形时复用，不会在三角形之间残留数据。
#[derive(Debug, Default)]
pub struct PolygonClipper {
    polygons: [Polygon; 2],
    current: usize,
}

impl PolygonClipper {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前（最近一次裁剪结果）多边形
    pub fn polygon(&self) -> &Polygon {
        &self.polygons[self.current]
    }

    /// 用 plane_code 里选中的平面依次裁剪三角形，返回最终多边形
    pub fn clip_triangle(&mut self, v: [Vec4<f32>; 3], plane_code: ClipCode) -> &Polygon {
        self.current = 0;
        self.polygons[0].reset_triangle(v);

        for plane in ClipPlane::ORDER {
            if plane_code.contains(plane.code()) {
                self.clip_by_plane(plane);
            }
        }

        // 保底：正确的近平面裁剪后不应再有 w <= 0 的点
        let polygon = &mut self.polygons[self.current];
        if polygon.vertices.iter().any(|v| v.pos.w <= 0.0) {
            polygon.clear();
        }
        &self.polygons[self.current]
    }

    fn clip_by_plane(&mut self, plane: ClipPlane) {
        let current = self.current;
        let [first, second] = &mut self.polygons;
        let (input, output) = if current == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        };
        input.clip_by_plane(plane, output);
        self.current = current ^ 1;
    }
}
