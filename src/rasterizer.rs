use cgmath::{Vector2 as Vec2, Vector3 as Vec3};
use serde::Deserialize;

// 面积小于这个值（像素²）的三角形视为退化
const MIN_AREA: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Viewport {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            w: w as i32,
            h: h as i32,
        }
    }

    /// NDC -> 屏幕坐标，y 轴翻转，深度直接取 z（[0, 1]）
    pub fn to_screen(&self, ndc: Vec3<f32>) -> (Vec2<f32>, f32) {
        let screen_x = (ndc.x + 1.0) * 0.5 * self.w as f32 + self.x as f32;
        let screen_y = self.h as f32 - (ndc.y + 1.0) * 0.5 * self.h as f32 + self.y as f32;
        (Vec2::new(screen_x, screen_y), ndc.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullMode {
    None,
    /// NDC 中顺时针的三角形为背面
    #[default]
    Back,
}

/// 三角形建立阶段：接收透视除法之后的三个点，失败（退化、背面、屏幕外）返回 None
pub trait TriangleSetup: Sync {
    type Triangle: Send;

    fn setup(
        &self,
        points: [Vec3<f32>; 3],
        indices: [u32; 3],
        core_id: usize,
        tex_id: u32,
    ) -> Option<Self::Triangle>;
}

/// 交给扫描线光栅化的三角形，顶点索引指向所属工作线程的顶点缓冲
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterTriangle {
    pub screen: [Vec2<f32>; 3],
    pub depth: [f32; 3],
    pub indices: [u32; 3],
    pub core_id: usize,
    pub tex_id: u32,
    pub bbox: (i32, i32, i32, i32),
    pub inv_area: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewportSetup {
    pub viewport: Viewport,
    pub cull: CullMode,
}

impl ViewportSetup {
    pub fn new(viewport: Viewport, cull: CullMode) -> Self {
        Self { viewport, cull }
    }
}

impl TriangleSetup for ViewportSetup {
    type Triangle = RasterTriangle;

    fn setup(
        &self,
        points: [Vec3<f32>; 3],
        indices: [u32; 3],
        core_id: usize,
        tex_id: u32,
    ) -> Option<RasterTriangle> {
        let mapped = points.map(|p| self.viewport.to_screen(p));
        let screen = mapped.map(|(pos, _)| pos);
        let depth = mapped.map(|(_, z)| z);

        // 屏幕空间 y 向下，取反后 NDC 中逆时针为正
        let area = -edge_function(&screen[0], &screen[1], &screen[2]);
        if !(area.abs() >= MIN_AREA) {
            return None;
        }
        if self.cull == CullMode::Back && area < 0.0 {
            return None;
        }

        let bbox = clamp_box(get_box(&screen), &self.viewport)?;

        Some(RasterTriangle {
            screen,
            depth,
            indices,
            core_id,
            tex_id,
            bbox,
            inv_area: 1.0 / area,
        })
    }
}

/// (b - a) x (c - a)
pub fn edge_function(a: &Vec2<f32>, b: &Vec2<f32>, c: &Vec2<f32>) -> f32 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

pub fn get_box(vertices: &[Vec2<f32>; 3]) -> (i32, i32, i32, i32) {
    let mut min_x = vertices[0].x;
    let mut max_x = vertices[0].x;
    let mut min_y = vertices[0].y;
    let mut max_y = vertices[0].y;

    for v in vertices.iter().skip(1) {
        min_x = min_x.min(v.x);
        max_x = max_x.max(v.x);
        min_y = min_y.min(v.y);
        max_y = max_y.max(v.y);
    }

    (
        min_x.floor() as i32,
        min_y.floor() as i32,
        max_x.ceil() as i32,
        max_y.ceil() as i32,
    )
}

// 包围盒裁到视口内，完全在视口外返回 None
fn clamp_box(bbox: (i32, i32, i32, i32), viewport: &Viewport) -> Option<(i32, i32, i32, i32)> {
    let (min_x, min_y, max_x, max_y) = bbox;
    let min_x = min_x.max(viewport.x);
    let min_y = min_y.max(viewport.y);
    let max_x = max_x.min(viewport.x + viewport.w - 1);
    let max_y = max_y.min(viewport.y + viewport.h - 1);
    if min_x > max_x || min_y > max_y {
        return None;
    }
    Some((min_x, min_y, max_x, max_y))
}
