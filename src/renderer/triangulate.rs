use smallvec::SmallVec;

use super::clip::{MAX_POLYGON_VERTICES, Polygon};
use crate::rasterizer::TriangleSetup;
use crate::vertex::ProjectedVertex;

pub type VertexIds = SmallVec<[u32; MAX_POLYGON_VERTICES]>;

/// 扇形剖分：(0, k-1, k)，k 从 2 到 n-1
pub fn fan(count: usize) -> impl Iterator<Item = [usize; 3]> {
    (2..count).map(|k| [0, k - 1, k])
}

/// 把多边形顶点映射到工作线程顶点缓冲中的索引。
///
/// 权重某一分量为 1 的顶点直接复用原三角形顶点的索引，
/// 其余顶点按权重插值合成新顶点并追加到缓冲末尾。
pub fn resolve_vertices(
    polygon: &Polygon,
    source_ids: [u32; 3],
    vertices: &mut Vec<ProjectedVertex>,
) -> VertexIds {
    let source = source_ids.map(|id| vertices[id as usize]);

    polygon
        .vertices()
        .iter()
        .map(|pv| match pv.source_vertex() {
            Some(k) => source_ids[k],
            None => {
                let id = vertices.len() as u32;
                vertices.push(ProjectedVertex::interpolate(&source, pv.weight, pv.pos));
                id
            }
        })
        .collect()
}

/// 透视除法后交给三角形建立，成功才写入输出
pub fn emit_triangle<S: TriangleSetup>(
    setup: &S,
    vertices: &[ProjectedVertex],
    ids: [u32; 3],
    core_id: usize,
    tex_id: u32,
    triangles: &mut Vec<S::Triangle>,
) -> bool {
    let points = ids.map(|id| vertices[id as usize].homogeneous_project());
    match setup.setup(points, ids, core_id, tex_id) {
        Some(tri) => {
            triangles.push(tri);
            true
        }
        None => false,
    }
}

/// 裁剪后的凸多边形重新剖分成三角形，返回成功建立的三角形数
pub fn triangulate<S: TriangleSetup>(
    polygon: &Polygon,
    source_ids: [u32; 3],
    core_id: usize,
    tex_id: u32,
    setup: &S,
    vertices: &mut Vec<ProjectedVertex>,
    triangles: &mut Vec<S::Triangle>,
) -> usize {
    if polygon.is_empty() {
        return 0;
    }

    let ids = resolve_vertices(polygon, source_ids, vertices);
    let mut emitted = 0;
    for [a, b, c] in fan(ids.len()) {
        let tri = [ids[a], ids[b], ids[c]];
        if emit_triangle(setup, vertices, tri, core_id, tex_id, triangles) {
            emitted += 1;
        }
    }
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::clip::PolygonVertex;
    use approx::assert_abs_diff_eq;
    use cgmath::{Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4};

    /// 来者不拒，只记录透视除法后的点
    struct AcceptAll;

    impl TriangleSetup for AcceptAll {
        type Triangle = ([Vec3<f32>; 3], [u32; 3]);

        fn setup(
            &self,
            points: [Vec3<f32>; 3],
            indices: [u32; 3],
            _core_id: usize,
            _tex_id: u32,
        ) -> Option<Self::Triangle> {
            Some((points, indices))
        }
    }

    struct RejectAll;

    impl TriangleSetup for RejectAll {
        type Triangle = ();

        fn setup(&self, _: [Vec3<f32>; 3], _: [u32; 3], _: usize, _: u32) -> Option<()> {
            None
        }
    }

    fn source_vertices() -> Vec<ProjectedVertex> {
        let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        corners
            .iter()
            .map(|&(x, y)| ProjectedVertex {
                position: Vec3::new(x, y, 0.0),
                projected_pos: Vec4::new(x, y, 0.5, 1.0),
                normal: Vec3::new(0.0, 0.0, 1.0),
                tex_coord: Vec2::new(x, y),
            })
            .collect()
    }

    fn area(p: &[Vec3<f32>; 3]) -> f32 {
        ((p[1].x - p[0].x) * (p[2].y - p[0].y) - (p[1].y - p[0].y) * (p[2].x - p[0].x)) * 0.5
    }

    #[test]
    fn fan_yields_n_minus_two_triangles() {
        assert_eq!(fan(0).count(), 0);
        assert_eq!(fan(3).collect::<Vec<_>>(), vec![[0, 1, 2]]);
        assert_eq!(
            fan(5).collect::<Vec<_>>(),
            vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]
        );
    }

    #[test]
    fn fan_covers_convex_polygon_area() {
        for n in 3..=MAX_POLYGON_VERTICES {
            let polygon = Polygon::from_vertices((0..n).map(|i| {
                let angle = i as f32 / n as f32 * std::f32::consts::TAU;
                PolygonVertex::new(
                    Vec4::new(angle.cos() * 2.0, angle.sin() * 2.0, 0.5, 2.0),
                    Vec3::new(0.2, 0.3, 0.5),
                )
            }));
            let mut vertices = source_vertices();
            let mut triangles = Vec::new();
            let emitted = triangulate(
                &polygon,
                [0, 1, 2],
                0,
                0,
                &AcceptAll,
                &mut vertices,
                &mut triangles,
            );

            assert_eq!(emitted, n - 2);
            assert_eq!(vertices.len(), 3 + n);
            // 透视除法后是单位圆内接正 n 边形
            let expected = 0.5 * n as f32 * (std::f32::consts::TAU / n as f32).sin();
            let total: f32 = triangles.iter().map(|(p, _)| area(p)).sum();
            assert_abs_diff_eq!(total, expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn unit_weight_vertices_reuse_source_indices() {
        // 两个顶点与原顶点重合，另外两个是新点
        let polygon = Polygon::from_vertices([
            PolygonVertex::new(Vec4::new(0.0, 0.0, 0.5, 1.0), Vec3::new(1.0, 0.0, 0.0)),
            PolygonVertex::new(Vec4::new(0.5, 0.0, 0.5, 1.0), Vec3::new(0.5, 0.5, 0.0)),
            PolygonVertex::new(Vec4::new(0.5, 0.5, 0.5, 1.0), Vec3::new(0.0, 0.5, 0.5)),
            PolygonVertex::new(Vec4::new(0.0, 1.0, 0.5, 1.0), Vec3::new(0.0, 0.0, 1.0)),
        ]);
        let mut vertices = source_vertices();
        let ids = resolve_vertices(&polygon, [0, 1, 2], &mut vertices);

        assert_eq!(ids.as_slice(), &[0, 3, 4, 2]);
        assert_eq!(vertices.len(), 5);

        let mid = vertices[3];
        assert_abs_diff_eq!(mid.position.x, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(mid.tex_coord.x, 0.5, epsilon = 1e-6);
        assert_eq!(mid.projected_pos, Vec4::new(0.5, 0.0, 0.5, 1.0));
    }

    #[test]
    fn rejected_triangles_leave_no_output() {
        let polygon = Polygon::from_triangle(
            Vec4::new(0.0, 0.0, 0.5, 1.0),
            Vec4::new(1.0, 0.0, 0.5, 1.0),
            Vec4::new(0.0, 1.0, 0.5, 1.0),
        );
        let mut vertices = source_vertices();
        let mut triangles = Vec::new();
        let emitted = triangulate(
            &polygon,
            [0, 1, 2],
            0,
            0,
            &RejectAll,
            &mut vertices,
            &mut triangles,
        );
        assert_eq!(emitted, 0);
        assert!(triangles.is_empty());
        assert_eq!(vertices.len(), 3);
    }

    #[test]
    fn empty_polygon_contributes_nothing() {
        let mut vertices = source_vertices();
        let mut triangles = Vec::new();
        let emitted = triangulate(
            &Polygon::default(),
            [0, 1, 2],
            0,
            0,
            &AcceptAll,
            &mut vertices,
            &mut triangles,
        );
        assert_eq!(emitted, 0);
        assert_eq!(vertices.len(), 3);
    }
}
