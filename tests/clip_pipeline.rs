/// 端到端检查裁剪阶段：外码分类 -> 多边形裁剪 -> 扇形剖分 -> 三角形建立，
/// 全部通过公开接口驱动。
use approx::assert_abs_diff_eq;
use cgmath::{Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rs_clipper::*;

/// 接受所有三角形，记录透视除法后的点
struct AcceptAll;

impl TriangleSetup for AcceptAll {
    type Triangle = ([Vec3<f32>; 3], [u32; 3], u32);

    fn setup(
        &self,
        points: [Vec3<f32>; 3],
        indices: [u32; 3],
        _core_id: usize,
        tex_id: u32,
    ) -> Option<Self::Triangle> {
        Some((points, indices, tex_id))
    }
}

fn vertex(clip: Vec4<f32>, u: f32) -> ProjectedVertex {
    ProjectedVertex {
        position: clip.truncate(),
        projected_pos: clip,
        normal: Vec3::new(0.0, 0.0, 1.0),
        tex_coord: Vec2::new(u, 1.0 - u),
    }
}

struct Output<T> {
    vertices: Vec<Vec<ProjectedVertex>>,
    triangles: Vec<Vec<T>>,
    stats: Vec<WorkerStats>,
}

fn run<S: TriangleSetup>(
    vertices: &[ProjectedVertex],
    triangles: &[[u32; 3]],
    mode: ClipMode,
    setup: &S,
    num_cores: usize,
) -> Output<S::Triangle> {
    let indices = IndexBuffer::from_triangles(triangles);
    let tex_ids: Vec<u32> = (0..triangles.len() as u32).collect();
    let mut out = Output {
        vertices: (0..num_cores).map(|_| Vec::new()).collect(),
        triangles: (0..num_cores).map(|_| Vec::new()).collect(),
        stats: Vec::new(),
    };
    out.stats = Clipper::new(mode)
        .clip(
            ClipInput {
                vertices,
                indices: &indices,
                tex_ids: &tex_ids,
            },
            setup,
            &mut out.vertices,
            &mut out.triangles,
            num_cores,
        )
        .expect("valid clip call");
    out
}

#[test]
fn inside_triangle_passes_through_unchanged() {
    let vertices = [
        vertex(Vec4::new(-0.5, -0.5, 0.3, 1.0), 0.0),
        vertex(Vec4::new(0.5, -0.5, 0.3, 1.0), 0.5),
        vertex(Vec4::new(0.0, 0.5, 0.3, 1.0), 1.0),
    ];
    let out = run(&vertices, &[[0, 1, 2]], ClipMode::AllPlanes, &AcceptAll, 1);

    assert_eq!(out.vertices[0].as_slice(), &vertices);
    assert_eq!(out.triangles[0].len(), 1);
    let (points, indices, _) = out.triangles[0][0];
    assert_eq!(indices, [0, 1, 2]);
    assert_eq!(points[0], Vec3::new(-0.5, -0.5, 0.3));
    assert_eq!(out.stats[0].trivially_accepted, 1);
}

#[test]
fn triangle_outside_shared_plane_is_rejected() {
    // 三个顶点都满足 x > w
    let vertices = [
        vertex(Vec4::new(2.0, -0.5, 0.3, 1.0), 0.0),
        vertex(Vec4::new(3.0, -0.5, 0.3, 1.0), 0.5),
        vertex(Vec4::new(2.5, 0.5, -0.3, 1.0), 1.0),
    ];
    let out = run(&vertices, &[[0, 1, 2]], ClipMode::AllPlanes, &AcceptAll, 1);

    assert!(out.triangles[0].is_empty());
    assert_eq!(out.vertices[0].len(), 3);
    assert_eq!(out.stats[0].trivially_rejected, 1);
}

#[test]
fn near_straddling_triangle_synthesizes_vertices_on_plane() {
    let vertices = [
        vertex(Vec4::new(0.0, 0.5, -0.4, 1.0), 0.0),
        vertex(Vec4::new(-0.5, -0.5, 0.6, 1.5), 0.5),
        vertex(Vec4::new(0.5, -0.5, 0.6, 1.5), 1.0),
    ];
    let out = run(&vertices, &[[0, 1, 2]], ClipMode::AllPlanes, &AcceptAll, 1);

    // 一个点在近平面后：得到四边形，两个新顶点，两个三角形
    let buf = &out.vertices[0];
    assert_eq!(buf.len(), 5);
    for v in &buf[3..] {
        assert_abs_diff_eq!(v.projected_pos.z, 0.0, epsilon = 1e-6);
        assert!(v.projected_pos.w > 0.0);
        // 插值后的属性仍位于原三角形属性的凸包里
        assert!((0.0..=1.0).contains(&v.tex_coord.x));
    }
    assert_eq!(out.triangles[0].len(), 2);

    // 两个没被裁掉的原顶点复用原索引，被裁掉的那个不再被引用
    let used: Vec<u32> = out.triangles[0]
        .iter()
        .flat_map(|(_, indices, _)| *indices)
        .collect();
    assert!(used.contains(&1) && used.contains(&2));
    assert!(!used.contains(&0));
}

#[test]
fn clipped_fan_covers_visible_area() {
    // 一个大三角形同时穿过左、右、上平面（w = 1），可见部分为多边形
    let vertices = [
        vertex(Vec4::new(-3.0, -0.5, 0.5, 1.0), 0.0),
        vertex(Vec4::new(3.0, -0.5, 0.5, 1.0), 0.5),
        vertex(Vec4::new(0.0, 3.0, 0.5, 1.0), 1.0),
    ];
    let out = run(&vertices, &[[0, 1, 2]], ClipMode::AllPlanes, &AcceptAll, 1);

    let tris = &out.triangles[0];
    let added = out.vertices[0].len() - 3;
    assert_eq!(tris.len(), added - 2);

    let area: f32 = tris
        .iter()
        .map(|(p, _, _)| {
            ((p[1].x - p[0].x) * (p[2].y - p[0].y) - (p[1].y - p[0].y) * (p[2].x - p[0].x)) * 0.5
        })
        .sum();
    // y 在 [-0.5, 1] 内三角形宽度都超过 2，可见部分正好是 2 x 1.5 的矩形
    assert_eq!(added, 4);
    let expected = 3.0;
    assert_abs_diff_eq!(area, expected, epsilon = 1e-4);
}

#[test]
fn near_only_mode_leaves_side_planes_to_setup() {
    let vertices = [
        vertex(Vec4::new(-3.0, -0.5, 0.5, 1.0), 0.0),
        vertex(Vec4::new(3.0, -0.5, 0.5, 1.0), 0.5),
        vertex(Vec4::new(0.0, 3.0, 0.5, 1.0), 1.0),
    ];
    let out = run(&vertices, &[[0, 1, 2]], ClipMode::NearOnly, &AcceptAll, 1);
    assert_eq!(out.vertices[0].len(), 3);
    assert_eq!(out.triangles[0].len(), 1);

    // 完全在屏幕外的三角形由视口建立阶段丢弃
    let offscreen = [
        vertex(Vec4::new(3.0, -0.5, 0.5, 1.0), 0.0),
        vertex(Vec4::new(5.0, -0.5, 0.5, 1.0), 0.5),
        vertex(Vec4::new(4.0, 0.5, 0.5, 1.0), 1.0),
    ];
    let setup = ViewportSetup::new(Viewport::new(64, 64), CullMode::Back);
    let out = run(&offscreen, &[[0, 1, 2]], ClipMode::NearOnly, &setup, 1);
    assert_eq!(out.stats[0].trivially_accepted, 1);
    assert!(out.triangles[0].is_empty());
}

#[test]
fn random_scene_keeps_buffers_local_and_consistent() {
    let mut rng = StdRng::seed_from_u64(2024);
    let vertices: Vec<ProjectedVertex> = (0..300)
        .map(|i| {
            let w = rng.random_range(0.2..3.0);
            let clip = Vec4::new(
                rng.random_range(-2.0..2.0) * w,
                rng.random_range(-2.0..2.0) * w,
                rng.random_range(-0.5..1.5) * w,
                w,
            );
            vertex(clip, i as f32 / 300.0)
        })
        .collect();
    let triangles: Vec<[u32; 3]> = (0..500)
        .map(|_| std::array::from_fn(|_| rng.random_range(0..300u32)))
        .collect();

    for num_cores in [1, 3, 8] {
        let out = run(&vertices, &triangles, ClipMode::AllPlanes, &AcceptAll, num_cores);

        let processed: usize = out.stats.iter().map(|s| s.triangles_in).sum();
        assert_eq!(processed, triangles.len());

        for (buf, tris) in out.vertices.iter().zip(&out.triangles) {
            for (points, indices, tex_id) in tris {
                for (p, &idx) in points.iter().zip(indices) {
                    let v = buf[idx as usize];
                    assert!(v.projected_pos.w > 0.0);
                    // 输出点都在视锥内（含浮点误差）
                    assert!(p.x.abs() <= 1.0 + 1e-4 && p.y.abs() <= 1.0 + 1e-4);
                    assert!((-1e-4..=1.0 + 1e-4).contains(&p.z));
                }
                assert!((*tex_id as usize) < triangles.len());
            }
        }
    }
}
