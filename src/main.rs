use std::error::Error;
use std::path::Path;
use std::time::Instant;

use cgmath::{Deg, Matrix4 as Mat4, SquareMatrix};
use rs_clipper::config::{ModelConfig, RenderConfig};
use rs_clipper::model::{create_floor, load_obj};
use rs_clipper::{Camera, Mesh, RenderSettings, Renderer};

fn model_matrix(config: &ModelConfig) -> Mat4<f32> {
    let [rx, ry, rz] = config.angle;
    let rotation_mat =
        Mat4::from_angle_x(Deg(rx)) * Mat4::from_angle_y(Deg(ry)) * Mat4::from_angle_z(Deg(rz));
    Mat4::from_translation(config.position.into()) * rotation_mat * Mat4::from_scale(config.scale)
}

fn set_camera(config: &RenderConfig) -> Camera {
    let c = &config.camera;
    let mut camera = Camera::new(
        c.near,
        c.far,
        config.width as f32 / config.height as f32,
        Deg(c.fovy),
    );
    camera.set_position(c.position.into());
    camera.set_target(c.target.into());
    camera
}

fn main() -> Result<(), Box<dyn Error>> {
    // 使用方式: rs-clipper [json路径] [帧数]
    let args: Vec<String> = std::env::args().collect();
    let mut config = match args.get(1) {
        Some(path) => RenderConfig::from_path(Path::new(path))?,
        None => {
            println!("未指定配置文件，使用默认场景");
            RenderConfig::default()
        }
    };
    if let Some(frames) = args.get(2) {
        config.frames = match frames.parse() {
            Ok(val) => val,
            Err(_) => return Err("帧数必须是非负整数".into()),
        };
    }

    let mut scene: Vec<(Mesh, Mat4<f32>)> = Vec::new();
    if let Some(floor) = &config.floor {
        scene.push((
            create_floor(floor.size, floor.cells, floor.height),
            Mat4::identity(),
        ));
    }
    for model_config in &config.models {
        let mesh = load_obj(Path::new(&model_config.path), model_config.tex_id)?;
        println!("成功读取模型 {}：{} 个三角形", model_config.path, mesh.triangle_count());
        scene.push((mesh, model_matrix(model_config)));
    }

    let defaults = RenderSettings::default();
    let settings = RenderSettings {
        num_cores: config.num_cores.unwrap_or(defaults.num_cores),
        clip_mode: config.clip_mode,
        cull_mode: config.cull_mode,
    };
    let mut renderer = Renderer::new(set_camera(&config), config.width, config.height, settings);
    println!(
        "初始化完成：{}x{}，{} 个工作线程，裁剪模式 {:?}",
        config.width, config.height, settings.num_cores, settings.clip_mode
    );

    let [yaw, pitch] = config.camera.angle;
    for i in 0..config.frames {
        // 相机绕目标点转一圈
        let angle = yaw + i as f32 * 360.0 / config.frames.max(1) as f32;
        renderer.camera_mut().set_rotation(Deg(angle), Deg(pitch));

        let start = Instant::now();
        renderer.begin_frame();
        for (mesh, model) in &scene {
            renderer.set_render_state(model);
            renderer.render_mesh(mesh)?;
        }
        let elapsed = start.elapsed();

        let stats = renderer.stats();
        println!(
            "第{}帧：输入 {} 三角形，输出 {} 三角形，顶点 {}，裁剪 {}，剔除 {}，耗时 {:?}",
            i,
            stats.total.triangles_in,
            stats.total.emitted,
            stats.output_vertices,
            stats.total.clipped,
            stats.total.trivially_rejected,
            elapsed
        );
    }

    Ok(())
}
