use cgmath::{Deg, Matrix4 as Mat4, Point3, Rad, Transform, Vector3 as Vec3};

/// 透视投影。深度映射为 [0, w]：近平面 z = 0，远平面 z = w，
/// 与裁剪阶段的近平面测试（z < 0）对应。
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    mat: Mat4<f32>,
}

impl Frustum {
    #[rustfmt::skip]
    pub fn new(near: f32, far: f32, aspect: f32, fovy: Rad<f32>) -> Self {
        let tan_half_fovy = (fovy.0 / 2.0).tan();
        let a = 1.0 / (aspect * tan_half_fovy);
        let b = 1.0 / tan_half_fovy;
        let c = -far / (far - near);
        let d = -far * near / (far - near);

        // 列主序
        let mat = Mat4::new(
            a,    0.0,   0.0,   0.0,
            0.0,  b,     0.0,   0.0,
            0.0,  0.0,   c,    -1.0,
            0.0,  0.0,   d,     0.0,
        );

        Self {
            near,
            far,
            aspect,
            fovy,
            mat,
        }
    }

    pub fn get_mat(&self) -> &Mat4<f32> {
        &self.mat
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    frustum: Frustum,
    pub(crate) eye: Vec3<f32>,
    pub(crate) target: Vec3<f32>,
    pub(crate) yaw: Rad<f32>,
    pub(crate) pitch: Rad<f32>,
}

impl Camera {
    pub fn new(near: f32, far: f32, aspect: f32, fovy: Deg<f32>) -> Self {
        Self {
            frustum: Frustum::new(near, far, aspect, fovy.into()),
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::new(0.0, 0.0, 0.0),
            yaw: Rad(0.0),
            pitch: Rad(0.0),
        }
    }

    pub fn get_frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn eye(&self) -> Vec3<f32> {
        self.eye
    }

    pub fn set_position(&mut self, position: Vec3<f32>) {
        self.eye = position;
    }

    pub fn set_target(&mut self, target: Vec3<f32>) {
        self.target = target;
    }

    pub fn set_rotation(&mut self, yaw: impl Into<Rad<f32>>, pitch: impl Into<Rad<f32>>) {
        self.yaw = yaw.into();
        self.pitch = pitch.into();
    }

    /// 相机位置绕目标点先俯仰再偏航
    pub fn get_view_mat(&self) -> Mat4<f32> {
        let rotation = Mat4::from_angle_y(self.yaw) * Mat4::from_angle_x(self.pitch);
        let offset = rotation.transform_vector(self.eye - self.target);
        let eye = Point3::new(
            self.target.x + offset.x,
            self.target.y + offset.y,
            self.target.z + offset.z,
        );
        let target = Point3::new(self.target.x, self.target.y, self.target.z);

        Mat4::look_at_rh(eye, target, Vec3::new(0., 1., 0.))
    }

    pub fn get_view_proj_mat(&self) -> Mat4<f32> {
        self.frustum.get_mat() * self.get_view_mat()
    }
}
