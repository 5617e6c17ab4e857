use glam::{Mat3, Quat, Vec3, Vec4};

/// Zeroth-order spherical-harmonic basis constant.
pub const SH_C0: f32 = 0.282_094_8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub position: [f32; 3],
    pub color: [u8; 3],
}

/// A raw coloured point cloud. Immutable once handed to a renderer.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    points: Vec<Point>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn positions(&self) -> Vec<Vec4> {
        self.points
            .iter()
            .map(|p| Vec3::from_array(p.position).extend(1.0))
            .collect()
    }

    pub fn colors(&self) -> Vec<Vec4> {
        self.points
            .iter()
            .map(|p| {
                Vec4::new(
                    p.color[0] as f32 / 255.0,
                    p.color[1] as f32 / 255.0,
                    p.color[2] as f32 / 255.0,
                    1.0,
                )
            })
            .collect()
    }
}

/// One Gaussian-splat primitive as stored by 3DGS training output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub position: [f32; 3],
    /// DC term of the spherical-harmonic colour.
    pub f_dc: [f32; 3],
    /// Opacity before the sigmoid.
    pub opacity: f32,
    /// Per-axis scale in log space.
    pub scale: [f32; 3],
    /// Rotation quaternion, `(w, x, y, z)`, not necessarily normalised.
    pub rot: [f32; 4],
}

impl Gaussian {
    pub fn color(&self) -> Vec4 {
        let alpha = 1.0 / (1.0 + (-self.opacity).exp());
        Vec4::new(
            0.5 + SH_C0 * self.f_dc[0],
            0.5 + SH_C0 * self.f_dc[1],
            0.5 + SH_C0 * self.f_dc[2],
            alpha,
        )
    }

    /// World-space covariance `R S Sᵀ Rᵀ`.
    #[allow(non_snake_case)]
    pub fn covariance(&self) -> Mat3 {
        let [w, x, y, z] = self.rot;
        let R = Mat3::from_quat(Quat::from_xyzw(x, y, z, w).normalize());
        let S = Mat3::from_diagonal(Vec3::from_array(self.scale.map(f32::exp)));
        let M = R * S;
        M * M.transpose()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GaussianCloud {
    gaussians: Vec<Gaussian>,
}

impl GaussianCloud {
    pub fn new(gaussians: Vec<Gaussian>) -> Self {
        Self { gaussians }
    }

    pub fn len(&self) -> usize {
        self.gaussians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaussians.is_empty()
    }

    pub fn gaussians(&self) -> &[Gaussian] {
        &self.gaussians
    }

    pub fn positions(&self) -> Vec<Vec4> {
        self.gaussians
            .iter()
            .map(|g| Vec3::from_array(g.position).extend(1.0))
            .collect()
    }
}
