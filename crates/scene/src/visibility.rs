use foundation::math::{Ellipsoid, Vec2, Vec3};

/// Drawing-buffer extent in pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Inclusive `[0, width] x [0, height]` test. Undefined or non-finite
    /// coordinates are outside.
    pub fn contains(&self, coord: Option<Vec2>) -> bool {
        let Some(c) = coord else {
            return false;
        };
        c.is_finite() && c.x >= 0.0 && c.x <= self.width && c.y >= 0.0 && c.y <= self.height
    }
}

/// Horizon culling against an ellipsoid, for a fixed camera position.
///
/// Works in scaled space, where the ellipsoid is the unit sphere. A point is
/// hidden when it is farther along the view axis than the horizon plane and
/// inside the cone tangent to the sphere. When the camera is inside the
/// ellipsoid, the plane through the camera is used instead.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EllipsoidalOccluder {
    ellipsoid: Ellipsoid,
    camera_scaled: Vec3,
    /// Squared distance from the camera to the horizon, in scaled space.
    distance_to_limb_squared: f64,
}

impl EllipsoidalOccluder {
    pub fn new(ellipsoid: Ellipsoid, camera_position: Vec3) -> Self {
        let camera_scaled = ellipsoid.to_scaled_space(camera_position);
        Self {
            ellipsoid,
            camera_scaled,
            distance_to_limb_squared: camera_scaled.magnitude_squared() - 1.0,
        }
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    pub fn is_point_visible(&self, position: Vec3) -> bool {
        if !position.is_finite() {
            return false;
        }
        let scaled = self.ellipsoid.to_scaled_space(position);
        self.is_scaled_point_visible(scaled)
    }

    fn is_scaled_point_visible(&self, scaled: Vec3) -> bool {
        let cv = self.camera_scaled;
        let vh_sq = self.distance_to_limb_squared;
        let vt = scaled - cv;
        let vt_dot_vc = -vt.dot(cv);

        let occluded = if vh_sq < 0.0 {
            vt_dot_vc > 0.0
        } else {
            vt_dot_vc > vh_sq && vt_dot_vc * vt_dot_vc / vt.magnitude_squared() > vh_sq
        };
        !occluded
    }
}
