use foundation::math::{Ellipsoid, Vec2, Vec3, height_above_ellipsoid};

use crate::visibility::{EllipsoidalOccluder, Viewport};

/// Snapshot of the viewpoint a declutter pass runs against.
pub trait SceneView {
    /// Camera position in world (ECEF) coordinates, meters.
    fn camera_position(&self) -> Vec3;

    fn viewport(&self) -> Viewport;

    /// Screen-space position in pixels (origin top-left, y down), or `None`
    /// when the projection is undefined.
    fn project(&self, world: Vec3) -> Option<Vec2>;

    fn ellipsoid(&self) -> Ellipsoid {
        Ellipsoid::WGS84
    }

    /// Camera height above the ellipsoid, meters.
    fn camera_altitude(&self) -> f64 {
        height_above_ellipsoid(self.camera_position())
    }

    fn occluder(&self) -> EllipsoidalOccluder {
        EllipsoidalOccluder::new(self.ellipsoid(), self.camera_position())
    }

    /// Combined horizon and viewport test; returns the projected coordinate of
    /// a point that passes both.
    fn visible_screen_position(&self, occluder: &EllipsoidalOccluder, world: Vec3) -> Option<Vec2> {
        if !occluder.is_point_visible(world) {
            return None;
        }
        let coord = self.project(world);
        if self.viewport().contains(coord) {
            coord
        } else {
            None
        }
    }
}

/// Row-major view-projection matrix mapping world space to clip space.
///
/// Clip-space convention matches `-w <= x, y <= w`; points with `w <= 0` are
/// behind the camera and do not project.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewProjection {
    pub m: [[f64; 4]; 4],
}

impl ViewProjection {
    pub fn new(m: [[f64; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn identity() -> Self {
        Self::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn to_clip(&self, p: Vec3) -> [f64; 4] {
        let v = [p.x, p.y, p.z, 1.0];
        let mut out = [0.0; 4];
        for (row, o) in self.m.iter().zip(out.iter_mut()) {
            *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
        }
        out
    }

    pub fn project_to_viewport(&self, p: Vec3, viewport: Viewport) -> Option<Vec2> {
        let [x, y, _z, w] = self.to_clip(p);
        if w.is_nan() || w <= f64::EPSILON {
            return None;
        }
        let ndc_x = x / w;
        let ndc_y = y / w;
        let px = (ndc_x + 1.0) * 0.5 * viewport.width;
        let py = (1.0 - ndc_y) * 0.5 * viewport.height;
        let out = Vec2::new(px, py);
        out.is_finite().then_some(out)
    }
}

/// Plain camera snapshot: position, matrix and viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub view_projection: ViewProjection,
    pub viewport: Viewport,
}

impl CameraView {
    pub fn new(position: Vec3, view_projection: ViewProjection, viewport: Viewport) -> Self {
        Self {
            position,
            view_projection,
            viewport,
        }
    }
}

impl SceneView for CameraView {
    fn camera_position(&self) -> Vec3 {
        self.position
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn project(&self, world: Vec3) -> Option<Vec2> {
        self.view_projection.project_to_viewport(world, self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraView, SceneView, ViewProjection};
    use crate::visibility::Viewport;
    use foundation::math::{Vec2, Vec3, WGS84_A};

    #[test]
    fn identity_projects_ndc_origin_to_viewport_center() {
        let vp = Viewport::new(100.0, 50.0);
        let proj = ViewProjection::identity();
        assert_eq!(
            proj.project_to_viewport(Vec3::new(0.0, 0.0, 0.5), vp),
            Some(Vec2::new(50.0, 25.0))
        );
        assert_eq!(
            proj.project_to_viewport(Vec3::new(-1.0, 1.0, 0.0), vp),
            Some(Vec2::new(0.0, 0.0))
        );
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        // w = -z
        let proj = ViewProjection::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, -1.0, 0.0],
        ]);
        let vp = Viewport::new(10.0, 10.0);
        assert_eq!(proj.project_to_viewport(Vec3::new(0.0, 0.0, 1.0), vp), None);
        assert!(proj.project_to_viewport(Vec3::new(0.0, 0.0, -2.0), vp).is_some());
    }

    #[test]
    fn camera_view_altitude_and_visibility() {
        let view = CameraView::new(
            Vec3::new(WGS84_A + 2500.0, 0.0, 0.0),
            ViewProjection::identity(),
            Viewport::new(2.0, 2.0),
        );
        assert!((view.camera_altitude() - 2500.0).abs() < 1e-6);

        let occluder = view.occluder();
        // Far side of the globe fails the horizon test before projection.
        assert_eq!(
            view.visible_screen_position(&occluder, Vec3::new(-WGS84_A, 0.0, 0.0)),
            None
        );
    }
}
