use super::{Ecef, Vec3};

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
/// WGS84 second eccentricity squared.
pub const WGS84_EP2: f64 = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);

/// Axis-aligned ellipsoid centred at the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ellipsoid {
    pub radii: Vec3,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        radii: Vec3 {
            x: WGS84_A,
            y: WGS84_A,
            z: WGS84_B,
        },
    };

    pub fn new(radii: Vec3) -> Self {
        Self { radii }
    }

    pub fn sphere(radius: f64) -> Self {
        Self::new(Vec3::new(radius, radius, radius))
    }

    pub fn one_over_radii(&self) -> Vec3 {
        Vec3::new(1.0 / self.radii.x, 1.0 / self.radii.y, 1.0 / self.radii.z)
    }

    /// Maps `p` into the space where this ellipsoid is the unit sphere.
    pub fn to_scaled_space(&self, p: Vec3) -> Vec3 {
        p.mul_elements(self.one_over_radii())
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// Geodetic coordinates in radians and meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geodetic {
    pub lat_rad: f64,
    pub lon_rad: f64,
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_rad: f64, lon_rad: f64, alt_m: f64) -> Self {
        Self {
            lat_rad,
            lon_rad,
            alt_m,
        }
    }
}

pub fn ecef_to_geodetic(ecef: Ecef) -> Geodetic {
    let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
    let lon = ecef.y.atan2(ecef.x);

    // On the polar axis the height formula below divides by cos(lat) ~ 0.
    if p < 1e-9 {
        let lat = if ecef.z >= 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            -std::f64::consts::FRAC_PI_2
        };
        return Geodetic::new(lat, lon, ecef.z.abs() - WGS84_B);
    }

    let theta = (ecef.z * WGS84_A).atan2(p * WGS84_B);
    let sin_theta = theta.sin();
    let cos_theta = theta.cos();

    let lat = (ecef.z + WGS84_EP2 * WGS84_B * sin_theta * sin_theta * sin_theta)
        .atan2(p - WGS84_E2 * WGS84_A * cos_theta * cos_theta * cos_theta);

    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt = p / lat.cos() - n;

    Geodetic::new(lat, lon, alt)
}

/// Height above the WGS84 ellipsoid of an ECEF position (meters).
pub fn height_above_ellipsoid(position: Vec3) -> f64 {
    ecef_to_geodetic(position.into()).alt_m
}

#[cfg(test)]
mod tests {
    use super::{
        Ecef, Ellipsoid, WGS84_A, WGS84_B, WGS84_E2, ecef_to_geodetic, height_above_ellipsoid,
    };
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    /// ECEF point `alt_m` above the ellipsoid at the given geodetic coordinates.
    fn ecef_at(lat_rad: f64, lon_rad: f64, alt_m: f64) -> Ecef {
        let sin_lat = lat_rad.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        Ecef::new(
            (n + alt_m) * lat_rad.cos() * lon_rad.cos(),
            (n + alt_m) * lat_rad.cos() * lon_rad.sin(),
            (n * (1.0 - WGS84_E2) + alt_m) * sin_lat,
        )
    }

    #[test]
    fn ecef_to_geodetic_on_equator() {
        let geo = ecef_to_geodetic(Ecef::new(0.0, WGS84_A + 120.0, 0.0));
        assert_close(geo.lat_rad, 0.0, 1e-12);
        assert_close(geo.lon_rad, std::f64::consts::FRAC_PI_2, 1e-12);
        assert_close(geo.alt_m, 120.0, 1e-6);
    }

    #[test]
    fn ecef_to_geodetic_mid_latitude() {
        let lat = std::f64::consts::FRAC_PI_6;
        let lon = -std::f64::consts::FRAC_PI_3;
        let geo = ecef_to_geodetic(ecef_at(lat, lon, 120.0));
        assert_close(geo.lat_rad, lat, 1e-9);
        assert_close(geo.lon_rad, lon, 1e-9);
        assert_close(geo.alt_m, 120.0, 1e-6);
    }

    #[test]
    fn height_above_ellipsoid_on_equator_and_pole() {
        assert_close(
            height_above_ellipsoid(Vec3::new(WGS84_A + 1000.0, 0.0, 0.0)),
            1000.0,
            1e-6,
        );
        assert_close(
            height_above_ellipsoid(Vec3::new(0.0, 0.0, -(WGS84_B + 250.0))),
            250.0,
            1e-6,
        );
    }

    #[test]
    fn scaled_space_maps_surface_to_unit_sphere() {
        let e = Ellipsoid::WGS84;
        let s = e.to_scaled_space(Vec3::new(0.0, 0.0, WGS84_B));
        assert_close(s.magnitude_squared(), 1.0, 1e-12);
        assert_eq!(Ellipsoid::sphere(2.0).to_scaled_space(Vec3::new(4.0, 0.0, 0.0)).x, 2.0);
    }
}
