//! Reference-surface math on the WGS84 ellipsoid.
//!
//! Everything here works in double precision in the Earth-centred Earth-fixed
//! (ECEF) frame: `+X` through (0°, 0°), `+Z` through the north pole.

use bevy::math::{DMat3, DQuat, DVec3};
use constants::coordinate_system::{CENTRE_EPSILON, WGS84_RADII};
use serde::{Deserialize, Serialize};

/// Geographic position: longitude/latitude in degrees, height in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cartographic {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub height: f64,
}

impl Cartographic {
    pub const fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    pub fn with_height(self, height: f64) -> Self {
        Self { height, ..self }
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite() && self.height.is_finite()
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_in_range(&self) -> bool {
        self.is_finite() && self.latitude.abs() <= 90.0 && self.longitude.abs() <= 180.0
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.longitude, self.latitude, self.height]
    }

    /// Accepts `[lon, lat]` or `[lon, lat, height]`.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [lon, lat] => Some(Self::new(*lon, *lat, 0.0)),
            [lon, lat, h] => Some(Self::new(*lon, *lat, *h)),
            _ => None,
        }
    }

    /// Same spot on the surface, ignoring height.
    pub fn same_spot(&self, other: &Self, tolerance_deg: f64) -> bool {
        (self.longitude - other.longitude).abs() <= tolerance_deg
            && (self.latitude - other.latitude).abs() <= tolerance_deg
    }
}

/// Outward geodetic surface normal at a geographic position.
pub fn geodetic_surface_normal(position: &Cartographic) -> DVec3 {
    let lon = position.longitude.to_radians();
    let lat = position.latitude.to_radians();
    DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

pub fn cartographic_to_cartesian(position: &Cartographic) -> DVec3 {
    let radii_squared = DVec3::from_array(WGS84_RADII).powf(2.0);
    let n = geodetic_surface_normal(position);
    let k = radii_squared * n;
    let gamma = n.dot(k).sqrt();
    k / gamma + n * position.height
}

/// Inverse of [`cartographic_to_cartesian`]. `None` near the ellipsoid centre.
pub fn cartesian_to_cartographic(point: DVec3) -> Option<Cartographic> {
    if !point.is_finite() || point.length() < CENTRE_EPSILON {
        return None;
    }

    let a = WGS84_RADII[0];
    let b = WGS84_RADII[2];
    let e2 = 1.0 - (b * b) / (a * a);
    let p = (point.x * point.x + point.y * point.y).sqrt();
    let lon = point.y.atan2(point.x);

    // Fixed-point iteration on latitude; converges to sub-millimetre in a handful of steps.
    let mut lat = point.z.atan2(p * (1.0 - e2));
    let mut height = 0.0;
    for _ in 0..8 {
        let sin_lat = lat.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        height = if lat.cos().abs() > 1.0e-10 {
            p / lat.cos() - n
        } else {
            point.z.abs() - b
        };
        lat = point.z.atan2(p * (1.0 - e2 * n / (n + height)));
    }

    Some(Cartographic::new(lon.to_degrees(), lat.to_degrees(), height))
}

/// Local east-north-up basis at a position, as matrix columns.
pub fn enu_frame(position: &Cartographic) -> DMat3 {
    let lon = position.longitude.to_radians();
    let lat = position.latitude.to_radians();
    let east = DVec3::new(-lon.sin(), lon.cos(), 0.0);
    let north = DVec3::new(-lat.sin() * lon.cos(), -lat.sin() * lon.sin(), lat.cos());
    let up = geodetic_surface_normal(position);
    DMat3::from_cols(east, north, up)
}

/// Rotation taking local (east, north, up) axes onto ECEF.
pub fn enu_quat(position: &Cartographic) -> DQuat {
    DQuat::from_mat3(&enu_frame(position)).normalize()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

/// Plane in Hessian form: `normal · p + distance = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub distance: f64,
}

impl Plane {
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Plane tangent to the ellipsoid at `position`, passing through its height.
    pub fn tangent_at(position: &Cartographic) -> Self {
        Self::from_point_normal(
            cartographic_to_cartesian(position),
            geodetic_surface_normal(position),
        )
    }

    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.distance
    }
}

/// Intersection in front of the ray origin, `None` for parallel rays.
pub fn ray_plane_intersection(ray: &Ray, plane: &Plane) -> Option<DVec3> {
    let denom = plane.normal.dot(ray.direction);
    if denom.abs() < 1.0e-12 {
        return None;
    }
    let t = -plane.signed_distance(ray.origin) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray.at(t))
}

/// Nearest intersection of a ray with an axis-aligned ellipsoid centred at the origin.
pub fn ray_ellipsoid_intersection(ray: &Ray, radii: [f64; 3]) -> Option<DVec3> {
    let inv = DVec3::from_array(radii).recip();
    let o = ray.origin * inv;
    let d = ray.direction * inv;

    let a = d.dot(d);
    if a <= f64::EPSILON {
        return None;
    }
    let b = 2.0 * o.dot(d);
    let c = o.dot(o) - 1.0;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }

    let root = disc.sqrt();
    let t0 = (-b - root) / (2.0 * a);
    let t1 = (-b + root) / (2.0 * a);
    let t = if t0 >= 0.0 {
        t0
    } else if t1 >= 0.0 {
        t1
    } else {
        return None;
    };
    Some(ray.at(t))
}

pub fn ray_surface_intersection(ray: &Ray) -> Option<DVec3> {
    ray_ellipsoid_intersection(ray, WGS84_RADII)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cartesian_round_trip_keeps_position() {
        let p = Cartographic::new(24.1052, 56.9496, 120.0);
        let back = cartesian_to_cartographic(cartographic_to_cartesian(&p)).unwrap();
        assert!((back.longitude - p.longitude).abs() < 1e-9);
        assert!((back.latitude - p.latitude).abs() < 1e-9);
        assert!((back.height - p.height).abs() < 1e-4);
    }

    #[test]
    fn equator_prime_meridian_lies_on_x_axis() {
        let p = cartographic_to_cartesian(&Cartographic::new(0.0, 0.0, 0.0));
        assert!((p.x - WGS84_RADII[0]).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6 && p.z.abs() < 1e-6);
    }

    #[test]
    fn enu_frame_is_orthonormal_and_up_is_outward() {
        let p = Cartographic::new(-73.98, 40.75, 0.0);
        let m = enu_frame(&p);
        assert!((m.x_axis.dot(m.y_axis)).abs() < 1e-12);
        assert!((m.x_axis.cross(m.y_axis) - m.z_axis).length() < 1e-12);
        assert!(m.z_axis.dot(cartographic_to_cartesian(&p)) > 0.0);
    }

    #[test]
    fn downward_ray_hits_tangent_plane_and_surface() {
        let p = Cartographic::new(10.0, 45.0, 0.0);
        let up = geodetic_surface_normal(&p);
        let ray = Ray::new(cartographic_to_cartesian(&p.with_height(1000.0)), -up);

        let on_plane = ray_plane_intersection(&ray, &Plane::tangent_at(&p)).unwrap();
        let on_surface = ray_surface_intersection(&ray).unwrap();
        let expected = cartographic_to_cartesian(&p);
        assert!((on_plane - expected).length() < 1e-6);
        assert!((on_surface - expected).length() < 1e-3);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let p = Cartographic::new(0.0, 0.0, 500.0);
        let ray = Ray::new(cartographic_to_cartesian(&p), geodetic_surface_normal(&p));
        assert!(ray_plane_intersection(&ray, &Plane::tangent_at(&p.with_height(0.0))).is_none());
        assert!(ray_surface_intersection(&ray).is_none());
    }
}
