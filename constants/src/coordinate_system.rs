/// WGS84 semi-major axis in metres.
pub const WGS84_RADIUS_EQUATORIAL: f64 = 6_378_137.0;

/// WGS84 semi-minor axis in metres.
pub const WGS84_RADIUS_POLAR: f64 = 6_356_752.314_245_179;

/// Ellipsoid radii as (x, y, z) for the Earth-centred Earth-fixed frame.
pub const WGS84_RADII: [f64; 3] = [
    WGS84_RADIUS_EQUATORIAL,
    WGS84_RADIUS_EQUATORIAL,
    WGS84_RADIUS_POLAR,
];

/// Cartesian points closer than this to the centre are treated as degenerate.
pub const CENTRE_EPSILON: f64 = 1.0e-3;
