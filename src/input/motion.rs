use super::math::Vec3;

/// Remap a calibrated accelerometer sample so the sensor's vertical axis
/// becomes `y` (up): `(x, y, z)` → `(x, z, y)`.
pub fn accel_from_sensor([x, y, z]: [f32; 3]) -> Vec3 {
    Vec3::new(x, z, y)
}
