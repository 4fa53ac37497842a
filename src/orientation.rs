//! Orientation and magnitude channels derived from raw axis readings.
//!
//! Pure functions of `(x, y, z)`; angular results are in degrees. The roll
//! formula carries a small gimbal-lock compensation term so the result stays
//! stable as the z reading passes through zero.
//!
//! References:
//! - <https://stackoverflow.com/questions/3755059/3d-accelerometer-calculate-the-orientation>
//! - <https://engineering.stackexchange.com/questions/3348/calculating-pitch-yaw-and-roll-from-mag-acc-and-gyro-data>

use crate::window::buffer::WindowRow;

/// Gimbal-lock compensation constant used in the roll calculation.
pub const MIU: f64 = 0.001;

/// Absolute acceleration across all three axes.
pub fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Pitch in degrees.
pub fn pitch(x: f64, y: f64, z: f64) -> f64 {
    (-x).atan2((y * y + z * z).sqrt()).to_degrees()
}

/// Roll in degrees, with gimbal-lock compensation near z = 0.
pub fn roll(x: f64, y: f64, z: f64) -> f64 {
    let sign = if z > 0.0 { -1.0 } else { 1.0 };
    y.atan2(sign * (z * z + MIU * x * x).sqrt()).to_degrees()
}

/// Yaw in degrees.
///
/// The underlying formula divides by `sqrt(x² + z²)`; when both x and z are
/// zero the result is defined here as 0.0 rather than NaN.
pub fn yaw(x: f64, _y: f64, z: f64) -> f64 {
    let denom = (x * x + z * z).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    180.0 * (z / denom).atan() / std::f64::consts::PI
}

/// Fill the derived columns of a window row from its raw axis readings.
///
/// Rows with any missing axis keep their derived columns unfilled.
pub fn annotate(row: &mut WindowRow) {
    if !row.has_axes() {
        return;
    }
    let (x, y, z) = (row.x, row.y, row.z);
    row.magnitude = magnitude(x, y, z);
    row.pitch = pitch(x, y, z);
    row.roll = roll(x, y, z);
    row.yaw = yaw(x, y, z);
}
