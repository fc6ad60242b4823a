use glam::Mat4;

/// Spin of the displayed mesh about +Y, in degrees.
///
/// Stored unwrapped; it grows by a fixed step every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationAngle {
    degrees: f32,
}

impl AnimationAngle {
    pub fn degrees(&self) -> f32 {
        self.degrees
    }

    /// The angle folded into `[0, 360)`.
    pub fn normalized(&self) -> f32 {
        self.degrees.rem_euclid(360.0)
    }

    pub fn advance(&mut self, step_degrees: f32) {
        self.degrees += step_degrees;
    }

    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.degrees.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn advances_without_wrapping() {
        let mut angle = AnimationAngle::default();
        for _ in 0..37 {
            angle.advance(10.0);
        }
        assert_eq!(angle.degrees(), 370.0);
        assert_eq!(angle.normalized(), 10.0);
    }

    #[test]
    fn rotation_turns_about_y() {
        let mut angle = AnimationAngle::default();
        angle.advance(90.0);
        let p = angle.rotation().transform_point3(Vec3::X);
        assert!((p - Vec3::NEG_Z).length() < 1e-6);
    }
}
