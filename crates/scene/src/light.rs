use glam::Vec3;
use stagecraft_common::Color;

/// Light sources. Position comes from the owning node's transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    /// Parallel light shining from the node position towards `target`.
    Directional {
        color: Color,
        intensity: f32,
        target: Vec3,
    },
    /// Cone light. `angle` is the half-angle in radians; `distance` of 0 means unlimited range.
    Spot {
        color: Color,
        intensity: f32,
        target: Vec3,
        angle: f32,
        penumbra: f32,
        decay: f32,
        distance: f32,
    },
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self::Ambient { color, intensity }
    }

    pub fn directional(color: Color, intensity: f32) -> Self {
        Self::Directional {
            color,
            intensity,
            target: Vec3::ZERO,
        }
    }

    pub fn spot(color: Color, intensity: f32) -> Self {
        Self::Spot {
            color,
            intensity,
            target: Vec3::ZERO,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            decay: 2.0,
            distance: 0.0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ambient { .. } => "ambient",
            Self::Directional { .. } => "directional",
            Self::Spot { .. } => "spot",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Ambient { color, .. }
            | Self::Directional { color, .. }
            | Self::Spot { color, .. } => *color,
        }
    }

    pub fn color_mut(&mut self) -> &mut Color {
        match self {
            Self::Ambient { color, .. }
            | Self::Directional { color, .. }
            | Self::Spot { color, .. } => color,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Self::Ambient { intensity, .. }
            | Self::Directional { intensity, .. }
            | Self::Spot { intensity, .. } => *intensity,
        }
    }

    pub fn intensity_mut(&mut self) -> &mut f32 {
        match self {
            Self::Ambient { intensity, .. }
            | Self::Directional { intensity, .. }
            | Self::Spot { intensity, .. } => intensity,
        }
    }

    pub fn target(&self) -> Option<Vec3> {
        match self {
            Self::Directional { target, .. } | Self::Spot { target, .. } => Some(*target),
            Self::Ambient { .. } => None,
        }
    }

    pub fn target_mut(&mut self) -> Option<&mut Vec3> {
        match self {
            Self::Directional { target, .. } | Self::Spot { target, .. } => Some(target),
            Self::Ambient { .. } => None,
        }
    }
}

/// Cone falloff for a spot light: 0 outside the cone, 1 inside the penumbra-free core.
pub fn spot_cone_factor(angle: f32, penumbra: f32, cos_to_point: f32) -> f32 {
    let cone_cos = angle.cos();
    let penumbra_cos = (angle * (1.0 - penumbra)).cos();
    smoothstep(cone_cos, penumbra_cos, cos_to_point)
}

/// Distance attenuation with an optional hard cutoff, matching the shader.
pub fn distance_attenuation(distance_to_light: f32, cutoff: f32, decay: f32) -> f32 {
    let mut falloff = 1.0 / distance_to_light.powf(decay).max(0.01);
    if cutoff > 0.0 {
        let r = (1.0 - (distance_to_light / cutoff).powi(4)).clamp(0.0, 1.0);
        falloff *= r * r;
    }
    falloff
}

pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_cover_all_variants() {
        let mut spot = Light::spot(Color::WHITE, 150.0);
        assert_eq!(spot.kind(), "spot");
        *spot.intensity_mut() = 200.0;
        assert_eq!(spot.intensity(), 200.0);
        *spot.color_mut() = Color::from_hex(0xff0000);
        assert_eq!(spot.color().to_hex(), 0xff0000);
        assert_eq!(spot.target(), Some(Vec3::ZERO));

        let mut ambient = Light::ambient(Color::from_hex(0x404040), 0.5);
        assert!(ambient.target().is_none());
        assert!(ambient.target_mut().is_none());
    }

    #[test]
    fn cone_factor_edges() {
        let angle = std::f32::consts::FRAC_PI_6;
        assert_eq!(spot_cone_factor(angle, 0.1, 1.0), 1.0);
        assert_eq!(spot_cone_factor(angle, 0.1, (angle + 0.1).cos()), 0.0);
        let mid = spot_cone_factor(angle, 0.1, (angle * 0.95).cos());
        assert!(mid > 0.0 && mid < 1.0);
        // zero penumbra is a hard edge
        assert_eq!(spot_cone_factor(angle, 0.0, (angle * 0.99).cos()), 1.0);
    }

    #[test]
    fn attenuation_inverse_square_with_cutoff() {
        let near = distance_attenuation(18.0, 200.0, 2.0);
        assert!((near - 1.0 / 324.0).abs() < 1e-4);
        assert_eq!(distance_attenuation(250.0, 200.0, 2.0), 0.0);
        assert_eq!(distance_attenuation(0.0, 0.0, 2.0), 100.0);
    }
}
