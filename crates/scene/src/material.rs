use stagecraft_common::Color;

/// Handle to a texture owned by the asset loader and uploaded by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Which faces of a mesh are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Blinn-Phong surface description.
#[derive(Debug, Clone, PartialEq)]
pub struct PhongMaterial {
    pub name: String,
    pub color: Color,
    pub map: Option<TextureHandle>,
    pub specular: Color,
    pub shininess: f32,
    pub side: Side,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            name: "phong".into(),
            color: Color::WHITE,
            map: None,
            specular: Color::from_hex(0x111111),
            shininess: 30.0,
            side: Side::Front,
        }
    }
}

impl PhongMaterial {
    pub fn colored(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            ..Self::default()
        }
    }

    pub fn textured(name: impl Into<String>, map: TextureHandle) -> Self {
        Self {
            name: name.into(),
            map: Some(map),
            ..Self::default()
        }
    }

    pub fn double_sided(mut self) -> Self {
        self.side = Side::Double;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phong_values() {
        let m = PhongMaterial::default();
        assert_eq!(m.specular.to_hex(), 0x111111);
        assert_eq!(m.shininess, 30.0);
        assert_eq!(m.side, Side::Front);
        assert!(m.map.is_none());
    }

    #[test]
    fn builders() {
        let m = PhongMaterial::colored("ground", Color::from_hex(0x654321)).double_sided();
        assert_eq!(m.side, Side::Double);
        assert_eq!(m.color.to_hex(), 0x654321);
        let t = PhongMaterial::textured("grass", TextureHandle(3));
        assert_eq!(t.map, Some(TextureHandle(3)));
        assert_eq!(t.color, Color::WHITE);
    }
}
