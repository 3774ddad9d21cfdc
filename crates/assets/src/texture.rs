use crate::AssetError;
use std::path::Path;

/// Decoded RGBA8 pixels, sRGB encoded, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
}

impl TextureData {
    /// 1x1 opaque white. Stands in for textures that are missing or still loading.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba8: vec![255; 4],
        }
    }

    pub fn byte_len(&self) -> usize {
        self.rgba8.len()
    }
}

/// Decode an image file into RGBA8.
pub fn load_texture(path: &Path) -> Result<TextureData, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let img = image::load_from_memory(&bytes).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path = %path.display(), width, height, "texture decoded");
    Ok(TextureData {
        width,
        height,
        rgba8: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let img = image::RgbaImage::from_fn(4, 2, |x, _| {
            if x % 2 == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        });
        img.save(&path).unwrap();

        let tex = load_texture(&path).unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(tex.byte_len(), 4 * 2 * 4);
        assert_eq!(&tex.rgba8[0..4], &[255, 0, 0, 255]);
        assert_eq!(&tex.rgba8[4..8], &[0, 0, 255, 255]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_texture(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn garbage_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            load_texture(&path).unwrap_err(),
            AssetError::Image { .. }
        ));
    }

    #[test]
    fn white_placeholder() {
        let w = TextureData::white();
        assert_eq!(w.rgba8, vec![255, 255, 255, 255]);
    }
}
