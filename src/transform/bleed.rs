//! Alpha bleed
//!
//! Fills fully transparent pixels with the RGB of the nearest opaque
//! neighbor while keeping them transparent. Prevents dark halos when the
//! renderer bilinearly samples across the alpha edge.

use crate::error::{SyncError, SyncResult};
use image::{ImageFormat, Rgba};
use std::io::Cursor;

/// Neighbor offsets checked when bleeding, orthogonal first
const DIRECTIONS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Bleed the alpha channel of a PNG/JPEG buffer; always outputs PNG
pub fn bleed_alpha(input: &[u8]) -> SyncResult<Vec<u8>> {
    let decoded = image::load_from_memory(input)
        .map_err(|e| SyncError::InvalidImage(e.to_string()))?;
    let mut rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(SyncError::InvalidImage("zero-sized image".to_string()));
    }

    for y in 0..height {
        for x in 0..width {
            if rgba.get_pixel(x, y)[3] != 0 {
                continue;
            }
            for (dx, dy) in DIRECTIONS {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                    continue;
                }
                let neighbor = *rgba.get_pixel(nx as u32, ny as u32);
                if neighbor[3] > 0 {
                    rgba.put_pixel(x, y, Rgba([neighbor[0], neighbor[1], neighbor[2], 0]));
                    break;
                }
            }
        }
    }

    let mut out = Cursor::new(Vec::new());
    rgba.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| SyncError::InvalidImage(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn transparent_pixel_takes_neighbor_color() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([200, 50, 10, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));

        let bled = bleed_alpha(&png_bytes(&img)).unwrap();
        let result = image::load_from_memory(&bled).unwrap().to_rgba8();

        assert_eq!(*result.get_pixel(0, 0), Rgba([200, 50, 10, 255]));
        // RGB copied, alpha stays zero
        assert_eq!(*result.get_pixel(1, 0), Rgba([200, 50, 10, 0]));
    }

    #[test]
    fn isolated_transparent_pixel_unchanged() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));

        let bled = bleed_alpha(&png_bytes(&img)).unwrap();
        let result = image::load_from_memory(&bled).unwrap().to_rgba8();

        assert_eq!(*result.get_pixel(1, 1), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn rejects_invalid_bytes() {
        assert!(matches!(
            bleed_alpha(b"not an image"),
            Err(SyncError::InvalidImage(_))
        ));
    }
}
