use std::io::Cursor;

use anyhow::{ensure, Context as _};
use egui::{Rect, Vec2};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Paints the artwork onto a full-resolution copy of the room photo.
/// `overlay` is the artwork box in the coordinates the room was displayed
/// at, `display_size` the size it was displayed with.
pub fn render(
    room: &DynamicImage,
    artwork: &DynamicImage,
    overlay: Rect,
    display_size: Vec2,
) -> anyhow::Result<RgbaImage> {
    ensure!(
        display_size.x > 0.0 && display_size.y > 0.0,
        "room image has not been laid out"
    );
    let scale = Vec2::new(
        room.width() as f32 / display_size.x,
        room.height() as f32 / display_size.y,
    );
    let width = (overlay.width() * scale.x).round().max(1.0) as u32;
    let height = (overlay.height() * scale.y).round().max(1.0) as u32;
    let x = (overlay.min.x * scale.x).round() as i64;
    let y = (overlay.min.y * scale.y).round() as i64;

    let artwork = artwork.resize_exact(width, height, FilterType::Lanczos3).to_rgba8();
    let mut composite = room.to_rgba8();
    imageops::overlay(&mut composite, &artwork, x, y);
    log::info!(
        "Composited {}x{} artwork at ({x}, {y}) onto {}x{} room",
        width,
        height,
        composite.width(),
        composite.height()
    );
    Ok(composite)
}

pub fn encode_png(image: &RgbaImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .context("encoding composite as PNG")?;
    Ok(bytes.into_inner())
}

pub fn decode(bytes: &[u8]) -> anyhow::Result<DynamicImage> {
    image::load_from_memory(bytes).context("decoding image")
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;
    use image::Rgba;

    #[test]
    fn test_overlay_scales_to_room_pixels() {
        let room = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255])));
        let artwork =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        // Displayed at half size: the 20x20 box at (10, 10) covers 40x40 at (20, 20).
        let overlay = Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::splat(20.0));

        let out = render(&room, &artwork, overlay, Vec2::new(100.0, 50.0)).unwrap();

        assert_eq!(out.dimensions(), (200, 100));
        assert_eq!(out.get_pixel(19, 19), &Rgba([0, 0, 0, 255]));
        for (x, y) in [(20, 20), (40, 40), (59, 59)] {
            let pixel = out.get_pixel(x, y);
            assert!(pixel[0] > 250 && pixel[1] < 5, "({x}, {y}) is {pixel:?}");
        }
        assert_eq!(out.get_pixel(60, 60), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_unlaid_out_room_is_an_error() {
        let room = DynamicImage::new_rgba8(4, 4);
        let artwork = DynamicImage::new_rgba8(2, 2);
        let overlay = Rect::from_min_size(Pos2::ZERO, Vec2::splat(1.0));
        assert!(render(&room, &artwork, overlay, Vec2::ZERO).is_err());
    }

    #[test]
    fn test_png_round_trip_dimensions() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let decoded = decode(&encode_png(&image).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }
}
