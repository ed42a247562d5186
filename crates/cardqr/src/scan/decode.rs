//! QR detection in greyscale frames.

use image::GrayImage;
use tracing::{debug, trace};

/// Decode the first QR code found anywhere in `frame`.
#[must_use]
pub fn decode_luma(frame: &GrayImage) -> Option<String> {
    decode_region(frame, 0, 0, frame.width(), frame.height())
}

/// Decode a frame the way a camera viewfinder does: the centered `qrbox`
/// square first, then the whole frame.
#[must_use]
pub fn decode_frame(frame: &GrayImage, qrbox: u32) -> Option<String> {
    if qrbox > 0 && frame.width() > qrbox && frame.height() > qrbox {
        let x = (frame.width() - qrbox) / 2;
        let y = (frame.height() - qrbox) / 2;
        if let Some(text) = decode_region(frame, x, y, qrbox, qrbox) {
            return Some(text);
        }
        trace!("Nothing in the scan box, trying the full frame");
    }
    decode_luma(frame)
}

fn decode_region(frame: &GrayImage, x0: u32, y0: u32, width: u32, height: u32) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = (x as u32, y as u32);
            frame.get_pixel(x0 + x, y0 + y).0[0]
        },
    );

    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_, text)) => return Some(text),
            Err(e) => debug!("Found a grid that didn't decode: {}", e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ModuleRasterizer, RenderOptions, RenderedQr};
    use image::Luma;

    fn code(text: &str) -> GrayImage {
        let qr = RenderedQr::render("qr-code-test", text, RenderOptions::default()).unwrap();
        ModuleRasterizer::draw(&qr, 1).unwrap()
    }

    #[test]
    fn test_decodes_full_frame() {
        let frame = code("BEGIN:VCARD");
        assert_eq!(decode_luma(&frame).as_deref(), Some("BEGIN:VCARD"));
    }

    #[test]
    fn test_blank_frame() {
        let frame = GrayImage::from_pixel(300, 300, Luma([255]));
        assert!(decode_luma(&frame).is_none());
        assert!(decode_frame(&frame, 250).is_none());
    }

    #[test]
    fn test_code_inside_scan_box() {
        let qr = code("centered");
        let mut frame = GrayImage::from_pixel(640, 480, Luma([255]));
        let x = (640 - qr.width()) / 2;
        let y = (480 - qr.height()) / 2;
        image::imageops::replace(&mut frame, &qr, i64::from(x), i64::from(y));

        assert_eq!(decode_frame(&frame, 250).as_deref(), Some("centered"));
    }

    #[test]
    fn test_code_outside_scan_box_falls_back() {
        let qr = code("corner");
        let mut frame = GrayImage::from_pixel(900, 700, Luma([255]));
        image::imageops::replace(&mut frame, &qr, 0, 0);

        assert_eq!(decode_frame(&frame, 250).as_deref(), Some("corner"));
    }
}
