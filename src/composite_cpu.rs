use crate::{
    core::FrameRGBA,
    error::{BackdropError, BackdropResult},
};

pub type PremulRgba8 = [u8; 4];

/// Source-over of one premultiplied pixel.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(src[3]);

    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Paints `content` above the animation in `background` (content on top).
pub fn overlay_content(background: &mut FrameRGBA, content: &FrameRGBA) -> BackdropResult<()> {
    if background.width != content.width || background.height != content.height {
        return Err(BackdropError::validation(format!(
            "content is {}x{} but the animation is {}x{}",
            content.width, content.height, background.width, background.height
        )));
    }
    if !background.premultiplied || !content.premultiplied {
        return Err(BackdropError::validation(
            "overlay expects premultiplied frames",
        ));
    }
    if background.data.len() != content.data.len() || !background.data.len().is_multiple_of(4) {
        return Err(BackdropError::validation(
            "overlay expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in background
        .data
        .chunks_exact_mut(4)
        .zip(content.data.chunks_exact(4))
    {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Straight RGBA8 bytes (as decoded from PNG) to premultiplied.
pub fn premultiply_in_place(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = mul_div255(u16::from(*c), a);
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(px: [u8; 4]) -> FrameRGBA {
        FrameRGBA {
            width: 1,
            height: 1,
            data: px.to_vec(),
            premultiplied: true,
        }
    }

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        assert_eq!(over(dst, [0, 0, 0, 0]), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let src = [255, 0, 0, 255];
        assert_eq!(over([0, 0, 255, 255], src), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let src = [100, 110, 120, 200];
        assert_eq!(over([0, 0, 0, 0], src), src);
    }

    #[test]
    fn content_covers_animation() {
        let mut bg = frame([0, 0, 255, 255]);
        overlay_content(&mut bg, &frame([255, 0, 0, 255])).unwrap();
        assert_eq!(bg.data, vec![255, 0, 0, 255]);

        let mut bg = frame([0, 0, 255, 255]);
        overlay_content(&mut bg, &frame([0, 0, 0, 0])).unwrap();
        assert_eq!(bg.data, vec![0, 0, 255, 255]);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let mut bg = FrameRGBA::transparent(crate::core::Dimensions::new(2, 1));
        assert!(overlay_content(&mut bg, &frame([0, 0, 0, 0])).is_err());
    }

    #[test]
    fn premultiply_scales_color_by_alpha() {
        let mut px = [255u8, 128, 0, 128];
        premultiply_in_place(&mut px);
        assert_eq!(px, [128, 64, 0, 128]);
    }
}
