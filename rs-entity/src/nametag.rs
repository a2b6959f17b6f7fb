//! Username labels: rasterized once on the CPU with `ab_glyph`, shown on a quad that
//! turns toward the camera every frame.

use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use bevy::prelude::*;
use thiserror::Error;

pub const FONT_PX: f32 = 200.0;
pub const PADDING_PX: u32 = 25;
/// World-space height of every label.
pub const QUAD_HEIGHT: f32 = 0.25;
/// Gap between the top of the entity and the label.
pub const HEIGHT_OFFSET: f32 = 0.5;
pub const MAX_SURFACE_WIDTH: u32 = 8192;

/// rgba(0, 0, 0, 0.2)
const BACKING: [u8; 4] = [0, 0, 0, 51];

#[derive(Debug, Error, PartialEq)]
pub enum NametagError {
    #[error("nametag surface would be {width}px wide (max {MAX_SURFACE_WIDTH})")]
    TooWide { width: u32 },
    #[error("font data could not be parsed")]
    InvalidFont,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NametagLayout {
    pub surface_width: u32,
    pub surface_height: u32,
    pub quad_width: f32,
    pub quad_height: f32,
}

impl NametagLayout {
    pub fn for_text_width(text_width: f32) -> Result<Self, NametagError> {
        let surface_width = text_width.max(0.0).ceil() as u32 + PADDING_PX;
        if surface_width > MAX_SURFACE_WIDTH {
            return Err(NametagError::TooWide {
                width: surface_width,
            });
        }
        Ok(Self {
            surface_width,
            surface_height: FONT_PX as u32,
            quad_width: text_width / FONT_PX * QUAD_HEIGHT,
            quad_height: QUAD_HEIGHT,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NametagRaster {
    pub layout: NametagLayout,
    pub rgba: Vec<u8>,
}

/// Marker for label quads; `billboard_nametags` keeps them facing the camera.
#[derive(Component, Debug, Clone, Copy)]
pub struct Nametag;

/// Holds the bootstrap font. Without one, labels are silently skipped.
#[derive(Resource, Default, Clone)]
pub struct NametagRenderer {
    font: Option<FontArc>,
}

impl NametagRenderer {
    pub fn new(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    pub fn from_font_bytes(bytes: Vec<u8>) -> Result<Self, NametagError> {
        let font = FontArc::try_from_vec(bytes).map_err(|_| NametagError::InvalidFont)?;
        Ok(Self::new(font))
    }

    pub fn is_enabled(&self) -> bool {
        self.font.is_some()
    }

    /// White text centered on a translucent black panel.
    pub fn rasterize(&self, text: &str) -> Result<Option<NametagRaster>, NametagError> {
        let Some(font) = &self.font else {
            return Ok(None);
        };
        let scale = PxScale::from(FONT_PX);
        let scaled = font.as_scaled(scale);

        let mut glyphs: Vec<Glyph> = Vec::with_capacity(text.len());
        let mut caret = 0.0f32;
        let mut prev = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, point(caret, 0.0)));
            caret += scaled.h_advance(id);
            prev = Some(id);
        }

        let layout = NametagLayout::for_text_width(caret)?;
        let (width, height) = (layout.surface_width, layout.surface_height);
        let mut rgba = backing_panel(width, height);

        // Centered horizontally, baseline placed so the em box sits in the middle.
        let origin_x = (width as f32 - caret) / 2.0;
        let baseline = height as f32 / 2.0 + (scaled.ascent() + scaled.descent()) / 2.0;
        for mut glyph in glyphs {
            glyph.position = point(glyph.position.x + origin_x, baseline);
            let Some(outline) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outline.px_bounds();
            outline.draw(|x, y, coverage| {
                let px = bounds.min.x as i32 + x as i32;
                let py = bounds.min.y as i32 + y as i32;
                if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                    return;
                }
                let idx = (py as usize * width as usize + px as usize) * 4;
                blend_text_pixel(&mut rgba[idx..idx + 4], coverage);
            });
        }

        Ok(Some(NametagRaster { layout, rgba }))
    }
}

pub fn backing_panel(width: u32, height: u32) -> Vec<u8> {
    BACKING.repeat(width as usize * height as usize)
}

/// Source-over of opaque white at `coverage` onto a straight-alpha pixel.
pub fn blend_text_pixel(pixel: &mut [u8], coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0);
    let dst_alpha = pixel[3] as f32 / 255.0;
    let out_alpha = coverage + dst_alpha * (1.0 - coverage);
    if out_alpha <= 0.0 {
        return;
    }
    for channel in &mut pixel[..3] {
        let dst = *channel as f32 / 255.0;
        let out = (coverage + dst * dst_alpha * (1.0 - coverage)) / out_alpha;
        *channel = (out * 255.0).round() as u8;
    }
    pixel[3] = (out_alpha * 255.0).round() as u8;
}

/// Local rotation that makes a label under `parent` share the camera's world rotation.
pub fn billboard_rotation(parent: Quat, camera: Quat) -> Quat {
    parent.inverse() * camera
}

/// Runs after interpolation and reads the proxy's local `Transform`, which already
/// holds this frame's yaw. Proxy roots sit under an unrotated scene container.
pub fn billboard_nametags(
    cameras: Query<&GlobalTransform, With<Camera3d>>,
    parents: Query<&Transform, Without<Nametag>>,
    mut tags: Query<(&mut Transform, &ChildOf), With<Nametag>>,
) {
    let Some(camera) = cameras.iter().next() else {
        return;
    };
    let (_, camera_rotation, _) = camera.to_scale_rotation_translation();
    for (mut transform, child_of) in &mut tags {
        let parent_rotation = parents
            .get(child_of.parent())
            .map(|parent| parent.rotation)
            .unwrap_or(Quat::IDENTITY);
        transform.rotation = billboard_rotation(parent_rotation, camera_rotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_keeps_the_label_aspect() {
        let layout = NametagLayout::for_text_width(400.0).unwrap();
        assert_eq!(layout.surface_width, 425);
        assert_eq!(layout.surface_height, 200);
        assert!((layout.quad_width - 0.5).abs() < 1e-6);
        assert_eq!(layout.quad_height, 0.25);

        let fractional = NametagLayout::for_text_width(100.2).unwrap();
        assert_eq!(fractional.surface_width, 126);
    }

    #[test]
    fn oversized_labels_are_rejected() {
        assert!(NametagLayout::for_text_width(8167.0).is_ok());
        assert_eq!(
            NametagLayout::for_text_width(8168.0),
            Err(NametagError::TooWide { width: 8193 })
        );
    }

    #[test]
    fn full_coverage_is_opaque_white() {
        let mut panel = backing_panel(2, 1);
        assert_eq!(panel, vec![0, 0, 0, 51, 0, 0, 0, 51]);

        blend_text_pixel(&mut panel[..4], 1.0);
        assert_eq!(&panel[..4], &[255, 255, 255, 255]);

        blend_text_pixel(&mut panel[4..], 0.0);
        assert_eq!(&panel[4..], &[0, 0, 0, 51]);
    }

    #[test]
    fn partial_coverage_lightens_and_thickens() {
        let mut pixel = BACKING;
        blend_text_pixel(&mut pixel, 0.5);
        assert!(pixel[0] > 200);
        assert!(pixel[3] > 51 && pixel[3] < 255);
    }

    #[test]
    fn label_cancels_the_proxy_yaw() {
        let parent = Quat::from_rotation_y(1.2);
        let camera = Quat::from_rotation_x(-0.6) * Quat::from_rotation_y(0.3);
        let world = parent * billboard_rotation(parent, camera);
        assert!(world.angle_between(camera) < 1e-5);
        assert!(billboard_rotation(Quat::IDENTITY, camera).angle_between(camera) < 1e-5);
    }

    #[test]
    fn disabled_renderer_produces_nothing() {
        let renderer = NametagRenderer::default();
        assert!(!renderer.is_enabled());
        assert!(renderer.rasterize("Alice").unwrap().is_none());
        assert!(matches!(
            NametagRenderer::from_font_bytes(vec![1, 2, 3]),
            Err(NametagError::InvalidFont)
        ));
    }
}
