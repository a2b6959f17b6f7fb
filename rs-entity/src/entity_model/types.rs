#[derive(Debug, Clone, Copy)]
pub struct CubeDef {
    /// Texture offset in pixels (u, v), using vanilla ModelBox layout rules.
    pub uv: [u32; 2],
    /// Lower corner (x, y, z) in model pixels.
    pub from: [f32; 3],
    /// Dimensions (w, h, d) in model pixels.
    pub size: [f32; 3],
    /// Grows the box on every side; used by skin overlay layers.
    pub inflate: f32,
    /// Vanilla mirror flag (affects both geometry and UV winding).
    pub mirror: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PartDef {
    pub name: &'static str,
    /// Index of the parent part, if any.
    pub parent: Option<usize>,
    /// Rotation point in model pixels.
    pub pivot: [f32; 3],
    pub cubes: &'static [CubeDef],
}

#[derive(Debug, Clone, Copy)]
pub struct ModelDef {
    pub name: &'static str,
    /// Texture dimensions in pixels.
    pub tex_size: [u32; 2],
    /// Offset applied at the model root so the feet rest on the proxy origin.
    /// Bevy axes, in model pixels (scaled by 1/16 when spawned).
    pub root_offset_px: [f32; 3],
    pub parts: &'static [PartDef],
}

impl ModelDef {
    /// Parts that produce a mesh; empty pivot-only parts are skipped when spawning.
    pub fn drawable_parts(&self) -> usize {
        self.parts.iter().filter(|part| !part.cubes.is_empty()).count()
    }
}
