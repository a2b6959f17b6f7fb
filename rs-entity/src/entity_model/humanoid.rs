use super::{ModelDef, PartDef};
use crate::{cube, part};

const HEAD: usize = 0;
const BODY: usize = 2;
const RIGHT_ARM: usize = 4;
const LEFT_ARM: usize = 6;
const RIGHT_LEG: usize = 8;
const LEFT_LEG: usize = 10;

const OVERLAY: f32 = 0.25;
const HAT: f32 = 0.5;

/// Pre-1.8 humanoid layout: one limb texture region, left limbs mirrored, hat only.
/// Shared by legacy 64x32 player skins and the zombie family.
static LEGACY_HUMANOID_PARTS: [PartDef; 7] = [
    part! {
        name: "head",
        parent: None,
        pivot: (0.0, 0.0, 0.0),
        cubes: [cube! { uv: (0, 0), from: (-4.0, -8.0, -4.0), size: (8.0, 8.0, 8.0) }],
    },
    part! {
        name: "hat",
        parent: Some(HEAD),
        pivot: (0.0, 0.0, 0.0),
        cubes: [cube! { uv: (32, 0), from: (-4.0, -8.0, -4.0), size: (8.0, 8.0, 8.0), inflate: HAT }],
    },
    part! {
        name: "body",
        parent: None,
        pivot: (0.0, 0.0, 0.0),
        cubes: [cube! { uv: (16, 16), from: (-4.0, 0.0, -2.0), size: (8.0, 12.0, 4.0) }],
    },
    part! {
        name: "right_arm",
        parent: None,
        pivot: (-5.0, 2.0, 0.0),
        cubes: [cube! { uv: (40, 16), from: (-3.0, -2.0, -2.0), size: (4.0, 12.0, 4.0) }],
    },
    part! {
        name: "left_arm",
        parent: None,
        pivot: (5.0, 2.0, 0.0),
        cubes: [cube! { uv: (40, 16), from: (-1.0, -2.0, -2.0), size: (4.0, 12.0, 4.0), mirror: true }],
    },
    part! {
        name: "right_leg",
        parent: None,
        pivot: (-1.9, 12.0, 0.0),
        cubes: [cube! { uv: (0, 16), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0) }],
    },
    part! {
        name: "left_leg",
        parent: None,
        pivot: (1.9, 12.0, 0.0),
        cubes: [cube! { uv: (0, 16), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0), mirror: true }],
    },
];

pub static PLAYER_LEGACY_MODEL: ModelDef = ModelDef {
    name: "player_legacy",
    tex_size: [64, 32],
    root_offset_px: [0.0, 24.0, 0.0],
    parts: &LEGACY_HUMANOID_PARTS,
};

pub static ZOMBIE_MODEL: ModelDef = ModelDef {
    name: "zombie",
    tex_size: [64, 64],
    root_offset_px: [0.0, 24.0, 0.0],
    parts: &LEGACY_HUMANOID_PARTS,
};

/// 1.8+ 64x64 skins: separate left limb regions and an overlay layer per part.
/// Every base part is immediately followed by its overlay.
pub static PLAYER_CLASSIC_MODEL: ModelDef = ModelDef {
    name: "player_classic",
    tex_size: [64, 64],
    root_offset_px: [0.0, 24.0, 0.0],
    parts: &[
        part! {
            name: "head",
            parent: None,
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (0, 0), from: (-4.0, -8.0, -4.0), size: (8.0, 8.0, 8.0) }],
        },
        part! {
            name: "hat",
            parent: Some(HEAD),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (32, 0), from: (-4.0, -8.0, -4.0), size: (8.0, 8.0, 8.0), inflate: HAT }],
        },
        part! {
            name: "body",
            parent: None,
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (16, 16), from: (-4.0, 0.0, -2.0), size: (8.0, 12.0, 4.0) }],
        },
        part! {
            name: "jacket",
            parent: Some(BODY),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (16, 32), from: (-4.0, 0.0, -2.0), size: (8.0, 12.0, 4.0), inflate: OVERLAY }],
        },
        part! {
            name: "right_arm",
            parent: None,
            pivot: (-5.0, 2.0, 0.0),
            cubes: [cube! { uv: (40, 16), from: (-3.0, -2.0, -2.0), size: (4.0, 12.0, 4.0) }],
        },
        part! {
            name: "right_sleeve",
            parent: Some(RIGHT_ARM),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (40, 32), from: (-3.0, -2.0, -2.0), size: (4.0, 12.0, 4.0), inflate: OVERLAY }],
        },
        part! {
            name: "left_arm",
            parent: None,
            pivot: (5.0, 2.0, 0.0),
            cubes: [cube! { uv: (32, 48), from: (-1.0, -2.0, -2.0), size: (4.0, 12.0, 4.0) }],
        },
        part! {
            name: "left_sleeve",
            parent: Some(LEFT_ARM),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (48, 48), from: (-1.0, -2.0, -2.0), size: (4.0, 12.0, 4.0), inflate: OVERLAY }],
        },
        part! {
            name: "right_leg",
            parent: None,
            pivot: (-1.9, 12.0, 0.0),
            cubes: [cube! { uv: (0, 16), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0) }],
        },
        part! {
            name: "right_pants",
            parent: Some(RIGHT_LEG),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (0, 32), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0), inflate: OVERLAY }],
        },
        part! {
            name: "left_leg",
            parent: None,
            pivot: (1.9, 12.0, 0.0),
            cubes: [cube! { uv: (16, 48), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0) }],
        },
        part! {
            name: "left_pants",
            parent: Some(LEFT_LEG),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (0, 48), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0), inflate: OVERLAY }],
        },
    ],
};

/// "Alex" arms: three pixels wide, pivot half a pixel lower.
pub static PLAYER_SLIM_MODEL: ModelDef = ModelDef {
    name: "player_slim",
    tex_size: [64, 64],
    root_offset_px: [0.0, 24.0, 0.0],
    parts: &[
        part! {
            name: "head",
            parent: None,
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (0, 0), from: (-4.0, -8.0, -4.0), size: (8.0, 8.0, 8.0) }],
        },
        part! {
            name: "hat",
            parent: Some(HEAD),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (32, 0), from: (-4.0, -8.0, -4.0), size: (8.0, 8.0, 8.0), inflate: HAT }],
        },
        part! {
            name: "body",
            parent: None,
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (16, 16), from: (-4.0, 0.0, -2.0), size: (8.0, 12.0, 4.0) }],
        },
        part! {
            name: "jacket",
            parent: Some(BODY),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (16, 32), from: (-4.0, 0.0, -2.0), size: (8.0, 12.0, 4.0), inflate: OVERLAY }],
        },
        part! {
            name: "right_arm",
            parent: None,
            pivot: (-5.0, 2.5, 0.0),
            cubes: [cube! { uv: (40, 16), from: (-2.0, -2.0, -2.0), size: (3.0, 12.0, 4.0) }],
        },
        part! {
            name: "right_sleeve",
            parent: Some(RIGHT_ARM),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (40, 32), from: (-2.0, -2.0, -2.0), size: (3.0, 12.0, 4.0), inflate: OVERLAY }],
        },
        part! {
            name: "left_arm",
            parent: None,
            pivot: (5.0, 2.5, 0.0),
            cubes: [cube! { uv: (32, 48), from: (-1.0, -2.0, -2.0), size: (3.0, 12.0, 4.0) }],
        },
        part! {
            name: "left_sleeve",
            parent: Some(LEFT_ARM),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (48, 48), from: (-1.0, -2.0, -2.0), size: (3.0, 12.0, 4.0), inflate: OVERLAY }],
        },
        part! {
            name: "right_leg",
            parent: None,
            pivot: (-1.9, 12.0, 0.0),
            cubes: [cube! { uv: (0, 16), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0) }],
        },
        part! {
            name: "right_pants",
            parent: Some(RIGHT_LEG),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (0, 32), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0), inflate: OVERLAY }],
        },
        part! {
            name: "left_leg",
            parent: None,
            pivot: (1.9, 12.0, 0.0),
            cubes: [cube! { uv: (16, 48), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0) }],
        },
        part! {
            name: "left_pants",
            parent: Some(LEFT_LEG),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (0, 48), from: (-2.0, 0.0, -2.0), size: (4.0, 12.0, 4.0), inflate: OVERLAY }],
        },
    ],
};

/// Skeleton family: thin 2x12x2 limbs on a 64x32 texture.
pub static SKELETON_MODEL: ModelDef = ModelDef {
    name: "skeleton",
    tex_size: [64, 32],
    root_offset_px: [0.0, 24.0, 0.0],
    parts: &[
        part! {
            name: "head",
            parent: None,
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (0, 0), from: (-4.0, -8.0, -4.0), size: (8.0, 8.0, 8.0) }],
        },
        part! {
            name: "hat",
            parent: Some(HEAD),
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (32, 0), from: (-4.0, -8.0, -4.0), size: (8.0, 8.0, 8.0), inflate: HAT }],
        },
        part! {
            name: "body",
            parent: None,
            pivot: (0.0, 0.0, 0.0),
            cubes: [cube! { uv: (16, 16), from: (-4.0, 0.0, -2.0), size: (8.0, 12.0, 4.0) }],
        },
        part! {
            name: "right_arm",
            parent: None,
            pivot: (-5.0, 2.0, 0.0),
            cubes: [cube! { uv: (40, 16), from: (-1.0, -2.0, -1.0), size: (2.0, 12.0, 2.0) }],
        },
        part! {
            name: "left_arm",
            parent: None,
            pivot: (5.0, 2.0, 0.0),
            cubes: [cube! { uv: (40, 16), from: (-1.0, -2.0, -1.0), size: (2.0, 12.0, 2.0), mirror: true }],
        },
        part! {
            name: "right_leg",
            parent: None,
            pivot: (-2.0, 12.0, 0.0),
            cubes: [cube! { uv: (0, 16), from: (-1.0, 0.0, -1.0), size: (2.0, 12.0, 2.0) }],
        },
        part! {
            name: "left_leg",
            parent: None,
            pivot: (2.0, 12.0, 0.0),
            cubes: [cube! { uv: (0, 16), from: (-1.0, 0.0, -1.0), size: (2.0, 12.0, 2.0), mirror: true }],
        },
    ],
};
