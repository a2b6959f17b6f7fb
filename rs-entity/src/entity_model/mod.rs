//! Hardcoded entity models (vanilla cuboid layouts).
//!
//! - Geometry lives in Rust statics (parts + cuboids); nothing is parsed at runtime.
//! - Only textures are loaded at runtime, from the texture directory or a skin URL.
//! - Coordinates are vanilla model pixels with +Y pointing down; `mesh` converts.

mod creeper;
mod humanoid;
mod mesh;
mod types;

pub use creeper::*;
pub use humanoid::*;
pub use mesh::*;
pub use types::*;

// Small DSL for cuboid models. `inflate` and `mirror` may be omitted.

#[macro_export]
macro_rules! cube {
    (
        uv: ($u:expr, $v:expr),
        from: ($x:expr, $y:expr, $z:expr),
        size: ($w:expr, $h:expr, $d:expr),
        inflate: $inflate:expr,
        mirror: $mirror:expr $(,)?
    ) => {
        $crate::entity_model::CubeDef {
            uv: [$u as u32, $v as u32],
            from: [$x as f32, $y as f32, $z as f32],
            size: [$w as f32, $h as f32, $d as f32],
            inflate: $inflate as f32,
            mirror: $mirror,
        }
    };
    (
        uv: ($u:expr, $v:expr),
        from: ($x:expr, $y:expr, $z:expr),
        size: ($w:expr, $h:expr, $d:expr),
        inflate: $inflate:expr $(,)?
    ) => {
        $crate::cube! { uv: ($u, $v), from: ($x, $y, $z), size: ($w, $h, $d), inflate: $inflate, mirror: false }
    };
    (
        uv: ($u:expr, $v:expr),
        from: ($x:expr, $y:expr, $z:expr),
        size: ($w:expr, $h:expr, $d:expr),
        mirror: $mirror:expr $(,)?
    ) => {
        $crate::cube! { uv: ($u, $v), from: ($x, $y, $z), size: ($w, $h, $d), inflate: 0.0, mirror: $mirror }
    };
    (
        uv: ($u:expr, $v:expr),
        from: ($x:expr, $y:expr, $z:expr),
        size: ($w:expr, $h:expr, $d:expr) $(,)?
    ) => {
        $crate::cube! { uv: ($u, $v), from: ($x, $y, $z), size: ($w, $h, $d), inflate: 0.0, mirror: false }
    };
}

#[macro_export]
macro_rules! part {
    (
        name: $name:expr,
        parent: $parent:expr,
        pivot: ($x:expr, $y:expr, $z:expr),
        cubes: [ $($cube:expr),* $(,)? ] $(,)?
    ) => {
        $crate::entity_model::PartDef {
            name: $name,
            parent: $parent,
            pivot: [$x as f32, $y as f32, $z as f32],
            cubes: &[$($cube),*],
        }
    };
}
