use bevy::prelude::*;

#[derive(Component)]
pub struct ViewerCamera;

#[derive(Component)]
pub struct WorldRoot;
