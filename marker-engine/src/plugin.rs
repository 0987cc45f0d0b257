use std::marker::PhantomData;

use bevy::app::{App, Plugin, Update};
use bevy::ecs::system::{NonSendMut, Res};
use bevy::log::info;
use bevy::time::Time;

use crate::engine::core::scene::MarkerScene;
use crate::engine::render::RenderEngine;

/// Advances a non-send [`MarkerScene<E>`] resource once per `Update`.
///
/// The scene itself is inserted by the host with
/// `insert_non_send_resource`, since handlers and render engines are
/// usually tied to the main thread.
pub struct MarkerScenePlugin<E> {
    engine: PhantomData<fn() -> E>,
}

impl<E> Default for MarkerScenePlugin<E> {
    fn default() -> Self {
        Self { engine: PhantomData }
    }
}

impl<E: RenderEngine + 'static> Plugin for MarkerScenePlugin<E> {
    fn build(&self, app: &mut App) {
        info!("Marker scene plugin registered");
        app.add_systems(Update, advance_marker_scene::<E>);
    }
}

/// Ticks the scene at Bevy's elapsed time. Without a `Time` resource the
/// scene clock is held where it is.
pub fn advance_marker_scene<E: RenderEngine + 'static>(
    time: Option<Res<Time>>,
    scene: Option<NonSendMut<MarkerScene<E>>>,
) {
    let Some(mut scene) = scene else {
        return;
    };
    let now = time.map_or(scene.clock(), |time| time.elapsed_secs_f64());
    scene.tick(now);
}
