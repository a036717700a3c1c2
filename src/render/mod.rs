//! Puppet presentation
//!
//! The 3D scene itself lives outside this crate. `SceneRenderer` is the
//! seam: a renderer only has to add, remove and move meshes by key.
//! `PuppetPresenter` reconciles the renderer with the sync client's remote
//! table and the local player's rope and grapple indicator every frame.

use std::collections::HashSet;

use glam::{Quat, Vec3};
use tracing::trace;

use crate::game::Simulation;
use crate::net::{RemotePlayer, SyncClient, Transport};
use crate::ws::protocol::PlayerId;

/// Identity of one mesh in the scene
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MeshKey {
    /// Body of a remote player
    Remote(PlayerId),
    /// Rope of a remote player, present while they swing
    RemoteRope(PlayerId),
    /// Local player's rope
    LocalRope,
    /// Marker at the current grapple target
    Indicator,
}

/// Placement of a mesh in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Scene side of the presenter
pub trait SceneRenderer {
    fn add_mesh(&mut self, key: &MeshKey);
    fn remove_mesh(&mut self, key: &MeshKey);
    fn update_transform(&mut self, key: &MeshKey, transform: Transform);
}

/// Transform for a unit-length rope mesh laid along +Y, stretched from
/// `from` to `anchor`
pub fn rope_transform(from: Vec3, anchor: Vec3) -> Transform {
    let span = anchor - from;
    let length = span.length();
    let rotation = if length > f32::EPSILON {
        Quat::from_rotation_arc(Vec3::Y, span / length)
    } else {
        Quat::IDENTITY
    };
    Transform {
        translation: from + span * 0.5,
        rotation,
        scale: Vec3::new(1.0, length, 1.0),
    }
}

/// Keeps a renderer's meshes in step with the game state
#[derive(Debug, Default)]
pub struct PuppetPresenter {
    live: HashSet<MeshKey>,
}

impl PuppetPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes currently shown
    pub fn mesh_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_shown(&self, key: &MeshKey) -> bool {
        self.live.contains(key)
    }

    /// Reconcile everything: local rope and indicator from the simulation,
    /// remote bodies and ropes from the sync client
    pub fn present<T: Transport, R: SceneRenderer>(
        &mut self,
        sim: &Simulation,
        sync: &SyncClient<T>,
        renderer: &mut R,
    ) {
        let mut wanted: Vec<(MeshKey, Transform)> = Vec::new();

        let player = sim.player();
        if let Some(grapple) = player.grapple() {
            wanted.push((MeshKey::LocalRope, rope_transform(player.position, grapple.anchor)));
        }
        if let Some(hit) = sim.target() {
            wanted.push((MeshKey::Indicator, Transform::from_translation(hit.point)));
        }
        for remote in sync.remotes() {
            wanted.extend(remote_meshes(remote));
        }

        self.apply(wanted, renderer);
    }

    /// Show exactly `wanted`, removing anything else previously shown
    pub fn apply<R: SceneRenderer>(&mut self, wanted: Vec<(MeshKey, Transform)>, renderer: &mut R) {
        let keep: HashSet<MeshKey> = wanted.iter().map(|(key, _)| key.clone()).collect();

        let stale: Vec<MeshKey> = self.live.difference(&keep).cloned().collect();
        for key in stale {
            trace!(?key, "Removing mesh");
            renderer.remove_mesh(&key);
            self.live.remove(&key);
        }

        for (key, transform) in wanted {
            if self.live.insert(key.clone()) {
                trace!(?key, "Adding mesh");
                renderer.add_mesh(&key);
            }
            renderer.update_transform(&key, transform);
        }
    }
}

fn remote_meshes(remote: &RemotePlayer) -> impl Iterator<Item = (MeshKey, Transform)> {
    let body = (
        MeshKey::Remote(remote.id.clone()),
        Transform::from_translation(remote.position),
    );
    let rope = remote
        .grapple_anchor
        .map(|anchor| (MeshKey::RemoteRope(remote.id.clone()), rope_transform(remote.position, anchor)));
    std::iter::once(body).chain(rope)
}

/// Renderer that only logs, for headless runs
#[derive(Debug, Default)]
pub struct TracingRenderer {
    meshes: usize,
}

impl TracingRenderer {
    pub fn mesh_count(&self) -> usize {
        self.meshes
    }
}

impl SceneRenderer for TracingRenderer {
    fn add_mesh(&mut self, key: &MeshKey) {
        self.meshes += 1;
        tracing::debug!(?key, meshes = self.meshes, "Mesh added");
    }

    fn remove_mesh(&mut self, key: &MeshKey) {
        self.meshes = self.meshes.saturating_sub(1);
        tracing::debug!(?key, meshes = self.meshes, "Mesh removed");
    }

    fn update_transform(&mut self, key: &MeshKey, transform: Transform) {
        trace!(?key, translation = ?transform.translation, "Mesh moved");
    }
}
