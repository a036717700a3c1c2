//! Client side of the relay contract
//!
//! `SyncClient` publishes the local player every tick and keeps a table of
//! remote puppets plus the chat log, updated from inbound relay frames.
//! Remote state is overwritten wholesale; no interpolation.

use std::collections::{HashMap, VecDeque};

use glam::Vec3;
use tracing::{debug, info, warn};

use super::transport::Transport;
use crate::game::Player;
use crate::ws::protocol::{ClientMsg, PeerInfo, PlayerId, ServerMsg, WireVec3};

/// Lines kept in the chat log before the oldest are dropped
pub const CHAT_LOG_CAPACITY: usize = 100;

/// Last known state of another player
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayer {
    pub id: PlayerId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Anchor of the remote player's rope while they are swinging
    pub grapple_anchor: Option<Vec3>,
}

impl RemotePlayer {
    fn at(id: PlayerId, position: WireVec3) -> Self {
        Self {
            id,
            position: position.into(),
            velocity: Vec3::ZERO,
            grapple_anchor: None,
        }
    }
}

impl From<PeerInfo> for RemotePlayer {
    fn from(peer: PeerInfo) -> Self {
        Self {
            id: peer.id,
            position: peer.position.into(),
            velocity: peer.velocity.map(Vec3::from).unwrap_or(Vec3::ZERO),
            grapple_anchor: None,
        }
    }
}

/// One chat message as received from the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub id: PlayerId,
    pub message: String,
}

/// Relay synchronization state for one local player
pub struct SyncClient<T> {
    /// `None` when the relay could not be reached; the game runs offline
    transport: Option<T>,
    local_id: Option<PlayerId>,
    remotes: HashMap<PlayerId, RemotePlayer>,
    chat: VecDeque<ChatLine>,
}

impl<T: Transport> SyncClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            local_id: None,
            remotes: HashMap::new(),
            chat: VecDeque::new(),
        }
    }

    /// Client with no relay; publish and chat are no-ops
    pub fn offline() -> Self {
        Self {
            transport: None,
            local_id: None,
            remotes: HashMap::new(),
            chat: VecDeque::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_open())
    }

    /// Id assigned by the relay's `init`
    pub fn local_id(&self) -> Option<&PlayerId> {
        self.local_id.as_ref()
    }

    pub fn remote(&self, id: &PlayerId) -> Option<&RemotePlayer> {
        self.remotes.get(id)
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.remotes.values()
    }

    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }

    /// Chat lines, oldest first
    pub fn chat_log(&self) -> impl Iterator<Item = &ChatLine> {
        self.chat.iter()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Apply every queued inbound frame. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(frame) = self.transport.as_mut().and_then(|t| t.try_recv()) else {
                break;
            };
            match ServerMsg::decode(&frame) {
                Ok(msg) => {
                    self.apply(msg);
                    applied += 1;
                }
                Err(e) => warn!(error = %e, "Dropping malformed relay frame"),
            }
        }
        applied
    }

    /// Update local state from one relay message
    pub fn apply(&mut self, msg: ServerMsg) {
        match msg {
            ServerMsg::Init { id, players } => {
                info!(player_id = %id, players = players.len(), "Joined relay");
                for peer in players {
                    if peer.id != id {
                        self.remotes.insert(peer.id.clone(), peer.into());
                    }
                }
                self.local_id = Some(id);
            }
            ServerMsg::PlayerJoined { id, position } => {
                if !self.is_local(&id) {
                    debug!(player_id = %id, "Player joined");
                    self.remotes.insert(id.clone(), RemotePlayer::at(id, position));
                }
            }
            ServerMsg::PlayerMoved {
                id,
                position,
                velocity,
                is_grappling,
                grapple_point,
            } => {
                if !self.is_local(&id) {
                    let anchor = grapple_point.filter(|_| is_grappling).map(Vec3::from);
                    self.remotes.insert(
                        id.clone(),
                        RemotePlayer {
                            id,
                            position: position.into(),
                            velocity: velocity.into(),
                            grapple_anchor: anchor,
                        },
                    );
                }
            }
            ServerMsg::PlayerLeft { id } => {
                if self.remotes.remove(&id).is_some() {
                    debug!(player_id = %id, "Player left");
                }
            }
            ServerMsg::Chat { id, message } => {
                if self.chat.len() == CHAT_LOG_CAPACITY {
                    self.chat.pop_front();
                }
                self.chat.push_back(ChatLine { id, message });
            }
        }
    }

    /// Send the local player's state; skipped while closed or before `init`
    pub fn publish(&mut self, player: &Player) {
        let Some(id) = self.local_id.clone() else {
            return;
        };
        let msg = ClientMsg::Position {
            id: Some(id),
            position: player.position.into(),
            velocity: player.velocity.into(),
            is_grappling: player.is_grappling(),
            grapple_point: player.grapple().map(|g| g.anchor.into()),
        };
        self.send(&msg);
    }

    /// Send a chat line; it shows up in the log once the relay echoes it.
    /// Skipped before `init`, like `publish`.
    pub fn send_chat(&mut self, message: impl Into<String>) {
        let Some(id) = self.local_id.clone() else {
            return;
        };
        let msg = ClientMsg::Chat {
            id: Some(id),
            message: message.into(),
        };
        self.send(&msg);
    }

    fn send(&mut self, msg: &ClientMsg) {
        let Some(transport) = self.transport.as_mut().filter(|t| t.is_open()) else {
            return;
        };
        if let Err(e) = transport.send(msg) {
            debug!(error = %e, "Relay send skipped");
        }
    }

    fn is_local(&self, id: &PlayerId) -> bool {
        self.local_id.as_ref() == Some(id)
    }
}
