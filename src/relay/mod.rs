//! Stateless fan-out relay
//!
//! The relay never simulates anything. It assigns each connection an id,
//! remembers the last position each peer reported (so newcomers get a
//! useful `init`), and forwards every state and chat message to the other
//! connections. A send failure on one peer never affects the others, and a
//! peer that stops reading loses frames once its queue is full.

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::ws::protocol::{ClientMsg, PeerInfo, PlayerId, ServerMsg, WireVec3, SPAWN_POSITION};

/// Frames buffered per connection before new ones are dropped
pub const PEER_QUEUE_CAPACITY: usize = 256;

/// Outbound queue of one connection
pub type PeerSender = mpsc::Sender<ServerMsg>;
pub type PeerReceiver = mpsc::Receiver<ServerMsg>;

/// One connected peer
#[derive(Debug)]
struct Peer {
    tx: PeerSender,
    position: WireVec3,
    velocity: Option<WireVec3>,
}

/// Registry of live connections plus fan-out
pub struct Relay {
    peers: DashMap<PlayerId, Peer>,
    /// Serializes joins and leaves so every newcomer's `init` and every
    /// existing peer's `playerJoined` agree on who is present
    membership: Mutex<()>,
}

/// Handle returned to a connection on join
pub struct Session {
    pub id: PlayerId,
    /// Messages for this connection; `init` is already queued
    pub outbound: PeerReceiver,
}

impl Relay {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            membership: Mutex::new(()),
        }
    }

    /// Register a new connection.
    ///
    /// Queues `init` (listing everyone already here) on the new connection,
    /// then announces the newcomer to everybody else.
    pub fn join(&self) -> Session {
        let (tx, outbound) = mpsc::channel(PEER_QUEUE_CAPACITY);
        let id = PlayerId::generate();

        let _guard = self.membership.lock();

        let players: Vec<PeerInfo> = self
            .peers
            .iter()
            .map(|entry| PeerInfo {
                id: entry.key().clone(),
                position: entry.value().position,
                velocity: entry.value().velocity,
            })
            .collect();
        let existing = players.len();

        // Fresh channel, receiver held by us: cannot fail
        let _ = tx.try_send(ServerMsg::Init {
            id: id.clone(),
            players,
        });

        self.broadcast_except(
            &id,
            ServerMsg::PlayerJoined {
                id: id.clone(),
                position: SPAWN_POSITION,
            },
        );

        self.peers.insert(
            id.clone(),
            Peer {
                tx,
                position: SPAWN_POSITION,
                velocity: None,
            },
        );

        info!(player_id = %id, existing_players = existing, "Player connected");
        Session { id, outbound }
    }

    /// Handle one decoded message from `from`
    pub fn handle(&self, from: &PlayerId, msg: ClientMsg) {
        match msg {
            ClientMsg::Position {
                position,
                velocity,
                is_grappling,
                grapple_point,
                ..
            } => {
                match self.peers.get_mut(from) {
                    Some(mut peer) => {
                        peer.position = position;
                        peer.velocity = Some(velocity);
                    }
                    None => {
                        debug!(player_id = %from, "Position from unregistered peer");
                        return;
                    }
                }

                self.broadcast_except(
                    from,
                    ServerMsg::PlayerMoved {
                        id: from.clone(),
                        position,
                        velocity,
                        is_grappling,
                        grapple_point,
                    },
                );
            }
            ClientMsg::Chat { message, .. } => {
                debug!(player_id = %from, len = message.len(), "Chat");
                // Chat goes to everyone, sender included
                self.broadcast(ServerMsg::Chat {
                    id: from.clone(),
                    message,
                });
            }
        }
    }

    /// Remove a connection and tell everyone else
    pub fn leave(&self, id: &PlayerId) {
        let _guard = self.membership.lock();
        if self.peers.remove(id).is_some() {
            self.broadcast_except(id, ServerMsg::PlayerLeft { id: id.clone() });
            info!(player_id = %id, remaining = self.peers.len(), "Player disconnected");
        }
    }

    pub fn player_count(&self) -> usize {
        self.peers.len()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.peers.contains_key(id)
    }

    /// Last position reported by `id`
    pub fn last_position(&self, id: &PlayerId) -> Option<WireVec3> {
        self.peers.get(id).map(|peer| peer.position)
    }

    fn broadcast(&self, msg: ServerMsg) {
        for entry in self.peers.iter() {
            send_ignoring_errors(entry.key(), &entry.value().tx, msg.clone());
        }
    }

    fn broadcast_except(&self, skip: &PlayerId, msg: ServerMsg) {
        for entry in self.peers.iter().filter(|entry| entry.key() != skip) {
            send_ignoring_errors(entry.key(), &entry.value().tx, msg.clone());
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

/// Never waits on a peer. A full queue drops the frame; a closed one means
/// the writer is gone and its reader will call `leave` shortly.
fn send_ignoring_errors(id: &PlayerId, tx: &PeerSender, msg: ServerMsg) {
    match tx.try_send(msg) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            debug!(player_id = %id, "Peer queue full, dropping message");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(player_id = %id, "Dropped message for closed peer");
        }
    }
}
