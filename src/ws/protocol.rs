//! WebSocket protocol message definitions
//! These are the wire types for client-relay communication

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque per-connection identity assigned by the relay
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{x, y, z}` vector as it appears on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WireVec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Where the relay places a player it has not heard from yet
pub const SPAWN_POSITION: WireVec3 = WireVec3::new(0.0, 2.0, 0.0);

/// Messages sent from client to relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Local motion snapshot, sent every tick
    Position {
        /// Echo of the id from `init`; the relay stamps its own id anyway
        id: Option<PlayerId>,
        position: WireVec3,
        velocity: WireVec3,
        #[serde(rename = "isGrappling")]
        is_grappling: bool,
        #[serde(rename = "grapplePoint")]
        grapple_point: Option<WireVec3>,
    },

    /// Chat line
    Chat {
        id: Option<PlayerId>,
        message: String,
    },
}

/// Messages sent from relay to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// First message on a new connection: the assigned id and who is here
    Init {
        id: PlayerId,
        players: Vec<PeerInfo>,
    },

    /// Another player connected
    PlayerJoined {
        id: PlayerId,
        position: WireVec3,
    },

    /// Another player's motion snapshot
    PlayerMoved {
        id: PlayerId,
        position: WireVec3,
        velocity: WireVec3,
        #[serde(rename = "isGrappling")]
        is_grappling: bool,
        #[serde(rename = "grapplePoint")]
        grapple_point: Option<WireVec3>,
    },

    /// A player disconnected
    PlayerLeft {
        id: PlayerId,
    },

    /// Chat line from `id`
    Chat {
        id: PlayerId,
        message: String,
    },
}

/// Existing player listed in `init`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: PlayerId,
    pub position: WireVec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<WireVec3>,
}

/// Wire encode/decode failures
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ClientMsg {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerMsg {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_position_wire_shape() {
        let msg = ClientMsg::Position {
            id: Some(PlayerId::from("abc")),
            position: WireVec3::new(1.0, 2.0, 3.0),
            velocity: WireVec3::new(0.5, 0.0, -0.5),
            is_grappling: true,
            grapple_point: Some(WireVec3::new(4.0, 30.0, 6.0)),
        };
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(
            value,
            json!({
                "type": "position",
                "id": "abc",
                "position": {"x": 1.0, "y": 2.0, "z": 3.0},
                "velocity": {"x": 0.5, "y": 0.0, "z": -0.5},
                "isGrappling": true,
                "grapplePoint": {"x": 4.0, "y": 30.0, "z": 6.0}
            })
        );
    }

    #[test]
    fn test_absent_grapple_point_is_null() {
        let msg = ServerMsg::PlayerMoved {
            id: PlayerId::from("p1"),
            position: WireVec3::default(),
            velocity: WireVec3::default(),
            is_grappling: false,
            grapple_point: None,
        };
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["type"], "playerMoved");
        assert!(value["grapplePoint"].is_null());
    }

    #[test]
    fn test_decode_browser_frames() {
        let chat = ClientMsg::decode(r#"{"type":"chat","id":"xyz","message":"hi there"}"#)
            .expect("chat");
        assert_eq!(
            chat,
            ClientMsg::Chat {
                id: Some(PlayerId::from("xyz")),
                message: "hi there".to_string()
            }
        );

        // grapplePoint omitted entirely still decodes
        let pos = ClientMsg::decode(
            r#"{"type":"position","position":{"x":0,"y":2,"z":0},"velocity":{"x":0,"y":0,"z":0},"isGrappling":false}"#,
        )
        .expect("position");
        assert!(matches!(pos, ClientMsg::Position { grapple_point: None, id: None, .. }));
    }

    #[test]
    fn test_init_velocity_optional() {
        let init = ServerMsg::decode(
            r#"{"type":"init","id":"me","players":[{"id":"a","position":{"x":1,"y":2,"z":3}}]}"#,
        )
        .expect("init");
        match init {
            ServerMsg::Init { id, players } => {
                assert_eq!(id.as_str(), "me");
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].velocity, None);
            }
            other => panic!("unexpected {:?}", other),
        }

        let encoded = serde_json::to_value(PeerInfo {
            id: PlayerId::from("a"),
            position: SPAWN_POSITION,
            velocity: None,
        })
        .expect("serialize");
        assert!(encoded.get("velocity").is_none());
    }

    #[test]
    fn test_malformed_and_unknown_types_rejected() {
        assert!(ClientMsg::decode("not json").is_err());
        assert!(ClientMsg::decode(r#"{"type":"teleport"}"#).is_err());
        assert!(ServerMsg::decode(r#"{"type":"playerLeft"}"#).is_err());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(PlayerId::generate(), PlayerId::generate());
    }
}
