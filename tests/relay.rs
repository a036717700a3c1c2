//! End-to-end relay tests over real WebSocket connections

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use glam::Vec3;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use grapple_city::app::AppState;
use grapple_city::config::Config;
use grapple_city::game::Player;
use grapple_city::http::build_router;
use grapple_city::net::{SyncClient, WsTransport};
use grapple_city::ws::protocol::{ClientMsg, PlayerId, ServerMsg, WireVec3, SPAWN_POSITION};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn spawn_relay() -> SocketAddr {
    let config = Config::from_lookup(|key| match key {
        "STATIC_DIR" => Some("tests/no-such-dir".to_string()),
        _ => None,
    })
    .expect("config");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let router = build_router(AppState::new(config));
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("connect");
    socket
}

async fn recv(socket: &mut Socket) -> ServerMsg {
    loop {
        let frame = tokio::time::timeout(TIMEOUT, socket.next())
            .await
            .expect("timed out waiting for relay")
            .expect("stream ended")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return ServerMsg::decode(&text).expect("decode");
        }
    }
}

/// Connect and wait for `init`, which proves the relay registered us
async fn join(addr: SocketAddr) -> (Socket, PlayerId, Vec<PlayerId>) {
    let mut socket = connect(addr).await;
    match recv(&mut socket).await {
        ServerMsg::Init { id, players } => {
            let others = players.into_iter().map(|p| p.id).collect();
            (socket, id, others)
        }
        other => panic!("expected init, got {:?}", other),
    }
}

async fn send(socket: &mut Socket, msg: &ClientMsg) {
    socket
        .send(Message::Text(msg.encode().expect("encode")))
        .await
        .expect("send");
}

fn position_at(x: f32) -> ClientMsg {
    ClientMsg::Position {
        id: None,
        position: WireVec3::new(x, 5.0, 0.0),
        velocity: WireVec3::new(0.0, -0.1, 0.0),
        is_grappling: false,
        grapple_point: None,
    }
}

#[tokio::test]
async fn test_third_client_sees_existing_players() {
    let addr = spawn_relay().await;

    let (mut a, a_id, a_others) = join(addr).await;
    assert!(a_others.is_empty());

    let (mut b, b_id, b_others) = join(addr).await;
    assert_eq!(b_others, vec![a_id.clone()]);
    assert_eq!(
        recv(&mut a).await,
        ServerMsg::PlayerJoined {
            id: b_id.clone(),
            position: SPAWN_POSITION
        }
    );

    send(&mut a, &position_at(10.0)).await;
    assert!(matches!(recv(&mut b).await, ServerMsg::PlayerMoved { ref id, .. } if *id == a_id));
    send(&mut b, &position_at(-4.0)).await;
    assert!(matches!(recv(&mut a).await, ServerMsg::PlayerMoved { ref id, .. } if *id == b_id));

    let mut c = connect(addr).await;
    let ServerMsg::Init { id: c_id, players } = recv(&mut c).await else {
        panic!("expected init");
    };
    assert_eq!(players.len(), 2);
    for peer in &players {
        let expected_x = if peer.id == a_id { 10.0 } else { -4.0 };
        assert!(peer.id == a_id || peer.id == b_id);
        assert_eq!(peer.position, WireVec3::new(expected_x, 5.0, 0.0));
    }

    for socket in [&mut a, &mut b] {
        assert_eq!(
            recv(socket).await,
            ServerMsg::PlayerJoined {
                id: c_id.clone(),
                position: SPAWN_POSITION
            }
        );
    }
}

#[tokio::test]
async fn test_chat_reaches_other_and_sender() {
    let addr = spawn_relay().await;
    let (mut a, a_id, _) = join(addr).await;
    let (mut b, _, _) = join(addr).await;
    let _joined = recv(&mut a).await;

    send(
        &mut a,
        &ClientMsg::Chat {
            id: Some(PlayerId::from("forged")),
            message: "hi <there>".to_string(),
        },
    )
    .await;

    let expected = ServerMsg::Chat {
        id: a_id,
        message: "hi <there>".to_string(),
    };
    assert_eq!(recv(&mut b).await, expected);
    assert_eq!(recv(&mut a).await, expected);
}

#[tokio::test]
async fn test_malformed_frames_do_not_drop_connection() {
    let addr = spawn_relay().await;
    let (mut a, a_id, _) = join(addr).await;
    let (mut b, _, _) = join(addr).await;
    let _joined = recv(&mut a).await;

    a.send(Message::Text("not json".to_string())).await.expect("send");
    a.send(Message::Text(r#"{"type":"teleport","to":"moon"}"#.to_string()))
        .await
        .expect("send");
    send(&mut a, &position_at(1.0)).await;

    match recv(&mut b).await {
        ServerMsg::PlayerMoved { id, position, .. } => {
            assert_eq!(id, a_id);
            assert_eq!(position, WireVec3::new(1.0, 5.0, 0.0));
        }
        other => panic!("expected playerMoved, got {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_broadcasts_player_left() {
    let addr = spawn_relay().await;
    let (mut a, _, _) = join(addr).await;
    let (mut b, b_id, _) = join(addr).await;
    let _joined = recv(&mut a).await;

    b.close(None).await.expect("close");
    assert_eq!(recv(&mut a).await, ServerMsg::PlayerLeft { id: b_id });
}

#[tokio::test]
async fn test_health_reports_connected_players() {
    let addr = spawn_relay().await;
    let (_a, _, _) = join(addr).await;

    let mut stream = TcpStream::connect(addr).await.expect("tcp");
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("write");
    let mut response = String::new();
    tokio::time::timeout(TIMEOUT, stream.read_to_string(&mut response))
        .await
        .expect("timed out")
        .expect("read");

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains(r#""status":"ok""#), "{}", response);
    assert!(response.contains(r#""connected_players":1"#), "{}", response);
}

#[tokio::test]
async fn test_sync_clients_see_each_other() {
    let addr = spawn_relay().await;
    let url = format!("ws://{}/ws", addr);

    let mut first = SyncClient::new(WsTransport::connect(&url).await.expect("first"));
    wait_for(|| {
        first.drain();
        first.local_id().is_some()
    })
    .await;

    let mut second = SyncClient::new(WsTransport::connect(&url).await.expect("second"));
    wait_for(|| {
        second.drain();
        second.local_id().is_some()
    })
    .await;

    let first_id = first.local_id().cloned().expect("id");
    let player = Player::new(Vec3::new(3.0, 12.0, -7.0));
    first.publish(&player);

    wait_for(|| {
        second.drain();
        second
            .remote(&first_id)
            .is_some_and(|remote| remote.position == Vec3::new(3.0, 12.0, -7.0))
    })
    .await;

    second.send_chat("hello first");
    wait_for(|| {
        first.drain();
        first.chat_log().any(|line| line.message == "hello first")
    })
    .await;
    assert_eq!(first.remote_count(), 1);
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
