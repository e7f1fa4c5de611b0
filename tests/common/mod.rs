//! Shared utilities for integration testing: mock robots and a running relay.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use robot_relay::config::RelayConfig;
use robot_relay::http::HttpServer;
use robot_relay::lifecycle::Shutdown;

/// Start a programmable mock robot. `f` receives the first chunk the relay
/// wrote and decides what (if anything) to send back before closing.
#[allow(dead_code)]
pub async fn start_programmable_peer<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<Vec<u8>>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        buf.truncate(n);
                        if let Some(reply) = f(buf).await {
                            let _ = socket.write_all(&reply).await;
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A robot that echoes each frame back verbatim.
#[allow(dead_code)]
pub async fn start_echo_peer() -> SocketAddr {
    start_programmable_peer(|frame| async move { Some(frame) }).await
}

/// A robot that always answers with the same bytes.
#[allow(dead_code)]
pub async fn start_fixed_peer(reply: &'static [u8]) -> SocketAddr {
    start_programmable_peer(move |_| async move { Some(reply.to_vec()) }).await
}

/// A robot that accepts and holds connections without ever replying.
#[allow(dead_code)]
pub async fn start_silent_peer(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _socket: TcpStream = socket;
                tokio::time::sleep(hold).await;
            });
        }
    });

    addr
}

/// A robot whose accept backlog is full: new connections neither complete
/// nor get refused, so dials hang until the caller gives up.
#[allow(dead_code)]
pub async fn start_saturated_peer() -> SocketAddr {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    // Fill the backlog; the listener never accepts.
    let mut fillers = Vec::new();
    for _ in 0..8 {
        if let Ok(Ok(stream)) =
            tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await
        {
            fillers.push(stream);
        }
    }

    tokio::spawn(async move {
        let _held = (listener, fillers);
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Relay configuration pointing at `peer`, with short test timeouts.
pub fn relay_config(peer: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.peer.address = peer.to_string();
    config.timeouts.connect_ms = 1_000;
    config.timeouts.deadline_ms = 1_000;
    config
}

/// A relay running in the background.
pub struct TestRelay {
    pub url: String,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestRelay {
    pub async fn start(config: RelayConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = HttpServer::new(config);
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .unwrap();

        Self {
            url: format!("http://{}", addr),
            client,
            shutdown,
        }
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
