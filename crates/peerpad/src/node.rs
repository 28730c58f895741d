// One peer in the mesh: the replica, the listening socket, the connector
// that keeps dialing configured peers, and a reader/writer task pair per
// attached link.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use protocol::Message;
use rga::{EditError, RemoteOp, Rga};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::NodeConfig;

const CONNECT_RETRY: Duration = Duration::from_secs(1);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Node {
    config: NodeConfig,
    rga: Mutex<Rga>,
    /// Attached peers: outbound links keyed by the configured address,
    /// inbound links by the remote socket address. Each value is the
    /// sender feeding that peer's writer task one serialized line at a
    /// time. Dropping the sender closes the link.
    peers: Mutex<HashMap<String, mpsc::UnboundedSender<String>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Node {
    /// Bind the listening socket and start the accept and connector loops.
    pub async fn start(config: NodeConfig) -> Result<Arc<Node>> {
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
        let addr = listener.local_addr()?;
        tracing::info!(site = %config.site_id, %addr, "node listening");

        let node = Arc::new(Node {
            rga: Mutex::new(Rga::new(config.site_id.clone())),
            peers: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            config,
        });

        let acceptor = {
            let node = node.clone();
            tokio::spawn(async move {
                loop {
                    match listener.accept().await {
                        Ok((stream, addr)) => {
                            node.clone().attach_peer(stream, addr.to_string(), false).await;
                        }
                        Err(error) => {
                            tracing::warn!(%error, "accept failed");
                        }
                    }
                }
            })
        };
        let connector = tokio::spawn(node.clone().connector_loop());
        node.tasks.lock().await.extend([acceptor, connector]);

        Ok(node)
    }

    pub fn site_id(&self) -> &str {
        &self.config.site_id
    }

    /// Dial every configured peer that is not currently attached, forever.
    async fn connector_loop(self: Arc<Self>) {
        let mut ticker = time::interval(CONNECT_RETRY);
        loop {
            ticker.tick().await;
            for addr in &self.config.peers {
                if self.peers.lock().await.contains_key(addr) {
                    continue;
                }
                match time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr.as_str())).await {
                    Ok(Ok(stream)) => {
                        self.clone().attach_peer(stream, addr.clone(), true).await;
                    }
                    Ok(Err(error)) => {
                        tracing::debug!(peer = %addr, %error, "connect failed");
                    }
                    Err(_) => {
                        tracing::debug!(peer = %addr, "connect timed out");
                    }
                }
            }
        }
    }

    /// Register the link and spawn its writer and reader. The initiator of
    /// an outbound link immediately asks for a snapshot.
    async fn attach_peer(self: Arc<Self>, stream: TcpStream, label: String, initiator: bool) {
        let (read_half, mut write_half) = stream.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        self.peers.lock().await.insert(label.clone(), tx);
        tracing::info!(peer = %label, "peer attached");

        let writer_node = self.clone();
        let writer_label = label.clone();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(error) = write_half.write_all(line.as_bytes()).await {
                    tracing::warn!(peer = %writer_label, %error, "send failed");
                    break;
                }
            }
            writer_node.detach(&writer_label).await;
        });

        let reader_node = self.clone();
        let reader_label = label.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => reader_node.handle_line(&reader_label, &line).await,
                    Ok(None) => break,
                    Err(error) => {
                        tracing::warn!(peer = %reader_label, %error, "read failed");
                        break;
                    }
                }
            }
            reader_node.detach(&reader_label).await;
        });

        if initiator {
            self.send_to(
                &label,
                &Message::SyncRequest {
                    site_id: self.config.site_id.clone(),
                },
            )
            .await;
        }
    }

    async fn detach(&self, label: &str) {
        if self.peers.lock().await.remove(label).is_some() {
            tracing::info!(peer = %label, "peer detached");
        }
    }

    /// Dispatch one framed line from a peer. A malformed or unknown
    /// message is logged and dropped; the connection lives on.
    async fn handle_line(&self, from: &str, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let message = match serde_json::from_str::<Message>(line) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(peer = %from, %error, "discarding malformed message");
                return;
            }
        };

        match message {
            Message::Insert(op) => self.apply_remote(RemoteOp::Insert(op)).await,
            Message::Delete(op) => self.apply_remote(RemoteOp::Delete(op)).await,
            Message::SyncRequest { site_id } => {
                tracing::info!(peer = %from, site = %site_id, "sync requested");
                let snapshot = self.rga.lock().await.snapshot();
                self.send_to(
                    from,
                    &Message::SyncResponse {
                        site_id: self.config.site_id.clone(),
                        snapshot,
                    },
                )
                .await;
            }
            Message::SyncResponse { site_id, snapshot } => {
                tracing::info!(
                    peer = %from,
                    site = %site_id,
                    cells = snapshot.len(),
                    "applying sync snapshot"
                );
                self.rga.lock().await.apply_snapshot(snapshot, &site_id);
                self.export_visible().await;
            }
        }
    }

    async fn apply_remote(&self, op: RemoteOp) {
        self.rga.lock().await.apply(op);
        self.export_visible().await;
    }

    /// Local insert: applied to the replica, then fanned out.
    pub async fn insert(&self, index: usize, value: &str) {
        let op = self.rga.lock().await.insert_local(index, value);
        self.export_visible().await;
        self.broadcast(Message::Insert(op)).await;
    }

    /// Local delete. An out-of-range index changes nothing and is not
    /// broadcast.
    pub async fn delete(&self, index: usize) -> Result<(), EditError> {
        let op = self.rga.lock().await.delete_local(index)?;
        self.export_visible().await;
        self.broadcast(Message::Delete(op)).await;
        Ok(())
    }

    /// Send to every attached peer; a failed send detaches that peer.
    async fn broadcast(&self, message: Message) {
        let mut line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(error) => {
                tracing::error!(%error, "failed to serialize message");
                return;
            }
        };
        line.push('\n');

        let mut dead = Vec::new();
        {
            let peers = self.peers.lock().await;
            for (label, tx) in peers.iter() {
                if tx.send(line.clone()).is_err() {
                    dead.push(label.clone());
                }
            }
        }
        for label in dead {
            self.detach(&label).await;
        }
    }

    async fn send_to(&self, label: &str, message: &Message) {
        let mut line = match serde_json::to_string(message) {
            Ok(line) => line,
            Err(error) => {
                tracing::error!(%error, "failed to serialize message");
                return;
            }
        };
        line.push('\n');

        let tx = self.peers.lock().await.get(label).cloned();
        if let Some(tx) = tx {
            if tx.send(line).is_err() {
                self.detach(label).await;
            }
        }
    }

    pub async fn visible_text(&self) -> String {
        self.rga.lock().await.visible_text()
    }

    pub async fn peer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.peers.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Full replica including tombstones, one cell per line, for `show`.
    pub async fn replica_dump(&self) -> String {
        let rga = self.rga.lock().await;
        let mut out = String::new();
        for cell in rga.cells() {
            let parent = match &cell.parent {
                Some(id) => format!("{}:{}", id.site, id.vclock.get(&id.site)),
                None => "root".to_string(),
            };
            let _ = writeln!(
                out,
                "  {:?} id={}:{} parent={} deleted={}",
                cell.value,
                cell.id.site,
                cell.id.vclock.get(&cell.id.site),
                parent,
                cell.deleted
            );
        }
        out
    }

    /// Atomically replace `site_<id>.txt` with the visible text, when
    /// export is configured.
    async fn export_visible(&self) {
        let Some(dir) = &self.config.export_dir else {
            return;
        };
        let text = self.rga.lock().await.visible_text();
        let path = dir.join(format!("site_{}.txt", self.config.site_id));
        let staging = dir.join(format!("site_{}.txt.tmp", self.config.site_id));

        let result = async {
            tokio::fs::write(&staging, text.as_bytes()).await?;
            tokio::fs::rename(&staging, &path).await
        }
        .await;
        if let Err(error) = result {
            tracing::warn!(%error, path = %path.display(), "export failed");
        }
    }

    /// Stop the accept and connector loops and drop every peer link.
    /// Reader tasks drain out as their sockets close.
    pub async fn shutdown(&self) {
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        self.peers.lock().await.clear();
        tracing::info!(site = %self.config.site_id, "node stopped");
    }
}
