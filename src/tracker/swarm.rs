use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::time::Duration;

use parking_lot::RwLock;

use super::handler::AnnounceHandler;
use super::request::{AnnounceRequest, TrackerEvent};
use super::response::{AnnounceResponse, ResponsePeer};
use crate::constants::{DEFAULT_ANNOUNCE_INTERVAL, DEFAULT_MAX_PEERS, PEER_ID_LEN};
use crate::metainfo::InfoHash;

type PeerId = [u8; PEER_ID_LEN];

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Announce interval handed to every client.
    pub interval: Duration,
    /// Upper bound on peers listed in one response.
    pub max_peers: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_ANNOUNCE_INTERVAL,
            max_peers: DEFAULT_MAX_PEERS,
        }
    }
}

/// What the tracker remembers about one peer from its latest announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    pub ip: String,
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub event: TrackerEvent,
}

impl PeerEntry {
    pub fn is_seeder(&self) -> bool {
        self.left == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwarmStats {
    pub peers: usize,
    /// Peers with nothing left to download.
    pub seeders: usize,
    pub leechers: usize,
}

/// In-memory peer registry keyed by info hash and peer ID.
///
/// Peers are listed in peer ID order. Nothing expires on its own: a peer
/// stays until it announces `stopped`.
///
/// ```
/// use bcanon::tracker::{handle_announce, Swarm};
/// use std::net::{IpAddr, Ipv4Addr};
///
/// let swarm = Swarm::default();
/// let query = "info_hash=aaaaaaaaaaaaaaaaaaaa&peer_id=bbbbbbbbbbbbbbbbbbbb\
///              &port=6881&uploaded=0&downloaded=0&left=10";
///
/// let response = handle_announce(query, IpAddr::V4(Ipv4Addr::LOCALHOST), &swarm);
/// assert_eq!(response.status, 200);
/// assert_eq!(swarm.peer_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Swarm {
    config: TrackerConfig,
    torrents: RwLock<HashMap<InfoHash, BTreeMap<PeerId, PeerEntry>>>,
}

impl Swarm {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            torrents: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Total peers across all torrents.
    pub fn peer_count(&self) -> usize {
        self.torrents.read().values().map(BTreeMap::len).sum()
    }

    /// Number of torrents with at least one peer.
    pub fn torrent_count(&self) -> usize {
        self.torrents.read().len()
    }

    pub fn stats(&self, info_hash: &InfoHash) -> Option<SwarmStats> {
        let torrents = self.torrents.read();
        let peers = torrents.get(info_hash)?;
        let seeders = peers.values().filter(|peer| peer.is_seeder()).count();

        Some(SwarmStats {
            peers: peers.len(),
            seeders,
            leechers: peers.len() - seeders,
        })
    }

    pub fn peer(&self, info_hash: &InfoHash, peer_id: &PeerId) -> Option<PeerEntry> {
        self.torrents.read().get(info_hash)?.get(peer_id).cloned()
    }

    fn interval_secs(&self) -> u32 {
        u32::try_from(self.config.interval.as_secs()).unwrap_or(u32::MAX)
    }
}

impl AnnounceHandler for Swarm {
    fn announce(&self, request: &AnnounceRequest, remote: IpAddr) -> AnnounceResponse {
        let mut torrents = self.torrents.write();

        if request.event == TrackerEvent::Stopped {
            if let Some(peers) = torrents.get_mut(&request.info_hash) {
                peers.remove(&request.peer_id);
                if peers.is_empty() {
                    torrents.remove(&request.info_hash);
                }
            }
            tracing::debug!(info_hash = %request.info_hash, %remote, "peer left swarm");
        } else {
            let entry = PeerEntry {
                ip: request.ip.clone().unwrap_or_else(|| remote.to_string()),
                port: request.port,
                uploaded: request.uploaded,
                downloaded: request.downloaded,
                left: request.left,
                event: request.event,
            };
            let peers = torrents.entry(request.info_hash).or_default();
            if peers.insert(request.peer_id, entry).is_none() {
                tracing::debug!(
                    info_hash = %request.info_hash,
                    %remote,
                    swarm_size = peers.len(),
                    "peer joined swarm"
                );
            }
        }

        let peers = torrents
            .get(&request.info_hash)
            .into_iter()
            .flatten()
            .filter(|(id, _)| **id != request.peer_id)
            .take(self.config.max_peers)
            .map(|(id, peer)| ResponsePeer {
                id: *id,
                ip: peer.ip.clone(),
                port: peer.port,
            })
            .collect();

        AnnounceResponse::Peers {
            interval: self.interval_secs(),
            peers,
        }
    }
}
