// BMPSIM: Synthetic BMP Session Generation and Replay for Collector Stress Testing
// Copyright (C) 2025-2026 the bmpsim developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Module driving many concurrent simulated clients against one collector.

use std::{
    future::Future,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpSocket, TcpStream},
    sync::watch,
    time,
};

use crate::compiler::MessageSet;

/// Pause between the lifecycle phases of a session, giving the collector time to process
/// the initiation and peer-up messages before the update stream starts.
const SETTLE: Duration = Duration::from_secs(1);

/// Wait specification for the steady-state update loop, in seconds.
///
/// A range draws a fresh uniformly-distributed value on every iteration, independently per
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Fixed(u64),
    Range(u64, u64),
}

impl Wait {
    /// Build a wait specification from one or two values, rejecting an inverted range.
    pub fn from_values(values: &[u64]) -> Result<Self, ReplayError> {
        match *values {
            [secs] => Ok(Wait::Fixed(secs)),
            [min, max] if min <= max => Ok(Wait::Range(min, max)),
            [min, max] => Err(ReplayError::InvalidWait { min, max }),
            _ => Err(ReplayError::InvalidWaitCount(values.len())),
        }
    }

    fn sample(&self, rng: &mut impl Rng) -> u64 {
        match *self {
            Wait::Fixed(secs) => secs,
            Wait::Range(min, max) => rng.gen_range(min..=max),
        }
    }
}

/// Configuration of one replay run.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// collector endpoint every session connects to
    pub collector: SocketAddr,
    /// source address of the first session; session i binds the i-th successor
    pub first_source: IpAddr,
    /// prefix length of the address block the sources are drawn from
    pub source_prefix_len: u8,
    /// number of concurrent simulated clients
    pub num_clients: usize,
    /// distributed-start window in seconds, 0 to connect immediately
    pub start_window: u64,
    /// test duration in seconds after which all sessions are stopped, 0 to run until
    /// interrupted
    pub duration: u64,
    pub wait: Wait,
    /// seed for jitter and interval sampling, for reproducible runs
    pub seed: Option<u64>,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// ended by the stop signal (duration elapsed or external interrupt)
    Stopped,
    /// could not connect to the collector; siblings are unaffected
    ConnectFailed(String),
    /// a mid-stream transport error; siblings are unaffected
    SendFailed(String),
}

/// Final state of one session, aggregated by the engine at shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub id: usize,
    pub source: IpAddr,
    pub batches_sent: u64,
    pub outcome: SessionOutcome,
}

/// Error thrown for a replay configuration that must be rejected before any session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("wait range minimum {min} exceeds maximum {max}")]
    InvalidWait { min: u64, max: u64 },
    #[error("a wait specification takes one or two values, got {0}")]
    InvalidWaitCount(usize),
    #[error("{clients} clients do not fit into a /{prefix_len} source address block")]
    SourceBlockTooSmall { clients: usize, prefix_len: u8 },
    #[error("replay needs at least one simulated client")]
    NoClients,
}

/// One independent simulated client. It owns its source address, its RNG, and a reference
/// to the shared read-only message set; the only shared mutable state is the stop signal.
struct Session {
    id: usize,
    source: IpAddr,
    collector: SocketAddr,
    set: Arc<MessageSet>,
    wait: Wait,
    start_window: u64,
    rng: StdRng,
    stop: watch::Receiver<bool>,
}

impl Session {
    async fn run(mut self) -> SessionReport {
        let id = self.id;
        let source = self.source;
        let (batches_sent, outcome) = self.drive().await;
        SessionReport {
            id,
            source,
            batches_sent,
            outcome,
        }
    }

    async fn drive(&mut self) -> (u64, SessionOutcome) {
        // spread the connection storm over the configured window
        if let Some(delay) = start_delay(self.start_window, &mut self.rng) {
            time::sleep(delay).await;
        }

        let mut stream = match self.connect().await {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!(
                    "session {} ({}): connecting to {} failed: {e}",
                    self.id,
                    self.source,
                    self.collector
                );
                return (0, SessionOutcome::ConnectFailed(e.to_string()));
            }
        };
        log::debug!("session {} connected from {}", self.id, self.source);

        if let Err(e) = self.announce(&mut stream).await {
            log::warn!("session {}: announcing failed: {e}", self.id);
            return (0, SessionOutcome::SendFailed(e.to_string()));
        }

        let mut batches = 0;
        loop {
            // the stop signal is only observed here, so one in-flight sleep and at most one
            // more batch can complete after a stop request
            if *self.stop.borrow() {
                break;
            }
            let wait = self.wait.sample(&mut self.rng);
            time::sleep(Duration::from_secs(wait)).await;
            if let Err(e) = self.send_updates(&mut stream).await {
                log::warn!("session {}: sending updates failed: {e}", self.id);
                return (batches, SessionOutcome::SendFailed(e.to_string()));
            }
            batches += 1;
        }
        log::debug!(
            "session {} stopped after {batches} update batches",
            self.id
        );
        (batches, SessionOutcome::Stopped)
    }

    async fn connect(&self) -> std::io::Result<TcpStream> {
        let socket = match self.source {
            IpAddr::V4(_) => TcpSocket::new_v4()?,
            IpAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(SocketAddr::new(self.source, 0))?;
        socket.connect(self.collector).await
    }

    /// Send the initiation and all peer-up messages, with a settle pause after each phase.
    async fn announce(&self, stream: &mut TcpStream) -> std::io::Result<()> {
        stream.write_all(self.set.initiation.as_bytes()).await?;
        time::sleep(SETTLE).await;
        for peer_up in &self.set.peer_ups {
            stream.write_all(peer_up.as_bytes()).await?;
        }
        time::sleep(SETTLE).await;
        Ok(())
    }

    /// Send one full batch of route-monitoring messages, in compiled order.
    async fn send_updates(&self, stream: &mut TcpStream) -> std::io::Result<()> {
        for update in &self.set.updates {
            stream.write_all(update.as_bytes()).await?;
        }
        Ok(())
    }
}

/// Replays one compiled message set from N concurrent simulated clients.
pub struct ReplayEngine {
    config: ReplayConfig,
    set: Arc<MessageSet>,
}

impl ReplayEngine {
    /// Validate the configuration and prepare an engine. Invalid combinations are rejected
    /// here, before any session starts.
    pub fn new(config: ReplayConfig, set: MessageSet) -> Result<Self, ReplayError> {
        if config.num_clients == 0 {
            return Err(ReplayError::NoClients);
        }
        if let Wait::Range(min, max) = config.wait {
            if min > max {
                return Err(ReplayError::InvalidWait { min, max });
            }
        }
        let host_bits = match config.first_source {
            IpAddr::V4(_) => 32u32.saturating_sub(config.source_prefix_len as u32),
            IpAddr::V6(_) => 128u32.saturating_sub(config.source_prefix_len as u32),
        };
        if host_bits < 64 && (config.num_clients as u128) > (1u128 << host_bits) {
            return Err(ReplayError::SourceBlockTooSmall {
                clients: config.num_clients,
                prefix_len: config.source_prefix_len,
            });
        }
        Ok(Self {
            config,
            set: Arc::new(set),
        })
    }

    /// Run all sessions until the configured duration elapses or `interrupt` resolves,
    /// whichever comes first (with duration 0, only `interrupt` stops the run). Returns
    /// after every session has been joined.
    pub async fn run(self, interrupt: impl Future<Output = ()>) -> Vec<SessionReport> {
        let (stop_tx, stop_rx) = watch::channel(false);

        log::info!(
            "starting {} sessions against {} ({} messages per session loop)",
            self.config.num_clients,
            self.config.collector,
            self.set.updates.len()
        );
        let mut handles = Vec::with_capacity(self.config.num_clients);
        for id in 0..self.config.num_clients {
            let session = Session {
                id,
                source: nth_source(self.config.first_source, id),
                collector: self.config.collector,
                set: Arc::clone(&self.set),
                wait: self.config.wait,
                start_window: self.config.start_window,
                rng: self.session_rng(id),
                stop: stop_rx.clone(),
            };
            handles.push(tokio::spawn(session.run()));
        }
        drop(stop_rx);

        if self.config.duration > 0 {
            tokio::select! {
                _ = time::sleep(Duration::from_secs(self.config.duration)) => {
                    log::info!("test duration elapsed, stopping all sessions");
                }
                _ = interrupt => {
                    log::info!("interrupted, stopping all sessions");
                }
            }
        } else {
            interrupt.await;
            log::info!("interrupted, stopping all sessions");
        }
        let _ = stop_tx.send(true);

        // a hung transport send will block the drain here; that is visible in the logs
        // rather than worked around
        let mut reports = Vec::with_capacity(handles.len());
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    log::error!("session {id} could not be joined: {e}");
                    reports.push(SessionReport {
                        id,
                        source: nth_source(self.config.first_source, id),
                        batches_sent: 0,
                        outcome: SessionOutcome::SendFailed(e.to_string()),
                    });
                }
            }
        }
        reports
    }

    fn session_rng(&self, id: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Random delay before a session connects, uniformly drawn from `[0, window]` seconds.
fn start_delay(window: u64, rng: &mut impl Rng) -> Option<Duration> {
    (window > 0).then(|| Duration::from_secs_f64(rng.gen_range(0.0..=window as f64)))
}

/// The i-th source address of the caller-supplied sequential block.
fn nth_source(first: IpAddr, i: usize) -> IpAddr {
    match first {
        IpAddr::V4(addr) => IpAddr::V4(Ipv4Addr::from(u32::from(addr).wrapping_add(i as u32))),
        IpAddr::V6(addr) => IpAddr::V6(Ipv6Addr::from(u128::from(addr).wrapping_add(i as u128))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{compiler::compile, test_util::basic_scenario};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::{io::AsyncReadExt, net::TcpListener};

    #[test]
    fn wait_specifications() {
        assert_eq!(Wait::from_values(&[30]).unwrap(), Wait::Fixed(30));
        assert_eq!(Wait::from_values(&[5, 10]).unwrap(), Wait::Range(5, 10));
        assert!(matches!(
            Wait::from_values(&[10, 5]),
            Err(ReplayError::InvalidWait { min: 10, max: 5 })
        ));
        assert!(matches!(
            Wait::from_values(&[]),
            Err(ReplayError::InvalidWaitCount(0))
        ));
    }

    #[test]
    fn wait_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let wait = Wait::Range(3, 9);
        for _ in 0..1000 {
            let sample = wait.sample(&mut rng);
            assert!((3..=9).contains(&sample));
        }
        assert_eq!(Wait::Fixed(4).sample(&mut rng), 4);
    }

    #[test]
    fn start_delay_stays_within_the_window() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let delay = start_delay(5, &mut rng).unwrap();
            assert!(delay <= Duration::from_secs(5));
        }
        // a window of 0 adds no delay at all
        assert_eq!(start_delay(0, &mut rng), None);
    }

    #[test]
    fn sources_are_sequential() {
        let first: IpAddr = "127.0.1.250".parse().unwrap();
        assert_eq!(nth_source(first, 0), first);
        assert_eq!(nth_source(first, 6), "127.0.2.0".parse::<IpAddr>().unwrap());

        let first: IpAddr = "fc00::1".parse().unwrap();
        assert_eq!(nth_source(first, 2), "fc00::3".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let set = compile(&basic_scenario()).unwrap();
        let config = ReplayConfig {
            collector: "127.0.0.1:1790".parse().unwrap(),
            first_source: "127.0.0.1".parse().unwrap(),
            source_prefix_len: 31,
            num_clients: 4,
            start_window: 0,
            duration: 0,
            wait: Wait::Fixed(1),
            seed: None,
        };
        assert!(matches!(
            ReplayEngine::new(config.clone(), set.clone()),
            Err(ReplayError::SourceBlockTooSmall {
                clients: 4,
                prefix_len: 31
            })
        ));

        let mut config = config;
        config.source_prefix_len = 8;
        config.num_clients = 0;
        assert!(matches!(
            ReplayEngine::new(config, set),
            Err(ReplayError::NoClients)
        ));
    }

    /// Accept connections and drain them, counting how many clients showed up.
    async fn fake_collector(listener: TcpListener, connections: Arc<AtomicUsize>) {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            connections.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                while matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {}
            });
        }
    }

    #[tokio::test]
    async fn population_connects_and_drains_to_stopped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let collector = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        tokio::spawn(fake_collector(listener, Arc::clone(&connections)));

        let config = ReplayConfig {
            collector,
            first_source: "127.0.0.1".parse().unwrap(),
            source_prefix_len: 8,
            num_clients: 3,
            start_window: 0,
            duration: 1,
            wait: Wait::Fixed(1),
            seed: Some(42),
        };
        let set = compile(&basic_scenario()).unwrap();
        let reports = ReplayEngine::new(config, set)
            .unwrap()
            .run(std::future::pending())
            .await;

        assert_eq!(reports.len(), 3);
        assert_eq!(connections.load(Ordering::SeqCst), 3);
        for report in &reports {
            assert_eq!(report.outcome, SessionOutcome::Stopped);
        }
    }

    #[tokio::test]
    async fn connect_failure_is_isolated() {
        // nothing listens on this port; every session must fail on its own
        let config = ReplayConfig {
            collector: "127.0.0.1:9".parse().unwrap(),
            first_source: "127.0.0.1".parse().unwrap(),
            source_prefix_len: 8,
            num_clients: 2,
            start_window: 0,
            duration: 1,
            wait: Wait::Fixed(1),
            seed: Some(42),
        };
        let set = compile(&basic_scenario()).unwrap();
        let reports = ReplayEngine::new(config, set)
            .unwrap()
            .run(std::future::pending())
            .await;

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert!(matches!(report.outcome, SessionOutcome::ConnectFailed(_)));
            assert_eq!(report.batches_sent, 0);
        }
    }
}
