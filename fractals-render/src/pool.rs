use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use fractals_core::{TileRequest, TileResult};
use tracing::{debug, warn};

use crate::error::RenderError;
use crate::kernel::TileKernel;

/// A fixed set of long-lived tile workers fed round-robin.
///
/// Each worker owns one kernel and its own request channel; every reply comes
/// back on a single shared result channel tagged with the worker's id. The
/// round-robin cursor persists across [`dispatch`](Self::dispatch) calls.
///
/// A worker that never replies keeps the pool occupied for good: there is no
/// timeout and no retry.
pub struct WorkerPool {
    senders: Vec<Sender<TileRequest>>,
    threads: Vec<JoinHandle<()>>,
    results: Receiver<TileResult>,
    worker_count: usize,
    next: usize,
    outstanding: usize,
}

impl WorkerPool {
    /// Spawn `count` workers, building each one's kernel with `factory(id)`.
    pub fn new<K, F>(count: usize, mut factory: F) -> crate::Result<Self>
    where
        K: TileKernel + Send + 'static,
        F: FnMut(usize) -> K,
    {
        if count == 0 {
            return Err(RenderError::NoWorkers);
        }

        let (result_tx, results) = mpsc::channel();
        let mut senders = Vec::with_capacity(count);
        let mut threads = Vec::with_capacity(count);

        for id in 0..count {
            let (tx, rx) = mpsc::channel::<TileRequest>();
            let kernel = factory(id);
            let result_tx = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("tile-worker-{id}"))
                .spawn(move || worker_loop(id, kernel, rx, result_tx))
                .map_err(|source| RenderError::WorkerSpawn { index: id, source })?;
            senders.push(tx);
            threads.push(handle);
        }

        debug!(workers = count, "Worker pool started");
        Ok(Self {
            senders,
            threads,
            results,
            worker_count: count,
            next: 0,
            outstanding: 0,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// `true` while any dispatched request is still waiting for its reply.
    pub fn is_occupied(&self) -> bool {
        self.outstanding > 0
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Send each request to the next worker in rotation. Never blocks.
    ///
    /// Returns the worker id each request was assigned to, in order.
    pub fn dispatch(&mut self, requests: Vec<TileRequest>) -> Vec<usize> {
        if self.senders.is_empty() {
            warn!(
                requests = requests.len(),
                "Dispatch on a pool that has been shut down"
            );
            return Vec::new();
        }

        let mut assigned = Vec::with_capacity(requests.len());
        for request in requests {
            let slot = self.next;
            self.next = (self.next + 1) % self.senders.len();
            self.outstanding += 1;
            let tile_index = request.tile_index;
            if self.senders[slot].send(request).is_err() {
                // The slot stays counted: a dead worker never replies.
                warn!(worker_id = slot, tile_index, "Tile worker is gone");
            }
            assigned.push(slot);
        }
        assigned
    }

    /// Take one finished tile if any is ready.
    pub fn try_recv(&mut self) -> Option<TileResult> {
        match self.results.try_recv() {
            Ok(result) => Some(self.complete(result)),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for one finished tile.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<TileResult> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(self.complete(result)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until nothing is outstanding or `timeout` elapses, collecting
    /// every reply received on the way.
    pub fn drain_until_idle(&mut self, timeout: Duration) -> Vec<TileResult> {
        let deadline = Instant::now() + timeout;
        let mut out = Vec::new();
        while self.is_occupied() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.recv_timeout(remaining) {
                Some(result) => out.push(result),
                None => break,
            }
        }
        out
    }

    fn complete(&mut self, result: TileResult) -> TileResult {
        self.outstanding = self.outstanding.saturating_sub(1);
        result
    }

    /// Close every request channel and join the worker threads.
    pub fn shutdown(&mut self) {
        if self.threads.is_empty() {
            return;
        }
        self.senders.clear();
        for (id, handle) in self.threads.drain(..).enumerate() {
            if handle.join().is_err() {
                warn!(worker_id = id, "Tile worker panicked");
            }
        }
        debug!(workers = self.worker_count, "Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<K: TileKernel>(
    id: usize,
    mut kernel: K,
    requests: Receiver<TileRequest>,
    results: Sender<TileResult>,
) {
    debug!(worker_id = id, "Tile worker started");
    for request in requests {
        let start = Instant::now();
        let pixels = kernel.render_tile(&request);
        let result = TileResult::from_request(&request, pixels, start.elapsed(), id);
        if results.send(result).is_err() {
            break;
        }
    }
    debug!(worker_id = id, "Tile worker exiting");
}
