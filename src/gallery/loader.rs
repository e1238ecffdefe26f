//! Incremental gallery loader.
//!
//! - One long-lived worker thread renders previews batch by batch
//! - At most one batch is in flight; the next is requested on scroll
//! - Every reset bumps a generation counter; work and results tagged with an
//!   older generation are dropped on both sides of the channel
//! - Uses flume for communication between the worker and the main thread

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender};
use tracing::{debug, error, trace, warn};

use crate::error::Result;
use crate::models::IconEntry;
use crate::thumbnails::RenderCache;

/// How often an idle worker checks for shutdown.
const WORKER_POLL_MS: u64 = 100;

/// Produces the preview image for one gallery tile.
pub trait TileRenderer: Send + Sync + 'static {
    fn render(&self, icon: &IconEntry) -> Result<PathBuf>;
}

impl TileRenderer for RenderCache {
    fn render(&self, icon: &IconEntry) -> Result<PathBuf> {
        self.get_or_render(icon)
    }
}

/// A rendered preview ready to be placed in the grid.
#[derive(Debug, Clone)]
pub struct Tile {
    pub generation: u64,
    /// Position of the icon in the display list.
    pub index: usize,
    pub icon: IconEntry,
    pub preview: PathBuf,
}

#[derive(Debug, Clone)]
pub enum GalleryEvent {
    Tile(Tile),
    /// The worker is done with a batch and free for the next one.
    BatchFinished { generation: u64, aborted: bool },
}

#[cfg(test)]
impl GalleryEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Tile(tile) => tile.generation,
            Self::BatchFinished { generation, .. } => *generation,
        }
    }
}

#[derive(Debug)]
struct BatchRequest {
    generation: u64,
    start: usize,
    icons: Vec<IconEntry>,
}

pub struct GalleryLoader {
    request_tx: Option<Sender<BatchRequest>>,
    event_rx: Receiver<GalleryEvent>,
    worker: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    in_flight: Arc<AtomicBool>,
    display: Vec<IconEntry>,
    loaded: usize,
    batch_size: usize,
}

impl GalleryLoader {
    pub fn new<R: TileRenderer>(renderer: R, batch_size: usize) -> std::io::Result<Self> {
        let (request_tx, request_rx) = flume::unbounded();
        let (event_tx, event_rx) = flume::unbounded();

        let shutdown = Arc::new(AtomicBool::new(false));
        let generation = Arc::new(AtomicU64::new(0));
        let in_flight = Arc::new(AtomicBool::new(false));

        let worker = {
            let shutdown = Arc::clone(&shutdown);
            let generation = Arc::clone(&generation);
            let in_flight = Arc::clone(&in_flight);
            thread::Builder::new()
                .name("gallery-worker".to_string())
                .spawn(move || {
                    worker_loop(
                        renderer, request_rx, event_tx, shutdown, generation, in_flight,
                    );
                })?
        };

        debug!(batch_size, "Started gallery loader");

        Ok(Self {
            request_tx: Some(request_tx),
            event_rx,
            worker: Some(worker),
            shutdown,
            generation,
            in_flight,
            display: Vec::new(),
            loaded: 0,
            batch_size: batch_size.max(1),
        })
    }

    /// Replace the display list and invalidate everything already requested.
    pub fn reset(&mut self, display: Vec<IconEntry>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let items = display.len();
        debug!(generation, items, "Reset gallery");
        self.display = display;
        self.loaded = 0;
        generation
    }

    /// Dispatch the next batch. Returns false when a batch is still in
    /// flight or nothing is left to load.
    pub fn load_more(&mut self) -> bool {
        if self.in_flight.load(Ordering::Acquire) || self.is_exhausted() {
            return false;
        }
        let Some(tx) = &self.request_tx else {
            return false;
        };

        let start = self.loaded;
        let end = (start + self.batch_size).min(self.display.len());
        let request = BatchRequest {
            generation: self.generation(),
            start,
            icons: self.display[start..end].to_vec(),
        };

        self.in_flight.store(true, Ordering::Release);
        if let Err(e) = tx.send(request) {
            error!(error = %e, "Gallery worker disconnected");
            self.in_flight.store(false, Ordering::Release);
            return false;
        }

        trace!(start, end, "Requested gallery batch");
        self.loaded = end;
        true
    }

    /// Tiles of the current generation and every finish notice, without
    /// blocking. Finish notices are kept even when stale because they mean
    /// the worker is free again.
    pub fn drain(&self) -> Vec<GalleryEvent> {
        let current = self.generation();
        self.event_rx
            .try_iter()
            .filter(|event| Self::is_relevant(event, current))
            .collect()
    }

    fn is_relevant(event: &GalleryEvent, current: u64) -> bool {
        match event {
            GalleryEvent::Tile(tile) => tile.generation == current,
            GalleryEvent::BatchFinished { .. } => true,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn remaining(&self) -> usize {
        self.display.len().saturating_sub(self.loaded)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_exhausted(&self) -> bool {
        self.loaded >= self.display.len()
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(&mut self) {
        debug!("Shutting down gallery loader");
        self.shutdown.store(true, Ordering::SeqCst);
        // Bump the generation so a batch in progress stops at the next icon.
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.request_tx.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for GalleryLoader {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shutdown();
        }
    }
}

fn worker_loop<R: TileRenderer>(
    renderer: R,
    rx: Receiver<BatchRequest>,
    tx: Sender<GalleryEvent>,
    shutdown: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    in_flight: Arc<AtomicBool>,
) {
    debug!("Gallery worker started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match rx.recv_timeout(Duration::from_millis(WORKER_POLL_MS)) {
            Ok(request) => {
                let batch_generation = request.generation;
                let aborted = process_batch(&renderer, request, &tx, &generation);
                in_flight.store(false, Ordering::Release);
                if tx
                    .send(GalleryEvent::BatchFinished {
                        generation: batch_generation,
                        aborted,
                    })
                    .is_err()
                {
                    break;
                }
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("Gallery worker stopped");
}

/// Render one batch. Returns true if it was cut short by a newer generation.
fn process_batch<R: TileRenderer>(
    renderer: &R,
    request: BatchRequest,
    tx: &Sender<GalleryEvent>,
    generation: &AtomicU64,
) -> bool {
    let BatchRequest {
        generation: batch_generation,
        start,
        icons,
    } = request;

    for (offset, icon) in icons.into_iter().enumerate() {
        if generation.load(Ordering::Acquire) != batch_generation {
            trace!(batch_generation, "Abandoning stale gallery batch");
            return true;
        }

        let preview = match renderer.render(&icon) {
            Ok(preview) => preview,
            Err(e) => {
                warn!(path = ?icon.path, error = %e, "Failed to render icon preview");
                continue;
            }
        };

        let tile = Tile {
            generation: batch_generation,
            index: start + offset,
            icon,
            preview,
        };
        if tx.send(GalleryEvent::Tile(tile)).is_err() {
            return true;
        }
    }
    false
}
