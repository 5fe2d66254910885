use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;

use livery_application::{
    ApplicationError, AssetDecoder, AssetPipeline, DecodedAsset, LoadOutcome, LoadRequest,
    PipelineStats,
};
use livery_domain::ImageRef;
use tracing::{debug, trace};

type AssetCache = Arc<Mutex<HashMap<ImageRef, Arc<DecodedAsset>>>>;

#[derive(Debug)]
enum Job {
    Load(LoadRequest),
    Prefetch(ImageRef),
}

/// Decodes assets on one worker thread. Loads always jump ahead of queued
/// prefetches; both share one cache.
pub struct BackgroundAssetPipeline {
    submit_tx: mpsc::Sender<Job>,
    result_rx: mpsc::Receiver<LoadOutcome>,
    stats: Arc<Mutex<PipelineStats>>,
}

impl BackgroundAssetPipeline {
    pub fn new(decoder: Arc<dyn AssetDecoder>) -> Self {
        let (submit_tx, submit_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel::<LoadOutcome>();
        let stats = Arc::new(Mutex::new(PipelineStats::default()));
        let cache: AssetCache = Arc::new(Mutex::new(HashMap::new()));

        spawn_worker(submit_rx, result_tx, decoder, cache, Arc::clone(&stats));

        Self {
            submit_tx,
            result_rx,
            stats,
        }
    }
}

impl AssetPipeline for BackgroundAssetPipeline {
    fn submit(&self, request: LoadRequest) -> Result<(), ApplicationError> {
        if let Ok(mut stats) = self.stats.lock() {
            stats.submitted += 1;
        }
        self.submit_tx
            .send(Job::Load(request))
            .map_err(|_| ApplicationError::Pipeline("asset worker stopped".to_string()))
    }

    fn prefetch(&self, images: Vec<ImageRef>) -> Result<(), ApplicationError> {
        for image in images {
            self.submit_tx
                .send(Job::Prefetch(image))
                .map_err(|_| ApplicationError::Pipeline("asset worker stopped".to_string()))?;
        }
        Ok(())
    }

    fn try_receive(&self) -> Result<Option<LoadOutcome>, ApplicationError> {
        match self.result_rx.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ApplicationError::Pipeline(
                "asset worker stopped".to_string(),
            )),
        }
    }

    fn stats(&self) -> Result<PipelineStats, ApplicationError> {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .map_err(|_| ApplicationError::Pipeline("stats lock poisoned".to_string()))
    }
}

fn spawn_worker(
    submit_rx: mpsc::Receiver<Job>,
    result_tx: mpsc::Sender<LoadOutcome>,
    decoder: Arc<dyn AssetDecoder>,
    cache: AssetCache,
    stats: Arc<Mutex<PipelineStats>>,
) {
    thread::spawn(move || {
        let mut backlog: VecDeque<ImageRef> = VecDeque::new();

        loop {
            let job = if backlog.is_empty() {
                match submit_rx.recv() {
                    Ok(job) => job,
                    Err(_) => return,
                }
            } else {
                match submit_rx.try_recv() {
                    Ok(job) => job,
                    Err(TryRecvError::Empty) => {
                        if let Some(image) = backlog.pop_front() {
                            prefetch_one(&image, decoder.as_ref(), &cache, &stats);
                        }
                        continue;
                    }
                    Err(TryRecvError::Disconnected) => return,
                }
            };

            match job {
                Job::Prefetch(image) => backlog.push_back(image),
                Job::Load(request) => {
                    let result = load_one(&request.image, decoder.as_ref(), &cache, &stats);
                    let outcome = LoadOutcome {
                        ticket: request.ticket,
                        result,
                    };
                    if result_tx.send(outcome).is_err() {
                        return;
                    }
                }
            }
        }
    });
}

fn cached(cache: &AssetCache, image: &ImageRef) -> Option<Arc<DecodedAsset>> {
    cache.lock().ok()?.get(image).cloned()
}

fn load_one(
    image: &ImageRef,
    decoder: &dyn AssetDecoder,
    cache: &AssetCache,
    stats: &Arc<Mutex<PipelineStats>>,
) -> Result<Arc<DecodedAsset>, ApplicationError> {
    if let Some(hit) = cached(cache, image) {
        trace!(%image, "asset served from cache");
        if let Ok(mut s) = stats.lock() {
            s.cache_hits += 1;
            s.completed += 1;
        }
        return Ok(hit);
    }

    match decoder.decode(image) {
        Ok(asset) => {
            let asset = Arc::new(asset);
            if let Ok(mut entries) = cache.lock() {
                entries.insert(image.clone(), Arc::clone(&asset));
            }
            if let Ok(mut s) = stats.lock() {
                s.completed += 1;
            }
            Ok(asset)
        }
        Err(error) => {
            if let Ok(mut s) = stats.lock() {
                s.failed += 1;
            }
            Err(error)
        }
    }
}

fn prefetch_one(
    image: &ImageRef,
    decoder: &dyn AssetDecoder,
    cache: &AssetCache,
    stats: &Arc<Mutex<PipelineStats>>,
) {
    if cached(cache, image).is_some() {
        return;
    }
    match decoder.decode(image) {
        Ok(asset) => {
            if let Ok(mut entries) = cache.lock() {
                entries.insert(image.clone(), Arc::new(asset));
            }
            if let Ok(mut s) = stats.lock() {
                s.prefetched += 1;
            }
        }
        Err(error) => debug!(%image, %error, "prefetch failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FsAssetDecoder;
    use image::{ImageBuffer, Rgb};
    use livery_domain::{LoadTicket, VariantId};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn write_test_png(dir: &TempDir, name: &str) {
        let pixels = ImageBuffer::from_pixel(8, 6, Rgb([120_u8, 80_u8, 40_u8]));
        pixels.save(dir.path().join(name)).expect("save png");
    }

    fn ticket(variant: &str, sequence: u64) -> LoadTicket {
        LoadTicket {
            variant: VariantId::new(variant).expect("id"),
            sequence,
        }
    }

    fn wait_for_outcome(pipeline: &BackgroundAssetPipeline) -> LoadOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = pipeline.try_receive().expect("poll") {
                return outcome;
            }
            assert!(Instant::now() < deadline, "timed out waiting for asset");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn load_outcome_carries_its_ticket() {
        let dir = TempDir::new().expect("tempdir");
        write_test_png(&dir, "a.png");
        let pipeline = BackgroundAssetPipeline::new(Arc::new(FsAssetDecoder::new(dir.path())));

        pipeline
            .submit(LoadRequest {
                ticket: ticket("a", 7),
                image: ImageRef::new("a.png"),
            })
            .expect("submit");

        let outcome = wait_for_outcome(&pipeline);
        assert_eq!(outcome.ticket, ticket("a", 7));
        let asset = outcome.result.expect("decoded");
        assert_eq!((asset.width, asset.height), (8, 6));
    }

    #[test]
    fn failed_load_is_reported_not_dropped() {
        let dir = TempDir::new().expect("tempdir");
        let pipeline = BackgroundAssetPipeline::new(Arc::new(FsAssetDecoder::new(dir.path())));

        pipeline
            .submit(LoadRequest {
                ticket: ticket("ghost", 1),
                image: ImageRef::new("ghost.png"),
            })
            .expect("submit");

        let outcome = wait_for_outcome(&pipeline);
        assert_eq!(outcome.ticket, ticket("ghost", 1));
        assert!(matches!(outcome.result, Err(ApplicationError::NotFound(_))));
        assert_eq!(pipeline.stats().expect("stats").failed, 1);
    }

    #[test]
    fn prefetched_assets_are_served_from_cache() {
        let dir = TempDir::new().expect("tempdir");
        write_test_png(&dir, "a.png");
        write_test_png(&dir, "b.png");
        let pipeline = BackgroundAssetPipeline::new(Arc::new(FsAssetDecoder::new(dir.path())));

        pipeline
            .prefetch(vec![ImageRef::new("a.png"), ImageRef::new("b.png")])
            .expect("prefetch");

        let deadline = Instant::now() + Duration::from_secs(5);
        while pipeline.stats().expect("stats").prefetched < 2 {
            assert!(Instant::now() < deadline, "timed out waiting for prefetch");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(pipeline.try_receive().expect("poll").is_none());

        pipeline
            .submit(LoadRequest {
                ticket: ticket("b", 2),
                image: ImageRef::new("b.png"),
            })
            .expect("submit");
        let outcome = wait_for_outcome(&pipeline);
        assert!(outcome.result.is_ok());

        let stats = pipeline.stats().expect("stats");
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.completed, 1);
    }

    #[test]
    fn failed_prefetch_produces_no_outcome() {
        let dir = TempDir::new().expect("tempdir");
        write_test_png(&dir, "a.png");
        let pipeline = BackgroundAssetPipeline::new(Arc::new(FsAssetDecoder::new(dir.path())));

        pipeline
            .prefetch(vec![ImageRef::new("missing.png")])
            .expect("prefetch");
        pipeline
            .submit(LoadRequest {
                ticket: ticket("a", 1),
                image: ImageRef::new("a.png"),
            })
            .expect("submit");

        let outcome = wait_for_outcome(&pipeline);
        assert_eq!(outcome.ticket, ticket("a", 1));
        thread::sleep(Duration::from_millis(50));
        assert!(pipeline.try_receive().expect("poll").is_none());
    }
}
