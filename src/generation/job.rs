use std::sync::Arc;

use futures::channel::oneshot;

use super::{GenerationResult, ImageGenerator};
use crate::error::GenerateError;
use crate::snapshot::Snapshot;
use crate::util::time;

type Outcome = Result<Snapshot, GenerateError>;

/// One generation request running on a worker thread.
///
/// The UI polls the job once per frame; there is no cancellation. Dropping
/// the job discards whatever the worker eventually produces.
pub struct GenerationJob {
    receiver: oneshot::Receiver<Outcome>,
    sketch: Snapshot,
    prompt: String,
}

impl GenerationJob {
    pub fn spawn(generator: Arc<dyn ImageGenerator>, sketch: Snapshot, prompt: String) -> Self {
        let (sender, receiver) = oneshot::channel();
        let worker_sketch = sketch.clone();
        let worker_prompt = prompt.clone();

        std::thread::spawn(move || {
            let outcome = generator.generate(&worker_sketch, &worker_prompt);
            if sender.send(outcome).is_err() {
                log::debug!("Generation finished after its job was dropped");
            }
        });

        Self {
            receiver,
            sketch,
            prompt,
        }
    }

    /// Check for completion without blocking
    pub fn poll(&mut self) -> Option<Result<GenerationResult, GenerateError>> {
        match self.receiver.try_recv() {
            Ok(Some(outcome)) => Some(self.finish(outcome)),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(worker_stopped())),
        }
    }

    /// Block until the worker is done
    pub fn wait(self) -> Result<GenerationResult, GenerateError> {
        let Self {
            receiver,
            sketch,
            prompt,
        } = self;

        let outcome = futures::executor::block_on(receiver).unwrap_or_else(|_| Err(worker_stopped()));
        outcome.map(|image| GenerationResult {
            sketch,
            image,
            prompt,
            created_at: time::timestamp_millis(),
        })
    }

    fn finish(&self, outcome: Outcome) -> Result<GenerationResult, GenerateError> {
        outcome.map(|image| GenerationResult {
            sketch: self.sketch.clone(),
            image,
            prompt: self.prompt.clone(),
            created_at: time::timestamp_millis(),
        })
    }
}

fn worker_stopped() -> GenerateError {
    GenerateError::Network("generation worker stopped unexpectedly".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::time::Duration;

    struct Echo;

    impl ImageGenerator for Echo {
        fn generate(&self, sketch: &Snapshot, _prompt: &str) -> Result<Snapshot, GenerateError> {
            Ok(sketch.clone())
        }
    }

    struct Panics;

    impl ImageGenerator for Panics {
        fn generate(&self, _sketch: &Snapshot, _prompt: &str) -> Result<Snapshot, GenerateError> {
            panic!("worker blew up");
        }
    }

    fn sketch() -> Snapshot {
        Snapshot::capture(&RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))).unwrap()
    }

    #[test]
    fn test_wait_returns_result_with_timestamp() {
        let job = GenerationJob::spawn(Arc::new(Echo), sketch(), "a lamp".to_owned());
        let result = job.wait().unwrap();

        assert_eq!(result.image, sketch());
        assert_eq!(result.prompt, "a lamp");
        assert!(result.created_at > 0);
    }

    #[test]
    fn test_poll_eventually_completes() {
        let mut job = GenerationJob::spawn(Arc::new(Echo), sketch(), "a lamp".to_owned());

        let mut outcome = None;
        for _ in 0..500 {
            outcome = job.poll();
            if outcome.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(matches!(outcome, Some(Ok(_))));
    }

    #[test]
    fn test_dead_worker_is_an_error() {
        let job = GenerationJob::spawn(Arc::new(Panics), sketch(), "x".to_owned());
        assert!(matches!(job.wait(), Err(GenerateError::Network(_))));
    }
}
