use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use crate::landmarks::domain::body_landmarks::LandmarkSet;
use crate::landmarks::domain::landmark_extractor::LandmarkExtractor;
use crate::measurement::domain::measurement_calculator::measure_landmarks;
use crate::measurement::domain::pixel_measurements::{MeasurementMode, PixelMeasurements};
use crate::measurement::domain::pixel_measurer::PixelMeasurer;
use crate::measurement::domain::proportion_estimator::estimate_proportions;
use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

/// Requests allowed to wait while the worker is busy.
const QUEUE_CAPACITY: usize = 1;

struct DetectJob {
    frame: Frame,
    deadline: Instant,
    reply: Sender<Result<LandmarkSet, MeasureError>>,
}

/// Measures from detected landmarks, bounding each detection by a timeout.
///
/// Detection runs on one long-lived worker thread fed by a bounded queue.
/// A request that cannot be queued, or whose result does not arrive before
/// its deadline, fails with `Timeout`. Inference cannot be interrupted, so a
/// stuck detection keeps the worker busy, but it never adds threads.
///
/// Also usable as a [`LandmarkExtractor`] with the same bound.
pub struct LandmarkMeasurer {
    jobs: Sender<DetectJob>,
    timeout: Duration,
    strict: bool,
}

impl LandmarkMeasurer {
    /// With `strict = false`, a missing pose yields a whole proportion
    /// estimate instead of `PoseNotDetected`.
    pub fn new(
        extractor: Arc<dyn LandmarkExtractor>,
        timeout: Duration,
        strict: bool,
    ) -> Result<Self, MeasureError> {
        let (jobs, queue) = crossbeam_channel::bounded(QUEUE_CAPACITY);
        thread::Builder::new()
            .name("pose-detect".into())
            .spawn(move || run_worker(extractor, queue))
            .map_err(|e| MeasureError::Inference(format!("failed to spawn pose worker: {e}")))?;

        Ok(Self {
            jobs,
            timeout,
            strict,
        })
    }

    fn detect_with_timeout(&self, frame: &Frame) -> Result<LandmarkSet, MeasureError> {
        let deadline = Instant::now() + self.timeout;
        let (reply, result) = crossbeam_channel::bounded(1);
        let job = DetectJob {
            frame: frame.clone(),
            deadline,
            reply,
        };

        match self.jobs.send_timeout(job, remaining(deadline)) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                log::debug!("Pose worker busy, request not queued");
                return Err(self.timed_out());
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                return Err(MeasureError::Inference("pose worker is not running".into()));
            }
        }

        match result.recv_timeout(remaining(deadline)) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out()),
            Err(RecvTimeoutError::Disconnected) => {
                Err(MeasureError::Inference("pose worker dropped the request".into()))
            }
        }
    }

    fn timed_out(&self) -> MeasureError {
        MeasureError::Timeout {
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Serves jobs until every sender is dropped.
fn run_worker(extractor: Arc<dyn LandmarkExtractor>, queue: Receiver<DetectJob>) {
    for job in queue.iter() {
        if Instant::now() >= job.deadline {
            log::debug!("Dropping pose request that expired in the queue");
            continue;
        }
        let result = panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(&job.frame)))
            .unwrap_or_else(|_| Err(MeasureError::Inference("pose extractor panicked".into())));
        // Receiver is gone if the caller already timed out.
        let _ = job.reply.send(result);
    }
}

impl LandmarkExtractor for LandmarkMeasurer {
    /// Always strict: a missing pose is reported, never estimated.
    fn extract(&self, frame: &Frame) -> Result<LandmarkSet, MeasureError> {
        self.detect_with_timeout(frame)
    }
}

impl PixelMeasurer for LandmarkMeasurer {
    fn mode(&self) -> MeasurementMode {
        MeasurementMode::Landmarks
    }

    fn measure(&self, frame: &Frame) -> Result<PixelMeasurements, MeasureError> {
        let start = Instant::now();
        let result = self.detect_with_timeout(frame).map(|set| measure_landmarks(&set));
        log::debug!(
            "Pose detection took {:.1}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        match result {
            Err(MeasureError::PoseNotDetected) if !self.strict => {
                log::warn!("No pose detected, using proportion estimate");
                Ok(estimate_proportions(frame.width(), frame.height()))
            }
            other => other,
        }
    }
}
