//! Background detection worker.
//!
//! Detection runs on one dedicated thread so the caller's interactive thread
//! never waits on it. The two sides only exchange messages:
//!
//! ```text
//!  caller thread                          worker thread
//!  submit(buffer) ──Request{token, buffer, reply}──▶ luma + detect
//!  PendingDetection ◀──Response{token, result}────── (one per request)
//! ```
//!
//! Requests are processed one at a time in submission order. A newer image
//! does not cancel an older one: both runs finish and each pending handle
//! receives only the response carrying its own token. Stopping the worker
//! discards requests that have not started; their handles report
//! `WorkerUnavailable`.

use crate::detect::Detector;
use crate::image::PixelBuffer;
use crate::keypoint::KeypointSet;
use crate::runtime::runtime;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{MagsnapError, MagsnapResult};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

/// Identifies one submission; responses carry the token of their request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionToken(u64);

impl SubmissionToken {
    /// Raw token value (monotonically increasing per worker).
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Request {
    token: SubmissionToken,
    buffer: PixelBuffer,
    reply: mpsc::Sender<Response>,
}

/// Worker reply for one submission.
#[derive(Debug)]
pub struct Response {
    /// Token of the request this answers.
    pub token: SubmissionToken,
    /// Detected keypoints or the failure that stopped detection.
    pub result: MagsnapResult<KeypointSet>,
}

/// Owns the worker thread and its request channel.
pub struct DetectionWorker {
    request_tx: Option<mpsc::Sender<Request>>,
    thread_handle: Option<JoinHandle<()>>,
    next_token: AtomicU64,
    should_stop: Arc<AtomicBool>,
    detector_name: &'static str,
}

impl fmt::Debug for DetectionWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionWorker")
            .field("detector", &self.detector_name)
            .field("running", &self.is_running())
            .finish()
    }
}

impl DetectionWorker {
    /// Starts a worker thread that runs `detector` for every submission.
    pub fn spawn<D>(detector: D) -> MagsnapResult<Self>
    where
        D: Detector + 'static,
    {
        let detector_name = detector.name();
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let should_stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&should_stop);

        let handle = thread::Builder::new()
            .name("magsnap-worker".into())
            .spawn(move || serve(detector, request_rx, &stop_flag))
            .map_err(|err| MagsnapError::WorkerUnavailable {
                reason: err.to_string(),
            })?;

        Ok(Self {
            request_tx: Some(request_tx),
            thread_handle: Some(handle),
            next_token: AtomicU64::new(1),
            should_stop,
            detector_name,
        })
    }

    /// Queues `buffer` for detection and returns immediately.
    ///
    /// The buffer is moved into the request; clone it first if the caller
    /// keeps editing its own copy.
    pub fn submit(&self, buffer: PixelBuffer) -> MagsnapResult<PendingDetection> {
        let request_tx = self
            .request_tx
            .as_ref()
            .ok_or_else(|| MagsnapError::WorkerUnavailable {
                reason: "worker stopped".into(),
            })?;

        let token = SubmissionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (reply, reply_rx) = mpsc::channel();
        request_tx
            .send(Request {
                token,
                buffer,
                reply,
            })
            .map_err(|_| MagsnapError::WorkerUnavailable {
                reason: "worker thread exited".into(),
            })?;

        trace_event!("submitted", token = token.value());
        Ok(PendingDetection {
            token,
            reply_rx,
            delivered: false,
        })
    }

    /// Name of the detector this worker runs.
    pub fn detector_name(&self) -> &'static str {
        self.detector_name
    }

    /// True while the worker thread is alive and joinable.
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops accepting submissions and discards queued requests that have
    /// not started. Returns at once; a run already in progress finishes on
    /// the worker thread, which then exits.
    pub fn stop(&mut self) {
        self.should_stop.store(true, Ordering::Release);
        self.request_tx = None;
    }

    /// Like [`stop`](Self::stop), then waits for the worker thread to exit.
    ///
    /// Blocks for at most the remainder of the run in progress.
    pub fn shutdown(&mut self) {
        self.stop();
        if let Some(handle) = self.thread_handle.take() {
            if let Err(payload) = handle.join() {
                let reason = panic_reason(payload.as_ref());
                trace_warn!("worker_panicked", reason = reason.as_str());
            }
        }
    }
}

impl Drop for DetectionWorker {
    // Never joins: dropping must not block the caller on detection.
    fn drop(&mut self) {
        self.stop();
        self.thread_handle = None;
    }
}

fn serve<D: Detector>(detector: D, request_rx: mpsc::Receiver<Request>, should_stop: &AtomicBool) {
    for request in request_rx {
        let Request {
            token,
            buffer,
            reply,
        } = request;
        if should_stop.load(Ordering::Acquire) {
            // Dropping `reply` disconnects the pending handle.
            trace_event!("request_discarded", token = token.value());
            continue;
        }
        let result = run_detection(&detector, &buffer, token);
        if reply.send(Response { token, result }).is_err() {
            // Caller dropped its handle; the result is stale.
            trace_event!("response_discarded", token = token.value());
        }
    }
}

fn run_detection<D: Detector>(
    detector: &D,
    buffer: &PixelBuffer,
    token: SubmissionToken,
) -> MagsnapResult<KeypointSet> {
    let _span = trace_span!(
        "detect",
        token = token.value(),
        detector = detector.name(),
        width = buffer.width(),
        height = buffer.height()
    )
    .entered();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        runtime().install(|| detector.detect_buffer(buffer))
    }));

    let result = match outcome {
        Ok(Ok(keypoints)) => Ok(keypoints),
        Ok(Err(err @ MagsnapError::DetectionFailure { .. })) => Err(err),
        Ok(Err(err)) if err.is_invalid_input() => Err(err),
        Ok(Err(err)) => Err(MagsnapError::DetectionFailure {
            reason: err.to_string(),
        }),
        Err(payload) => Err(MagsnapError::DetectionFailure {
            reason: panic_reason(payload.as_ref()),
        }),
    };

    match &result {
        Ok(keypoints) => {
            trace_event!("detected", count = keypoints.len());
        }
        Err(err) => {
            let reason = err.to_string();
            trace_warn!("detection_failed", token = token.value(), reason = reason.as_str());
        }
    }
    result
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("detector panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("detector panicked: {msg}")
    } else {
        "detector panicked".to_string()
    }
}

/// Handle to one in-flight submission.
#[derive(Debug)]
pub struct PendingDetection {
    token: SubmissionToken,
    reply_rx: mpsc::Receiver<Response>,
    delivered: bool,
}

impl PendingDetection {
    /// Token assigned to this submission.
    pub fn token(&self) -> SubmissionToken {
        self.token
    }

    /// Returns the result if detection has finished, without blocking.
    ///
    /// Yields `Some` exactly once; later calls return `None`.
    pub fn poll(&mut self) -> Option<MagsnapResult<KeypointSet>> {
        if self.delivered {
            return None;
        }
        let outcome = match self.reply_rx.try_recv() {
            Ok(response) => self.accept(response),
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(disconnected()),
        };
        self.delivered = true;
        Some(outcome)
    }

    /// Blocks until detection finishes.
    pub fn wait(mut self) -> MagsnapResult<KeypointSet> {
        if self.delivered {
            return Err(MagsnapError::WorkerUnavailable {
                reason: "result already taken".into(),
            });
        }
        self.delivered = true;
        match self.reply_rx.recv() {
            Ok(response) => self.accept(response),
            Err(_) => Err(disconnected()),
        }
    }

    fn accept(&self, response: Response) -> MagsnapResult<KeypointSet> {
        debug_assert_eq!(response.token, self.token, "reply routed to wrong handle");
        if response.token != self.token {
            return Err(MagsnapError::DetectionFailure {
                reason: format!(
                    "response {} does not match submission {}",
                    response.token, self.token
                ),
            });
        }
        response.result
    }
}

fn disconnected() -> MagsnapError {
    MagsnapError::WorkerUnavailable {
        reason: "worker stopped before replying".into(),
    }
}
