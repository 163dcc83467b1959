//! Background transport for the TUI.
//!
//! Each request runs on its own thread so the UI keeps redrawing and the user
//! can fire a second comparison before the first returns. Responses come back
//! over a channel tagged with their generation; the UI thread applies them to
//! the `WorkflowState`, which discards anything superseded.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use tracing::debug;

use crate::domain::ComparisonResultRaw;
use crate::error::{TransportError, WorkflowError};
use crate::service::PredictionService;
use crate::workflow::{Completion, Generation, PendingComparison, PendingUpload, WorkflowState};

pub enum Job {
    Upload(PendingUpload),
    Compare(PendingComparison),
}

#[derive(Debug)]
pub enum JobResult {
    Upload {
        generation: Generation,
        result: Result<String, TransportError>,
    },
    Compare {
        generation: Generation,
        result: Result<ComparisonResultRaw, WorkflowError>,
    },
}

impl JobResult {
    /// Feed the response into the state machine.
    pub fn apply(self, state: &mut WorkflowState) -> Completion {
        match self {
            JobResult::Upload { generation, result } => state.complete_upload(generation, result),
            JobResult::Compare { generation, result } => state.complete_comparison(generation, result),
        }
    }
}

pub struct Worker<S> {
    service: Arc<S>,
    tx: Sender<JobResult>,
    rx: Receiver<JobResult>,
}

impl<S: PredictionService + Send + Sync + 'static> Worker<S> {
    pub fn new(service: S) -> Self {
        let (tx, rx) = channel();
        Self {
            service: Arc::new(service),
            tx,
            rx,
        }
    }

    pub fn submit(&self, job: Job) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = match job {
                Job::Upload(p) => JobResult::Upload {
                    generation: p.generation,
                    result: service.upload(&p.dataset),
                },
                Job::Compare(p) => JobResult::Compare {
                    generation: p.generation,
                    result: service.compare(&p.request),
                },
            };
            // The receiver only disappears when the UI is shutting down.
            if tx.send(result).is_err() {
                debug!("dropping response after UI shutdown");
            }
        });
    }

    /// Next finished response, if any.
    pub fn try_recv(&self) -> Option<JobResult> {
        self.rx.try_recv().ok()
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: std::time::Duration) -> Option<JobResult> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::domain::{ComparisonRequest, DatasetRef, MethodResult, MethodSelection};

    /// Holds each compare call until the test releases it, in any order.
    struct Gated {
        gates: Mutex<Vec<Receiver<f64>>>,
    }

    impl PredictionService for Gated {
        fn upload(&self, dataset: &DatasetRef) -> Result<String, TransportError> {
            Ok(format!("uploaded {}", dataset.name()))
        }

        fn compare(&self, _: &ComparisonRequest) -> Result<ComparisonResultRaw, WorkflowError> {
            let gate = self.gates.lock().unwrap().remove(0);
            let value = gate.recv().unwrap();
            Ok(ComparisonResultRaw {
                results: vec![MethodResult {
                    historical: vec![value],
                    future: vec![],
                }],
                historical_x: vec![0.0],
                future_x: vec![],
            })
        }
    }

    #[test]
    fn late_response_from_first_request_is_discarded() {
        let (open_a, gate_a) = channel();
        let (open_b, gate_b) = channel();
        let worker = Worker::new(Gated {
            gates: Mutex::new(vec![gate_a, gate_b]),
        });

        let mut state = WorkflowState::default();
        state.select_methods(MethodSelection::parse(&["lagrange"]).unwrap());

        let a = state.begin_comparison().unwrap();
        worker.submit(Job::Compare(a));
        // Make sure request A has claimed the first gate before B is submitted.
        std::thread::sleep(Duration::from_millis(50));
        let b = state.begin_comparison().unwrap();
        worker.submit(Job::Compare(b));

        open_b.send(2.0).unwrap();
        let first = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.apply(&mut state), Completion::Applied);

        open_a.send(1.0).unwrap();
        let second = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second.apply(&mut state), Completion::Stale);

        assert_eq!(state.chart().unwrap().series[0].points, vec![2.0]);
    }

    #[test]
    fn upload_result_round_trips_through_channel() {
        let worker = Worker::new(Gated {
            gates: Mutex::new(Vec::new()),
        });
        let mut state = WorkflowState::default();
        state.select_dataset(DatasetRef::new("consumo.csv"));
        worker.submit(Job::Upload(state.begin_upload().unwrap()));

        let res = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(res.apply(&mut state), Completion::Applied);
        assert_eq!(state.notice().unwrap().text, "uploaded consumo.csv");
    }
}
