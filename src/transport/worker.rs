//! Fixed-size worker pool driving connection handlers.

use parking_lot::Mutex;
use std::sync::{mpsc, Arc};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

pub(crate) struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn new(size: usize) -> WorkerPool {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut workers = Vec::with_capacity(size);
        for _ in 0..size {
            let receiver = Arc::clone(&receiver);
            workers.push(thread::spawn(move || loop {
                let job = {
                    let guard = receiver.lock();
                    guard.recv()
                };
                match job {
                    Ok(job) => job(),
                    Err(_) => break,
                }
            }));
        }
        WorkerPool {
            sender: Some(sender),
            workers,
        }
    }

    pub(crate) fn default_size() -> usize {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
    }

    pub(crate) fn execute(&self, job: Job) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(job);
        }
    }

    /// Close the queue and join every worker; queued jobs finish first.
    pub(crate) fn shutdown(mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
