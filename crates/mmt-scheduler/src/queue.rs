//! Pending job storage, one implementation per scheduling policy
//!
//! Queues only store and order jobs. Locking, total capacity and shutdown are
//! handled by `Scheduler`, which owns the queue behind its mutex.

use crate::error::{SchedulerError, SchedulerResult};
use crate::job::Job;
use crate::priority::Priority;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// Ordered storage of pending jobs
pub trait JobQueue: Send {
    /// Check policy-specific limits for a job of `priority` with `splits` splits
    fn check_admission(&self, priority: Priority, splits: usize) -> SchedulerResult<()>;

    /// Store a job
    fn push(&mut self, job: Job);

    /// Remove the next job to run
    fn pop(&mut self) -> Option<Job>;

    /// Pending splits across all jobs
    fn len(&self) -> usize;

    /// Pending jobs
    fn job_count(&self) -> usize;

    /// True if nothing is pending
    fn is_empty(&self) -> bool {
        self.job_count() == 0
    }

    /// Remove every pending job
    fn drain(&mut self) -> Vec<Job>;
}

/// One FIFO per priority class; `pop` scans from most to least urgent.
///
/// Sustained high-priority load can starve the lower classes.
#[derive(Debug)]
pub struct ClassQueues {
    queues: [VecDeque<Job>; Priority::COUNT],
    sizes: [usize; Priority::COUNT],
    capacities: [usize; Priority::COUNT],
}

impl ClassQueues {
    /// Create with a split capacity per class, indexed by `Priority::index`
    pub fn new(capacities: [usize; Priority::COUNT]) -> Self {
        Self {
            queues: Default::default(),
            sizes: [0; Priority::COUNT],
            capacities,
        }
    }

    /// Pending splits in one class
    pub fn class_len(&self, priority: Priority) -> usize {
        self.sizes[priority.index()]
    }
}

impl JobQueue for ClassQueues {
    fn check_admission(&self, priority: Priority, splits: usize) -> SchedulerResult<()> {
        let index = priority.index();
        let (pending, capacity) = (self.sizes[index], self.capacities[index]);

        if pending + splits > capacity {
            return Err(SchedulerError::ClassOverloaded {
                priority,
                pending,
                incoming: splits,
                capacity,
            });
        }
        Ok(())
    }

    fn push(&mut self, job: Job) {
        let index = job.priority().index();
        self.sizes[index] += job.len();
        self.queues[index].push_back(job);
    }

    fn pop(&mut self) -> Option<Job> {
        for (index, queue) in self.queues.iter_mut().enumerate() {
            if let Some(job) = queue.pop_front() {
                self.sizes[index] -= job.len();
                return Some(job);
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.sizes.iter().sum()
    }

    fn job_count(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    fn drain(&mut self) -> Vec<Job> {
        self.sizes = [0; Priority::COUNT];
        self.queues.iter_mut().flat_map(|queue| queue.drain(..)).collect()
    }
}

/// Heap entry, reversed so the max-heap yields the most urgent, oldest job
#[derive(Debug)]
struct Queued(Job);

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.queue_order(&self.0)
    }
}

/// Single priority queue ordered by (priority, timestamp).
///
/// FIFO among equal priorities; an old low-priority job is still overtaken by
/// any newer high-priority one.
#[derive(Debug, Default)]
pub struct UnifiedQueue {
    heap: BinaryHeap<Queued>,
    size: usize,
}

impl UnifiedQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobQueue for UnifiedQueue {
    fn check_admission(&self, _priority: Priority, _splits: usize) -> SchedulerResult<()> {
        Ok(())
    }

    fn push(&mut self, job: Job) {
        self.size += job.len();
        self.heap.push(Queued(job));
    }

    fn pop(&mut self) -> Option<Job> {
        let Queued(job) = self.heap.pop()?;
        self.size -= job.len();
        Some(job)
    }

    fn len(&self) -> usize {
        self.size
    }

    fn job_count(&self) -> usize {
        self.heap.len()
    }

    fn drain(&mut self) -> Vec<Job> {
        self.size = 0;
        self.heap.drain().map(|Queued(job)| job).collect()
    }
}
