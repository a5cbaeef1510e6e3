//! Scheduler integration tests for mmt-scheduler
//!
//! Admission, ordering, completion and shutdown behaviour, run against both
//! scheduling policies.

use mmt_scheduler::{
    Priority, Scheduler, SchedulerConfig, SchedulerError, SchedulingPolicy, TranslationError,
    TranslationSplit,
};
use mmt_types::{LanguageDirection, Sentence, Translation};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

fn direction() -> LanguageDirection {
    LanguageDirection::new("en", "it")
}

fn split(text: &str, priority: Priority) -> Arc<TranslationSplit> {
    Arc::new(TranslationSplit::new(Sentence::from_text(text), priority))
}

fn scheduler(policy: SchedulingPolicy, queue_size: usize) -> Scheduler {
    Scheduler::new(SchedulerConfig::new(policy, queue_size)).unwrap()
}

/// Text of the first split of the next job
fn take_text(scheduler: &Scheduler) -> String {
    scheduler.take().unwrap().splits()[0].sentence().to_string()
}

// ==================== Admission ====================

#[test]
fn test_capacity_scenario() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = scheduler(policy, 2);

        scheduler.schedule(direction(), vec![split("a", Priority::Normal)], None).unwrap();
        scheduler.schedule(direction(), vec![split("b", Priority::Normal)], None).unwrap();
        let result = scheduler.schedule(direction(), vec![split("c", Priority::Normal)], None);

        assert!(result.unwrap_err().is_unavailable(), "{policy}");
        assert_eq!(scheduler.pending_len(), 2);
    }
}

#[test]
fn test_admission_is_atomic() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = scheduler(policy, 5);
        let mut expected = 0;

        for k in [2, 2, 3, 1, 4, 1] {
            let splits: Vec<_> = (0..k).map(|_| split("x", Priority::Normal)).collect();
            let before = scheduler.pending_len();

            match scheduler.schedule(direction(), splits.clone(), None) {
                Ok(lock) => {
                    expected += k;
                    assert_eq!(lock.total(), k);
                    assert_eq!(scheduler.pending_len(), before + k);
                }
                Err(err) => {
                    assert!(err.is_unavailable());
                    assert_eq!(scheduler.pending_len(), before);
                    // A rejected split can be resubmitted later
                    assert!(splits.iter().all(|s| !s.is_scheduled()));
                }
            }
        }

        assert_eq!(scheduler.pending_len(), expected);
        assert_eq!(expected, 5);
    }
}

#[test]
fn test_concurrent_producers_respect_capacity() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = Arc::new(scheduler(policy, 50));
        let admitted = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..8)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                let admitted = Arc::clone(&admitted);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let splits = vec![split("a", Priority::Normal), split("b", Priority::Normal)];
                        if scheduler.schedule(direction(), splits, None).is_ok() {
                            admitted.fetch_add(2, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 50);
        assert_eq!(scheduler.pending_len(), 50);
    }
}

// ==================== Ordering ====================

#[test]
fn test_priority_before_submission_order() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = scheduler(policy, 16);

        scheduler.schedule(direction(), vec![split("low", Priority::Background)], None).unwrap();
        scheduler.schedule(direction(), vec![split("high", Priority::High)], None).unwrap();

        assert_eq!(take_text(&scheduler), "high", "{policy}");
        assert_eq!(take_text(&scheduler), "low", "{policy}");
    }
}

#[test]
fn test_fifo_within_priority() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = scheduler(policy, 16);
        for text in ["first", "second", "third"] {
            scheduler.schedule(direction(), vec![split(text, Priority::Normal)], None).unwrap();
        }

        let order: Vec<_> = (0..3).map(|_| take_text(&scheduler)).collect();
        assert_eq!(order, ["first", "second", "third"], "{policy}");
    }
}

#[test]
fn test_urgent_job_overtakes_queue() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = scheduler(policy, 16);

        scheduler.schedule(direction(), vec![split("normal-1", Priority::Normal)], None).unwrap();
        scheduler.schedule(direction(), vec![split("normal-2", Priority::Normal)], None).unwrap();
        scheduler.schedule(direction(), vec![split("urgent", Priority::High)], None).unwrap();

        let order: Vec<_> = (0..3).map(|_| take_text(&scheduler)).collect();
        assert_eq!(order, ["urgent", "normal-1", "normal-2"], "{policy}");
    }
}

#[test]
fn test_job_priority_is_most_urgent_split() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = scheduler(policy, 16);

        scheduler.schedule(direction(), vec![split("normal", Priority::Normal)], None).unwrap();
        scheduler
            .schedule(
                direction(),
                vec![split("batch", Priority::Background), split("one", Priority::High)],
                None,
            )
            .unwrap();

        let job = scheduler.take().unwrap();
        assert_eq!(job.priority(), Priority::High, "{policy}");
        assert_eq!(job.len(), 2);
    }
}

#[test]
fn test_job_is_unit_of_dequeue() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = Arc::new(scheduler(policy, 16));
        let splits = vec![
            split("a", Priority::Normal),
            split("b", Priority::Normal),
            split("c", Priority::Normal),
        ];
        scheduler.schedule(direction(), splits, None).unwrap();

        let (tx, rx) = mpsc::channel();
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                let tx = tx.clone();
                thread::spawn(move || {
                    if let Ok(job) = scheduler.take() {
                        tx.send(job.len()).unwrap();
                    }
                })
            })
            .collect();

        let taken = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(taken, 3);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        scheduler.close();
        for consumer in consumers {
            consumer.join().unwrap();
        }
        assert!(rx.try_recv().is_err());
    }
}

#[test]
fn test_each_job_taken_exactly_once() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = Arc::new(scheduler(policy, 1000));
        for i in 0..200 {
            let priority = Priority::ALL[i % Priority::COUNT];
            scheduler.schedule(direction(), vec![split("x", priority)], None).unwrap();
        }

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                thread::spawn(move || {
                    let mut sequences = Vec::new();
                    while let Ok(Some(job)) = scheduler.take_timeout(Duration::from_millis(50)) {
                        sequences.push(job.sequence());
                    }
                    sequences
                })
            })
            .collect();

        let mut all: Vec<u64> = consumers
            .into_iter()
            .flat_map(|c| c.join().unwrap())
            .collect();
        all.sort_unstable();

        assert_eq!(all, (0..200).collect::<Vec<u64>>(), "{policy}");
    }
}

proptest! {
    #[test]
    fn prop_dequeue_order_is_priority_then_fifo(priorities in proptest::collection::vec(0usize..3, 1..40)) {
        for policy in SchedulingPolicy::ALL {
            let scheduler = scheduler(policy, 64);
            for (i, p) in priorities.iter().enumerate() {
                let text = i.to_string();
                scheduler.schedule(direction(), vec![split(&text, Priority::ALL[*p])], None).unwrap();
            }

            let mut expected: Vec<(usize, usize)> = priorities.iter().copied().zip(0..).collect();
            expected.sort();

            for (_, index) in expected {
                prop_assert_eq!(take_text(&scheduler), index.to_string());
            }
        }
    }
}

// ==================== Completion ====================

#[test]
fn test_lock_released_after_all_splits() {
    let scheduler = Arc::new(Scheduler::with_defaults());
    let splits: Vec<_> = (0..3).map(|i| split(&format!("s{i}"), Priority::Normal)).collect();
    let lock = scheduler.schedule(direction(), splits.clone(), None).unwrap();

    let job = scheduler.take().unwrap();
    job.splits()[0].set_translation(Translation::new(vec!["t0".into()]));
    job.splits()[1].set_exception(TranslationError::Decoder("boom".into()));
    assert!(!lock.wait_timeout(Duration::from_millis(20)));
    assert_eq!(lock.remaining(), 1);

    job.splits()[2].set_translation(Translation::new(vec!["t2".into()]));
    assert!(lock.wait_timeout(Duration::from_secs(1)));

    assert_eq!(splits[0].translation().unwrap().text(), "t0");
    assert!(splits[1].error().is_some());
    assert_eq!(splits[2].translation().unwrap().text(), "t2");
}

#[test]
fn test_concurrent_waiters_unblock_together() {
    let scheduler = Arc::new(Scheduler::with_defaults());
    let splits: Vec<_> = (0..2).map(|_| split("x", Priority::Normal)).collect();
    let lock = scheduler.schedule(direction(), splits.clone(), None).unwrap();

    let released = Arc::new(AtomicUsize::new(0));
    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let released = Arc::clone(&released);
            let splits = splits.clone();
            thread::spawn(move || {
                lock.wait();
                // Every split result is visible once the lock resolves
                assert!(splits.iter().all(|s| s.is_completed()));
                released.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    let job = scheduler.take().unwrap();
    job.splits()[0].set_translation(Translation::empty());
    thread::sleep(Duration::from_millis(30));
    assert_eq!(released.load(Ordering::SeqCst), 0);

    job.splits()[1].set_translation(Translation::empty());
    for waiter in waiters {
        waiter.join().unwrap();
    }
    assert_eq!(released.load(Ordering::SeqCst), 5);
}

#[test]
fn test_duplicate_completion_ignored() {
    let scheduler = Scheduler::with_defaults();
    let splits = vec![split("a", Priority::Normal), split("b", Priority::Normal)];
    let lock = scheduler.schedule(direction(), splits.clone(), None).unwrap();

    let job = scheduler.take().unwrap();
    assert!(job.splits()[0].set_translation(Translation::empty()));
    assert!(!job.splits()[0].set_translation(Translation::empty()));
    assert!(!job.splits()[0].set_exception(TranslationError::ShutDown));

    // The duplicate must not have counted as the second split
    assert_eq!(lock.remaining(), 1);
    assert!(splits[0].translation().is_some());
}

#[test]
fn test_expired_split_fails_before_decoding() {
    let scheduler = Scheduler::with_defaults();
    let expired = Arc::new(
        TranslationSplit::new(Sentence::from_text("late"), Priority::Normal)
            .with_expiration(Instant::now() - Duration::from_millis(5)),
    );
    let fresh = Arc::new(
        TranslationSplit::new(Sentence::from_text("fresh"), Priority::Normal)
            .with_timeout(Duration::from_secs(60)),
    );
    let lock = scheduler
        .schedule(direction(), vec![Arc::clone(&expired), Arc::clone(&fresh)], None)
        .unwrap();

    let decoded = AtomicUsize::new(0);
    let job = scheduler.take().unwrap();
    for split in job.splits() {
        match split.ensure_valid() {
            Ok(()) => {
                decoded.fetch_add(1, Ordering::SeqCst);
                split.set_translation(Translation::new(split.sentence().words().to_vec()));
            }
            Err(err) => {
                split.set_exception(err);
            }
        }
    }

    assert!(lock.wait_timeout(Duration::from_secs(1)));
    assert_eq!(decoded.load(Ordering::SeqCst), 1);
    assert!(matches!(expired.error(), Some(TranslationError::Timeout { .. })));
    assert_eq!(fresh.translation().unwrap().text(), "fresh");
}

// ==================== Shutdown ====================

#[test]
fn test_close_interrupts_blocked_take() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = Arc::new(scheduler(policy, 4));
        let (tx, rx) = mpsc::channel();

        let consumer = {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || {
                tx.send(scheduler.take().map(|job| job.len())).unwrap();
            })
        };

        thread::sleep(Duration::from_millis(30));
        scheduler.close();

        let result = rx.recv_timeout(Duration::from_secs(2)).expect("take did not return");
        assert_eq!(result, Err(SchedulerError::Interrupted));
        consumer.join().unwrap();
    }
}

#[test]
fn test_close_semantics() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = Arc::new(scheduler(policy, 8));

        let running = split("running", Priority::Normal);
        let running_lock = scheduler
            .schedule(direction(), vec![Arc::clone(&running)], None)
            .unwrap();
        let job = scheduler.take().unwrap();

        let blocked: Vec<_> = (0..3)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                thread::spawn(move || scheduler.take().map(|_| ()))
            })
            .collect();

        thread::sleep(Duration::from_millis(30));
        scheduler.close();

        for handle in blocked {
            assert_eq!(handle.join().unwrap(), Err(SchedulerError::Interrupted));
        }
        assert!(matches!(
            scheduler.schedule(direction(), vec![split("late", Priority::High)], None),
            Err(SchedulerError::ShutDown)
        ));
        assert!(matches!(scheduler.take(), Err(SchedulerError::Interrupted)));

        // Work taken before close still completes and resolves its lock
        assert!(!running_lock.is_completed());
        job.splits()[0].set_translation(Translation::new(vec!["done".into()]));
        assert!(running_lock.wait_timeout(Duration::from_secs(1)));
        assert_eq!(running.translation().unwrap().text(), "done");
    }
}

#[test]
fn test_close_resolves_queued_jobs() {
    for policy in SchedulingPolicy::ALL {
        let scheduler = scheduler(policy, 8);
        let queued = vec![split("a", Priority::High), split("b", Priority::Background)];
        let lock = scheduler.schedule(direction(), queued.clone(), None).unwrap();

        scheduler.close();

        assert!(lock.wait_timeout(Duration::from_secs(1)));
        for split in &queued {
            assert_eq!(split.error(), Some(&TranslationError::ShutDown));
        }
    }
}
