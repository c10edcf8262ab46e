use BoundedQueueMini::core::config::{ConfigError, QueueConfig};
use BoundedQueueMini::core::queue::{BoundedQueue, InsertError, RemoveError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_millis(500);

#[test]
fn test_fifo_order_preserved() {
    let queue = BoundedQueue::new(8);
    for i in 0..8 {
        queue.insert(i, None).unwrap();
    }
    let removed: Vec<_> = (0..8).map(|_| queue.remove(None).unwrap()).collect();
    assert_eq!(removed, (0..8).collect::<Vec<_>>());
}

#[test]
fn test_push_and_pop_drains_in_order() {
    let queue = BoundedQueue::new(5);
    for value in [10, 20, 30, 40, 50] {
        queue.insert(value, None).unwrap();
    }
    assert_eq!(queue.len(), 5);

    for expected in [10, 20, 30, 40, 50] {
        assert_eq!(queue.remove(None), Ok(expected));
    }
    assert_eq!(queue.len(), 0);
    assert!(queue.is_empty());
}

#[test]
fn test_remove_times_out_on_empty_queue() {
    let queue = BoundedQueue::<i32>::new(2);
    let started = Instant::now();
    assert_eq!(queue.remove(Some(WAIT)), Err(RemoveError::Timeout));
    assert!(started.elapsed() >= Duration::from_millis(450));
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_insert_times_out_on_full_queue() {
    let queue = BoundedQueue::new(2);
    queue.insert(1, None).unwrap();
    queue.insert(2, None).unwrap();

    let started = Instant::now();
    let err = queue.insert(3, Some(WAIT)).unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(450));
    assert!(err.is_timeout());
    assert_eq!(err.into_inner(), 3);
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.insert_count(), 2);

    // Contents untouched by the failed insert
    assert_eq!(queue.remove(None), Ok(1));
    assert_eq!(queue.remove(None), Ok(2));
}

#[test]
fn test_zero_timeout_fails_immediately() {
    let queue = BoundedQueue::new(1);
    assert_eq!(queue.remove(Some(Duration::ZERO)), Err(RemoveError::Timeout));
    queue.insert('a', Some(Duration::ZERO)).unwrap();
    assert_eq!(queue.insert('b', Some(Duration::ZERO)), Err(InsertError::Timeout('b')));
}

#[test]
fn test_blocked_remove_unblocks_on_insert() {
    let queue = Arc::new(BoundedQueue::new(2));
    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.remove(None))
    };

    thread::sleep(Duration::from_millis(50));
    queue.insert(7, None).unwrap();
    assert_eq!(consumer.join().unwrap(), Ok(7));
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_blocked_insert_unblocks_on_remove() {
    let queue = Arc::new(BoundedQueue::new(1));
    queue.insert(1, None).unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.insert(2, None))
    };

    thread::sleep(Duration::from_millis(50));
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.remove(None), Ok(1));
    assert_eq!(producer.join().unwrap(), Ok(()));
    assert_eq!(queue.remove(None), Ok(2));
}

#[test]
fn test_timed_remove_succeeds_before_deadline() {
    let queue = Arc::new(BoundedQueue::new(2));
    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            queue.insert("late", None)
        })
    };
    assert_eq!(queue.remove(Some(Duration::from_secs(5))), Ok("late"));
    producer.join().unwrap().unwrap();
}

#[test]
fn test_insert_beyond_limit_is_rejected() {
    let queue = BoundedQueue::with_insert_limit(5, 3);
    for i in 1..=3 {
        queue.insert(i, Some(WAIT)).unwrap();
    }
    assert!(!queue.is_producer_done());

    assert_eq!(queue.insert(4, Some(WAIT)), Err(InsertError::Done(4)));
    assert!(queue.is_producer_done());
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.insert_count(), 3);

    // Done is sticky
    assert_eq!(queue.insert(5, None), Err(InsertError::Done(5)));
}

#[test]
fn test_limit_is_checked_before_blocking() {
    // Full and over budget: Done comes back at once rather than after a wait
    let queue = BoundedQueue::with_insert_limit(1, 1);
    queue.insert(1, None).unwrap();
    let started = Instant::now();
    assert_eq!(queue.insert(2, None), Err(InsertError::Done(2)));
    assert!(started.elapsed() < WAIT);
}

#[test]
fn test_remaining_items_survive_producer_done() {
    let queue = BoundedQueue::new(3);
    queue.insert(1, None).unwrap();
    queue.insert(2, None).unwrap();
    queue.mark_producer_done();
    queue.mark_producer_done();

    assert_eq!(queue.remove(None), Ok(1));
    assert_eq!(queue.remove(None), Ok(2));
    assert_eq!(queue.remove(None), Err(RemoveError::Drained));
    assert_eq!(queue.insert(3, None), Err(InsertError::Done(3)));
}

#[test]
fn test_mark_done_wakes_blocked_consumer() {
    let queue = Arc::new(BoundedQueue::<u32>::new(2));
    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.remove(None))
    };

    thread::sleep(Duration::from_millis(50));
    queue.mark_producer_done();
    assert_eq!(consumer.join().unwrap(), Err(RemoveError::Drained));
}

#[test]
fn test_inserts_into_non_full_queue_never_block() {
    let queue = BoundedQueue::new(4);
    queue.insert(1, None).unwrap();
    for i in 2..=4 {
        queue.insert(i, Some(Duration::ZERO)).unwrap();
    }
    assert_eq!(queue.len(), 4);
}

#[test]
fn test_capacity_never_exceeded_under_contention() {
    const ITEMS: u32 = 2_000;
    let queue = Arc::new(BoundedQueue::new(3));
    let stop = Arc::new(AtomicBool::new(false));

    let monitor = {
        let queue = Arc::clone(&queue);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut max_seen = 0;
            while !stop.load(Ordering::Relaxed) {
                max_seen = max_seen.max(queue.len());
            }
            max_seen
        })
    };

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..ITEMS {
                queue.insert(i, None).unwrap();
            }
            queue.mark_producer_done();
        })
    };

    let mut received = Vec::with_capacity(ITEMS as usize);
    loop {
        match queue.remove(Some(WAIT)) {
            Ok(item) => received.push(item),
            Err(RemoveError::Drained) => break,
            Err(RemoveError::Timeout) => {}
        }
    }

    producer.join().unwrap();
    stop.store(true, Ordering::Relaxed);
    let max_seen = monitor.join().unwrap();

    assert!(max_seen <= queue.capacity());
    assert_eq!(received, (0..ITEMS).collect::<Vec<_>>());
}

#[test]
#[should_panic(expected = "capacity must be greater than zero")]
fn test_zero_capacity_panics() {
    let _ = BoundedQueue::<u8>::new(0);
}

#[test]
fn test_from_config_validates_capacity() {
    let config = QueueConfig { capacity: 0, ..QueueConfig::default() };
    assert!(matches!(
        BoundedQueue::<u8>::from_config(&config),
        Err(ConfigError::ZeroCapacity)
    ));

    let queue = BoundedQueue::<u8>::from_config(&QueueConfig::default()).unwrap();
    assert_eq!(queue.capacity(), 2);
    assert_eq!(queue.insert_limit(), Some(10));
}
