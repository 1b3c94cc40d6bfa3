//! Fan-out worker pools for Tokio that spread work items across a fixed number of worker tasks.
//!
//! This crate provides two pools. [`FanOut`] lets any idle worker take the next item from one shared queue.
//! [`HashedFanOut`] gives every worker its own queue and routes each item by its hash, so that items of the same bucket
//! are always processed by the same worker, one at a time and in the order they were handed in. This is useful when
//! a processor keeps per-entity state and must not see two items of the same entity concurrently.
//!
//! # Key Features
//!
//! - **Bucket affinity**: Items whose hashes share a bucket always go to the same worker
//! - **Per-bucket ordering**: Items of one bucket are processed in submission order
//! - **Backpressure**: Producers wait while the target queue is full; a buffer size of zero hands items over directly
//! - **Failure reporting**: Processor errors and panics are collected instead of silently killing a worker
//! - **Async and sync producers**: Items can be handed in from tasks or from plain threads
//!
//! # Lifecycle
//!
//! A pool is used once. Producers call `invoke` for every item and then call `close` exactly once. Concurrently, one
//! caller runs `process`, which spawns the workers and returns once every queue is closed and drained.
//!
//! ## Fan-out
//!
//! ```rust
//! use std::{
//!     num::NonZeroUsize,
//!     sync::{
//!         Arc,
//!         atomic::{AtomicU64, Ordering},
//!     },
//! };
//!
//! use tokio_fanout::FanOut;
//!
//! #[tokio::main]
//! async fn main() {
//!     // 2 workers, no buffer: every `invoke` waits until a worker has taken the item
//!     let pool = Arc::new(FanOut::<u64>::new(NonZeroUsize::new(2).unwrap(), 0));
//!
//!     let producer = {
//!         let pool = pool.clone();
//!         tokio::spawn(async move {
//!             for n in 1..=5 {
//!                 pool.invoke(n).await.unwrap();
//!             }
//!             // Workers exit once the remaining items are processed
//!             pool.close().unwrap();
//!         })
//!     };
//!
//!     let sum = Arc::new(AtomicU64::new(0));
//!     let total = sum.clone();
//!     pool.process(move |n: u64| {
//!         total.fetch_add(n, Ordering::Relaxed);
//!     })
//!     .await
//!     .unwrap();
//!
//!     producer.await.unwrap();
//!     assert_eq!(sum.load(Ordering::Relaxed), 15);
//! }
//! ```
//!
//! ## Hashed fan-out
//!
//! ```rust
//! use std::num::NonZeroUsize;
//!
//! use tokio_fanout::{HashedFanOut, StringHasher, worker_index};
//!
//! #[tokio::main]
//! async fn main() {
//!     #[derive(Debug)]
//!     struct Event {
//!         user: String,
//!         amount: i64,
//!     }
//!
//!     // Events of one user always land on the same worker
//!     let pool = HashedFanOut::<Event, _>::new(
//!         NonZeroUsize::new(3).unwrap(),
//!         100,
//!         StringHasher::new(|event: &Event| event.user.clone()),
//!     );
//!
//!     for (user, amount) in [("alice", 10), ("bob", 5), ("alice", -3)] {
//!         let event = Event { user: user.to_string(), amount };
//!         pool.invoke(event).await.unwrap();
//!     }
//!     pool.close().unwrap();
//!
//!     pool.process(|event: Event| {
//!         println!("worker {:?} handles {event:?}", worker_index());
//!     })
//!     .await
//!     .unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! 1. **Queues**: Every queue is a bounded Tokio MPSC channel. A buffer size of zero turns it into a rendezvous where
//!    each item carries an acknowledgement the producer waits on
//! 2. **Routing**: [`HashedFanOut`] computes `hash(item) % worker_count` with its [`HashFunc`] to pick a queue
//! 3. **Workers**: `process` spawns one Tokio task per worker and joins all of them
//!
//! # Performance Considerations
//!
//! - **Processors run on the runtime**: Processors are plain functions called from worker tasks; long blocking work
//!   holds up a runtime thread
//! - **Shared queue**: [`FanOut`] workers take turns receiving from one queue
//! - **Hashing overhead**: Each [`HashedFanOut::invoke`] computes a hash of the item
//! - **Load distribution**: Hash distribution may not be perfectly even across workers, and a busy bucket only ever
//!   gets one worker

mod error;
mod fan_out;
mod hashed_fan_out;
mod hasher;
mod queue;
mod util;
mod worker;


pub use self::{
    error::{CloseError, FailureCause, InvokeError, ProcessError, WorkerFailure},
    fan_out::FanOut,
    hashed_fan_out::HashedFanOut,
    hasher::{HashFunc, KeyFunc, KeyHasher, StringHasher},
    worker::{ProcessorFunc, worker_index},
};
