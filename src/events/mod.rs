//! # Events Module
//!
//! Progress reporting for pipeline runs.
//!
//! The executor emits events through a channel so any front end (the CLI
//! progress bar, a log sink, a test) can follow a run without the core
//! knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Run(RunEvent::ItemCompleted(p)) = event {
//!             println!("{}/{} {}", p.completed, p.total, p.identifier);
//!         }
//!     }
//! });
//!
//! Executor::default().run_with_events(&pipeline, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
