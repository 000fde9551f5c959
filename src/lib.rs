//! taskdeck - the data and state core of a local-first task/project
//! management application.
//!
//! The crate layers, bottom to top:
//!
//! - [`store`]: a key-value persistence shim (in-memory or sqlite) holding
//!   each entity collection as a JSON array under a fixed key
//! - [`repo`]: CRUD repositories with simulated latency; ids and creation
//!   timestamps are assigned here
//! - [`cache`]: a request-keyed read-through cache with optimistic
//!   mutation helpers and per-key fetch deduplication
//! - [`state`]: a normalized state container updated through named actions
//!   by a pure reducer
//! - [`forms`] / [`app`]: form validation and the intent-driven controller
//!   a front end drives; rendering itself lives outside this crate
//!
//! [`auth`] provides simulated sessions for auth-gated views and [`seed`]
//! first-run sample data.

pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod forms;
pub mod model;
pub mod repo;
pub mod seed;
pub mod state;
pub mod store;

pub use app::{App, AppEvent, Scope};
pub use config::Config;
pub use error::{Error, Result, StoreError};
pub use model::{
  Priority, Project, ProjectDraft, ProjectPatch, Task, TaskDraft, TaskFilter, TaskPatch,
  TaskWithProject, User,
};
