//! # detoxr
//!
//! Progressive attention friction for video sites. The longer a tracked site
//! holds your attention, the more its pages are blurred, desaturated, faded,
//! tinted and slowed, and the more latency is added to "keep watching"
//! controls. An optional checklist interposes between videos.
//!
//! ## Architecture
//!
//! - **Escalation math**: `escalation` turns elapsed attention into a level,
//!   intensities, a colour temperature and a renderable [`escalation::EffectPlan`].
//! - **Persistence**: `storage` partitions (local and sync), `config` options
//!   with lenient loading, `session` records per site.
//! - **Contexts**: one shared `background` coordinator and a `foreground`
//!   per tracked page, talking only through `messaging`.
//! - **Presentation**: `effects` renders plans onto a `Surface`; `checklist`
//!   is the gated pre-leave overlay.
//! - **Host**: `runtime` wires the contexts together in-process; `scheduler`
//!   provides their purpose-keyed timers.
//! - **CLI**: `args` and `commands` form the settings surface.

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod background;
pub mod checklist;
pub mod commands;
pub mod config;
pub mod constants;
pub mod effects;
pub mod escalation;
pub mod foreground;
pub mod messaging;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod sites;
pub mod storage;
pub mod time_source;
