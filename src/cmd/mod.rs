//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `build`  | `Build`          |
//! | `list`   | `List`           |
//! | `config` | `Config`         |

pub mod build;
pub mod config;
pub mod list;

pub use build::cmd_build;
pub use config::cmd_config;
pub use list::cmd_list;
