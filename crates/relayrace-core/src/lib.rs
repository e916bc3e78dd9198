/*!
 * Relayrace Core
 *
 * Tipos, erros e traits compartilhados pela workspace Relayrace
 */

pub mod error;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
