//! # partner-intake
//!
//! A CLI tool that turns partner application messages, pasted from a Telegram chat,
//! into normalized JSON records for the RemCard partner catalogue.
//!
//! ## What it does
//!
//! Applications arrive as loosely formatted `Label: value` lines. This tool picks the
//! known labels out of the text, derives a title, a description, up to five tags and a
//! note, and prints the resulting record as JSON.
//!
//! With `--append` the record is merged into a collection file
//! (`confirmed-partners.json` by default). With `--publish` the collection file is
//! also committed and pushed to the current git branch.
//!
//! ## Usage
//!
//! ```sh
//! # Print the JSON block only
//! partner-intake --message "Компания / бренд: Чайная
//! Контактное лицо: Анна"
//!
//! # Paste the message on stdin, add it to the top of the collection and push it
//! partner-intake --publish --prepend
//! ```
//!
//! Defaults can be persisted in `~/.config/partner-intake/config.toml`.
//!
//! ## Pipeline
//!
//! [`input`] → [`fields`] → [`record`] → [`collection`] → [`publish`]. Everything
//! up to the record is a pure transform; the last two stages are opt-in.
pub mod collection;
pub mod fields;
pub mod input;
pub mod publish;
pub mod record;
pub mod utils;
