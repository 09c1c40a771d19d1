//! # prompt-relay
//!
//! A small web front end that relays prompts to OpenRouter.
//!
//! This library provides:
//! - A WebSocket gateway with one session per browser connection
//! - An OpenRouter chat-completion client behind the [`llm::LlmClient`] seam
//! - File announcements for files produced in the working directory
//! - The client-side state machine shared by the browser page and `relay-cli`
//!
//! ## Flow
//!
//! 1. The client sends `user_input {text}` over `/ws`
//! 2. The session pairs it with its persona and model and calls the API
//! 3. The reply returns as `message {text, type: "assistant"}`, or a failure
//!    returns as one `error` event
//!
//! ## Example
//!
//! ```rust,ignore
//! use prompt_relay::{api, Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod llm;
pub mod session;
pub mod workspace;

pub use config::Config;
