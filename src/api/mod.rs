//! Story API access built on the fetch policy router.

mod client;
pub mod types;

pub use client::StoryClient;
pub use types::{
  ActionOutcome, LoginOutcome, NewStory, PhotoUpload, StoriesOutcome, StoryOutcome,
};
