mod summarizer;

pub use summarizer::{Summarizer, TextSummarizer};
