//! Prompter port - the operator at the terminal
//!
//! Each call blocks until the operator answers. `Ok(None)` is an empty
//! answer; an interrupt (Ctrl-C) comes back as `Error::Interrupted`.

use crate::domain::result::Result;

pub trait Prompter {
    /// Pick one of the labels; `None` means "none of these"
    fn pick_one(&mut self, title: &str, labels: &[String]) -> Result<Option<usize>>;

    /// Ask for a non-negative integer, validated while typing
    fn ask_integer(&mut self, title: &str, placeholder: &str) -> Result<Option<u64>>;

    /// Ask for free text with a prefilled value
    fn ask_text(&mut self, title: &str, prefill: &str) -> Result<Option<String>>;
}
