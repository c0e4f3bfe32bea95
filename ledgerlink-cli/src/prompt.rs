//! Terminal prompts for the reconciliation engine

use std::io;

use dialoguer::{Input, Select};

use ledgerlink_core::{Error, Prompter, Result};

/// Last entry of every candidate list
const NONE_OF_THESE: &str = "None of these (create a new transaction)";

/// Prompter backed by dialoguer widgets on the controlling terminal
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn pick_one(&mut self, title: &str, labels: &[String]) -> Result<Option<usize>> {
        let mut items: Vec<&str> = labels.iter().map(String::as_str).collect();
        items.push(NONE_OF_THESE);

        let picked = Select::new()
            .with_prompt(title)
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(prompt_error)?;
        // Escape counts as "none of these"
        Ok(picked.filter(|&index| index < labels.len()))
    }

    fn ask_integer(&mut self, title: &str, placeholder: &str) -> Result<Option<u64>> {
        let answer: String = Input::new()
            .with_prompt(format!("{} [{}]", title, placeholder))
            .allow_empty(true)
            .validate_with(|input: &String| -> std::result::Result<(), &str> {
                let input = input.trim();
                if input.is_empty() || input.parse::<u64>().is_ok() {
                    Ok(())
                } else {
                    Err("enter a whole number, or nothing")
                }
            })
            .interact_text()
            .map_err(prompt_error)?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        answer
            .parse()
            .map(Some)
            .map_err(|e| Error::Prompt(format!("{:?}: {}", answer, e)))
    }

    fn ask_text(&mut self, title: &str, prefill: &str) -> Result<Option<String>> {
        let answer: String = Input::new()
            .with_prompt(title)
            .with_initial_text(prefill)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }
}

/// Ctrl-C reaches the prompt as an interrupted read
fn prompt_error(error: dialoguer::Error) -> Error {
    let dialoguer::Error::IO(error) = error;
    if error.kind() == io::ErrorKind::Interrupted {
        Error::Interrupted
    } else {
        Error::Prompt(error.to_string())
    }
}
