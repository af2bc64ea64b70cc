// Interactive configuration flow (`dnscli --setup`).
// Prompts go through the `Prompt` trait so the flow can be driven by a
// script in tests; the real terminal implementation uses `dialoguer`.

use dialoguer::Input;

use crate::config::{mask_secret, ConfigStore, Credentials};
use crate::error::{Error, Result};

/// Source of one line of user input per question.
pub trait Prompt {
    fn ask(&mut self, label: &str) -> std::io::Result<String>;
}

/// Reads answers from the terminal.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn ask(&mut self, label: &str) -> std::io::Result<String> {
        // Blank input is allowed: it means "keep the current value".
        Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
    }
}

/// Ask for server URL and API key, then save them.
///
/// Existing values are offered in brackets (the key only as a short prefix)
/// and kept when the answer is blank. Nothing is written unless both values
/// end up non-empty.
pub fn run(store: &ConfigStore, prompt: &mut dyn Prompt) -> Result<Credentials> {
    let mut creds = store.read().unwrap_or_default();

    let label = if creds.server.is_empty() {
        "Server endpoint".to_string()
    } else {
        format!("Server endpoint [{}]", creds.server)
    };
    if let Some(server) = answer(prompt, &label)? {
        creds.server = server;
    }

    let label = if creds.api_key.is_empty() {
        "API key".to_string()
    } else {
        format!("API key [{}]", mask_secret(&creds.api_key))
    };
    if let Some(api_key) = answer(prompt, &label)? {
        creds.api_key = api_key;
    }

    if creds.server.is_empty() {
        return Err(Error::validation("server endpoint is required"));
    }
    if creds.api_key.is_empty() {
        return Err(Error::validation("API key is required"));
    }

    store.save(&creds)?;
    Ok(creds)
}

/// Trimmed answer, or `None` when the user just pressed enter.
fn answer(prompt: &mut dyn Prompt, label: &str) -> Result<Option<String>> {
    let input = prompt.ask(label).map_err(Error::Prompt)?;
    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}
