//! Interactive commands.

use formpilot_protocols::{BackendKind, DecodingStrategy};

pub(crate) const HELP: &str = "\
Commands:
  n             start a new application
  f             fill the focused field
  a             fill all fields on the page
  p             previous answer for the focused field
  x             next answer (generates a new one past the last)
  m [model]     change the model
  s <strategy>  set decoding strategy (greedy, beam, top_k, top_p, custom)
  b <backend>   switch backend (ollama, local)
  h             show this help
  q             quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    NewApplication,
    FillOne,
    FillAll,
    Previous,
    Next,
    ChangeModel(Option<String>),
    SetStrategy(DecodingStrategy),
    SetBackend(BackendKind),
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. `Ok(None)` for a blank line.
    pub(crate) fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "n" => Self::NewApplication,
            "f" => Self::FillOne,
            "a" => Self::FillAll,
            "p" => Self::Previous,
            "x" => Self::Next,
            "m" => Self::ChangeModel(Some(rest).filter(|r| !r.is_empty()).map(str::to_string)),
            "s" => {
                if rest.is_empty() {
                    return Err("usage: s <greedy|beam|top_k|top_p|custom>".to_string());
                }
                Self::SetStrategy(rest.parse().map_err(|e| format!("{}", e))?)
            }
            "b" => {
                if rest.is_empty() {
                    return Err("usage: b <ollama|local>".to_string());
                }
                Self::SetBackend(rest.parse().map_err(|e| format!("{}", e))?)
            }
            "h" | "?" | "help" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{}', type h for help", other)),
        };
        Ok(Some(command))
    }
}
