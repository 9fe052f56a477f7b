use std::io::IsTerminal;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Debug, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Text
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    query: &'a str,
    reply: &'a str,
}

pub fn render_reply(query: &str, reply: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => reply.to_string(),
        OutputFormat::Json => serde_json::to_string(&ReplyOutput { query, reply })
            .unwrap_or_else(|_| "{}".to_string()),
    }
}

pub fn print_reply(query: &str, reply: &str, format: OutputFormat) {
    println!("{}", render_reply(query, reply, format));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_the_bare_reply() {
        assert_eq!(render_reply("relay_get 1", "0", OutputFormat::Text), "0");
    }

    #[test]
    fn json_carries_query_and_reply() {
        let out = render_reply("relay_get 1", "0", OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["query"], "relay_get 1");
        assert_eq!(value["reply"], "0");
    }
}
