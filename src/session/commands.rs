//! Slash commands a session understands.

use url::Url;

use super::Session;
use crate::api::types::MessageKind;
use crate::workspace::secure_path;

/// Command names and their help text, in `/help` order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Display this help message."),
    ("/model", "Set the LLM model. Usage: /model <model_name>"),
    ("/persona", "Set the persona. Usage: /persona <persona_name>"),
    (
        "/list",
        "Lists available commands or personas. Usage: /list [commands|personas]",
    ),
    ("/reset", "Restore the default model and persona."),
    ("/show", "Prints the content of a file. Usage: /show <file_name>"),
    ("/run", "Run an allowed command. Usage: /run <command> [args]"),
    (
        "/describe_image",
        "Describes an image from a URL. Usage: /describe_image <url>",
    ),
];

/// A parsed slash command. Arguments borrow from the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand<'a> {
    Help,
    Model(Option<&'a str>),
    Persona(Option<&'a str>),
    List(Option<&'a str>),
    Reset,
    Show(Option<&'a str>),
    Run(Option<&'a str>),
    DescribeImage(Option<&'a str>),
    Unknown(&'a str),
}

impl<'a> SessionCommand<'a> {
    /// Parse a line starting with `/`. Everything after the command word is
    /// one trimmed argument.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then_some(rest);

        match name {
            "/help" => Self::Help,
            "/model" => Self::Model(arg),
            "/persona" => Self::Persona(arg),
            "/list" => Self::List(arg),
            "/reset" => Self::Reset,
            "/show" => Self::Show(arg),
            "/run" => Self::Run(arg),
            "/describe_image" => Self::DescribeImage(arg),
            other => Self::Unknown(other),
        }
    }
}

impl Session {
    pub(super) async fn run_command(&mut self, command: SessionCommand<'_>) {
        match command {
            SessionCommand::Help => {
                let help = COMMANDS
                    .iter()
                    .map(|(name, desc)| format!("  {}: {}", name, desc))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.system(format!("Available Commands:\n{}", help));
            }
            SessionCommand::Model(Some(model)) => {
                self.model = model.to_string();
                self.system(format!("Model set to {}.", self.model));
            }
            SessionCommand::Model(None) => self.system("Usage: /model <model_name>"),
            SessionCommand::Persona(Some(persona)) => {
                self.persona = persona.to_string();
                self.system(format!("Persona set to {}.", self.persona));
            }
            SessionCommand::Persona(None) => self.system("Usage: /persona <persona_name>"),
            SessionCommand::List(Some("commands")) => {
                let names = COMMANDS
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join("\n");
                self.system(names);
            }
            SessionCommand::List(Some("personas")) => {
                let mut names: Vec<&str> =
                    self.config.personas.keys().map(String::as_str).collect();
                if !self.config.personas.contains_key(&self.persona) {
                    names.push(self.persona.as_str());
                }
                names.sort_unstable();
                self.system(names.join("\n"));
            }
            SessionCommand::List(Some(_)) => {
                self.system("Invalid category. Use 'commands' or 'personas'.")
            }
            SessionCommand::List(None) => self.system("Usage: /list [commands|personas]"),
            SessionCommand::Reset => {
                self.model = self.config.default_model.clone();
                self.persona = self.config.default_persona.clone();
                self.system("Session reset to defaults.");
            }
            SessionCommand::Show(Some(file)) => self.show_file(file).await,
            SessionCommand::Show(None) => self.system("Usage: /show <file_name>"),
            SessionCommand::Run(Some(line)) => self.run_program(line).await,
            SessionCommand::Run(None) => self.system("Usage: /run <command> [args]"),
            SessionCommand::DescribeImage(arg) => self.describe_image(arg).await,
            SessionCommand::Unknown(name) => self.fail(format!(
                "Unknown command: {}. Type /help for a list.",
                name
            )),
        }
    }

    fn system(&self, text: impl Into<String>) {
        self.sink.message(text, MessageKind::System);
    }

    fn fail(&self, text: impl Into<String>) {
        self.sink.message(text, MessageKind::Error);
    }

    async fn show_file(&self, file: &str) {
        let path = match secure_path(&self.config.working_directory, file) {
            Ok(path) => path,
            Err(e) => return self.fail(format!("Error: {}", e)),
        };
        if !path.exists() {
            return self.fail(format!("Error: File '{}' not found.", file));
        }
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => self.system(format!(
                "---- Content of {} ----\n{}\n---- End Content ----",
                file, content
            )),
            Err(e) => self.fail(format!("Error reading file: {}", e)),
        }
    }

    async fn run_program(&self, line: &str) {
        match self.runner.run(line).await {
            Ok(out) => {
                self.system(out.output);
                for record in out.changed_files {
                    tracing::info!(session = %self.id, "Announcing file {}", record.filename);
                    self.sink.file_update(record);
                }
            }
            Err(e) => {
                tracing::warn!(session = %self.id, "Command failed: {}", e);
                self.fail(format!("Error during code execution: {}", e));
            }
        }
    }

    async fn describe_image(&self, arg: Option<&str>) {
        let Some(captioner) = self.captioner.as_ref() else {
            return self.fail(
                "Hugging Face API key is not configured. Image description unavailable.",
            );
        };
        let Some(url) = arg.filter(|u| is_valid_image_url(u)) else {
            return self.fail("Error: Invalid URL format for image.");
        };
        match captioner.describe_image(url).await {
            Ok(caption) => {
                self.sink
                    .message(format!("Image Description: {}", caption), MessageKind::Assistant);
            }
            Err(e) => {
                tracing::error!(session = %self.id, "Error describing image: {}", e);
                self.sink.error(format!("Error describing image: {}", e));
            }
        }
    }
}

fn is_valid_image_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
