// Ika Interactive Console
// REPL over the generator: plain lines are translated with the current settings

use anyhow::Result;
use ika_core::{GenerationKind, GenerationRequest, GenerationResult, Length, Tense, Tone, TranslateRequest};
use ika_gen::Generator;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;

pub struct InteractiveConsole {
    generator: Arc<Generator>,
    tense: Tense,
    tone: Tone,
    length: Length,
    negate: bool,
    history: Vec<String>,
}

enum CommandResult {
    Continue,
    Exit,
    Output(String),
    Error(String),
}

impl InteractiveConsole {
    pub fn new(generator: Arc<Generator>) -> Self {
        Self {
            generator,
            tense: Tense::Present,
            tone: Tone::Neutral,
            length: Length::Medium,
            negate: false,
            history: Vec::new(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdin = BufReader::new(stdin.lock());

        loop {
            print!("{}> ", self.prompt());
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            self.history.push(line.clone());

            match self.handle_command(&line).await {
                CommandResult::Continue => continue,
                CommandResult::Exit => break,
                CommandResult::Output(output) => println!("{}", output),
                CommandResult::Error(msg) => println!("error: {}", msg),
            }
        }

        Ok(())
    }

    fn print_banner(&self) {
        let catalog = self.generator.catalog().snapshot();
        println!("Ika console (catalog {})", catalog.version());
        println!("Type text to translate, 'help' for commands, 'exit' to quit");
        println!();
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  <text>                 - Translate with the current settings");
        println!("  poem|story|lecture <t> - Compose about topic <t>");
        println!("  lookup <word>          - Exact match or suggestions");
        println!("  reverse <ika>          - Entries with this Ika text");
        println!("  tense <tense>          - present, past, future, progressive");
        println!("  tone <tone>            - neutral, formal, poetic");
        println!("  length <length>        - short, medium, long");
        println!("  negate on|off          - Toggle negation");
        println!("  history                - Show command history");
        println!("  exit, quit, q          - Leave the console");
    }

    fn prompt(&self) -> String {
        let mut prompt = format!("ika[{}", self.tense);
        if self.negate {
            prompt.push_str(",neg");
        }
        prompt.push(']');
        prompt
    }

    async fn handle_command(&mut self, line: &str) -> CommandResult {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match command.as_str() {
            "exit" | "quit" | "q" => CommandResult::Exit,
            "help" | "?" => {
                self.print_help();
                CommandResult::Continue
            }
            "history" => {
                let lines: Vec<String> = self
                    .history
                    .iter()
                    .enumerate()
                    .map(|(i, cmd)| format!("  {}: {}", i + 1, cmd))
                    .collect();
                CommandResult::Output(lines.join("\n"))
            }
            "tense" => match rest.parse() {
                Ok(tense) => {
                    self.tense = tense;
                    CommandResult::Continue
                }
                Err(e) => CommandResult::Error(format!("{}", e)),
            },
            "tone" => match rest.parse() {
                Ok(tone) => {
                    self.tone = tone;
                    CommandResult::Continue
                }
                Err(e) => CommandResult::Error(format!("{}", e)),
            },
            "length" => match rest.parse() {
                Ok(length) => {
                    self.length = length;
                    CommandResult::Continue
                }
                Err(e) => CommandResult::Error(format!("{}", e)),
            },
            "negate" => match rest {
                "on" => {
                    self.negate = true;
                    CommandResult::Continue
                }
                "off" => {
                    self.negate = false;
                    CommandResult::Continue
                }
                _ => CommandResult::Error("Usage: negate on|off".to_string()),
            },
            "poem" | "story" | "lecture" => {
                if rest.is_empty() {
                    return CommandResult::Error(format!("Usage: {} <topic>", command));
                }
                match command.parse::<GenerationKind>() {
                    Ok(kind) => self.generate(kind, rest).await,
                    Err(e) => CommandResult::Error(e.to_string()),
                }
            }
            "lookup" => match self.generator.lexicon().lookup(rest).await {
                Ok(result) if result.found() => CommandResult::Output(
                    result
                        .exact_matches
                        .iter()
                        .map(|e| format!("  {} -> {}", e.source_text, e.target_text))
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                Ok(result) if result.suggestions.is_empty() => {
                    CommandResult::Output(format!("  no entry for '{}'", result.query))
                }
                Ok(result) => CommandResult::Output(format!(
                    "  no entry for '{}'; did you mean: {}",
                    result.query,
                    result
                        .suggestions
                        .iter()
                        .map(|e| e.source_text.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
                Err(e) => CommandResult::Error(e.to_string()),
            },
            "reverse" => match self.generator.lexicon().reverse_lookup(rest).await {
                Ok(entries) if entries.is_empty() => CommandResult::Output(format!("  no entry for '{}'", rest)),
                Ok(entries) => CommandResult::Output(
                    entries
                        .iter()
                        .map(|e| format!("  {} <- {}", e.target_text, e.source_text))
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                Err(e) => CommandResult::Error(e.to_string()),
            },
            _ => self.translate(line).await,
        }
    }

    async fn translate(&self, text: &str) -> CommandResult {
        let request = TranslateRequest {
            text: text.to_string(),
            tense: self.tense,
            negate: self.negate,
            question: false,
        };
        match self.generator.translate(&request).await {
            Ok(result) => CommandResult::Output(render(&result)),
            Err(e) => CommandResult::Error(e.to_string()),
        }
    }

    async fn generate(&self, kind: GenerationKind, topic: &str) -> CommandResult {
        let request = GenerationRequest {
            kind,
            topic: topic.to_string(),
            tone: self.tone,
            length: self.length,
            tense: self.tense,
            negate: self.negate,
            question: false,
        };
        match self.generator.generate(&request).await {
            Ok(result) => CommandResult::Output(render(&result)),
            Err(e) => CommandResult::Error(e.to_string()),
        }
    }
}

fn render(result: &GenerationResult) -> String {
    let mut out = result.text.clone();
    if !result.meta.missing_concepts.is_empty() {
        out.push_str(&format!("\n  (no entry for: {})", result.meta.missing_concepts.join(", ")));
    }
    out
}
