// AI commands: summary, chat, doctor, key management

use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use ledgerlens_assistant::{
    advance_conversation, advance_conversation_streaming, connect, request_summary, summarize, ChatReply,
    CompletionService, ConnectError, LoadOutcome, ReplyStatus, Role, ServiceError, ServiceErrorKind, Session,
};
use ledgerlens_config::ai::{self, env_var_name, ResolvedAIConfig};
use ledgerlens_config::{AIDiagnostics, AIProvider, Settings};

use crate::analyze::{analyze_file, print_warnings};
use crate::exit_codes::{
    EXIT_AI_AUTH, EXIT_AI_DISABLED, EXIT_AI_KEYCHAIN_ERR, EXIT_AI_MISSING_KEY, EXIT_AI_SERVICE,
};
use crate::input::load_table;
use crate::{CliError, LoadArgs};

const DOCTOR_TEST_PROMPT: &str = "Reply with the single word OK.";

// ============================================================================
// Error mapping
// ============================================================================

fn connect_error(err: ConnectError, config: &ResolvedAIConfig) -> CliError {
    match err {
        ConnectError::Disabled => CliError::new(EXIT_AI_DISABLED, "AI is disabled").with_hint(format!(
            "set ai.provider to \"gemini\" or \"openai\" in {}",
            Settings::config_path().display()
        )),
        ConnectError::MissingKey(reason) => CliError::new(EXIT_AI_MISSING_KEY, reason).with_hint(format!(
            "llens ai set-key {} (or set {})",
            config.provider.name(),
            env_var_name(config.provider.name())
        )),
        ConnectError::Client(e) => CliError::new(EXIT_AI_SERVICE, e.user_message()),
    }
}

fn service_error(err: &ServiceError, config: &ResolvedAIConfig) -> CliError {
    match err.kind() {
        ServiceErrorKind::Auth => CliError::new(EXIT_AI_AUTH, err.user_message()).with_hint(format!(
            "check the key with `llens ai doctor`, then replace it with `llens ai set-key {}`",
            config.provider.name()
        )),
        ServiceErrorKind::Service => CliError::new(EXIT_AI_SERVICE, err.user_message()),
    }
}

fn connect_service(settings: &Settings) -> Result<(ResolvedAIConfig, Box<dyn CompletionService>), CliError> {
    let config = ResolvedAIConfig::from_settings(&settings.ai);
    match connect(&config) {
        Ok(service) => Ok((config, service)),
        Err(e) => Err(connect_error(e, &config)),
    }
}

// ============================================================================
// summary
// ============================================================================

pub fn cmd_summary(settings: &Settings, path: &Path, args: &LoadArgs) -> Result<(), CliError> {
    let (config, service) = connect_service(settings)?;
    let (result, _) = analyze_file(settings, path, args)?;
    print_warnings(&result);

    let labels = settings.labels.to_label_set();
    let text = request_summary(service.as_ref(), &result, &labels, &config.language)
        .map_err(|e| service_error(&e, &config))?;
    println!("{}", text.trim_end());
    Ok(())
}

// ============================================================================
// chat
// ============================================================================

enum Flow {
    Continue,
    Quit,
}

struct ChatRepl<'a> {
    settings: Settings,
    settings_path: Option<&'a Path>,
    load: &'a LoadArgs,
    config: ResolvedAIConfig,
    service: Box<dyn CompletionService>,
    session: Session,
    file: Option<PathBuf>,
    stream: bool,
}

pub fn cmd_chat(
    settings: &Settings,
    settings_path: Option<&Path>,
    file: Option<&Path>,
    load: &LoadArgs,
    stream: bool,
) -> Result<(), CliError> {
    let (config, service) = connect_service(settings)?;
    let session = Session::with_cache_capacity(settings.labels.to_label_set(), settings.analysis.cache_capacity)
        .with_language(config.language.clone());

    let mut repl = ChatRepl {
        settings: settings.clone(),
        settings_path,
        load,
        config,
        service,
        session,
        file: None,
        stream,
    };

    if let Some(path) = file {
        repl.load_file(path)?;
    }

    let interactive = atty::is(atty::Stream::Stdin);
    if interactive {
        eprintln!("Ask about the balance sheet. /help for commands, /quit to leave.");
    }
    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        if interactive {
            eprint!("> ");
            let _ = io::stderr().flush();
        }
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => return Err(CliError::general(format!("cannot read input: {e}"))),
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('/') {
            match repl.command(command) {
                Flow::Continue => continue,
                Flow::Quit => break,
            }
        }
        repl.ask(line);
    }

    // A rejected key leaves the session unusable; report it to scripts.
    match repl.session.service_block() {
        Some(reason) => Err(CliError::new(EXIT_AI_AUTH, format!("AI blocked: {reason}")).with_hint(format!(
            "replace the key with `llens ai set-key {}`",
            repl.config.provider.name()
        ))),
        None => Ok(()),
    }
}

impl ChatRepl<'_> {
    fn load_file(&mut self, path: &Path) -> Result<(), CliError> {
        let table = match load_table(&self.settings, path, self.load) {
            Ok(table) => table,
            Err(e) => {
                self.session.record_load_failure(&e.message);
                self.file = None;
                return Err(e);
            }
        };
        let outcome = match self.session.load_rows(&table.rows) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.file = None;
                return Err(CliError::analysis(e));
            }
        };
        self.file = Some(path.to_path_buf());

        if let Some(loaded) = self.session.current() {
            print_warnings(&loaded.result);
            let note = match outcome {
                LoadOutcome::NewEpoch => "new conversation",
                LoadOutcome::Unchanged => "same data, conversation kept",
            };
            eprintln!("loaded {} ({} line items, {})", path.display(), loaded.result.rows.len(), note);
        }
        Ok(())
    }

    fn ask(&mut self, text: &str) {
        let reply = if self.stream {
            let mut stdout = io::stdout();
            let mut streamed = false;
            let reply = advance_conversation_streaming(&mut self.session, self.service.as_ref(), text, &mut |chunk| {
                streamed = true;
                let _ = write!(stdout, "{chunk}");
                let _ = stdout.flush();
            });
            if streamed {
                println!();
            }
            if reply.is_answered() && streamed {
                return;
            }
            reply
        } else {
            advance_conversation(&mut self.session, self.service.as_ref(), text)
        };
        self.print_reply(&reply);
    }

    fn print_reply(&self, reply: &ChatReply) {
        match reply.status {
            ReplyStatus::Answered => println!("{}", reply.text.trim_end()),
            ReplyStatus::ServiceFailed(ServiceErrorKind::Auth) => {
                eprintln!("error: {}", reply.text);
                eprintln!("hint:  fix the key, then /reconnect");
            }
            ReplyStatus::ServiceFailed(ServiceErrorKind::Service) => eprintln!("error: {}", reply.text),
            ReplyStatus::Blocked | ReplyStatus::NoData => eprintln!("{}", reply.text),
        }
    }

    fn command(&mut self, command: &str) -> Flow {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "quit" | "exit" | "q" => return Flow::Quit,
            "help" | "?" => print_chat_help(),
            "load" if arg.is_empty() => eprintln!("usage: /load <file>"),
            "load" => {
                if let Err(e) = self.load_file(Path::new(arg)) {
                    eprintln!("error: {}", e.message);
                    if let Some(hint) = e.hint {
                        eprintln!("hint:  {}", hint);
                    }
                }
            }
            "reset" => {
                self.session.reset_conversation();
                eprintln!("conversation cleared");
            }
            "summary" => {
                let reply = summarize(&mut self.session, self.service.as_ref());
                self.print_reply(&reply);
            }
            "history" => {
                for message in self.session.history() {
                    let who = match message.role {
                        Role::User => "you",
                        Role::Assistant => "assistant",
                    };
                    println!("{}: {}", who, message.text.trim_end());
                }
            }
            "status" => self.print_status(),
            "reconnect" => self.reconnect(),
            other => eprintln!("unknown command: /{other} (try /help)"),
        }
        Flow::Continue
    }

    fn print_status(&self) {
        let session = &self.session;
        println!("phase:     {}", session.phase().as_str());
        if let (Some(file), Some(loaded)) = (&self.file, session.current()) {
            println!("file:      {}", file.display());
            println!("rows:      {}", loaded.result.rows.len());
            println!("snapshot:  {}", loaded.snapshot.fingerprint());
        }
        println!("turns:     {}", session.history().len() / 2);
        println!("provider:  {} ({})", self.config.provider.name(), self.config.model);
        let (hits, misses) = session.cache_stats();
        println!("cache:     {} hit(s), {} miss(es)", hits, misses);
        if let Some(reason) = session.service_block() {
            println!("blocked:   {}", reason);
        }
    }

    /// Re-read settings and keys; lifts an auth block on success.
    fn reconnect(&mut self) {
        let settings = crate::load_settings(self.settings_path);
        match connect_service(&settings) {
            Ok((config, service)) => {
                eprintln!("connected to {} ({})", config.provider.name(), config.model);
                self.config = config;
                self.service = service;
                self.settings = settings;
                self.session.clear_service_block();
                self.session.detach_service();
            }
            Err(e) => {
                eprintln!("error: {}", e.message);
                if let Some(hint) = e.hint {
                    eprintln!("hint:  {}", hint);
                }
            }
        }
    }
}

fn print_chat_help() {
    eprintln!("/load <file>   load another balance sheet");
    eprintln!("/summary       one-shot assessment of the current data");
    eprintln!("/reset         start a fresh conversation on the same data");
    eprintln!("/history       print the conversation so far");
    eprintln!("/status        show session state");
    eprintln!("/reconnect     re-read settings and keys");
    eprintln!("/quit          leave");
}

// ============================================================================
// ai doctor
// ============================================================================

pub fn cmd_ai_doctor(settings: &Settings, json: bool, test: bool) -> Result<(), CliError> {
    let config = ResolvedAIConfig::from_settings(&settings.ai);
    let diag = AIDiagnostics::from_resolved(&config);

    // Only a ready config is worth a network round trip.
    let test_outcome = if test && config.status.is_ready() {
        Some(run_connectivity_test(&config))
    } else {
        None
    };
    let test_label = match &test_outcome {
        None if !test => "skipped".to_string(),
        None => "not run (AI not ready)".to_string(),
        Some(Ok(())) => "ok".to_string(),
        Some(Err(e)) => format!("failed: {}", e.message),
    };

    if json {
        let out = serde_json::json!({
            "schema_version": 1,
            "diagnostics": diag,
            "test": test_label,
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    } else {
        print!("{diag}");
        println!("Test:               {}", test_label);
        if !config.status.is_ready() && config.provider.is_enabled() {
            println!();
            println!(
                "Fix: llens ai set-key {} (or set {})",
                config.provider.name(),
                env_var_name(config.provider.name())
            );
        } else if !config.provider.is_enabled() {
            println!();
            println!("AI is disabled. To enable:");
            println!("  Set ai.provider in {}", Settings::config_path().display());
        }
    }

    if let Err(e) = connect(&config) {
        return Err(connect_error(e, &config));
    }
    match test_outcome {
        Some(Err(e)) => Err(e),
        _ => Ok(()),
    }
}

fn run_connectivity_test(config: &ResolvedAIConfig) -> Result<(), CliError> {
    let service = connect(config).map_err(|e| connect_error(e, config))?;
    let reply = service
        .generate(DOCTOR_TEST_PROMPT, None)
        .map_err(|e| service_error(&e, config))?;
    log::debug!("doctor test reply: {}", reply.trim());
    Ok(())
}

// ============================================================================
// ai set-key / clear-key
// ============================================================================

fn parse_provider(name: &str) -> Result<AIProvider, CliError> {
    match name.to_ascii_lowercase().as_str() {
        "gemini" => Ok(AIProvider::Gemini),
        "openai" => Ok(AIProvider::OpenAI),
        other => Err(CliError::usage(format!("unknown provider '{other}'")).with_hint("expected gemini or openai")),
    }
}

pub fn cmd_set_key(provider: &str) -> Result<(), CliError> {
    let provider = parse_provider(provider)?;

    if atty::is(atty::Stream::Stdin) {
        eprint!("{} API key: ", provider.name());
        let _ = io::stderr().flush();
    }
    let mut key = String::new();
    io::stdin()
        .read_to_string(&mut key)
        .map_err(|e| CliError::general(format!("cannot read key from stdin: {e}")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::usage("no key given on stdin"));
    }

    ai::set_api_key(provider.name(), key).map_err(|e| {
        CliError::new(EXIT_AI_KEYCHAIN_ERR, e).with_hint(format!(
            "set {} in the environment instead",
            env_var_name(provider.name())
        ))
    })?;
    eprintln!("stored {} key in the system keychain", provider.name());
    Ok(())
}

pub fn cmd_clear_key(provider: &str) -> Result<(), CliError> {
    let provider = parse_provider(provider)?;
    ai::delete_api_key(provider.name()).map_err(|e| CliError::new(EXIT_AI_KEYCHAIN_ERR, e))?;
    eprintln!("removed {} key from the system keychain", provider.name());
    Ok(())
}
