//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use pactum_core::render::{render_penalties, render_verdicts};
use pactum_core::{overall_notes, BreachEvaluator, ContractRecord, PenaltyEstimator, RuleSet};
use pactum_runtime::{
    AnalyzerConfig, Conversation, LanguageModelClient, ModelClient, Pipeline, Reply, Request,
    SessionRegistry,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    AnalyzerConfig::load(path).with_context(|| match path {
        Some(path) => format!("loading config from {}", path.display()),
        None => "loading default config".to_string(),
    })
}

fn build_client(config: &AnalyzerConfig) -> Result<Arc<ModelClient>> {
    let client = ModelClient::from_config(config).context("configuring the language model")?;
    Ok(Arc::new(client))
}

fn log_usage(client: &ModelClient) {
    let usage = client.usage();
    tracing::info!(
        calls = usage.llm_calls,
        tokens = usage.total_tokens,
        estimated_cost_usd = usage.estimated_cost,
        "Model usage"
    );
}

/// One-shot analysis of a contract document.
pub async fn analyze(
    config_path: Option<&Path>,
    document: &Path,
    breaches: bool,
    penalties: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let client = build_client(&config)?;
    let shared: Arc<dyn LanguageModelClient> = client.clone();
    let pipeline = Arc::new(Pipeline::from_config(shared, &config));
    let mut conversation = Conversation::new(pipeline);

    let mut requests = vec![Request::SubmitDocument(document.display().to_string())];
    if breaches {
        requests.push(Request::DetectBreaches);
    }
    if penalties {
        requests.push(Request::EstimatePenalties);
    }

    let mut replies = Vec::with_capacity(requests.len());
    for request in requests {
        let reply = conversation.handle(request).await;
        let failed = reply.is_failure();
        replies.push(reply);
        if failed {
            break;
        }
    }
    log_usage(&client);

    if json {
        println!("{}", serde_json::to_string_pretty(&replies)?);
    } else {
        let last = replies.len().saturating_sub(1);
        for (i, reply) in replies.iter().enumerate() {
            // Intermediate hints are noise in one-shot output
            match reply {
                Reply::Extracted { extraction } if i < last => print!("{}", extraction.render()),
                Reply::Breaches { verdicts, commentary } if i < last => {
                    print!("{}", render_verdicts(verdicts.verdicts()));
                    if let Some(commentary) = commentary {
                        println!("\n{}", commentary);
                    }
                }
                other => print!("{}", other.render()),
            }
            println!();
        }
    }

    if let Some(Reply::Failed { message, .. }) = replies.last() {
        bail!("{}", message);
    }
    Ok(())
}

/// A parsed line of chat input.
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand {
    Send(Request),
    Help,
    Quit,
    Unknown(String),
}

fn parse_chat_line(line: &str) -> Option<ChatCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "upload" | "analyze" | "open" => ChatCommand::Send(Request::SubmitDocument(rest.to_string())),
        "breaches" | "breach" => ChatCommand::Send(Request::DetectBreaches),
        "penalties" | "penalty" => ChatCommand::Send(Request::EstimatePenalties),
        "reset" => ChatCommand::Send(Request::Reset),
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        _ => ChatCommand::Unknown(word.to_string()),
    };
    Some(command)
}

const CHAT_HELP: &str = "\
Commands:
  upload <path>   extract a contract PDF
  breaches        detect possible breaches
  penalties       estimate possible penalties
  reset           start over
  quit            leave";

/// Line-oriented conversation on stdin/stdout.
pub async fn chat(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let client = build_client(&config)?;
    let shared: Arc<dyn LanguageModelClient> = client.clone();
    let pipeline = Arc::new(Pipeline::from_config(shared, &config));
    let registry = SessionRegistry::new(pipeline, &config.session);
    let mut session = registry.open().await;

    println!("{} ({})", config.app_name, config.agent.name);
    println!("Please upload a contract PDF to begin.\n{}", CHAT_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("reading input")? else {
            break;
        };

        match parse_chat_line(&line) {
            None => continue,
            Some(ChatCommand::Quit) => break,
            Some(ChatCommand::Help) => println!("{}", CHAT_HELP),
            Some(ChatCommand::Unknown(word)) => {
                println!("Unknown command '{}'.\n{}", word, CHAT_HELP)
            }
            Some(ChatCommand::Send(request)) => match registry.handle(&session, request).await {
                Some(reply) => print!("{}", reply.render()),
                None => {
                    session = registry.open().await;
                    println!("Your session expired. Please upload the contract again.");
                }
            },
        }
    }

    registry.close(&session).await;
    log_usage(&client);
    Ok(())
}

/// Offline breach and penalty run over a stored record.
pub fn evaluate(
    config_path: Option<&Path>,
    record_path: &Path,
    penalties: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let record = ContractRecord::from_file(record_path)
        .with_context(|| format!("reading record {}", record_path.display()))?;

    let report = BreachEvaluator::default().evaluate(&record);
    let estimates = penalties.then(|| {
        PenaltyEstimator::new(config.penalty.clone()).estimate(&record, Some(report.verdicts()))
    });

    if json {
        let output = serde_json::json!({
            "verdicts": report,
            "penalties": estimates,
            "overall_notes": estimates.as_deref().map(overall_notes),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_verdicts(report.verdicts()));
        if let Some(estimates) = &estimates {
            println!();
            print!("{}", render_penalties(estimates));
        }
    }
    Ok(())
}

/// Print the fixed rule set.
pub fn rules() -> Result<()> {
    for (id, description) in RuleSet::standard().describe() {
        println!("{:<32} {}", id, description);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_commands() {
        assert_eq!(
            parse_chat_line("upload  contracts/msa.pdf "),
            Some(ChatCommand::Send(Request::SubmitDocument(
                "contracts/msa.pdf".to_string()
            )))
        );
        assert_eq!(
            parse_chat_line("Breaches"),
            Some(ChatCommand::Send(Request::DetectBreaches))
        );
        assert_eq!(
            parse_chat_line("penalties"),
            Some(ChatCommand::Send(Request::EstimatePenalties))
        );
        assert_eq!(parse_chat_line("quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_chat_line("   "), None);
        assert_eq!(
            parse_chat_line("summarize please"),
            Some(ChatCommand::Unknown("summarize".to_string()))
        );
    }

    #[test]
    fn test_upload_without_path_is_sent_as_empty() {
        assert_eq!(
            parse_chat_line("upload"),
            Some(ChatCommand::Send(Request::SubmitDocument(String::new())))
        );
    }

    #[test]
    fn test_evaluate_record_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"parties": [{{"name": "A"}}, {{"name": "B"}}], "financial_terms": "Client pays $10,000 USD monthly."}}"#
        )
        .unwrap();

        assert!(evaluate(None, file.path(), true, true).is_ok());
        assert!(evaluate(None, file.path(), false, false).is_ok());
    }

    #[test]
    fn test_evaluate_missing_record_fails() {
        let err = evaluate(None, Path::new("/no/such/record.json"), false, false).unwrap_err();
        assert!(format!("{:#}", err).contains("reading record"));
    }
}
