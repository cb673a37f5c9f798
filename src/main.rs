//! inbox-agent - Entry point for the batch inbox agent

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use inbox_agent::classifier::{Classifier, ModelStore, RuleClassifier};
use inbox_agent::config::{self, ClassifierMode, Settings};
use inbox_agent::domain::{AccountId, EmailView};
use inbox_agent::providers::email::{GmailCredentials, GmailProvider};
use inbox_agent::services::{plan_for, InboxAgent, SlackNotifier};

#[derive(Parser)]
#[command(name = "inbox-agent")]
#[command(about = "Email agent for classification and organization")]
#[command(version)]
struct Cli {
    /// Run one processing pass immediately
    #[arg(long)]
    run_now: bool,

    /// Path to settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured classifier
    #[arg(long, value_enum, global = true)]
    classifier: Option<ClassifierArg>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrain the model from the bundled corpus and save it
    TrainDefault,

    /// Classify a single message offline and print its plan
    Classify {
        /// Message subject
        subject: String,

        /// Message body
        #[arg(long, default_value = "")]
        body: String,

        /// Sender address
        #[arg(long, default_value = "")]
        sender: String,
    },

    /// Store Gmail OAuth credentials in the system keychain
    SetCredentials {
        /// OAuth client ID
        #[arg(long, env = "GMAIL_CLIENT_ID")]
        client_id: String,

        /// OAuth client secret
        #[arg(long, env = "GMAIL_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,

        /// Refresh token obtained out of band
        #[arg(long, env = "GMAIL_REFRESH_TOKEN", hide_env_values = true)]
        refresh_token: String,

        /// Save without exchanging the refresh token first
        #[arg(long)]
        no_verify: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ClassifierArg {
    Rules,
    Learned,
}

impl From<ClassifierArg> for ClassifierMode {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::Rules => ClassifierMode::Rules,
            ClassifierArg::Learned => ClassifierMode::Learned,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let settings_path = cli.config.clone().unwrap_or_else(config::default_settings_path);
    let mut settings = Settings::load_from(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    if let Some(mode) = cli.classifier {
        settings.classifier.mode = mode.into();
    }

    match cli.command {
        Some(Commands::TrainDefault) => train_default(&settings),
        Some(Commands::Classify {
            subject,
            body,
            sender,
        }) => classify(&settings, EmailView::new(subject, body, sender)),
        Some(Commands::SetCredentials {
            client_id,
            client_secret,
            refresh_token,
            no_verify,
        }) => {
            let credentials = GmailCredentials {
                refresh_token,
                client_id,
                client_secret,
            };
            set_credentials(&settings, credentials, !no_verify).await
        }
        None if cli.run_now => run_now(&settings).await,
        None => {
            println!("To run the email agent, use: inbox-agent --run-now");
            println!("This command is intended to be run via a scheduler for automated processing.");
            Ok(())
        }
    }
}

fn model_store(settings: &Settings) -> ModelStore {
    settings
        .classifier
        .model_path
        .clone()
        .map(ModelStore::new)
        .unwrap_or_else(ModelStore::at_default_location)
}

fn build_classifier(settings: &Settings) -> anyhow::Result<Box<dyn Classifier>> {
    match settings.classifier.mode {
        ClassifierMode::Rules => Ok(Box::new(RuleClassifier::new())),
        ClassifierMode::Learned => {
            let store = model_store(settings);
            let model = store
                .load_or_bootstrap()
                .with_context(|| format!("failed to load model from {}", store.path().display()))?;
            Ok(Box::new(model))
        }
    }
}

fn train_default(settings: &Settings) -> anyhow::Result<()> {
    let store = model_store(settings);
    let model = store.rebuild_default().context("failed to train default model")?;

    println!(
        "Trained {} categories over {} terms, saved to {}",
        model.classes().len(),
        model.vocabulary_size(),
        store.path().display()
    );
    Ok(())
}

fn classify(settings: &Settings, view: EmailView) -> anyhow::Result<()> {
    let classifier = build_classifier(settings)?;
    let category = classifier.classify(&view);
    let plan = plan_for(category, None);

    println!("{} ({})", category, classifier.name());
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn set_credentials(
    settings: &Settings,
    credentials: GmailCredentials,
    verify: bool,
) -> anyhow::Result<()> {
    let account_id = AccountId::from(settings.gmail.account_id.as_str());
    let mut provider = GmailProvider::with_credentials(account_id, credentials.clone());

    if verify {
        provider
            .authenticate()
            .await
            .context("refresh token was rejected, credentials not saved")?;
    }

    provider
        .save_credentials_to_keychain(&credentials)
        .context("failed to save credentials to the keychain")?;

    println!("Credentials saved for account {}", provider.account_id());
    Ok(())
}

async fn run_now(settings: &Settings) -> anyhow::Result<()> {
    let classifier = build_classifier(settings)?;

    let mut provider = GmailProvider::new(AccountId::from(settings.gmail.account_id.as_str()));
    provider
        .authenticate()
        .await
        .context("Gmail authentication failed")?;

    let mut agent = InboxAgent::new(Arc::new(provider), classifier).with_actions(&settings.actions);

    if settings.notifications.enabled {
        match SlackNotifier::from_settings(&settings.notifications) {
            Some(notifier) => agent = agent.with_notifier(Box::new(notifier)),
            None => tracing::warn!("Slack token or channel not set, digest will be skipped"),
        }
    }

    let report = agent.run_pass().await;

    println!(
        "Processed {} messages ({} failed), archived {}, flagged {}",
        report.processed, report.failed, report.archived, report.flagged
    );
    for (category, count) in &report.by_category {
        println!("  {}: {}", category, count);
    }
    if report.digest_sent {
        println!("Summary sent to notification channel.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_credentials_takes_flags() {
        let cli = Cli::try_parse_from([
            "inbox-agent",
            "set-credentials",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
            "--refresh-token",
            "token",
            "--no-verify",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::SetCredentials {
                client_id,
                client_secret,
                refresh_token,
                no_verify,
            }) => {
                assert_eq!(client_id, "id");
                assert_eq!(client_secret, "secret");
                assert_eq!(refresh_token, "token");
                assert!(no_verify);
            }
            _ => panic!("expected set-credentials"),
        }
    }

    #[test]
    fn set_credentials_rejects_missing_client_id() {
        std::env::remove_var("GMAIL_CLIENT_ID");
        let result = Cli::try_parse_from([
            "inbox-agent",
            "set-credentials",
            "--client-secret",
            "secret",
            "--refresh-token",
            "token",
        ]);

        assert!(result.is_err());
    }
}
