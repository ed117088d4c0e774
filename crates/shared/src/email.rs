use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::Briefing;
use crate::report::date_range_label;

const SMTP_HOST: &str = "smtp.gmail.com";
const MAX_SEND_ATTEMPTS: u32 = 3;

/// SMTP reply codes that indicate rejected credentials. These are never
/// retried; everything else is treated as transient.
const AUTH_REJECTED_CODES: &[&str] = &["530", "534", "535"];

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub recipient: String,
    pub sender: String,
    pub password: String,
}

impl EmailConfig {
    /// Resolve delivery configuration, reporting every missing variable in
    /// a single error before any network activity happens.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let recipient = lookup("RECIPIENT_EMAIL").filter(|v| !v.is_empty());
        let sender = lookup("SENDER_EMAIL").filter(|v| !v.is_empty());
        let password = lookup("GMAIL_APP_PASSWORD").filter(|v| !v.is_empty());

        let missing: Vec<&str> = [
            ("RECIPIENT_EMAIL", &recipient),
            ("SENDER_EMAIL", &sender),
            ("GMAIL_APP_PASSWORD", &password),
        ]
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            anyhow::bail!("Missing email configuration: {}", missing.join(", "));
        }

        Ok(Self {
            recipient: recipient.unwrap(),
            sender: sender.unwrap(),
            password: password.unwrap(),
        })
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP authentication rejected: {0}")]
    Auth(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Seam over the actual mail submission so the retry policy can be tested
/// without a live SMTP server.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), MailError>;
}

pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// SMTPS relay (implicit TLS) with the configured credentials.
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let credentials = Credentials::new(config.sender.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(SMTP_HOST)
            .context("Failed to create SMTP transport")?
            .credentials(credentials)
            .build();
        Ok(Self { mailer })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &Message) -> Result<(), MailError> {
        match self.mailer.send(message.clone()).await {
            Ok(_) => Ok(()),
            Err(e) => Err(classify_smtp_error(&e)),
        }
    }
}

fn classify_smtp_error(error: &lettre::transport::smtp::Error) -> MailError {
    let auth_rejected = error
        .status()
        .is_some_and(|code| AUTH_REJECTED_CODES.contains(&code.to_string().as_str()));
    if auth_rejected {
        MailError::Auth(error.to_string())
    } else {
        MailError::Transport(error.to_string())
    }
}

/// Send with bounded retries: transient errors back off `2^attempt` seconds
/// between attempts; an authentication rejection fails immediately.
pub async fn send_with_retry(
    transport: &dyn MailTransport,
    message: &Message,
    max_attempts: u32,
) -> Result<()> {
    let mut last_error = String::new();
    for attempt in 1..=max_attempts {
        match transport.send(message).await {
            Ok(()) => {
                info!("Email sent successfully (attempt {})", attempt);
                return Ok(());
            }
            Err(MailError::Auth(reason)) => {
                error!(
                    "SMTP authentication failed. Use an App Password (16 chars), \
                     NOT your regular account password. Error: {}",
                    reason
                );
                anyhow::bail!("SMTP authentication rejected: {}", reason);
            }
            Err(MailError::Transport(reason)) => {
                if attempt < max_attempts {
                    let wait = std::time::Duration::from_secs(2u64.pow(attempt));
                    warn!(
                        "SMTP error (attempt {}/{}): {} - retrying in {:?}",
                        attempt, max_attempts, reason, wait
                    );
                    tokio::time::sleep(wait).await;
                } else {
                    error!("SMTP error after {} attempts: {}", max_attempts, reason);
                }
                last_error = reason;
            }
        }
    }
    anyhow::bail!(
        "SMTP send failed after {} attempts: {}",
        max_attempts,
        last_error
    )
}

/// Plain-text fallback rendering of the briefing.
pub fn build_plain_text(briefing: &Briefing, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        "AI & TECH WEEKLY BRIEFING".to_string(),
        format!("Generated: {}", now.format("%B %d, %Y")),
        "=".repeat(60),
        String::new(),
        "EXECUTIVE SUMMARY".to_string(),
        "-".repeat(40),
        briefing.executive_summary.clone(),
        String::new(),
        "TOP STORIES".to_string(),
        "-".repeat(40),
    ];

    for (i, story) in briefing.top_stories.iter().enumerate() {
        lines.push(format!("{}. {} [{}]", i + 1, story.title, story.source));
        lines.push(format!("   {}", story.url));
        lines.push(format!("   {}", story.reason));
        lines.push(String::new());
    }

    for section in briefing.non_empty_categories() {
        lines.push(String::new());
        lines.push(section.name.to_uppercase());
        lines.push("-".repeat(40));
        for story in &section.stories {
            lines.push(format!("• {} [{}]", story.title, story.source));
            lines.push(format!("  {}", story.url));
            lines.push(format!("  {}", story.summary));
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Compact HTML email body: stats plus a callout pointing at the attached
/// report. The full layout lives in the report itself.
pub fn build_email_html(briefing: &Briefing, date_range: &str, report_filename: &str) -> String {
    let total = briefing.total_stories();
    let sources = briefing.distinct_sources();
    let categories = briefing.non_empty_categories().len();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>AI &amp; Tech Weekly Briefing</title>
</head>
<body style="margin:0;padding:0;background:#F3F4F6;font-family:-apple-system,'Segoe UI',Helvetica,Arial,sans-serif;">
  <div style="max-width:560px;margin:0 auto;padding:32px 16px;">
    <div style="background:linear-gradient(135deg,#0D1B2A,#1B0D2A);border-radius:12px 12px 0 0;padding:32px 36px;text-align:center;">
      <div style="font-size:13px;font-weight:600;color:#94A3B8;text-transform:uppercase;letter-spacing:2px;">Weekly Briefing</div>
      <div style="font-size:28px;font-weight:800;color:#FFFFFF;margin:8px 0 6px;">AI &amp; Tech</div>
      <div style="font-size:14px;color:#CBD5E1;">{date_range}</div>
    </div>
    <div style="background:#1E293B;padding:16px 36px;display:flex;text-align:center;">
      <div style="flex:1;border-right:1px solid #334155;"><div style="font-size:24px;font-weight:800;color:#F59E0B;">{total}</div><div style="font-size:11px;color:#94A3B8;">Stories</div></div>
      <div style="flex:1;border-right:1px solid #334155;"><div style="font-size:24px;font-weight:800;color:#F59E0B;">{sources}</div><div style="font-size:11px;color:#94A3B8;">Sources</div></div>
      <div style="flex:1;"><div style="font-size:24px;font-weight:800;color:#F59E0B;">{categories}</div><div style="font-size:11px;color:#94A3B8;">Categories</div></div>
    </div>
    <div style="background:#FFFFFF;padding:32px 36px;">
      <p style="margin:0 0 16px;font-size:16px;font-weight:600;color:#111827;">Your weekly briefing is attached. 📎</p>
      <p style="margin:0 0 20px;font-size:14px;color:#4B5563;line-height:1.7;">
        This week's <strong>AI &amp; Tech Weekly Briefing</strong> covers {date_range} with
        <strong>{total} stories</strong> from <strong>{sources} sources</strong>
        across <strong>{categories} categories</strong>.
      </p>
      <div style="background:#EEF2FF;border-radius:8px;border:1px solid #C7D2FE;padding:16px 20px;margin-bottom:24px;">
        <div style="font-size:13px;font-weight:700;color:#3730A3;margin-bottom:4px;">📄 {report_filename}</div>
        <div style="font-size:12px;color:#6366F1;">Open the attached report for your full curated weekly briefing with clickable links.</div>
      </div>
      <p style="margin:0;font-size:13px;color:#9CA3AF;">This is an automated briefing, curated by Claude AI.</p>
    </div>
    <div style="background:#F9FAFB;border-radius:0 0 12px 12px;padding:16px 36px;border-top:1px solid #E5E7EB;">
      <p style="margin:0;font-size:11px;color:#9CA3AF;text-align:center;">AI &amp; Tech Weekly Briefing &nbsp;•&nbsp; Curated by Claude AI</p>
    </div>
  </div>
</body>
</html>"#,
        date_range = date_range,
        total = total,
        sources = sources,
        categories = categories,
        report_filename = report_filename,
    )
}

fn build_message(
    config: &EmailConfig,
    subject: &str,
    plain_body: String,
    html_body: String,
    attachment: Option<(String, String)>,
) -> Result<Message> {
    let from: Mailbox = format!("AI News Briefing <{}>", config.sender)
        .parse()
        .context("Invalid sender email address")?;
    let to: Mailbox = config
        .recipient
        .parse()
        .context("Invalid recipient email address")?;

    let alternative = MultiPart::alternative()
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(plain_body),
        )
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(html_body),
        );

    let builder = Message::builder().from(from).to(to).subject(subject);
    let message = match attachment {
        Some((filename, content)) => builder.multipart(
            MultiPart::mixed()
                .multipart(alternative)
                .singlepart(Attachment::new(filename).body(content, ContentType::TEXT_HTML)),
        ),
        None => builder.multipart(alternative),
    }
    .context("Failed to build email message")?;

    Ok(message)
}

/// Renders and sends the briefing email with the report attached.
pub struct BriefingMailer {
    config: EmailConfig,
}

impl BriefingMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send the briefing. The report file is attached when present at
    /// `report_path`; a missing file downgrades to a body-only email.
    pub async fn send(
        &self,
        briefing: &Briefing,
        report_path: &Path,
        days: i64,
        debug_html_path: Option<&Path>,
    ) -> Result<()> {
        let now = Utc::now();
        let date_range = date_range_label(now, days);
        let subject = format!("AI & Tech Weekly Briefing — {}", date_range);

        let attachment = if report_path.exists() {
            let content = fs::read_to_string(report_path)
                .with_context(|| format!("Failed to read report file {}", report_path.display()))?;
            let filename = report_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| default_report_filename(now));
            info!("Attaching report: {} ({:.1} KB)", filename, content.len() as f64 / 1024.0);
            Some((filename, content))
        } else {
            warn!(
                "Report file not found at {} - sending without attachment",
                report_path.display()
            );
            None
        };

        let report_filename = attachment
            .as_ref()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| default_report_filename(now));

        let plain_body = build_plain_text(briefing, now);
        let html_body = build_email_html(briefing, &date_range, &report_filename);

        if let Some(path) = debug_html_path {
            match crate::io::save_text(path, &html_body) {
                Ok(()) => info!("Saved rendered HTML to {}", path.display()),
                Err(e) => warn!("Could not save HTML: {:#}", e),
            }
        }

        let message = build_message(&self.config, &subject, plain_body, html_body, attachment)?;
        let transport = SmtpMailTransport::new(&self.config)?;

        info!("Sending email to {}", self.config.recipient);
        send_with_retry(&transport, &message, MAX_SEND_ATTEMPTS).await
    }
}

fn default_report_filename(now: DateTime<Utc>) -> String {
    format!("AI-Tech-Briefing-{}.html", now.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryStory, TopStory};
    use std::collections::HashMap;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    fn sample_briefing() -> Briefing {
        let mut briefing = Briefing::empty("Quite a week.");
        briefing.top_stories = vec![TopStory {
            title: "Top story".to_string(),
            url: "https://example.com/top".to_string(),
            source: "Wired".to_string(),
            reason: "It was everywhere.".to_string(),
        }];
        briefing.categories[1].stories = vec![CategoryStory {
            title: "A launch".to_string(),
            url: "https://example.com/launch".to_string(),
            source: "TechCrunch".to_string(),
            summary: "Something shipped.".to_string(),
        }];
        briefing
    }

    fn test_config() -> EmailConfig {
        EmailConfig {
            recipient: "reader@example.com".to_string(),
            sender: "bot@example.com".to_string(),
            password: "app-password".to_string(),
        }
    }

    // ==================== Config Tests ====================

    #[test]
    fn test_config_reports_all_missing_variables() {
        let err = EmailConfig::from_lookup(|_| None).unwrap_err().to_string();
        assert!(err.contains("RECIPIENT_EMAIL"));
        assert!(err.contains("SENDER_EMAIL"));
        assert!(err.contains("GMAIL_APP_PASSWORD"));
    }

    #[test]
    fn test_config_treats_empty_values_as_missing() {
        let mut vars = HashMap::new();
        vars.insert("RECIPIENT_EMAIL", "reader@example.com");
        vars.insert("SENDER_EMAIL", "");
        vars.insert("GMAIL_APP_PASSWORD", "secret");
        let err = EmailConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap_err()
            .to_string();
        assert!(err.contains("SENDER_EMAIL"));
        assert!(!err.contains("RECIPIENT_EMAIL"));
    }

    #[test]
    fn test_config_resolves_when_complete() {
        let mut vars = HashMap::new();
        vars.insert("RECIPIENT_EMAIL", "reader@example.com");
        vars.insert("SENDER_EMAIL", "bot@example.com");
        vars.insert("GMAIL_APP_PASSWORD", "secret");
        let config =
            EmailConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.recipient, "reader@example.com");
    }

    // ==================== Body Rendering Tests ====================

    #[test]
    fn test_plain_text_lists_sections_in_order() {
        let now = Utc::now();
        let text = build_plain_text(&sample_briefing(), now);
        assert!(text.contains("EXECUTIVE SUMMARY"));
        assert!(text.contains("Quite a week."));
        assert!(text.contains("1. Top story [Wired]"));
        assert!(text.contains("PRODUCT LAUNCHES & UPDATES"));
        // Empty categories are skipped entirely.
        assert!(!text.contains("ROBOTICS & AUTONOMOUS SYSTEMS"));
    }

    #[test]
    fn test_email_html_contains_stats_and_filename() {
        let html = build_email_html(&sample_briefing(), "July 29 – August 05, 2026", "brief.html");
        assert!(html.contains("brief.html"));
        assert!(html.contains("July 29 – August 05, 2026"));
        assert!(html.contains("<strong>1 stories</strong>"));
    }

    #[test]
    fn test_build_message_with_attachment() {
        let message = build_message(
            &test_config(),
            "Subject line",
            "plain".to_string(),
            "<html></html>".to_string(),
            Some(("AI-Tech-Briefing-2026-08-05.html".to_string(), "<html></html>".to_string())),
        )
        .unwrap();
        let formatted = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(formatted.contains("AI-Tech-Briefing-2026-08-05.html"));
        assert!(formatted.contains("Subject line"));
    }

    // ==================== Retry Policy Tests ====================

    struct MockTransport {
        responses: Mutex<VecDeque<Result<(), MailError>>>,
        sent_at: Mutex<Vec<tokio::time::Instant>>,
    }

    impl MockTransport {
        fn new(responses: Vec<Result<(), MailError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                sent_at: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> usize {
            self.sent_at.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MailTransport for MockTransport {
        async fn send(&self, _message: &Message) -> Result<(), MailError> {
            self.sent_at.lock().unwrap().push(tokio::time::Instant::now());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        }
    }

    fn test_message() -> Message {
        build_message(
            &test_config(),
            "test",
            "plain".to_string(),
            "<html></html>".to_string(),
            None,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_back_off_then_succeed() {
        let transport = MockTransport::new(vec![
            Err(MailError::Transport("451 temporary".to_string())),
            Err(MailError::Transport("451 temporary".to_string())),
            Ok(()),
        ]);
        let message = test_message();

        send_with_retry(&transport, &message, 3).await.unwrap();

        let times = transport.sent_at.lock().unwrap().clone();
        assert_eq!(times.len(), 3);
        // Exponential backoff: 2 s after the first failure, 4 s after the second.
        assert_eq!(times[1] - times[0], Duration::from_secs(2));
        assert_eq!(times[2] - times[1], Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_is_never_retried() {
        let transport = MockTransport::new(vec![Err(MailError::Auth("535 bad creds".to_string()))]);
        let message = test_message();

        let result = send_with_retry(&transport, &message, 3).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("authentication"));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_is_fatal() {
        let transport = MockTransport::new(vec![
            Err(MailError::Transport("451 temporary".to_string())),
            Err(MailError::Transport("451 temporary".to_string())),
            Err(MailError::Transport("451 temporary".to_string())),
        ]);
        let message = test_message();

        let result = send_with_retry(&transport, &message, 3).await;

        assert!(result.is_err());
        assert_eq!(transport.attempts(), 3);
        assert!(result.unwrap_err().to_string().contains("after 3 attempts"));
    }
}
