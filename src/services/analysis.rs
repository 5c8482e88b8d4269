//! Mood-trend analysis through an OpenAI-compatible chat completion API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::diary::{Diary, DATE_FORMAT};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "あなたはユーザーの日記とメンタルスコア（1〜10）をもとに、感情の傾向を分析し、やさしく前向きなアドバイスを行うメンタルサポートAIです。\n\n\
ユーザーのメンタルスコアは1〜10の10段階で記録されており、1が最も調子が悪く、10が最も調子が良いことを表します。\n\n\
スコアと日記の内容を組み合わせて、感情の傾向を読み取り、簡潔に100文字以内で説明してください。";

const USER_PROMPT_HEAD: &str = "以下はユーザーの日記とメンタルスコアです。\n\n";

const USER_PROMPT_TAIL: &str =
    "\n\nこの内容を分析して、感情の傾向を読み取り、わかりやすく丁寧に説明してください。";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

/// System prompt plus one user message listing every entry.
pub fn build_messages(diaries: &[Diary]) -> Vec<ChatMessage> {
    let entries = diaries
        .iter()
        .map(|d| {
            format!(
                "Date: {}\nMental: {}\nDiary: {}",
                d.date.format(DATE_FORMAT),
                d.mental,
                d.diary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::new("system", SYSTEM_PROMPT.to_string()),
        ChatMessage::new(
            "user",
            format!("{}{}{}", USER_PROMPT_HEAD, entries, USER_PROMPT_TAIL),
        ),
    ]
}

#[async_trait]
pub trait MoodAnalyzer: Send + Sync {
    /// Returns the model's free-text answer.
    async fn analyze(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// OpenRouter client. A missing API key is only reported when a request is made.
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenRouterClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: config.analysis_api_url.clone(),
            model: config.analysis_model.clone(),
            api_key: config.openrouter_api_key.clone(),
        })
    }
}

#[async_trait]
impl MoodAnalyzer for OpenRouterClient {
    async fn analyze(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("APIキーが設定されていません");
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages: &messages,
            })
            .send()
            .await
            .context("APIリクエストの送信に失敗しました")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Analysis API returned an error");
            anyhow::bail!("APIリクエストが失敗しました: {}", status);
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("APIレスポンスの解析に失敗しました")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("分析結果が空です")
    }
}
