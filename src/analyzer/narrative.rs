// =============================================================================
// Narrative Generator: free-text commentary on an indicator frame
// =============================================================================
//
// `NarrativeGenerator` pushes text chunks into a channel as they arrive.  The
// bundled implementation talks to any OpenAI-compatible chat-completions
// endpoint:
//
//   POST {api_url}   Authorization: Bearer {api_key}
//   {"model": ..., "messages": [...], "stream": true|false}
//
// Streaming replies are server-sent events, one `data: {json}` per line,
// terminated by `data: [DONE]`.  Text lives in `choices[0].delta.content`
// (streaming) or `choices[0].message.content` (non-streaming).
// =============================================================================

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::indicators::IndicatorFrame;

/// Rows of recent history included in the prompt.
const PROMPT_HISTORY_ROWS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a futures market analyst. Given technical indicator data, \
write a concise analysis covering trend, momentum, volatility, volume and open interest, \
then give a short-term outlook and the key risks. Do not invent data that is not provided.";

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrator request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("narrator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed narrator response: {0}")]
    Malformed(String),

    #[error("cannot narrate an empty frame")]
    EmptyFrame,

    #[error("narrative receiver closed")]
    SinkClosed,
}

/// Supplier of free-text commentary.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Write commentary on `frame` into `out`, chunk by chunk when
    /// `streaming`, otherwise as a single chunk.
    async fn narrate(
        &self,
        frame: &IndicatorFrame,
        instrument_id: &str,
        streaming: bool,
        out: mpsc::Sender<String>,
    ) -> Result<(), NarrativeError>;
}

// =============================================================================
// Configuration
// =============================================================================

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Endpoint settings for [`LlmNarrator`].
#[derive(Clone, Serialize, Deserialize)]
pub struct NarratorConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// The key stays out of logs.
impl std::fmt::Debug for NarratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarratorConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Default, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: MessageContent,
    #[serde(default)]
    delta: MessageContent,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<Choice>,
}

/// One parsed server-sent-event line.
#[derive(Debug, PartialEq)]
pub enum SseEvent {
    Content(String),
    Done,
    Ignore,
}

/// Interpret a single SSE line from a streaming chat completion.
pub fn parse_sse_line(line: &str) -> Result<SseEvent, NarrativeError> {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return Ok(SseEvent::Ignore);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }
    if data.is_empty() {
        return Ok(SseEvent::Ignore);
    }

    let reply: ChatReply =
        serde_json::from_str(data).map_err(|e| NarrativeError::Malformed(e.to_string()))?;
    match reply.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(text) if !text.is_empty() => Ok(SseEvent::Content(text)),
        _ => Ok(SseEvent::Ignore),
    }
}

/// Render the latest indicator values and recent closes as a prompt.
///
/// Returns `None` for an empty frame.
pub fn build_prompt(frame: &IndicatorFrame, instrument_id: &str) -> Option<String> {
    let l = frame.latest()?;
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.4}"));

    let mut p = String::new();
    let _ = writeln!(p, "Futures contract: {instrument_id}");
    let _ = writeln!(p, "Date: {}", l.date);
    let _ = writeln!(
        p,
        "Open {:.2}  High {:.2}  Low {:.2}  Close {:.2}",
        l.open, l.high, l.low, l.close
    );
    if frame.has_volume() {
        let _ = writeln!(p, "Volume {:.0}  Volume_MA {}", l.volume, fmt(l.volume_ma));
    }
    if frame.has_open_interest() {
        let _ = writeln!(
            p,
            "OpenInterest {:.0}  OI_MA {}  OI_Change% {}  OI/Volume {}",
            l.open_interest,
            fmt(l.oi_ma),
            fmt(l.oi_change),
            fmt(l.oi_volume_ratio)
        );
    }
    let _ = writeln!(
        p,
        "MA5 {}  MA20 {}  MA60 {}",
        fmt(l.ma_short),
        fmt(l.ma_medium),
        fmt(l.ma_long)
    );
    let _ = writeln!(
        p,
        "MACD {}  Signal {}  Histogram {}",
        fmt(l.macd),
        fmt(l.signal),
        fmt(l.histogram)
    );
    let _ = writeln!(p, "RSI {}  Momentum {}", fmt(l.rsi), fmt(l.momentum));
    let _ = writeln!(
        p,
        "Bollinger upper {}  middle {}  lower {}",
        fmt(l.bb_upper),
        fmt(l.bb_middle),
        fmt(l.bb_lower)
    );
    let _ = writeln!(
        p,
        "ATR {}  Annualised volatility {}",
        fmt(l.atr),
        fmt(l.volatility_std)
    );

    let closes: Vec<String> = frame
        .tail(PROMPT_HISTORY_ROWS)
        .iter()
        .map(|r| format!("{} {:.2}", r.date, r.close))
        .collect();
    let _ = writeln!(p, "Recent closes: {}", closes.join(", "));
    Some(p)
}

// =============================================================================
// LLM narrator
// =============================================================================

pub struct LlmNarrator {
    config: NarratorConfig,
    client: reqwest::Client,
}

impl LlmNarrator {
    pub fn new(config: NarratorConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        debug!(api_url = %config.api_url, model = %config.model, "LlmNarrator initialised");
        Ok(Self { config, client })
    }
}

#[async_trait]
impl NarrativeGenerator for LlmNarrator {
    #[instrument(skip(self, frame, out), name = "narrator::narrate")]
    async fn narrate(
        &self,
        frame: &IndicatorFrame,
        instrument_id: &str,
        streaming: bool,
        out: mpsc::Sender<String>,
    ) -> Result<(), NarrativeError> {
        let prompt = build_prompt(frame, instrument_id).ok_or(NarrativeError::EmptyFrame)?;
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            stream: streaming,
        };

        let mut request = self.client.post(&self.config.api_url).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }
        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NarrativeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if !streaming {
            let reply: ChatReply = resp.json().await?;
            let text = reply
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| NarrativeError::Malformed("reply has no message content".into()))?;
            return out.send(text).await.map_err(|_| NarrativeError::SinkClosed);
        }

        relay_sse(resp.bytes_stream(), &out).await.map(|_| ())
    }
}

/// Forward the content of a server-sent-event byte stream into `out`.
///
/// Returns the number of chunks sent.  A final line without a trailing
/// newline is still parsed.
async fn relay_sse<S, B, E>(stream: S, out: &mpsc::Sender<String>) -> Result<usize, NarrativeError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    NarrativeError: From<E>,
{
    let mut stream = std::pin::pin!(stream);
    let mut buf: Vec<u8> = Vec::new();
    let mut chunks = 0usize;
    while let Some(bytes) = stream.next().await {
        buf.extend_from_slice(bytes?.as_ref());
        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buf.drain(..=pos).collect();
            if deliver(&line, out, &mut chunks).await? {
                debug!(chunks, "narrative stream finished");
                return Ok(chunks);
            }
        }
    }

    if !buf.is_empty() && deliver(&buf, out, &mut chunks).await? {
        debug!(chunks, "narrative stream finished");
        return Ok(chunks);
    }
    debug!(chunks, "narrative stream ended without [DONE]");
    Ok(chunks)
}

/// Handle one SSE line; `true` once the terminator is seen.
async fn deliver(line: &[u8], out: &mpsc::Sender<String>, chunks: &mut usize) -> Result<bool, NarrativeError> {
    match parse_sse_line(&String::from_utf8_lossy(line))? {
        SseEvent::Content(text) => {
            *chunks += 1;
            out.send(text).await.map_err(|_| NarrativeError::SinkClosed)?;
            Ok(false)
        }
        SseEvent::Done => Ok(true),
        SseEvent::Ignore => Ok(false),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::FuturesIndicators;
    use crate::market_data::{Bar, BarSeries, ColumnSet};
    use chrono::NaiveDate;

    #[test]
    fn sse_content_line() {
        let line = r#"data: {"choices":[{"delta":{"content":"Trend is up"}}]}"#;
        assert_eq!(
            parse_sse_line(line).unwrap(),
            SseEvent::Content("Trend is up".into())
        );
    }

    #[test]
    fn sse_done_and_noise() {
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), SseEvent::Done);
        assert_eq!(parse_sse_line("").unwrap(), SseEvent::Ignore);
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), SseEvent::Ignore);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            SseEvent::Ignore
        );
        assert!(matches!(
            parse_sse_line("data: {not json"),
            Err(NarrativeError::Malformed(_))
        ));
    }

    fn sse_chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, NarrativeError>> {
        let parts: Vec<_> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        futures_util::stream::iter(parts)
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut got = Vec::new();
        while let Ok(text) = rx.try_recv() {
            got.push(text);
        }
        got
    }

    #[tokio::test]
    async fn relay_joins_lines_split_across_chunks() {
        let (tx, mut rx) = mpsc::channel(8);
        let stream = sse_chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Tre",
            "nd up\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\", risk low\"}}]}\n",
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n",
        ]);
        assert_eq!(relay_sse(stream, &tx).await.unwrap(), 2);
        assert_eq!(drain(&mut rx), vec!["Trend up", ", risk low"]);
    }

    #[tokio::test]
    async fn relay_parses_final_line_without_newline() {
        let (tx, mut rx) = mpsc::channel(8);
        let stream = sse_chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"first\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"last\"}}]}",
        ]);
        assert_eq!(relay_sse(stream, &tx).await.unwrap(), 2);
        assert_eq!(drain(&mut rx), vec!["first", "last"]);
    }

    #[test]
    fn prompt_mentions_contract_and_indicators() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..30)
            .map(|i| Bar {
                volume: 100.0,
                open_interest: 1000.0,
                ..Bar::from_close(start + chrono::Duration::days(i), 100.0 + i as f64)
            })
            .collect();
        let series = BarSeries::new(bars, ColumnSet::ALL).unwrap();
        let frame = FuturesIndicators::default().extend(&series).unwrap();

        let prompt = build_prompt(&frame, "RB2405").unwrap();
        assert!(prompt.contains("RB2405"));
        assert!(prompt.contains("RSI"));
        assert!(prompt.contains("OpenInterest 1000"));
        assert!(prompt.contains("MA60 n/a"));
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: true,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"model": "m", "messages": [{"role": "user", "content": "hi"}], "stream": true})
        );
    }

    #[test]
    fn config_debug_hides_key() {
        let cfg = NarratorConfig {
            api_url: "http://localhost".into(),
            api_key: "secret-key".into(),
            model: default_model(),
            timeout_secs: 5,
        };
        assert!(!format!("{cfg:?}").contains("secret-key"));
    }
}
