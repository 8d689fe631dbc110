//! AI report client.
//!
//! Builds a competitive-analysis prompt from aggregate stats and sends it to
//! an OpenAI-compatible chat completions endpoint. One synchronous request,
//! no retry; anything beyond that belongs to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::summary::CategoryCounts;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("response contained no choices")]
    Empty,
}

/// Aggregate statistics for one dataset, as fed into the report prompt.
pub struct DatasetStats {
    pub name: String,
    pub url_total: usize,
    pub keyword_total: usize,
    /// Top categories as `(label, count, percent)`.
    pub top_categories: Vec<(String, usize, f64)>,
}

impl DatasetStats {
    pub fn new(name: &str, counts: &CategoryCounts, keyword_total: usize) -> Self {
        let top_categories = counts
            .top(5)
            .iter()
            .map(|(cat, n)| (cat.clone(), *n, counts.percent(*n)))
            .collect();

        Self {
            name: name.to_string(),
            url_total: counts.total(),
            keyword_total,
            top_categories,
        }
    }

    fn write_block(&self, out: &mut String) {
        out.push_str(&format!("{}:\n", self.name));
        out.push_str(&format!("- Total URLs: {}\n", self.url_total));
        out.push_str(&format!("- Total Keywords: {}\n", self.keyword_total));
        out.push_str("- Top 5 Categories:\n");
        for (cat, n, pct) in &self.top_categories {
            out.push_str(&format!("  - {cat}: {n} URLs ({pct:.1}%)\n"));
        }
    }
}

/// Build the strategic-report prompt from client and competitor stats.
pub fn build_prompt(client: &DatasetStats, competitors: &[DatasetStats]) -> String {
    let mut prompt = String::from(
        "You are an expert competitive SEO analyst. Produce a COMPLETE STRATEGIC REPORT.\n\nCLIENT\n",
    );
    client.write_block(&mut prompt);

    prompt.push_str("\nCOMPETITORS\n");
    if competitors.is_empty() {
        prompt.push_str("(none provided)\n");
    }
    for comp in competitors {
        prompt.push('\n');
        comp.write_block(&mut prompt);
    }

    prompt.push_str(
        "\nFORMAT\n\n\
         STRATEGIC SUMMARY\n\n\
         [Describe the market's positioning strategies in 2-3 paragraphs]\n\n\
         CLIENT ANALYSIS\n\n\
         [Analyze the client's strengths, distribution and strategy in 2-3 paragraphs with specific figures]\n\n\
         COMPETITOR ANALYSIS\n\n\
         [For each competitor: Traffic Distribution, Content Strategy, Bottom Line]\n\n\
         MARKET GAP AND OPPORTUNITIES\n\n\
         [Identify specific gaps and 3-4 actionable recommendations]\n\n\
         INSTRUCTIONS\n\
         - Use specific percentages\n\
         - Identify strategic patterns\n\
         - Propose concrete recommendations\n\
         - Professional, direct language\n",
    );

    prompt
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct ReportClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ReportClient {
    /// `base_url` is the API root, e.g. `https://api.example.com/v1`
    /// (no trailing slash).
    pub fn new(base_url: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }

    /// Send `prompt` and return the generated prose.
    pub async fn generate(&self, prompt: &str) -> Result<String, ReportError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        info!(url = %url, model = %self.model, "requesting AI report");
        let mut req = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReportError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let report = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ReportError::Empty)?;

        info!(chars = report.len(), "report generated");
        Ok(report)
    }
}
