//! Content extraction from the episode's input source.
//!
//! A URL is fetched and reduced to readable text; anything else is read
//! as a local file.

use std::fs;
use std::time::Duration;

use regex::Regex;

use crate::error::StudioError;

/// Extract the text content of `input` (URL or file path).
pub async fn extract(input: &str) -> Result<String, StudioError> {
    let text = if input.starts_with("http://") || input.starts_with("https://") {
        let page = fetch_url(input).await?;
        html_to_text(&page)
    } else {
        fs::read_to_string(input)?
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(StudioError::Extraction(format!(
            "'{}' yielded no text content",
            input
        )));
    }

    Ok(text)
}

async fn fetch_url(url: &str) -> Result<String, StudioError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| StudioError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(StudioError::Extraction(format!(
            "'{}' returned {}",
            url,
            response.status()
        )));
    }

    Ok(response.text().await?)
}

/// Reduce an HTML document to plain text: drop script/style subtrees,
/// strip the remaining tags, decode common entities, collapse whitespace.
fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();

    if let Ok(re) = Regex::new(r"(?is)<(script|style|head)[^>]*>.*?</(script|style|head)>") {
        text = re.replace_all(&text, " ").to_string();
    }

    if let Ok(re) = Regex::new(r"(?i)</(p|div|br|li|h[1-6]|tr)>|<br\s*/?>") {
        text = re.replace_all(&text, "\n").to_string();
    }

    if let Ok(re) = Regex::new(r"</?[\w!][^>]*>") {
        text = re.replace_all(&text, " ").to_string();
    }

    for (entity, replacement) in [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", " "),
    ] {
        text = text.replace(entity, replacement);
    }

    if let Ok(re) = Regex::new(r"[ \t]+") {
        text = re.replace_all(&text, " ").to_string();
    }
    if let Ok(re) = Regex::new(r"\s*\n\s*") {
        text = re.replace_all(&text, "\n").to_string();
    }

    text.trim().to_string()
}
