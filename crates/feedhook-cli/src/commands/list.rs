use anyhow::Result;

use feedhook_core::feed::Feed;

pub fn run(feeds: &[Feed]) -> Result<()> {
    if feeds.is_empty() {
        println!("No feeds configured.");
        println!("\nAdd entries to the feed list, e.g.:");
        println!("  {{\"rust\": \"https://discord.com/api/webhooks/<id>/<token>\"}}");
        return Ok(());
    }

    println!("Feeds ({}):\n", feeds.len());

    for feed in feeds {
        println!("  r/{}", feed.name);
        println!("    Webhook: {}", redact_webhook(&feed.endpoint));
    }

    Ok(())
}

/// Hide the token part of a webhook URL (the last path segment)
fn redact_webhook(endpoint: &str) -> String {
    let Some((scheme, rest)) = endpoint.split_once("://") else {
        return endpoint.to_string();
    };

    match rest.trim_end_matches('/').rsplit_once('/') {
        Some((path, token)) if !token.is_empty() => format!("{}://{}/***", scheme, path),
        _ => endpoint.to_string(),
    }
}
