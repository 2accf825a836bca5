use crate::model::network::TagList;
use url::Url;

/// Fetches the list of known tags once. Any failure gives an empty list.
pub async fn fetch_tags(client: &reqwest::Client, url: Url) -> Vec<String> {
    let result: Result<TagList, reqwest::Error> = async {
        client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<TagList>()
            .await
    }
    .await;

    match result {
        Ok(list) => list.tags,
        Err(err) => {
            tracing::warn!(%url, error = %err, "failed to fetch tags");
            Vec::new()
        }
    }
}

/// Known tags containing `input`, ignoring case. Empty input matches all.
pub fn filter_suggestions<'a>(known: &'a [String], input: &str) -> Vec<&'a str> {
    let needle = input.to_lowercase();
    known
        .iter()
        .filter(|tag| needle.is_empty() || tag.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}
