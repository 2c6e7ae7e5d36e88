use nf_core::{Error, Result, Source};
use tracing::warn;

/// Fetch and parse the remote source catalog. Unlike everything downstream,
/// a catalog failure is fatal: without sources there is no run.
pub async fn fetch_catalog(client: &reqwest::Client, url: &str) -> Result<Vec<Source>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Catalog(format!("failed to fetch source catalog {}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(Error::Catalog(format!(
            "source catalog {} returned status {}",
            url,
            response.status()
        )));
    }
    let text = response
        .text()
        .await
        .map_err(|e| Error::Catalog(format!("failed to read source catalog {}: {}", url, e)))?;
    Ok(parse_catalog(&text))
}

/// Parse `source_id,title,link,parser,relevance` rows, skipping the header
/// and anything malformed.
pub fn parse_catalog(text: &str) -> Vec<Source> {
    let mut sources = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if i == 0 {
            continue; // header row
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        if fields.len() < 5 {
            warn!(line = i + 1, "skipping catalog row with missing fields");
            continue;
        }
        let relevance = match fields[4].trim().parse::<i64>() {
            Ok(r) => r,
            Err(_) => {
                let value = fields[4].trim();
                warn!(line = i + 1, value, "skipping catalog row with bad relevance");
                continue;
            }
        };
        let link = fields[2].trim();
        if url::Url::parse(link).is_err() {
            warn!(line = i + 1, link, "skipping catalog row with invalid feed link");
            continue;
        }
        sources.push(Source {
            source_id: fields[0].trim().to_string(),
            title: fields[1].trim().to_string(),
            link: link.to_string(),
            parser: fields[3].trim().to_string(),
            relevance,
        });
    }
    sources
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_header() {
        let csv = "\
source_id,title,link,parser,relevance
1,BBC News,http://feeds.bbci.co.uk/news/rss.xml,rss,90
2,Google News - AI,https://news.google.com/rss/search?q=ai,rss,70
";
        let sources = parse_catalog(csv);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_id, "1");
        assert_eq!(sources[0].title, "BBC News");
        assert_eq!(sources[0].relevance, 90);
        assert_eq!(sources[1].title, "Google News - AI");
    }

    #[test]
    fn quoted_fields_may_contain_commas() {
        let csv = "\
source_id,title,link,parser,relevance
3,\"Science, Daily\",http://example.com/feed.xml,atom,50
";
        let sources = parse_catalog(csv);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "Science, Daily");
        assert_eq!(sources[0].parser, "atom");
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let csv = "\
source_id,title,link,parser,relevance
1,Too Short,http://example.com/feed.xml
2,Bad Relevance,http://example.com/feed.xml,rss,high
3,Bad Link,not a url,rss,50
4,Good,http://example.com/feed.xml,rss,50
";
        let sources = parse_catalog(csv);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "Good");
    }
}
