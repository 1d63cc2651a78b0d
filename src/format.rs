//! Markdown output for the CLI
//!
//! Listings render as one section each: title, a compact facts line, the
//! score with its matched fields, then the description quoted. Query terms
//! are highlighted in **bold**.

use unicode_segmentation::UnicodeSegmentation;

use crate::listing::PropertyListing;
use crate::search::parser::QueryParser;
use crate::search::text::normalize_text;
use crate::service::SearchOutcome;

/// Format ranked listings as markdown
pub fn format_search_results(outcome: &SearchOutcome, query: &str) -> String {
    let terms = QueryParser::parse(query).terms;

    let mut md = String::new();
    md.push_str(&format!(
        "# Search Results · {} of {} listings\n\n",
        outcome.results.len(),
        outcome.total
    ));

    for result in &outcome.results {
        let listing = &result.record;
        md.push_str(&format!("## {}\n\n", highlight(&listing.title, &terms)));
        md.push_str(&format!("{}\n\n", facts_line(listing)));

        let fields: Vec<&str> = result.matched_fields.iter().map(|f| f.as_str()).collect();
        md.push_str(&format!(
            "score {:.3} · matched: {}\n\n",
            result.score,
            fields.join(", ")
        ));

        let description = listing.description.trim();
        if !description.is_empty() {
            for line in description.lines() {
                md.push_str(&format!("> {}\n", highlight(line, &terms)));
            }
            md.push('\n');
        }

        md.push_str("---\n\n");
    }

    md
}

/// Format suggestions as a markdown list
pub fn format_suggestions(query: &str, suggestions: &[String]) -> String {
    let mut md = format!("# Suggestions for \"{}\"\n\n", query.trim());
    if suggestions.is_empty() {
        md.push_str("_No suggestions_\n");
        return md;
    }
    for suggestion in suggestions {
        md.push_str(&format!("- {}\n", suggestion));
    }
    md
}

fn facts_line(listing: &PropertyListing) -> String {
    let place = [listing.location.trim(), listing.city.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let mut facts = vec![format!("`{}`", listing.id)];
    if !listing.property_type.trim().is_empty() {
        facts.push(listing.property_type.trim().to_string());
    }
    if listing.bedrooms > 0 {
        facts.push(format!("{} BHK", listing.bedrooms));
    }
    if !place.is_empty() {
        facts.push(place);
    }
    if listing.price > 0 {
        facts.push(format_price(listing.price));
    }
    facts.join(" · ")
}

/// Group digits in threes, e.g. `18,500,000`
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Bold every word whose normalized form is, or starts with, a query term
fn highlight(text: &str, terms: &[String]) -> String {
    if terms.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for word in text.split_word_bounds() {
        let normalized = normalize_text(word);
        let hit = !normalized.is_empty()
            && terms
                .iter()
                .any(|t| normalized == *t || (t.chars().count() >= 2 && normalized.starts_with(t.as_str())));
        if hit {
            out.push_str("**");
            out.push_str(word);
            out.push_str("**");
        } else {
            out.push_str(word);
        }
    }
    out
}
