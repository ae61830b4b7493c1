//! Prompt construction and parsing of the model's rewrite output.

use listing_shared::{ListingError, PropertyRecord, Result, Rewrite};

/// Prompt asking the model to rewrite a listing's title and description.
pub fn rewrite_prompt(record: &PropertyRecord) -> String {
    format!(
        "Rewrite the following property details:\nTitle: {}\nDescription: {}",
        record.title, record.description
    )
}

/// Prompt asking the model to summarize a rewritten listing and its amenities.
pub fn summary_prompt(rewrite: &Rewrite, amenities: &str) -> String {
    format!(
        "Generate a summary using the following details:\nTitle: {}\nDescription: {}\nAmenities: {}",
        rewrite.title, rewrite.description, amenities
    )
}

/// Split generated text into title and description at the first newline.
///
/// Everything before the first `\n` is the title, everything after it
/// (including further newlines) is the description. Text without a newline
/// is a [`ListingError::MalformedResponse`].
pub fn split_rewrite(text: &str) -> Result<Rewrite> {
    let (title, description) = text.split_once('\n').ok_or_else(|| {
        ListingError::malformed(format!(
            "rewritten text has no newline between title and description ({} chars)",
            text.chars().count()
        ))
    })?;

    Ok(Rewrite {
        title: title.to_string(),
        description: description.to_string(),
    })
}
