//! Stage-boundary reply classification.
//!
//! A backend may "succeed" with text that is really a failure. Replies are
//! checked once here; everything downstream sees a tagged result.

/// Why a reply was not accepted as stage output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReplyRejection {
    #[error("reply was empty")]
    Empty,

    #[error("reply was an apology")]
    Apology,

    #[error("reply was an error message")]
    ErrorPrefixed,
}

/// Accept `reply` as stage output or say why it is unusable.
///
/// Leading whitespace and case are ignored.
pub fn classify_reply(reply: &str) -> Result<&str, ReplyRejection> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(ReplyRejection::Empty);
    }
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with("i apologize") {
        return Err(ReplyRejection::Apology);
    }
    if lowered.starts_with("error") {
        return Err(ReplyRejection::ErrorPrefixed);
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_reply_is_accepted() {
        let reply = "You can use your Ordinary Account savings for the downpayment.";
        assert_eq!(classify_reply(reply), Ok(reply));
    }

    #[test]
    fn test_blank_reply_is_rejected() {
        assert_eq!(classify_reply(""), Err(ReplyRejection::Empty));
        assert_eq!(classify_reply("  \n\t"), Err(ReplyRejection::Empty));
    }

    #[test]
    fn test_apology_is_rejected_regardless_of_case() {
        assert_eq!(
            classify_reply("I apologize, I could not find information"),
            Err(ReplyRejection::Apology)
        );
        assert_eq!(
            classify_reply("  i APOLOGIZE for that"),
            Err(ReplyRejection::Apology)
        );
    }

    #[test]
    fn test_error_prefix_is_rejected() {
        assert_eq!(
            classify_reply("Error: rate limited"),
            Err(ReplyRejection::ErrorPrefixed)
        );
    }

    #[test]
    fn test_apology_later_in_text_is_accepted() {
        assert!(classify_reply("The grant is $80,000. I apologize for the delay.").is_ok());
    }
}
