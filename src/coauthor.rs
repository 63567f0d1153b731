use crate::model::{CoAuthor, SENTINEL_EMAIL};

const TRAILER_PREFIX: &str = "Co-authored-by:";

/// Extract every `Co-authored-by:` trailer from a commit message.
///
/// Duplicate trailers are yielded again on purpose: the aggregator counts
/// credit as many times as it was declared.
pub fn extract_co_authors(message: &str) -> Vec<CoAuthor> {
    message
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(TRAILER_PREFIX))
        .map(|line| parse_trailer(line[TRAILER_PREFIX.len()..].trim()))
        .collect()
}

/// Parse the `Name <email>` remainder of a trailer line. The pattern is
/// anchored to the full string; anything that does not match falls back to
/// the sentinel identity with the raw text as name.
fn parse_trailer(rest: &str) -> CoAuthor {
    if let Some(open) = rest.rfind('<') {
        if rest.ends_with('>') && open + 1 < rest.len() - 1 {
            let name = rest[..open].trim();
            let email = rest[open + 1..rest.len() - 1].trim();
            if !email.is_empty() {
                return CoAuthor {
                    name: name.to_string(),
                    email: email.to_lowercase(),
                };
            }
        }
    }
    CoAuthor {
        name: rest.to_string(),
        email: SENTINEL_EMAIL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_well_formed_trailer() {
        let message = "Fix the widget\n\nCo-authored-by: Jane Doe <jane@example.com>";
        assert_eq!(
            extract_co_authors(message),
            vec![CoAuthor {
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
            }]
        );
    }

    #[test]
    fn lowercases_emails() {
        let message = "x\n\nCo-authored-by: Jane <Jane@Example.COM>";
        assert_eq!(extract_co_authors(message)[0].email, "jane@example.com");
    }

    #[test]
    fn garbage_trailer_falls_back_to_sentinel() {
        let message = "x\n\nCo-authored-by: garbage";
        let coauthors = extract_co_authors(message);
        assert_eq!(coauthors.len(), 1);
        assert_eq!(coauthors[0].name, "garbage");
        assert_eq!(coauthors[0].email, SENTINEL_EMAIL);
        assert!(coauthors[0].is_sentinel());
    }

    #[test]
    fn ignores_non_trailer_lines() {
        let message = "Co-authored-by mentioned in prose\nbody text\n";
        assert!(extract_co_authors(message).is_empty());
    }

    #[test]
    fn trailing_text_after_email_does_not_match() {
        let message = "x\n\nCo-authored-by: Jane <jane@example.com> extra";
        assert!(extract_co_authors(message)[0].is_sentinel());
    }

    #[test]
    fn duplicates_are_preserved() {
        let message = "x\n\nCo-authored-by: Jane <jane@example.com>\nCo-authored-by: Jane <jane@example.com>";
        assert_eq!(extract_co_authors(message).len(), 2);
    }

    #[test]
    fn indented_trailer_is_still_found() {
        let message = "x\n\n  Co-authored-by: Jane Doe <jane@example.com>  ";
        assert_eq!(extract_co_authors(message)[0].name, "Jane Doe");
    }
}
