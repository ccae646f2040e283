//! Lightweight scan of extracted resume text.
//!
//! Pre-fills contact fields from a freshly extracted resume so the user is
//! only asked for what the document did not already carry. Pure regex work,
//! no adapter calls.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{validate, FieldId};

static EMAIL_SCAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\s@]+@[^\s@]+\.[A-Za-z]{2,}").expect("valid email scan regex"));

// Horizontal whitespace only: a phone number never spans lines, and a
// newline in the class would join stacked digit runs (e.g. date ranges in
// an education section) into one bogus candidate.
static PHONE_SCAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\(?\d[\d().\- \t]{8,}\d").expect("valid phone scan regex")
});

static LINKEDIN_SCAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?linkedin\.com/[A-Za-z0-9_/\-]+")
        .expect("valid linkedin scan regex")
});

/// Contact facts found in resume text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeFacts {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub name: Option<String>,
}

impl ResumeFacts {
    /// True when no fact was found at all.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.phone.is_none()
            && self.linkedin_url.is_none()
            && self.name.is_none()
    }
}

/// Scans extracted resume text for email, phone, LinkedIn URL, and a
/// display name.
///
/// Every candidate is re-checked through the field validators, so a match
/// that would not survive form submission is discarded here too.
pub fn scan_resume_text(text: &str) -> ResumeFacts {
    let email = EMAIL_SCAN_RE
        .find(text)
        .and_then(|m| validate(FieldId::ContactEmail, m.as_str()).ok());

    let phone = PHONE_SCAN_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find_map(|candidate| validate(FieldId::ContactPhone, candidate).ok());

    let linkedin_url = LINKEDIN_SCAN_RE
        .find(text)
        .and_then(|m| validate(FieldId::LinkedInUrl, m.as_str()).ok());

    ResumeFacts {
        email,
        phone,
        linkedin_url,
        name: scan_name(text),
    }
}

/// Heuristic display name: the first short, letters-only line of the resume.
///
/// Resumes almost always lead with the candidate's name; anything with
/// digits, an @, or more than four words is a header or address line.
fn scan_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(5)
        .find(|line| {
            let words = line.split_whitespace().count();
            (1..=4).contains(&words)
                && line.len() <= 60
                && line
                    .chars()
                    .all(|c| c.is_alphabetic() || c.is_whitespace() || c == '.' || c == '-')
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Jordan A. Rivera
Senior Backend Engineer

Contact: jordan.rivera@example.com | +1 (555) 123-4567
linkedin.com/in/jordan-rivera

Experience
- Built things.
";

    #[test]
    fn scan_finds_all_contact_facts() {
        let facts = scan_resume_text(SAMPLE);
        assert_eq!(facts.email.as_deref(), Some("jordan.rivera@example.com"));
        assert_eq!(facts.phone.as_deref(), Some("+1 (555) 123-4567"));
        assert_eq!(
            facts.linkedin_url.as_deref(),
            Some("linkedin.com/in/jordan-rivera")
        );
        assert_eq!(facts.name.as_deref(), Some("Jordan A. Rivera"));
    }

    #[test]
    fn scan_of_plain_text_is_empty() {
        let facts = scan_resume_text("just some prose without contact details\n123");
        assert!(facts.email.is_none());
        assert!(facts.phone.is_none());
        assert!(facts.linkedin_url.is_none());
    }

    #[test]
    fn scan_discards_invalid_phone_candidates() {
        // Nine digits only, too short to validate.
        let facts = scan_resume_text("ref 123-456-789");
        assert!(facts.phone.is_none());
    }

    #[test]
    fn stacked_date_ranges_are_not_a_phone_number() {
        // Adjacent lines must never concatenate into one digit run.
        let facts = scan_resume_text(
            "Jo Example\nEducation\n2012 - 2016\n2016 - 2020\njo@example.com\n",
        );
        assert!(facts.phone.is_none());
        assert_eq!(facts.email.as_deref(), Some("jo@example.com"));
    }

    #[test]
    fn name_heuristic_skips_long_header_lines() {
        let facts =
            scan_resume_text("CURRICULUM VITAE 2024 EDITION WITH EXTRAS AND MORE\nPat Smith\n");
        assert_eq!(facts.name.as_deref(), Some("Pat Smith"));
    }

    #[test]
    fn empty_facts_reported() {
        assert!(ResumeFacts::default().is_empty());
        let facts = ResumeFacts {
            email: Some("a@b.co".into()),
            ..Default::default()
        };
        assert!(!facts.is_empty());
    }
}
