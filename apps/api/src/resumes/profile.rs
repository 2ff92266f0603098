//! Best-effort contact details pulled from resume text with simple patterns.

use std::sync::LazyLock;

use regex::Regex;

const MAX_NAME_CHARS: usize = 100;
const UNKNOWN_NAME: &str = "Unknown Candidate";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("static regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d\s\-\+\(\)]{10,}").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactProfile {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn contact_profile(text: &str) -> ContactProfile {
    let name = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(MAX_NAME_CHARS).collect())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let email = EMAIL.find(text).map(|m| m.as_str().to_string());
    let phone = PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| candidate.chars().filter(char::is_ascii_digit).count() >= 7)
        .map(str::to_string);

    ContactProfile { name, email, phone }
}
