//! Naming and identity policy checks used by group handling.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref NET_ID: Regex = Regex::new(r"^[a-z][a-z0-9\-_.]{0,127}$").expect("pattern compiles");
    static ref ACADEMIC_COURSE_ID: Regex =
        Regex::new(r"^\d{4}-(winter|spring|summer|autumn)-[\w& ]+-\d{3}-[A-Z][A-Z0-9]?$").expect("pattern compiles");
    static ref COURSE_GROUP: Regex =
        Regex::new(r"^course_(20[0-9]{2})([a-z]{3})-([a-z\-]+)([0-9]{3})([a-z][a-z0-9]?)$")
            .expect("pattern compiles");
}

/// A member name failed identity policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("invalid net id: {0}")]
    InvalidNetId(String),

    #[error("not a gmail address: {0}")]
    NotGmail(String),
}

/// Check a campus net id.
pub fn valid_net_id(name: &str) -> Result<(), PolicyError> {
    if NET_ID.is_match(name) {
        Ok(())
    } else {
        Err(PolicyError::InvalidNetId(name.to_string()))
    }
}

/// Normalise a gmail address: lowercase, dots and `+tag` removed from the
/// local part, `googlemail.com` folded into `gmail.com`.
pub fn valid_gmail_id(address: &str) -> Result<String, PolicyError> {
    let lowered = address.trim().to_lowercase();
    let (local, domain) = lowered
        .split_once('@')
        .ok_or_else(|| PolicyError::NotGmail(address.to_string()))?;

    if domain != "gmail.com" && domain != "googlemail.com" {
        return Err(PolicyError::NotGmail(address.to_string()));
    }

    let local: String = local
        .split('+')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '.')
        .collect();
    if local.is_empty() {
        return Err(PolicyError::NotGmail(address.to_string()));
    }

    Ok(format!("{local}@gmail.com"))
}

/// Section-level course ids from the registrar, as opposed to ad hoc courses.
pub fn is_academic_course_id(course_id: &str) -> bool {
    ACADEMIC_COURSE_ID.is_match(course_id)
}

/// Course SIS id encoded in a `course_<yyyy><qtr>-<curric><num><sect>` group
/// name, e.g. `course_2024aut-cse142a` → `2024-autumn-CSE-142-A`.
pub fn course_group_sis_id(group: &str) -> Option<String> {
    let caps = COURSE_GROUP.captures(group)?;
    let quarter = match &caps[2] {
        "win" => "winter",
        "spr" => "spring",
        "sum" => "summer",
        "aut" => "autumn",
        _ => return None,
    };
    Some(format!(
        "{}-{}-{}-{}-{}",
        &caps[1],
        quarter,
        caps[3].replace('-', " ").to_uppercase(),
        &caps[4],
        caps[5].to_uppercase()
    ))
}
