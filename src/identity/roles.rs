use std::collections::BTreeSet;

pub const ADMIN: &str = "Admin";
pub const MANAGER: &str = "Manager";
pub const LAWYER: &str = "Lawyer";

pub const ALL: [&str; 3] = [ADMIN, MANAGER, LAWYER];

/// Build a role set, trimming stray whitespace and punctuation from page declarations.
pub fn set<I, S>(roles: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    roles
        .into_iter()
        .map(|r| r.as_ref().trim().trim_end_matches(',').trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}
