use serde::{Deserialize, Deserializer};

pub fn first_page() -> i64 {
    1
}

// `?page=` is free text, anything that is not a positive number means the first page
pub fn deserialize_page<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or_else(first_page))
}
