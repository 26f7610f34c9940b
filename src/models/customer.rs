use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const CPF_DIGITS: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// Always stored normalized: 11 digits, no punctuation.
    pub cpf: String,
}

/// Contact details supplied at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub cpf: String,
}

/// Strips formatting ("123.456.789-09") and checks the digit count.
///
/// Only dots, dashes and whitespace are accepted between digits.
pub fn normalize_cpf(raw: &str) -> Option<String> {
    if !raw
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c.is_whitespace())
    {
        return None;
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (digits.len() == CPF_DIGITS).then_some(digits)
}
