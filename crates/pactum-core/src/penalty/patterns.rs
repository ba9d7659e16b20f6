//! Recurring-payment detection in free-text financial terms.
//!
//! Recognizes an amount with a currency marker (`$10,000`, `10,000 USD`,
//! `EUR 2,500.50`, `€2,500`) and a period keyword (`monthly`, `per month`,
//! `weekly`, `quarterly`, `annually`, ...). The amount paired with a period
//! is the one closest to it, preferring amounts in the same clause, so a
//! one-off deposit stated before the rent is not taken as the rent.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::types::Money;

lazy_static! {
    /// Amount with an optional leading symbol and optional trailing ISO code.
    static ref SYMBOL_AMOUNT_PATTERN: Regex = Regex::new(
        r"(?P<symbol>[$€£])?\s?(?P<value>\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)(?:\s?(?P<code>USD|EUR|GBP|CAD|AUD|CHF)\b)?"
    ).unwrap();

    /// Amount preceded by an ISO code (e.g., "EUR 2,500").
    static ref CODE_AMOUNT_PATTERN: Regex = Regex::new(
        r"\b(?P<code>USD|EUR|GBP|CAD|AUD|CHF)\s?(?P<value>\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)"
    ).unwrap();

    // "a month" is left out: it reads as a deadline ("within a month") as often as a rate.
    static ref PERIOD_PATTERN: Regex = Regex::new(
        r"(?i)\b(?P<period>monthly|per\s+month|each\s+month|every\s+month|weekly|per\s+week|each\s+week|every\s+week|quarterly|per\s+quarter|each\s+quarter|annually|yearly|per\s+year|per\s+annum|each\s+year|every\s+year)\b"
    ).unwrap();

    /// Clause separators. A period only ends a sentence when followed by whitespace or the end.
    static ref CLAUSE_BREAK_PATTERN: Regex = Regex::new(r"[;\n]|\.(?:\s|$)").unwrap();
}

/// How often a recurring payment falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPeriod {
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl PaymentPeriod {
    /// Adjective used in penalty text ("monthly amount").
    pub fn adjective(&self) -> &'static str {
        match self {
            PaymentPeriod::Weekly => "weekly",
            PaymentPeriod::Monthly => "monthly",
            PaymentPeriod::Quarterly => "quarterly",
            PaymentPeriod::Annual => "annual",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        let lower = keyword.to_lowercase();
        if lower.contains("week") {
            Some(PaymentPeriod::Weekly)
        } else if lower.contains("month") {
            Some(PaymentPeriod::Monthly)
        } else if lower.contains("quarter") {
            Some(PaymentPeriod::Quarterly)
        } else if lower.contains("year") || lower.contains("annu") {
            Some(PaymentPeriod::Annual)
        } else {
            None
        }
    }
}

impl fmt::Display for PaymentPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.adjective())
    }
}

/// A periodic payment obligation found in financial terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringPayment {
    pub amount: Money,
    pub period: PaymentPeriod,
}

/// Find the recurring payment stated in the text.
///
/// Both an amount carrying a currency marker and a period keyword must be
/// present; a bare number ("within 10 days") is never taken as an amount.
/// When several amounts appear, the one nearest a period keyword wins, and
/// an amount in the keyword's own clause beats any amount outside it.
pub fn find_recurring_payment(text: &str) -> Option<RecurringPayment> {
    let amounts = find_amounts(text);
    let breaks: Vec<usize> = CLAUSE_BREAK_PATTERN.find_iter(text).map(|m| m.start()).collect();
    let clause_of = |pos: usize| breaks.partition_point(|b| *b < pos);

    let mut best: Option<((bool, usize), RecurringPayment)> = None;
    for caps in PERIOD_PATTERN.captures_iter(text) {
        let Some(keyword) = caps.name("period") else {
            continue;
        };
        let Some(period) = PaymentPeriod::from_keyword(keyword.as_str()) else {
            continue;
        };
        let clause = clause_of(keyword.start());

        for (span, money) in &amounts {
            let distance = if span.end <= keyword.start() {
                keyword.start() - span.end
            } else {
                span.start.saturating_sub(keyword.end())
            };
            let key = (clause_of(span.start) != clause, distance);

            if best.as_ref().map_or(true, |(k, _)| key < *k) {
                best = Some((
                    key,
                    RecurringPayment {
                        amount: money.clone(),
                        period,
                    },
                ));
            }
        }
    }

    best.map(|(_, payment)| payment)
}

/// Every currency-marked amount in the text, in order of appearance.
fn find_amounts(text: &str) -> Vec<(Range<usize>, Money)> {
    let mut found: Vec<(Range<usize>, Money)> = CODE_AMOUNT_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let span = caps.get(0)?.range();
            let money = to_money(caps.name("value")?.as_str(), caps.name("code")?.as_str())?;
            Some((span, money))
        })
        .collect();

    for caps in SYMBOL_AMOUNT_PATTERN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let currency = match (caps.name("code"), caps.name("symbol")) {
            (Some(code), _) => code.as_str(),
            (None, Some(symbol)) => match currency_for_symbol(symbol.as_str()) {
                Some(currency) => currency,
                None => continue,
            },
            (None, None) => continue,
        };
        let overlaps = found
            .iter()
            .any(|(span, _)| span.start < whole.end() && whole.start() < span.end);
        if overlaps {
            continue;
        }
        if let Some(value) = caps.name("value") {
            if let Some(money) = to_money(value.as_str(), currency) {
                found.push((whole.range(), money));
            }
        }
    }

    found.sort_by_key(|(span, _)| span.start);
    found
}

fn currency_for_symbol(symbol: &str) -> Option<&'static str> {
    match symbol {
        "$" => Some("USD"),
        "€" => Some("EUR"),
        "£" => Some("GBP"),
        _ => None,
    }
}

/// Parse "10,000.5" into minor units (1_000_050).
fn to_money(value: &str, currency: &str) -> Option<Money> {
    let digits: String = value.chars().filter(|c| *c != ',').collect();
    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits.as_str(), ""),
    };

    let whole: i64 = whole.parse().ok()?;
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction[..2].parse().ok()?,
    };

    let minor_units = whole.checked_mul(100)?.checked_add(cents)?;
    Some(Money::new(minor_units, currency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollar_monthly() {
        let payment = find_recurring_payment("Client pays $10,000 USD monthly.").unwrap();
        assert_eq!(payment.amount, Money::new(1_000_000, "USD"));
        assert_eq!(payment.period, PaymentPeriod::Monthly);
    }

    #[test]
    fn test_code_prefix_quarterly() {
        let payment = find_recurring_payment("Buyer pays EUR 2,500.50 each quarter.").unwrap();
        assert_eq!(payment.amount, Money::new(250_050, "EUR"));
        assert_eq!(payment.period, PaymentPeriod::Quarterly);
    }

    #[test]
    fn test_symbol_only_currency() {
        let payment = find_recurring_payment("A fee of £750 is due per month.").unwrap();
        assert_eq!(payment.amount, Money::new(75_000, "GBP"));
    }

    #[test]
    fn test_trailing_code_without_symbol() {
        let payment = find_recurring_payment("Licensee shall pay 1200 CAD annually.").unwrap();
        assert_eq!(payment.amount, Money::new(120_000, "CAD"));
        assert_eq!(payment.period, PaymentPeriod::Annual);
    }

    #[test]
    fn test_no_period_no_match() {
        assert!(find_recurring_payment("Client pays $10,000 USD upon signing.").is_none());
    }

    #[test]
    fn test_bare_numbers_ignored() {
        assert!(find_recurring_payment("Invoices are due monthly within 30 days.").is_none());
    }

    #[test]
    fn test_amount_next_to_period_wins() {
        let payment = find_recurring_payment("USD 300 setup, then $1,000 monthly").unwrap();
        assert_eq!(payment.amount, Money::new(100_000, "USD"));
    }

    #[test]
    fn test_deposit_in_earlier_clause_ignored() {
        let payment = find_recurring_payment(
            "A deposit of $5,000 is due at signing; rent of $2,000 is payable monthly.",
        )
        .unwrap();
        assert_eq!(payment.amount, Money::new(200_000, "USD"));
        assert_eq!(payment.period, PaymentPeriod::Monthly);
    }

    #[test]
    fn test_same_clause_beats_closer_amount_elsewhere() {
        let payment = find_recurring_payment(
            "Rent is $900 per month. $50 is charged for each key replaced.",
        )
        .unwrap();
        assert_eq!(payment.amount, Money::new(90_000, "USD"));
    }

    #[test]
    fn test_amount_in_another_sentence_still_used() {
        let payment =
            find_recurring_payment("Payments fall due monthly. Each payment is EUR 1,250.").unwrap();
        assert_eq!(payment.amount, Money::new(125_000, "EUR"));
    }

    #[test]
    fn test_within_a_month_is_not_recurring() {
        assert!(
            find_recurring_payment("Client pays $10,000 USD once, within a month of signing.")
                .is_none()
        );
    }

    #[test]
    fn test_decimal_point_does_not_split_clause() {
        let payment = find_recurring_payment("Fee: $12.5 weekly").unwrap();
        assert_eq!(payment.amount, Money::new(1_250, "USD"));
    }

    #[test]
    fn test_amounts_in_order_without_duplicates() {
        let amounts: Vec<Money> = find_amounts("EUR 2,500 now and $10,000 USD later")
            .into_iter()
            .map(|(_, money)| money)
            .collect();
        assert_eq!(
            amounts,
            vec![Money::new(250_000, "EUR"), Money::new(1_000_000, "USD")]
        );
    }
}
