use std::collections::HashMap;
use std::fmt;

pub const SYMBOL_FIELD: &str = "symbol";
pub const QUANTITY_FIELD: &str = "quantity";
pub const PRICE_FIELD: &str = "price";
pub const STOCK_SYMBOL_FIELD: &str = "stockSymbol";

/// A validated buy or sell from the portfolio form.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeForm {
    pub symbol: String,
    /// Positive to buy, negative to sell. Never zero.
    pub quantity: i64,
    /// Price per share. Always positive for a buy, `0.0` for a sell.
    pub price: f64,
}

/// A form field that failed validation. `Display` is the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    MissingSymbol,
    MissingQuantity,
    QuantityNotInteger,
    QuantityZero,
    MissingPrice,
    PriceNotPositive,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::MissingSymbol => write!(f, "A symbol was not supplied. This field is required."),
            FormError::MissingQuantity => {
                write!(f, "A quantity was not supplied. This field is required.")
            }
            FormError::QuantityNotInteger => {
                write!(f, "The value supplied for quantity must be an integer.")
            }
            FormError::QuantityZero => write!(f, "The value supplied for quantity must not be zero."),
            FormError::MissingPrice => write!(f, "A price was not supplied. This field is required."),
            FormError::PriceNotPositive => write!(
                f,
                "The value supplied for price must be a positive integer or float."
            ),
        }
    }
}

impl std::error::Error for FormError {}

fn field<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Validate the portfolio form.
///
/// Checks run in a fixed order and the first failure is reported. The price is
/// only required, and only read, for a buy.
pub fn parse_trade(vars: &HashMap<String, String>) -> Result<TradeForm, FormError> {
    let symbol = field(vars, SYMBOL_FIELD).ok_or(FormError::MissingSymbol)?;
    let quantity = field(vars, QUANTITY_FIELD).ok_or(FormError::MissingQuantity)?;
    let quantity: i64 = quantity.parse().map_err(|_| FormError::QuantityNotInteger)?;
    if quantity == 0 {
        return Err(FormError::QuantityZero);
    }

    let price = if quantity < 0 {
        0.0
    } else {
        let price = field(vars, PRICE_FIELD).ok_or(FormError::MissingPrice)?;
        match price.parse::<f64>() {
            Ok(p) if p.is_finite() && p > 0.0 => p,
            _ => return Err(FormError::PriceNotPositive),
        }
    };

    Ok(TradeForm {
        symbol: symbol.to_string(),
        quantity,
        price,
    })
}

/// The upper-cased symbol from the research form, if one was supplied.
pub fn research_symbol(vars: &HashMap<String, String>) -> Option<String> {
    field(vars, STOCK_SYMBOL_FIELD).map(str::to_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_buy() {
        let trade = parse_trade(&form(&[("symbol", "qtrx"), ("quantity", "100"), ("price", "0.85")])).unwrap();
        assert_eq!(trade.symbol, "qtrx");
        assert_eq!(trade.quantity, 100);
        assert_eq!(trade.price, 0.85);
    }

    #[test]
    fn test_sell_ignores_price() {
        let trade = parse_trade(&form(&[("symbol", "QTRX"), ("quantity", "-5"), ("price", "junk")])).unwrap();
        assert_eq!(trade.quantity, -5);
        assert_eq!(trade.price, 0.0);
        assert!(parse_trade(&form(&[("symbol", "QTRX"), ("quantity", "-5")])).is_ok());
    }

    #[test]
    fn test_validation_order() {
        assert_eq!(parse_trade(&form(&[])), Err(FormError::MissingSymbol));
        assert_eq!(
            parse_trade(&form(&[("symbol", " "), ("quantity", "x")])),
            Err(FormError::MissingSymbol)
        );
        assert_eq!(
            parse_trade(&form(&[("symbol", "A"), ("quantity", "")])),
            Err(FormError::MissingQuantity)
        );
        assert_eq!(
            parse_trade(&form(&[("symbol", "A"), ("quantity", "1.5")])),
            Err(FormError::QuantityNotInteger)
        );
        assert_eq!(
            parse_trade(&form(&[("symbol", "A"), ("quantity", "0")])),
            Err(FormError::QuantityZero)
        );
        assert_eq!(
            parse_trade(&form(&[("symbol", "A"), ("quantity", "3")])),
            Err(FormError::MissingPrice)
        );
    }

    #[test]
    fn test_price_must_be_positive() {
        for price in ["0", "-1", "abc", "inf", "NaN"] {
            assert_eq!(
                parse_trade(&form(&[("symbol", "A"), ("quantity", "3"), ("price", price)])),
                Err(FormError::PriceNotPositive),
                "{price}"
            );
        }
        assert!(parse_trade(&form(&[("symbol", "A"), ("quantity", "3"), ("price", "12")])).is_ok());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            FormError::QuantityZero.to_string(),
            "The value supplied for quantity must not be zero."
        );
    }

    #[test]
    fn test_research_symbol() {
        assert_eq!(research_symbol(&form(&[("stockSymbol", " aapl ")])).as_deref(), Some("AAPL"));
        assert_eq!(research_symbol(&form(&[("stockSymbol", "")])), None);
        assert_eq!(research_symbol(&form(&[])), None);
    }
}
