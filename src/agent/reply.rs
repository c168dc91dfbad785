//! Reply texts.
//!
//! Every user-visible string lives here. Replies use Messenger's light
//! markdown (`*bold*`, `_italic_`, `` `code` ``). Nothing from an error ever
//! reaches these strings.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::nlu::Amount;
use crate::providers::{StockQuote, Ticker};

pub const FAREWELL: &str = "Thank you :)";

pub const GREETING: &str = "*Hi!* You can ask me : \n_\"current price of btc\"_ \n_\"convert 1 btc to inr\"_ \n_\"btc\"_ \n_\"market cap of btc\"_ \n_\"stock price of MSFT\"_\n*only cryptocurrency and company symbol supported e.g btc, eth, ibm, msft*";

pub const UNSUPPORTED: &str = "Sorry, currently this feature is not available.";

pub const PROVIDER_UNAVAILABLE: &str =
    "Sorry, I can't fetch that data right now. Please try again later.";

pub const TEXT_ONLY: &str = "Sorry I can only process text messages for now.";

pub const AMOUNT_OUT_OF_RANGE: &str =
    "Sorry, that amount is too large for me to convert. Please try a smaller one.";

/// Full ticker detail for a crypto lookup.
pub fn ticker_detail(ticker: &Ticker) -> String {
    format!(
        "*{}* \n`Rank : {}` \n`Symbol : {}` \n`Price : {} USD` \n`Market Cap : {} USD`",
        ticker.name, ticker.rank, ticker.symbol, ticker.price, ticker.market_cap
    )
}

/// `amount` units of the ticker's currency, priced in `fiat`.
///
/// Prices the provider sends in a shape we can't parse are shown verbatim.
/// An amount whose total doesn't fit in a [`Decimal`] gets
/// [`AMOUNT_OUT_OF_RANGE`] rather than a wrong total.
pub fn conversion(ticker: &Ticker, amount: &Amount, fiat: &str) -> String {
    let Some(amount) = amount.value() else {
        return AMOUNT_OUT_OF_RANGE.to_string();
    };
    let total = match Decimal::from_str(ticker.price.trim()) {
        Ok(unit) => match unit.checked_mul(amount) {
            Some(total) => total.normalize().to_string(),
            None => return AMOUNT_OUT_OF_RANGE.to_string(),
        },
        Err(_) => ticker.price.clone(),
    };
    format!(
        "Price of {} {} is *{}* {}.",
        amount.normalize(),
        ticker.name,
        total,
        fiat
    )
}

pub fn market_cap(ticker: &Ticker) -> String {
    format!("Market Cap of {} is *{} USD*", ticker.name, ticker.market_cap)
}

pub fn stock_price(quote: &StockQuote) -> String {
    format!("Stock price of *{}* is *{} USD*", quote.symbol, quote.price)
}

pub fn invalid_crypto_symbol(symbol: &str) -> String {
    format!(
        "Sorry, *{symbol}* is not a valid cryptocurrency symbol. Please give a valid crypto symbol, e.g btc"
    )
}

pub fn market_cap_unavailable(symbol: &str) -> String {
    format!(
        "Sorry, market cap for *{symbol}* is not available. Only for crypto-currency it is available."
    )
}

pub fn stock_unavailable(symbol: &str) -> String {
    format!("Sorry, currently stock price for *{symbol}* is not available.")
}

/// Reply to the `WELCOME` postback.
pub fn welcome(first_name: Option<&str>) -> String {
    match first_name {
        Some(name) if !name.trim().is_empty() => format!("Hey {}", name.trim()),
        _ => "Hey".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bitcoin(price: &str) -> Ticker {
        Ticker {
            name: "Bitcoin".into(),
            rank: "1".into(),
            symbol: "BTC".into(),
            price: price.into(),
            market_cap: "900B".into(),
        }
    }

    #[test]
    fn ticker_detail_format() {
        let text = ticker_detail(&bitcoin("50000"));
        assert!(text.contains("*Bitcoin*"));
        assert!(text.contains("Rank : 1"));
        assert!(text.contains("`Price : 50000 USD`"));
        assert!(text.contains("`Market Cap : 900B USD`"));
    }

    #[test]
    fn conversion_single_unit() {
        assert_eq!(
            conversion(&bitcoin("50000"), &Amount::ONE, "INR"),
            "Price of 1 Bitcoin is *50000* INR."
        );
    }

    #[test]
    fn conversion_multiplies_amount() {
        assert_eq!(
            conversion(&bitcoin("50000.50"), &Amount::Exact(dec!(2)), "USD"),
            "Price of 2 Bitcoin is *100001* USD."
        );
        assert_eq!(
            conversion(&bitcoin("100"), &Amount::Exact(dec!(0.25)), "EUR"),
            "Price of 0.25 Bitcoin is *25* EUR."
        );
    }

    #[test]
    fn conversion_unparseable_price_passes_through() {
        assert_eq!(
            conversion(&bitcoin("n/a"), &Amount::Exact(dec!(3)), "USD"),
            "Price of 3 Bitcoin is *n/a* USD."
        );
    }

    #[test]
    fn overflowing_total_is_not_reported_as_a_price() {
        let amount = Amount::Exact(dec!(100000000000000000000));
        assert_eq!(
            conversion(&bitcoin("50000000000"), &amount, "USD"),
            AMOUNT_OUT_OF_RANGE
        );
    }

    #[test]
    fn unrepresentable_amount_gets_out_of_range_text() {
        let amount = Amount::Unrepresentable("1e30".into());
        assert_eq!(conversion(&bitcoin("50000"), &amount, "USD"), AMOUNT_OUT_OF_RANGE);
    }

    #[test]
    fn market_cap_and_stock_formats() {
        assert_eq!(market_cap(&bitcoin("1")), "Market Cap of Bitcoin is *900B USD*");
        let quote = StockQuote {
            symbol: "MSFT".into(),
            price: "415.26".into(),
        };
        assert_eq!(stock_price(&quote), "Stock price of *MSFT* is *415.26 USD*");
    }

    #[test]
    fn empty_result_texts_name_the_symbol() {
        assert!(invalid_crypto_symbol("FOO").contains("*FOO* is not a valid"));
        assert!(market_cap_unavailable("FOO").contains("*FOO*"));
        assert!(stock_unavailable("FOO").contains("*FOO*"));
    }

    #[test]
    fn unavailable_text_differs_from_empty_texts() {
        assert_ne!(PROVIDER_UNAVAILABLE, invalid_crypto_symbol("BTC"));
        assert!(!PROVIDER_UNAVAILABLE.contains("valid"));
    }

    #[test]
    fn welcome_with_and_without_name() {
        assert_eq!(welcome(Some("Ada")), "Hey Ada");
        assert_eq!(welcome(Some("  ")), "Hey");
        assert_eq!(welcome(None), "Hey");
    }
}
